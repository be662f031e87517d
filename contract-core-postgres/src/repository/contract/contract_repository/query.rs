use contract_core_db::models::ContractModel;
use contract_core_db::repository::{ContractQuery, Page, PageRequest};
use sqlx::{Postgres, QueryBuilder, Row};
use std::error::Error;

use super::repo_impl::ContractRepositoryImpl;
use crate::utils::TryFromRow;

/// Appends one `AND` clause per set field of `query`.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ContractQuery) {
    if let Some(group_id) = query.group_id {
        builder.push(" AND c.group_id = ").push_bind(group_id);
    }
    if let Some(status) = query.status {
        builder.push(" AND c.status = ").push_bind(status);
    }
    if let Some(contract_type) = query.contract_type {
        builder.push(" AND c.contract_type = ").push_bind(contract_type);
    }
    if let Some(parent_contract_id) = query.parent_contract_id {
        builder
            .push(" AND c.parent_contract_id = ")
            .push_bind(parent_contract_id);
    }
    if let Some(expiry_from) = query.expiry_from {
        builder.push(" AND c.expiry_date >= ").push_bind(expiry_from);
    }
    if let Some(expiry_before) = query.expiry_before {
        builder.push(" AND c.expiry_date < ").push_bind(expiry_before);
    }
    if let Some(expiry_until) = query.expiry_until {
        builder.push(" AND c.expiry_date <= ").push_bind(expiry_until);
    }
    if let Some(user_id) = query.party_user_id {
        builder
            .push(" AND EXISTS (SELECT 1 FROM contract_party p WHERE p.contract_id = c.id AND p.user_id = ")
            .push_bind(user_id)
            .push(")");
    }
}

impl ContractRepositoryImpl {
    pub(super) async fn query_impl(
        repo: &ContractRepositoryImpl,
        query: &ContractQuery,
        page: PageRequest,
    ) -> Result<Page<ContractModel>, Box<dyn Error + Send + Sync>> {
        let mut tx = repo.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

        let mut count_builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM contract c WHERE 1 = 1");
        push_filters(&mut count_builder, query);
        let total: i64 = count_builder
            .build()
            .fetch_one(&mut **transaction)
            .await?
            .try_get(0)?;

        if total == 0 || page.limit == 0 {
            return Ok(Page::new(Vec::new(), total as usize, page.limit, page.offset));
        }

        let mut page_builder = QueryBuilder::<Postgres>::new("SELECT c.* FROM contract c WHERE 1 = 1");
        push_filters(&mut page_builder, query);
        page_builder
            .push(" ORDER BY c.created_at DESC, c.id LIMIT ")
            .push_bind(page.limit as i64)
            .push(" OFFSET ")
            .push_bind(page.offset as i64);

        let rows = page_builder.build().fetch_all(&mut **transaction).await?;
        let items = rows
            .iter()
            .map(ContractModel::try_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, total as usize, page.limit, page.offset))
    }
}
