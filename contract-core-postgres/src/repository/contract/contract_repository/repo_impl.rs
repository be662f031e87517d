use async_trait::async_trait;
use contract_core_db::models::ContractModel;
use contract_core_db::repository::{ContractQuery, ContractRepository, Page, PageRequest, RepoError};
use sqlx::{postgres::PgRow, Row};
use std::error::Error;
use uuid::Uuid;

use crate::executor::Executor;
use crate::utils::{get_heapless_string, TryFromRow};

pub struct ContractRepositoryImpl {
    pub executor: Executor,
}

impl ContractRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }
}

impl TryFromRow<PgRow> for ContractModel {
    fn try_from_row(row: &PgRow) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(ContractModel {
            id: row.try_get("id")?,
            contract_number: get_heapless_string(row, "contract_number")?,
            group_id: row.try_get("group_id")?,
            contract_type: row.try_get("contract_type")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            status: row.try_get("status")?,
            effective_date: row.try_get("effective_date")?,
            expiry_date: row.try_get("expiry_date")?,
            auto_renew: row.try_get("auto_renew")?,
            parent_contract_id: row.try_get("parent_contract_id")?,
            activated_at: row.try_get("activated_at")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            hash: row.try_get("hash")?,
        })
    }
}

#[async_trait]
impl ContractRepository for ContractRepositoryImpl {
    async fn lock_by_id(&self, id: Uuid) -> Result<Option<ContractModel>, RepoError> {
        Self::lock_by_id_impl(self, id).await
    }

    async fn find_by_contract_number(
        &self,
        contract_number: &str,
    ) -> Result<Option<ContractModel>, RepoError> {
        Self::find_by_contract_number_impl(self, contract_number).await
    }

    async fn query(
        &self,
        query: &ContractQuery,
        page: PageRequest,
    ) -> Result<Page<ContractModel>, RepoError> {
        Self::query_impl(self, query, page).await
    }
}
