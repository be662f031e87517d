use async_trait::async_trait;
use contract_core_db::models::ContractModel;
use contract_core_db::repository::load_batch::LoadBatch;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::ContractRepositoryImpl;
use crate::utils::TryFromRow;

impl ContractRepositoryImpl {
    pub(super) async fn load_batch_impl(
        repo: &ContractRepositoryImpl,
        ids: &[Uuid],
    ) -> Result<Vec<Option<ContractModel>>, Box<dyn Error + Send + Sync>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = {
            let mut tx = repo.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
            sqlx::query("SELECT * FROM contract WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(&mut **transaction)
                .await?
        };

        let mut item_map = std::collections::HashMap::with_capacity(rows.len());
        for row in rows {
            let item = ContractModel::try_from_row(&row)?;
            item_map.insert(item.id, item);
        }

        Ok(ids.iter().map(|id| item_map.remove(id)).collect())
    }
}

#[async_trait]
impl LoadBatch<ContractModel> for ContractRepositoryImpl {
    async fn load_batch(
        &self,
        ids: &[Uuid],
    ) -> Result<Vec<Option<ContractModel>>, Box<dyn Error + Send + Sync>> {
        Self::load_batch_impl(self, ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::{create_test_contract, unique_contract_number};
    use crate::test_helper::setup_test_context;
    use contract_core_db::repository::{CreateBatch, LoadBatch};
    use uuid::Uuid;

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    #[serial_test::serial]
    async fn test_load_batch_preserves_order_and_gaps() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let contract_repo = &ctx.contract_repos().contract_repository;

        let group_id = Uuid::new_v4();
        let saved = contract_repo
            .create_batch(vec![
                create_test_contract(group_id, &unique_contract_number("CC")),
                create_test_contract(group_id, &unique_contract_number("CC")),
            ])
            .await?;

        let missing = Uuid::new_v4();
        let loaded = contract_repo
            .load_batch(&[saved[1].id, missing, saved[0].id])
            .await?;

        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded[0].as_ref().map(|c| c.id), Some(saved[1].id));
        assert!(loaded[1].is_none());
        assert_eq!(loaded[2].as_ref(), Some(&saved[0]));

        Ok(())
    }
}
