use async_trait::async_trait;
use contract_core_db::models::ContractModel;
use contract_core_db::repository::update_batch::UpdateBatch;
use std::error::Error;

use super::repo_impl::ContractRepositoryImpl;
use crate::utils::expect_single_row;

impl ContractRepositoryImpl {
    pub(super) async fn update_batch_impl(
        repo: &ContractRepositoryImpl,
        items: Vec<ContractModel>,
    ) -> Result<Vec<ContractModel>, Box<dyn Error + Send + Sync>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut updated_items = Vec::with_capacity(items.len());
        let mut tx = repo.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

        for mut entity in items {
            // 1. The hash the row was read with guards the write
            let previous_hash = entity.hash;

            // 2. Skip entities that did not change
            let computed_hash = entity.computed_hash()?;
            if computed_hash == previous_hash {
                updated_items.push(entity);
                continue;
            }
            entity.hash = computed_hash;

            // 3. Conditional update on the previous hash
            let result = sqlx::query(
                r#"
                UPDATE contract SET
                    contract_number = $2,
                    group_id = $3,
                    contract_type = $4,
                    title = $5,
                    content = $6,
                    status = $7,
                    effective_date = $8,
                    expiry_date = $9,
                    auto_renew = $10,
                    parent_contract_id = $11,
                    activated_at = $12,
                    updated_at = $13,
                    hash = $14
                WHERE id = $1
                  AND hash = $15
                "#,
            )
            .bind(entity.id)
            .bind(entity.contract_number.as_str())
            .bind(entity.group_id)
            .bind(entity.contract_type)
            .bind(&entity.title)
            .bind(&entity.content)
            .bind(entity.status)
            .bind(entity.effective_date)
            .bind(entity.expiry_date)
            .bind(entity.auto_renew)
            .bind(entity.parent_contract_id)
            .bind(entity.activated_at)
            .bind(entity.updated_at)
            .bind(entity.hash)
            .bind(previous_hash)
            .execute(&mut **transaction)
            .await?;

            expect_single_row(result.rows_affected(), "contract", entity.id)?;
            updated_items.push(entity);
        }

        Ok(updated_items)
    }
}

#[async_trait]
impl UpdateBatch<ContractModel> for ContractRepositoryImpl {
    async fn update_batch(
        &self,
        items: Vec<ContractModel>,
    ) -> Result<Vec<ContractModel>, Box<dyn Error + Send + Sync>> {
        Self::update_batch_impl(self, items).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::{create_test_contract, unique_contract_number};
    use crate::test_helper::setup_test_context;
    use contract_core_api::ContractStatus;
    use contract_core_db::repository::{CreateBatch, LoadBatch, UpdateBatch};
    use uuid::Uuid;

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    #[serial_test::serial]
    async fn test_update_batch() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let contract_repo = &ctx.contract_repos().contract_repository;

        let saved = contract_repo
            .create_batch(vec![create_test_contract(Uuid::new_v4(), &unique_contract_number("CC"))])
            .await?;

        let mut contract = saved[0].clone();
        contract.status = ContractStatus::PendingSignatures;
        let updated = contract_repo.update_batch(vec![contract]).await?;

        assert_ne!(updated[0].hash, saved[0].hash);
        let reloaded = contract_repo.load(saved[0].id).await?.unwrap();
        assert_eq!(reloaded.status, ContractStatus::PendingSignatures);
        assert_eq!(reloaded.hash, updated[0].hash);

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    #[serial_test::serial]
    async fn test_update_with_stale_hash_fails() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let contract_repo = &ctx.contract_repos().contract_repository;

        let saved = contract_repo
            .create_batch(vec![create_test_contract(Uuid::new_v4(), &unique_contract_number("CC"))])
            .await?;

        let mut first = saved[0].clone();
        first.title = "First writer".to_string();
        contract_repo.update_batch(vec![first]).await?;

        let mut stale = saved[0].clone();
        stale.title = "Second writer".to_string();
        let result = contract_repo.update_batch(vec![stale]).await;

        assert!(result.is_err());

        Ok(())
    }
}
