use async_trait::async_trait;
use contract_core_db::models::ContractModel;
use contract_core_db::repository::create_batch::CreateBatch;
use std::error::Error;

use super::repo_impl::ContractRepositoryImpl;

impl ContractRepositoryImpl {
    pub(super) async fn create_batch_impl(
        repo: &ContractRepositoryImpl,
        items: Vec<ContractModel>,
    ) -> Result<Vec<ContractModel>, Box<dyn Error + Send + Sync>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut saved_items = Vec::with_capacity(items.len());
        let mut tx = repo.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

        for mut item in items {
            item.hash = item.computed_hash()?;

            sqlx::query(
                r#"
                INSERT INTO contract
                (id, contract_number, group_id, contract_type, title, content, status, effective_date, expiry_date, auto_renew, parent_contract_id, activated_at, created_by, created_at, updated_at, hash)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
                "#,
            )
            .bind(item.id)
            .bind(item.contract_number.as_str())
            .bind(item.group_id)
            .bind(item.contract_type)
            .bind(&item.title)
            .bind(&item.content)
            .bind(item.status)
            .bind(item.effective_date)
            .bind(item.expiry_date)
            .bind(item.auto_renew)
            .bind(item.parent_contract_id)
            .bind(item.activated_at)
            .bind(item.created_by)
            .bind(item.created_at)
            .bind(item.updated_at)
            .bind(item.hash)
            .execute(&mut **transaction)
            .await?;

            saved_items.push(item);
        }

        Ok(saved_items)
    }
}

#[async_trait]
impl CreateBatch<ContractModel> for ContractRepositoryImpl {
    async fn create_batch(
        &self,
        items: Vec<ContractModel>,
    ) -> Result<Vec<ContractModel>, Box<dyn Error + Send + Sync>> {
        Self::create_batch_impl(self, items).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::{create_test_contract, unique_contract_number};
    use crate::test_helper::setup_test_context;
    use contract_core_db::repository::create_batch::CreateBatch;
    use uuid::Uuid;

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    #[serial_test::serial]
    async fn test_create_batch() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let contract_repo = &ctx.contract_repos().contract_repository;

        let group_id = Uuid::new_v4();
        let contracts = vec![
            create_test_contract(group_id, &unique_contract_number("CC")),
            create_test_contract(group_id, &unique_contract_number("CC")),
        ];

        let saved = contract_repo.create_batch(contracts).await?;

        assert_eq!(saved.len(), 2);
        for contract in &saved {
            assert_ne!(contract.hash, 0);
            assert_eq!(contract.hash, contract.computed_hash()?);
        }

        Ok(())
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    #[serial_test::serial]
    async fn test_create_batch_rejects_duplicate_number() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let contract_repo = &ctx.contract_repos().contract_repository;

        let number = unique_contract_number("CC");
        contract_repo
            .create_batch(vec![create_test_contract(Uuid::new_v4(), &number)])
            .await?;
        let duplicate = contract_repo
            .create_batch(vec![create_test_contract(Uuid::new_v4(), &number)])
            .await;

        assert!(duplicate.is_err());

        Ok(())
    }
}
