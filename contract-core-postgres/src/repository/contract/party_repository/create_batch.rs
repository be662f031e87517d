use async_trait::async_trait;
use contract_core_db::models::PartyModel;
use contract_core_db::repository::create_batch::CreateBatch;
use std::error::Error;

use super::repo_impl::PartyRepositoryImpl;

impl PartyRepositoryImpl {
    pub(super) async fn create_batch_impl(
        repo: &PartyRepositoryImpl,
        items: Vec<PartyModel>,
    ) -> Result<Vec<PartyModel>, Box<dyn Error + Send + Sync>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = repo.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO contract_party
                (id, contract_id, user_id, party_role, ownership_percentage, signing_order, has_signed, signed_at, signature_data, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(item.id)
            .bind(item.contract_id)
            .bind(item.user_id)
            .bind(item.party_role)
            .bind(item.ownership_percentage)
            .bind(item.signing_order)
            .bind(item.has_signed)
            .bind(item.signed_at)
            .bind(&item.signature_data)
            .bind(item.created_at)
            .execute(&mut **transaction)
            .await?;
        }

        Ok(items)
    }
}

#[async_trait]
impl CreateBatch<PartyModel> for PartyRepositoryImpl {
    async fn create_batch(
        &self,
        items: Vec<PartyModel>,
    ) -> Result<Vec<PartyModel>, Box<dyn Error + Send + Sync>> {
        Self::create_batch_impl(self, items).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::create_test_party;
    use crate::repository::contract::contract_repository::test_utils::{
        create_test_contract, unique_contract_number,
    };
    use crate::test_helper::setup_test_context;
    use contract_core_db::repository::{CreateBatch, PartyRepository};
    use uuid::Uuid;

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    #[serial_test::serial]
    async fn test_create_batch_rejects_duplicate_user() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let repos = ctx.contract_repos();

        let contract = create_test_contract(Uuid::new_v4(), &unique_contract_number("CC"));
        repos.contract_repository.create_batch(vec![contract.clone()]).await?;

        let first = create_test_party(contract.id, 60, 1);
        let mut second = create_test_party(contract.id, 40, 2);
        repos
            .party_repository
            .create_batch(vec![first.clone(), second.clone()])
            .await?;
        assert_eq!(repos.party_repository.find_by_contract_id(contract.id).await?.len(), 2);

        second.id = Uuid::new_v4();
        second.user_id = first.user_id;
        assert!(repos.party_repository.create_batch(vec![second]).await.is_err());

        Ok(())
    }
}
