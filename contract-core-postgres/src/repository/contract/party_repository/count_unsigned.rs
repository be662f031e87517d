use std::error::Error;
use uuid::Uuid;

use super::repo_impl::PartyRepositoryImpl;

impl PartyRepositoryImpl {
    pub(super) async fn count_unsigned_impl(
        repo: &PartyRepositoryImpl,
        contract_id: Uuid,
    ) -> Result<i64, Box<dyn Error + Send + Sync>> {
        let mut tx = repo.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM contract_party WHERE contract_id = $1 AND NOT has_signed",
        )
        .bind(contract_id)
        .fetch_one(&mut **transaction)
        .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_utils::create_test_party;
    use crate::repository::contract::contract_repository::test_utils::{
        create_test_contract, unique_contract_number,
    };
    use crate::test_helper::setup_test_context;
    use chrono::Utc;
    use contract_core_db::repository::{CreateBatch, PartyRepository, UpdateBatch};
    use uuid::Uuid;

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    #[serial_test::serial]
    async fn test_count_unsigned_sees_uncommitted_signature() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let repos = ctx.contract_repos();

        let contract = create_test_contract(Uuid::new_v4(), &unique_contract_number("CC"));
        repos.contract_repository.create_batch(vec![contract.clone()]).await?;
        let parties = repos
            .party_repository
            .create_batch(vec![
                create_test_party(contract.id, 60, 1),
                create_test_party(contract.id, 40, 2),
            ])
            .await?;
        assert_eq!(repos.party_repository.count_unsigned(contract.id).await?, 2);

        let mut signed = parties[0].clone();
        signed.has_signed = true;
        signed.signed_at = Some(Utc::now());
        signed.signature_data = Some("sig".to_string());
        repos.party_repository.update_batch(vec![signed]).await?;

        assert_eq!(repos.party_repository.count_unsigned(contract.id).await?, 1);

        Ok(())
    }
}
