use contract_core_db::models::AmendmentModel;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::AmendmentRepositoryImpl;
use crate::utils::TryFromRow;

impl AmendmentRepositoryImpl {
    pub(super) async fn find_by_original_contract_id_impl(
        repo: &AmendmentRepositoryImpl,
        original_contract_id: Uuid,
    ) -> Result<Vec<AmendmentModel>, Box<dyn Error + Send + Sync>> {
        let rows = {
            let mut tx = repo.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
            sqlx::query(
                "SELECT * FROM contract_amendment WHERE original_contract_id = $1 ORDER BY created_at DESC",
            )
            .bind(original_contract_id)
            .fetch_all(&mut **transaction)
            .await?
        };

        rows.iter().map(AmendmentModel::try_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::contract::contract_repository::test_utils::{
        create_test_contract, unique_contract_number,
    };
    use crate::test_helper::setup_test_context;
    use chrono::{Duration, Utc};
    use contract_core_api::ContractType;
    use contract_core_db::models::AmendmentModel;
    use contract_core_db::repository::{AmendmentRepository, CreateBatch};
    use uuid::Uuid;

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    #[serial_test::serial]
    async fn test_amendments_listed_newest_first() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let ctx = setup_test_context().await?;
        let repos = ctx.contract_repos();

        let group_id = Uuid::new_v4();
        let original = create_test_contract(group_id, &unique_contract_number("CC"));
        let mut older = create_test_contract(group_id, &unique_contract_number("AMD"));
        older.contract_type = ContractType::Amendment;
        older.parent_contract_id = Some(original.id);
        let mut newer = older.clone();
        newer.id = Uuid::new_v4();
        newer.contract_number = heapless::String::try_from(unique_contract_number("AMD").as_str()).unwrap();
        repos
            .contract_repository
            .create_batch(vec![original.clone(), older.clone(), newer.clone()])
            .await?;

        let now = Utc::now();
        let link = |amendment_id: Uuid, created_at: chrono::DateTime<Utc>| AmendmentModel {
            id: Uuid::new_v4(),
            original_contract_id: original.id,
            amendment_contract_id: amendment_id,
            amendment_reason: "Adjust shares".to_string(),
            changes_summary: None,
            created_by: original.created_by,
            created_at,
        };
        repos
            .amendment_repository
            .create_batch(vec![
                link(older.id, now - Duration::hours(1)),
                link(newer.id, now),
            ])
            .await?;

        let listed = repos
            .amendment_repository
            .find_by_original_contract_id(original.id)
            .await?;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].amendment_contract_id, newer.id);

        let back_link = repos
            .amendment_repository
            .find_by_amendment_contract_id(older.id)
            .await?;
        assert_eq!(back_link.map(|l| l.original_contract_id), Some(original.id));

        Ok(())
    }
}
