use contract_core_db::models::PartyModel;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::PartyRepositoryImpl;
use crate::utils::TryFromRow;

impl PartyRepositoryImpl {
    pub(super) async fn find_by_contract_id_impl(
        repo: &PartyRepositoryImpl,
        contract_id: Uuid,
    ) -> Result<Vec<PartyModel>, Box<dyn Error + Send + Sync>> {
        let rows = {
            let mut tx = repo.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
            sqlx::query(
                "SELECT * FROM contract_party WHERE contract_id = $1 ORDER BY signing_order, created_at",
            )
            .bind(contract_id)
            .fetch_all(&mut **transaction)
            .await?
        };

        rows.iter().map(PartyModel::try_from_row).collect()
    }
}
