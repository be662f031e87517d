use contract_core_db::models::AmendmentModel;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::AmendmentRepositoryImpl;
use crate::utils::TryFromRow;

impl AmendmentRepositoryImpl {
    pub(super) async fn find_by_amendment_contract_id_impl(
        repo: &AmendmentRepositoryImpl,
        amendment_contract_id: Uuid,
    ) -> Result<Option<AmendmentModel>, Box<dyn Error + Send + Sync>> {
        let row = {
            let mut tx = repo.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
            sqlx::query("SELECT * FROM contract_amendment WHERE amendment_contract_id = $1")
                .bind(amendment_contract_id)
                .fetch_optional(&mut **transaction)
                .await?
        };

        row.map(|row| AmendmentModel::try_from_row(&row)).transpose()
    }
}
