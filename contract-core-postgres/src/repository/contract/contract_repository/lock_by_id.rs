use contract_core_db::models::ContractModel;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::ContractRepositoryImpl;
use crate::utils::TryFromRow;

impl ContractRepositoryImpl {
    /// `SELECT ... FOR UPDATE`: concurrent sessions locking the same contract
    /// wait here until this session commits or rolls back.
    pub(super) async fn lock_by_id_impl(
        repo: &ContractRepositoryImpl,
        id: Uuid,
    ) -> Result<Option<ContractModel>, Box<dyn Error + Send + Sync>> {
        let row = {
            let mut tx = repo.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
            sqlx::query("SELECT * FROM contract WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut **transaction)
                .await?
        };

        row.map(|row| ContractModel::try_from_row(&row)).transpose()
    }
}
