use contract_core_db::models::SignatureLogModel;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::SignatureLogRepositoryImpl;
use crate::utils::TryFromRow;

impl SignatureLogRepositoryImpl {
    pub(super) async fn find_by_signature_impl(
        repo: &SignatureLogRepositoryImpl,
        contract_id: Uuid,
        signature_data: &str,
    ) -> Result<Option<SignatureLogModel>, Box<dyn Error + Send + Sync>> {
        let row = {
            let mut tx = repo.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
            sqlx::query(
                "SELECT * FROM contract_signature_log WHERE contract_id = $1 AND signature_data = $2 LIMIT 1",
            )
            .bind(contract_id)
            .bind(signature_data)
            .fetch_optional(&mut **transaction)
            .await?
        };

        row.map(|row| SignatureLogModel::try_from_row(&row)).transpose()
    }
}
