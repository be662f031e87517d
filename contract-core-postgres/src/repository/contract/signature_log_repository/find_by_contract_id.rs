use contract_core_db::models::SignatureLogModel;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::SignatureLogRepositoryImpl;
use crate::utils::TryFromRow;

impl SignatureLogRepositoryImpl {
    pub(super) async fn find_by_contract_id_impl(
        repo: &SignatureLogRepositoryImpl,
        contract_id: Uuid,
    ) -> Result<Vec<SignatureLogModel>, Box<dyn Error + Send + Sync>> {
        let rows = {
            let mut tx = repo.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
            sqlx::query("SELECT * FROM contract_signature_log WHERE contract_id = $1 ORDER BY signed_at")
                .bind(contract_id)
                .fetch_all(&mut **transaction)
                .await?
        };

        rows.iter().map(SignatureLogModel::try_from_row).collect()
    }
}
