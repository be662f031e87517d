use std::error::Error;
use uuid::Uuid;

use super::repo_impl::PartyRepositoryImpl;

impl PartyRepositoryImpl {
    pub(super) async fn delete_by_contract_id_impl(
        repo: &PartyRepositoryImpl,
        contract_id: Uuid,
    ) -> Result<usize, Box<dyn Error + Send + Sync>> {
        let mut tx = repo.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

        let result = sqlx::query("DELETE FROM contract_party WHERE contract_id = $1")
            .bind(contract_id)
            .execute(&mut **transaction)
            .await?;

        Ok(result.rows_affected() as usize)
    }
}
