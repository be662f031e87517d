use async_trait::async_trait;
use contract_core_db::models::ContractModel;
use contract_core_db::repository::delete_batch::DeleteBatch;
use std::error::Error;
use uuid::Uuid;

use super::repo_impl::ContractRepositoryImpl;

impl ContractRepositoryImpl {
    pub(super) async fn delete_batch_impl(
        repo: &ContractRepositoryImpl,
        ids: &[Uuid],
    ) -> Result<usize, Box<dyn Error + Send + Sync>> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut tx = repo.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

        // Parties, signature logs and amendment links cascade
        let result = sqlx::query("DELETE FROM contract WHERE id = ANY($1)")
            .bind(ids)
            .execute(&mut **transaction)
            .await?;

        Ok(result.rows_affected() as usize)
    }
}

#[async_trait]
impl DeleteBatch<ContractModel> for ContractRepositoryImpl {
    async fn delete_batch(&self, ids: &[Uuid]) -> Result<usize, Box<dyn Error + Send + Sync>> {
        Self::delete_batch_impl(self, ids).await
    }
}
