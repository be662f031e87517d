use async_trait::async_trait;
use contract_core_db::models::AmendmentModel;
use contract_core_db::repository::create_batch::CreateBatch;
use std::error::Error;

use super::repo_impl::AmendmentRepositoryImpl;

impl AmendmentRepositoryImpl {
    pub(super) async fn create_batch_impl(
        repo: &AmendmentRepositoryImpl,
        items: Vec<AmendmentModel>,
    ) -> Result<Vec<AmendmentModel>, Box<dyn Error + Send + Sync>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = repo.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO contract_amendment
                (id, original_contract_id, amendment_contract_id, amendment_reason, changes_summary, created_by, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(item.id)
            .bind(item.original_contract_id)
            .bind(item.amendment_contract_id)
            .bind(&item.amendment_reason)
            .bind(&item.changes_summary)
            .bind(item.created_by)
            .bind(item.created_at)
            .execute(&mut **transaction)
            .await?;
        }

        Ok(items)
    }
}

#[async_trait]
impl CreateBatch<AmendmentModel> for AmendmentRepositoryImpl {
    async fn create_batch(
        &self,
        items: Vec<AmendmentModel>,
    ) -> Result<Vec<AmendmentModel>, Box<dyn Error + Send + Sync>> {
        Self::create_batch_impl(self, items).await
    }
}
