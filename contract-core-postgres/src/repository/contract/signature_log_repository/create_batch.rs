use async_trait::async_trait;
use contract_core_db::models::SignatureLogModel;
use contract_core_db::repository::create_batch::CreateBatch;
use std::error::Error;

use super::repo_impl::SignatureLogRepositoryImpl;

impl SignatureLogRepositoryImpl {
    pub(super) async fn create_batch_impl(
        repo: &SignatureLogRepositoryImpl,
        items: Vec<SignatureLogModel>,
    ) -> Result<Vec<SignatureLogModel>, Box<dyn Error + Send + Sync>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = repo.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

        for item in &items {
            sqlx::query(
                r#"
                INSERT INTO contract_signature_log
                (id, contract_id, user_id, signature_data, content_digest, signed_at, ip_address, user_agent)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(item.id)
            .bind(item.contract_id)
            .bind(item.user_id)
            .bind(&item.signature_data)
            .bind(&item.content_digest)
            .bind(item.signed_at)
            .bind(item.ip_address.as_ref().map(|s| s.as_str()))
            .bind(&item.user_agent)
            .execute(&mut **transaction)
            .await?;
        }

        Ok(items)
    }
}

#[async_trait]
impl CreateBatch<SignatureLogModel> for SignatureLogRepositoryImpl {
    async fn create_batch(
        &self,
        items: Vec<SignatureLogModel>,
    ) -> Result<Vec<SignatureLogModel>, Box<dyn Error + Send + Sync>> {
        Self::create_batch_impl(self, items).await
    }
}
