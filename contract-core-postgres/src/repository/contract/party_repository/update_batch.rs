use async_trait::async_trait;
use contract_core_db::models::PartyModel;
use contract_core_db::repository::update_batch::UpdateBatch;
use std::error::Error;

use super::repo_impl::PartyRepositoryImpl;
use crate::utils::expect_single_row;

impl PartyRepositoryImpl {
    /// Only signature state changes after creation.
    pub(super) async fn update_batch_impl(
        repo: &PartyRepositoryImpl,
        items: Vec<PartyModel>,
    ) -> Result<Vec<PartyModel>, Box<dyn Error + Send + Sync>> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = repo.executor.tx.lock().await;
        let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;

        for item in &items {
            let result = sqlx::query(
                r#"
                UPDATE contract_party SET
                    has_signed = $2,
                    signed_at = $3,
                    signature_data = $4
                WHERE id = $1
                "#,
            )
            .bind(item.id)
            .bind(item.has_signed)
            .bind(item.signed_at)
            .bind(&item.signature_data)
            .execute(&mut **transaction)
            .await?;

            expect_single_row(result.rows_affected(), "contract_party", item.id)?;
        }

        Ok(items)
    }
}

#[async_trait]
impl UpdateBatch<PartyModel> for PartyRepositoryImpl {
    async fn update_batch(
        &self,
        items: Vec<PartyModel>,
    ) -> Result<Vec<PartyModel>, Box<dyn Error + Send + Sync>> {
        Self::update_batch_impl(self, items).await
    }
}
