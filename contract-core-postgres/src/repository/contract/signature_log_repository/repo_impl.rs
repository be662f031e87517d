use async_trait::async_trait;
use contract_core_db::models::SignatureLogModel;
use contract_core_db::repository::{RepoError, SignatureLogRepository};
use sqlx::{postgres::PgRow, Row};
use std::error::Error;
use uuid::Uuid;

use crate::executor::Executor;
use crate::utils::{get_optional_heapless_string, TryFromRow};

pub struct SignatureLogRepositoryImpl {
    pub executor: Executor,
}

impl SignatureLogRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }
}

impl TryFromRow<PgRow> for SignatureLogModel {
    fn try_from_row(row: &PgRow) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(SignatureLogModel {
            id: row.try_get("id")?,
            contract_id: row.try_get("contract_id")?,
            user_id: row.try_get("user_id")?,
            signature_data: row.try_get("signature_data")?,
            content_digest: row.try_get("content_digest")?,
            signed_at: row.try_get("signed_at")?,
            ip_address: get_optional_heapless_string(row, "ip_address")?,
            user_agent: row.try_get("user_agent")?,
        })
    }
}

#[async_trait]
impl SignatureLogRepository for SignatureLogRepositoryImpl {
    async fn find_by_contract_id(
        &self,
        contract_id: Uuid,
    ) -> Result<Vec<SignatureLogModel>, RepoError> {
        Self::find_by_contract_id_impl(self, contract_id).await
    }

    async fn find_by_signature(
        &self,
        contract_id: Uuid,
        signature_data: &str,
    ) -> Result<Option<SignatureLogModel>, RepoError> {
        Self::find_by_signature_impl(self, contract_id, signature_data).await
    }
}
