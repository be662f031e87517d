use async_trait::async_trait;
use uuid::Uuid;

use super::{CreateBatch, RepoError};
use crate::models::SignatureLogModel;

/// Append-only signature audit trail; there is deliberately no update or delete.
#[async_trait]
pub trait SignatureLogRepository: CreateBatch<SignatureLogModel> {
    /// Logs of a contract ordered by `signed_at`.
    async fn find_by_contract_id(
        &self,
        contract_id: Uuid,
    ) -> Result<Vec<SignatureLogModel>, RepoError>;

    async fn find_by_signature(
        &self,
        contract_id: Uuid,
        signature_data: &str,
    ) -> Result<Option<SignatureLogModel>, RepoError>;
}
