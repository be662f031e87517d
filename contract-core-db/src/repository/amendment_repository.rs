use async_trait::async_trait;
use uuid::Uuid;

use super::{CreateBatch, RepoError};
use crate::models::AmendmentModel;

#[async_trait]
pub trait AmendmentRepository: CreateBatch<AmendmentModel> {
    /// Amendments of a contract, newest first.
    async fn find_by_original_contract_id(
        &self,
        original_contract_id: Uuid,
    ) -> Result<Vec<AmendmentModel>, RepoError>;

    async fn find_by_amendment_contract_id(
        &self,
        amendment_contract_id: Uuid,
    ) -> Result<Option<AmendmentModel>, RepoError>;
}
