use async_trait::async_trait;
use uuid::Uuid;

use super::{CreateBatch, RepoError, UpdateBatch};
use crate::models::PartyModel;

/// Party persistence. `(contract_id, user_id)` is unique.
#[async_trait]
pub trait PartyRepository: CreateBatch<PartyModel> + UpdateBatch<PartyModel> {
    /// Parties of a contract ordered by `signing_order`.
    async fn find_by_contract_id(&self, contract_id: Uuid) -> Result<Vec<PartyModel>, RepoError>;

    async fn count_unsigned(&self, contract_id: Uuid) -> Result<i64, RepoError>;

    async fn delete_by_contract_id(&self, contract_id: Uuid) -> Result<usize, RepoError>;
}
