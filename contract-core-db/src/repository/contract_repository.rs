use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contract_core_api::{ContractStatus, ContractType};
use uuid::Uuid;

use super::pagination::{Page, PageRequest};
use super::{CreateBatch, DeleteBatch, LoadBatch, RepoError, UpdateBatch};
use crate::models::ContractModel;

/// Filter for contract queries. All set fields must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractQuery {
    pub group_id: Option<Uuid>,
    /// Contracts on which this user is a party
    pub party_user_id: Option<Uuid>,
    pub status: Option<ContractStatus>,
    pub contract_type: Option<ContractType>,
    pub parent_contract_id: Option<Uuid>,
    /// Inclusive lower bound on `expiry_date`
    pub expiry_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `expiry_date`
    pub expiry_before: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `expiry_date`
    pub expiry_until: Option<DateTime<Utc>>,
}

impl ContractQuery {
    pub fn matches(&self, contract: &ContractModel, party_user_ids: &[Uuid]) -> bool {
        self.group_id.map_or(true, |g| contract.group_id == g)
            && self.status.map_or(true, |s| contract.status == s)
            && self.contract_type.map_or(true, |t| contract.contract_type == t)
            && self
                .parent_contract_id
                .map_or(true, |p| contract.parent_contract_id == Some(p))
            && self
                .party_user_id
                .map_or(true, |u| party_user_ids.contains(&u))
            && self
                .expiry_from
                .map_or(true, |from| contract.expiry_date.is_some_and(|e| e >= from))
            && self
                .expiry_before
                .map_or(true, |before| contract.expiry_date.is_some_and(|e| e < before))
            && self
                .expiry_until
                .map_or(true, |until| contract.expiry_date.is_some_and(|e| e <= until))
    }
}

/// Contract persistence. Results of `query` are ordered newest first.
#[async_trait]
pub trait ContractRepository:
    CreateBatch<ContractModel>
    + LoadBatch<ContractModel>
    + UpdateBatch<ContractModel>
    + DeleteBatch<ContractModel>
{
    /// Load a contract and hold a write lock on its row until the session ends.
    async fn lock_by_id(&self, id: Uuid) -> Result<Option<ContractModel>, RepoError>;

    async fn find_by_contract_number(
        &self,
        contract_number: &str,
    ) -> Result<Option<ContractModel>, RepoError>;

    async fn query(
        &self,
        query: &ContractQuery,
        page: PageRequest,
    ) -> Result<Page<ContractModel>, RepoError>;
}
