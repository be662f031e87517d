use chrono::{DateTime, Utc};
use contract_core_api::{ContractStatus, ContractType};
use heapless::String as HeaplessString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Identifiable;
use crate::utils::hash_as_i64;

/// A legal contract between the parties of a shared-vehicle group.
///
/// Content and dates are only mutable while the contract is a `Draft`; after
/// that only status-transition operations touch the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractModel {
    pub id: Uuid,
    /// Human-readable unique identifier, e.g. `CC-20260116-7QX2LM`
    pub contract_number: HeaplessString<64>,
    pub group_id: Uuid,
    pub contract_type: ContractType,
    pub title: String,
    /// Rendered legal text
    pub content: String,
    pub status: ContractStatus,
    pub effective_date: DateTime<Utc>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub auto_renew: bool,
    /// Contract this one derives from (amendments and renewals)
    pub parent_contract_id: Option<Uuid>,
    pub activated_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Hash of the entity with hash field set to 0
    /// - 0: for new entities not yet persisted
    /// - Non-zero: the value the row was last written with; updates are
    ///   conditional on it so concurrent writers cannot silently overwrite
    pub hash: i64,
}

impl ContractModel {
    pub fn is_draft(&self) -> bool {
        self.status == ContractStatus::Draft
    }

    /// Hash of this entity as it would be stored, i.e. computed with `hash = 0`.
    pub fn computed_hash(&self) -> Result<i64, String> {
        let mut for_hashing = self.clone();
        for_hashing.hash = 0;
        hash_as_i64(&for_hashing)
    }

    /// Whole days from `now` until expiry, rounded up; `None` without an expiry date.
    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> Option<i64> {
        self.expiry_date.map(|expiry| {
            let seconds = (expiry - now).num_seconds();
            (seconds + 86_399).div_euclid(86_400)
        })
    }
}

impl Identifiable for ContractModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}
