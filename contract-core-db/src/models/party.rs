use chrono::{DateTime, Utc};
use contract_core_api::PartyRole;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Identifiable;

/// A signatory attached to exactly one contract.
///
/// `(contract_id, user_id)` is unique. `signing_order` is informational and
/// does not block out-of-order signing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartyModel {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub user_id: Uuid,
    pub party_role: PartyRole,
    /// 0-100 with 2-decimal precision
    pub ownership_percentage: Decimal,
    pub signing_order: i32,
    pub has_signed: bool,
    pub signed_at: Option<DateTime<Utc>>,
    pub signature_data: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PartyModel {
    /// Copy of this party for a derived contract, with the signature state reset.
    pub fn unsigned_copy_for(&self, contract_id: Uuid, now: DateTime<Utc>) -> PartyModel {
        PartyModel {
            id: Uuid::new_v4(),
            contract_id,
            user_id: self.user_id,
            party_role: self.party_role,
            ownership_percentage: self.ownership_percentage,
            signing_order: self.signing_order,
            has_signed: false,
            signed_at: None,
            signature_data: None,
            created_at: now,
        }
    }
}

impl Identifiable for PartyModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}
