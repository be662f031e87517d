use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Identifiable;

/// Links an amendment contract (1:1) to the contract it amends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmendmentModel {
    pub id: Uuid,
    pub original_contract_id: Uuid,
    pub amendment_contract_id: Uuid,
    pub amendment_reason: String,
    pub changes_summary: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl Identifiable for AmendmentModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}
