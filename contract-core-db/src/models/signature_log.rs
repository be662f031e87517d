use chrono::{DateTime, Utc};
use heapless::String as HeaplessString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Identifiable;

/// Append-only record of one successful signing event. Never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureLogModel {
    pub id: Uuid,
    pub contract_id: Uuid,
    pub user_id: Uuid,
    pub signature_data: String,
    /// Digest of the content that was signed, kept so verification survives
    /// later content changes on the contract
    pub content_digest: String,
    pub signed_at: DateTime<Utc>,
    pub ip_address: Option<HeaplessString<45>>,
    pub user_agent: Option<String>,
}

impl Identifiable for SignatureLogModel {
    fn get_id(&self) -> Uuid {
        self.id
    }
}
