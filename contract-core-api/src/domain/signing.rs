use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The statement a signer commits to: which contract, who, and the digest of
/// the exact content that was presented for signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningMessage {
    pub contract_id: Uuid,
    pub signer_id: Uuid,
    pub content_digest: String,
}

impl SigningMessage {
    pub fn new(contract_id: Uuid, signer_id: Uuid, content_digest: impl Into<String>) -> Self {
        Self {
            contract_id,
            signer_id,
            content_digest: content_digest.into(),
        }
    }

    /// Canonical byte encoding fed to validators.
    pub fn to_bytes(&self) -> Vec<u8> {
        format!("{}:{}:{}", self.contract_id, self.signer_id, self.content_digest).into_bytes()
    }
}

/// Identifier families issued by a `NumberGenerator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberKind {
    Contract,
    Amendment,
    Renewal,
}
