use async_trait::async_trait;

use crate::domain::{ContractEvent, NumberKind, SigningMessage};
use crate::error::ContractResult;

/// Best-effort publisher of lifecycle events.
///
/// Implementations retry internally and never surface delivery failures to the
/// caller; a state change that has committed stays reported as successful.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: ContractEvent);
}

/// Verifies a submitted signature against the message the signer committed to.
#[async_trait]
pub trait SignatureValidator: Send + Sync {
    /// Returns `Ok(true)` for a valid signature, `Ok(false)` or
    /// `Err(SignatureInvalid)` otherwise.
    async fn validate(&self, message: &SigningMessage, signature_data: &str) -> ContractResult<bool>;
}

/// Issues human-readable contract, amendment and renewal numbers.
#[async_trait]
pub trait NumberGenerator: Send + Sync {
    /// `seed` is the parent contract number for amendments and renewals.
    async fn next(&self, kind: NumberKind, seed: Option<&str>) -> ContractResult<String>;
}
