use async_trait::async_trait;

use super::RepoError;
use crate::models::Identifiable;

/// Generic repository trait for updating multiple entities in a batch
///
/// All updates run on the session's transaction. Implementations for hashed
/// entities skip unchanged items and make each write conditional on the
/// previously stored hash; a mismatch is reported as an error rather than
/// overwriting a concurrent change.
#[async_trait]
pub trait UpdateBatch<T: Identifiable>: Send + Sync {
    /// Update multiple items on the current transaction
    ///
    /// # Returns
    /// * `Ok(Vec<T>)` - The entities as stored, with refreshed generated fields
    /// * `Err` - If an entity is missing or was modified concurrently
    async fn update_batch(&self, items: Vec<T>) -> Result<Vec<T>, RepoError>;
}
