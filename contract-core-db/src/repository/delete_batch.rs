use async_trait::async_trait;
use uuid::Uuid;

use super::RepoError;
use crate::models::Identifiable;

/// Generic repository trait for deleting multiple entities by their IDs
///
/// Dependent rows (parties, amendment links) are removed with their contract.
#[async_trait]
pub trait DeleteBatch<T: Identifiable>: Send + Sync {
    /// Delete the given entities on the current transaction
    ///
    /// # Returns
    /// * `Ok(usize)` - The number of entities actually deleted
    /// * `Err` - An error if the statement could not be executed
    async fn delete_batch(&self, ids: &[Uuid]) -> Result<usize, RepoError>;
}
