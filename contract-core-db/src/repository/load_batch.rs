use async_trait::async_trait;
use uuid::Uuid;

use super::RepoError;
use crate::models::Identifiable;

/// Generic repository trait for loading multiple entities by their IDs
///
/// Returns items in the same order as the provided IDs.
/// Missing items are represented as None in the result.
#[async_trait]
pub trait LoadBatch<T: Identifiable>: Send + Sync {
    /// Load multiple entities by their unique identifiers
    ///
    /// # Returns
    /// * `Ok(Vec<Option<T>>)` - One slot per requested id, `None` where absent
    /// * `Err` - An error if the query could not be executed
    async fn load_batch(&self, ids: &[Uuid]) -> Result<Vec<Option<T>>, RepoError>;

    /// Load a single entity, `None` if it does not exist
    async fn load(&self, id: Uuid) -> Result<Option<T>, RepoError> {
        Ok(self.load_batch(&[id]).await?.into_iter().next().flatten())
    }
}
