use async_trait::async_trait;

use super::RepoError;
use crate::models::Identifiable;

/// Generic repository trait for creating multiple entities in a batch
///
/// Any entity that implements the Identifiable trait can be created using this trait.
/// All creates run on the session's transaction, so they commit or roll back together.
/// Returns saved items with any generated fields (e.g. `hash`) populated.
///
/// # Example
/// ```ignore
/// impl CreateBatch<ContractModel> for ContractRepositoryImpl {
///     async fn create_batch(&self, items: Vec<ContractModel>) -> Result<Vec<ContractModel>, RepoError> {
///         // Implementation
///     }
/// }
/// ```
#[async_trait]
pub trait CreateBatch<T: Identifiable>: Send + Sync {
    /// Save multiple items on the current transaction
    ///
    /// # Returns
    /// * `Ok(Vec<T>)` - The created entities with generated fields populated
    /// * `Err` - If any insert fails (unique violation, connection loss, ...)
    async fn create_batch(&self, items: Vec<T>) -> Result<Vec<T>, RepoError>;
}
