use async_trait::async_trait;

use super::RepoError;

/// Held while a scheduled job runs; dropping it releases the lock.
pub trait JobLease: Send {}

/// Mutual exclusion for scheduled jobs, keyed by job name.
///
/// `try_acquire` never waits: a job that is already running yields `None`
/// and the caller skips the run instead of queueing it.
#[async_trait]
pub trait JobLock: Send + Sync {
    async fn try_acquire(&self, job_name: &str) -> Result<Option<Box<dyn JobLease>>, RepoError>;
}
