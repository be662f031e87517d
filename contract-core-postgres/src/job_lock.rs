use async_trait::async_trait;
use contract_core_db::repository::{JobLease, JobLock, RepoError};
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use tracing::debug;

/// Cluster-wide job lock on a transaction-scoped advisory lock.
///
/// The lease owns the transaction holding the lock. Dropping the lease ends
/// the transaction and Postgres releases the lock with it, including when
/// the holding process dies.
pub struct PgAdvisoryJobLock {
    pool: Arc<PgPool>,
}

impl PgAdvisoryJobLock {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

struct PgJobLease {
    _tx: Transaction<'static, Postgres>,
}

impl JobLease for PgJobLease {}

#[async_trait]
impl JobLock for PgAdvisoryJobLock {
    async fn try_acquire(&self, job_name: &str) -> Result<Option<Box<dyn JobLease>>, RepoError> {
        let mut tx = self.pool.begin().await?;

        let acquired: bool = sqlx::query_scalar("SELECT pg_try_advisory_xact_lock(hashtext($1))")
            .bind(job_name)
            .fetch_one(&mut *tx)
            .await?;

        if acquired {
            Ok(Some(Box::new(PgJobLease { _tx: tx })))
        } else {
            debug!(job = job_name, "advisory lock held elsewhere");
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helper::test_pool;

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    #[serial_test::serial]
    async fn test_second_acquire_is_refused_until_release() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let pool = Arc::new(test_pool(2).await?);
        let lock = PgAdvisoryJobLock::new(pool);

        let lease = lock.try_acquire("expire_contracts").await?;
        assert!(lease.is_some());
        assert!(lock.try_acquire("expire_contracts").await?.is_none());

        drop(lease);
        assert!(lock.try_acquire("expire_contracts").await?.is_some());

        Ok(())
    }
}
