use async_trait::async_trait;
use contract_core_db::repository::{JobLease, JobLock, RepoError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// In-process job lock: one compare-and-swap flag per job name.
#[derive(Default)]
pub struct LocalJobLock {
    flags: Mutex<HashMap<String, Arc<AtomicBool>>>,
}

impl LocalJobLock {
    pub fn new() -> Self {
        Self::default()
    }

    fn flag(&self, job_name: &str) -> Arc<AtomicBool> {
        self.flags
            .lock()
            .entry(job_name.to_string())
            .or_insert_with(|| Arc::new(AtomicBool::new(false)))
            .clone()
    }
}

struct LocalLease {
    flag: Arc<AtomicBool>,
}

impl JobLease for LocalLease {}

impl Drop for LocalLease {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[async_trait]
impl JobLock for LocalJobLock {
    async fn try_acquire(&self, job_name: &str) -> Result<Option<Box<dyn JobLease>>, RepoError> {
        let flag = self.flag(job_name);
        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            Ok(Some(Box::new(LocalLease { flag })))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_running_job_refuses_second_lease() {
        let lock = LocalJobLock::new();

        let lease = assert_ok!(lock.try_acquire("expire_contracts").await);
        assert!(lease.is_some());
        assert!(assert_ok!(lock.try_acquire("expire_contracts").await).is_none());
        assert!(assert_ok!(lock.try_acquire("check_expiring").await).is_some());

        drop(lease);
        assert!(assert_ok!(lock.try_acquire("expire_contracts").await).is_some());
    }
}
