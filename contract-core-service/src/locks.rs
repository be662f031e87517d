use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

const PRUNE_THRESHOLD: usize = 1024;

/// Per-contract async mutexes serializing single-contract critical sections
/// within this process.
///
/// Slots are held weakly and disappear once no guard or waiter references them.
/// Across processes the row lock taken by `lock_by_id` provides the same
/// guarantee.
#[derive(Default)]
pub struct ContractLocks {
    slots: Mutex<HashMap<Uuid, Weak<AsyncMutex<()>>>>,
}

pub type ContractGuard = OwnedMutexGuard<()>;

impl ContractLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, contract_id: Uuid) -> Arc<AsyncMutex<()>> {
        let mut slots = self.slots.lock();
        if slots.len() > PRUNE_THRESHOLD {
            slots.retain(|_, slot| slot.strong_count() > 0);
        }
        if let Some(slot) = slots.get(&contract_id).and_then(Weak::upgrade) {
            return slot;
        }
        let slot = Arc::new(AsyncMutex::new(()));
        slots.insert(contract_id, Arc::downgrade(&slot));
        slot
    }

    pub async fn acquire(&self, contract_id: Uuid) -> ContractGuard {
        self.slot(contract_id).lock_owned().await
    }

    /// Locks two contracts in id order so concurrent callers cannot deadlock.
    pub async fn acquire_pair(&self, a: Uuid, b: Uuid) -> Vec<ContractGuard> {
        if a == b {
            return vec![self.acquire(a).await];
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        let first = self.acquire(first).await;
        let second = self.acquire(second).await;
        vec![first, second]
    }

    #[cfg(test)]
    fn live_slots(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.strong_count() > 0)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_contract_is_serialized() {
        let locks = Arc::new(ContractLocks::new());
        let id = Uuid::new_v4();

        let guard = locks.acquire(id).await;
        let contender = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.acquire(id).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(guard);
        contender.await.unwrap();
    }

    #[tokio::test]
    async fn test_different_contracts_do_not_block() {
        let locks = ContractLocks::new();
        let _a = locks.acquire(Uuid::new_v4()).await;
        let _b = tokio::time::timeout(Duration::from_millis(50), locks.acquire(Uuid::new_v4()))
            .await
            .expect("unrelated contract must not wait");
    }

    #[tokio::test]
    async fn test_slots_released_with_guards() {
        let locks = ContractLocks::new();
        let guards = locks.acquire_pair(Uuid::new_v4(), Uuid::new_v4()).await;
        assert_eq!(locks.live_slots(), 2);
        drop(guards);
        assert_eq!(locks.live_slots(), 0);
    }
}
