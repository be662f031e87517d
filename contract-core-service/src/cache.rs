use async_trait::async_trait;
use contract_core_api::ContractFilter;
use contract_core_db::repository::Page;
use moka::future::Cache;
use moka::Expiry;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

use crate::lifecycle::ContractDetail;

/// Structured cache keys. Listing keys carry the full filter, so every
/// distinct filter/page combination is cached separately.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Contract(Uuid),
    GroupListing(Uuid, ContractFilter),
    UserListing(Uuid, ContractFilter),
    AllListing(ContractFilter),
}

/// Invalidation tags. A mutation lists the scopes it affects and every key
/// tagged with one of them is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheScope {
    Contract(Uuid),
    Group(Uuid),
    User(Uuid),
    /// Unfiltered `list_all` listings
    AllContracts,
    /// Every listing entry of any kind
    Listings,
}

impl CacheKey {
    pub fn scopes(&self) -> Vec<CacheScope> {
        match self {
            CacheKey::Contract(id) => vec![CacheScope::Contract(*id)],
            CacheKey::GroupListing(group_id, _) => {
                vec![CacheScope::Group(*group_id), CacheScope::Listings]
            }
            CacheKey::UserListing(user_id, _) => {
                vec![CacheScope::User(*user_id), CacheScope::Listings]
            }
            CacheKey::AllListing(_) => vec![CacheScope::AllContracts, CacheScope::Listings],
        }
    }
}

#[derive(Debug, Clone)]
pub enum CachedValue {
    Contract(Arc<ContractDetail>),
    Listing(Arc<Page<ContractDetail>>),
}

/// Generation observed before a store read. An entry built from that read is
/// only stored if none of its scopes was invalidated after the ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CacheTicket(u64);

/// Advisory cache in front of the store. Misses are always acceptable.
#[async_trait]
pub trait ContractCache: Send + Sync {
    fn ticket(&self) -> CacheTicket;
    async fn get(&self, key: &CacheKey) -> Option<CachedValue>;
    /// Dropped silently when `ticket` predates an invalidation of any of the key's scopes.
    async fn set(&self, key: CacheKey, value: CachedValue, ttl: Duration, ticket: CacheTicket);
    async fn invalidate(&self, scopes: &[CacheScope]);
}

#[derive(Clone)]
struct Entry {
    value: CachedValue,
    ttl: Duration,
    stamp: u64,
}

struct PerEntryTtl;

impl Expiry<CacheKey, Arc<Entry>> for PerEntryTtl {
    fn expire_after_create(&self, _key: &CacheKey, value: &Arc<Entry>, _created_at: Instant) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &Arc<Entry>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Scope generations older than this many entries are folded into `floor`.
const GENERATION_LIMIT: usize = 4096;

#[derive(Default)]
struct TagIndex {
    scopes: HashMap<CacheScope, HashSet<CacheKey>>,
    /// Stamp of the entry each key is currently filed for.
    stamps: HashMap<CacheKey, u64>,
    generations: HashMap<CacheScope, u64>,
    /// Tickets below this are stale for every scope.
    floor: u64,
    epoch: u64,
    next_stamp: u64,
}

impl TagIndex {
    fn is_stale(&self, key: &CacheKey, ticket: CacheTicket) -> bool {
        ticket.0 < self.floor
            || key
                .scopes()
                .iter()
                .any(|scope| self.generations.get(scope).is_some_and(|generation| *generation > ticket.0))
    }

    fn stamp(&mut self) -> u64 {
        self.next_stamp += 1;
        self.next_stamp
    }

    fn file(&mut self, key: &CacheKey, stamp: u64) {
        self.stamps.insert(key.clone(), stamp);
        for scope in key.scopes() {
            self.scopes.entry(scope).or_default().insert(key.clone());
        }
    }

    fn unfile(&mut self, key: &CacheKey) {
        self.stamps.remove(key);
        for scope in key.scopes() {
            if let Some(keys) = self.scopes.get_mut(&scope) {
                keys.remove(key);
                if keys.is_empty() {
                    self.scopes.remove(&scope);
                }
            }
        }
    }

    /// Unfiles `key` only if it is still filed for `stamp`.
    fn unfile_stamp(&mut self, key: &CacheKey, stamp: u64) {
        if self.stamps.get(key) == Some(&stamp) {
            self.unfile(key);
        }
    }

    fn invalidate(&mut self, scopes: &[CacheScope]) -> HashSet<CacheKey> {
        self.epoch += 1;
        let mut dropped = HashSet::new();
        for scope in scopes {
            self.generations.insert(*scope, self.epoch);
            if let Some(keys) = self.scopes.remove(scope) {
                dropped.extend(keys);
            }
        }
        for key in &dropped {
            self.unfile(key);
        }
        if self.generations.len() > GENERATION_LIMIT {
            self.generations.clear();
            self.floor = self.epoch;
        }
        dropped
    }
}

/// `moka` cache with a tag index for scope-based invalidation.
pub struct MokaContractCache {
    inner: Cache<CacheKey, Arc<Entry>>,
    index: Arc<Mutex<TagIndex>>,
}

impl MokaContractCache {
    pub fn new(max_capacity: u64) -> Self {
        let index = Arc::new(Mutex::new(TagIndex::default()));
        let evictions = Arc::clone(&index);
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(PerEntryTtl)
                .eviction_listener(move |key: Arc<CacheKey>, entry: Arc<Entry>, _cause| {
                    evictions.lock().unfile_stamp(&key, entry.stamp);
                })
                .build(),
            index,
        }
    }
}

#[async_trait]
impl ContractCache for MokaContractCache {
    fn ticket(&self) -> CacheTicket {
        CacheTicket(self.index.lock().epoch)
    }

    async fn get(&self, key: &CacheKey) -> Option<CachedValue> {
        self.inner.get(key).await.map(|entry| entry.value.clone())
    }

    async fn set(&self, key: CacheKey, value: CachedValue, ttl: Duration, ticket: CacheTicket) {
        let stamp = {
            let mut index = self.index.lock();
            if index.is_stale(&key, ticket) {
                debug!(?key, "skipping cache fill from a read older than the last invalidation");
                return;
            }
            let stamp = index.stamp();
            index.file(&key, stamp);
            stamp
        };
        self.inner.insert(key.clone(), Arc::new(Entry { value, ttl, stamp })).await;

        // An invalidation may have run between the check and the insert.
        let stale = {
            let mut index = self.index.lock();
            let stale = index.is_stale(&key, ticket);
            if stale {
                index.unfile_stamp(&key, stamp);
            }
            stale
        };
        if stale {
            self.inner.invalidate(&key).await;
        }
    }

    async fn invalidate(&self, scopes: &[CacheScope]) {
        let keys = self.index.lock().invalidate(scopes);
        for key in keys {
            self.inner.invalidate(&key).await;
        }
    }
}
