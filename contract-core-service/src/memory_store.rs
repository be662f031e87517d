//! In-memory `UnitOfWork` for tests and embedded use.
//!
//! A session takes the store-wide lock for its whole lifetime and works on a
//! private copy of the state; `commit` publishes the copy, anything else
//! discards it. Sessions are therefore fully serialized, which gives the
//! same guarantees as row locks in Postgres.

use async_trait::async_trait;
use contract_core_db::models::{AmendmentModel, ContractModel, PartyModel, SignatureLogModel};
use contract_core_db::repository::{
    AmendmentRepository, ContractQuery, ContractRepository, CreateBatch, DeleteBatch, LoadBatch,
    Page, PageRequest, PartyRepository, RepoError, SignatureLogRepository, UnitOfWork,
    UnitOfWorkSession, UpdateBatch,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub contracts: HashMap<Uuid, ContractModel>,
    pub parties: HashMap<Uuid, PartyModel>,
    pub signature_logs: Vec<SignatureLogModel>,
    pub amendments: Vec<AmendmentModel>,
}

impl MemoryState {
    fn parties_of(&self, contract_id: Uuid) -> Vec<PartyModel> {
        let mut parties: Vec<PartyModel> = self
            .parties
            .values()
            .filter(|p| p.contract_id == contract_id)
            .cloned()
            .collect();
        parties.sort_by_key(|p| (p.signing_order, p.created_at));
        parties
    }
}

/// Switches that make the store fail on purpose.
#[derive(Debug, Default)]
pub struct FaultInjection {
    pub fail_commit: AtomicBool,
    pub fail_party_writes: AtomicBool,
}

#[derive(Clone, Default)]
pub struct MemoryUnitOfWork {
    state: Arc<AsyncMutex<MemoryState>>,
    faults: Arc<FaultInjection>,
}

impl MemoryUnitOfWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn faults(&self) -> &FaultInjection {
        &self.faults
    }

    /// Copy of the committed state.
    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn begin(&self) -> Result<Box<dyn UnitOfWorkSession>, RepoError> {
        let committed = self.state.clone().lock_owned().await;
        let working = Arc::new(Mutex::new(committed.clone()));
        let repo = MemoryRepo {
            working: working.clone(),
            faults: self.faults.clone(),
        };
        Ok(Box::new(MemorySession {
            committed,
            working,
            repo,
            faults: self.faults.clone(),
        }))
    }
}

pub struct MemorySession {
    committed: OwnedMutexGuard<MemoryState>,
    working: Arc<Mutex<MemoryState>>,
    repo: MemoryRepo,
    faults: Arc<FaultInjection>,
}

#[async_trait]
impl UnitOfWorkSession for MemorySession {
    fn contracts(&self) -> &dyn ContractRepository {
        &self.repo
    }

    fn parties(&self) -> &dyn PartyRepository {
        &self.repo
    }

    fn signature_logs(&self) -> &dyn SignatureLogRepository {
        &self.repo
    }

    fn amendments(&self) -> &dyn AmendmentRepository {
        &self.repo
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        if self.faults.fail_commit.load(Ordering::SeqCst) {
            return Err("injected commit failure".into());
        }
        let mut session = self;
        let working = session.working.lock().clone();
        *session.committed = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepoError> {
        Ok(())
    }
}

/// Every repository of a session, over its working copy.
struct MemoryRepo {
    working: Arc<Mutex<MemoryState>>,
    faults: Arc<FaultInjection>,
}

impl MemoryRepo {
    fn check_party_writes(&self) -> Result<(), RepoError> {
        if self.faults.fail_party_writes.load(Ordering::SeqCst) {
            return Err("injected party write failure".into());
        }
        Ok(())
    }
}

#[async_trait]
impl CreateBatch<ContractModel> for MemoryRepo {
    async fn create_batch(&self, items: Vec<ContractModel>) -> Result<Vec<ContractModel>, RepoError> {
        let mut state = self.working.lock();
        let mut saved = Vec::with_capacity(items.len());
        for mut item in items {
            if state.contracts.contains_key(&item.id) {
                return Err(format!("duplicate contract id {}", item.id).into());
            }
            if state
                .contracts
                .values()
                .any(|c| c.contract_number == item.contract_number)
            {
                return Err(format!("duplicate contract number {}", item.contract_number).into());
            }
            item.hash = item.computed_hash()?;
            state.contracts.insert(item.id, item.clone());
            saved.push(item);
        }
        Ok(saved)
    }
}

#[async_trait]
impl LoadBatch<ContractModel> for MemoryRepo {
    async fn load_batch(&self, ids: &[Uuid]) -> Result<Vec<Option<ContractModel>>, RepoError> {
        let state = self.working.lock();
        Ok(ids.iter().map(|id| state.contracts.get(id).cloned()).collect())
    }
}

#[async_trait]
impl UpdateBatch<ContractModel> for MemoryRepo {
    async fn update_batch(&self, items: Vec<ContractModel>) -> Result<Vec<ContractModel>, RepoError> {
        let mut state = self.working.lock();
        let mut saved = Vec::with_capacity(items.len());
        for mut item in items {
            let previous_hash = item.hash;
            let computed_hash = item.computed_hash()?;
            if computed_hash == previous_hash {
                saved.push(item);
                continue;
            }
            match state.contracts.get(&item.id) {
                Some(stored) if stored.hash == previous_hash => {}
                _ => {
                    return Err(format!(
                        "contract {} was modified concurrently or no longer exists",
                        item.id
                    )
                    .into())
                }
            }
            item.hash = computed_hash;
            state.contracts.insert(item.id, item.clone());
            saved.push(item);
        }
        Ok(saved)
    }
}

#[async_trait]
impl DeleteBatch<ContractModel> for MemoryRepo {
    async fn delete_batch(&self, ids: &[Uuid]) -> Result<usize, RepoError> {
        let mut state = self.working.lock();
        let mut deleted = 0;
        for id in ids {
            if state.contracts.remove(id).is_some() {
                deleted += 1;
                state.parties.retain(|_, p| p.contract_id != *id);
                state.signature_logs.retain(|l| l.contract_id != *id);
                state
                    .amendments
                    .retain(|a| a.original_contract_id != *id && a.amendment_contract_id != *id);
                for contract in state.contracts.values_mut() {
                    if contract.parent_contract_id == Some(*id) {
                        contract.parent_contract_id = None;
                    }
                }
            }
        }
        Ok(deleted)
    }
}

#[async_trait]
impl ContractRepository for MemoryRepo {
    async fn lock_by_id(&self, id: Uuid) -> Result<Option<ContractModel>, RepoError> {
        // The session already holds the store-wide lock
        self.load(id).await
    }

    async fn find_by_contract_number(
        &self,
        contract_number: &str,
    ) -> Result<Option<ContractModel>, RepoError> {
        let state = self.working.lock();
        Ok(state
            .contracts
            .values()
            .find(|c| c.contract_number.as_str() == contract_number)
            .cloned())
    }

    async fn query(
        &self,
        query: &ContractQuery,
        page: PageRequest,
    ) -> Result<Page<ContractModel>, RepoError> {
        let state = self.working.lock();
        let mut matching: Vec<&ContractModel> = state
            .contracts
            .values()
            .filter(|c| {
                let party_user_ids: Vec<Uuid> = match query.party_user_id {
                    Some(_) => state.parties_of(c.id).iter().map(|p| p.user_id).collect(),
                    None => Vec::new(),
                };
                query.matches(c, &party_user_ids)
            })
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        let total = matching.len();
        let items = matching
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .cloned()
            .collect();
        Ok(Page::new(items, total, page.limit, page.offset))
    }
}

#[async_trait]
impl CreateBatch<PartyModel> for MemoryRepo {
    async fn create_batch(&self, items: Vec<PartyModel>) -> Result<Vec<PartyModel>, RepoError> {
        self.check_party_writes()?;
        let mut state = self.working.lock();
        for item in &items {
            if !state.contracts.contains_key(&item.contract_id) {
                return Err(format!("contract {} does not exist", item.contract_id).into());
            }
            if state
                .parties
                .values()
                .any(|p| p.contract_id == item.contract_id && p.user_id == item.user_id)
            {
                return Err(format!(
                    "user {} is already a party to contract {}",
                    item.user_id, item.contract_id
                )
                .into());
            }
            state.parties.insert(item.id, item.clone());
        }
        Ok(items)
    }
}

#[async_trait]
impl UpdateBatch<PartyModel> for MemoryRepo {
    async fn update_batch(&self, items: Vec<PartyModel>) -> Result<Vec<PartyModel>, RepoError> {
        self.check_party_writes()?;
        let mut state = self.working.lock();
        for item in &items {
            let stored = state
                .parties
                .get_mut(&item.id)
                .ok_or_else(|| format!("contract_party {} no longer exists", item.id))?;
            stored.has_signed = item.has_signed;
            stored.signed_at = item.signed_at;
            stored.signature_data = item.signature_data.clone();
        }
        Ok(items)
    }
}

#[async_trait]
impl PartyRepository for MemoryRepo {
    async fn find_by_contract_id(&self, contract_id: Uuid) -> Result<Vec<PartyModel>, RepoError> {
        Ok(self.working.lock().parties_of(contract_id))
    }

    async fn count_unsigned(&self, contract_id: Uuid) -> Result<i64, RepoError> {
        let state = self.working.lock();
        Ok(state
            .parties
            .values()
            .filter(|p| p.contract_id == contract_id && !p.has_signed)
            .count() as i64)
    }

    async fn delete_by_contract_id(&self, contract_id: Uuid) -> Result<usize, RepoError> {
        self.check_party_writes()?;
        let mut state = self.working.lock();
        let before = state.parties.len();
        state.parties.retain(|_, p| p.contract_id != contract_id);
        Ok(before - state.parties.len())
    }
}

#[async_trait]
impl CreateBatch<SignatureLogModel> for MemoryRepo {
    async fn create_batch(
        &self,
        items: Vec<SignatureLogModel>,
    ) -> Result<Vec<SignatureLogModel>, RepoError> {
        let mut state = self.working.lock();
        state.signature_logs.extend(items.iter().cloned());
        Ok(items)
    }
}

#[async_trait]
impl SignatureLogRepository for MemoryRepo {
    async fn find_by_contract_id(
        &self,
        contract_id: Uuid,
    ) -> Result<Vec<SignatureLogModel>, RepoError> {
        let state = self.working.lock();
        let mut logs: Vec<SignatureLogModel> = state
            .signature_logs
            .iter()
            .filter(|l| l.contract_id == contract_id)
            .cloned()
            .collect();
        logs.sort_by_key(|l| l.signed_at);
        Ok(logs)
    }

    async fn find_by_signature(
        &self,
        contract_id: Uuid,
        signature_data: &str,
    ) -> Result<Option<SignatureLogModel>, RepoError> {
        let state = self.working.lock();
        Ok(state
            .signature_logs
            .iter()
            .find(|l| l.contract_id == contract_id && l.signature_data == signature_data)
            .cloned())
    }
}

#[async_trait]
impl CreateBatch<AmendmentModel> for MemoryRepo {
    async fn create_batch(&self, items: Vec<AmendmentModel>) -> Result<Vec<AmendmentModel>, RepoError> {
        let mut state = self.working.lock();
        for item in &items {
            if state
                .amendments
                .iter()
                .any(|a| a.amendment_contract_id == item.amendment_contract_id)
            {
                return Err(format!(
                    "contract {} is already linked as an amendment",
                    item.amendment_contract_id
                )
                .into());
            }
            state.amendments.push(item.clone());
        }
        Ok(items)
    }
}

#[async_trait]
impl AmendmentRepository for MemoryRepo {
    async fn find_by_original_contract_id(
        &self,
        original_contract_id: Uuid,
    ) -> Result<Vec<AmendmentModel>, RepoError> {
        let state = self.working.lock();
        let mut amendments: Vec<AmendmentModel> = state
            .amendments
            .iter()
            .filter(|a| a.original_contract_id == original_contract_id)
            .cloned()
            .collect();
        amendments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(amendments)
    }

    async fn find_by_amendment_contract_id(
        &self,
        amendment_contract_id: Uuid,
    ) -> Result<Option<AmendmentModel>, RepoError> {
        let state = self.working.lock();
        Ok(state
            .amendments
            .iter()
            .find(|a| a.amendment_contract_id == amendment_contract_id)
            .cloned())
    }
}
