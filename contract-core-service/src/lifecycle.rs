use chrono::{DateTime, Utc};
use contract_core_api::{
    check_date_order, ContractError, ContractEvent, ContractFilter, ContractResult,
    ContractStatus, CreateContractRequest, EventPublisher, NumberGenerator,
    NumberKind, UpdateContractRequest,
};
use contract_core_db::models::{ContractModel, PartyModel};
use contract_core_db::repository::{
    ContractQuery, CreateBatch, DeleteBatch, LoadBatch, Page, PageRequest, UnitOfWork,
    UnitOfWorkSession, UpdateBatch,
};
use heapless::String as HeaplessString;
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::access::AccessPolicy;
use crate::cache::{CacheKey, CacheScope, CachedValue, ContractCache};
use crate::config::ServiceConfig;
use crate::locks::ContractLocks;
use crate::numbering::allocate_number;
use crate::templates;
use crate::transaction::{discard, finish};

/// A contract together with its parties, ordered by signing order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractDetail {
    pub contract: ContractModel,
    pub parties: Vec<PartyModel>,
}

impl ContractDetail {
    pub fn party_user_ids(&self) -> Vec<Uuid> {
        self.parties.iter().map(|p| p.user_id).collect()
    }
}

pub(crate) fn contract_number(value: &str) -> ContractResult<HeaplessString<64>> {
    HeaplessString::from_str(value).map_err(|_| {
        ContractError::ValidationError(format!("contract number '{value}' exceeds 64 characters"))
    })
}

/// Loads a contract and its parties on `session`, `NotFound` if absent.
pub(crate) async fn load_detail(
    session: &dyn UnitOfWorkSession,
    contract_id: Uuid,
    lock: bool,
) -> ContractResult<ContractDetail> {
    let contract = if lock {
        session.contracts().lock_by_id(contract_id).await?
    } else {
        session.contracts().load(contract_id).await?
    }
    .ok_or_else(|| ContractError::contract_not_found(contract_id))?;
    let parties = session.parties().find_by_contract_id(contract_id).await?;
    Ok(ContractDetail { contract, parties })
}

/// Owns contract CRUD, status transitions, access checks and cache upkeep.
///
/// Every single-contract write runs under the contract's in-process lock and
/// a row lock inside one store transaction. Cache scopes are invalidated and
/// events published only after the transaction has committed.
pub struct ContractLifecycleEngine {
    store: Arc<dyn UnitOfWork>,
    cache: Arc<dyn ContractCache>,
    events: Arc<dyn EventPublisher>,
    numbers: Arc<dyn NumberGenerator>,
    access: Arc<dyn AccessPolicy>,
    locks: ContractLocks,
    config: ServiceConfig,
}

impl ContractLifecycleEngine {
    pub fn new(
        store: Arc<dyn UnitOfWork>,
        cache: Arc<dyn ContractCache>,
        events: Arc<dyn EventPublisher>,
        numbers: Arc<dyn NumberGenerator>,
        access: Arc<dyn AccessPolicy>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            cache,
            events,
            numbers,
            access,
            locks: ContractLocks::new(),
            config,
        }
    }

    pub(crate) fn store(&self) -> &dyn UnitOfWork {
        self.store.as_ref()
    }

    pub(crate) fn events(&self) -> &dyn EventPublisher {
        self.events.as_ref()
    }

    pub(crate) fn numbers(&self) -> &dyn NumberGenerator {
        self.numbers.as_ref()
    }

    pub(crate) fn access(&self) -> &dyn AccessPolicy {
        self.access.as_ref()
    }

    pub(crate) fn locks(&self) -> &ContractLocks {
        &self.locks
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub async fn create(
        &self,
        created_by: Uuid,
        request: CreateContractRequest,
    ) -> ContractResult<ContractDetail> {
        request.check()?;

        let session = self.store.begin().await?;
        let result = self.create_in(session.as_ref(), created_by, &request).await;
        let detail = finish(session, result).await?;

        info!(
            contract_id = %detail.contract.id,
            contract_number = %detail.contract.contract_number,
            group_id = %detail.contract.group_id,
            "contract created"
        );
        self.invalidate_for(&detail).await;
        self.events
            .publish(ContractEvent::ContractCreated {
                contract_id: detail.contract.id,
                contract_number: detail.contract.contract_number.to_string(),
                group_id: detail.contract.group_id,
                contract_type: detail.contract.contract_type,
                created_by,
                party_user_ids: detail.party_user_ids(),
            })
            .await;

        Ok(detail)
    }

    async fn create_in(
        &self,
        session: &dyn UnitOfWorkSession,
        created_by: Uuid,
        request: &CreateContractRequest,
    ) -> ContractResult<ContractDetail> {
        let number = allocate_number(self.numbers.as_ref(), session, NumberKind::Contract, None).await?;
        let now = Utc::now();
        let content = match &request.content {
            Some(content) => content.clone(),
            None => templates::co_ownership(
                &request.title,
                &number,
                request.effective_date,
                request.expiry_date,
                &request.parties,
            ),
        };

        let contract = ContractModel {
            id: Uuid::new_v4(),
            contract_number: contract_number(&number)?,
            group_id: request.group_id,
            contract_type: request.contract_type,
            title: request.title.clone(),
            content,
            status: ContractStatus::Draft,
            effective_date: request.effective_date,
            expiry_date: request.expiry_date,
            auto_renew: request.auto_renew,
            parent_contract_id: request.parent_contract_id,
            activated_at: None,
            created_by,
            created_at: now,
            updated_at: now,
            hash: 0,
        };
        let parties: Vec<PartyModel> = request
            .parties
            .iter()
            .enumerate()
            .map(|(index, party)| PartyModel {
                id: Uuid::new_v4(),
                contract_id: contract.id,
                user_id: party.user_id,
                party_role: party.party_role,
                ownership_percentage: party.ownership_percentage.round_dp(2),
                signing_order: party.signing_order.unwrap_or(index as i32 + 1),
                has_signed: false,
                signed_at: None,
                signature_data: None,
                created_at: now,
            })
            .collect();

        let mut saved = session.contracts().create_batch(vec![contract]).await?;
        let contract = saved
            .pop()
            .ok_or_else(|| ContractError::PersistenceError("contract insert returned nothing".to_string()))?;
        let parties = session.parties().create_batch(parties).await?;

        Ok(ContractDetail { contract, parties })
    }

    /// Cache-first read. With a requester the access policy is enforced.
    pub async fn get_by_id(
        &self,
        contract_id: Uuid,
        requester_id: Option<Uuid>,
    ) -> ContractResult<ContractDetail> {
        let key = CacheKey::Contract(contract_id);
        let detail = match self.cache.get(&key).await {
            Some(CachedValue::Contract(detail)) => {
                debug!(contract_id = %contract_id, "contract cache hit");
                detail
            }
            _ => {
                debug!(contract_id = %contract_id, "contract cache miss");
                let ticket = self.cache.ticket();
                let session = self.store.begin().await?;
                let result = load_detail(session.as_ref(), contract_id, false).await;
                discard(session).await;
                let detail = Arc::new(result?);
                self.cache
                    .set(key, CachedValue::Contract(detail.clone()), self.config.contract_cache_ttl, ticket)
                    .await;
                detail
            }
        };

        if let Some(requester_id) = requester_id {
            self.access.check(requester_id, &detail.contract, &detail.parties)?;
        }
        Ok((*detail).clone())
    }

    pub async fn list_by_group(
        &self,
        group_id: Uuid,
        filter: ContractFilter,
    ) -> ContractResult<Page<ContractDetail>> {
        let query = ContractQuery {
            group_id: Some(group_id),
            ..Default::default()
        };
        self.list(CacheKey::GroupListing(group_id, filter.clone()), query, &filter)
            .await
    }

    pub async fn list_by_user(
        &self,
        user_id: Uuid,
        filter: ContractFilter,
    ) -> ContractResult<Page<ContractDetail>> {
        let query = ContractQuery {
            party_user_id: Some(user_id),
            ..Default::default()
        };
        self.list(CacheKey::UserListing(user_id, filter.clone()), query, &filter)
            .await
    }

    pub async fn list_all(&self, filter: ContractFilter) -> ContractResult<Page<ContractDetail>> {
        self.list(CacheKey::AllListing(filter.clone()), ContractQuery::default(), &filter)
            .await
    }

    async fn list(
        &self,
        key: CacheKey,
        mut query: ContractQuery,
        filter: &ContractFilter,
    ) -> ContractResult<Page<ContractDetail>> {
        if let Some(CachedValue::Listing(page)) = self.cache.get(&key).await {
            debug!(?key, "listing cache hit");
            return Ok((*page).clone());
        }

        query.status = filter.status;
        query.contract_type = filter.contract_type;

        let ticket = self.cache.ticket();
        let session = self.store.begin().await?;
        let result = Self::hydrate_page(session.as_ref(), &query, PageRequest::from(filter)).await;
        discard(session).await;
        let page = result?;

        self.cache
            .set(key, CachedValue::Listing(Arc::new(page.clone())), self.config.listing_cache_ttl, ticket)
            .await;
        Ok(page)
    }

    async fn hydrate_page(
        session: &dyn UnitOfWorkSession,
        query: &ContractQuery,
        page: PageRequest,
    ) -> ContractResult<Page<ContractDetail>> {
        let contracts = session.contracts().query(query, page).await?;
        let mut items = Vec::with_capacity(contracts.items.len());
        for contract in &contracts.items {
            let parties = session.parties().find_by_contract_id(contract.id).await?;
            items.push(ContractDetail {
                contract: contract.clone(),
                parties,
            });
        }
        Ok(Page::new(items, contracts.total, contracts.limit, contracts.offset))
    }

    /// Applies the whitelisted fields to a draft contract.
    pub async fn update(
        &self,
        contract_id: Uuid,
        requester_id: Uuid,
        patch: UpdateContractRequest,
    ) -> ContractResult<ContractDetail> {
        patch.check()?;

        let _guard = self.locks.acquire(contract_id).await;
        let session = self.store.begin().await?;
        let result = self.update_in(session.as_ref(), contract_id, requester_id, &patch).await;
        let detail = finish(session, result).await?;

        info!(contract_id = %contract_id, "draft contract updated");
        self.invalidate_for(&detail).await;
        Ok(detail)
    }

    async fn update_in(
        &self,
        session: &dyn UnitOfWorkSession,
        contract_id: Uuid,
        requester_id: Uuid,
        patch: &UpdateContractRequest,
    ) -> ContractResult<ContractDetail> {
        let mut detail = load_detail(session, contract_id, true).await?;
        self.access.check(requester_id, &detail.contract, &detail.parties)?;
        if !detail.contract.is_draft() {
            return Err(ContractError::InvalidState(format!(
                "contract {contract_id} is {} and can no longer be edited",
                detail.contract.status
            )));
        }

        let contract = &mut detail.contract;
        if let Some(title) = &patch.title {
            contract.title = title.clone();
        }
        if let Some(content) = &patch.content {
            contract.content = content.clone();
        }
        if let Some(effective_date) = patch.effective_date {
            contract.effective_date = effective_date;
        }
        if let Some(expiry_date) = patch.expiry_date {
            contract.expiry_date = Some(expiry_date);
        }
        if let Some(auto_renew) = patch.auto_renew {
            contract.auto_renew = auto_renew;
        }
        check_date_order(contract.effective_date, contract.expiry_date)?;
        contract.updated_at = Utc::now();

        detail.contract = save_contract(session, detail.contract).await?;
        Ok(detail)
    }

    /// `draft -> pending_signatures`; freezes content and parties.
    pub async fn send_for_signature(
        &self,
        contract_id: Uuid,
        requester_id: Uuid,
    ) -> ContractResult<ContractDetail> {
        let _guard = self.locks.acquire(contract_id).await;
        let session = self.store.begin().await?;
        let result = self.send_in(session.as_ref(), contract_id, requester_id).await;
        let detail = finish(session, result).await?;

        info!(contract_id = %contract_id, parties = detail.parties.len(), "contract sent for signature");
        self.invalidate_for(&detail).await;
        self.events
            .publish(ContractEvent::ContractSentForSignature {
                contract_id,
                contract_number: detail.contract.contract_number.to_string(),
                title: detail.contract.title.clone(),
                sent_by: requester_id,
                party_user_ids: detail.party_user_ids(),
            })
            .await;

        Ok(detail)
    }

    async fn send_in(
        &self,
        session: &dyn UnitOfWorkSession,
        contract_id: Uuid,
        requester_id: Uuid,
    ) -> ContractResult<ContractDetail> {
        let mut detail = load_detail(session, contract_id, true).await?;
        self.access.check(requester_id, &detail.contract, &detail.parties)?;
        if !detail.contract.is_draft() {
            return Err(ContractError::InvalidState(format!(
                "only draft contracts can be sent for signature, contract {contract_id} is {}",
                detail.contract.status
            )));
        }
        if detail.parties.is_empty() {
            return Err(ContractError::ValidationError(format!(
                "contract {contract_id} has no parties to sign it"
            )));
        }

        detail.contract.status = detail
            .contract
            .status
            .transition(detail.contract.contract_type, ContractStatus::PendingSignatures)?;
        detail.contract.updated_at = Utc::now();
        detail.contract = save_contract(session, detail.contract).await?;
        Ok(detail)
    }

    /// Removes a draft contract with its parties. Only the creator may do this.
    pub async fn delete(&self, contract_id: Uuid, requester_id: Uuid) -> ContractResult<()> {
        let _guard = self.locks.acquire(contract_id).await;
        let session = self.store.begin().await?;
        let result = Self::delete_in(session.as_ref(), contract_id, requester_id).await;
        let detail = finish(session, result).await?;

        info!(contract_id = %contract_id, "draft contract deleted");
        self.invalidate_for(&detail).await;
        Ok(())
    }

    async fn delete_in(
        session: &dyn UnitOfWorkSession,
        contract_id: Uuid,
        requester_id: Uuid,
    ) -> ContractResult<ContractDetail> {
        let detail = load_detail(session, contract_id, true).await?;
        if detail.contract.created_by != requester_id {
            return Err(ContractError::AccessDenied(format!(
                "only the creator may delete contract {contract_id}"
            )));
        }
        if !detail.contract.is_draft() {
            return Err(ContractError::InvalidState(format!(
                "contract {contract_id} is {} and cannot be deleted",
                detail.contract.status
            )));
        }
        session.parties().delete_by_contract_id(contract_id).await?;
        session.contracts().delete_batch(&[contract_id]).await?;
        Ok(detail)
    }

    /// Ends a contract that has not already reached a terminal state.
    pub async fn terminate(
        &self,
        contract_id: Uuid,
        requester_id: Uuid,
        reason: &str,
    ) -> ContractResult<ContractDetail> {
        let reason = reason.trim();
        if reason.is_empty() || reason.chars().count() > 500 {
            return Err(ContractError::ValidationError(
                "termination reason must be 1 to 500 characters".to_string(),
            ));
        }

        let _guard = self.locks.acquire(contract_id).await;
        let session = self.store.begin().await?;
        let result = self.terminate_in(session.as_ref(), contract_id, requester_id).await;
        let detail = finish(session, result).await?;

        info!(contract_id = %contract_id, "contract terminated");
        self.invalidate_for(&detail).await;
        self.events
            .publish(ContractEvent::ContractTerminated {
                contract_id,
                contract_number: detail.contract.contract_number.to_string(),
                terminated_by: requester_id,
                reason: reason.to_string(),
            })
            .await;

        Ok(detail)
    }

    async fn terminate_in(
        &self,
        session: &dyn UnitOfWorkSession,
        contract_id: Uuid,
        requester_id: Uuid,
    ) -> ContractResult<ContractDetail> {
        let mut detail = load_detail(session, contract_id, true).await?;
        self.access.check(requester_id, &detail.contract, &detail.parties)?;
        detail.contract.status = detail
            .contract
            .status
            .transition(detail.contract.contract_type, ContractStatus::Terminated)?;
        detail.contract.updated_at = Utc::now();
        detail.contract = save_contract(session, detail.contract).await?;
        Ok(detail)
    }

    /// `active -> expired` if the contract is still active and past its expiry.
    /// Returns whether this call expired it.
    pub(crate) async fn expire_if_due(
        &self,
        contract_id: Uuid,
        now: DateTime<Utc>,
    ) -> ContractResult<bool> {
        let _guard = self.locks.acquire(contract_id).await;
        let session = self.store.begin().await?;
        let result = Self::expire_in(session.as_ref(), contract_id, now).await;
        let Some(detail) = finish(session, result).await? else {
            return Ok(false);
        };

        info!(contract_id = %contract_id, "contract expired");
        self.invalidate_for(&detail).await;
        self.events
            .publish(ContractEvent::ContractExpired {
                contract_id,
                contract_number: detail.contract.contract_number.to_string(),
                expired_at: now,
                party_user_ids: detail.party_user_ids(),
            })
            .await;
        Ok(true)
    }

    async fn expire_in(
        session: &dyn UnitOfWorkSession,
        contract_id: Uuid,
        now: DateTime<Utc>,
    ) -> ContractResult<Option<ContractDetail>> {
        let mut detail = load_detail(session, contract_id, true).await?;
        let due = detail.contract.status == ContractStatus::Active
            && detail.contract.expiry_date.is_some_and(|expiry| expiry < now);
        if !due {
            return Ok(None);
        }
        detail.contract.status = detail
            .contract
            .status
            .transition(detail.contract.contract_type, ContractStatus::Expired)?;
        detail.contract.updated_at = now;
        detail.contract = save_contract(session, detail.contract).await?;
        Ok(Some(detail))
    }

    /// Drops the contract entry and every cached listing.
    pub async fn clear_cache(&self, contract_id: Uuid) {
        self.cache
            .invalidate(&[CacheScope::Contract(contract_id), CacheScope::Listings])
            .await;
    }

    /// Drops exactly the entries a change to `detail` can make stale.
    pub(crate) async fn invalidate_for(&self, detail: &ContractDetail) {
        let mut scopes = vec![
            CacheScope::Contract(detail.contract.id),
            CacheScope::Group(detail.contract.group_id),
            CacheScope::AllContracts,
        ];
        scopes.extend(detail.parties.iter().map(|p| CacheScope::User(p.user_id)));
        self.cache.invalidate(&scopes).await;
    }
}

/// Writes `contract` through the hash-guarded update and returns it as stored.
pub(crate) async fn save_contract(
    session: &dyn UnitOfWorkSession,
    contract: ContractModel,
) -> ContractResult<ContractModel> {
    session
        .contracts()
        .update_batch(vec![contract])
        .await?
        .pop()
        .ok_or_else(|| ContractError::PersistenceError("contract update returned nothing".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheTicket, MokaContractCache};
    use crate::events::RetryingEventPublisher;
    use crate::memory_store::MemoryUnitOfWork;
    use crate::numbering::RandomNumberGenerator;
    use crate::test_helper::{co_ownership_request, contract_model, services, RecordingSink};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::Notify;

    #[tokio::test]
    async fn test_create_persists_draft_with_templated_content() {
        let t = services();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let detail = t
            .services
            .lifecycle
            .create(a, co_ownership_request(&[(a, "60"), (b, "40")]))
            .await
            .unwrap();

        assert_eq!(detail.contract.status, ContractStatus::Draft);
        assert!(detail.contract.contract_number.starts_with("CC-"));
        assert!(detail.contract.content.contains(detail.contract.contract_number.as_str()));
        assert_eq!(detail.party_user_ids(), vec![a, b]);
        assert_eq!(detail.parties[1].signing_order, 2);
        assert!(detail.parties.iter().all(|p| !p.has_signed));
        assert_eq!(t.sink.count("ContractCreated"), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_split_without_writing() {
        let t = services();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());

        let err = t
            .services
            .lifecycle
            .create(a, co_ownership_request(&[(a, "60"), (b, "30")]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(t.store.snapshot().await.contracts.is_empty());
        assert!(t.sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_failed_party_insert_rolls_back_contract() {
        let t = services();
        let a = Uuid::new_v4();
        t.store.faults().fail_party_writes.store(true, Ordering::SeqCst);

        let err = t
            .services
            .lifecycle
            .create(a, co_ownership_request(&[(a, "100")]))
            .await
            .unwrap_err();

        assert_eq!(err.code(), "PERSISTENCE_ERROR");
        let state = t.store.snapshot().await;
        assert!(state.contracts.is_empty());
        assert!(state.parties.is_empty());
        assert_eq!(t.sink.count("ContractCreated"), 0);
    }

    #[tokio::test]
    async fn test_update_is_visible_through_cache() {
        let t = services();
        let lifecycle = &t.services.lifecycle;
        let a = Uuid::new_v4();
        let created = lifecycle.create(a, co_ownership_request(&[(a, "100")])).await.unwrap();
        let id = created.contract.id;
        let group_id = created.contract.group_id;

        // Warm both the entry and the group listing
        assert_eq!(lifecycle.get_by_id(id, Some(a)).await.unwrap(), created);
        let listing = lifecycle.list_by_group(group_id, ContractFilter::default()).await.unwrap();
        assert_eq!(listing.total, 1);

        let patch = UpdateContractRequest {
            title: Some("Revised agreement".to_string()),
            ..Default::default()
        };
        lifecycle.update(id, a, patch).await.unwrap();

        let reread = lifecycle.get_by_id(id, Some(a)).await.unwrap();
        assert_eq!(reread.contract.title, "Revised agreement");
        let listing = lifecycle.list_by_group(group_id, ContractFilter::default()).await.unwrap();
        assert_eq!(listing.items[0].contract.title, "Revised agreement");
    }

    /// Holds the first contract fill until released, so a write can land
    /// between the store read and the cache insert.
    struct HeldFillCache {
        inner: MokaContractCache,
        armed: AtomicBool,
        reached: Arc<Notify>,
        release: Arc<Notify>,
    }

    #[async_trait::async_trait]
    impl ContractCache for HeldFillCache {
        fn ticket(&self) -> CacheTicket {
            self.inner.ticket()
        }

        async fn get(&self, key: &CacheKey) -> Option<CachedValue> {
            self.inner.get(key).await
        }

        async fn set(&self, key: CacheKey, value: CachedValue, ttl: std::time::Duration, ticket: CacheTicket) {
            if matches!(key, CacheKey::Contract(_)) && self.armed.swap(false, Ordering::SeqCst) {
                self.reached.notify_one();
                self.release.notified().await;
            }
            self.inner.set(key, value, ttl, ticket).await;
        }

        async fn invalidate(&self, scopes: &[CacheScope]) {
            self.inner.invalidate(scopes).await;
        }
    }

    #[tokio::test]
    async fn test_read_racing_an_update_does_not_cache_the_old_row() {
        let reached = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let cache = Arc::new(HeldFillCache {
            inner: MokaContractCache::new(100),
            armed: AtomicBool::new(false),
            reached: reached.clone(),
            release: release.clone(),
        });
        let config = ServiceConfig::default();
        let access = config.access_mode.policy();
        let lifecycle = Arc::new(ContractLifecycleEngine::new(
            Arc::new(MemoryUnitOfWork::new()),
            cache.clone(),
            Arc::new(RetryingEventPublisher::new(
                RecordingSink::default(),
                1,
                std::time::Duration::from_millis(1),
            )),
            Arc::new(RandomNumberGenerator),
            access,
            config,
        ));
        let a = Uuid::new_v4();
        let created = lifecycle.create(a, co_ownership_request(&[(a, "100")])).await.unwrap();
        let id = created.contract.id;

        cache.armed.store(true, Ordering::SeqCst);
        let reader = {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.get_by_id(id, Some(a)).await })
        };
        reached.notified().await;

        let patch = UpdateContractRequest {
            title: Some("X".to_string()),
            ..Default::default()
        };
        lifecycle.update(id, a, patch).await.unwrap();
        release.notify_one();

        let raced = reader.await.unwrap().unwrap();
        assert_eq!(raced.contract.title, created.contract.title);
        let reread = lifecycle.get_by_id(id, Some(a)).await.unwrap();
        assert_eq!(reread.contract.title, "X");
    }

    #[tokio::test]
    async fn test_update_after_send_is_rejected() {
        let t = services();
        let a = Uuid::new_v4();
        let pending = t.pending_contract(&[(a, "100")]).await;
        assert_eq!(pending.contract.status, ContractStatus::PendingSignatures);

        let patch = UpdateContractRequest {
            content: Some("new terms".to_string()),
            ..Default::default()
        };
        let err = t
            .services
            .lifecycle
            .update(pending.contract.id, a, patch)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");

        let err = t
            .services
            .lifecycle
            .send_for_signature(pending.contract.id, a)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");
        assert_eq!(t.sink.count("ContractSentForSignature"), 1);
    }

    #[tokio::test]
    async fn test_send_without_parties_is_rejected() {
        let t = services();
        let contract = contract_model();
        let session = t.store.begin().await.unwrap();
        session.contracts().create_batch(vec![contract.clone()]).await.unwrap();
        session.commit().await.unwrap();

        let err = t
            .services
            .lifecycle
            .send_for_signature(contract.id, contract.created_by)
            .await
            .unwrap_err();

        assert_eq!(err.code(), "VALIDATION_ERROR");
        let state = t.store.snapshot().await;
        assert_eq!(state.contracts[&contract.id].status, ContractStatus::Draft);
    }

    #[tokio::test]
    async fn test_only_creator_deletes_drafts() {
        let t = services();
        let lifecycle = &t.services.lifecycle;
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let created = lifecycle
            .create(a, co_ownership_request(&[(a, "50"), (b, "50")]))
            .await
            .unwrap();
        let id = created.contract.id;

        let err = lifecycle.delete(id, b).await.unwrap_err();
        assert_eq!(err.code(), "ACCESS_DENIED");

        lifecycle.delete(id, a).await.unwrap();
        assert_eq!(lifecycle.get_by_id(id, None).await.unwrap_err().code(), "NOT_FOUND");
        assert!(t.store.snapshot().await.parties.is_empty());
    }

    #[tokio::test]
    async fn test_outsider_cannot_read() {
        let t = services();
        let a = Uuid::new_v4();
        let created = t
            .services
            .lifecycle
            .create(a, co_ownership_request(&[(a, "100")]))
            .await
            .unwrap();

        let err = t
            .services
            .lifecycle
            .get_by_id(created.contract.id, Some(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ACCESS_DENIED");
    }

    #[tokio::test]
    async fn test_terminate_pending_contract() {
        let t = services();
        let lifecycle = &t.services.lifecycle;
        let a = Uuid::new_v4();
        let pending = t.pending_contract(&[(a, "100")]).await;
        let id = pending.contract.id;

        assert_eq!(lifecycle.terminate(id, a, "  ").await.unwrap_err().code(), "VALIDATION_ERROR");

        let terminated = lifecycle.terminate(id, a, "vehicle sold").await.unwrap();
        assert_eq!(terminated.contract.status, ContractStatus::Terminated);
        assert_eq!(t.sink.count("ContractTerminated"), 1);

        let err = lifecycle.terminate(id, a, "again").await.unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");
    }

    #[tokio::test]
    async fn test_listings_filter_by_status_and_user() {
        let t = services();
        let lifecycle = &t.services.lifecycle;
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        lifecycle.create(a, co_ownership_request(&[(a, "100")])).await.unwrap();
        t.pending_contract(&[(a, "50"), (b, "50")]).await;

        let mine = lifecycle.list_by_user(a, ContractFilter::default()).await.unwrap();
        assert_eq!(mine.total, 2);
        let theirs = lifecycle.list_by_user(b, ContractFilter::default()).await.unwrap();
        assert_eq!(theirs.total, 1);

        let drafts = ContractFilter {
            status: Some(ContractStatus::Draft),
            ..Default::default()
        };
        let all_drafts = lifecycle.list_all(drafts).await.unwrap();
        assert_eq!(all_drafts.total, 1);
        assert_eq!(all_drafts.items[0].contract.status, ContractStatus::Draft);
    }
}
