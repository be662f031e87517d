//! Fixtures shared by the unit tests of this crate.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use contract_core_api::{
    ContractEvent, ContractStatus, ContractType, CreateContractRequest, PartyRequest, PartyRole,
    SignaturePayload, SigningMessage,
};
use contract_core_db::models::{ContractModel, PartyModel};
use heapless::String as HeaplessString;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use uuid::Uuid;

use crate::config::ServiceConfig;
use crate::events::{EventSink, RetryingEventPublisher};
use crate::job_lock::LocalJobLock;
use crate::lifecycle::ContractDetail;
use crate::memory_store::MemoryUnitOfWork;
use crate::signature::{content_digest, HashSignatureValidator};
use crate::ContractServices;

pub fn contract_model() -> ContractModel {
    let now = Utc::now();
    let suffix = Uuid::new_v4().simple().to_string();
    ContractModel {
        id: Uuid::new_v4(),
        contract_number: HeaplessString::from_str(&format!("CC-TEST-{}", &suffix[..12])).unwrap(),
        group_id: Uuid::new_v4(),
        contract_type: ContractType::CoOwnership,
        title: "Co-ownership of the shared vehicle".to_string(),
        content: "The parties share the vehicle.".to_string(),
        status: ContractStatus::Draft,
        effective_date: now,
        expiry_date: Some(now + Duration::days(365)),
        auto_renew: false,
        parent_contract_id: None,
        activated_at: None,
        created_by: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        hash: 0,
    }
}

pub fn party_model(contract_id: Uuid, percentage: &str) -> PartyModel {
    PartyModel {
        id: Uuid::new_v4(),
        contract_id,
        user_id: Uuid::new_v4(),
        party_role: PartyRole::CoOwner,
        ownership_percentage: Decimal::from_str(percentage).unwrap(),
        signing_order: 1,
        has_signed: false,
        signed_at: None,
        signature_data: None,
        created_at: Utc::now(),
    }
}

/// Co-ownership request for one group with the given `(user, percentage)` split.
pub fn co_ownership_request(parties: &[(Uuid, &str)]) -> CreateContractRequest {
    let now = Utc::now();
    CreateContractRequest {
        group_id: Uuid::new_v4(),
        contract_type: ContractType::CoOwnership,
        title: "Shared vehicle agreement".to_string(),
        content: None,
        effective_date: now,
        expiry_date: Some(now + Duration::days(365)),
        auto_renew: false,
        parent_contract_id: None,
        parties: parties
            .iter()
            .map(|(user_id, percentage)| PartyRequest {
                user_id: *user_id,
                party_role: PartyRole::CoOwner,
                ownership_percentage: Decimal::from_str(percentage).unwrap(),
                signing_order: None,
            })
            .collect(),
    }
}

/// The commitment `HashSignatureValidator` accepts from `user_id` for `contract`.
pub fn signature_for(contract: &ContractModel, user_id: Uuid) -> SignaturePayload {
    let message = SigningMessage::new(contract.id, user_id, content_digest(&contract.content));
    SignaturePayload {
        signature_data: HashSignatureValidator::commitment(&message),
    }
}

/// Keeps every delivered event in memory.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<ContractEvent>>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<ContractEvent> {
        self.events.lock().clone()
    }

    pub fn count(&self, event_type: &str) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.event_type() == event_type)
            .count()
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn deliver(&self, event: &ContractEvent) -> anyhow::Result<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }
}

pub struct TestServices {
    pub store: MemoryUnitOfWork,
    pub sink: RecordingSink,
    pub services: ContractServices,
}

pub fn services() -> TestServices {
    services_with(ServiceConfig::default())
}

pub fn services_with(config: ServiceConfig) -> TestServices {
    let store = MemoryUnitOfWork::new();
    let sink = RecordingSink::default();
    let publisher = RetryingEventPublisher::new(sink.clone(), 1, StdDuration::from_millis(1));
    let services = ContractServices::new(
        Arc::new(store.clone()),
        Arc::new(publisher),
        Arc::new(HashSignatureValidator),
        Arc::new(LocalJobLock::new()),
        config,
    );
    TestServices {
        store,
        sink,
        services,
    }
}

impl TestServices {
    /// Creates a contract split between `parties` and sends it for signature.
    /// The first party is the creator.
    pub async fn pending_contract(&self, parties: &[(Uuid, &str)]) -> ContractDetail {
        let lifecycle = &self.services.lifecycle;
        let creator = parties[0].0;
        let created = lifecycle
            .create(creator, co_ownership_request(parties))
            .await
            .unwrap();
        lifecycle
            .send_for_signature(created.contract.id, creator)
            .await
            .unwrap()
    }

    /// A contract every party has signed.
    pub async fn active_contract(&self, parties: &[(Uuid, &str)]) -> ContractDetail {
        let pending = self.pending_contract(parties).await;
        self.sign_all(&pending).await
    }

    pub async fn sign_all(&self, detail: &ContractDetail) -> ContractDetail {
        for party in &detail.parties {
            self.services
                .signatures
                .sign(
                    detail.contract.id,
                    party.user_id,
                    signature_for(&detail.contract, party.user_id),
                    Default::default(),
                )
                .await
                .unwrap();
        }
        self.services
            .lifecycle
            .get_by_id(detail.contract.id, None)
            .await
            .unwrap()
    }
}
