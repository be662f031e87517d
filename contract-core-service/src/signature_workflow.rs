use chrono::{DateTime, Utc};
use contract_core_api::{
    ClientInfo, ContractError, ContractEvent, ContractResult, ContractStatus, PartyRole,
    ReminderType, SignaturePayload, SignatureValidator, SigningMessage,
};
use contract_core_db::models::{ContractModel, SignatureLogModel};
use contract_core_db::repository::{CreateBatch, UnitOfWorkSession, UpdateBatch};
use heapless::String as HeaplessString;
use rust_decimal::Decimal;
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::lifecycle::{load_detail, save_contract, ContractDetail, ContractLifecycleEngine};
use crate::signature::content_digest;
use crate::transaction::{discard, finish};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignOutcome {
    pub success: bool,
    pub contract_status: ContractStatus,
    pub all_signed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartySigningState {
    pub user_id: Uuid,
    pub party_role: PartyRole,
    pub signing_order: i32,
    pub has_signed: bool,
    pub signed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SigningStatus {
    pub contract_id: Uuid,
    pub contract_status: ContractStatus,
    pub total_parties: usize,
    pub signed_parties: usize,
    pub unsigned_parties: usize,
    /// signed / total * 100, two decimals; 0 without parties
    pub completion_percentage: Decimal,
    pub parties: Vec<PartySigningState>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationResult {
    pub valid: bool,
    pub contract_id: Uuid,
    pub user_id: Uuid,
    pub signed_at: DateTime<Utc>,
    pub content_digest: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

struct SignedInSession {
    contract: ContractModel,
    detail: ContractDetail,
    signed_at: DateTime<Utc>,
    all_signed: bool,
    activated: bool,
}

/// Collects signatures and activates a contract when the last one arrives.
pub struct SignatureWorkflow {
    engine: Arc<ContractLifecycleEngine>,
    validator: Arc<dyn SignatureValidator>,
}

impl SignatureWorkflow {
    pub fn new(engine: Arc<ContractLifecycleEngine>, validator: Arc<dyn SignatureValidator>) -> Self {
        Self { engine, validator }
    }

    /// Records `user_id`'s signature.
    ///
    /// The unsigned count is taken on the same transaction as the signature
    /// write while the contract is locked, so exactly one call observes the
    /// last signature and activates the contract.
    pub async fn sign(
        &self,
        contract_id: Uuid,
        user_id: Uuid,
        payload: SignaturePayload,
        client: ClientInfo,
    ) -> ContractResult<SignOutcome> {
        payload.validate()?;
        client.validate()?;

        let _guard = self.engine.locks().acquire(contract_id).await;
        let session = self.engine.store().begin().await?;
        let result = self
            .sign_in(session.as_ref(), contract_id, user_id, &payload, &client)
            .await;
        let signed = finish(session, result).await?;

        info!(
            contract_id = %contract_id,
            user_id = %user_id,
            all_signed = signed.all_signed,
            "signature recorded"
        );
        self.engine.invalidate_for(&signed.detail).await;

        let events = self.engine.events();
        events
            .publish(ContractEvent::ContractSigned {
                contract_id,
                user_id,
                signed_at: signed.signed_at,
                all_signed: signed.all_signed,
            })
            .await;
        if signed.activated {
            info!(contract_id = %contract_id, "contract activated");
            events
                .publish(ContractEvent::ContractActivated {
                    contract_id,
                    contract_number: signed.contract.contract_number.to_string(),
                    activated_at: signed.signed_at,
                    party_user_ids: signed.detail.party_user_ids(),
                })
                .await;
        }

        Ok(SignOutcome {
            success: true,
            contract_status: signed.contract.status,
            all_signed: signed.all_signed,
        })
    }

    async fn sign_in(
        &self,
        session: &dyn UnitOfWorkSession,
        contract_id: Uuid,
        user_id: Uuid,
        payload: &SignaturePayload,
        client: &ClientInfo,
    ) -> ContractResult<SignedInSession> {
        let mut detail = load_detail(session, contract_id, true).await?;

        let party = detail
            .parties
            .iter_mut()
            .find(|p| p.user_id == user_id)
            .ok_or(ContractError::NotAParty { contract_id, user_id })?;
        if party.has_signed {
            return Err(ContractError::AlreadySigned { contract_id, user_id });
        }
        if detail.contract.status != ContractStatus::PendingSignatures {
            return Err(ContractError::InvalidState(format!(
                "contract {contract_id} is {} and is not collecting signatures",
                detail.contract.status
            )));
        }

        let digest = content_digest(&detail.contract.content);
        let message = SigningMessage::new(contract_id, user_id, digest.clone());
        if !self.validator.validate(&message, &payload.signature_data).await? {
            return Err(ContractError::SignatureInvalid(format!(
                "signature of user {user_id} does not match contract {contract_id}"
            )));
        }

        let now = Utc::now();
        let ip_address = client
            .ip_address
            .as_deref()
            .map(HeaplessString::<45>::from_str)
            .transpose()
            .map_err(|_| ContractError::ValidationError("ip_address exceeds 45 bytes".to_string()))?;
        session
            .signature_logs()
            .create_batch(vec![SignatureLogModel {
                id: Uuid::new_v4(),
                contract_id,
                user_id,
                signature_data: payload.signature_data.clone(),
                content_digest: digest,
                signed_at: now,
                ip_address,
                user_agent: client.user_agent.clone(),
            }])
            .await?;

        party.has_signed = true;
        party.signed_at = Some(now);
        party.signature_data = Some(payload.signature_data.clone());
        session.parties().update_batch(vec![party.clone()]).await?;

        let all_signed = session.parties().count_unsigned(contract_id).await? == 0;
        let mut activated = false;
        if all_signed {
            detail.contract.status = detail
                .contract
                .status
                .transition(detail.contract.contract_type, ContractStatus::Active)?;
            detail.contract.activated_at = Some(now);
            detail.contract.updated_at = now;
            detail.contract = save_contract(session, detail.contract).await?;
            activated = true;
        }

        Ok(SignedInSession {
            contract: detail.contract.clone(),
            detail,
            signed_at: now,
            all_signed,
            activated,
        })
    }

    pub async fn get_status(
        &self,
        contract_id: Uuid,
        requester_id: Option<Uuid>,
    ) -> ContractResult<SigningStatus> {
        let detail = self.engine.get_by_id(contract_id, requester_id).await?;

        let total = detail.parties.len();
        let signed = detail.parties.iter().filter(|p| p.has_signed).count();
        let completion_percentage = if total == 0 {
            Decimal::ZERO
        } else {
            (Decimal::from(signed as u64) * Decimal::ONE_HUNDRED / Decimal::from(total as u64)).round_dp(2)
        };

        Ok(SigningStatus {
            contract_id,
            contract_status: detail.contract.status,
            total_parties: total,
            signed_parties: signed,
            unsigned_parties: total - signed,
            completion_percentage,
            parties: detail
                .parties
                .iter()
                .map(|p| PartySigningState {
                    user_id: p.user_id,
                    party_role: p.party_role,
                    signing_order: p.signing_order,
                    has_signed: p.has_signed,
                    signed_at: p.signed_at,
                })
                .collect(),
        })
    }

    /// Sends one reminder per unsigned party and returns how many were sent.
    pub async fn remind(
        &self,
        contract_id: Uuid,
        requester_id: Uuid,
        reminder_type: ReminderType,
    ) -> ContractResult<usize> {
        let session = self.engine.store().begin().await?;
        let result = load_detail(session.as_ref(), contract_id, false).await;
        discard(session).await;
        let detail = result?;

        self.engine
            .access()
            .check(requester_id, &detail.contract, &detail.parties)?;
        if detail.contract.status != ContractStatus::PendingSignatures {
            return Err(ContractError::InvalidState(format!(
                "contract {contract_id} is {} and is not collecting signatures",
                detail.contract.status
            )));
        }
        let unsigned: Vec<Uuid> = detail
            .parties
            .iter()
            .filter(|p| !p.has_signed)
            .map(|p| p.user_id)
            .collect();
        if unsigned.is_empty() {
            return Err(ContractError::AllSigned(contract_id));
        }

        for user_id in &unsigned {
            self.engine
                .events()
                .publish(ContractEvent::SignatureReminderSent {
                    contract_id,
                    user_id: *user_id,
                    reminder_type,
                    requested_by: requester_id,
                })
                .await;
        }
        info!(contract_id = %contract_id, reminded = unsigned.len(), %reminder_type, "signature reminders sent");
        Ok(unsigned.len())
    }

    /// Re-checks a recorded signature against the content digest it was made over.
    pub async fn verify(
        &self,
        contract_id: Uuid,
        payload: SignaturePayload,
    ) -> ContractResult<VerificationResult> {
        payload.validate()?;

        let session = self.engine.store().begin().await?;
        let result = session
            .signature_logs()
            .find_by_signature(contract_id, &payload.signature_data)
            .await;
        discard(session).await;
        let log = result?.ok_or(ContractError::SignatureNotFound(contract_id))?;

        let message = SigningMessage::new(contract_id, log.user_id, log.content_digest.clone());
        let valid = match self.validator.validate(&message, &log.signature_data).await {
            Ok(valid) => valid,
            Err(ContractError::SignatureInvalid(reason)) => {
                warn!(contract_id = %contract_id, user_id = %log.user_id, %reason, "stored signature no longer verifies");
                false
            }
            Err(e) => return Err(e),
        };

        Ok(VerificationResult {
            valid,
            contract_id,
            user_id: log.user_id,
            signed_at: log.signed_at,
            content_digest: log.content_digest,
            ip_address: log.ip_address.map(|ip| ip.to_string()),
            user_agent: log.user_agent,
        })
    }

    /// Signature audit trail, oldest first.
    pub async fn logs(
        &self,
        contract_id: Uuid,
        requester_id: Uuid,
    ) -> ContractResult<Vec<SignatureLogModel>> {
        let session = self.engine.store().begin().await?;
        let result = self.logs_in(session.as_ref(), contract_id, requester_id).await;
        discard(session).await;
        result
    }

    async fn logs_in(
        &self,
        session: &dyn UnitOfWorkSession,
        contract_id: Uuid,
        requester_id: Uuid,
    ) -> ContractResult<Vec<SignatureLogModel>> {
        let detail = load_detail(session, contract_id, false).await?;
        self.engine
            .access()
            .check(requester_id, &detail.contract, &detail.parties)?;
        Ok(session.signature_logs().find_by_contract_id(contract_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helper::{services, signature_for};
    use tokio_test::{assert_err, assert_ok};

    fn client() -> ClientInfo {
        ClientInfo {
            ip_address: Some("203.0.113.7".to_string()),
            user_agent: Some("mobile-app/4.2".to_string()),
        }
    }

    #[tokio::test]
    async fn test_sixty_forty_contract_activates_on_second_signature() {
        let t = services();
        let signatures = &t.services.signatures;
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let pending = t.pending_contract(&[(a, "60"), (b, "40")]).await;
        let id = pending.contract.id;

        let first = signatures
            .sign(id, a, signature_for(&pending.contract, a), client())
            .await
            .unwrap();
        assert_eq!(first.contract_status, ContractStatus::PendingSignatures);
        assert!(!first.all_signed);

        let status = signatures.get_status(id, Some(a)).await.unwrap();
        assert_eq!(status.signed_parties, 1);
        assert_eq!(status.completion_percentage, Decimal::new(5000, 2));

        let second = signatures
            .sign(id, b, signature_for(&pending.contract, b), client())
            .await
            .unwrap();
        assert!(second.success);
        assert_eq!(second.contract_status, ContractStatus::Active);
        assert!(second.all_signed);

        let active = t.services.lifecycle.get_by_id(id, Some(b)).await.unwrap();
        assert_eq!(active.contract.status, ContractStatus::Active);
        assert!(active.contract.activated_at.is_some());
        assert_eq!(t.sink.count("ContractSigned"), 2);
        assert_eq!(t.sink.count("ContractActivated"), 1);

        let logs = signatures.logs(id, a).await.unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[0].user_id, a);
        assert_eq!(logs[0].ip_address.as_deref(), Some("203.0.113.7"));
    }

    #[tokio::test]
    async fn test_second_signature_by_same_party_is_rejected() {
        let t = services();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let pending = t.pending_contract(&[(a, "50"), (b, "50")]).await;
        let id = pending.contract.id;
        let signatures = &t.services.signatures;

        assert_ok!(
            signatures
                .sign(id, a, signature_for(&pending.contract, a), client())
                .await
        );
        let err = assert_err!(
            signatures
                .sign(id, a, signature_for(&pending.contract, a), client())
                .await
        );

        assert_eq!(err.code(), "ALREADY_SIGNED");
        assert_eq!(t.store.snapshot().await.signature_logs.len(), 1);
    }

    #[tokio::test]
    async fn test_outsider_is_not_a_party() {
        let t = services();
        let a = Uuid::new_v4();
        let pending = t.pending_contract(&[(a, "100")]).await;
        let outsider = Uuid::new_v4();

        let err = t
            .services
            .signatures
            .sign(
                pending.contract.id,
                outsider,
                signature_for(&pending.contract, outsider),
                client(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), "NOT_A_PARTY");
    }

    #[tokio::test]
    async fn test_signing_a_draft_records_nothing() {
        let t = services();
        let a = Uuid::new_v4();
        let draft = t
            .services
            .lifecycle
            .create(a, crate::test_helper::co_ownership_request(&[(a, "100")]))
            .await
            .unwrap();

        let err = t
            .services
            .signatures
            .sign(draft.contract.id, a, signature_for(&draft.contract, a), client())
            .await
            .unwrap_err();

        assert_eq!(err.code(), "INVALID_STATE");
        let state = t.store.snapshot().await;
        assert!(state.signature_logs.is_empty());
        assert!(state.parties.values().all(|p| !p.has_signed));
    }

    #[tokio::test]
    async fn test_invalid_signature_records_nothing() {
        let t = services();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let pending = t.pending_contract(&[(a, "50"), (b, "50")]).await;

        // b's commitment submitted by a
        let err = t
            .services
            .signatures
            .sign(pending.contract.id, a, signature_for(&pending.contract, b), client())
            .await
            .unwrap_err();

        assert_eq!(err.code(), "SIGNATURE_INVALID");
        let state = t.store.snapshot().await;
        assert!(state.signature_logs.is_empty());
        assert!(state.parties.values().all(|p| !p.has_signed));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_simultaneous_last_signatures_activate_once() {
        let t = services();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let pending = t.pending_contract(&[(a, "50"), (b, "50")]).await;

        let mut handles = Vec::new();
        for user_id in [a, b] {
            let signatures = t.services.signatures.clone();
            let contract = pending.contract.clone();
            handles.push(tokio::spawn(async move {
                signatures
                    .sign(contract.id, user_id, signature_for(&contract, user_id), ClientInfo::default())
                    .await
            }));
        }
        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(outcomes.iter().filter(|o| o.all_signed).count(), 1);
        assert_eq!(t.sink.count("ContractActivated"), 1);
        let state = t.store.snapshot().await;
        assert_eq!(state.contracts[&pending.contract.id].status, ContractStatus::Active);
    }

    #[tokio::test]
    async fn test_remind_targets_unsigned_parties() {
        let t = services();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let pending = t.pending_contract(&[(a, "50"), (b, "25"), (c, "25")]).await;
        let id = pending.contract.id;
        let signatures = &t.services.signatures;

        signatures
            .sign(id, a, signature_for(&pending.contract, a), client())
            .await
            .unwrap();
        let sent = signatures.remind(id, a, ReminderType::FollowUp).await.unwrap();

        assert_eq!(sent, 2);
        let reminded: Vec<Uuid> = t
            .sink
            .events()
            .into_iter()
            .filter_map(|e| match e {
                ContractEvent::SignatureReminderSent { user_id, .. } => Some(user_id),
                _ => None,
            })
            .collect();
        assert_eq!(reminded, vec![b, c]);

        let outsider = Uuid::new_v4();
        let err = signatures.remind(id, outsider, ReminderType::Initial).await.unwrap_err();
        assert_eq!(err.code(), "ACCESS_DENIED");
    }

    #[tokio::test]
    async fn test_remind_requires_pending_contract() {
        let t = services();
        let a = Uuid::new_v4();
        let active = t.active_contract(&[(a, "100")]).await;

        let err = t
            .services
            .signatures
            .remind(active.contract.id, a, ReminderType::Final)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INVALID_STATE");
    }

    #[tokio::test]
    async fn test_verify_recorded_signature() {
        let t = services();
        let a = Uuid::new_v4();
        let pending = t.pending_contract(&[(a, "100")]).await;
        let id = pending.contract.id;
        let payload = signature_for(&pending.contract, a);
        t.services
            .signatures
            .sign(id, a, payload.clone(), client())
            .await
            .unwrap();

        let result = t.services.signatures.verify(id, payload).await.unwrap();
        assert!(result.valid);
        assert_eq!(result.user_id, a);
        assert_eq!(result.content_digest, content_digest(&pending.contract.content));
        assert_eq!(result.user_agent.as_deref(), Some("mobile-app/4.2"));

        let unknown = SignaturePayload {
            signature_data: "00".repeat(32),
        };
        let err = t.services.signatures.verify(id, unknown).await.unwrap_err();
        assert_eq!(err.code(), "SIGNATURE_NOT_FOUND");
    }
}
