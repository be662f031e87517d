use chrono::{DateTime, Months, Utc};
use contract_core_api::{
    AmendmentStage, ContractError, ContractEvent, ContractResult, ContractStatus, ContractType,
    CreateAmendmentRequest, NumberKind,
};
use contract_core_db::models::{AmendmentModel, ContractModel, PartyModel};
use contract_core_db::repository::{ContractQuery, CreateBatch, PageRequest, UnitOfWorkSession};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::lifecycle::{
    contract_number, load_detail, save_contract, ContractDetail, ContractLifecycleEngine,
};
use crate::numbering::allocate_number;
use crate::templates;
use crate::transaction::{discard, finish};

/// An amendment link together with the amendment contract it points to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmendmentDetail {
    pub amendment: AmendmentModel,
    pub contract: ContractDetail,
}

struct Approval {
    original: ContractDetail,
    amendment: ContractDetail,
    link: AmendmentModel,
}

/// Derives amendment and renewal contracts from an existing contract.
pub struct AmendmentWorkflow {
    engine: Arc<ContractLifecycleEngine>,
}

async fn insert_contract(
    session: &dyn UnitOfWorkSession,
    contract: ContractModel,
    parties: Vec<PartyModel>,
) -> ContractResult<ContractDetail> {
    let contract = session
        .contracts()
        .create_batch(vec![contract])
        .await?
        .pop()
        .ok_or_else(|| ContractError::PersistenceError("contract insert returned nothing".to_string()))?;
    let parties = session.parties().create_batch(parties).await?;
    Ok(ContractDetail { contract, parties })
}

#[allow(clippy::too_many_arguments)]
fn derived_contract(
    original: &ContractModel,
    number: &str,
    contract_type: ContractType,
    title: String,
    content: String,
    effective_date: DateTime<Utc>,
    expiry_date: Option<DateTime<Utc>>,
    created_by: Uuid,
    now: DateTime<Utc>,
) -> ContractResult<ContractModel> {
    Ok(ContractModel {
        id: Uuid::new_v4(),
        contract_number: contract_number(number)?,
        group_id: original.group_id,
        contract_type,
        title,
        content,
        status: ContractStatus::Draft,
        effective_date,
        expiry_date,
        auto_renew: false,
        parent_contract_id: Some(original.id),
        activated_at: None,
        created_by,
        created_at: now,
        updated_at: now,
        hash: 0,
    })
}

impl AmendmentWorkflow {
    pub fn new(engine: Arc<ContractLifecycleEngine>) -> Self {
        Self { engine }
    }

    /// Drafts an amendment to an active contract. Every party of the original
    /// is copied onto the amendment unsigned.
    pub async fn create(
        &self,
        original_id: Uuid,
        requester_id: Uuid,
        request: CreateAmendmentRequest,
    ) -> ContractResult<AmendmentDetail> {
        request.validate()?;

        let _guard = self.engine.locks().acquire(original_id).await;
        let session = self.engine.store().begin().await?;
        let result = self
            .create_in(session.as_ref(), original_id, requester_id, &request)
            .await;
        let (original, created) = finish(session, result).await?;

        info!(
            original_contract_id = %original_id,
            amendment_contract_id = %created.contract.contract.id,
            amendment_number = %created.contract.contract.contract_number,
            "amendment drafted"
        );
        self.engine.invalidate_for(&original).await;
        self.engine.invalidate_for(&created.contract).await;
        self.engine
            .events()
            .publish(ContractEvent::ContractAmended {
                original_contract_id: original_id,
                amendment_contract_id: created.contract.contract.id,
                amendment_number: created.contract.contract.contract_number.to_string(),
                stage: AmendmentStage::Proposed,
                amendment_reason: created.amendment.amendment_reason.clone(),
                actor_id: requester_id,
            })
            .await;

        Ok(created)
    }

    async fn create_in(
        &self,
        session: &dyn UnitOfWorkSession,
        original_id: Uuid,
        requester_id: Uuid,
        request: &CreateAmendmentRequest,
    ) -> ContractResult<(ContractDetail, AmendmentDetail)> {
        let original = load_detail(session, original_id, true).await?;
        self.engine
            .access()
            .check(requester_id, &original.contract, &original.parties)?;
        if original.contract.status != ContractStatus::Active {
            return Err(ContractError::InvalidState(format!(
                "only active contracts can be amended, contract {original_id} is {}",
                original.contract.status
            )));
        }

        let number = allocate_number(
            self.engine.numbers(),
            session,
            NumberKind::Amendment,
            Some(original.contract.contract_number.as_str()),
        )
        .await?;
        let now = Utc::now();
        let effective_date = request.effective_date.unwrap_or(now);
        let expiry_date = original.contract.expiry_date.filter(|expiry| *expiry > effective_date);
        let title = request
            .title
            .clone()
            .unwrap_or_else(|| format!("Amendment to {}", original.contract.title));
        let content = request
            .content
            .clone()
            .unwrap_or_else(|| templates::amendment(&original.contract, &number, request));

        let contract = derived_contract(
            &original.contract,
            &number,
            ContractType::Amendment,
            title,
            content,
            effective_date,
            expiry_date,
            requester_id,
            now,
        )?;
        let parties = original
            .parties
            .iter()
            .map(|p| p.unsigned_copy_for(contract.id, now))
            .collect();
        let link = AmendmentModel {
            id: Uuid::new_v4(),
            original_contract_id: original_id,
            amendment_contract_id: contract.id,
            amendment_reason: request.amendment_reason.clone(),
            changes_summary: request.changes_summary.clone(),
            created_by: requester_id,
            created_at: now,
        };

        let detail = insert_contract(session, contract, parties).await?;
        let amendment = session
            .amendments()
            .create_batch(vec![link])
            .await?
            .pop()
            .ok_or_else(|| ContractError::PersistenceError("amendment insert returned nothing".to_string()))?;

        Ok((
            original,
            AmendmentDetail {
                amendment,
                contract: detail,
            },
        ))
    }

    /// Applies a fully signed amendment: the original takes over the
    /// amendment's content and the amendment becomes `executed`.
    pub async fn approve(
        &self,
        amendment_contract_id: Uuid,
        approver_id: Uuid,
    ) -> ContractResult<ContractDetail> {
        let session = self.engine.store().begin().await?;
        let link = session
            .amendments()
            .find_by_amendment_contract_id(amendment_contract_id)
            .await;
        discard(session).await;
        let link = link?.ok_or_else(|| {
            ContractError::NotFound(format!("amendment for contract {amendment_contract_id}"))
        })?;

        let _guards = self
            .engine
            .locks()
            .acquire_pair(link.original_contract_id, amendment_contract_id)
            .await;
        let session = self.engine.store().begin().await?;
        let result = self.approve_in(session.as_ref(), link, approver_id).await;
        let approval = finish(session, result).await?;

        info!(
            original_contract_id = %approval.original.contract.id,
            amendment_contract_id = %amendment_contract_id,
            approver_id = %approver_id,
            "amendment executed"
        );
        self.engine.invalidate_for(&approval.original).await;
        self.engine.invalidate_for(&approval.amendment).await;
        self.engine
            .events()
            .publish(ContractEvent::ContractAmended {
                original_contract_id: approval.original.contract.id,
                amendment_contract_id,
                amendment_number: approval.amendment.contract.contract_number.to_string(),
                stage: AmendmentStage::Approved,
                amendment_reason: approval.link.amendment_reason.clone(),
                actor_id: approver_id,
            })
            .await;

        Ok(approval.original)
    }

    async fn approve_in(
        &self,
        session: &dyn UnitOfWorkSession,
        link: AmendmentModel,
        approver_id: Uuid,
    ) -> ContractResult<Approval> {
        // Row locks follow the same id order as the in-process pair lock.
        let (first, second) = if link.original_contract_id <= link.amendment_contract_id {
            (link.original_contract_id, link.amendment_contract_id)
        } else {
            (link.amendment_contract_id, link.original_contract_id)
        };
        let a = load_detail(session, first, true).await?;
        let b = load_detail(session, second, true).await?;
        let (mut original, mut amendment) = if a.contract.id == link.original_contract_id {
            (a, b)
        } else {
            (b, a)
        };

        self.engine
            .access()
            .check(approver_id, &amendment.contract, &amendment.parties)?;
        if amendment.contract.status != ContractStatus::Active {
            return Err(ContractError::InvalidState(format!(
                "amendment {} is {} and cannot be approved",
                amendment.contract.id, amendment.contract.status
            )));
        }
        if original.contract.status != ContractStatus::Active {
            return Err(ContractError::InvalidState(format!(
                "original contract {} is {} and can no longer be amended",
                original.contract.id, original.contract.status
            )));
        }

        let now = Utc::now();
        original.contract.content = amendment.contract.content.clone();
        original.contract.updated_at = now;
        amendment.contract.status = amendment
            .contract
            .status
            .transition(amendment.contract.contract_type, ContractStatus::Executed)?;
        amendment.contract.updated_at = now;

        original.contract = save_contract(session, original.contract).await?;
        amendment.contract = save_contract(session, amendment.contract).await?;
        Ok(Approval {
            original,
            amendment,
            link,
        })
    }

    /// Amendments of a contract, newest first.
    pub async fn list(
        &self,
        original_id: Uuid,
        requester_id: Option<Uuid>,
    ) -> ContractResult<Vec<AmendmentDetail>> {
        self.engine.get_by_id(original_id, requester_id).await?;

        let session = self.engine.store().begin().await?;
        let result = Self::list_in(session.as_ref(), original_id).await;
        discard(session).await;
        result
    }

    async fn list_in(
        session: &dyn UnitOfWorkSession,
        original_id: Uuid,
    ) -> ContractResult<Vec<AmendmentDetail>> {
        let links = session.amendments().find_by_original_contract_id(original_id).await?;
        let mut amendments = Vec::with_capacity(links.len());
        for amendment in links {
            let contract = load_detail(session, amendment.amendment_contract_id, false).await?;
            amendments.push(AmendmentDetail { amendment, contract });
        }
        Ok(amendments)
    }

    /// Drafts the renewal of an active, auto-renewing co-ownership contract.
    ///
    /// Returns `None` when the contract does not qualify or already has a
    /// renewal draft.
    pub async fn create_renewal(&self, original_id: Uuid) -> ContractResult<Option<ContractDetail>> {
        let _guard = self.engine.locks().acquire(original_id).await;
        let session = self.engine.store().begin().await?;
        let result = self.renewal_in(session.as_ref(), original_id).await;
        let Some(renewal) = finish(session, result).await? else {
            return Ok(None);
        };

        info!(
            original_contract_id = %original_id,
            renewal_contract_id = %renewal.contract.id,
            renewal_number = %renewal.contract.contract_number,
            "renewal drafted"
        );
        self.engine.invalidate_for(&renewal).await;
        self.engine
            .events()
            .publish(ContractEvent::ContractRenewalDrafted {
                original_contract_id: original_id,
                renewal_contract_id: renewal.contract.id,
                renewal_number: renewal.contract.contract_number.to_string(),
                effective_date: renewal.contract.effective_date,
                expiry_date: renewal
                    .contract
                    .expiry_date
                    .unwrap_or(renewal.contract.effective_date),
            })
            .await;

        Ok(Some(renewal))
    }

    async fn renewal_in(
        &self,
        session: &dyn UnitOfWorkSession,
        original_id: Uuid,
    ) -> ContractResult<Option<ContractDetail>> {
        let original = load_detail(session, original_id, true).await?;
        let contract = &original.contract;
        let Some(old_expiry) = contract.expiry_date else {
            return Ok(None);
        };
        if contract.status != ContractStatus::Active
            || contract.contract_type != ContractType::CoOwnership
            || !contract.auto_renew
        {
            return Ok(None);
        }

        let existing = session
            .contracts()
            .query(
                &ContractQuery {
                    parent_contract_id: Some(original_id),
                    contract_type: Some(ContractType::Renewal),
                    ..Default::default()
                },
                PageRequest::new(1, 0),
            )
            .await?;
        if existing.total > 0 {
            debug!(contract_id = %original_id, "renewal draft already exists");
            return Ok(None);
        }

        let term = self.engine.config().renewal_term_months;
        let new_expiry = old_expiry.checked_add_months(Months::new(term)).ok_or_else(|| {
            ContractError::ValidationError(format!(
                "renewal of contract {original_id} would expire out of range"
            ))
        })?;
        let number = allocate_number(
            self.engine.numbers(),
            session,
            NumberKind::Renewal,
            Some(contract.contract_number.as_str()),
        )
        .await?;
        let now = Utc::now();
        let content = templates::renewal(contract, &number, old_expiry, new_expiry, &original.parties);

        let renewal = derived_contract(
            contract,
            &number,
            ContractType::Renewal,
            format!("Renewal of {}", contract.title),
            content,
            old_expiry,
            Some(new_expiry),
            contract.created_by,
            now,
        )?;
        let parties = original
            .parties
            .iter()
            .map(|p| p.unsigned_copy_for(renewal.id, now))
            .collect();

        Ok(Some(insert_contract(session, renewal, parties).await?))
    }
}
