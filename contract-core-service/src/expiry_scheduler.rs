use chrono::{DateTime, Duration as ChronoDuration, Utc};
use contract_core_api::{ContractEvent, ContractResult, ContractStatus, ContractType};
use contract_core_db::repository::{ContractQuery, JobLock, PageRequest, UnitOfWorkSession};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::amendment_workflow::AmendmentWorkflow;
use crate::lifecycle::{ContractDetail, ContractLifecycleEngine};
use crate::transaction::discard;

pub const CHECK_EXPIRING_JOB: &str = "contract_check_expiring";
pub const EXPIRE_CONTRACTS_JOB: &str = "contract_expire_contracts";

/// Outcome of one sweep. `skipped` is set when another run of the same job
/// held the job lock and nothing was done.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub skipped: bool,
    pub candidates: usize,
    pub processed: usize,
    pub renewals_drafted: usize,
    pub failures: usize,
}

impl SweepReport {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Default::default()
        }
    }
}

/// Periodic expiry reminders, renewal drafting and expiry of overdue contracts.
pub struct ExpiryScheduler {
    engine: Arc<ContractLifecycleEngine>,
    amendments: Arc<AmendmentWorkflow>,
    job_lock: Arc<dyn JobLock>,
}

impl ExpiryScheduler {
    pub fn new(
        engine: Arc<ContractLifecycleEngine>,
        amendments: Arc<AmendmentWorkflow>,
        job_lock: Arc<dyn JobLock>,
    ) -> Self {
        Self {
            engine,
            amendments,
            job_lock,
        }
    }

    pub async fn check_expiring(&self) -> ContractResult<SweepReport> {
        self.check_expiring_at(Utc::now()).await
    }

    /// Reminds the parties of active contracts expiring within the configured
    /// window of `now` and drafts renewals for auto-renewing co-ownerships.
    pub async fn check_expiring_at(&self, now: DateTime<Utc>) -> ContractResult<SweepReport> {
        let Some(_lease) = self.job_lock.try_acquire(CHECK_EXPIRING_JOB).await? else {
            info!(job = CHECK_EXPIRING_JOB, "previous sweep still running, skipping");
            return Ok(SweepReport::skipped());
        };

        let window = ChronoDuration::days(self.engine.config().expiry_window_days);
        let query = ContractQuery {
            status: Some(ContractStatus::Active),
            expiry_from: Some(now),
            expiry_until: Some(now + window),
            ..Default::default()
        };
        let candidates = self.candidates(&query).await?;

        let mut report = SweepReport {
            candidates: candidates.len(),
            ..Default::default()
        };
        for detail in candidates {
            match self.remind_and_renew(&detail, now).await {
                Ok(renewed) => {
                    report.processed += 1;
                    if renewed {
                        report.renewals_drafted += 1;
                    }
                }
                Err(e) => {
                    report.failures += 1;
                    warn!(contract_id = %detail.contract.id, error = %e, "expiry check failed for contract");
                }
            }
        }

        info!(job = CHECK_EXPIRING_JOB, ?report, "expiry check finished");
        Ok(report)
    }

    async fn remind_and_renew(&self, detail: &ContractDetail, now: DateTime<Utc>) -> ContractResult<bool> {
        let contract = &detail.contract;
        if let (Some(expiry_date), Some(days_until_expiry)) =
            (contract.expiry_date, contract.days_until_expiry(now))
        {
            self.engine
                .events()
                .publish(ContractEvent::ContractExpiryReminderSent {
                    contract_id: contract.id,
                    contract_number: contract.contract_number.to_string(),
                    expiry_date,
                    days_until_expiry,
                    party_user_ids: detail.party_user_ids(),
                })
                .await;
        }

        if contract.contract_type == ContractType::CoOwnership && contract.auto_renew {
            return Ok(self.amendments.create_renewal(contract.id).await?.is_some());
        }
        Ok(false)
    }

    pub async fn expire_contracts(&self) -> ContractResult<SweepReport> {
        self.expire_contracts_at(Utc::now()).await
    }

    /// Moves every active contract whose expiry date has passed to `expired`.
    pub async fn expire_contracts_at(&self, now: DateTime<Utc>) -> ContractResult<SweepReport> {
        let Some(_lease) = self.job_lock.try_acquire(EXPIRE_CONTRACTS_JOB).await? else {
            info!(job = EXPIRE_CONTRACTS_JOB, "previous sweep still running, skipping");
            return Ok(SweepReport::skipped());
        };

        let query = ContractQuery {
            status: Some(ContractStatus::Active),
            expiry_before: Some(now),
            ..Default::default()
        };
        let candidates = self.candidates(&query).await?;

        let mut report = SweepReport {
            candidates: candidates.len(),
            ..Default::default()
        };
        for detail in candidates {
            let contract_id = detail.contract.id;
            match self.engine.expire_if_due(contract_id, now).await {
                Ok(true) => report.processed += 1,
                Ok(false) => debug!(contract_id = %contract_id, "contract no longer due for expiry"),
                Err(e) => {
                    report.failures += 1;
                    warn!(contract_id = %contract_id, error = %e, "failed to expire contract");
                }
            }
        }

        info!(job = EXPIRE_CONTRACTS_JOB, ?report, "expiry sweep finished");
        Ok(report)
    }

    /// Both sweeps, reminders first.
    pub async fn run_once(&self, now: DateTime<Utc>) -> ContractResult<(SweepReport, SweepReport)> {
        let expiring = self.check_expiring_at(now).await?;
        let expired = self.expire_contracts_at(now).await?;
        Ok((expiring, expired))
    }

    /// Runs both sweeps every `every` until the task is aborted.
    pub fn spawn(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_once(Utc::now()).await {
                    error!(error = %e, "contract sweep failed");
                }
            }
        })
    }

    /// Snapshot of every contract matching `query`, read in one session
    /// before any of them is touched.
    async fn candidates(&self, query: &ContractQuery) -> ContractResult<Vec<ContractDetail>> {
        let session = self.engine.store().begin().await?;
        let result = Self::collect(session.as_ref(), query).await;
        discard(session).await;
        result
    }

    async fn collect(
        session: &dyn UnitOfWorkSession,
        query: &ContractQuery,
    ) -> ContractResult<Vec<ContractDetail>> {
        let mut details = Vec::new();
        let mut page = PageRequest::new(PageRequest::MAX_LIMIT, 0);
        loop {
            let contracts = session.contracts().query(query, page).await?;
            let has_more = contracts.has_more() && !contracts.items.is_empty();
            for contract in contracts.items {
                let parties = session.parties().find_by_contract_id(contract.id).await?;
                details.push(ContractDetail { contract, parties });
            }
            if !has_more {
                return Ok(details);
            }
            page = page.next();
        }
    }
}
