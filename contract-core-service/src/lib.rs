pub mod access;
pub mod amendment_workflow;
pub mod cache;
pub mod config;
pub mod events;
pub mod expiry_scheduler;
pub mod job_lock;
pub mod lifecycle;
pub mod locks;
pub mod memory_store;
pub mod numbering;
pub mod signature;
pub mod signature_workflow;
pub mod templates;
mod transaction;

#[cfg(test)]
pub mod test_helper;

pub use access::*;
pub use amendment_workflow::*;
pub use cache::*;
pub use config::*;
pub use events::*;
pub use expiry_scheduler::*;
pub use job_lock::*;
pub use lifecycle::*;
pub use locks::*;
pub use memory_store::*;
pub use numbering::*;
pub use signature::*;
pub use signature_workflow::*;

use contract_core_api::{EventPublisher, SignatureValidator};
use contract_core_db::repository::{JobLock, UnitOfWork};
use std::sync::Arc;

/// The four workflow components wired over one store, cache and publisher.
#[derive(Clone)]
pub struct ContractServices {
    pub lifecycle: Arc<ContractLifecycleEngine>,
    pub signatures: Arc<SignatureWorkflow>,
    pub amendments: Arc<AmendmentWorkflow>,
    pub scheduler: Arc<ExpiryScheduler>,
}

impl ContractServices {
    /// Uses a moka cache sized from `config`, random contract numbers and the
    /// access policy selected by `config.access_mode`.
    pub fn new(
        store: Arc<dyn UnitOfWork>,
        events: Arc<dyn EventPublisher>,
        validator: Arc<dyn SignatureValidator>,
        job_lock: Arc<dyn JobLock>,
        config: ServiceConfig,
    ) -> Self {
        let cache = Arc::new(MokaContractCache::new(config.cache_capacity));
        let access = config.access_mode.policy();
        let lifecycle = Arc::new(ContractLifecycleEngine::new(
            store,
            cache,
            events,
            Arc::new(RandomNumberGenerator),
            access,
            config,
        ));
        let signatures = Arc::new(SignatureWorkflow::new(lifecycle.clone(), validator));
        let amendments = Arc::new(AmendmentWorkflow::new(lifecycle.clone()));
        let scheduler = Arc::new(ExpiryScheduler::new(
            lifecycle.clone(),
            amendments.clone(),
            job_lock,
        ));

        Self {
            lifecycle,
            signatures,
            amendments,
            scheduler,
        }
    }
}
