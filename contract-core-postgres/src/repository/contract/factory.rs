use std::sync::Arc;

use super::{
    AmendmentRepositoryImpl, ContractRepositoryImpl, PartyRepositoryImpl,
    SignatureLogRepositoryImpl,
};
use crate::executor::Executor;

/// Factory for the contract module repositories
///
/// Every repository built from one executor shares its transaction, so
/// writes across contracts, parties, signature logs and amendment links
/// commit or roll back together.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContractRepoFactory;

impl ContractRepoFactory {
    pub fn new() -> Self {
        Self
    }

    pub fn build_contract_repo(&self, executor: &Executor) -> Arc<ContractRepositoryImpl> {
        Arc::new(ContractRepositoryImpl::new(executor.clone()))
    }

    pub fn build_party_repo(&self, executor: &Executor) -> Arc<PartyRepositoryImpl> {
        Arc::new(PartyRepositoryImpl::new(executor.clone()))
    }

    pub fn build_signature_log_repo(&self, executor: &Executor) -> Arc<SignatureLogRepositoryImpl> {
        Arc::new(SignatureLogRepositoryImpl::new(executor.clone()))
    }

    pub fn build_amendment_repo(&self, executor: &Executor) -> Arc<AmendmentRepositoryImpl> {
        Arc::new(AmendmentRepositoryImpl::new(executor.clone()))
    }

    /// Build all contract repositories on the given executor
    pub fn build_all_repos(&self, executor: &Executor) -> ContractRepositories {
        ContractRepositories {
            contract_repository: self.build_contract_repo(executor),
            party_repository: self.build_party_repo(executor),
            signature_log_repository: self.build_signature_log_repo(executor),
            amendment_repository: self.build_amendment_repo(executor),
        }
    }
}

/// Container for all contract module repositories
pub struct ContractRepositories {
    pub contract_repository: Arc<ContractRepositoryImpl>,
    pub party_repository: Arc<PartyRepositoryImpl>,
    pub signature_log_repository: Arc<SignatureLogRepositoryImpl>,
    pub amendment_repository: Arc<AmendmentRepositoryImpl>,
}
