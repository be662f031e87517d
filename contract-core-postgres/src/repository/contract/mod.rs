pub mod amendment_repository;
pub mod contract_repository;
pub mod factory;
pub mod party_repository;
pub mod signature_log_repository;

pub use amendment_repository::AmendmentRepositoryImpl;
pub use contract_repository::ContractRepositoryImpl;
pub use factory::{ContractRepoFactory, ContractRepositories};
pub use party_repository::PartyRepositoryImpl;
pub use signature_log_repository::SignatureLogRepositoryImpl;
