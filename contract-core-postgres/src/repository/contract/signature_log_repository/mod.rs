pub mod repo_impl;
pub mod create_batch;
pub mod find_by_contract_id;
pub mod find_by_signature;

pub use repo_impl::SignatureLogRepositoryImpl;
