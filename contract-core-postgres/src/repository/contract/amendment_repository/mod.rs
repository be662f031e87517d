pub mod repo_impl;
pub mod create_batch;
pub mod find_by_original_contract_id;
pub mod find_by_amendment_contract_id;

pub use repo_impl::AmendmentRepositoryImpl;
