pub mod repo_impl;
#[cfg(test)]
pub mod test_utils;
pub mod create_batch;
pub mod load_batch;
pub mod update_batch;
pub mod delete_batch;
pub mod lock_by_id;
pub mod find_by_contract_number;
pub mod query;

pub use repo_impl::ContractRepositoryImpl;
