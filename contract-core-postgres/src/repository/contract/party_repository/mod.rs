pub mod repo_impl;
#[cfg(test)]
pub mod test_utils;
pub mod create_batch;
pub mod update_batch;
pub mod find_by_contract_id;
pub mod count_unsigned;
pub mod delete_by_contract_id;

pub use repo_impl::PartyRepositoryImpl;
