pub mod create_batch;
pub mod load_batch;
pub mod update_batch;
pub mod delete_batch;
pub mod pagination;
pub mod contract_repository;
pub mod party_repository;
pub mod signature_log_repository;
pub mod amendment_repository;
pub mod unit_of_work;
pub mod job_lock;

// Re-exports
pub use create_batch::*;
pub use load_batch::*;
pub use update_batch::*;
pub use delete_batch::*;
pub use pagination::*;
pub use contract_repository::*;
pub use party_repository::*;
pub use signature_log_repository::*;
pub use amendment_repository::*;
pub use unit_of_work::*;
pub use job_lock::*;

/// Error type shared by all repository operations.
pub type RepoError = Box<dyn std::error::Error + Send + Sync>;
