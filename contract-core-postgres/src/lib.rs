pub mod executor;
pub mod job_lock;
pub mod postgres_repositories;
pub mod repository;
pub mod utils;

pub use executor::Executor;
pub use job_lock::PgAdvisoryJobLock;
pub use postgres_repositories::{PostgresSession, PostgresUnitOfWork};
pub use repository::db_init::{cleanup_database, init_database};

#[cfg(test)]
pub mod test_helper;
