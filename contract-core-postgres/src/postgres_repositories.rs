use async_trait::async_trait;
use contract_core_db::repository::{
    AmendmentRepository, ContractRepository, PartyRepository, RepoError,
    SignatureLogRepository, UnitOfWork, UnitOfWorkSession,
};
use sqlx::PgPool;
use std::sync::Arc;

use crate::executor::Executor;
use crate::repository::contract::{ContractRepoFactory, ContractRepositories};

/// Opens one PostgreSQL transaction per session.
#[derive(Clone)]
pub struct PostgresUnitOfWork {
    pool: Arc<PgPool>,
    factory: ContractRepoFactory,
}

impl PostgresUnitOfWork {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self {
            pool,
            factory: ContractRepoFactory::new(),
        }
    }

    pub fn pool(&self) -> &Arc<PgPool> {
        &self.pool
    }

    /// Begin a transaction and build all repositories on it
    pub async fn begin_session(&self) -> Result<PostgresSession, sqlx::Error> {
        let tx = self.pool.begin().await?;
        let executor = Executor::new(tx);
        let repos = self.factory.build_all_repos(&executor);
        Ok(PostgresSession { executor, repos })
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn begin(&self) -> Result<Box<dyn UnitOfWorkSession>, RepoError> {
        Ok(Box::new(self.begin_session().await?))
    }
}

/// Repositories bound to one open transaction.
///
/// Dropping the session without `commit` drops the transaction, which rolls it back.
pub struct PostgresSession {
    executor: Executor,
    repos: ContractRepositories,
}

impl PostgresSession {
    pub fn repos(&self) -> &ContractRepositories {
        &self.repos
    }
}

#[async_trait]
impl UnitOfWorkSession for PostgresSession {
    fn contracts(&self) -> &dyn ContractRepository {
        self.repos.contract_repository.as_ref()
    }

    fn parties(&self) -> &dyn PartyRepository {
        self.repos.party_repository.as_ref()
    }

    fn signature_logs(&self) -> &dyn SignatureLogRepository {
        self.repos.signature_log_repository.as_ref()
    }

    fn amendments(&self) -> &dyn AmendmentRepository {
        self.repos.amendment_repository.as_ref()
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        self.executor.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepoError> {
        self.executor.rollback().await?;
        Ok(())
    }
}
