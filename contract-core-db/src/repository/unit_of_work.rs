use async_trait::async_trait;

use super::{AmendmentRepository, ContractRepository, PartyRepository, RepoError, SignatureLogRepository};

/// Source of transactional sessions.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWorkSession>, RepoError>;
}

/// One transaction and the repositories bound to it.
///
/// Every write made through the repositories becomes visible together on
/// `commit`. Dropping the session without committing rolls it back.
#[async_trait]
pub trait UnitOfWorkSession: Send + Sync {
    fn contracts(&self) -> &dyn ContractRepository;
    fn parties(&self) -> &dyn PartyRepository;
    fn signature_logs(&self) -> &dyn SignatureLogRepository;
    fn amendments(&self) -> &dyn AmendmentRepository;

    async fn commit(self: Box<Self>) -> Result<(), RepoError>;
    async fn rollback(self: Box<Self>) -> Result<(), RepoError>;
}
