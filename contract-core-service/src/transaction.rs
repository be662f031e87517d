use contract_core_api::ContractResult;
use contract_core_db::repository::UnitOfWorkSession;
use tracing::warn;

/// Commits on `Ok`, rolls back on `Err`. A failed commit turns the result
/// into a `PersistenceError`.
pub(crate) async fn finish<T>(
    session: Box<dyn UnitOfWorkSession>,
    result: ContractResult<T>,
) -> ContractResult<T> {
    match result {
        Ok(value) => {
            session.commit().await?;
            Ok(value)
        }
        Err(err) => {
            discard(session).await;
            Err(err)
        }
    }
}

/// Ends a session without keeping any of its writes.
pub(crate) async fn discard(session: Box<dyn UnitOfWorkSession>) {
    if let Err(e) = session.rollback().await {
        warn!(error = %e, "rollback failed");
    }
}
