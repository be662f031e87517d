use async_trait::async_trait;
use contract_core_db::models::AmendmentModel;
use contract_core_db::repository::{AmendmentRepository, RepoError};
use sqlx::{postgres::PgRow, Row};
use std::error::Error;
use uuid::Uuid;

use crate::executor::Executor;
use crate::utils::TryFromRow;

pub struct AmendmentRepositoryImpl {
    pub executor: Executor,
}

impl AmendmentRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }
}

impl TryFromRow<PgRow> for AmendmentModel {
    fn try_from_row(row: &PgRow) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(AmendmentModel {
            id: row.try_get("id")?,
            original_contract_id: row.try_get("original_contract_id")?,
            amendment_contract_id: row.try_get("amendment_contract_id")?,
            amendment_reason: row.try_get("amendment_reason")?,
            changes_summary: row.try_get("changes_summary")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl AmendmentRepository for AmendmentRepositoryImpl {
    async fn find_by_original_contract_id(
        &self,
        original_contract_id: Uuid,
    ) -> Result<Vec<AmendmentModel>, RepoError> {
        Self::find_by_original_contract_id_impl(self, original_contract_id).await
    }

    async fn find_by_amendment_contract_id(
        &self,
        amendment_contract_id: Uuid,
    ) -> Result<Option<AmendmentModel>, RepoError> {
        Self::find_by_amendment_contract_id_impl(self, amendment_contract_id).await
    }
}
