use async_trait::async_trait;
use contract_core_db::models::PartyModel;
use contract_core_db::repository::{PartyRepository, RepoError};
use sqlx::{postgres::PgRow, Row};
use std::error::Error;
use uuid::Uuid;

use crate::executor::Executor;
use crate::utils::TryFromRow;

pub struct PartyRepositoryImpl {
    pub executor: Executor,
}

impl PartyRepositoryImpl {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }
}

impl TryFromRow<PgRow> for PartyModel {
    fn try_from_row(row: &PgRow) -> Result<Self, Box<dyn Error + Send + Sync>> {
        Ok(PartyModel {
            id: row.try_get("id")?,
            contract_id: row.try_get("contract_id")?,
            user_id: row.try_get("user_id")?,
            party_role: row.try_get("party_role")?,
            ownership_percentage: row.try_get("ownership_percentage")?,
            signing_order: row.try_get("signing_order")?,
            has_signed: row.try_get("has_signed")?,
            signed_at: row.try_get("signed_at")?,
            signature_data: row.try_get("signature_data")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[async_trait]
impl PartyRepository for PartyRepositoryImpl {
    async fn find_by_contract_id(&self, contract_id: Uuid) -> Result<Vec<PartyModel>, RepoError> {
        Self::find_by_contract_id_impl(self, contract_id).await
    }

    async fn count_unsigned(&self, contract_id: Uuid) -> Result<i64, RepoError> {
        Self::count_unsigned_impl(self, contract_id).await
    }

    async fn delete_by_contract_id(&self, contract_id: Uuid) -> Result<usize, RepoError> {
        Self::delete_by_contract_id_impl(self, contract_id).await
    }
}
