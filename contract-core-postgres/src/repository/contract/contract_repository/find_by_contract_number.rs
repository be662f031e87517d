use contract_core_db::models::ContractModel;
use std::error::Error;

use super::repo_impl::ContractRepositoryImpl;
use crate::utils::TryFromRow;

impl ContractRepositoryImpl {
    pub(super) async fn find_by_contract_number_impl(
        repo: &ContractRepositoryImpl,
        contract_number: &str,
    ) -> Result<Option<ContractModel>, Box<dyn Error + Send + Sync>> {
        let row = {
            let mut tx = repo.executor.tx.lock().await;
            let transaction = tx.as_mut().ok_or("Transaction has been consumed")?;
            sqlx::query("SELECT * FROM contract WHERE contract_number = $1")
                .bind(contract_number)
                .fetch_optional(&mut **transaction)
                .await?
        };

        row.map(|row| ContractModel::try_from_row(&row)).transpose()
    }
}
