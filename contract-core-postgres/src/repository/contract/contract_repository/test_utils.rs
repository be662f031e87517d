use chrono::{Duration, Utc};
use contract_core_api::{ContractStatus, ContractType};
use contract_core_db::models::ContractModel;
use heapless::String as HeaplessString;
use uuid::Uuid;

pub fn create_test_contract(group_id: Uuid, contract_number: &str) -> ContractModel {
    let now = Utc::now();
    ContractModel {
        id: Uuid::new_v4(),
        contract_number: HeaplessString::try_from(contract_number).unwrap(),
        group_id,
        contract_type: ContractType::CoOwnership,
        title: "Vehicle co-ownership agreement".to_string(),
        content: "The parties agree to share ownership of the vehicle.".to_string(),
        status: ContractStatus::Draft,
        effective_date: now,
        expiry_date: Some(now + Duration::days(365)),
        auto_renew: false,
        parent_contract_id: None,
        activated_at: None,
        created_by: Uuid::new_v4(),
        created_at: now,
        updated_at: now,
        hash: 0,
    }
}

/// Contract number unique per test run.
pub fn unique_contract_number(prefix: &str) -> String {
    format!("{prefix}-{}", &Uuid::new_v4().simple().to_string()[..12])
}
