use chrono::Utc;
use contract_core_api::PartyRole;
use contract_core_db::models::PartyModel;
use rust_decimal::Decimal;
use uuid::Uuid;

pub fn create_test_party(contract_id: Uuid, percentage: i64, signing_order: i32) -> PartyModel {
    PartyModel {
        id: Uuid::new_v4(),
        contract_id,
        user_id: Uuid::new_v4(),
        party_role: PartyRole::CoOwner,
        ownership_percentage: Decimal::new(percentage, 0),
        signing_order,
        has_signed: false,
        signed_at: None,
        signature_data: None,
        created_at: Utc::now(),
    }
}
