use contract_core_api::{ContractError, ContractResult};
use contract_core_db::models::{ContractModel, PartyModel};
use tracing::warn;
use uuid::Uuid;

/// Decides whether a requester may see or act on a contract.
///
/// Called by every operation that takes a requester; signing has its own
/// party check and does not go through the policy.
pub trait AccessPolicy: Send + Sync {
    fn check(
        &self,
        requester_id: Uuid,
        contract: &ContractModel,
        parties: &[PartyModel],
    ) -> ContractResult<()>;
}

/// Parties to the contract and its creator.
#[derive(Debug, Default, Clone, Copy)]
pub struct PartyMembershipPolicy;

impl AccessPolicy for PartyMembershipPolicy {
    fn check(
        &self,
        requester_id: Uuid,
        contract: &ContractModel,
        parties: &[PartyModel],
    ) -> ContractResult<()> {
        if contract.created_by == requester_id || parties.iter().any(|p| p.user_id == requester_id) {
            Ok(())
        } else {
            Err(ContractError::AccessDenied(format!(
                "user {requester_id} is not a party to contract {}",
                contract.id
            )))
        }
    }
}

/// Allows everyone. Non-party access is logged so it can be audited.
#[derive(Debug, Default, Clone, Copy)]
pub struct PermissivePolicy;

impl AccessPolicy for PermissivePolicy {
    fn check(
        &self,
        requester_id: Uuid,
        contract: &ContractModel,
        parties: &[PartyModel],
    ) -> ContractResult<()> {
        if contract.created_by != requester_id && !parties.iter().any(|p| p.user_id == requester_id) {
            warn!(
                contract_id = %contract.id,
                requester_id = %requester_id,
                "non-party access allowed by permissive policy"
            );
        }
        Ok(())
    }
}
