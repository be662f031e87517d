use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{ContractError, ContractResult};

/// Lifecycle status of a contract.
///
/// Forward edges only:
/// `Draft -> PendingSignatures -> Active -> {Expired, Terminated}`,
/// `Draft | PendingSignatures -> Terminated`, and for amendments only `Active -> Executed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "contract_status", rename_all = "snake_case"))]
pub enum ContractStatus {
    Draft,
    PendingSignatures,
    Active,
    Expired,
    Terminated,
    Executed,
}

impl ContractStatus {
    pub fn can_transition_to(self, contract_type: ContractType, next: ContractStatus) -> bool {
        use ContractStatus::*;
        if next == Executed && contract_type != ContractType::Amendment {
            return false;
        }
        matches!(
            (self, next),
            (Draft, PendingSignatures)
                | (PendingSignatures, Active)
                | (Active, Expired)
                | (Active, Terminated)
                | (Draft, Terminated)
                | (PendingSignatures, Terminated)
                | (Active, Executed)
        )
    }

    /// Returns `next` if the edge exists for `contract_type`, `InvalidState` otherwise.
    pub fn transition(self, contract_type: ContractType, next: ContractStatus) -> ContractResult<ContractStatus> {
        if self.can_transition_to(contract_type, next) {
            Ok(next)
        } else {
            Err(ContractError::InvalidState(format!(
                "cannot move {contract_type} contract from {self} to {next}"
            )))
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ContractStatus::Expired | ContractStatus::Terminated | ContractStatus::Executed
        )
    }
}

impl std::fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContractStatus::Draft => write!(f, "draft"),
            ContractStatus::PendingSignatures => write!(f, "pending_signatures"),
            ContractStatus::Active => write!(f, "active"),
            ContractStatus::Expired => write!(f, "expired"),
            ContractStatus::Terminated => write!(f, "terminated"),
            ContractStatus::Executed => write!(f, "executed"),
        }
    }
}

impl FromStr for ContractStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ContractStatus::Draft),
            "pending_signatures" => Ok(ContractStatus::PendingSignatures),
            "active" => Ok(ContractStatus::Active),
            "expired" => Ok(ContractStatus::Expired),
            "terminated" => Ok(ContractStatus::Terminated),
            "executed" => Ok(ContractStatus::Executed),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "contract_type", rename_all = "snake_case"))]
pub enum ContractType {
    CoOwnership,
    Amendment,
    Termination,
    Renewal,
}

impl std::fmt::Display for ContractType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContractType::CoOwnership => write!(f, "co_ownership"),
            ContractType::Amendment => write!(f, "amendment"),
            ContractType::Termination => write!(f, "termination"),
            ContractType::Renewal => write!(f, "renewal"),
        }
    }
}

impl FromStr for ContractType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "co_ownership" => Ok(ContractType::CoOwnership),
            "amendment" => Ok(ContractType::Amendment),
            "termination" => Ok(ContractType::Termination),
            "renewal" => Ok(ContractType::Renewal),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "party_role", rename_all = "snake_case"))]
pub enum PartyRole {
    Owner,
    CoOwner,
    Witness,
    LegalRepresentative,
}

impl std::fmt::Display for PartyRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartyRole::Owner => write!(f, "owner"),
            PartyRole::CoOwner => write!(f, "co_owner"),
            PartyRole::Witness => write!(f, "witness"),
            PartyRole::LegalRepresentative => write!(f, "legal_representative"),
        }
    }
}

impl FromStr for PartyRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "owner" => Ok(PartyRole::Owner),
            "co_owner" => Ok(PartyRole::CoOwner),
            "witness" => Ok(PartyRole::Witness),
            "legal_representative" => Ok(PartyRole::LegalRepresentative),
            _ => Err(()),
        }
    }
}

/// Kind of signature reminder sent to unsigned parties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderType {
    Initial,
    FollowUp,
    Final,
}

impl std::fmt::Display for ReminderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReminderType::Initial => write!(f, "initial"),
            ReminderType::FollowUp => write!(f, "follow_up"),
            ReminderType::Final => write!(f, "final"),
        }
    }
}
