use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::common_enums::{ContractStatus, ContractType, PartyRole};
use crate::error::{ContractError, ContractResult};

/// Allowed deviation of the ownership sum from 100%.
pub const OWNERSHIP_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

fn validate_percentage(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() || *value > Decimal::ONE_HUNDRED {
        return Err(ValidationError::new("ownership_percentage_out_of_range"));
    }
    if value.scale() > 2 && value.round_dp(2) != *value {
        return Err(ValidationError::new("ownership_percentage_precision"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PartyRequest {
    pub user_id: Uuid,
    pub party_role: PartyRole,
    #[validate(custom(function = "validate_percentage"))]
    pub ownership_percentage: Decimal,
    /// Informational only; defaults to the party's position in the request.
    #[validate(range(min = 1))]
    pub signing_order: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateContractRequest {
    pub group_id: Uuid,
    pub contract_type: ContractType,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    /// Rendered legal text; a templated document is generated when absent.
    pub content: Option<String>,
    pub effective_date: DateTime<Utc>,
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub auto_renew: bool,
    pub parent_contract_id: Option<Uuid>,
    #[validate(length(min = 1), nested)]
    pub parties: Vec<PartyRequest>,
}

impl CreateContractRequest {
    /// Field validation followed by the cross-field contract invariants.
    pub fn check(&self) -> ContractResult<()> {
        if self.parties.is_empty() {
            return Err(ContractError::ValidationError(
                "a contract requires at least one party".to_string(),
            ));
        }
        self.validate()?;

        let mut seen = HashSet::with_capacity(self.parties.len());
        for party in &self.parties {
            if !seen.insert(party.user_id) {
                return Err(ContractError::ValidationError(format!(
                    "user {} appears more than once in the party list",
                    party.user_id
                )));
            }
        }

        if self.contract_type == ContractType::CoOwnership {
            let total: Decimal = self.parties.iter().map(|p| p.ownership_percentage).sum();
            if (total - Decimal::ONE_HUNDRED).abs() > OWNERSHIP_TOLERANCE {
                return Err(ContractError::ValidationError(format!(
                    "ownership percentages must sum to 100, got {total}"
                )));
            }
        }

        check_date_order(self.effective_date, self.expiry_date)
    }
}

/// Whitelisted mutable fields of a draft contract.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateContractRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub content: Option<String>,
    pub effective_date: Option<DateTime<Utc>>,
    pub expiry_date: Option<DateTime<Utc>>,
    pub auto_renew: Option<bool>,
}

impl UpdateContractRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.effective_date.is_none()
            && self.expiry_date.is_none()
            && self.auto_renew.is_none()
    }

    pub fn check(&self) -> ContractResult<()> {
        if self.is_empty() {
            return Err(ContractError::ValidationError(
                "no updatable fields supplied".to_string(),
            ));
        }
        self.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAmendmentRequest {
    #[validate(length(min = 1, max = 500))]
    pub amendment_reason: String,
    #[validate(length(max = 2000))]
    pub changes_summary: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub content: Option<String>,
    pub effective_date: Option<DateTime<Utc>>,
}

/// Listing filter. Also the structured part of listing cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContractFilter {
    pub status: Option<ContractStatus>,
    pub contract_type: Option<ContractType>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for ContractFilter {
    fn default() -> Self {
        Self {
            status: None,
            contract_type: None,
            limit: 20,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ClientInfo {
    #[validate(length(max = 45))]
    pub ip_address: Option<String>,
    #[validate(length(max = 512))]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignaturePayload {
    #[validate(length(min = 1, max = 1024))]
    pub signature_data: String,
}

pub fn check_date_order(
    effective_date: DateTime<Utc>,
    expiry_date: Option<DateTime<Utc>>,
) -> ContractResult<()> {
    match expiry_date {
        Some(expiry) if expiry <= effective_date => Err(ContractError::ValidationError(
            "expiry_date must be after effective_date".to_string(),
        )),
        _ => Ok(()),
    }
}
