use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::common_enums::{ContractType, ReminderType};

/// Whether a `ContractAmended` event announces a proposal or an approval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmendmentStage {
    Proposed,
    Approved,
}

/// Lifecycle events handed to the notification/automation consumers.
///
/// Serializes to a flat JSON map whose `event_type` field carries the event name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum ContractEvent {
    ContractCreated {
        contract_id: Uuid,
        contract_number: String,
        group_id: Uuid,
        contract_type: ContractType,
        created_by: Uuid,
        party_user_ids: Vec<Uuid>,
    },
    ContractSentForSignature {
        contract_id: Uuid,
        contract_number: String,
        title: String,
        sent_by: Uuid,
        party_user_ids: Vec<Uuid>,
    },
    ContractSigned {
        contract_id: Uuid,
        user_id: Uuid,
        signed_at: DateTime<Utc>,
        all_signed: bool,
    },
    ContractActivated {
        contract_id: Uuid,
        contract_number: String,
        activated_at: DateTime<Utc>,
        party_user_ids: Vec<Uuid>,
    },
    ContractAmended {
        original_contract_id: Uuid,
        amendment_contract_id: Uuid,
        amendment_number: String,
        stage: AmendmentStage,
        amendment_reason: String,
        actor_id: Uuid,
    },
    ContractExpired {
        contract_id: Uuid,
        contract_number: String,
        expired_at: DateTime<Utc>,
        party_user_ids: Vec<Uuid>,
    },
    ContractTerminated {
        contract_id: Uuid,
        contract_number: String,
        terminated_by: Uuid,
        reason: String,
    },
    ContractRenewalDrafted {
        original_contract_id: Uuid,
        renewal_contract_id: Uuid,
        renewal_number: String,
        effective_date: DateTime<Utc>,
        expiry_date: DateTime<Utc>,
    },
    SignatureReminderSent {
        contract_id: Uuid,
        user_id: Uuid,
        reminder_type: ReminderType,
        requested_by: Uuid,
    },
    ContractExpiryReminderSent {
        contract_id: Uuid,
        contract_number: String,
        expiry_date: DateTime<Utc>,
        days_until_expiry: i64,
        party_user_ids: Vec<Uuid>,
    },
}

impl ContractEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            ContractEvent::ContractCreated { .. } => "ContractCreated",
            ContractEvent::ContractSentForSignature { .. } => "ContractSentForSignature",
            ContractEvent::ContractSigned { .. } => "ContractSigned",
            ContractEvent::ContractActivated { .. } => "ContractActivated",
            ContractEvent::ContractAmended { .. } => "ContractAmended",
            ContractEvent::ContractExpired { .. } => "ContractExpired",
            ContractEvent::ContractTerminated { .. } => "ContractTerminated",
            ContractEvent::ContractRenewalDrafted { .. } => "ContractRenewalDrafted",
            ContractEvent::SignatureReminderSent { .. } => "SignatureReminderSent",
            ContractEvent::ContractExpiryReminderSent { .. } => "ContractExpiryReminderSent",
        }
    }

    /// The contract the event is primarily about.
    pub fn contract_id(&self) -> Uuid {
        match self {
            ContractEvent::ContractCreated { contract_id, .. }
            | ContractEvent::ContractSentForSignature { contract_id, .. }
            | ContractEvent::ContractSigned { contract_id, .. }
            | ContractEvent::ContractActivated { contract_id, .. }
            | ContractEvent::ContractExpired { contract_id, .. }
            | ContractEvent::ContractTerminated { contract_id, .. }
            | ContractEvent::SignatureReminderSent { contract_id, .. }
            | ContractEvent::ContractExpiryReminderSent { contract_id, .. } => *contract_id,
            ContractEvent::ContractAmended {
                amendment_contract_id,
                ..
            } => *amendment_contract_id,
            ContractEvent::ContractRenewalDrafted {
                renewal_contract_id,
                ..
            } => *renewal_contract_id,
        }
    }

    /// Flat JSON payload, including the `event_type` discriminator.
    pub fn payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({ "event_type": self.event_type(), "contract_id": self.contract_id() })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_is_flat_and_tagged() {
        let contract_id = Uuid::new_v4();
        let event = ContractEvent::ContractSigned {
            contract_id,
            user_id: Uuid::new_v4(),
            signed_at: Utc::now(),
            all_signed: true,
        };

        let payload = event.payload();
        assert_eq!(payload["event_type"], "ContractSigned");
        assert_eq!(payload["contract_id"], contract_id.to_string());
        assert_eq!(payload["all_signed"], true);
        assert_eq!(event.contract_id(), contract_id);
    }

    #[test]
    fn test_reminder_payload_carries_reminder_type() {
        let event = ContractEvent::SignatureReminderSent {
            contract_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            reminder_type: ReminderType::FollowUp,
            requested_by: Uuid::new_v4(),
        };
        assert_eq!(event.payload()["reminder_type"], "follow_up");
        assert_eq!(event.event_type(), "SignatureReminderSent");
    }
}
