//! Default document text used when a request carries no content of its own.

use chrono::{DateTime, Utc};
use contract_core_api::{CreateAmendmentRequest, PartyRequest};
use contract_core_db::models::{ContractModel, PartyModel};
use std::fmt::Write;

fn date(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d").to_string()
}

fn expiry_line(expiry: Option<DateTime<Utc>>) -> String {
    match expiry {
        Some(expiry) => format!("This agreement remains in force until {}.", date(expiry)),
        None => "This agreement remains in force until terminated by the parties.".to_string(),
    }
}

pub fn co_ownership(
    title: &str,
    contract_number: &str,
    effective_date: DateTime<Utc>,
    expiry_date: Option<DateTime<Utc>>,
    parties: &[PartyRequest],
) -> String {
    let mut text = format!(
        "{title}\nContract number: {contract_number}\n\n\
         The undersigned parties agree to share ownership of the vehicle in the \
         proportions listed below, effective {}.\n\n",
        date(effective_date)
    );
    for (index, party) in parties.iter().enumerate() {
        let _ = writeln!(
            text,
            "{}. {} ({}): {}%",
            index + 1,
            party.user_id,
            party.party_role,
            party.ownership_percentage
        );
    }
    let _ = write!(
        text,
        "\nCosts, usage and proceeds of sale are shared in the same proportions. {}",
        expiry_line(expiry_date)
    );
    text
}

pub fn amendment(
    original: &ContractModel,
    amendment_number: &str,
    request: &CreateAmendmentRequest,
) -> String {
    let mut text = format!(
        "Amendment {amendment_number} to contract {}\n\nReason: {}\n",
        original.contract_number, request.amendment_reason
    );
    if let Some(summary) = &request.changes_summary {
        let _ = writeln!(text, "Changes: {summary}");
    }
    let _ = write!(
        text,
        "\nAll other terms of {} remain unchanged.\n\n{}",
        original.contract_number, original.content
    );
    text
}

pub fn renewal(
    original: &ContractModel,
    renewal_number: &str,
    effective_date: DateTime<Utc>,
    expiry_date: DateTime<Utc>,
    parties: &[PartyModel],
) -> String {
    let mut text = format!(
        "Renewal {renewal_number} of contract {}\n\n\
         The parties renew the agreement for the period {} to {} on the terms below.\n\n",
        original.contract_number,
        date(effective_date),
        date(expiry_date)
    );
    for party in parties {
        let _ = writeln!(text, "- {} ({}): {}%", party.user_id, party.party_role, party.ownership_percentage);
    }
    let _ = write!(text, "\n{}", original.content);
    text
}
