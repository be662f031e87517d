use async_trait::async_trait;
use chrono::Utc;
use contract_core_api::{ContractError, ContractResult, NumberGenerator, NumberKind};
use contract_core_db::repository::UnitOfWorkSession;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::debug;

const MAX_SEED_LEN: usize = 40;
const MAX_ALLOCATION_ATTEMPTS: usize = 5;

/// Random-suffix numbers:
/// `CC-20260116-7QX2LM`, `CC-20260116-7QX2LM-AMD-K3F9`, `CC-20260116-7QX2LM-REN-Q81Z`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomNumberGenerator;

fn random_suffix(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect()
}

fn derived(seed: Option<&str>, tag: &str) -> ContractResult<String> {
    let seed = seed.ok_or_else(|| {
        ContractError::ValidationError(format!("{tag} numbers are derived from a parent number"))
    })?;
    let seed = seed
        .char_indices()
        .nth(MAX_SEED_LEN)
        .map_or(seed, |(end, _)| &seed[..end]);
    Ok(format!("{seed}-{tag}-{}", random_suffix(4)))
}

#[async_trait]
impl NumberGenerator for RandomNumberGenerator {
    async fn next(&self, kind: NumberKind, seed: Option<&str>) -> ContractResult<String> {
        match kind {
            NumberKind::Contract => Ok(format!(
                "CC-{}-{}",
                Utc::now().format("%Y%m%d"),
                random_suffix(6)
            )),
            NumberKind::Amendment => derived(seed, "AMD"),
            NumberKind::Renewal => derived(seed, "REN"),
        }
    }
}

/// Draws numbers until one is unused in the session's view of the store.
pub(crate) async fn allocate_number(
    generator: &dyn NumberGenerator,
    session: &dyn UnitOfWorkSession,
    kind: NumberKind,
    seed: Option<&str>,
) -> ContractResult<String> {
    for _ in 0..MAX_ALLOCATION_ATTEMPTS {
        let candidate = generator.next(kind, seed).await?;
        if session.contracts().find_by_contract_number(&candidate).await?.is_none() {
            return Ok(candidate);
        }
        debug!(contract_number = %candidate, "generated number already taken");
    }
    Err(ContractError::PersistenceError(format!(
        "no unused {kind:?} number after {MAX_ALLOCATION_ATTEMPTS} attempts"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_contract_number_format() {
        let number = RandomNumberGenerator.next(NumberKind::Contract, None).await.unwrap();
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "CC");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[tokio::test]
    async fn test_amendment_number_derives_from_parent() {
        let number = RandomNumberGenerator
            .next(NumberKind::Amendment, Some("CC-20260116-ABC123"))
            .await
            .unwrap();
        assert!(number.starts_with("CC-20260116-ABC123-AMD-"));
        assert_eq!(number.len(), "CC-20260116-ABC123-AMD-".len() + 4);

        let err = RandomNumberGenerator.next(NumberKind::Renewal, None).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_derived_numbers_stay_within_column_width() {
        let seed = "X".repeat(64);
        let number = RandomNumberGenerator
            .next(NumberKind::Renewal, Some(&seed))
            .await
            .unwrap();
        assert!(number.len() <= 64);
    }
}
