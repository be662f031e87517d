use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::access::{AccessPolicy, PartyMembershipPolicy, PermissivePolicy};

/// How requests from users who are not parties to a contract are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    /// Only parties and the creator may read or act on a contract
    Party,
    /// Everyone may read; kept for deployments that rely on the legacy behaviour
    Permissive,
}

impl AccessMode {
    pub fn policy(self) -> Arc<dyn AccessPolicy> {
        match self {
            AccessMode::Party => Arc::new(PartyMembershipPolicy),
            AccessMode::Permissive => Arc::new(PermissivePolicy),
        }
    }
}

impl std::str::FromStr for AccessMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "party" => Ok(AccessMode::Party),
            "permissive" => Ok(AccessMode::Permissive),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// TTL of single-contract cache entries (default: 300 s)
    pub contract_cache_ttl: Duration,
    /// TTL of listing cache entries (default: 120 s)
    pub listing_cache_ttl: Duration,
    pub cache_capacity: u64,
    /// How far ahead expiry reminders look (default: 30 days)
    pub expiry_window_days: i64,
    /// Length of an auto-renewed term (default: 12 months)
    pub renewal_term_months: u32,
    /// Delivery attempts per event before it is dropped (default: 3)
    pub publish_attempts: u32,
    pub publish_backoff: Duration,
    pub sweep_interval: Duration,
    pub access_mode: AccessMode,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            contract_cache_ttl: Duration::from_secs(300),
            listing_cache_ttl: Duration::from_secs(120),
            cache_capacity: 10_000,
            expiry_window_days: 30,
            renewal_term_months: 12,
            publish_attempts: 3,
            publish_backoff: Duration::from_millis(500),
            sweep_interval: Duration::from_secs(60 * 60),
            access_mode: AccessMode::Party,
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|val| val.parse::<T>().ok())
}

impl ServiceConfig {
    /// Defaults overridden by any well-formed `CONTRACT_*` variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(secs) = env_parse::<u64>("CONTRACT_CACHE_TTL_SECS") {
            config.contract_cache_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>("CONTRACT_LISTING_CACHE_TTL_SECS") {
            config.listing_cache_ttl = Duration::from_secs(secs);
        }
        if let Some(capacity) = env_parse::<u64>("CONTRACT_CACHE_CAPACITY") {
            config.cache_capacity = capacity;
        }
        if let Some(days) = env_parse::<i64>("CONTRACT_EXPIRY_WINDOW_DAYS") {
            config.expiry_window_days = days;
        }
        if let Some(months) = env_parse::<u32>("CONTRACT_RENEWAL_TERM_MONTHS") {
            config.renewal_term_months = months;
        }
        if let Some(attempts) = env_parse::<u32>("CONTRACT_PUBLISH_ATTEMPTS") {
            config.publish_attempts = attempts.max(1);
        }
        if let Some(ms) = env_parse::<u64>("CONTRACT_PUBLISH_BACKOFF_MS") {
            config.publish_backoff = Duration::from_millis(ms);
        }
        if let Some(secs) = env_parse::<u64>("SWEEP_INTERVAL_SECS") {
            config.sweep_interval = Duration::from_secs(secs.max(1));
        }
        if let Some(mode) = env_parse::<AccessMode>("CONTRACT_ACCESS_MODE") {
            config.access_mode = mode;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.contract_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.listing_cache_ttl, Duration::from_secs(120));
        assert_eq!(config.expiry_window_days, 30);
        assert_eq!(config.publish_attempts, 3);
        assert_eq!(config.access_mode, AccessMode::Party);
    }

    #[test]
    fn test_access_mode_parse() {
        assert_eq!("permissive".parse::<AccessMode>(), Ok(AccessMode::Permissive));
        assert!("open".parse::<AccessMode>().is_err());
    }
}
