//! Environment-driven runtime configuration.
//!
//! Every knob has a workable local default, so `registry-runtime` starts
//! with no environment at all and talks to the in-memory ledger adapter.

use std::time::Duration;

/// Configuration for the registry process.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Signing identity all ledger submissions originate from.
    pub identity: String,
    /// Registry management contract address.
    pub management_contract: String,
    /// Network id DNS binding records must name.
    pub network_id: u64,
    /// Gas price floor used when the price endpoint is unreachable.
    pub gas_floor_price: u128,
    /// Gas price cache refresh interval.
    pub gas_refresh_interval: Duration,
    /// Upper bound on one transaction confirmation wait.
    pub confirmation_timeout: Duration,
    /// Executions allowed per job.
    pub max_attempts: u32,
    /// Delay before a transiently failed job is requeued.
    pub retry_backoff: Duration,
    /// Lease duration before an unacked job is redelivered.
    pub visibility_timeout: Duration,
    /// Upper bound on one DID or DNS resolution.
    pub resolution_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            identity: "0x00000000000000000000000000000000000000aa".into(),
            management_contract: "0x00000000000000000000000000000000000000cc".into(),
            network_id: 51,
            gas_floor_price: vl_01_ledger_client::domain::gas::DEFAULT_FLOOR_PRICE,
            gas_refresh_interval: vl_01_ledger_client::domain::gas::DEFAULT_REFRESH_INTERVAL,
            confirmation_timeout: Duration::from_secs(5 * 60),
            max_attempts: 3,
            retry_backoff: Duration::from_secs(5),
            visibility_timeout: Duration::from_secs(60),
            resolution_timeout: Duration::from_secs(30),
        }
    }
}

impl RuntimeConfig {
    /// Build from `VL_*` environment variables, falling back to defaults
    /// for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            identity: env_string("VL_IDENTITY").unwrap_or(defaults.identity),
            management_contract: env_string("VL_MANAGEMENT_CONTRACT")
                .unwrap_or(defaults.management_contract),
            network_id: env_parse("VL_NETWORK_ID").unwrap_or(defaults.network_id),
            gas_floor_price: env_parse("VL_GAS_FLOOR_PRICE").unwrap_or(defaults.gas_floor_price),
            gas_refresh_interval: env_secs("VL_GAS_REFRESH_SECS")
                .unwrap_or(defaults.gas_refresh_interval),
            confirmation_timeout: env_secs("VL_CONFIRMATION_TIMEOUT_SECS")
                .unwrap_or(defaults.confirmation_timeout),
            max_attempts: env_parse("VL_JOB_MAX_ATTEMPTS").unwrap_or(defaults.max_attempts),
            retry_backoff: env_secs("VL_JOB_BACKOFF_SECS").unwrap_or(defaults.retry_backoff),
            visibility_timeout: env_secs("VL_JOB_VISIBILITY_SECS")
                .unwrap_or(defaults.visibility_timeout),
            resolution_timeout: env_secs("VL_RESOLUTION_TIMEOUT_SECS")
                .unwrap_or(defaults.resolution_timeout),
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}

fn env_secs(key: &str) -> Option<Duration> {
    env_parse::<u64>(key).map(Duration::from_secs)
}
