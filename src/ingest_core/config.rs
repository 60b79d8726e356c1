//! Runtime configuration from environment variables

use crate::ingest_core::failover::RetryPolicy;
use crate::ingest_core::rpc_client::{Commitment, MAX_SIGNATURE_PAGE};
use std::env;
use std::time::Duration;

pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Ordered endpoint pool, highest priority first
    pub rpc_urls: Vec<String>,
    pub target_mint: String,
    pub db_path: String,
    pub holder_count: usize,
    pub lookback_days: i64,
    pub page_size: usize,
    pub rpc_max_attempts: u32,
    pub rpc_backoff_base_ms: u64,
    pub rpc_backoff_max_ms: u64,
    pub rpc_timeout_ms: u64,
    pub endpoint_max_in_flight: usize,
    pub wallet_scan_delay_ms: u64,
    pub max_concurrent_wallets: usize,
    /// Stop a wallet scan at the first already-stored signature
    pub assume_monotonic_sync: bool,
    pub venue_substring_fallback: bool,
    pub commitment: Commitment,
    pub cycle_interval_secs: u64,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::MissingVariable(var) => write!(f, "Missing environment variable: {}", var),
            ConfigError::InvalidValue(msg) => write!(f, "Invalid configuration value: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|s| s.trim().parse().ok()).unwrap_or(default)
}

impl IngestConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `HOLDERFLOW_RPC_URLS` (comma-separated, default: mainnet-beta)
    /// - `HOLDERFLOW_TARGET_MINT` (required)
    /// - `HOLDERFLOW_DB_PATH` (default: data/holderflow.db)
    /// - `HOLDER_COUNT` (default: 30)
    /// - `LOOKBACK_DAYS` (default: 7)
    /// - `SIGNATURE_PAGE_SIZE` (default: 1000, max 1000)
    /// - `RPC_MAX_ATTEMPTS` / `RPC_BACKOFF_BASE_MS` / `RPC_BACKOFF_MAX_MS`
    /// - `RPC_REQUEST_TIMEOUT_MS` (default: 30000)
    /// - `ENDPOINT_MAX_IN_FLIGHT` (default: 4)
    /// - `WALLET_SCAN_DELAY_MS` (default: 100)
    /// - `MAX_CONCURRENT_WALLETS` (default: 1)
    /// - `ASSUME_MONOTONIC_SYNC` (default: true)
    /// - `VENUE_SUBSTRING_FALLBACK` (default: false)
    /// - `COMMITMENT_LEVEL` (default: confirmed)
    /// - `CYCLE_INTERVAL_SECS` (default: 900)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// `from_env`, with `overrides` taking precedence key by key
    pub fn from_env_with<F>(overrides: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup(|key| overrides(key).or_else(|| env::var(key).ok()))
    }

    /// Same as `from_env`, reading values through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rpc_urls: Vec<String> = lookup("HOLDERFLOW_RPC_URLS")
            .map(|s| {
                s.split(',')
                    .map(|url| url.trim().to_string())
                    .filter(|url| !url.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec![DEFAULT_RPC_URL.to_string()]);

        if rpc_urls.is_empty() {
            return Err(ConfigError::InvalidValue(
                "HOLDERFLOW_RPC_URLS must list at least one endpoint".to_string(),
            ));
        }

        if let Some(bad) = rpc_urls
            .iter()
            .find(|url| !url.starts_with("http://") && !url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidValue(format!(
                "RPC endpoint must start with http:// or https://, got {}",
                bad
            )));
        }

        let target_mint = lookup("HOLDERFLOW_TARGET_MINT")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingVariable("HOLDERFLOW_TARGET_MINT".to_string()))?;

        let commitment_str = lookup("COMMITMENT_LEVEL").unwrap_or_else(|| "confirmed".to_string());
        let commitment = match Commitment::parse(&commitment_str) {
            Some(level) => level,
            None => {
                log::warn!(
                    "Invalid COMMITMENT_LEVEL '{}', defaulting to confirmed",
                    commitment_str
                );
                Commitment::Confirmed
            }
        };

        let page_size: usize = parse_or(lookup("SIGNATURE_PAGE_SIZE"), MAX_SIGNATURE_PAGE);

        Ok(Self {
            rpc_urls,
            target_mint,
            db_path: lookup("HOLDERFLOW_DB_PATH").unwrap_or_else(|| "data/holderflow.db".to_string()),
            holder_count: parse_or(lookup("HOLDER_COUNT"), 30),
            lookback_days: parse_or(lookup("LOOKBACK_DAYS"), 7i64).max(0),
            page_size: page_size.clamp(1, MAX_SIGNATURE_PAGE),
            rpc_max_attempts: parse_or(lookup("RPC_MAX_ATTEMPTS"), 3),
            rpc_backoff_base_ms: parse_or(lookup("RPC_BACKOFF_BASE_MS"), 1_000),
            rpc_backoff_max_ms: parse_or(lookup("RPC_BACKOFF_MAX_MS"), 30_000),
            rpc_timeout_ms: parse_or(lookup("RPC_REQUEST_TIMEOUT_MS"), 30_000),
            endpoint_max_in_flight: parse_or(lookup("ENDPOINT_MAX_IN_FLIGHT"), 4),
            wallet_scan_delay_ms: parse_or(lookup("WALLET_SCAN_DELAY_MS"), 100),
            max_concurrent_wallets: parse_or::<usize>(lookup("MAX_CONCURRENT_WALLETS"), 1).max(1),
            assume_monotonic_sync: parse_or(lookup("ASSUME_MONOTONIC_SYNC"), true),
            venue_substring_fallback: parse_or(lookup("VENUE_SUBSTRING_FALLBACK"), false),
            commitment,
            cycle_interval_secs: parse_or(lookup("CYCLE_INTERVAL_SECS"), 900),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.rpc_max_attempts.max(1),
            base_delay: Duration::from_millis(self.rpc_backoff_base_ms),
            max_delay: Duration::from_millis(self.rpc_backoff_max_ms),
            max_in_flight: self.endpoint_max_in_flight.max(1),
        }
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    pub fn log_summary(&self) {
        log::info!("📊 Configuration:");
        log::info!("   ├─ Target mint: {}", self.target_mint);
        log::info!("   ├─ RPC endpoints: {}", self.rpc_urls.len());
        for url in &self.rpc_urls {
            log::info!("   │  └─ {}", url);
        }
        log::info!("   ├─ Database: {}", self.db_path);
        log::info!("   ├─ Holders: top {}", self.holder_count);
        log::info!("   ├─ Lookback: {} days (page size {})", self.lookback_days, self.page_size);
        log::info!(
            "   ├─ Retry: {} attempts, base {}ms, max {}ms",
            self.rpc_max_attempts,
            self.rpc_backoff_base_ms,
            self.rpc_backoff_max_ms
        );
        log::info!(
            "   ├─ Workers: {} (per-endpoint budget {}, scan delay {}ms)",
            self.max_concurrent_wallets,
            self.endpoint_max_in_flight,
            self.wallet_scan_delay_ms
        );
        log::info!("   ├─ Assume monotonic sync: {}", self.assume_monotonic_sync);
        log::info!("   ├─ Venue substring fallback: {}", self.venue_substring_fallback);
        log::info!("   └─ Cycle interval: {}s", self.cycle_interval_secs);
    }
}
