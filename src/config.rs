//! Collector configuration.
//!
//! Layered in order: built-in defaults, an optional JSON file, `MCS_*`
//! environment variables, then CLI flags (applied by the binary).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Runtime knobs for fetching and the worker pool. The lookup tables are
/// compiled in and are not configurable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Minimum spacing between any two document fetches.
    pub min_request_interval_ms: u64,
    /// Fetch attempts per address, counting the first.
    pub max_attempts: u32,
    /// Backoff after failed attempt `n` (0-based) is `base * 2^n`.
    pub backoff_base_ms: u64,
    pub workers: usize,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            min_request_interval_ms: 2000,
            max_attempts: 3,
            backoff_base_ms: 1000,
            workers: 4,
            fetch_timeout_secs: 30,
            user_agent: format!("mcs-extract/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl CollectorConfig {
    /// Load a JSON config file. Missing fields keep their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {:?}", path))?;
        let config: CollectorConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {:?}", path))?;
        info!("Loaded collector config from {:?}", path);
        Ok(config)
    }

    /// Defaults, then `path` if given, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config.sanitized())
    }

    /// Override fields from `MCS_*` variables. Unparseable values are
    /// logged and ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parse<T: std::str::FromStr>(key: &str, raw: Option<String>, slot: &mut T) {
            if let Some(raw) = raw {
                match raw.trim().parse() {
                    Ok(value) => *slot = value,
                    Err(_) => warn!("Ignoring {}={:?}: not a valid number", key, raw),
                }
            }
        }

        parse(
            "MCS_MIN_REQUEST_INTERVAL_MS",
            lookup("MCS_MIN_REQUEST_INTERVAL_MS"),
            &mut self.min_request_interval_ms,
        );
        parse("MCS_MAX_ATTEMPTS", lookup("MCS_MAX_ATTEMPTS"), &mut self.max_attempts);
        parse(
            "MCS_BACKOFF_BASE_MS",
            lookup("MCS_BACKOFF_BASE_MS"),
            &mut self.backoff_base_ms,
        );
        parse("MCS_WORKERS", lookup("MCS_WORKERS"), &mut self.workers);
        parse(
            "MCS_FETCH_TIMEOUT_SECS",
            lookup("MCS_FETCH_TIMEOUT_SECS"),
            &mut self.fetch_timeout_secs,
        );
        if let Some(agent) = lookup("MCS_USER_AGENT").filter(|a| !a.trim().is_empty()) {
            self.user_agent = agent;
        }
    }

    /// Clamp values that would stall the collector.
    pub fn sanitized(mut self) -> Self {
        if self.max_attempts == 0 {
            warn!("max_attempts must be at least 1, using 1");
            self.max_attempts = 1;
        }
        if self.workers == 0 {
            warn!("workers must be at least 1, using 1");
            self.workers = 1;
        }
        self
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Wait before retry number `attempt + 1`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(factor))
    }
}
