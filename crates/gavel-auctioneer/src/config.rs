//! Auctioneer configuration.
//!
//! Loadable from a TOML file. Duration fields accept `"500ms"`, `"30s"`,
//! `"5m"`, or a bare number of seconds.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use thiserror::Error;

pub const DEFAULT_MAX_CONCURRENT: usize = 20;
pub const DEFAULT_MAX_ROUNDS: u32 = 40;
pub const DEFAULT_LOCK_INTERVAL: Duration = Duration::from_secs(30);

/// Tunables for one auctioneer process.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Ceiling on concurrently running start-auction workers.
    pub max_concurrent: usize,
    /// Cap on bidding rounds per start-auction.
    pub max_rounds: u32,
    /// Leader-lease renewal cadence.
    #[serde(deserialize_with = "deserialize_duration")]
    pub lock_interval: Duration,
    /// Lock-holder identity. When unset, a fresh UUID is generated per
    /// process instance.
    pub identity: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            max_rounds: DEFAULT_MAX_ROUNDS,
            lock_interval: DEFAULT_LOCK_INTERVAL,
            identity: None,
        }
    }
}

impl Config {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the documented bounds on every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent == 0 {
            return Err(ConfigError::ZeroMaxConcurrent);
        }
        if self.max_rounds == 0 {
            return Err(ConfigError::ZeroMaxRounds);
        }
        if self.lock_interval < Duration::from_secs(1) {
            return Err(ConfigError::LockIntervalTooShort);
        }
        Ok(())
    }
}

/// A configuration value outside its documented bounds.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_concurrent must be at least 1")]
    ZeroMaxConcurrent,

    #[error("max_rounds must be at least 1")]
    ZeroMaxRounds,

    #[error("lock_interval must be at least one second")]
    LockIntervalTooShort,
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_duration(&raw).map_err(serde::de::Error::custom)
}

/// Parse a duration string like "500ms", "30s", "5m", or bare seconds.
fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let parse = |digits: &str| {
        digits
            .parse::<u64>()
            .map_err(|_| format!("invalid duration: {s:?}"))
    };
    if let Some(millis) = s.strip_suffix("ms") {
        parse(millis).map(Duration::from_millis)
    } else if let Some(secs) = s.strip_suffix('s') {
        parse(secs).map(Duration::from_secs)
    } else if let Some(mins) = s.strip_suffix('m') {
        parse(mins).map(|m| Duration::from_secs(m * 60))
    } else {
        parse(s).map(Duration::from_secs)
    }
}
