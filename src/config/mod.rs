#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::{AccessError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000/api";
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const MIN_TIMEOUT_MS: u64 = 100;
pub const MAX_TIMEOUT_MS: u64 = 120_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    #[default]
    Live,
    Demo,
}

impl OperatingMode {
    pub fn is_demo(self) -> bool {
        self == OperatingMode::Demo
    }
}

impl FromStr for OperatingMode {
    type Err = AccessError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(OperatingMode::Live),
            "demo" => Ok(OperatingMode::Demo),
            other => Err(AccessError::Config {
                field: "mode".to_string(),
                value: other.to_string(),
                reason: "Expected 'live' or 'demo'".to_string(),
            }),
        }
    }
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatingMode::Live => write!(f, "live"),
            OperatingMode::Demo => write!(f, "demo"),
        }
    }
}

/// Settings read once at startup and injected into the executor and every facade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    pub mode: OperatingMode,
    pub allow_offline_fallback: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            mode: OperatingMode::Live,
            allow_offline_fallback: true,
        }
    }
}

impl ClientConfig {
    pub fn live(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn demo() -> Self {
        Self {
            mode: OperatingMode::Demo,
            ..Self::default()
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_offline_fallback(mut self, allow: bool) -> Self {
        self.allow_offline_fallback = allow;
        self
    }

    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Self {
        Self {
            base_url: provider.base_url().to_string(),
            timeout_ms: provider.timeout_ms(),
            mode: provider.operating_mode(),
            allow_offline_fallback: provider.allow_offline_fallback(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl ConfigProvider for ClientConfig {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }

    fn operating_mode(&self) -> OperatingMode {
        self.mode
    }

    fn allow_offline_fallback(&self) -> bool {
        self.allow_offline_fallback
    }
}

impl Validate for ClientConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("client.base_url", &self.base_url)?;
        validation::validate_range(
            "client.timeout_ms",
            self.timeout_ms,
            MIN_TIMEOUT_MS,
            MAX_TIMEOUT_MS,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Demo".parse::<OperatingMode>().unwrap(), OperatingMode::Demo);
        assert_eq!(" live ".parse::<OperatingMode>().unwrap(), OperatingMode::Live);
        assert!("offline".parse::<OperatingMode>().is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_millis(10_000));
        assert!(config.allow_offline_fallback);
    }

    #[test]
    fn test_timeout_out_of_range_is_rejected() {
        let config = ClientConfig::default().with_timeout_ms(10);
        assert!(config.validate().is_err());
    }
}
