//! Configuration Management
//!
//! Persistent defaults for kubecensus, overridden by CLI flags.

use crate::resource::aggregator::{DEFAULT_LIST_TIMEOUT, DEFAULT_PASS_DEADLINE};
use crate::resource::{AggregatorOptions, ConcurrencyLimit};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Listening port
    #[serde(default)]
    pub port: Option<u16>,
    /// Listening address
    #[serde(default)]
    pub bind_address: Option<String>,
    /// Kubeconfig file, instead of `KUBECONFIG` / `~/.kube/config`
    #[serde(default)]
    pub kubeconfig: Option<PathBuf>,
    /// Kubeconfig context, instead of current-context
    #[serde(default)]
    pub context: Option<String>,
    /// Seconds allowed per list call (0 disables)
    #[serde(default)]
    pub list_timeout_secs: Option<u64>,
    /// Seconds allowed per aggregation pass (0 disables)
    #[serde(default)]
    pub pass_timeout_secs: Option<u64>,
    /// Maximum list calls in flight (0 or absent is unbounded)
    #[serde(default)]
    pub max_concurrent_lists: Option<usize>,
}

impl Config {
    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("kubecensus").join("config.json"))
    }

    /// Load configuration from the default location; a missing or unreadable file yields defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config file: {:#}", e);
                Self::default()
            }
        }
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    /// Overlay values set in `overrides` (CLI > config)
    pub fn merged(mut self, overrides: Config) -> Self {
        self.port = overrides.port.or(self.port);
        self.bind_address = overrides.bind_address.or(self.bind_address);
        self.kubeconfig = overrides.kubeconfig.or(self.kubeconfig);
        self.context = overrides.context.or(self.context);
        self.list_timeout_secs = overrides.list_timeout_secs.or(self.list_timeout_secs);
        self.pass_timeout_secs = overrides.pass_timeout_secs.or(self.pass_timeout_secs);
        self.max_concurrent_lists = overrides.max_concurrent_lists.or(self.max_concurrent_lists);
        self
    }

    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn effective_bind_address(&self) -> String {
        self.bind_address
            .clone()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string())
    }

    pub fn list_timeout(&self) -> Option<Duration> {
        timeout_from_secs(self.list_timeout_secs, DEFAULT_LIST_TIMEOUT)
    }

    pub fn pass_deadline(&self) -> Option<Duration> {
        timeout_from_secs(self.pass_timeout_secs, DEFAULT_PASS_DEADLINE)
    }

    pub fn aggregator_options(&self) -> AggregatorOptions {
        AggregatorOptions {
            concurrency: ConcurrencyLimit::from_max(self.max_concurrent_lists),
            list_timeout: self.list_timeout(),
            pass_deadline: self.pass_deadline(),
        }
    }
}

fn timeout_from_secs(secs: Option<u64>, default: Duration) -> Option<Duration> {
    match secs {
        None => Some(default),
        Some(0) => None,
        Some(secs) => Some(Duration::from_secs(secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroUsize;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.effective_port(), 8080);
        assert_eq!(config.effective_bind_address(), "0.0.0.0");
        let options = config.aggregator_options();
        assert_eq!(options.concurrency, ConcurrencyLimit::Unbounded);
        assert_eq!(options.list_timeout, Some(DEFAULT_LIST_TIMEOUT));
        assert_eq!(options.pass_deadline, Some(DEFAULT_PASS_DEADLINE));
    }

    #[test]
    fn test_cli_overrides_file() {
        let file: Config =
            serde_json::from_str(r#"{"port": 9000, "context": "prod", "listTimeoutSecs": 5}"#)
                .unwrap();
        let cli = Config {
            port: Some(7000),
            ..Config::default()
        };
        let config = file.merged(cli);
        assert_eq!(config.effective_port(), 7000);
        assert_eq!(config.context.as_deref(), Some("prod"));
        assert_eq!(config.list_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_zero_disables_bounds() {
        let config = Config {
            list_timeout_secs: Some(0),
            pass_timeout_secs: Some(0),
            max_concurrent_lists: Some(4),
            ..Config::default()
        };
        let options = config.aggregator_options();
        assert_eq!(options.list_timeout, None);
        assert_eq!(options.pass_deadline, None);
        assert_eq!(
            options.concurrency,
            ConcurrencyLimit::Bounded(NonZeroUsize::new(4).unwrap())
        );
    }

    #[test]
    fn test_load_from_missing_file_is_error() {
        assert!(Config::load_from(Path::new("/nonexistent/kubecensus.json")).is_err());
    }
}
