//! Configuration management
//!
//! The agent runs with built-in defaults; an optional TOML file can override
//! the listening port, shutdown grace period, health-check timing and the
//! screenshot failure policy.

mod validation;

pub use validation::{validate_body_limit, validate_grace_period, validate_health_timeout};

use crate::error::{AgentError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Top-level agent configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Control server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Liveness probe settings
    #[serde(default)]
    pub health: HealthConfig,

    /// Screenshot pipeline settings
    #[serde(default)]
    pub capture: CaptureConfig,
}

/// Control server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listening port; 0 picks a free port at startup
    #[serde(default)]
    pub port: u16,

    /// How long in-flight requests may run after a stop is requested
    #[serde(default = "default_grace_ms")]
    pub shutdown_grace_ms: u64,

    /// Largest accepted request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

/// Health-check configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthConfig {
    /// Timeout for the loopback GET
    #[serde(default = "default_health_timeout_ms")]
    pub timeout_ms: u64,

    /// Interval of the periodic probe run by `serve`; 0 disables it
    #[serde(default = "default_health_interval_secs")]
    pub interval_secs: u64,
}

/// Screenshot capture configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// What to do when a single display fails to capture
    #[serde(default)]
    pub on_failure: CapturePolicy,
}

/// Policy applied when one display in a batch fails to capture
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapturePolicy {
    /// Discard the whole batch and surface the error
    #[default]
    Abort,
    /// Omit the failed display and keep going
    Skip,
}

impl AgentConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading configuration from {:?}", path);

        let content = fs::read_to_string(path).map_err(|e| {
            AgentError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        Self::parse(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn parse(content: &str) -> Result<Self> {
        let config: AgentConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.health.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    /// Validate server settings
    pub fn validate(&self) -> Result<()> {
        validate_grace_period(self.shutdown_grace_ms)?;
        validate_body_limit(self.max_body_bytes)?;
        Ok(())
    }

    /// Grace period as a `Duration`
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 0,
            shutdown_grace_ms: default_grace_ms(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl HealthConfig {
    /// Validate health-check settings
    pub fn validate(&self) -> Result<()> {
        validate_health_timeout(self.timeout_ms)
    }

    /// Health-check timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Probe interval, `None` when periodic probing is disabled
    pub fn interval(&self) -> Option<Duration> {
        (self.interval_secs > 0).then(|| Duration::from_secs(self.interval_secs))
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_health_timeout_ms(),
            interval_secs: default_health_interval_secs(),
        }
    }
}

// Default value functions for serde
fn default_grace_ms() -> u64 {
    5_000
}

fn default_max_body_bytes() -> usize {
    64 * 1024
}

fn default_health_timeout_ms() -> u64 {
    2_000
}

fn default_health_interval_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_empty_uses_defaults() {
        let config = AgentConfig::parse("").expect("Failed to parse empty TOML");
        assert_eq!(config, AgentConfig::default());
        assert_eq!(config.server.port, 0);
        assert_eq!(config.server.shutdown_grace_ms, 5_000);
        assert_eq!(config.health.timeout_ms, 2_000);
        assert_eq!(config.capture.on_failure, CapturePolicy::Abort);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [server]
            port = 9000
            shutdown_grace_ms = 1500
            max_body_bytes = 1024

            [health]
            timeout_ms = 500
            interval_secs = 0

            [capture]
            on_failure = "skip"
        "#;

        let config = AgentConfig::parse(toml).expect("Failed to parse TOML");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.shutdown_grace(), Duration::from_millis(1500));
        assert_eq!(config.server.max_body_bytes, 1024);
        assert_eq!(config.health.timeout(), Duration::from_millis(500));
        assert!(config.health.interval().is_none());
        assert_eq!(config.capture.on_failure, CapturePolicy::Skip);
    }

    #[test]
    fn test_parse_rejects_unknown_policy() {
        let toml = r#"
            [capture]
            on_failure = "retry"
        "#;
        assert!(AgentConfig::parse(toml).is_err());
    }

    #[test]
    fn test_parse_rejects_zero_timeout() {
        let toml = r#"
            [health]
            timeout_ms = 0
        "#;
        match AgentConfig::parse(toml) {
            Err(AgentError::Validation(_)) => {}
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 4242").unwrap();

        let config = AgentConfig::from_file(file.path()).expect("Failed to load config");
        assert_eq!(config.server.port, 4242);
        assert_eq!(config.health.interval(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = AgentConfig::from_file(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(AgentError::Config(_))));
    }
}
