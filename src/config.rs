//! Console configuration.
//!
//! Loaded from an optional YAML file (`console.yaml`), then overridden by
//! environment variables. Every section defaults, so an empty file is valid.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    InvalidValue { key: String, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Failed to read config: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { key, value } => {
                write!(f, "Invalid value '{}' for {}", value, key)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Backend endpoint and request timeouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Applies to rule execution only.
    pub execute_timeout_secs: u64,
    /// Applies to parametric evaluation only.
    pub evaluate_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            execute_timeout_secs: 8,
            evaluate_timeout_secs: 10,
        }
    }
}

impl ApiConfig {
    pub fn execute_timeout(&self) -> Duration {
        Duration::from_secs(self.execute_timeout_secs)
    }

    pub fn evaluate_timeout(&self) -> Duration {
        Duration::from_secs(self.evaluate_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Messages kept at once; the oldest is dropped beyond this.
    pub capacity: usize,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { capacity: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StubConfig {
    pub host: String,
    pub port: u16,
    /// Seed the in-memory tables with sample data on startup.
    pub seed: bool,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            seed: true,
        }
    }
}

/// Top-level configuration from console.yaml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub api: ApiConfig,
    pub notifications: NotificationConfig,
    pub stub: StubConfig,
}

impl ConsoleConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Defaults, or the file at `path` when given, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup` (normally the process environment).
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("CONSOLE_API_URL") {
            self.api.base_url = url;
        }
        if let Some(secs) = lookup("CONSOLE_EXECUTE_TIMEOUT_SECS") {
            self.api.execute_timeout_secs = parse_var("CONSOLE_EXECUTE_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = lookup("CONSOLE_EVALUATE_TIMEOUT_SECS") {
            self.api.evaluate_timeout_secs = parse_var("CONSOLE_EVALUATE_TIMEOUT_SECS", &secs)?;
        }
        if let Some(port) = lookup("STUB_PORT") {
            self.stub.port = parse_var("STUB_PORT", &port)?;
        }
        Ok(self)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_yaml_is_default() {
        let config = ConsoleConfig::from_yaml("").unwrap();
        assert_eq!(config, ConsoleConfig::default());
        assert_eq!(config.api.execute_timeout(), Duration::from_secs(8));
        assert_eq!(config.api.evaluate_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
api:
  base_url: http://backend:9000/api
stub:
  port: 9100
"#;
        let config = ConsoleConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.api.base_url, "http://backend:9000/api");
        assert_eq!(config.api.execute_timeout_secs, 8);
        assert_eq!(config.stub.port, 9100);
        assert!(config.stub.seed);
        assert_eq!(config.notifications.capacity, 5);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CONSOLE_API_URL", "http://10.0.0.2:8080/api"),
            ("CONSOLE_EXECUTE_TIMEOUT_SECS", "3"),
        ]
        .into_iter()
        .collect();

        let config = ConsoleConfig::default()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.api.base_url, "http://10.0.0.2:8080/api");
        assert_eq!(config.api.execute_timeout_secs, 3);
        assert_eq!(config.api.evaluate_timeout_secs, 10);
    }

    #[test]
    fn test_bad_override_is_rejected() {
        let err = ConsoleConfig::default()
            .with_overrides(|key| (key == "STUB_PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_malformed_yaml() {
        assert!(matches!(
            ConsoleConfig::from_yaml("api: [not, a, map"),
            Err(ConfigError::Parse(_))
        ));
    }
}
