//! Application configuration
//!
//! Settings come from, in increasing priority:
//!
//! 1. built-in defaults
//! 2. an optional TOML file
//! 3. environment variables prefixed `CCPANEL__`, with `__` between
//!    section and key, e.g. `CCPANEL__MANAGER__PASSWORD`
//!
//! ```toml
//! [manager]
//! host = "10.0.0.5"
//! username = "panel"
//! password = "s3cret"
//! event_mask = "on"
//!
//! [dashboard]
//! bind_addr = "0.0.0.0:8088"
//!
//! [logging]
//! level = "debug"
//! ```

use std::path::Path;

use ::config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::errors::types::Result;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "CCPANEL";

/// Separator between prefix, section and key in environment variables
pub const ENV_SEPARATOR: &str = "__";

const REDACTED: &str = "********";

/// Full application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub manager: ManagerConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingSettings,
}

/// Connection to the switch's manager interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Sent as the login `Events:` field when set
    pub event_mask: Option<String>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5038,
            username: "admin".to_string(),
            password: String::new(),
            event_mask: None,
        }
    }
}

impl ManagerConfig {
    /// `host:port` to connect to
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Dashboard HTTP server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub bind_addr: String,
    /// Lines a slow viewer may fall behind before it skips ahead
    pub broadcast_capacity: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8088".to_string(),
            broadcast_capacity: 256,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load defaults, then `path` if given, then environment overrides.
    ///
    /// A missing file is an error when a path is given explicitly.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        let config = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Parse a TOML document, without environment overrides
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Copy safe to print or log
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if !config.manager.password.is_empty() {
            config.manager.password = REDACTED.to_string();
        }
        config
    }

    /// Pretty JSON of the redacted configuration
    pub fn to_redacted_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.redacted())
            .map_err(|e| crate::errors::types::Error::Config(e.to_string()))
    }
}
