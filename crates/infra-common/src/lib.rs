//! Shared infrastructure for the call-center panel
//!
//! - [`config`]: layered application configuration (TOML file plus
//!   `CCPANEL__*` environment overrides)
//! - [`logging`]: `tracing` subscriber setup
//! - [`errors`]: the error type both of them return

pub mod config;
pub mod errors;
pub mod logging;

pub use config::{AppConfig, DashboardConfig, LoggingSettings, ManagerConfig};
pub use errors::types::{Error, Result};
pub use logging::setup::{log_welcome, parse_log_level, setup_logging, LoggingConfig};
