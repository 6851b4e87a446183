//! Live call-center dashboard
//!
//! Connects to the switch's manager interface, keeps the call-center state
//! current and serves it to browser viewers over HTTP.

pub mod dashboard;
pub mod runner;

pub use dashboard::{router, DashboardState};
pub use runner::{DashboardCommand, Runner};
