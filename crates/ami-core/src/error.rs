//! Error types for the manager interface client
//!
//! Nothing on the inbound path (framing, classification, correlation,
//! dispatch) can fail. Errors only arise when writing actions to the switch.

use thiserror::Error;

/// Result type for manager client operations
pub type Result<T> = std::result::Result<T, AmiError>;

/// Errors that can occur while sending actions to the switch
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmiError {
    /// The outbound channel to the transport has been dropped
    #[error("Outbound action channel is closed")]
    OutboxClosed,

    /// The action cannot be encoded without this field
    #[error("Action {action} is missing required field {field}")]
    MissingField {
        action: &'static str,
        field: &'static str,
    },
}

impl AmiError {
    /// Create an outbox closed error
    pub fn outbox_closed() -> Self {
        Self::OutboxClosed
    }

    /// Create a missing field error
    pub fn missing_field(action: &'static str, field: &'static str) -> Self {
        Self::MissingField { action, field }
    }
}
