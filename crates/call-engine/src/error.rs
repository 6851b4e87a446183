use thiserror::Error;

use ccpanel_ami_core::AmiError;

/// Errors returned by call-center operations that talk to the switch
///
/// Notification handling never fails; only operator commands that pause or
/// unpause an agent at the switch can, when the action cannot be written.
///
/// # Examples
///
/// ```
/// use ccpanel_call_engine::CallCenterError;
/// use ccpanel_ami_core::AmiError;
///
/// let err: CallCenterError = AmiError::OutboxClosed.into();
/// assert_eq!(err.to_string(), "Switch control error: Outbound action channel is closed");
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallCenterError {
    /// The pause/unpause action could not be sent
    #[error("Switch control error: {0}")]
    Control(#[from] AmiError),
}

/// Result type for call-center operations
pub type Result<T> = std::result::Result<T, CallCenterError>;
