//! Outbound actions
//!
//! Encodes the handful of actions the dashboard sends to the switch into
//! wire blocks: `Action: <name>`, `ActionID: <id>`, the action's fields, and
//! the terminating empty line.

use std::fmt::Write;

use bytes::Bytes;
use uuid::Uuid;

use crate::error::{AmiError, Result};

/// An action understood by the switch's manager interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Authenticate the session
    Login {
        username: String,
        secret: String,
        /// Event mask, sent as `Events:` when present
        events: Option<String>,
    },
    /// End the session
    Logoff,
    Ping,
    /// Pause a queue member
    QueuePause {
        interface: String,
        queue: Option<String>,
        reason: Option<String>,
    },
    /// Unpause a queue member
    QueueUnpause {
        interface: String,
        queue: Option<String>,
    },
    /// Request queue parameters, members and entries as an event list
    QueueStatus { queue: Option<String> },
}

impl Action {
    pub fn login(username: impl Into<String>, secret: impl Into<String>, events: Option<String>) -> Self {
        Action::Login {
            username: username.into(),
            secret: secret.into(),
            events,
        }
    }

    /// Pause the agent's queue membership on every queue
    pub fn pause_agent(agent_id: &str) -> Self {
        Action::QueuePause {
            interface: agent_interface(agent_id),
            queue: None,
            reason: None,
        }
    }

    /// Unpause the agent's queue membership on every queue
    pub fn unpause_agent(agent_id: &str) -> Self {
        Action::QueueUnpause {
            interface: agent_interface(agent_id),
            queue: None,
        }
    }

    /// Wire name of the action. Unpausing is a `QueuePause` with
    /// `Paused: false`.
    pub fn name(&self) -> &'static str {
        match self {
            Action::Login { .. } => "Login",
            Action::Logoff => "Logoff",
            Action::Ping => "Ping",
            Action::QueuePause { .. } | Action::QueueUnpause { .. } => "QueuePause",
            Action::QueueStatus { .. } => "QueueStatus",
        }
    }

    fn fields(&self) -> Result<Vec<(&'static str, &str)>> {
        let mut fields = Vec::new();
        match self {
            Action::Login { username, secret, events } => {
                if username.is_empty() {
                    return Err(AmiError::missing_field("Login", "Username"));
                }
                fields.push(("Username", username.as_str()));
                fields.push(("Secret", secret.as_str()));
                if let Some(events) = events {
                    fields.push(("Events", events.as_str()));
                }
            }
            Action::Logoff | Action::Ping => {}
            Action::QueuePause { interface, queue, reason } => {
                if interface.is_empty() {
                    return Err(AmiError::missing_field("QueuePause", "Interface"));
                }
                fields.push(("Interface", interface.as_str()));
                fields.push(("Paused", "true"));
                if let Some(queue) = queue {
                    fields.push(("Queue", queue.as_str()));
                }
                if let Some(reason) = reason {
                    fields.push(("Reason", reason.as_str()));
                }
            }
            Action::QueueUnpause { interface, queue } => {
                if interface.is_empty() {
                    return Err(AmiError::missing_field("QueuePause", "Interface"));
                }
                fields.push(("Interface", interface.as_str()));
                fields.push(("Paused", "false"));
                if let Some(queue) = queue {
                    fields.push(("Queue", queue.as_str()));
                }
            }
            Action::QueueStatus { queue } => {
                if let Some(queue) = queue {
                    fields.push(("Queue", queue.as_str()));
                }
            }
        }
        Ok(fields)
    }

    /// Serialize the action tagged with the given action id
    pub fn encode(&self, action_id: &str) -> Result<Bytes> {
        let mut block = String::with_capacity(128);
        // Writing to a String cannot fail
        let _ = write!(block, "Action: {}\r\nActionID: {}\r\n", self.name(), action_id);
        for (key, value) in self.fields()? {
            let _ = write!(block, "{}: {}\r\n", key, value);
        }
        block.push_str("\r\n");
        Ok(Bytes::from(block))
    }
}

/// Queue member interface of an agent
pub fn agent_interface(agent_id: &str) -> String {
    format!("local/{}@agent-connect", agent_id)
}

/// Generate a fresh action id
pub fn new_action_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(action: &Action, id: &str) -> String {
        String::from_utf8(action.encode(id).unwrap().to_vec()).unwrap()
    }

    #[test]
    fn test_login_encoding() {
        let action = Action::login("admin", "secret", Some("on".to_string()));
        assert_eq!(
            encoded(&action, "id-1"),
            "Action: Login\r\nActionID: id-1\r\nUsername: admin\r\nSecret: secret\r\nEvents: on\r\n\r\n"
        );
    }

    #[test]
    fn test_pause_and_unpause_use_agent_channel() {
        assert_eq!(
            encoded(&Action::pause_agent("100"), "p"),
            "Action: QueuePause\r\nActionID: p\r\nInterface: local/100@agent-connect\r\nPaused: true\r\n\r\n"
        );
        assert_eq!(
            encoded(&Action::unpause_agent("100"), "u"),
            "Action: QueuePause\r\nActionID: u\r\nInterface: local/100@agent-connect\r\nPaused: false\r\n\r\n"
        );
    }

    #[test]
    fn test_missing_interface_is_rejected() {
        let action = Action::QueuePause {
            interface: String::new(),
            queue: None,
            reason: None,
        };
        assert_eq!(
            action.encode("x").unwrap_err(),
            AmiError::missing_field("QueuePause", "Interface")
        );
    }

    #[test]
    fn test_action_ids_are_unique() {
        assert_ne!(new_action_id(), new_action_id());
    }
}
