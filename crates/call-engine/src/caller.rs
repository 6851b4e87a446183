//! Caller and bridge model

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CallerStatus {
    /// In the IVR
    New,
    /// Waiting in a queue
    Queued,
    /// Bridged to an agent
    InCall,
    Hangup,
}

impl CallerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallerStatus::New => "NEW",
            CallerStatus::Queued => "QUEUED",
            CallerStatus::InCall => "INCALL",
            CallerStatus::Hangup => "HANGUP",
        }
    }
}

impl fmt::Display for CallerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live call. Keyed by `uid`; the caller id alone is not unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    /// Caller id number
    pub caller_id: String,
    /// Unique call identifier
    pub uid: String,
    pub status: CallerStatus,
    pub queue: Option<String>,
}

impl Caller {
    pub fn new(caller_id: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            caller_id: caller_id.into(),
            uid: uid.into(),
            status: CallerStatus::New,
            queue: None,
        }
    }
}

/// `callerid:STATUS:uid`
impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.caller_id, self.status, self.uid)
    }
}

/// A connected caller/agent pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bridge {
    pub caller_uid: String,
    pub agent_id: String,
    pub connected_at: DateTime<Utc>,
}

impl Bridge {
    pub fn new(caller_uid: impl Into<String>, agent_id: impl Into<String>) -> Self {
        Self {
            caller_uid: caller_uid.into(),
            agent_id: agent_id.into(),
            connected_at: Utc::now(),
        }
    }
}
