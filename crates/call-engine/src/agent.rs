//! Agent model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Agent status as shown on the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AgentStatus {
    /// Seen, but no status event received yet
    Unknown,
    LoggedIn,
    LoggedOut,
    /// Ready to take calls
    Avail,
    Paused,
    /// Bridged to a caller
    InCall,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Unknown => "UNKNOWN",
            AgentStatus::LoggedIn => "LOGGEDIN",
            AgentStatus::LoggedOut => "LOGGEDOUT",
            AgentStatus::Avail => "AVAIL",
            AgentStatus::Paused => "PAUSED",
            AgentStatus::InCall => "INCALL",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "UNKNOWN" => Ok(AgentStatus::Unknown),
            "LOGGEDIN" => Ok(AgentStatus::LoggedIn),
            "LOGGEDOUT" => Ok(AgentStatus::LoggedOut),
            "AVAIL" => Ok(AgentStatus::Avail),
            "PAUSED" => Ok(AgentStatus::Paused),
            "INCALL" => Ok(AgentStatus::InCall),
            _ => Err(format!("Unknown agent status: {}", s)),
        }
    }
}

/// Status an operator can force when toggling an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ToggleForce {
    Avail,
    Paused,
}

impl FromStr for ToggleForce {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "AVAIL" => Ok(ToggleForce::Avail),
            "PAUSED" => Ok(ToggleForce::Paused),
            _ => Err(format!("Unknown toggle target: {}", s)),
        }
    }
}

/// A member of the agent fleet. Agents are never removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub status: AgentStatus,
    /// When the status last changed
    pub since: DateTime<Utc>,
}

impl Agent {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: AgentStatus::Unknown,
            since: Utc::now(),
        }
    }

    pub fn set_status(&mut self, status: AgentStatus) {
        if self.status != status {
            self.status = status;
            self.since = Utc::now();
        }
    }
}

/// `id:STATUS`
impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_agent_is_unknown() {
        let agent = Agent::new("100");
        assert_eq!(agent.status, AgentStatus::Unknown);
        assert_eq!(agent.to_string(), "100:UNKNOWN");
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [
            AgentStatus::Unknown,
            AgentStatus::LoggedIn,
            AgentStatus::LoggedOut,
            AgentStatus::Avail,
            AgentStatus::Paused,
            AgentStatus::InCall,
        ] {
            assert_eq!(status.as_str().parse::<AgentStatus>(), Ok(status));
        }
        assert!("busy".parse::<AgentStatus>().is_err());
    }

    #[test]
    fn test_repeated_status_keeps_timestamp() {
        let mut agent = Agent::new("100");
        agent.set_status(AgentStatus::Avail);
        let since = agent.since;
        agent.set_status(AgentStatus::Avail);
        assert_eq!(agent.since, since);
    }

    #[test]
    fn test_toggle_force_parsing() {
        assert_eq!("avail".parse::<ToggleForce>(), Ok(ToggleForce::Avail));
        assert_eq!("PAUSED".parse::<ToggleForce>(), Ok(ToggleForce::Paused));
        assert!("INCALL".parse::<ToggleForce>().is_err());
    }
}
