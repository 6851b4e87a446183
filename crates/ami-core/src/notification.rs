//! Call-center notifications derived from manager events

use std::fmt;

/// A domain notification produced by the [`DomainEventMapper`](crate::mapper::DomainEventMapper)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallCenterEvent {
    /// `caller.new`: a caller entered the IVR
    CallerNew { caller_id: String, uid: String },
    /// `caller.hangup`
    CallerHangup { caller_id: String, uid: String },
    /// `caller.queued`: a caller joined a queue
    CallerQueued {
        caller_id: String,
        uid: String,
        queue: String,
    },
    /// `agent.loggedin`
    AgentLoggedIn { agent_id: String },
    /// `agent.loggedout`
    AgentLoggedOut { agent_id: String },
    /// `agent.paused`
    AgentPaused { agent_id: String },
    /// `agent.avail`
    AgentAvail { agent_id: String },
    /// `queue.connect`: an agent picked up a queued caller
    QueueConnect {
        agent_id: String,
        caller_id: String,
        uid: String,
    },
}

impl CallCenterEvent {
    /// Dotted notification name
    pub fn name(&self) -> &'static str {
        match self {
            CallCenterEvent::CallerNew { .. } => "caller.new",
            CallCenterEvent::CallerHangup { .. } => "caller.hangup",
            CallCenterEvent::CallerQueued { .. } => "caller.queued",
            CallCenterEvent::AgentLoggedIn { .. } => "agent.loggedin",
            CallCenterEvent::AgentLoggedOut { .. } => "agent.loggedout",
            CallCenterEvent::AgentPaused { .. } => "agent.paused",
            CallCenterEvent::AgentAvail { .. } => "agent.avail",
            CallCenterEvent::QueueConnect { .. } => "queue.connect",
        }
    }
}

impl fmt::Display for CallCenterEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallCenterEvent::CallerNew { caller_id, uid }
            | CallCenterEvent::CallerHangup { caller_id, uid } => {
                write!(f, "{}({}, {})", self.name(), caller_id, uid)
            }
            CallCenterEvent::CallerQueued { caller_id, uid, queue } => {
                write!(f, "{}({}, {}, {})", self.name(), caller_id, uid, queue)
            }
            CallCenterEvent::AgentLoggedIn { agent_id }
            | CallCenterEvent::AgentLoggedOut { agent_id }
            | CallCenterEvent::AgentPaused { agent_id }
            | CallCenterEvent::AgentAvail { agent_id } => write!(f, "{}({})", self.name(), agent_id),
            CallCenterEvent::QueueConnect { agent_id, caller_id, uid } => {
                write!(f, "{}({}, {}, {})", self.name(), agent_id, caller_id, uid)
            }
        }
    }
}
