//! Translation of raw manager events into call-center notifications
//!
//! | Event              | Sub-event     | Notification                  |
//! |--------------------|---------------|-------------------------------|
//! | `UserEvent`        | `CALLER`      | `caller.new`                  |
//! | `UserEvent`        | `CALLERHANGUP`| `caller.hangup`               |
//! | `UserEvent`        | `LOGGEDIN`    | `agent.loggedin`              |
//! | `UserEvent`        | `LOGGEDOUT`   | `agent.loggedout`             |
//! | `QueueMemberPause` |               | `agent.paused` / `agent.avail`|
//! | `QueueCallerJoin`  |               | `caller.queued`               |
//! | `BridgeEnter`      |               | `queue.connect`               |
//!
//! Anything else, and any event missing a field its notification needs, maps
//! to nothing.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::bus::{Listener, Predicate};
use crate::message::{Event, IncomingMessage};
use crate::notification::CallCenterEvent;

/// Map one event to its notification, if any
pub fn map_event(event: &Event) -> Option<CallCenterEvent> {
    let field = |key: &str| event.headers().get_non_empty(key).map(str::to_string);

    match event.name() {
        "UserEvent" => match event.user_event_name()? {
            "CALLER" => Some(CallCenterEvent::CallerNew {
                caller_id: field("CallerIDNum")?,
                uid: field("Uniqueid")?,
            }),
            "CALLERHANGUP" => Some(CallCenterEvent::CallerHangup {
                caller_id: field("CallerIDNum")?,
                uid: field("Uniqueid")?,
            }),
            "LOGGEDIN" => Some(CallCenterEvent::AgentLoggedIn {
                agent_id: field("CallerIDNum")?,
            }),
            "LOGGEDOUT" => Some(CallCenterEvent::AgentLoggedOut {
                agent_id: field("CallerIDNum")?,
            }),
            _ => None,
        },
        "QueueMemberPause" => {
            let agent_id = field("CallerIDNum")?;
            if is_truthy(event.get("Paused")) {
                Some(CallCenterEvent::AgentPaused { agent_id })
            } else {
                Some(CallCenterEvent::AgentAvail { agent_id })
            }
        }
        // Member status changes carry no dashboard state
        "QueueMemberStatus" => None,
        "QueueCallerJoin" => Some(CallCenterEvent::CallerQueued {
            caller_id: field("CallerIDNum")?,
            uid: field("Uniqueid")?,
            queue: field("Queue")?,
        }),
        "BridgeEnter" => Some(CallCenterEvent::QueueConnect {
            agent_id: field("CallerIDNum")?,
            caller_id: field("ConnectedLineNum")?,
            uid: field("Linkedid")?,
        }),
        _ => None,
    }
}

fn is_truthy(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        Some(value) => {
            value == "1" || value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("yes")
        }
        None => false,
    }
}

/// Bus listener forwarding notifications to the state engine's channel
pub struct DomainEventMapper {
    notifications: mpsc::UnboundedSender<CallCenterEvent>,
}

impl DomainEventMapper {
    /// Create a mapper and the receiving end of its notification channel
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CallCenterEvent>) {
        let (notifications, rx) = mpsc::unbounded_channel();
        (Self { notifications }, rx)
    }

    /// Predicate to register the mapper with: only events reach it
    pub fn predicate() -> Predicate {
        Arc::new(|message: &IncomingMessage| message.is_event())
    }
}

impl Listener for DomainEventMapper {
    fn handle(&self, message: &IncomingMessage) {
        let Some(event) = message.as_event() else {
            return;
        };
        match map_event(event) {
            Some(notification) => {
                debug!("Mapped {} to {}", event.name(), notification);
                if self.notifications.send(notification).is_err() {
                    trace!("Notification receiver dropped");
                }
            }
            None => trace!("No notification for {}", event.name()),
        }
    }
}
