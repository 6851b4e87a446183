//! Typed inbound manager messages
//!
//! Every block received from the switch becomes either a [`Response`] (the
//! direct reply to an action) or an [`Event`] (an asynchronous notification).
//! Both carry the same [`HeaderTable`] of `Key: Value` fields.

mod event;
mod headers;
mod response;

pub use event::{Event, CONTINUATION_EVENT};
pub use headers::{HeaderField, HeaderTable};
pub use response::Response;

/// Key carrying the action identifier on every message
pub const ACTION_ID: &str = "ActionID";

/// Kind of an inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Response,
    Event,
}

/// A classified inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingMessage {
    Response(Response),
    Event(Event),
}

impl IncomingMessage {
    pub fn kind(&self) -> MessageKind {
        match self {
            IncomingMessage::Response(_) => MessageKind::Response,
            IncomingMessage::Event(_) => MessageKind::Event,
        }
    }

    /// Action identifier, if the message carries one
    pub fn action_id(&self) -> Option<&str> {
        self.headers().get_non_empty(ACTION_ID)
    }

    /// The message's key/value table
    pub fn headers(&self) -> &HeaderTable {
        match self {
            IncomingMessage::Response(response) => response.headers(),
            IncomingMessage::Event(event) => event.headers(),
        }
    }

    /// Shorthand for `headers().get(key)`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers().get(key)
    }

    pub fn is_event(&self) -> bool {
        matches!(self, IncomingMessage::Event(_))
    }

    pub fn as_event(&self) -> Option<&Event> {
        match self {
            IncomingMessage::Event(event) => Some(event),
            IncomingMessage::Response(_) => None,
        }
    }

    pub fn as_response(&self) -> Option<&Response> {
        match self {
            IncomingMessage::Response(response) => Some(response),
            IncomingMessage::Event(_) => None,
        }
    }
}

impl From<Response> for IncomingMessage {
    fn from(response: Response) -> Self {
        IncomingMessage::Response(response)
    }
}

impl From<Event> for IncomingMessage {
    fn from(event: Event) -> Self {
        IncomingMessage::Event(event)
    }
}
