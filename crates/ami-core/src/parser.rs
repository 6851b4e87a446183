//! Classification of raw blocks into responses and events

use tracing::trace;

use crate::framer::RawBlock;
use crate::message::{Event, HeaderTable, IncomingMessage, Response};

/// Result of classifying one block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    /// A block with a `Response` or `Event` header
    Message(IncomingMessage),
    /// A block with neither header, already rewrapped as a placeholder event
    /// tagged with the most recently sent action id
    Continuation(Event),
    /// A headerless block received before any action was sent
    Orphan,
}

/// Classify a block.
///
/// The kind is decided by whichever of the `Response` / `Event` headers comes
/// first in the block. Headers are matched per line on the key, so a
/// `UserEvent:` line never counts as an `Event:` header.
pub fn classify(block: &RawBlock, last_action_id: Option<&str>) -> Classified {
    let headers = HeaderTable::parse(&block.to_text());

    let response_at = headers.position("Response");
    let event_at = headers.position("Event");

    match (response_at, event_at) {
        (Some(response), Some(event)) if response < event => {
            Classified::Message(Response::new(headers).into())
        }
        (Some(_), None) => Classified::Message(Response::new(headers).into()),
        (_, Some(_)) => Classified::Message(Event::new(headers).into()),
        (None, None) => match last_action_id {
            Some(action_id) => {
                trace!("Headerless block, continuing action {}", action_id);
                Classified::Continuation(Event::continuation(action_id, headers))
            }
            None => Classified::Orphan,
        },
    }
}
