//! Manager interface client
//!
//! [`AmiClient`] owns the inbound pipeline (framer, classifier, correlator,
//! listener bus) and the outbound action channel. It does no I/O itself: the
//! transport hands it every chunk read from the socket through
//! [`AmiClient::feed`] and writes whatever arrives on the outbound receiver
//! verbatim. Everything triggered by a chunk, including listener callbacks,
//! runs before `feed` returns.

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::action::{new_action_id, Action};
use crate::bus::{EventBus, Listener, ListenerId, Predicate};
use crate::correlator::{CompletionPolicy, Correlation, ResponseCorrelator};
use crate::error::{AmiError, Result};
use crate::framer::StreamFramer;
use crate::message::{IncomingMessage, Response};
use crate::parser::{classify, Classified};

/// Counters for one call to [`AmiClient::feed`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FeedSummary {
    /// Complete blocks framed from the chunk
    pub blocks: usize,
    /// Responses stored by the correlator
    pub responses: usize,
    /// Events handed to the listener bus
    pub dispatched: usize,
    /// Events and continuations attached to pending responses
    pub buffered: usize,
    /// Blocks that could not be attributed to anything
    pub dropped: usize,
}

/// Asterisk manager interface client
pub struct AmiClient {
    framer: StreamFramer,
    correlator: ResponseCorrelator,
    bus: EventBus,
    outbox: mpsc::UnboundedSender<Bytes>,
}

impl AmiClient {
    /// Create a client and the receiver the transport drains to write
    /// actions to the switch
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Bytes>) {
        Self::with_correlator(ResponseCorrelator::new())
    }

    /// Create a client around a preconfigured correlator
    pub fn with_correlator(correlator: ResponseCorrelator) -> (Self, mpsc::UnboundedReceiver<Bytes>) {
        let (outbox, rx) = mpsc::unbounded_channel();
        let client = Self {
            framer: StreamFramer::new(),
            correlator,
            bus: EventBus::new(),
            outbox,
        };
        (client, rx)
    }

    /// Encode and queue an action. Returns the action id it was tagged with.
    pub fn send(&mut self, action: &Action) -> Result<String> {
        let action_id = new_action_id();
        let block = action.encode(&action_id)?;
        self.outbox.send(block).map_err(|_| AmiError::outbox_closed())?;
        self.correlator.record_sent(&action_id, action.name());
        debug!("Sent {} action {}", action.name(), action_id);
        Ok(action_id)
    }

    /// Authenticate with the switch
    pub fn login(&mut self, username: &str, secret: &str, events: Option<String>) -> Result<String> {
        self.send(&Action::login(username, secret, events))
    }

    /// End the session. The switch answers and closes the connection.
    pub fn logoff(&mut self) -> Result<String> {
        self.send(&Action::Logoff)
    }

    /// Pause an agent on all of its queues
    pub fn pause_agent(&mut self, agent_id: &str) -> Result<String> {
        let action_id = self.send(&Action::pause_agent(agent_id))?;
        debug!("Pause {}", crate::action::agent_interface(agent_id));
        Ok(action_id)
    }

    /// Unpause an agent on all of its queues
    pub fn unpause_agent(&mut self, agent_id: &str) -> Result<String> {
        let action_id = self.send(&Action::unpause_agent(agent_id))?;
        debug!("Unpause {}", crate::action::agent_interface(agent_id));
        Ok(action_id)
    }

    /// Process one chunk read from the transport
    pub fn feed(&mut self, data: &[u8]) -> FeedSummary {
        let mut summary = FeedSummary::default();

        for block in self.framer.feed(data) {
            summary.blocks += 1;
            match classify(&block, self.correlator.last_action_id()) {
                Classified::Message(IncomingMessage::Response(response)) => {
                    self.correlator.on_response(response);
                    summary.responses += 1;
                }
                Classified::Message(IncomingMessage::Event(event)) => match self.correlator.on_event(event) {
                    Correlation::Deliver(event) => {
                        trace!("Dispatching {}", event.name());
                        self.bus.dispatch(&IncomingMessage::Event(event));
                        summary.dispatched += 1;
                    }
                    Correlation::Buffered => summary.buffered += 1,
                },
                Classified::Continuation(event) => {
                    if self.correlator.on_continuation(event) {
                        summary.buffered += 1;
                    } else {
                        summary.dropped += 1;
                    }
                }
                Classified::Orphan => {
                    trace!("Dropping headerless block received before any action");
                    summary.dropped += 1;
                }
            }
        }

        summary
    }

    /// Observe dispatched messages
    pub fn register_listener(&mut self, listener: Arc<dyn Listener>, predicate: Option<Predicate>) -> ListenerId {
        self.bus.register(listener, predicate)
    }

    pub fn unregister_listener(&mut self, id: ListenerId) -> bool {
        self.bus.unregister(id)
    }

    /// Use a completion policy for responses to the named action
    pub fn register_completion_policy(&mut self, action: &str, policy: Arc<dyn CompletionPolicy>) {
        self.correlator.register_policy(action, policy);
    }

    /// Response received for an action, if any
    pub fn response(&self, action_id: &str) -> Option<&Response> {
        self.correlator.response(action_id)
    }

    /// Remove a response once the caller is done with it
    pub fn take_response(&mut self, action_id: &str) -> Option<Response> {
        self.correlator.take_response(action_id)
    }

    /// Remove and return every complete response. Call after each
    /// [`feed`](AmiClient::feed) so retained responses do not pile up.
    pub fn drain_complete(&mut self) -> Vec<Response> {
        self.correlator.drain_complete()
    }

    /// Responses held until taken or drained
    pub fn retained_responses(&self) -> usize {
        self.correlator.len()
    }

    /// Sent actions still waiting for a response
    pub fn in_flight_actions(&self) -> usize {
        self.correlator.in_flight()
    }

    pub fn last_action_id(&self) -> Option<&str> {
        self.correlator.last_action_id()
    }
}
