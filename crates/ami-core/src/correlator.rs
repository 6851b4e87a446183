//! Response correlation
//!
//! Some actions are answered by a response followed by a list of events that
//! carry the same `ActionID`. While such a response is pending, the events
//! are attached to it instead of being dispatched. Whether an action produces
//! a list, and which event ends it, depends on the action, so that decision
//! is made by a [`CompletionPolicy`] registered per action name. Actions
//! without a registered policy never buffer anything.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tracing::{debug, trace};

use crate::message::{Event, Response};

/// Actions remembered while waiting for their response. Older ones are
/// forgotten first and fall back to [`ImmediateCompletion`].
pub const MAX_IN_FLIGHT: usize = 1024;

/// Decides when a response stops collecting events
pub trait CompletionPolicy: Send + Sync {
    /// Whether the response is complete as soon as it arrives
    fn starts_complete(&self, response: &Response) -> bool;

    /// Whether this attached event completes the response
    fn completes(&self, response: &Response, event: &Event) -> bool;
}

/// Responses are complete on arrival; nothing is ever buffered
#[derive(Debug, Default, Clone, Copy)]
pub struct ImmediateCompletion;

impl CompletionPolicy for ImmediateCompletion {
    fn starts_complete(&self, _response: &Response) -> bool {
        true
    }

    fn completes(&self, _response: &Response, _event: &Event) -> bool {
        true
    }
}

/// Event-list actions: the response announces `EventList: start` and the
/// final event of the list carries `EventList: Complete`
#[derive(Debug, Default, Clone, Copy)]
pub struct EventListCompletion;

impl CompletionPolicy for EventListCompletion {
    fn starts_complete(&self, response: &Response) -> bool {
        !response
            .get("EventList")
            .is_some_and(|value| value.eq_ignore_ascii_case("start"))
    }

    fn completes(&self, _response: &Response, event: &Event) -> bool {
        event
            .get("EventList")
            .is_some_and(|value| value.eq_ignore_ascii_case("Complete"))
    }
}

/// What the correlator did with an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Correlation {
    /// No pending response claims the event; dispatch it
    Deliver(Event),
    /// The event was attached to a pending response
    Buffered,
}

/// Tracks in-flight responses keyed by action id
pub struct ResponseCorrelator {
    responses: HashMap<String, Response>,
    /// Action name for each action id sent by this client
    sent: HashMap<String, String>,
    /// Send order of `sent`, oldest first; may hold ids already answered
    sent_order: VecDeque<String>,
    last_action_id: Option<String>,
    policies: HashMap<String, Arc<dyn CompletionPolicy>>,
    fallback: Arc<dyn CompletionPolicy>,
}

impl ResponseCorrelator {
    /// Create a correlator with the built-in policies registered
    pub fn new() -> Self {
        let mut correlator = Self::without_policies();
        correlator.register_policy("QueueStatus", Arc::new(EventListCompletion));
        correlator
    }

    /// Create a correlator where every action uses [`ImmediateCompletion`]
    pub fn without_policies() -> Self {
        Self {
            responses: HashMap::new(),
            sent: HashMap::new(),
            sent_order: VecDeque::new(),
            last_action_id: None,
            policies: HashMap::new(),
            fallback: Arc::new(ImmediateCompletion),
        }
    }

    /// Register the completion policy for an action name (case-insensitive)
    pub fn register_policy(&mut self, action: &str, policy: Arc<dyn CompletionPolicy>) {
        self.policies.insert(action.to_ascii_lowercase(), policy);
    }

    /// Record an action written to the switch. Its id becomes the fallback
    /// for responses and continuation blocks that omit one.
    pub fn record_sent(&mut self, action_id: &str, action: &str) {
        self.sent.insert(action_id.to_string(), action.to_string());
        self.sent_order.push_back(action_id.to_string());
        while self.sent_order.len() > MAX_IN_FLIGHT {
            if let Some(oldest) = self.sent_order.pop_front() {
                if self.sent.remove(&oldest).is_some() {
                    debug!("Forgetting unanswered action {}", oldest);
                }
            }
        }
        self.last_action_id = Some(action_id.to_string());
    }

    pub fn last_action_id(&self) -> Option<&str> {
        self.last_action_id.as_deref()
    }

    /// Store a response, overwriting any earlier one with the same id.
    /// A response without an action id is filed under the last sent one.
    pub fn on_response(&mut self, mut response: Response) {
        let action_id = match response.action_id() {
            Some(action_id) => action_id.to_string(),
            None => match &self.last_action_id {
                Some(last) => {
                    trace!("Response without ActionID, assuming {}", last);
                    response.set_action_id(last);
                    last.clone()
                }
                None => {
                    debug!("Dropping response without ActionID, no action was sent");
                    return;
                }
            },
        };

        if !self.policy_for(&action_id).starts_complete(&response) {
            response.set_pending();
        }
        debug!(
            "Response {} for action {} ({})",
            response.status(),
            action_id,
            if response.is_complete() { "complete" } else { "pending" }
        );
        self.responses.insert(action_id, response);
    }

    /// Attach the event to its pending response, or hand it back for
    /// dispatch
    pub fn on_event(&mut self, event: Event) -> Correlation {
        let Some(action_id) = event.action_id().map(str::to_string) else {
            return Correlation::Deliver(event);
        };
        let policy = self.policy_for(&action_id);
        let Some(response) = self.responses.get_mut(&action_id) else {
            return Correlation::Deliver(event);
        };

        let completes = policy.completes(response, &event);
        match response.add_event(event) {
            Ok(()) => {
                if completes {
                    response.mark_complete();
                    debug!("Response for action {} complete with {} events", action_id, response.events().len());
                }
                Correlation::Buffered
            }
            Err(event) => Correlation::Deliver(event),
        }
    }

    /// Attach a continuation block to its pending response. Returns false
    /// when there is nothing to attach it to.
    pub fn on_continuation(&mut self, event: Event) -> bool {
        match self.on_event(event) {
            Correlation::Buffered => true,
            Correlation::Deliver(event) => {
                trace!("Dropping continuation for action {:?}", event.action_id());
                false
            }
        }
    }

    pub fn response(&self, action_id: &str) -> Option<&Response> {
        self.responses.get(action_id)
    }

    /// Remove and return a response together with its attached events
    pub fn take_response(&mut self, action_id: &str) -> Option<Response> {
        self.sent.remove(action_id);
        self.responses.remove(action_id)
    }

    /// Remove and return every complete response. Pending ones stay until
    /// their list ends.
    pub fn drain_complete(&mut self) -> Vec<Response> {
        let complete: Vec<String> = self
            .responses
            .iter()
            .filter(|(_, response)| response.is_complete())
            .map(|(action_id, _)| action_id.clone())
            .collect();

        complete
            .into_iter()
            .filter_map(|action_id| self.take_response(&action_id))
            .collect()
    }

    /// Number of responses currently retained
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Number of sent actions still waiting for a response
    pub fn in_flight(&self) -> usize {
        self.sent.len()
    }

    fn policy_for(&self, action_id: &str) -> Arc<dyn CompletionPolicy> {
        self.sent
            .get(action_id)
            .and_then(|action| self.policies.get(&action.to_ascii_lowercase()))
            .unwrap_or(&self.fallback)
            .clone()
    }
}

impl Default for ResponseCorrelator {
    fn default() -> Self {
        Self::new()
    }
}
