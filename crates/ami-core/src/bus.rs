//! Listener registry and dispatch
//!
//! Listeners are invoked synchronously, in registration order, for every
//! message that passes their optional predicate. Each dispatch works on a
//! snapshot of the registry taken when it starts.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::message::IncomingMessage;

/// Receives dispatched manager messages
pub trait Listener: Send + Sync {
    fn handle(&self, message: &IncomingMessage);
}

impl<F> Listener for F
where
    F: Fn(&IncomingMessage) + Send + Sync,
{
    fn handle(&self, message: &IncomingMessage) {
        self(message)
    }
}

/// Gate deciding whether a listener sees a message
pub type Predicate = Arc<dyn Fn(&IncomingMessage) -> bool + Send + Sync>;

/// Token returned by [`EventBus::register`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

#[derive(Clone)]
struct ListenerEntry {
    listener: Arc<dyn Listener>,
    predicate: Option<Predicate>,
}

/// Ordered registry of listeners
#[derive(Default)]
pub struct EventBus {
    // Tokens grow monotonically, so key order is registration order
    listeners: BTreeMap<ListenerId, ListenerEntry>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a listener, optionally gated by a predicate
    pub fn register(&mut self, listener: Arc<dyn Listener>, predicate: Option<Predicate>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.insert(id, ListenerEntry { listener, predicate });
        trace!("Registered {}", id);
        id
    }

    /// Add a plain closure as a listener
    pub fn register_fn<F>(&mut self, listener: F) -> ListenerId
    where
        F: Fn(&IncomingMessage) + Send + Sync + 'static,
    {
        self.register(Arc::new(listener), None)
    }

    /// Remove a listener. Returns false if the token is unknown.
    pub fn unregister(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    /// Deliver a message to every matching listener
    pub fn dispatch(&self, message: &IncomingMessage) {
        let snapshot: Vec<ListenerEntry> = self.listeners.values().cloned().collect();
        for entry in snapshot {
            if let Some(predicate) = &entry.predicate {
                if !predicate(message) {
                    continue;
                }
            }
            entry.listener.handle(message);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
