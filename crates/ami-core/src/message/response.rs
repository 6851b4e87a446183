use super::{Event, HeaderTable, ACTION_ID};

/// The switch's direct reply to an action.
///
/// A response may be followed by a list of events that belong to it (for
/// example the entries of a `QueueStatus`). Those are attached here until the
/// response is marked complete. Completion is one-way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    headers: HeaderTable,
    events: Vec<Event>,
    complete: bool,
}

impl Response {
    /// Create a response. It starts complete until the correlator decides
    /// otherwise.
    pub fn new(headers: HeaderTable) -> Self {
        Self {
            headers,
            events: Vec::new(),
            complete: true,
        }
    }

    /// Value of the `Response` header (`Success`, `Error`, `Follows`, ...)
    pub fn status(&self) -> &str {
        self.headers.get("Response").unwrap_or_default()
    }

    pub fn is_success(&self) -> bool {
        self.status().eq_ignore_ascii_case("Success")
    }

    /// Value of the `Message` header
    pub fn message(&self) -> Option<&str> {
        self.headers.get_non_empty("Message")
    }

    pub fn action_id(&self) -> Option<&str> {
        self.headers.get_non_empty(ACTION_ID)
    }

    pub fn set_action_id(&mut self, action_id: &str) {
        self.headers.set(ACTION_ID, action_id);
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Reopen a freshly received response so events can be attached.
    /// Has no effect once events are attached.
    pub(crate) fn set_pending(&mut self) {
        if self.events.is_empty() {
            self.complete = false;
        }
    }

    pub(crate) fn mark_complete(&mut self) {
        self.complete = true;
    }

    /// Attach an event. Returns the event back if the response is already
    /// complete.
    pub(crate) fn add_event(&mut self, event: Event) -> Result<(), Event> {
        if self.complete {
            return Err(event);
        }
        self.events.push(event);
        Ok(())
    }

    /// Events attached so far, in arrival order
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    pub fn headers(&self) -> &HeaderTable {
        &self.headers
    }
}
