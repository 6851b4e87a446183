use super::{HeaderTable, ACTION_ID};

/// Name given to events synthesized from headerless continuation blocks
pub const CONTINUATION_EVENT: &str = "ResponseEvent";

/// An asynchronous notification from the switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    headers: HeaderTable,
}

impl Event {
    pub fn new(headers: HeaderTable) -> Self {
        Self { headers }
    }

    /// Build the placeholder event for a block that had neither a `Response`
    /// nor an `Event` header. It is tagged with the action that was most
    /// recently sent so it can still be attached to that action's response.
    pub fn continuation(action_id: &str, fragment: HeaderTable) -> Self {
        let mut headers = HeaderTable::new();
        headers.append("Event", CONTINUATION_EVENT);
        headers.append(ACTION_ID, action_id);
        for field in fragment.iter() {
            headers.append(field.name.clone(), field.value.clone());
        }
        Self { headers }
    }

    /// Value of the `Event` header
    pub fn name(&self) -> &str {
        self.headers.get("Event").unwrap_or_default()
    }

    /// Sub-event name of a `UserEvent`
    pub fn user_event_name(&self) -> Option<&str> {
        self.headers.get_non_empty("UserEvent")
    }

    pub fn action_id(&self) -> Option<&str> {
        self.headers.get_non_empty(ACTION_ID)
    }

    pub fn is_continuation(&self) -> bool {
        self.name() == CONTINUATION_EVENT
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    pub fn headers(&self) -> &HeaderTable {
        &self.headers
    }
}
