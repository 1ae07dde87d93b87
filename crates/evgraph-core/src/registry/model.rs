//! Graph node types.

use serde::{Deserialize, Serialize};

/// Node label of users in the graph.
pub const USER_LABEL: &str = "user";

/// Node label of events in the graph.
pub const EVENT_LABEL: &str = "event";

/// A user that raised or was invited to an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntity {
    pub id: String,
    pub company_id: String,
}

/// A submitted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEntity {
    pub id: String,
    pub event_name: String,
    /// Canonical `YYYY-MM-DD HH:MM:SS` timestamp.
    pub date: String,
    pub step_id: String,
    pub environment_id: String,
}

/// Attributes of an event, keyed separately from its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventAttrs {
    pub event_name: String,
    pub date: String,
    pub step_id: String,
    pub environment_id: String,
}

impl EventAttrs {
    fn matches(&self, event: &EventEntity) -> bool {
        self.event_name == event.event_name
            && self.date == event.date
            && self.step_id == event.step_id
            && self.environment_id == event.environment_id
    }

    /// Overwrite `event`'s attributes. Returns true if any value changed.
    pub(crate) fn apply(self, event: &mut EventEntity) -> bool {
        let changed = !self.matches(event);
        event.event_name = self.event_name;
        event.date = self.date;
        event.step_id = self.step_id;
        event.environment_id = self.environment_id;
        changed
    }

    pub(crate) fn into_entity(self, id: &str) -> EventEntity {
        EventEntity {
            id: id.to_string(),
            event_name: self.event_name,
            date: self.date,
            step_id: self.step_id,
            environment_id: self.environment_id,
        }
    }
}
