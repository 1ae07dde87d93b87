//! Graph relationship types.

use serde::{Deserialize, Serialize};

use crate::registry::model::{EVENT_LABEL, USER_LABEL};

/// The three relationship kinds derived from submit records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// (user)-[:raised]->(event)
    Raised,
    /// (event)-[:submitted_to]->(user)
    SubmittedTo,
    /// (user)-[:invited]->(user)
    Invited,
}

impl RelationshipKind {
    pub const ALL: [RelationshipKind; 3] = [Self::Raised, Self::SubmittedTo, Self::Invited];

    /// Relationship type name in the graph.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raised => "raised",
            Self::SubmittedTo => "submitted_to",
            Self::Invited => "invited",
        }
    }

    /// Node label of the source endpoint.
    pub fn source_label(&self) -> &'static str {
        match self {
            Self::Raised | Self::Invited => USER_LABEL,
            Self::SubmittedTo => EVENT_LABEL,
        }
    }

    /// Node label of the target endpoint.
    pub fn target_label(&self) -> &'static str {
        match self {
            Self::Raised => EVENT_LABEL,
            Self::SubmittedTo | Self::Invited => USER_LABEL,
        }
    }
}

impl std::fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed relationship, identified structurally by kind and endpoint ids.
///
/// Two relationships with the same kind, source and target are the same edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Relationship {
    pub kind: RelationshipKind,
    pub source: String,
    pub target: String,
}

impl Relationship {
    pub fn raised(user_id: &str, event_id: &str) -> Self {
        Self::new(RelationshipKind::Raised, user_id, event_id)
    }

    pub fn submitted_to(event_id: &str, user_id: &str) -> Self {
        Self::new(RelationshipKind::SubmittedTo, event_id, user_id)
    }

    pub fn invited(raiser_id: &str, invited_id: &str) -> Self {
        Self::new(RelationshipKind::Invited, raiser_id, invited_id)
    }

    fn new(kind: RelationshipKind, source: &str, target: &str) -> Self {
        Self {
            kind,
            source: source.to_string(),
            target: target.to_string(),
        }
    }

    /// A user-to-user edge whose endpoints are the same user.
    pub fn is_self_loop(&self) -> bool {
        self.kind.source_label() == self.kind.target_label() && self.source == self.target
    }
}
