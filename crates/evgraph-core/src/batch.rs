//! The node and relationship set handed to the graph in one write.

use std::collections::HashSet;

use serde::Serialize;
use tracing::info;

use crate::error::{CoreResult, EvgraphError};
use crate::record::model::SubmitRecord;
use crate::registry::model::{EventEntity, UserEntity, EVENT_LABEL};
use crate::registry::IdentityRegistry;
use crate::relationship::model::Relationship;
use crate::relationship::{derive_relationships, RelationshipIndex};

/// Immutable result of one pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GraphBatch {
    pub users: Vec<UserEntity>,
    pub events: Vec<EventEntity>,
    pub relationships: Vec<Relationship>,
    /// Relationships emitted before de-duplication.
    #[serde(skip)]
    pub emitted_relationships: usize,
    /// Registrations that overwrote a differing attribute.
    #[serde(skip)]
    pub identity_conflicts: usize,
}

impl GraphBatch {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.events.is_empty() && self.relationships.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.users.len() + self.events.len()
    }

    /// Every relationship endpoint must be a node of this batch.
    pub fn check_referential_completeness(&self) -> CoreResult<()> {
        let users: HashSet<&str> = self.users.iter().map(|u| u.id.as_str()).collect();
        let events: HashSet<&str> = self.events.iter().map(|e| e.id.as_str()).collect();
        let present = |label: &str, id: &str| {
            if label == EVENT_LABEL {
                events.contains(id)
            } else {
                users.contains(id)
            }
        };

        for rel in &self.relationships {
            if !present(rel.kind.source_label(), &rel.source) {
                return Err(EvgraphError::invariant(format!(
                    "{} relationship source '{}' has no {} node",
                    rel.kind,
                    rel.source,
                    rel.kind.source_label()
                )));
            }
            if !present(rel.kind.target_label(), &rel.target) {
                return Err(EvgraphError::invariant(format!(
                    "{} relationship target '{}' has no {} node",
                    rel.kind,
                    rel.target,
                    rel.kind.target_label()
                )));
            }
        }
        Ok(())
    }
}

/// Turn normalized records into a duplicate-free, referentially complete batch.
pub fn build_batch(records: &[SubmitRecord]) -> CoreResult<GraphBatch> {
    let registry = IdentityRegistry::from_records(records);
    let index = RelationshipIndex::build(records);
    let derived = derive_relationships(&index, &registry)?;

    let identity_conflicts = registry.conflicts();
    let emitted_relationships = derived.emitted();
    let (users, events) = registry.into_entities();

    let batch = GraphBatch {
        users,
        events,
        relationships: derived.into_vec(),
        emitted_relationships,
        identity_conflicts,
    };
    batch.check_referential_completeness()?;

    info!(
        users = batch.users.len(),
        events = batch.events.len(),
        relationships = batch.relationships.len(),
        emitted = batch.emitted_relationships,
        conflicts = batch.identity_conflicts,
        "Built graph batch"
    );

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(user: &str, event: &str, invited: &str) -> SubmitRecord {
        SubmitRecord {
            event_id: event.to_string(),
            date: "2023-03-01 10:00:00".to_string(),
            environment_id: "env".to_string(),
            event_name: "Approve".to_string(),
            user_id: user.to_string(),
            flow_id: "F1".to_string(),
            flow_origin_id: "FO1".to_string(),
            company_id: "C1".to_string(),
            resource_id: "R1".to_string(),
            step_id: "S1".to_string(),
            invited_user_id: invited.to_string(),
            invited_company_id: "C2".to_string(),
        }
    }

    #[test]
    fn test_duplicate_rows_example() {
        let batch = build_batch(&[record("U1", "E1", "U2"), record("U1", "E1", "U2")]).unwrap();

        let users: Vec<&str> = batch.users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(users, vec!["U1", "U2"]);
        assert_eq!(batch.events.len(), 1);
        assert_eq!(batch.relationships.len(), 3);
        assert_eq!(batch.emitted_relationships, 5);
        assert_eq!(batch.node_count(), 3);
    }

    #[test]
    fn test_every_endpoint_is_a_node() {
        let batch = build_batch(&[
            record("U1", "E1", "U2"),
            record("U2", "E2", "U3"),
            record("U3", "E3", "U3"),
            record("U1", "E2", "U4"),
        ])
        .unwrap();
        assert!(batch.check_referential_completeness().is_ok());

        let user_ids: HashSet<&str> = batch.users.iter().map(|u| u.id.as_str()).collect();
        let event_ids: HashSet<&str> = batch.events.iter().map(|e| e.id.as_str()).collect();
        for rel in &batch.relationships {
            let (sources, targets) = match rel.kind.source_label() {
                EVENT_LABEL => (&event_ids, &user_ids),
                _ if rel.kind.target_label() == EVENT_LABEL => (&user_ids, &event_ids),
                _ => (&user_ids, &user_ids),
            };
            assert!(sources.contains(rel.source.as_str()));
            assert!(targets.contains(rel.target.as_str()));
        }
    }

    #[test]
    fn test_dangling_relationship_is_rejected() {
        let mut batch = build_batch(&[record("U1", "E1", "U2")]).unwrap();
        batch.relationships.push(Relationship::invited("U1", "U9"));
        let err = batch.check_referential_completeness().unwrap_err();
        assert!(matches!(err, EvgraphError::InvariantViolation(_)));
    }

    #[test]
    fn test_empty_records_make_empty_batch() {
        let batch = build_batch(&[]).unwrap();
        assert!(batch.is_empty());
        assert_eq!(batch.node_count(), 0);
    }

    #[test]
    fn test_serializes_for_inspection() {
        let batch = build_batch(&[record("U1", "E1", "U2")]).unwrap();
        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["users"].as_array().map(Vec::len), Some(2));
        assert_eq!(json["relationships"][0]["kind"], "raised");
        assert!(json.get("emitted_relationships").is_none());
    }
}
