//! Relationship derivation from grouped submit records.
//!
//! Produces, per (raiser, event) group:
//! - (user)-[:raised]->(event), once per group
//! - (event)-[:submitted_to]->(user), once per row
//! - (user)-[:invited]->(user), once per row
//!
//! and then collapses everything to one edge per (kind, source, target).

pub mod model;

use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::error::{CoreResult, EvgraphError};
use crate::record::model::SubmitRecord;
use crate::registry::IdentityRegistry;
use model::Relationship;

/// Invited user ids of one (raiser, event) group, in row order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventGroup {
    pub event_id: String,
    pub invited: Vec<String>,
}

/// All events raised by one user, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RaiserGroup {
    pub raiser_id: String,
    pub events: Vec<EventGroup>,
}

/// Index of raiser -> event -> invited users, built in one pass.
#[derive(Debug, Clone, Default)]
pub struct RelationshipIndex {
    groups: Vec<RaiserGroup>,
}

impl RelationshipIndex {
    pub fn build(records: &[SubmitRecord]) -> Self {
        let mut groups: Vec<RaiserGroup> = Vec::new();
        let mut raiser_pos: HashMap<&str, usize> = HashMap::new();
        let mut event_pos: HashMap<(&str, &str), usize> = HashMap::new();

        for record in records {
            let raiser = record.user_id.as_str();
            let event = record.event_id.as_str();

            let r = *raiser_pos.entry(raiser).or_insert_with(|| {
                groups.push(RaiserGroup {
                    raiser_id: raiser.to_string(),
                    events: Vec::new(),
                });
                groups.len() - 1
            });
            let group = &mut groups[r];

            let e = *event_pos.entry((raiser, event)).or_insert_with(|| {
                group.events.push(EventGroup {
                    event_id: event.to_string(),
                    invited: Vec::new(),
                });
                group.events.len() - 1
            });
            group.events[e].invited.push(record.invited_user_id.clone());
        }

        Self { groups }
    }

    pub fn groups(&self) -> &[RaiserGroup] {
        &self.groups
    }
}

/// De-duplicated relationships plus the number emitted before de-duplication.
#[derive(Debug, Clone, Default)]
pub struct DerivedRelationships {
    relationships: BTreeSet<Relationship>,
    emitted: usize,
}

impl DerivedRelationships {
    /// Unique relationships, ordered by (kind, source, target).
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.relationships.iter()
    }

    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    /// Relationships produced before collapsing duplicates.
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    pub fn contains(&self, relationship: &Relationship) -> bool {
        self.relationships.contains(relationship)
    }

    pub fn into_vec(self) -> Vec<Relationship> {
        self.relationships.into_iter().collect()
    }

    fn push(&mut self, relationship: Relationship) {
        self.emitted += 1;
        self.relationships.insert(relationship);
    }
}

/// Derive every relationship of the index against a populated registry.
///
/// Invited edges are keyed on (raiser, invited) only, so the same pair seen
/// under different events is one edge. An id missing from the registry means
/// the registry was not built from the same records and is reported as an
/// [`EvgraphError::InvariantViolation`].
pub fn derive_relationships(
    index: &RelationshipIndex,
    registry: &IdentityRegistry,
) -> CoreResult<DerivedRelationships> {
    let mut derived = DerivedRelationships::default();

    for group in index.groups() {
        let raiser = registry.user(&group.raiser_id).ok_or_else(|| {
            EvgraphError::invariant(format!(
                "raising user '{}' is not registered",
                group.raiser_id
            ))
        })?;

        for event_group in &group.events {
            let event = registry.event(&event_group.event_id).ok_or_else(|| {
                EvgraphError::invariant(format!(
                    "event '{}' is not registered",
                    event_group.event_id
                ))
            })?;

            derived.push(Relationship::raised(&raiser.id, &event.id));

            for invited_id in &event_group.invited {
                let invited = registry.user(invited_id).ok_or_else(|| {
                    EvgraphError::invariant(format!(
                        "invited user '{invited_id}' is not registered"
                    ))
                })?;

                derived.push(Relationship::submitted_to(&event.id, &invited.id));
                derived.push(Relationship::invited(&raiser.id, &invited.id));
            }
        }
    }

    debug!(
        emitted = derived.emitted(),
        unique = derived.len(),
        "Derived relationships"
    );

    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::model::RelationshipKind;

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

    fn derive(records: &[SubmitRecord]) -> DerivedRelationships {
        let registry = IdentityRegistry::from_records(records);
        derive_relationships(&RelationshipIndex::build(records), &registry).unwrap()
    }

    #[test]
    fn test_index_groups_in_first_seen_order() {
        let records = vec![
            record("U2", "E5", "U1"),
            record("U1", "E1", "U2"),
            record("U2", "E4", "U3"),
            record("U1", "E1", "U3"),
        ];
        let index = RelationshipIndex::build(&records);
        let groups = index.groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].raiser_id, "U2");
        assert_eq!(groups[0].events.len(), 2);
        assert_eq!(groups[0].events[0].event_id, "E5");
        assert_eq!(groups[0].events[1].event_id, "E4");
        assert_eq!(groups[1].events[0].invited, vec!["U2", "U3"]);
    }

    #[test]
    fn test_exact_duplicate_rows_yield_one_edge_each() {
        let derived = derive(&[record("U1", "E1", "U2"), record("U1", "E1", "U2")]);

        assert_eq!(
            derived.into_vec(),
            vec![
                Relationship::raised("U1", "E1"),
                Relationship::submitted_to("E1", "U2"),
                Relationship::invited("U1", "U2"),
            ]
        );
    }

    #[test]
    fn test_invited_edge_is_global_per_pair() {
        let derived = derive(&[record("U1", "E1", "U2"), record("U1", "E2", "U2")]);

        let count = |kind: RelationshipKind| {
            derived.relationships().filter(|r| r.kind == kind).count()
        };
        assert_eq!(count(RelationshipKind::Raised), 2);
        assert_eq!(count(RelationshipKind::SubmittedTo), 2);
        assert_eq!(count(RelationshipKind::Invited), 1);
        assert!(derived.contains(&Relationship::invited("U1", "U2")));
        assert_eq!(derived.emitted(), 6);
        assert_eq!(derived.len(), 5);
    }

    #[test]
    fn test_event_with_many_invitees() {
        let derived = derive(&[
            record("U1", "E1", "U2"),
            record("U1", "E1", "U3"),
            record("U1", "E1", "U4"),
        ]);
        assert_eq!(derived.len(), 1 + 3 + 3);
        assert!(derived.contains(&Relationship::submitted_to("E1", "U4")));
        assert!(derived.contains(&Relationship::invited("U1", "U3")));
    }

    #[test]
    fn test_self_invitation_is_a_self_loop() {
        let derived = derive(&[record("U1", "E1", "U1")]);
        assert!(derived.contains(&Relationship::raised("U1", "E1")));
        assert!(derived.contains(&Relationship::submitted_to("E1", "U1")));
        let invited = Relationship::invited("U1", "U1");
        assert!(invited.is_self_loop());
        assert!(derived.contains(&invited));
        assert_eq!(derived.len(), 3);
    }

    #[test]
    fn test_distinct_raisers_of_same_event() {
        let derived = derive(&[record("U1", "E1", "U3"), record("U2", "E1", "U3")]);
        assert!(derived.contains(&Relationship::raised("U1", "E1")));
        assert!(derived.contains(&Relationship::raised("U2", "E1")));
        assert_eq!(
            derived
                .relationships()
                .filter(|r| r.kind == RelationshipKind::SubmittedTo)
                .count(),
            1
        );
    }

    #[test]
    fn test_empty_input() {
        let derived = derive(&[]);
        assert!(derived.is_empty());
        assert_eq!(derived.emitted(), 0);
    }

    #[test]
    fn test_unregistered_id_is_invariant_violation() {
        let records = vec![record("U1", "E1", "U2")];
        let index = RelationshipIndex::build(&records);
        let registry = IdentityRegistry::new();
        let err = derive_relationships(&index, &registry).unwrap_err();
        assert!(matches!(err, EvgraphError::InvariantViolation(_)));
    }
}
