//! Identity registry: one entity per user id and per event id.

pub mod model;

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::record::model::SubmitRecord;
use model::{EventAttrs, EventEntity, UserEntity};

/// Owns every user and event entity of a pipeline run.
///
/// Registering an id that is already present returns the existing entity with
/// the new attribute values applied (last write wins). Overwrites that change a
/// value are counted and logged, since conflicting source rows usually point at
/// a data problem upstream.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
    users: BTreeMap<String, UserEntity>,
    events: BTreeMap<String, EventEntity>,
    conflicts: usize,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry in one pass over normalized records.
    ///
    /// Per row the raising user is registered first, then the invited user,
    /// then the event.
    pub fn from_records(records: &[SubmitRecord]) -> Self {
        let mut registry = Self::new();
        for record in records {
            registry.register_user(&record.user_id, &record.company_id);
            registry.register_user(&record.invited_user_id, &record.invited_company_id);
            registry.register_event(
                &record.event_id,
                EventAttrs {
                    event_name: record.event_name.clone(),
                    date: record.date.clone(),
                    step_id: record.step_id.clone(),
                    environment_id: record.environment_id.clone(),
                },
            );
        }
        debug!(
            users = registry.users.len(),
            events = registry.events.len(),
            conflicts = registry.conflicts,
            "Built identity registry"
        );
        registry
    }

    /// Register a user, or update the one already known under `id`.
    pub fn register_user(&mut self, id: &str, company_id: &str) -> &UserEntity {
        match self.users.entry(id.to_string()) {
            Entry::Vacant(slot) => slot.insert(UserEntity {
                id: id.to_string(),
                company_id: company_id.to_string(),
            }),
            Entry::Occupied(slot) => {
                let user = slot.into_mut();
                if user.company_id != company_id {
                    warn!(
                        user_id = id,
                        previous = %user.company_id,
                        current = company_id,
                        "Conflicting company_id for user, keeping last seen"
                    );
                    self.conflicts += 1;
                    user.company_id = company_id.to_string();
                }
                user
            }
        }
    }

    /// Register an event, or update the one already known under `id`.
    pub fn register_event(&mut self, id: &str, attrs: EventAttrs) -> &EventEntity {
        match self.events.entry(id.to_string()) {
            Entry::Vacant(slot) => slot.insert(attrs.into_entity(id)),
            Entry::Occupied(slot) => {
                let event = slot.into_mut();
                if attrs.apply(event) {
                    warn!(event_id = id, "Conflicting attributes for event, keeping last seen");
                    self.conflicts += 1;
                }
                event
            }
        }
    }

    pub fn user(&self, id: &str) -> Option<&UserEntity> {
        self.users.get(id)
    }

    pub fn event(&self, id: &str) -> Option<&EventEntity> {
        self.events.get(id)
    }

    /// All registered users, ordered by id.
    pub fn all_users(&self) -> impl Iterator<Item = &UserEntity> {
        self.users.values()
    }

    /// All registered events, ordered by id.
    pub fn all_events(&self) -> impl Iterator<Item = &EventEntity> {
        self.events.values()
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Number of registrations that overwrote a differing attribute value.
    pub fn conflicts(&self) -> usize {
        self.conflicts
    }

    /// Hand over every entity, ending the registry's lifetime.
    pub fn into_entities(self) -> (Vec<UserEntity>, Vec<EventEntity>) {
        (
            self.users.into_values().collect(),
            self.events.into_values().collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(name: &str, date: &str) -> EventAttrs {
        EventAttrs {
            event_name: name.to_string(),
            date: date.to_string(),
            step_id: "S1".to_string(),
            environment_id: "env".to_string(),
        }
    }

    fn record(
        user: &str,
        company: &str,
        event: &str,
        invited: &str,
        invited_company: &str,
    ) -> SubmitRecord {
        SubmitRecord {
            event_id: event.to_string(),
            date: "2023-03-01 10:00:00".to_string(),
            environment_id: "env".to_string(),
            event_name: "Approve".to_string(),
            user_id: user.to_string(),
            flow_id: "F1".to_string(),
            flow_origin_id: "FO1".to_string(),
            company_id: company.to_string(),
            resource_id: "R1".to_string(),
            step_id: "S1".to_string(),
            invited_user_id: invited.to_string(),
            invited_company_id: invited_company.to_string(),
        }
    }

    #[test]
    fn test_one_entity_per_user_id() {
        let mut registry = IdentityRegistry::new();
        registry.register_user("U1", "C1");
        registry.register_user("U2", "C1");
        let again = registry.register_user("U1", "C1").clone();

        assert_eq!(again, UserEntity { id: "U1".to_string(), company_id: "C1".to_string() });
        assert_eq!(registry.user_count(), 2);
        assert_eq!(registry.conflicts(), 0);
    }

    #[test]
    fn test_last_write_wins_and_counts_conflicts() {
        let mut registry = IdentityRegistry::new();
        registry.register_user("U1", "C1");
        let updated = registry.register_user("U1", "C9");
        assert_eq!(updated.company_id, "C9");
        assert_eq!(registry.user_count(), 1);
        assert_eq!(registry.conflicts(), 1);

        registry.register_event("E1", attrs("Approve", "2023-03-01 10:00:00"));
        registry.register_event("E1", attrs("Approve", "2023-03-01 10:00:00"));
        assert_eq!(registry.conflicts(), 1);
        let event = registry.register_event("E1", attrs("Reject", "2023-03-02 09:00:00"));
        assert_eq!(event.event_name, "Reject");
        assert_eq!(event.date, "2023-03-02 09:00:00");
        assert_eq!(registry.event_count(), 1);
        assert_eq!(registry.conflicts(), 2);
    }

    #[test]
    fn test_from_records_registers_both_users() {
        let records = vec![
            record("U1", "C1", "E1", "U2", "C2"),
            record("U1", "C1", "E2", "U3", "C3"),
            record("U2", "C2", "E3", "U1", "C1"),
        ];
        let registry = IdentityRegistry::from_records(&records);

        let ids: Vec<&str> = registry.all_users().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["U1", "U2", "U3"]);
        let events: Vec<&str> = registry.all_events().map(|e| e.id.as_str()).collect();
        assert_eq!(events, vec!["E1", "E2", "E3"]);
        assert_eq!(registry.user("U3").map(|u| u.company_id.as_str()), Some("C3"));
        assert_eq!(registry.conflicts(), 0);
    }

    #[test]
    fn test_invited_company_overwrites_raiser_company_in_row_order() {
        // U1 raises with C1, then appears as invited with C7 on a later row.
        let records = vec![
            record("U1", "C1", "E1", "U2", "C2"),
            record("U2", "C2", "E2", "U1", "C7"),
        ];
        let registry = IdentityRegistry::from_records(&records);
        assert_eq!(registry.user("U1").map(|u| u.company_id.as_str()), Some("C7"));
        assert_eq!(registry.conflicts(), 1);
    }

    #[test]
    fn test_self_invitation_registers_one_user() {
        let registry = IdentityRegistry::from_records(&[record("U1", "C1", "E1", "U1", "C1")]);
        assert_eq!(registry.user_count(), 1);
        assert_eq!(registry.event_count(), 1);
    }

    #[test]
    fn test_into_entities() {
        let registry = IdentityRegistry::from_records(&[record("U1", "C1", "E1", "U2", "C2")]);
        let (users, events) = registry.into_entities();
        assert_eq!(users.len(), 2);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, "E1");
    }
}
