//! Reconciliation of a new snapshot against the persisted state.
//!
//! Pure function, no I/O, no internal state: given the previously persisted
//! challenges and a freshly captured snapshot, computes the ordered change
//! events and the state to persist next.

use std::collections::HashSet;

use crate::models::{ChangeEvent, PersistedState, Snapshot};

/// Result of one reconciliation.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// Events in announcement order: Created first (listing order), then
    /// SolveCountIncreased (listing order), then Removed (id ascending)
    pub events: Vec<ChangeEvent>,

    /// Exactly the challenges of the snapshot; removed ids are dropped
    pub next_state: PersistedState,
}

impl Reconciliation {
    /// Check if there are any changes.
    pub fn has_changes(&self) -> bool {
        !self.events.is_empty()
    }

    /// Event counts as (created, solves_increased, removed).
    pub fn counts(&self) -> (usize, usize, usize) {
        let mut counts = (0, 0, 0);
        for event in &self.events {
            match event {
                ChangeEvent::Created(_) => counts.0 += 1,
                ChangeEvent::SolveCountIncreased { .. } => counts.1 += 1,
                ChangeEvent::Removed { .. } => counts.2 += 1,
            }
        }
        counts
    }
}

/// Compute change events and the next persisted state.
///
/// A solve count lower than the persisted one (platform data regression) is
/// not newsworthy: it produces no event, but `next_state` still reflects the
/// lower value. A challenge id that disappears and later reappears is
/// reported as created again; no tombstone is kept.
pub fn reconcile(previous: &PersistedState, current: &Snapshot) -> Reconciliation {
    let mut events = Vec::new();

    for challenge in &current.challenges {
        if !previous.contains_key(&challenge.id) {
            events.push(ChangeEvent::Created(challenge.clone()));
        }
    }

    for challenge in &current.challenges {
        if let Some(prev) = previous.get(&challenge.id) {
            if challenge.solve_count > prev.solve_count {
                events.push(ChangeEvent::SolveCountIncreased {
                    challenge: challenge.clone(),
                    previous: prev.solve_count,
                    new: challenge.solve_count,
                });
            }
        }
    }

    let current_ids: HashSet<&str> = current
        .challenges
        .iter()
        .map(|c| c.id.as_str())
        .collect();

    // BTreeMap iteration gives the id-ascending tie-break order.
    for (id, challenge) in previous {
        if !current_ids.contains(id.as_str()) {
            events.push(ChangeEvent::Removed {
                id: id.clone(),
                name: challenge.name.clone(),
            });
        }
    }

    Reconciliation {
        events,
        next_state: current.to_state(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Challenge;

    fn make_challenge(id: &str, solves: u32) -> Challenge {
        Challenge {
            id: id.to_string(),
            name: format!("Challenge {id}"),
            category: "web".to_string(),
            points: 100,
            solve_count: solves,
            url: format!("https://alpacahack.com/challenges/{id}"),
        }
    }

    fn state_of(entries: &[(&str, u32)]) -> PersistedState {
        entries
            .iter()
            .map(|(id, solves)| (id.to_string(), make_challenge(id, *solves)))
            .collect()
    }

    fn snapshot_of(entries: &[(&str, u32)]) -> Snapshot {
        Snapshot::new(
            entries
                .iter()
                .map(|(id, solves)| make_challenge(id, *solves))
                .collect(),
        )
    }

    #[test]
    fn test_no_changes() {
        let previous = state_of(&[("a", 3), ("b", 0)]);
        let current = snapshot_of(&[("a", 3), ("b", 0)]);

        let result = reconcile(&previous, &current);
        assert!(!result.has_changes());
        assert_eq!(result.next_state, previous);
    }

    #[test]
    fn test_created_and_increase_ordering() {
        // previous = {A: 3}; snapshot = {A: 5, B: 0}
        let previous = state_of(&[("a", 3)]);
        let current = snapshot_of(&[("a", 5), ("b", 0)]);

        let result = reconcile(&previous, &current);

        assert_eq!(result.events.len(), 2);
        assert!(matches!(&result.events[0], ChangeEvent::Created(c) if c.id == "b"));
        assert!(matches!(
            &result.events[1],
            ChangeEvent::SolveCountIncreased { challenge, previous: 3, new: 5 }
                if challenge.id == "a"
        ));
        assert_eq!(result.next_state["a"].solve_count, 5);
        assert_eq!(result.next_state["b"].solve_count, 0);
    }

    #[test]
    fn test_removed() {
        // previous = {A: 3, B: 0}; snapshot = {A: 3}
        let previous = state_of(&[("a", 3), ("b", 0)]);
        let current = snapshot_of(&[("a", 3)]);

        let result = reconcile(&previous, &current);

        assert_eq!(result.events.len(), 1);
        assert!(matches!(
            &result.events[0],
            ChangeEvent::Removed { id, .. } if id == "b"
        ));
        assert_eq!(result.next_state.len(), 1);
        assert!(result.next_state.contains_key("a"));
    }

    #[test]
    fn test_removed_sorted_by_id() {
        let previous = state_of(&[("zulu", 1), ("alpha", 1), ("mike", 1)]);
        let current = snapshot_of(&[]);

        let result = reconcile(&previous, &current);
        let removed_ids: Vec<&str> = result
            .events
            .iter()
            .map(|e| match e {
                ChangeEvent::Removed { id, .. } => id.as_str(),
                other => panic!("unexpected event: {other:?}"),
            })
            .collect();
        assert_eq!(removed_ids, vec!["alpha", "mike", "zulu"]);
    }

    #[test]
    fn test_created_in_listing_order() {
        let previous = PersistedState::new();
        let current = snapshot_of(&[("zulu", 0), ("alpha", 0)]);

        let result = reconcile(&previous, &current);
        let created_ids: Vec<&str> = result
            .events
            .iter()
            .map(|e| match e {
                ChangeEvent::Created(c) => c.id.as_str(),
                other => panic!("unexpected event: {other:?}"),
            })
            .collect();
        // Listing order, not id order
        assert_eq!(created_ids, vec!["zulu", "alpha"]);
    }

    #[test]
    fn test_solve_count_decrease_is_silent() {
        let previous = state_of(&[("a", 10)]);
        let current = snapshot_of(&[("a", 4)]);

        let result = reconcile(&previous, &current);
        assert!(!result.has_changes());
        // State still follows the platform downward
        assert_eq!(result.next_state["a"].solve_count, 4);
    }

    #[test]
    fn test_exactly_one_event_per_increase() {
        let previous = state_of(&[("a", 1)]);
        let current = snapshot_of(&[("a", 9)]);

        let result = reconcile(&previous, &current);
        assert_eq!(result.counts(), (0, 1, 0));
    }

    #[test]
    fn test_idempotent() {
        let previous = state_of(&[("a", 3), ("b", 7)]);
        let current = snapshot_of(&[("a", 5), ("c", 0)]);

        let first = reconcile(&previous, &current);
        let second = reconcile(&previous, &current);

        assert_eq!(first.events, second.events);
        assert_eq!(first.next_state, second.next_state);
    }

    #[test]
    fn test_second_tick_with_same_snapshot_is_quiet() {
        let previous = PersistedState::new();
        let current = snapshot_of(&[("a", 2), ("b", 0)]);

        let first = reconcile(&previous, &current);
        assert_eq!(first.counts(), (2, 0, 0));

        let second = reconcile(&first.next_state, &current);
        assert!(!second.has_changes());
        assert_eq!(second.next_state, first.next_state);
    }

    #[test]
    fn test_reappearing_id_is_created_again() {
        let previous = state_of(&[("a", 3)]);

        let gone = reconcile(&previous, &snapshot_of(&[]));
        assert_eq!(gone.counts(), (0, 0, 1));

        let back = reconcile(&gone.next_state, &snapshot_of(&[("a", 3)]));
        assert_eq!(back.counts(), (1, 0, 0));
    }

    #[test]
    fn test_mixed_changes() {
        let previous = state_of(&[("keep", 5), ("bump", 2), ("drop", 1)]);
        let current = snapshot_of(&[("keep", 5), ("bump", 6), ("fresh", 0)]);

        let result = reconcile(&previous, &current);
        assert_eq!(result.counts(), (1, 1, 1));
        assert!(matches!(&result.events[0], ChangeEvent::Created(c) if c.id == "fresh"));
        assert!(matches!(
            &result.events[1],
            ChangeEvent::SolveCountIncreased { challenge, .. } if challenge.id == "bump"
        ));
        assert!(matches!(&result.events[2], ChangeEvent::Removed { id, .. } if id == "drop"));
    }
}
