//! Challenge data structures.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One CTF challenge as observed on the platform listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Challenge {
    /// Stable identifier (URL slug), unique across the platform
    pub id: String,

    /// Display title
    pub name: String,

    /// Classification tag (e.g., "web", "crypto")
    pub category: String,

    /// Score value; may change over time under dynamic scoring
    pub points: u32,

    /// Number of solves; non-decreasing under normal platform behavior
    pub solve_count: u32,

    /// Full URL to the challenge detail page
    pub url: String,
}

/// Last-seen challenge records, keyed by challenge id.
///
/// The state store is the single source of truth for "previous" data;
/// no other component caches this across ticks.
pub type PersistedState = BTreeMap<String, Challenge>;

/// One full point-in-time capture of the platform listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// When the listing was captured
    pub captured_at: DateTime<Utc>,

    /// Challenges in listing order; ids are unique within a snapshot
    pub challenges: Vec<Challenge>,
}

impl Snapshot {
    /// Create a snapshot stamped with the current time.
    pub fn new(challenges: Vec<Challenge>) -> Self {
        Self {
            captured_at: Utc::now(),
            challenges,
        }
    }

    /// Build the persisted-state image of this snapshot.
    pub fn to_state(&self) -> PersistedState {
        self.challenges
            .iter()
            .map(|c| (c.id.clone(), c.clone()))
            .collect()
    }
}
