//! Storage abstractions for persisted watcher state.
//!
//! The state file is the single source of truth for "previously observed"
//! challenge data. It is read at the start of every tick and overwritten
//! atomically at the end of every successful tick.

pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::PersistedState;

// Re-export for convenience
pub use local::LocalStateStore;

/// On-disk wrapper for the persisted state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateData {
    /// ISO 8601 timestamp of last successful save
    pub updated_at: DateTime<Utc>,
    /// Tracked challenge count
    pub count: usize,
    /// Last-seen challenge records keyed by id
    pub challenges: PersistedState,
}

impl StateData {
    pub fn new(challenges: PersistedState) -> Self {
        Self {
            updated_at: Utc::now(),
            count: challenges.len(),
            challenges,
        }
    }
}

/// Trait for durable state backends.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Load the last persisted state.
    ///
    /// Returns an empty state, not an error, when no prior state exists
    /// (first run).
    async fn load(&self) -> Result<PersistedState>;

    /// Persist the given state, atomically with respect to process crash.
    ///
    /// After a successful save, `load()` returns exactly the state passed
    /// in.
    async fn save(&self, state: &PersistedState) -> Result<()>;
}
