//! Change events produced by reconciliation.

use serde::{Deserialize, Serialize};

use crate::models::Challenge;

/// One observed change between the previous state and a new snapshot.
///
/// Events carry no identity of their own: they are produced fresh each
/// reconciliation and only their downstream effects (announcement, updated
/// state) are durable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChangeEvent {
    /// Challenge id present in the new snapshot but absent from state
    Created(Challenge),

    /// Challenge present in both, with a strictly higher solve count
    SolveCountIncreased {
        challenge: Challenge,
        previous: u32,
        new: u32,
    },

    /// Challenge id present in state but absent from the new snapshot
    Removed { id: String, name: String },
}

impl ChangeEvent {
    /// One-line announcement text for this event.
    pub fn headline(&self) -> String {
        match self {
            ChangeEvent::Created(c) => format!(
                "🆕 New challenge: **{}** [{}] {}pts — {}",
                c.name, c.category, c.points, c.url
            ),
            ChangeEvent::SolveCountIncreased {
                challenge,
                previous,
                new,
            } => format!(
                "📈 **{}** solves: {} → {}",
                challenge.name, previous, new
            ),
            ChangeEvent::Removed { name, .. } => {
                format!("🗑️ Challenge removed: **{}**", name)
            }
        }
    }
}
