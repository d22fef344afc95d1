// src/pipeline/tick.rs

//! One watcher tick: fetch → reconcile → announce → persist.

use crate::error::Result;
use crate::notify::Notifier;
use crate::pipeline::reconcile::reconcile;
use crate::services::ChallengeSource;
use crate::storage::StateStore;

/// Summary of a completed tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub challenge_count: usize,
    pub created: usize,
    pub solves_increased: usize,
    pub removed: usize,
    pub messages_sent: usize,
}

/// Execute a single tick against the given collaborators.
///
/// Any failure aborts before `save`, so the persisted state stays at the
/// last successful baseline and the next attempt re-diffs against it. In
/// particular a delivery failure means the same events are recomputed and
/// re-announced on the next tick.
pub async fn run_tick(
    source: &dyn ChallengeSource,
    store: &dyn StateStore,
    notifier: &Notifier,
) -> Result<TickReport> {
    let previous = store.load().await?;
    let snapshot = source.fetch().await?;

    let result = reconcile(&previous, &snapshot);
    let (created, solves_increased, removed) = result.counts();

    if result.has_changes() {
        log::info!(
            "Changes: {} created, {} solve increases, {} removed",
            created,
            solves_increased,
            removed
        );
    } else {
        log::debug!("No changes ({} challenges)", snapshot.challenges.len());
    }

    let messages_sent = notifier.announce(&result.events).await?;
    store.save(&result.next_state).await?;

    Ok(TickReport {
        challenge_count: snapshot.challenges.len(),
        created,
        solves_increased,
        removed,
        messages_sent,
    })
}
