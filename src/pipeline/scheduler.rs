// src/pipeline/scheduler.rs

//! Periodic tick scheduling with single-flight enforcement and backoff.
//!
//! The scheduler moves between three states: idle, running a tick, and
//! backing off after a failure. At most one tick runs at any time; a timer
//! fire or manual trigger arriving while a tick is in flight is dropped, not
//! queued. Consecutive failures grow the retry delay exponentially up to a
//! configured ceiling, so a failing remote platform is not hammered in a
//! tight loop but polling resumes promptly once it recovers.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use tokio::time::{Duration, Instant, MissedTickBehavior, interval};

use crate::error::AppError;
use crate::models::TrackerConfig;
use crate::notify::Notifier;
use crate::pipeline::tick::{TickReport, run_tick};
use crate::services::ChallengeSource;
use crate::storage::StateStore;

/// Outcome of one trigger.
#[derive(Debug)]
pub enum TickOutcome {
    /// The tick ran to completion
    Completed(TickReport),
    /// A tick was already in flight; this trigger was dropped
    Skipped,
    /// Still inside the backoff window; this trigger was deferred
    Deferred,
    /// The tick ran and failed; the backoff window was extended
    Failed(AppError),
}

/// Drives periodic fetch → reconcile → announce → persist ticks.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

/// Cloneable manual-trigger capability for command layers.
///
/// Runs the identical guarded tick as the timer: overlapping triggers are
/// dropped by the same single-flight flag.
#[derive(Clone)]
pub struct TickHandle {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    tracker: TrackerConfig,
    source: Arc<dyn ChallengeSource>,
    store: Arc<dyn StateStore>,
    notifier: Notifier,
    in_flight: AtomicBool,
    failure_streak: AtomicU32,
    backoff_until: Mutex<Option<Instant>>,
}

/// Clears the in-flight flag when a tick ends, even on early return.
struct FlightGuard<'a>(&'a AtomicBool);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Scheduler {
    /// Create a scheduler over the given collaborators.
    pub fn new(
        tracker: TrackerConfig,
        source: Arc<dyn ChallengeSource>,
        store: Arc<dyn StateStore>,
        notifier: Notifier,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                tracker,
                source,
                store,
                notifier,
                in_flight: AtomicBool::new(false),
                failure_streak: AtomicU32::new(0),
                backoff_until: Mutex::new(None),
            }),
        }
    }

    /// Get a manual-trigger handle.
    pub fn handle(&self) -> TickHandle {
        TickHandle {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Attempt one guarded tick.
    pub async fn try_tick(&self) -> TickOutcome {
        self.inner.try_tick().await
    }

    /// Run the periodic loop. Never returns; all failures back off and
    /// retry.
    pub async fn run(&self) {
        let period = Duration::from_secs(self.inner.tracker.poll_interval_seconds);
        let mut timer = interval(period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        log::info!("Scheduler started, polling every {}s", period.as_secs());

        loop {
            timer.tick().await;
            match self.try_tick().await {
                TickOutcome::Completed(report) => {
                    log::info!(
                        "Tick complete: {} challenges tracked, {} messages sent",
                        report.challenge_count,
                        report.messages_sent
                    );
                }
                TickOutcome::Skipped => {
                    log::warn!("Timer fired while a tick was still running; trigger dropped");
                }
                // Deferred and Failed are logged where they occur
                TickOutcome::Deferred => {}
                TickOutcome::Failed(_) => {}
            }
        }
    }
}

impl TickHandle {
    /// Trigger a tick now, subject to the same single-flight and backoff
    /// rules as the timer.
    pub async fn trigger_now(&self) -> TickOutcome {
        self.inner.try_tick().await
    }
}

impl SchedulerInner {
    async fn try_tick(&self) -> TickOutcome {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return TickOutcome::Skipped;
        }
        let _guard = FlightGuard(&self.in_flight);

        if let Some(until) = *self.backoff_until.lock().unwrap() {
            if Instant::now() < until {
                log::debug!("Inside backoff window, deferring tick");
                return TickOutcome::Deferred;
            }
        }

        match run_tick(self.source.as_ref(), self.store.as_ref(), &self.notifier).await {
            Ok(report) => {
                self.failure_streak.store(0, Ordering::SeqCst);
                *self.backoff_until.lock().unwrap() = None;
                TickOutcome::Completed(report)
            }
            Err(error) => {
                let streak = self.failure_streak.fetch_add(1, Ordering::SeqCst) + 1;
                let delay = backoff_delay(
                    self.tracker.failure_streak_backoff_base,
                    self.tracker.max_backoff_seconds,
                    streak,
                );
                *self.backoff_until.lock().unwrap() = Some(Instant::now() + delay);
                log::warn!(
                    "Tick failed ({}), failure streak {}, backing off {}s",
                    error,
                    streak,
                    delay.as_secs()
                );
                TickOutcome::Failed(error)
            }
        }
    }
}

/// Backoff delay for the given failure streak: `base * 2^(streak-1)`,
/// capped at `max_secs`.
fn backoff_delay(base_secs: u64, max_secs: u64, streak: u32) -> Duration {
    let exp = streak.saturating_sub(1).min(16);
    let secs = base_secs.saturating_mul(1u64 << exp).min(max_secs);
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Challenge, NotifyConfig, PersistedState, Snapshot};
    use crate::notify::ChatSender;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;

    struct NullSender;

    #[async_trait]
    impl ChatSender for NullSender {
        async fn send(&self, _channel_id: &str, _text: &str) -> crate::error::Result<()> {
            Ok(())
        }
    }

    struct MemoryStore(StdMutex<PersistedState>);

    #[async_trait]
    impl StateStore for MemoryStore {
        async fn load(&self) -> crate::error::Result<PersistedState> {
            Ok(self.0.lock().unwrap().clone())
        }

        async fn save(&self, state: &PersistedState) -> crate::error::Result<()> {
            *self.0.lock().unwrap() = state.clone();
            Ok(())
        }
    }

    /// Source whose fetch blocks until released, to hold a tick in flight.
    struct GatedSource {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl ChallengeSource for GatedSource {
        async fn fetch(&self) -> crate::error::Result<Snapshot> {
            self.started.notify_one();
            self.release.notified().await;
            Ok(Snapshot::new(vec![]))
        }
    }

    /// Source whose success is toggled from the test.
    struct SwitchSource {
        fail: AtomicBool,
    }

    #[async_trait]
    impl ChallengeSource for SwitchSource {
        async fn fetch(&self) -> crate::error::Result<Snapshot> {
            if self.fail.load(Ordering::SeqCst) {
                Err(AppError::fetch("test", "down"))
            } else {
                Ok(Snapshot::new(vec![Challenge {
                    id: "a".to_string(),
                    name: "A".to_string(),
                    category: "web".to_string(),
                    points: 100,
                    solve_count: 0,
                    url: "https://alpacahack.com/challenges/a".to_string(),
                }]))
            }
        }
    }

    fn tracker_config() -> TrackerConfig {
        TrackerConfig {
            poll_interval_seconds: 300,
            fetch_timeout_seconds: 30,
            max_backoff_seconds: 600,
            failure_streak_backoff_base: 60,
            user_agent: "test".to_string(),
        }
    }

    fn scheduler_with(source: Arc<dyn ChallengeSource>) -> Scheduler {
        let notify_config = NotifyConfig {
            channel_id: "42".to_string(),
            webhook_url: "https://discord.com/api/webhooks/1/abc".to_string(),
            message_char_limit: 1900,
            send_timeout_seconds: 10,
        };
        Scheduler::new(
            tracker_config(),
            source,
            Arc::new(MemoryStore(StdMutex::new(PersistedState::new()))),
            Notifier::new(Arc::new(NullSender), &notify_config),
        )
    }

    #[test]
    fn test_backoff_delay_growth_and_cap() {
        assert_eq!(backoff_delay(60, 600, 1), Duration::from_secs(60));
        assert_eq!(backoff_delay(60, 600, 2), Duration::from_secs(120));
        assert_eq!(backoff_delay(60, 600, 3), Duration::from_secs(240));
        assert_eq!(backoff_delay(60, 600, 4), Duration::from_secs(480));
        // Capped at the ceiling from here on
        assert_eq!(backoff_delay(60, 600, 5), Duration::from_secs(600));
        assert_eq!(backoff_delay(60, 600, 40), Duration::from_secs(600));
    }

    #[tokio::test]
    async fn test_single_flight_drops_second_trigger() {
        let source = Arc::new(GatedSource {
            started: Notify::new(),
            release: Notify::new(),
        });
        let scheduler = scheduler_with(source.clone());

        let running = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.try_tick().await })
        };
        source.started.notified().await;

        // Second trigger while the first is mid-fetch: dropped, not queued.
        assert!(matches!(scheduler.try_tick().await, TickOutcome::Skipped));
        // Manual triggers obey the same flag.
        assert!(matches!(
            scheduler.handle().trigger_now().await,
            TickOutcome::Skipped
        ));

        source.release.notify_one();
        assert!(matches!(
            running.await.unwrap(),
            TickOutcome::Completed(_)
        ));

        // Once the tick finished, triggers run again.
        source.release.notify_one();
        let scheduler2 = scheduler.clone();
        let second = tokio::spawn(async move { scheduler2.try_tick().await });
        source.started.notified().await;
        assert!(matches!(second.await.unwrap(), TickOutcome::Completed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_starts_backoff_window() {
        let source = Arc::new(SwitchSource {
            fail: AtomicBool::new(true),
        });
        let scheduler = scheduler_with(source);

        assert!(matches!(scheduler.try_tick().await, TickOutcome::Failed(_)));

        // Inside the 60s base window: deferred without fetching.
        assert!(matches!(scheduler.try_tick().await, TickOutcome::Deferred));

        // Past the window: the next attempt really runs (and fails again).
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(matches!(scheduler.try_tick().await, TickOutcome::Failed(_)));

        // Streak is now 2, so the window doubled to 120s.
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(matches!(scheduler.try_tick().await, TickOutcome::Deferred));
        tokio::time::advance(Duration::from_secs(60)).await;
        assert!(matches!(scheduler.try_tick().await, TickOutcome::Failed(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_resets_failure_streak() {
        let source = Arc::new(SwitchSource {
            fail: AtomicBool::new(true),
        });
        let scheduler = scheduler_with(source.clone());

        assert!(matches!(scheduler.try_tick().await, TickOutcome::Failed(_)));
        assert!(matches!(scheduler.try_tick().await, TickOutcome::Failed(_) | TickOutcome::Deferred));

        tokio::time::advance(Duration::from_secs(601)).await;
        source.fail.store(false, Ordering::SeqCst);
        assert!(matches!(
            scheduler.try_tick().await,
            TickOutcome::Completed(_)
        ));

        // After a success the streak restarts: first new failure gets the
        // base window again, not a doubled one.
        source.fail.store(true, Ordering::SeqCst);
        assert!(matches!(scheduler.try_tick().await, TickOutcome::Failed(_)));
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(matches!(scheduler.try_tick().await, TickOutcome::Failed(_)));
    }
}
