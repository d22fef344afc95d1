//! Pipeline entry points for watcher operations.
//!
//! - `reconcile`: Compute change events between state and snapshot
//! - `run_tick`: Execute one fetch → reconcile → announce → persist cycle
//! - `Scheduler`: Drive ticks periodically with backoff

pub mod reconcile;
pub mod scheduler;
pub mod tick;

pub use reconcile::{Reconciliation, reconcile};
pub use scheduler::{Scheduler, TickHandle, TickOutcome};
pub use tick::{TickReport, run_tick};
