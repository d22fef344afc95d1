// src/models/mod.rs

//! Domain models for the watcher application.

mod challenge;
mod config;
mod event;

// Re-export all public types
pub use challenge::{Challenge, PersistedState, Snapshot};
pub use config::{Config, ListingSelectors, NotifyConfig, PathsConfig, PlatformConfig, TrackerConfig};
pub use event::ChangeEvent;
