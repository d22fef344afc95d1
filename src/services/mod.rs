//! Service layer for the watcher application.
//!
//! This module contains the business logic for:
//! - Challenge listing retrieval (`ListingFetcher`)

mod listing;

pub use listing::{ChallengeSource, ListingFetcher, parse_listing};
