// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::TrackerConfig;

/// Create a configured asynchronous HTTP client.
///
/// The client timeout bounds every request it issues; a hung remote never
/// blocks a tick past `fetch_timeout_seconds`.
pub fn create_async_client(config: &TrackerConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.fetch_timeout_seconds))
        .build()
        .map_err(|e| AppError::config(format!("http client: {e}")))?;
    Ok(client)
}
