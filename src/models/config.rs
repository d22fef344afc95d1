//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Polling cadence, timeouts, and backoff behavior
    #[serde(default)]
    pub tracker: TrackerConfig,

    /// Remote platform endpoint
    #[serde(default)]
    pub platform: PlatformConfig,

    /// CSS selectors for the challenge listing markup
    #[serde(default)]
    pub selectors: ListingSelectors,

    /// Announcement channel settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Filesystem locations
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.tracker.poll_interval_seconds == 0 {
            return Err(AppError::validation(
                "tracker.poll_interval_seconds must be > 0",
            ));
        }
        if self.tracker.fetch_timeout_seconds == 0 {
            return Err(AppError::validation(
                "tracker.fetch_timeout_seconds must be > 0",
            ));
        }
        if self.tracker.failure_streak_backoff_base == 0 {
            return Err(AppError::validation(
                "tracker.failure_streak_backoff_base must be > 0",
            ));
        }
        if self.tracker.max_backoff_seconds < self.tracker.failure_streak_backoff_base {
            return Err(AppError::validation(
                "tracker.max_backoff_seconds must be >= failure_streak_backoff_base",
            ));
        }
        if self.tracker.user_agent.trim().is_empty() {
            return Err(AppError::validation("tracker.user_agent is empty"));
        }
        if url::Url::parse(&self.platform.listing_url).is_err() {
            return Err(AppError::validation("platform.listing_url is not a valid URL"));
        }
        if self.selectors.row_selector.trim().is_empty() {
            return Err(AppError::validation("selectors.row_selector is empty"));
        }
        if self.notify.webhook_url.trim().is_empty() {
            return Err(AppError::validation("notify.webhook_url is not set"));
        }
        if self.notify.channel_id.trim().is_empty() {
            return Err(AppError::validation("notify.channel_id is not set"));
        }
        if self.notify.message_char_limit == 0 {
            return Err(AppError::validation("notify.message_char_limit must be > 0"));
        }
        Ok(())
    }
}

/// Polling, timeout, and backoff settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Tick period in seconds
    #[serde(default = "defaults::poll_interval")]
    pub poll_interval_seconds: u64,

    /// Listing fetch timeout in seconds
    #[serde(default = "defaults::fetch_timeout")]
    pub fetch_timeout_seconds: u64,

    /// Ceiling for the failure backoff delay in seconds
    #[serde(default = "defaults::max_backoff")]
    pub max_backoff_seconds: u64,

    /// First backoff delay in seconds; doubles per consecutive failure
    #[serde(default = "defaults::backoff_base")]
    pub failure_streak_backoff_base: u64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: defaults::poll_interval(),
            fetch_timeout_seconds: defaults::fetch_timeout(),
            max_backoff_seconds: defaults::max_backoff(),
            failure_streak_backoff_base: defaults::backoff_base(),
            user_agent: defaults::user_agent(),
        }
    }
}

/// Remote platform endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// URL of the public challenge listing page
    #[serde(default = "defaults::listing_url")]
    pub listing_url: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            listing_url: defaults::listing_url(),
        }
    }
}

/// CSS selectors locating challenge fields in the listing markup.
///
/// Defaults match the platform's MUI table layout. Only the fields the data
/// model needs are selected; anything else in the markup is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingSelectors {
    /// Selector for one challenge row
    #[serde(default = "defaults::row_selector")]
    pub row_selector: String,

    /// Selector for the challenge name/link element within a row
    #[serde(default = "defaults::name_selector")]
    pub name_selector: String,

    /// Selector for the category cell within a row
    #[serde(default = "defaults::category_selector")]
    pub category_selector: String,

    /// Selector for the points cell within a row
    #[serde(default = "defaults::points_selector")]
    pub points_selector: String,

    /// Selector for the solve-count cell within a row
    #[serde(default = "defaults::solves_selector")]
    pub solves_selector: String,

    /// HTML attribute holding the challenge link
    #[serde(default = "defaults::link_attr")]
    pub link_attr: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            row_selector: defaults::row_selector(),
            name_selector: defaults::name_selector(),
            category_selector: defaults::category_selector(),
            points_selector: defaults::points_selector(),
            solves_selector: defaults::solves_selector(),
            link_attr: defaults::link_attr(),
        }
    }
}

/// Announcement channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Destination channel identifier, supplied at startup
    #[serde(default)]
    pub channel_id: String,

    /// Discord-compatible webhook endpoint
    #[serde(default)]
    pub webhook_url: String,

    /// Maximum characters per outbound message
    #[serde(default = "defaults::message_char_limit")]
    pub message_char_limit: usize,

    /// Delivery timeout in seconds
    #[serde(default = "defaults::send_timeout")]
    pub send_timeout_seconds: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            channel_id: String::new(),
            webhook_url: String::new(),
            message_char_limit: defaults::message_char_limit(),
            send_timeout_seconds: defaults::send_timeout(),
        }
    }
}

/// Filesystem locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Persisted state file
    #[serde(default = "defaults::state_file")]
    pub state_file: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_file: defaults::state_file(),
        }
    }
}

mod defaults {
    // Tracker defaults
    pub fn poll_interval() -> u64 {
        300
    }
    pub fn fetch_timeout() -> u64 {
        30
    }
    pub fn max_backoff() -> u64 {
        3600
    }
    pub fn backoff_base() -> u64 {
        60
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; alpaca-watch/1.0)".into()
    }

    // Platform defaults
    pub fn listing_url() -> String {
        "https://alpacahack.com/challenges".into()
    }

    // Selector defaults
    pub fn row_selector() -> String {
        "tbody.MuiTableBody-root tr".into()
    }
    pub fn name_selector() -> String {
        "td:nth-child(1) a".into()
    }
    pub fn category_selector() -> String {
        "td:nth-child(2)".into()
    }
    pub fn points_selector() -> String {
        "td:nth-child(3)".into()
    }
    pub fn solves_selector() -> String {
        "td:nth-child(4)".into()
    }
    pub fn link_attr() -> String {
        "href".into()
    }

    // Notify defaults
    pub fn message_char_limit() -> usize {
        1900
    }
    pub fn send_timeout() -> u64 {
        10
    }

    // Path defaults
    pub fn state_file() -> String {
        "data/state.json".into()
    }
}
