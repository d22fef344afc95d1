//! Utility functions and helpers.

pub mod http;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Extract the challenge slug from a detail-page URL.
///
/// Listing rows link to `/challenges/<slug>`; the slug is the stable
/// challenge identifier.
pub fn extract_challenge_slug(url: &str) -> Option<String> {
    let pattern = regex::Regex::new(r"/challenges/([A-Za-z0-9_-]+)").ok()?;
    pattern
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|slug| slug.as_str().to_string())
}
