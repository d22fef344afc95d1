// src/services/listing.rs

//! Challenge listing fetcher.
//!
//! Retrieves the platform's public challenge listing and parses it into
//! structured records using configured CSS selectors.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{Challenge, Config, ListingSelectors, Snapshot};
use crate::utils::{extract_challenge_slug, http, resolve_url};

/// Source of challenge snapshots.
///
/// The scheduler depends on this seam rather than on the HTTP fetcher
/// directly, so ticks can be driven from canned data in tests.
#[async_trait]
pub trait ChallengeSource: Send + Sync {
    /// Capture the current challenge listing.
    ///
    /// One outbound request per call; no internal retries. Retry policy
    /// lives in the scheduler.
    async fn fetch(&self) -> Result<Snapshot>;
}

/// Service for fetching the challenge listing from the platform.
pub struct ListingFetcher {
    config: Arc<Config>,
    client: Client,
}

impl ListingFetcher {
    /// Create a new listing fetcher with the given configuration.
    pub fn new(config: Arc<Config>) -> Result<Self> {
        let client = http::create_async_client(&config.tracker)?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl ChallengeSource for ListingFetcher {
    async fn fetch(&self) -> Result<Snapshot> {
        let url = &self.config.platform.listing_url;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::fetch(url.clone(), e))?;

        let response = response
            .error_for_status()
            .map_err(|e| AppError::fetch(url.clone(), e))?;

        let html = response
            .text()
            .await
            .map_err(|e| AppError::fetch(url.clone(), e))?;

        let challenges = parse_listing(&html, &self.config.selectors, url)?;
        log::debug!("Fetched {} challenges from {}", challenges.len(), url);

        Ok(Snapshot::new(challenges))
    }
}

/// Parse the listing page markup into challenge records.
///
/// A malformed row is skipped with a warning; a page where the row selector
/// matches nothing at all is treated as unrecognizable markup and fails the
/// whole call. Duplicate ids keep the first occurrence.
pub fn parse_listing(
    html: &str,
    selectors: &ListingSelectors,
    base_url: &str,
) -> Result<Vec<Challenge>> {
    let document = Html::parse_document(html);

    let row_sel = parse_selector(&selectors.row_selector)?;
    let name_sel = parse_selector(&selectors.name_selector)?;
    let category_sel = parse_selector(&selectors.category_selector)?;
    let points_sel = parse_selector(&selectors.points_selector)?;
    let solves_sel = parse_selector(&selectors.solves_selector)?;

    let base = url::Url::parse(base_url)
        .map_err(|e| AppError::fetch(base_url.to_string(), e))?;

    let rows: Vec<ElementRef> = document.select(&row_sel).collect();
    if rows.is_empty() {
        // An empty table body is indistinguishable from changed markup.
        return Err(AppError::fetch(
            base_url.to_string(),
            format!("no rows matched selector '{}'", selectors.row_selector),
        ));
    }

    let mut seen = HashSet::new();
    let mut challenges = Vec::new();

    for row in rows {
        let Some(challenge) = parse_row(
            &row,
            &name_sel,
            &category_sel,
            &points_sel,
            &solves_sel,
            &selectors.link_attr,
            &base,
        ) else {
            let snippet = normalize_text(&row.text().collect::<String>());
            log::warn!("Skipping malformed challenge row: {:?}", snippet);
            continue;
        };

        if seen.insert(challenge.id.clone()) {
            challenges.push(challenge);
        }
    }

    Ok(challenges)
}

/// Parse a single listing row. Returns `None` if any required field is
/// missing or unparseable.
fn parse_row(
    row: &ElementRef,
    name_sel: &Selector,
    category_sel: &Selector,
    points_sel: &Selector,
    solves_sel: &Selector,
    link_attr: &str,
    base: &url::Url,
) -> Option<Challenge> {
    let name_elem = row.select(name_sel).next()?;
    let category_elem = row.select(category_sel).next()?;
    let points_elem = row.select(points_sel).next()?;
    let solves_elem = row.select(solves_sel).next()?;

    let name = normalize_text(&name_elem.text().collect::<String>());
    if name.is_empty() {
        return None;
    }

    let href = name_elem.value().attr(link_attr)?;
    let url = resolve_url(base, href);
    let id = extract_challenge_slug(&url)?;

    let category = normalize_text(&category_elem.text().collect::<String>());
    let points = parse_count(&points_elem.text().collect::<String>())?;
    let solve_count = parse_count(&solves_elem.text().collect::<String>())?;

    Some(Challenge {
        id,
        name,
        category,
        points,
        solve_count,
        url,
    })
}

fn normalize_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract the leading integer from a cell like "123" or "123 solves".
fn parse_count(s: &str) -> Option<u32> {
    let digits: String = s
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
