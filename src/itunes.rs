//! iTunes Search API client and response validation.
//!
//! The search endpoint returns `{resultCount, results}` where every field
//! of a result record is optional on the wire. The raw payload is validated
//! against that shape once per query, before any candidate is inspected.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::filename::Identity;

const SEARCH_URL: &str = "https://itunes.apple.com/search";

/// Courtesy delay before each search request. The batch is strictly
/// sequential and the search API throttles aggressive callers.
const SEARCH_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Network-level failure (connect, timeout, body read).
    #[error("request failed: {0}")]
    Transport(String),
    /// Non-2xx status from the catalog.
    #[error("catalog returned HTTP {0}")]
    Http(reqwest::StatusCode),
    /// Payload does not match the expected response shape. Carries the raw
    /// payload for diagnostics.
    #[error("invalid catalog response: {reason}")]
    InvalidResponse {
        reason: String,
        raw: serde_json::Value,
    },
}

/// One track record returned by the search endpoint.
///
/// Every field is optional on the wire; [`candidate_is_usable`] decides
/// whether a record carries enough to tag with.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub track_name: Option<String>,
    pub artist_name: Option<String>,
    pub collection_name: Option<String>,
    #[serde(rename = "artworkUrl100")]
    pub artwork_url: Option<String>,
    pub release_date: Option<String>,
    pub track_number: Option<u32>,
    pub primary_genre_name: Option<String>,
}

/// A validated search response.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(rename = "resultCount")]
    pub result_count: u32,
    pub results: Vec<Candidate>,
}

/// Shared candidate validation: a record is usable for tagging iff it names
/// both a track and an artist. Used when the matcher filters the result set
/// and again when a human-chosen entry is validated before commit.
pub fn candidate_is_usable(candidate: &Candidate) -> bool {
    let has = |field: &Option<String>| field.as_deref().is_some_and(|s| !s.trim().is_empty());
    has(&candidate.track_name) && has(&candidate.artist_name)
}

/// Validate a raw payload against the expected response shape (field
/// presence and types). An invalid response fails the file, it is never
/// silently ignored.
pub fn validate_response(raw: serde_json::Value) -> Result<SearchResponse, CatalogError> {
    serde_json::from_value(raw.clone()).map_err(|e| CatalogError::InvalidResponse {
        reason: e.to_string(),
        raw,
    })
}

/// Build the free-text search term: artist then title, percent-encoded word
/// by word and joined with `+`.
fn search_term(identity: &Identity) -> String {
    format!("{} {}", identity.artist, identity.title)
        .split_whitespace()
        .map(urlencode)
        .collect::<Vec<_>>()
        .join("+")
}

/// Query the search endpoint for an identity and validate the response.
pub async fn search(client: &Client, identity: &Identity) -> Result<SearchResponse, CatalogError> {
    // Rate limit
    tokio::time::sleep(SEARCH_DELAY).await;

    let url = format!("{SEARCH_URL}?term={}&entity=song", search_term(identity));
    tracing::debug!("catalog query: {url}");

    let resp = client
        .get(&url)
        .send()
        .await
        .map_err(|e| CatalogError::Transport(e.to_string()))?;

    if !resp.status().is_success() {
        return Err(CatalogError::Http(resp.status()));
    }

    let raw: serde_json::Value = resp
        .json()
        .await
        .map_err(|e| CatalogError::Transport(e.to_string()))?;

    let response = validate_response(raw)?;
    tracing::debug!(
        "{} results for \"{} - {}\"",
        response.result_count,
        identity.title,
        identity.artist
    );
    Ok(response)
}

/// Download candidate artwork for embedding.
pub async fn fetch_artwork(client: &Client, url: &str) -> Result<Vec<u8>, CatalogError> {
    let resp = client
        .get(url)
        .send()
        .await
        .map_err(|e| CatalogError::Transport(e.to_string()))?;

    if !resp.status().is_success() {
        return Err(CatalogError::Http(resp.status()));
    }

    let bytes = resp
        .bytes()
        .await
        .map_err(|e| CatalogError::Transport(e.to_string()))?;

    Ok(bytes.to_vec())
}

/// Percent-encode a string for URL query parameters.
fn urlencode(s: &str) -> String {
    use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
    const SET: &AsciiSet = &NON_ALPHANUMERIC
        .remove(b'-')
        .remove(b'_')
        .remove(b'.')
        .remove(b'~');
    utf8_percent_encode(s, SET).to_string()
}
