//! Search stage: keyphrase → ranked list of result URLs.
//!
//! Queries a SerpApi-compatible endpoint for Google organic results. Rank
//! order is preserved because it decides which pages get summarized.

mod response;

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument, warn};
use url::Url;

use seowriter_shared::{Result, SearchConfig, SeoWriterError};

use response::{Interpretation, SearchResponse};

/// User-Agent string for search requests.
const USER_AGENT: &str = concat!("SeoWriter/", env!("CARGO_PKG_VERSION"));

/// Search engine requested from the backend.
const ENGINE: &str = "google";

/// Failure messages, one per error class.
pub const CONNECT_ERROR: &str = "could not connect to search backend";
pub const CLIENT_ERROR: &str = "client error, check that your search API key is correct";
pub const UNEXPECTED_ERROR: &str = "unexpected error from search backend";

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

/// Return the first `config.max_results` organic result URLs for `query`.
///
/// An empty result list is a success; callers decide what to do with it.
#[instrument(skip_all, fields(query = %query, country = %config.country))]
pub async fn search_top_urls(query: &str, config: &SearchConfig) -> Result<Vec<Url>> {
    let client = build_client(config.timeout)?;
    let endpoint = format!("{}/search.json", config.base_url.trim_end_matches('/'));

    let mut params: Vec<(&str, &str)> = vec![
        ("engine", ENGINE),
        ("q", query),
        ("gl", config.country.as_str()),
        ("api_key", config.api_key.as_str()),
    ];
    if let Some(hl) = config.language.as_deref() {
        params.push(("hl", hl));
    }
    if let Some(location) = config.location.as_deref() {
        params.push(("location", location));
    }

    debug!(%endpoint, "querying search backend");

    let response = client
        .get(&endpoint)
        .query(&params)
        .send()
        .await
        .map_err(classify_transport_error)?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!(%status, body = %truncate(&body, 300), "search backend returned error status");
        return Err(classify_status(status));
    }

    let decoded: SearchResponse = response.json().await.map_err(|e| {
        let e = e.without_url();
        warn!(error = %e, "search response could not be decoded");
        SeoWriterError::Search(format!("{UNEXPECTED_ERROR}: {e}"))
    })?;

    match decoded.interpret(config.max_results) {
        Interpretation::Urls(urls) => {
            info!(results = urls.len(), "search complete");
            Ok(urls)
        }
        Interpretation::Rejected(reason) => {
            warn!(%reason, "search backend rejected the request");
            Err(SeoWriterError::Search(CLIENT_ERROR.into()))
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a reqwest client with appropriate settings.
fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .map_err(|e| SeoWriterError::Search(format!("{UNEXPECTED_ERROR}: client build: {e}")))
}

/// The request URL carries the API key, so it is stripped before the error
/// is logged or formatted.
fn classify_transport_error(e: reqwest::Error) -> SeoWriterError {
    let e = e.without_url();
    if e.is_connect() || e.is_timeout() {
        warn!(error = %e, "search backend unreachable");
        SeoWriterError::Search(CONNECT_ERROR.into())
    } else {
        warn!(error = %e, "search request failed");
        SeoWriterError::Search(format!("{UNEXPECTED_ERROR}: {e}"))
    }
}

fn classify_status(status: StatusCode) -> SeoWriterError {
    if status.is_client_error() {
        SeoWriterError::Search(CLIENT_ERROR.into())
    } else {
        SeoWriterError::Search(format!("{UNEXPECTED_ERROR}: HTTP {status}"))
    }
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
