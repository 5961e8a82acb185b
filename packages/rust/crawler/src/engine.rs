//! Concurrent page fetcher for the fetch stage.
//!
//! Every URL is downloaded independently on a bounded pool of tokio tasks.
//! A failing URL is logged and dropped; the stage only fails when no URL
//! produced any text. Successful contents keep the input order.

use std::sync::Arc;
use std::time::Instant;

use reqwest::Client;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};
use url::Url;

use seowriter_shared::{FetchConfig, Result, SeoWriterError};

use crate::extract::extract_body_text;

/// User-Agent string for fetch requests.
const USER_AGENT: &str = concat!("SeoWriter/", env!("CARGO_PKG_VERSION"));

/// Maximum number of redirects followed per page.
const MAX_REDIRECTS: usize = 5;

/// Stage failure message when the whole batch came back empty.
pub const NO_CONTENT_ERROR: &str = "no content could be fetched";

// ---------------------------------------------------------------------------
// FetchedContent
// ---------------------------------------------------------------------------

/// Text extracted from one successfully fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedContent {
    pub url: Url,
    pub text: String,
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

/// Downloads pages and extracts their body text.
pub struct Fetcher {
    config: FetchConfig,
    client: Client,
}

impl Fetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(config.timeout)
            .build()
            .map_err(|e| SeoWriterError::Fetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Fetch every URL and return the non-empty texts in input order.
    #[instrument(skip_all, fields(urls = urls.len(), concurrency = self.config.concurrency))]
    pub async fn fetch_all(&self, urls: &[Url]) -> Result<Vec<FetchedContent>> {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));

        let mut handles = Vec::with_capacity(urls.len());
        for url in urls {
            let client = self.client.clone();
            let sem = semaphore.clone();
            let url = url.clone();

            handles.push(tokio::spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                let outcome = fetch_text(&client, &url).await;
                (url, outcome)
            }));
        }

        let mut contents = Vec::new();
        let mut failures = 0usize;

        // Awaiting handles in spawn order keeps results in input order.
        for handle in handles {
            match handle.await {
                Ok((url, Ok(text))) if !text.is_empty() => {
                    debug!(%url, chars = text.chars().count(), "page fetched");
                    contents.push(FetchedContent { url, text });
                }
                Ok((url, Ok(_))) => {
                    warn!(%url, "page had no extractable text, skipping");
                    failures += 1;
                }
                Ok((url, Err(e))) => {
                    warn!(%url, error = %e, "failed to fetch page, skipping");
                    failures += 1;
                }
                Err(e) => {
                    warn!(error = %e, "fetch task failed");
                    failures += 1;
                }
            }
        }

        info!(
            fetched = contents.len(),
            failed = failures,
            duration_ms = start.elapsed().as_millis(),
            "fetch complete"
        );

        if contents.is_empty() {
            return Err(SeoWriterError::Fetch(NO_CONTENT_ERROR.into()));
        }

        Ok(contents)
    }
}

// ---------------------------------------------------------------------------
// Page fetching
// ---------------------------------------------------------------------------

/// Download one page and extract its body text.
async fn fetch_text(client: &Client, url: &Url) -> Result<String> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(SeoWriterError::Fetch(format!(
            "{url}: unsupported scheme '{}'",
            url.scheme()
        )));
    }

    let response = client
        .get(url.as_str())
        .send()
        .await
        .map_err(|e| SeoWriterError::Fetch(format!("{url}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SeoWriterError::Fetch(format!("{url}: HTTP {status}")));
    }

    let body = response
        .text()
        .await
        .map_err(|e| SeoWriterError::Fetch(format!("{url}: body read failed: {e}")))?;

    Ok(extract_body_text(&body))
}

#[cfg(test)]
mod fetch_tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> Fetcher {
        Fetcher::new(FetchConfig {
            concurrency: 2,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn page(body: &str) -> String {
        format!("<html><body><main><p>{body}</p></main></body></html>")
    }

    #[tokio::test]
    async fn fetches_in_input_order() {
        let server = MockServer::start().await;

        for (p, text) in [("/a", "alpha"), ("/b", "bravo"), ("/c", "charlie")] {
            Mock::given(method("GET"))
                .and(path(p))
                .respond_with(ResponseTemplate::new(200).set_body_string(page(text)))
                .mount(&server)
                .await;
        }

        // Slow down the first page so it finishes last.
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(page("slow"))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let urls: Vec<Url> = ["/slow", "/a", "/b", "/c"]
            .iter()
            .map(|p| base.join(p).unwrap())
            .collect();

        let contents = fetcher().fetch_all(&urls).await.unwrap();
        let texts: Vec<&str> = contents.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["slow", "alpha", "bravo", "charlie"]);
    }

    #[tokio::test]
    async fn individual_failures_are_skipped() {
        let server = MockServer::start().await;

        Mock::given(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page("kept")))
            .mount(&server)
            .await;
        Mock::given(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(path("/empty"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let urls: Vec<Url> = ["/missing", "/ok", "/empty"]
            .iter()
            .map(|p| base.join(p).unwrap())
            .collect();

        let contents = fetcher().fetch_all(&urls).await.unwrap();
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].text, "kept");
        assert_eq!(contents[0].url.path(), "/ok");
    }

    #[tokio::test]
    async fn all_failures_is_no_content_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let urls = vec![base.join("/x").unwrap(), base.join("/y").unwrap()];

        let err = fetcher().fetch_all(&urls).await.unwrap_err();
        assert!(matches!(err, SeoWriterError::Fetch(_)));
        assert!(err.to_string().contains(NO_CONTENT_ERROR));
    }

    #[tokio::test]
    async fn empty_url_list_is_no_content_error() {
        let err = fetcher().fetch_all(&[]).await.unwrap_err();
        assert!(err.to_string().contains(NO_CONTENT_ERROR));
    }

    #[tokio::test]
    async fn non_http_scheme_is_rejected() {
        let client = Client::new();
        let url = Url::parse("file:///etc/passwd").unwrap();
        assert!(fetch_text(&client, &url).await.is_err());
    }
}
