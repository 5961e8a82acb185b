//! SerpApi JSON response shape and ranking extraction.

use serde::Deserialize;
use tracing::debug;
use url::Url;

/// Error text SerpApi returns (with HTTP 200) when a query simply has no hits.
const NO_RESULTS_MARKER: &str = "hasn't returned any results";

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub organic_results: Vec<OrganicResult>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrganicResult {
    #[serde(default)]
    pub link: Option<String>,
}

/// What a decoded response means for the search stage.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Interpretation {
    /// Ranked result URLs, already truncated.
    Urls(Vec<Url>),
    /// The backend rejected the request (bad key, exhausted plan, bad params).
    Rejected(String),
}

impl SearchResponse {
    /// Keep provider rank order; skip entries without a usable link, then
    /// truncate to `max_results`.
    pub(crate) fn interpret(self, max_results: usize) -> Interpretation {
        if let Some(error) = self.error {
            if error.contains(NO_RESULTS_MARKER) {
                return Interpretation::Urls(Vec::new());
            }
            return Interpretation::Rejected(error);
        }

        let urls = self
            .organic_results
            .into_iter()
            .filter_map(|r| r.link)
            .filter_map(|link| match Url::parse(&link) {
                Ok(url) => Some(url),
                Err(e) => {
                    debug!(%link, error = %e, "skipping unparsable result link");
                    None
                }
            })
            .take(max_results)
            .collect();

        Interpretation::Urls(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> SearchResponse {
        serde_json::from_str(json).expect("valid response json")
    }

    #[test]
    fn preserves_rank_order_and_truncates() {
        let resp = parse(
            r#"{"organic_results": [
                {"position": 1, "link": "https://a.example.com/"},
                {"position": 2, "link": "https://b.example.com/"},
                {"position": 3, "link": "https://c.example.com/"}
            ]}"#,
        );
        let Interpretation::Urls(urls) = resp.interpret(2) else {
            panic!("expected urls");
        };
        let hosts: Vec<_> = urls.iter().map(|u| u.host_str().unwrap()).collect();
        assert_eq!(hosts, vec!["a.example.com", "b.example.com"]);
    }

    #[test]
    fn missing_organic_results_is_empty() {
        assert_eq!(
            parse(r#"{"search_metadata": {}}"#).interpret(5),
            Interpretation::Urls(vec![])
        );
    }

    #[test]
    fn skips_entries_without_link() {
        let resp = parse(
            r#"{"organic_results": [{"title": "no link"}, {"link": "https://ok.example.com/"}]}"#,
        );
        let Interpretation::Urls(urls) = resp.interpret(5) else {
            panic!("expected urls");
        };
        assert_eq!(urls.len(), 1);
    }

    #[test]
    fn no_results_error_is_not_a_failure() {
        let resp = parse(r#"{"error": "Google hasn't returned any results for this query."}"#);
        assert_eq!(resp.interpret(5), Interpretation::Urls(vec![]));
    }

    #[test]
    fn other_error_is_rejection() {
        let resp = parse(r#"{"error": "Invalid API key."}"#);
        assert!(matches!(resp.interpret(5), Interpretation::Rejected(_)));
    }
}
