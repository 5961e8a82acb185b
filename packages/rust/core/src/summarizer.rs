//! Summarize stage: reduce page text to a short knowledge-base synopsis.

use std::time::Duration;

use tracing::{debug, instrument};

use seowriter_ai::{ChatSession, SendOptions};
use seowriter_shared::{ProviderConfig, Result, SeoWriterError};

/// Input is cut to this many characters before it reaches the model.
pub const SUMMARY_CHAR_LIMIT: usize = 3000;

const SUMMARY_INSTRUCTION: &str = "Create a knowledge base of the tools, templates and references, \
in 300 words or less for the following website content: ";

/// Summarize `text` with a fresh session that has no system prompt.
#[instrument(skip_all, fields(provider = %provider.kind, input_len = text.len()))]
pub async fn summarize(text: &str, provider: &ProviderConfig, retry_delay: Duration) -> Result<String> {
    let prompt = format!("{SUMMARY_INSTRUCTION}{}", truncate_chars(text, SUMMARY_CHAR_LIMIT));

    let mut session = ChatSession::initialize("", provider)
        .map_err(|e| SeoWriterError::Summarize(e.to_string()))?;

    let summary = session
        .send(&prompt, &SendOptions::with_retry_delay(retry_delay))
        .await
        .map_err(|e| SeoWriterError::Summarize(e.to_string()))?;

    debug!(summary_len = summary.len(), "summary produced");
    Ok(summary)
}

/// Join per-document summaries into the input for the combined summary.
pub fn join_summaries(summaries: &[String]) -> String {
    summaries.join("\n")
}

/// First `max_chars` characters of `text`, never splitting a code point.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seowriter_shared::ProviderKind;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str) -> ProviderConfig {
        ProviderConfig {
            kind: ProviderKind::OpenAi,
            credential: "sk-test".into(),
            max_tokens: 256,
            temperature: 0.7,
            max_retries: 2,
            default_model: "test-model".into(),
            base_url: base_url.into(),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn truncate_short_text() {
        assert_eq!(truncate_chars("short", 100), "short");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "é".repeat(10);
        let cut = truncate_chars(&text, 4);
        assert_eq!(cut.chars().count(), 4);
        assert_eq!(cut, "éééé");
    }

    #[test]
    fn joins_with_newlines() {
        let joined = join_summaries(&["a".into(), "b".into()]);
        assert_eq!(joined, "a\nb");
    }

    #[tokio::test]
    async fn sends_truncated_prompt_without_system_turn() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "content": "synopsis" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let long = "x".repeat(SUMMARY_CHAR_LIMIT + 500);
        let summary = summarize(&long, &provider(&server.uri()), Duration::from_millis(1))
            .await
            .unwrap();
        assert_eq!(summary, "synopsis");

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
        let content = messages[0]["content"].as_str().unwrap();
        assert!(content.starts_with("Create a knowledge base"));
        assert_eq!(content.len(), SUMMARY_INSTRUCTION.len() + SUMMARY_CHAR_LIMIT);
    }

    #[tokio::test]
    async fn chat_failure_is_attributed_to_summarize() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .expect(2)
            .mount(&server)
            .await;

        let err = summarize("page", &provider(&server.uri()), Duration::from_millis(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SeoWriterError::Summarize(_)));
        assert!(err.to_string().contains("rate limit"));
    }
}
