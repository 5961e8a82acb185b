//! Anthropic Claude messages backend.
//!
//! Claude takes the system prompt in a dedicated `system` field, so the
//! history holds only user and assistant turns.

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use seowriter_shared::{ProviderConfig, Result, SeoWriterError};

use crate::error::AttemptError;
use crate::message::{Message, TurnRequest};

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub(crate) struct ClaudeBackend {
    client: Client,
    endpoint: String,
}

#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct ClaudeResponse {
    #[serde(default)]
    content: Vec<ClaudeContent>,
}

#[derive(Deserialize)]
struct ClaudeContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: Option<String>,
}

impl ClaudeBackend {
    pub(crate) fn new(config: &ProviderConfig) -> Result<Self> {
        let mut key = HeaderValue::from_str(&config.credential)
            .map_err(|_| SeoWriterError::ChatInit("Claude API key contains invalid characters".into()))?;
        key.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", key);
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| SeoWriterError::ChatInit(format!("failed to build Claude client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/v1/messages", config.base_url.trim_end_matches('/')),
        })
    }

    pub(crate) async fn complete(&self, req: &TurnRequest<'_>) -> std::result::Result<String, AttemptError> {
        let body = ClaudeRequest {
            model: req.model,
            max_tokens: req.max_tokens,
            temperature: req.temperature,
            system: req.system.filter(|s| !s.is_empty()),
            messages: req.messages,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(AttemptError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            debug!(%status, body = %text, "Claude returned error status");
            return Err(AttemptError::from_status(status));
        }

        let decoded: ClaudeResponse = response
            .json()
            .await
            .map_err(|e| AttemptError::Unexpected(format!("invalid response body: {e}")))?;

        let text = decoded
            .content
            .into_iter()
            .filter(|c| c.content_type == "text")
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(AttemptError::Unexpected("response contained no text content".into()));
        }

        Ok(text)
    }
}
