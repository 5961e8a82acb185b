//! OpenAI chat completions backend.
//!
//! The system prompt travels as the first message of the history.

use reqwest::Client;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use seowriter_shared::{ProviderConfig, Result, SeoWriterError};

use crate::error::AttemptError;
use crate::message::{Message, TurnRequest};

pub(crate) struct OpenAiBackend {
    client: Client,
    endpoint: String,
}

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiBackend {
    pub(crate) fn new(config: &ProviderConfig) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.credential))
            .map_err(|_| SeoWriterError::ChatInit("OpenAI API key contains invalid characters".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| SeoWriterError::ChatInit(format!("failed to build OpenAI client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
        })
    }

    pub(crate) async fn complete(&self, req: &TurnRequest<'_>) -> std::result::Result<String, AttemptError> {
        let body = OpenAiRequest {
            model: req.model,
            messages: req.messages,
            max_tokens: req.max_tokens,
            temperature: req.temperature,
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
            debug!(%status, body = %text, "OpenAI returned error status");
            return Err(AttemptError::from_status(status));
        }

        let decoded: OpenAiResponse = response
            .json()
            .await
            .map_err(|e| AttemptError::Unexpected(format!("invalid response body: {e}")))?;

        decoded
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AttemptError::Unexpected("response contained no message content".into()))
    }
}
