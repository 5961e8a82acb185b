//! Stateful multi-turn chat session with retry and backoff.

use std::time::Duration;

use tracing::{debug, instrument, warn};

use seowriter_shared::{ProviderConfig, ProviderKind, Result, SeoWriterError};

use crate::error::ChatError;
use crate::message::{Message, TurnRequest};
use crate::retry::{DEFAULT_RETRY_DELAY, backoff_delay};
use crate::selector::Backend;

/// Per-call overrides for [`ChatSession::send`].
#[derive(Debug, Clone)]
pub struct SendOptions {
    /// Model to use instead of the provider default.
    pub model: Option<String>,
    /// Sampling temperature instead of the configured one.
    pub temperature: Option<f32>,
    /// Base of the exponential backoff between attempts.
    pub retry_delay: Duration,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            model: None,
            temperature: None,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl SendOptions {
    pub fn with_retry_delay(retry_delay: Duration) -> Self {
        Self {
            retry_delay,
            ..Self::default()
        }
    }
}

/// A conversation with one provider.
///
/// Every successful [`send`](Self::send) appends exactly one user and one
/// assistant message to the history. A failed send leaves it unchanged.
pub struct ChatSession {
    backend: Backend,
    provider: ProviderKind,
    /// System prompt for providers that take it out of band.
    system: Option<String>,
    history: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
    max_retries: u32,
    default_model: String,
}

impl ChatSession {
    /// Open a session seeded with `system_prompt`.
    ///
    /// Fails when the credential is missing or the HTTP client cannot be
    /// built. An empty system prompt is valid and seeds nothing.
    pub fn initialize(system_prompt: &str, config: &ProviderConfig) -> Result<Self> {
        if config.credential.trim().is_empty() {
            return Err(SeoWriterError::ChatInit(format!(
                "{} API key is empty",
                config.kind.display_name()
            )));
        }
        if config.max_retries == 0 {
            return Err(SeoWriterError::ChatInit("max_retries must be at least 1".into()));
        }

        let backend = Backend::for_provider(config)?;

        let mut history = Vec::new();
        let mut system = None;
        if !system_prompt.is_empty() {
            if backend.has_system_channel() {
                system = Some(system_prompt.to_string());
            } else {
                history.push(Message::system(system_prompt));
            }
        }

        debug!(
            provider = %config.kind,
            model = %config.default_model,
            system_len = system_prompt.len(),
            "chat session initialized"
        );

        Ok(Self {
            backend,
            provider: config.kind,
            system,
            history,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_retries: config.max_retries,
            default_model: config.default_model.clone(),
        })
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// Messages exchanged so far. For OpenAI this starts with the system turn.
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Append `message` as a user turn and return the assistant's reply.
    ///
    /// Rate limits, connection failures, and non-success statuses are retried
    /// up to `max_retries` total attempts with exponential backoff. Anything
    /// else fails immediately.
    #[instrument(skip_all, fields(provider = %self.provider, turn = self.history.len()))]
    pub async fn send(&mut self, message: &str, options: &SendOptions) -> std::result::Result<String, ChatError> {
        self.history.push(Message::user(message));

        let provider = self.provider.display_name();
        let model = options.model.as_deref().unwrap_or(&self.default_model);
        let temperature = options.temperature.unwrap_or(self.temperature);

        let mut attempt: u32 = 1;
        let outcome = loop {
            let request = TurnRequest {
                system: self.system.as_deref(),
                messages: &self.history,
                model,
                temperature,
                max_tokens: self.max_tokens,
            };

            match self.backend.complete(&request).await {
                Ok(reply) => break Ok(reply),
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    let delay = backoff_delay(options.retry_delay, attempt);
                    warn!(
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "chat request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    warn!(attempt, error = %err, "chat request failed");
                    break Err(err.into_chat_error(provider));
                }
            }
        };

        match outcome {
            Ok(reply) => {
                debug!(attempts = attempt, reply_len = reply.len(), "chat reply received");
                self.history.push(Message::assistant(reply.clone()));
                Ok(reply)
            }
            Err(err) => {
                self.history.pop();
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use serde_json::{Value, json};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(kind: ProviderKind, base_url: &str, max_retries: u32) -> ProviderConfig {
        ProviderConfig {
            kind,
            credential: "sk-test".into(),
            max_tokens: 256,
            temperature: 0.7,
            max_retries,
            default_model: "test-model".into(),
            base_url: base_url.into(),
            timeout: Duration::from_secs(5),
        }
    }

    fn fast() -> SendOptions {
        SendOptions::with_retry_delay(Duration::from_millis(1))
    }

    fn openai_reply(text: &str) -> Value {
        json!({ "choices": [{ "message": { "role": "assistant", "content": text } }] })
    }

    async fn request_bodies(server: &MockServer) -> Vec<Value> {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn openai_history_grows_across_turns() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(openai_reply("ok")))
            .expect(2)
            .mount(&server)
            .await;

        let config = provider(ProviderKind::OpenAi, &server.uri(), 3);
        let mut session = ChatSession::initialize("be helpful", &config).unwrap();
        assert_eq!(session.history().len(), 1);
        assert_eq!(session.history()[0].role, Role::System);

        assert_eq!(session.send("first", &fast()).await.unwrap(), "ok");
        assert_eq!(session.send("second", &fast()).await.unwrap(), "ok");
        assert_eq!(session.history().len(), 5);

        let bodies = request_bodies(&server).await;
        let second = bodies[1]["messages"].as_array().unwrap();
        assert_eq!(second.len(), 4);
        assert_eq!(second[0]["role"], "system");
        assert_eq!(second[1]["content"], "first");
        assert_eq!(second[3]["content"], "second");
        assert_eq!(bodies[1]["model"], "test-model");
    }

    #[tokio::test]
    async fn claude_sends_system_out_of_band() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({ "system": "be helpful" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{ "type": "text", "text": "hello" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = provider(ProviderKind::Claude, &server.uri(), 3);
        let mut session = ChatSession::initialize("be helpful", &config).unwrap();
        assert!(session.history().is_empty());

        assert_eq!(session.send("hi", &fast()).await.unwrap(), "hello");
        let roles: Vec<_> = session.history().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);

        let bodies = request_bodies(&server).await;
        let messages = bodies[0]["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
    }

    #[tokio::test]
    async fn empty_system_prompt_seeds_nothing() {
        let config = provider(ProviderKind::OpenAi, "http://127.0.0.1:1", 1);
        let session = ChatSession::initialize("", &config).unwrap();
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn rate_limit_exhausts_after_max_retries() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let config = provider(ProviderKind::OpenAi, &server.uri(), 3);
        let mut session = ChatSession::initialize("sys", &config).unwrap();
        let err = session.send("hi", &fast()).await.unwrap_err();

        assert_eq!(err, ChatError::RateLimitExhausted { provider: "OpenAI" });
        assert_eq!(session.history().len(), 1, "failed turn is rolled back");
    }

    #[tokio::test]
    async fn waits_grow_between_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .expect(4)
            .mount(&server)
            .await;

        let config = provider(ProviderKind::OpenAi, &server.uri(), 4);
        let mut session = ChatSession::initialize("sys", &config).unwrap();
        let base = Duration::from_millis(20);

        let start = std::time::Instant::now();
        let err = session
            .send("hi", &SendOptions::with_retry_delay(base))
            .await
            .unwrap_err();
        let elapsed = start.elapsed();

        assert_eq!(err, ChatError::RateLimitExhausted { provider: "OpenAI" });
        // 40 + 80 + 160 ms; a flat delay would total at most 3 * 40 ms.
        let expected: Duration = (1..4).map(|attempt| backoff_delay(base, attempt)).sum();
        assert_eq!(expected, Duration::from_millis(280));
        assert!(elapsed >= expected, "slept only {elapsed:?}");
    }

    #[tokio::test]
    async fn server_error_exhausts_as_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2)
            .mount(&server)
            .await;

        let config = provider(ProviderKind::Claude, &server.uri(), 2);
        let mut session = ChatSession::initialize("sys", &config).unwrap();
        let err = session.send("hi", &fast()).await.unwrap_err();

        assert_eq!(err, ChatError::ApiErrorExhausted { provider: "Claude" });
        assert!(err.to_string().contains("Claude"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_exhausts_as_connection_error() {
        let config = provider(ProviderKind::OpenAi, "http://127.0.0.1:1", 2);
        let mut session = ChatSession::initialize("sys", &config).unwrap();
        let err = session.send("hi", &fast()).await.unwrap_err();
        assert_eq!(err, ChatError::ConnectionExhausted { provider: "OpenAI" });
    }

    #[tokio::test]
    async fn undecodable_reply_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .expect(1)
            .mount(&server)
            .await;

        let config = provider(ProviderKind::OpenAi, &server.uri(), 5);
        let mut session = ChatSession::initialize("sys", &config).unwrap();
        let err = session.send("hi", &fast()).await.unwrap_err();
        assert!(matches!(err, ChatError::Unexpected { provider: "OpenAI", .. }));
    }

    #[tokio::test]
    async fn recovers_after_transient_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(openai_reply("finally")))
            .expect(1)
            .mount(&server)
            .await;

        let config = provider(ProviderKind::OpenAi, &server.uri(), 3);
        let mut session = ChatSession::initialize("sys", &config).unwrap();
        assert_eq!(session.send("hi", &fast()).await.unwrap(), "finally");
        assert_eq!(session.history().len(), 3);
    }

    #[tokio::test]
    async fn per_call_overrides_reach_the_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "model": "other-model", "temperature": 0.0 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(openai_reply("ok")))
            .expect(1)
            .mount(&server)
            .await;

        let config = provider(ProviderKind::OpenAi, &server.uri(), 1);
        let mut session = ChatSession::initialize("sys", &config).unwrap();
        let options = SendOptions {
            model: Some("other-model".into()),
            temperature: Some(0.0),
            retry_delay: Duration::from_millis(1),
        };
        session.send("hi", &options).await.unwrap();
    }

    #[test]
    fn empty_credential_fails_initialization() {
        let mut config = provider(ProviderKind::Claude, "http://127.0.0.1:1", 1);
        config.credential = "  ".into();
        let err = ChatSession::initialize("sys", &config).err().unwrap();
        assert!(matches!(err, SeoWriterError::ChatInit(_)));
    }
}
