//! Chat failure taxonomy.
//!
//! Each backend maps its transport and HTTP failures into [`AttemptError`].
//! The session retries transient attempts and converts the final outcome
//! into a [`ChatError`], whose message names the provider.

use seowriter_shared::SeoWriterError;

/// Terminal failure of one `send` call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChatError {
    #[error("max retries reached for rate limit ({provider})")]
    RateLimitExhausted { provider: &'static str },

    #[error("max retries reached for connection errors ({provider})")]
    ConnectionExhausted { provider: &'static str },

    #[error("max retries reached for API error, check your {provider} API key and parameters")]
    ApiErrorExhausted { provider: &'static str },

    #[error("unexpected error from {provider}: {message}")]
    Unexpected {
        provider: &'static str,
        message: String,
    },
}

impl From<ChatError> for SeoWriterError {
    fn from(err: ChatError) -> Self {
        SeoWriterError::Chat(err.to_string())
    }
}

/// Classification of a single failed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AttemptError {
    /// HTTP 429.
    RateLimited,
    /// The request never got a response (connect failure, timeout, reset).
    Connection(String),
    /// Any other non-success status.
    Api { status: u16 },
    /// A success response we could not use, or a request we could not build.
    Unexpected(String),
}

impl AttemptError {
    /// Whether waiting and trying again can help.
    pub(crate) fn is_transient(&self) -> bool {
        !matches!(self, Self::Unexpected(_))
    }

    /// Final error once the attempt budget is spent on this class of failure.
    pub(crate) fn into_chat_error(self, provider: &'static str) -> ChatError {
        match self {
            Self::RateLimited => ChatError::RateLimitExhausted { provider },
            Self::Connection(_) => ChatError::ConnectionExhausted { provider },
            Self::Api { .. } => ChatError::ApiErrorExhausted { provider },
            Self::Unexpected(message) => ChatError::Unexpected { provider, message },
        }
    }

    /// Map a transport-level reqwest failure.
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_builder() {
            Self::Unexpected(format!("request could not be built: {e}"))
        } else {
            Self::Connection(e.to_string())
        }
    }

    /// Map a non-success HTTP status.
    pub(crate) fn from_status(status: reqwest::StatusCode) -> Self {
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Self::RateLimited
        } else {
            Self::Api {
                status: status.as_u16(),
            }
        }
    }
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RateLimited => f.write_str("rate limited"),
            Self::Connection(e) => write!(f, "connection error: {e}"),
            Self::Api { status } => write!(f, "API error (HTTP {status})"),
            Self::Unexpected(e) => write!(f, "unexpected: {e}"),
        }
    }
}
