//! Provider selection: picks the backend behind a chat session.
//!
//! Selection happens once, when the session is constructed. Every later
//! call dispatches through the chosen variant without re-checking config.

use tracing::debug;

use seowriter_shared::{ProviderConfig, ProviderKind, Result};

use crate::claude::ClaudeBackend;
use crate::error::AttemptError;
use crate::message::TurnRequest;
use crate::openai::OpenAiBackend;

/// A provider-bound HTTP backend.
pub(crate) enum Backend {
    OpenAi(OpenAiBackend),
    Claude(ClaudeBackend),
}

impl Backend {
    /// Construct the backend matching `config.kind`.
    pub(crate) fn for_provider(config: &ProviderConfig) -> Result<Self> {
        debug!(provider = %config.kind, base_url = %config.base_url, "selecting chat backend");
        Ok(match config.kind {
            ProviderKind::OpenAi => Self::OpenAi(OpenAiBackend::new(config)?),
            ProviderKind::Claude => Self::Claude(ClaudeBackend::new(config)?),
        })
    }

    /// Whether the system prompt goes in its own request field rather than
    /// at the head of the message history.
    pub(crate) fn has_system_channel(&self) -> bool {
        matches!(self, Self::Claude(_))
    }

    pub(crate) async fn complete(&self, req: &TurnRequest<'_>) -> std::result::Result<String, AttemptError> {
        match self {
            Self::OpenAi(b) => b.complete(req).await,
            Self::Claude(b) => b.complete(req).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(kind: ProviderKind) -> ProviderConfig {
        ProviderConfig {
            kind,
            credential: "sk-test".into(),
            max_tokens: 100,
            temperature: 0.5,
            max_retries: 2,
            default_model: "model".into(),
            base_url: "http://127.0.0.1:1".into(),
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn builds_matching_variant() {
        let openai = Backend::for_provider(&config(ProviderKind::OpenAi)).unwrap();
        assert!(matches!(openai, Backend::OpenAi(_)));
        assert!(!openai.has_system_channel());

        let claude = Backend::for_provider(&config(ProviderKind::Claude)).unwrap();
        assert!(matches!(claude, Backend::Claude(_)));
        assert!(claude.has_system_channel());
    }
}
