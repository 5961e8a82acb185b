//! LLM chat sessions for SeoWriter.
//!
//! A [`ChatSession`] holds a conversation with either OpenAI or Claude and
//! retries transient failures with exponential backoff. The backend is
//! chosen once from [`ProviderConfig::kind`](seowriter_shared::ProviderConfig).

mod claude;
pub mod error;
pub mod message;
mod openai;
pub mod retry;
mod selector;
pub mod session;

pub use error::ChatError;
pub use message::{Message, Role};
pub use retry::{DEFAULT_RETRY_DELAY, backoff_delay};
pub use session::{ChatSession, SendOptions};

