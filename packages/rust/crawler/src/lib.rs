//! Fetch stage: result URLs → page body text.
//!
//! This crate provides:
//! - [`engine`]: concurrent fetcher that tolerates per-URL failures
//! - [`extract`]: body text extraction from raw HTML

pub mod engine;
pub mod extract;

pub use engine::{FetchedContent, Fetcher, NO_CONTENT_ERROR};
pub use extract::extract_body_text;
