//! Core pipeline orchestration for SeoWriter.
//!
//! This crate ties together search, fetching, summarization, and the
//! multi-step AI conversation into one article generation run.

pub mod pipeline;
pub mod progress;
pub mod summarizer;

pub use pipeline::{Article, ArticleGenerator, GenerationOutcome, PipelineConfig};
pub use progress::{ProgressReporter, SilentProgress};
pub use summarizer::{SUMMARY_CHAR_LIMIT, join_summaries, summarize};
