//! Shared types, error model, configuration, and prompt templates for SeoWriter.
//!
//! This crate is the foundation depended on by all other SeoWriter crates.
//! It provides:
//! - [`SeoWriterError`]: the unified error type
//! - Domain types ([`RunId`], [`ProviderKind`])
//! - Configuration ([`AppConfig`], runtime configs, config loading)
//! - The prompt catalog ([`PromptCatalog`]) and placeholder rendering ([`render`])

pub mod config;
pub mod error;
pub mod prompts;
pub mod template;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, FetchConfig, FetchSection, GenerationConfig, GenerationSection, ProviderConfig,
    ProviderSection, SearchConfig, SerpSection, config_dir, config_file_path, init_config, init_config_in,
    load_config, load_config_from, load_prompt_catalog, resolve_api_key,
};
pub use error::{Result, SeoWriterError};
pub use prompts::{PromptCatalog, PromptTemplate, Step, load_catalog_from};
pub use template::{COMBINED_SUMMARY_VAR, KNOWN_VARIABLES, TemplateContext, placeholders, render};
pub use types::{ProviderKind, RunId};
