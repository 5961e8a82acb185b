//! Application configuration for SeoWriter.
//!
//! User config lives at `~/.seowriter/seowriter.toml`.
//! CLI flags override config file values, which override defaults.
//! API keys are never stored in the file; each provider section names the
//! environment variable that holds the key.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SeoWriterError};
use crate::prompts::{BUILTIN_CATALOG_JSON, PromptCatalog, load_catalog_from};
use crate::types::ProviderKind;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "seowriter.toml";

/// Default prompt catalog file name, written next to the config.
const PROMPTS_FILE_NAME: &str = "prompts.json";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".seowriter";

// ---------------------------------------------------------------------------
// Config structs (matching seowriter.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Active LLM provider identifier: "openai" or "claude".
    #[serde(default = "default_ai_provider")]
    pub ai_provider: String,

    /// Article parameters.
    #[serde(default)]
    pub article: GenerationConfig,

    /// OpenAI settings.
    #[serde(default = "default_openai_section")]
    pub openai: ProviderSection,

    /// Anthropic Claude settings.
    #[serde(default = "default_claude_section")]
    pub claude: ProviderSection,

    /// Search backend settings.
    #[serde(default)]
    pub serp: SerpSection,

    /// Content fetch settings.
    #[serde(default)]
    pub fetch: FetchSection,

    /// Generation run settings.
    #[serde(default)]
    pub generation: GenerationSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ai_provider: default_ai_provider(),
            article: GenerationConfig::default(),
            openai: default_openai_section(),
            claude: default_claude_section(),
            serp: SerpSection::default(),
            fetch: FetchSection::default(),
            generation: GenerationSection::default(),
        }
    }
}

fn default_ai_provider() -> String {
    "openai".into()
}

/// `[article]` section: the parameters of one article. Immutable during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_language")]
    pub language: String,
    /// Selects the template in the prompt catalog.
    #[serde(default = "default_article_type")]
    pub article_type: String,
    #[serde(default)]
    pub expertise_field: String,
    #[serde(default)]
    pub keyphrase: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub product_description: String,
    #[serde(default)]
    pub product_url: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            article_type: default_article_type(),
            expertise_field: String::new(),
            keyphrase: String::new(),
            product_name: String::new(),
            product_description: String::new(),
            product_url: String::new(),
        }
    }
}

fn default_language() -> String {
    "English".into()
}
fn default_article_type() -> String {
    "guide".into()
}

/// `[openai]` / `[claude]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSection {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Total attempts per chat turn (not re-tries after the first).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

fn default_max_tokens() -> u32 {
    4096
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_retries() -> u32 {
    3
}
fn default_provider_timeout() -> u64 {
    120
}

fn default_openai_section() -> ProviderSection {
    ProviderSection {
        api_key_env: Some(default_api_key_env(ProviderKind::OpenAi).into()),
        max_tokens: default_max_tokens(),
        temperature: default_temperature(),
        max_retries: default_max_retries(),
        default_model: Some(default_model(ProviderKind::OpenAi).into()),
        base_url: Some(default_base_url(ProviderKind::OpenAi).into()),
        timeout_secs: default_provider_timeout(),
    }
}

fn default_claude_section() -> ProviderSection {
    ProviderSection {
        api_key_env: Some(default_api_key_env(ProviderKind::Claude).into()),
        max_tokens: default_max_tokens(),
        temperature: default_temperature(),
        max_retries: default_max_retries(),
        default_model: Some(default_model(ProviderKind::Claude).into()),
        base_url: Some(default_base_url(ProviderKind::Claude).into()),
        timeout_secs: default_provider_timeout(),
    }
}

fn default_api_key_env(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::OpenAi => "OPENAI_API_KEY",
        ProviderKind::Claude => "ANTHROPIC_API_KEY",
    }
}

fn default_model(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::OpenAi => "gpt-4o",
        ProviderKind::Claude => "claude-3-5-sonnet-latest",
    }
}

fn default_base_url(kind: ProviderKind) -> &'static str {
    match kind {
        ProviderKind::OpenAi => "https://api.openai.com/v1",
        ProviderKind::Claude => "https://api.anthropic.com",
    }
}

/// `[serp]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerpSection {
    #[serde(default = "default_serp_key_env")]
    pub api_key_env: String,

    /// Two-letter country code (`gl`).
    #[serde(default = "default_country")]
    pub country: String,

    /// Interface language (`hl`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Free-form search location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default = "default_serp_base_url")]
    pub base_url: String,

    #[serde(default = "default_serp_timeout")]
    pub timeout_secs: u64,
}

impl Default for SerpSection {
    fn default() -> Self {
        Self {
            api_key_env: default_serp_key_env(),
            country: default_country(),
            language: None,
            location: None,
            max_results: default_max_results(),
            base_url: default_serp_base_url(),
            timeout_secs: default_serp_timeout(),
        }
    }
}

fn default_serp_key_env() -> String {
    "SERPAPI_API_KEY".into()
}
fn default_country() -> String {
    "us".into()
}
fn default_max_results() -> usize {
    5
}
fn default_serp_base_url() -> String {
    "https://serpapi.com".into()
}
fn default_serp_timeout() -> u64 {
    30
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSection {
    /// Maximum concurrent page downloads.
    #[serde(default = "default_fetch_concurrency")]
    pub concurrency: usize,

    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            concurrency: default_fetch_concurrency(),
            timeout_secs: default_fetch_timeout(),
        }
    }
}

fn default_fetch_concurrency() -> usize {
    5
}
fn default_fetch_timeout() -> u64 {
    30
}

/// `[generation]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationSection {
    /// Base backoff delay; attempt `n` waits `retry_delay_secs * 2^n`.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    /// Prompt catalog path. The built-in catalog is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts_path: Option<String>,
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self {
            retry_delay_secs: default_retry_delay(),
            prompts_path: None,
        }
    }
}

fn default_retry_delay() -> u64 {
    5
}

// ---------------------------------------------------------------------------
// Runtime configs (resolved from AppConfig + environment)
// ---------------------------------------------------------------------------

/// Runtime LLM provider configuration with the credential resolved.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub credential: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Total attempts per turn, at least 1.
    pub max_retries: u32,
    pub default_model: String,
    pub base_url: String,
    pub timeout: Duration,
}

/// Runtime search configuration.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_key: String,
    pub country: String,
    pub language: Option<String>,
    pub location: Option<String>,
    pub max_results: usize,
    pub base_url: String,
    pub timeout: Duration,
}

/// Runtime fetch configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub concurrency: usize,
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from(&FetchSection::default())
    }
}

impl From<&FetchSection> for FetchConfig {
    fn from(section: &FetchSection) -> Self {
        Self {
            concurrency: section.concurrency.max(1),
            timeout: Duration::from_secs(section.timeout_secs),
        }
    }
}

impl AppConfig {
    /// Parse the configured provider identifier.
    pub fn provider_kind(&self) -> Result<ProviderKind> {
        self.ai_provider.parse()
    }

    /// Section for the given provider.
    pub fn provider_section(&self, kind: ProviderKind) -> &ProviderSection {
        match kind {
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::Claude => &self.claude,
        }
    }

    /// Build the runtime config for the active provider, reading its API key
    /// from the environment.
    pub fn provider_config(&self) -> Result<ProviderConfig> {
        let kind = self.provider_kind()?;
        let section = self.provider_section(kind);

        if section.max_retries == 0 {
            return Err(SeoWriterError::config(format!(
                "[{kind}] max_retries must be at least 1"
            )));
        }
        if !(0.0..=2.0).contains(&section.temperature) {
            return Err(SeoWriterError::config(format!(
                "[{kind}] temperature {} is outside 0.0..=2.0",
                section.temperature
            )));
        }

        let key_env = section
            .api_key_env
            .as_deref()
            .unwrap_or(default_api_key_env(kind));

        Ok(ProviderConfig {
            kind,
            credential: resolve_api_key(key_env, kind.display_name())?,
            max_tokens: section.max_tokens,
            temperature: section.temperature,
            max_retries: section.max_retries,
            default_model: section
                .default_model
                .clone()
                .unwrap_or_else(|| default_model(kind).into()),
            base_url: section
                .base_url
                .clone()
                .unwrap_or_else(|| default_base_url(kind).into()),
            timeout: Duration::from_secs(section.timeout_secs),
        })
    }

    /// Build the runtime search config, reading the API key from the environment.
    pub fn search_config(&self) -> Result<SearchConfig> {
        if self.serp.max_results == 0 {
            return Err(SeoWriterError::config("[serp] max_results must be at least 1"));
        }

        Ok(SearchConfig {
            api_key: resolve_api_key(&self.serp.api_key_env, "SerpApi")?,
            country: self.serp.country.clone(),
            language: self.serp.language.clone(),
            location: self.serp.location.clone(),
            max_results: self.serp.max_results,
            base_url: self.serp.base_url.clone(),
            timeout: Duration::from_secs(self.serp.timeout_secs),
        })
    }

    /// Build the runtime fetch config.
    pub fn fetch_config(&self) -> Result<FetchConfig> {
        if self.fetch.concurrency == 0 {
            return Err(SeoWriterError::config("[fetch] concurrency must be at least 1"));
        }
        Ok(FetchConfig::from(&self.fetch))
    }

    /// Base delay for chat retry backoff.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.generation.retry_delay_secs)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.seowriter/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SeoWriterError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.seowriter/seowriter.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SeoWriterError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        SeoWriterError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Load the prompt catalog named by the config, or the built-in one.
pub fn load_prompt_catalog(config: &AppConfig) -> Result<PromptCatalog> {
    match config.generation.prompts_path.as_deref() {
        Some(p) => load_catalog_from(Path::new(p)),
        None => PromptCatalog::builtin(),
    }
}

/// Create the config directory and write a default config file plus an
/// editable copy of the built-in prompt catalog.
/// Returns the path to the created config file.
pub fn init_config() -> Result<PathBuf> {
    init_config_in(&config_dir()?)
}

/// [`init_config`] against an explicit directory.
///
/// An existing config file is never overwritten: that is a `Config` error.
/// An existing prompt catalog is left as is.
pub fn init_config_in(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        return Err(SeoWriterError::config(format!(
            "config file already exists at {}; edit it or remove it to re-initialize",
            path.display()
        )));
    }

    std::fs::create_dir_all(dir).map_err(|e| SeoWriterError::io(dir, e))?;

    let prompts_path = dir.join(PROMPTS_FILE_NAME);
    if !prompts_path.exists() {
        std::fs::write(&prompts_path, BUILTIN_CATALOG_JSON)
            .map_err(|e| SeoWriterError::io(&prompts_path, e))?;
    }

    let mut config = AppConfig::default();
    config.generation.prompts_path = Some(prompts_path.to_string_lossy().into_owned());
    let content =
        toml::to_string_pretty(&config).map_err(|e| SeoWriterError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SeoWriterError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read an API key from the named env var; missing or empty is a config error.
pub fn resolve_api_key(var_name: &str, service: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val.trim().to_string()),
        _ => Err(SeoWriterError::config(format!(
            "{service} API key not found. Set the {var_name} environment variable."
        ))),
    }
}
