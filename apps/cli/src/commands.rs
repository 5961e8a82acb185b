//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use seowriter_core::{ArticleGenerator, GenerationOutcome, PipelineConfig, ProgressReporter};
use seowriter_shared::{
    AppConfig, GenerationConfig, init_config, load_config, load_config_from, load_prompt_catalog,
};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// SeoWriter: research a keyphrase and write an SEO article with an LLM.
#[derive(Parser)]
#[command(
    name = "seowriter",
    version,
    about = "Search, summarize, and generate SEO articles with OpenAI or Claude.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.seowriter/seowriter.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Generate one article and write it as Markdown.
    Generate {
        #[command(flatten)]
        article: ArticleArgs,

        /// AI provider: openai or claude (overrides ai_provider).
        #[arg(short, long)]
        provider: Option<String>,

        /// Output file.
        #[arg(short, long, default_value = "generated_article.md")]
        out: PathBuf,
    },

    /// List article types in the prompt catalog.
    Prompts,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Article parameters; each one overrides its `[article]` config key.
#[derive(Args, Debug, Default)]
pub(crate) struct ArticleArgs {
    /// Keyphrase to research and write about.
    #[arg(short, long)]
    pub keyphrase: Option<String>,

    /// Article type from the prompt catalog.
    #[arg(short = 't', long)]
    pub article_type: Option<String>,

    /// Language the article is written in.
    #[arg(short, long)]
    pub language: Option<String>,

    /// Field of expertise the writer speaks from.
    #[arg(long)]
    pub expertise_field: Option<String>,

    /// Product to feature in the article.
    #[arg(long)]
    pub product_name: Option<String>,

    #[arg(long)]
    pub product_description: Option<String>,

    #[arg(long)]
    pub product_url: Option<String>,
}

impl ArticleArgs {
    fn apply(self, article: &mut GenerationConfig) {
        let fields = [
            (self.keyphrase, &mut article.keyphrase),
            (self.article_type, &mut article.article_type),
            (self.language, &mut article.language),
            (self.expertise_field, &mut article.expertise_field),
            (self.product_name, &mut article.product_name),
            (self.product_description, &mut article.product_description),
            (self.product_url, &mut article.product_url),
        ];
        for (value, slot) in fields {
            if let Some(v) = value {
                *slot = v;
            }
        }
    }
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file and prompt catalog with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "seowriter=info",
        1 => "seowriter=debug",
        _ => "seowriter=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Generate {
            article,
            provider,
            out,
        } => cmd_generate(config_path, article, provider, &out).await,
        Command::Prompts => cmd_prompts(config_path),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

fn read_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_generate(
    config_path: Option<&Path>,
    article: ArticleArgs,
    provider: Option<String>,
    out: &Path,
) -> Result<()> {
    let mut config = read_config(config_path)?;
    article.apply(&mut config.article);
    if let Some(p) = provider {
        config.ai_provider = p;
    }

    if config.article.keyphrase.trim().is_empty() {
        return Err(eyre!(
            "no keyphrase configured: pass --keyphrase or set [article].keyphrase"
        ));
    }

    let pipeline = PipelineConfig::from_app_config(&config)?;
    let generator = ArticleGenerator::new(pipeline)?;

    info!(
        keyphrase = %config.article.keyphrase,
        article_type = %config.article.article_type,
        provider = %config.ai_provider,
        "generating article"
    );

    let start = Instant::now();
    let reporter = CliProgress::new();
    let outcome = generator.run(&reporter).await;
    reporter.finish();

    let text = match outcome {
        GenerationOutcome::Completed(text) => text,
        GenerationOutcome::Failed(message) => {
            eprintln!("\n  Article generation failed: {message}\n");
            std::process::exit(1);
        }
    };

    std::fs::write(out, &text)
        .wrap_err_with(|| format!("failed to write article to {}", out.display()))?;

    println!();
    println!("  Article generated successfully!");
    println!("  Words:  {}", text.split_whitespace().count());
    println!("  Output: {}", out.display());
    println!("  Time:   {:.1}s", start.elapsed().as_secs_f64());
    println!();

    Ok(())
}

fn cmd_prompts(config_path: Option<&Path>) -> Result<()> {
    let config = read_config(config_path)?;
    let catalog = load_prompt_catalog(&config)?;

    println!("{:<20} {:>6} {:>9}", "ARTICLE TYPE", "STEPS", "INCLUDED");
    for (name, template) in catalog.iter() {
        let included = template.steps.iter().filter(|s| s.include_in_output).count();
        println!("{name:<20} {:>6} {included:>9}", template.steps.len());
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = read_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif percentage bar.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos:>3}% {prefix} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .progress_chars("=> ");
        bar.set_style(style);
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { bar }
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.bar.set_prefix(name.to_string());
    }

    fn progress(&self, percent: f64, detail: &str) {
        self.bar.set_position(percent.round() as u64);
        self.bar.set_message(detail.to_string());
    }
}
