//! SeoWriter CLI: SEO article generation from live search results.
//!
//! Searches a keyphrase, summarizes the top pages, and drives a multi-step
//! LLM conversation that writes the article.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
