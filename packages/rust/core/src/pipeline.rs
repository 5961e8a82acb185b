//! Article generation pipeline: search → fetch → summarize → reduce → steps.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use seowriter_ai::{ChatSession, SendOptions};
use seowriter_crawler::Fetcher;
use seowriter_search::search_top_urls;
use seowriter_shared::{
    AppConfig, FetchConfig, GenerationConfig, PromptCatalog, PromptTemplate, ProviderConfig,
    Result, RunId, SearchConfig, SeoWriterError, TemplateContext, load_prompt_catalog, render,
};

use crate::progress::{MonotonicProgress, ProgressReporter, step_percent};
use crate::summarizer::{join_summaries, summarize};

// Progress checkpoints, in percent.
const SEARCH_DONE: f64 = 5.0;
const FETCH_DONE: f64 = 10.0;
const SUMMARIES_DONE: f64 = 15.0;
const COMBINED_DONE: f64 = 20.0;
const SESSION_READY: f64 = 22.0;

/// Everything one generation run needs, already loaded and validated.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub article: GenerationConfig,
    pub provider: ProviderConfig,
    pub search: SearchConfig,
    pub fetch: FetchConfig,
    /// Base delay for chat retry backoff.
    pub retry_delay: Duration,
    pub catalog: PromptCatalog,
}

impl PipelineConfig {
    /// Resolve runtime configs (and API keys) from the user config.
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            article: config.article.clone(),
            provider: config.provider_config()?,
            search: config.search_config()?,
            fetch: config.fetch_config()?,
            retry_delay: config.retry_delay(),
            catalog: load_prompt_catalog(config)?,
        })
    }
}

/// A finished article and its run metadata.
#[derive(Debug, Clone)]
pub struct Article {
    pub run_id: RunId,
    /// Included step replies, newline-joined. Markdown.
    pub text: String,
    /// Pages that contributed content, in search rank order.
    pub sources: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Chat turns issued (summaries plus steps).
    pub chat_calls: usize,
}

/// Terminal state of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Completed(String),
    Failed(String),
}

/// Drives one article through every stage.
pub struct ArticleGenerator {
    article: GenerationConfig,
    provider: ProviderConfig,
    search: SearchConfig,
    fetcher: Fetcher,
    retry_delay: Duration,
    template: PromptTemplate,
}

impl ArticleGenerator {
    /// Bind the generator to its config. Fails when the article type is not
    /// in the catalog or the fetch client cannot be built.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let template = config.catalog.get(&config.article.article_type)?.clone();
        let fetcher = Fetcher::new(config.fetch)?;

        Ok(Self {
            article: config.article,
            provider: config.provider,
            search: config.search,
            fetcher,
            retry_delay: config.retry_delay,
            template,
        })
    }

    /// Run the pipeline and fold the result into a terminal outcome.
    pub async fn run(&self, progress: &dyn ProgressReporter) -> GenerationOutcome {
        match self.generate(progress).await {
            Ok(article) => GenerationOutcome::Completed(article.text),
            Err(e) => {
                debug!(error = %e, "article generation failed");
                GenerationOutcome::Failed(e.to_string())
            }
        }
    }

    /// Run the pipeline, short-circuiting on the first failing stage.
    #[instrument(
        skip_all,
        fields(
            run_id = tracing::field::Empty,
            keyphrase = %self.article.keyphrase,
            article_type = %self.article.article_type,
            provider = %self.provider.kind,
        )
    )]
    pub async fn generate(&self, progress: &dyn ProgressReporter) -> Result<Article> {
        let run_id = RunId::new();
        tracing::Span::current().record("run_id", tracing::field::display(&run_id));

        let start = Instant::now();
        let started_at = Utc::now();
        let progress = MonotonicProgress::new(progress);
        let mut chat_calls = 0usize;

        info!(%run_id, "starting generation");

        // --- Phase 1: Search ---
        progress.phase("Searching");
        let urls = search_top_urls(&self.article.keyphrase, &self.search).await?;
        info!(count = urls.len(), "search complete");
        progress.progress(SEARCH_DONE, &format!("found {} results", urls.len()));

        // --- Phase 2: Fetch ---
        progress.phase("Fetching pages");
        let contents = self.fetcher.fetch_all(&urls).await?;
        progress.progress(FETCH_DONE, &format!("fetched {} of {} pages", contents.len(), urls.len()));

        // --- Phase 3: Summarize, then reduce ---
        progress.phase("Summarizing content");
        let total = contents.len();
        let mut summaries = Vec::with_capacity(total);
        for (i, content) in contents.iter().enumerate() {
            let summary = summarize(&content.text, &self.provider, self.retry_delay).await?;
            chat_calls += 1;
            summaries.push(summary);
            let percent = FETCH_DONE + (SUMMARIES_DONE - FETCH_DONE) * (i + 1) as f64 / total as f64;
            progress.progress(percent, content.url.as_str());
        }
        progress.progress(SUMMARIES_DONE, "pages summarized");

        let combined = summarize(&join_summaries(&summaries), &self.provider, self.retry_delay).await?;
        chat_calls += 1;
        progress.progress(COMBINED_DONE, "combined summary ready");

        // --- Phase 4: Open the generation session ---
        progress.phase("Generating article");
        let context = TemplateContext::for_article(&self.article, &combined);
        let system_prompt = render(&self.template.system_prompt, &context)?;
        let mut session = ChatSession::initialize(&system_prompt, &self.provider)?;
        progress.progress(SESSION_READY, "AI chat ready");

        // --- Phase 5: Steps ---
        let options = SendOptions::with_retry_delay(self.retry_delay);
        let steps = &self.template.steps;
        let mut sections = Vec::new();
        for (index, step) in steps.iter().enumerate() {
            let prompt = render(&step.prompt_template, &context)?;
            let reply = session
                .send(&prompt, &options)
                .await
                .map_err(|e| SeoWriterError::Step {
                    index,
                    message: e.to_string(),
                })?;
            chat_calls += 1;

            if step.include_in_output {
                sections.push(reply);
            }
            progress.progress(
                step_percent(SESSION_READY, index, steps.len()),
                &format!("step {}/{}", index + 1, steps.len()),
            );
        }

        // --- Phase 6: Assemble ---
        let text = sections.join("\n");
        let finished_at = Utc::now();

        info!(
            %run_id,
            chat_calls,
            sections = sections.len(),
            chars = text.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "generation complete"
        );
        progress.progress(100.0, "done");

        Ok(Article {
            run_id,
            text,
            sources: contents.iter().map(|c| c.url.to_string()).collect(),
            started_at,
            finished_at,
            chat_calls,
        })
    }
}
