//! Top-level read-mode pipeline.
//!
//! # Example
//!
//! ```rust,no_run
//! use readmode_core::{Pipeline, PipelineConfig, RetrievalStrategy};
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PipelineConfig::builder()
//!     .overall_timeout(Duration::from_secs(30))
//!     .retrieval_strategies(RetrievalStrategy::parse_list("web-proxy,direct")?)
//!     .build();
//!
//! let pipeline = Pipeline::with_config(config)?;
//! let outcome = pipeline.run("https://example.com/article").await;
//! println!("{}", serde_json::to_string(&outcome.to_response())?);
//! # Ok(())
//! # }
//! ```

use std::time::{Duration, Instant};

use url::Url;

use crate::article::{ExtractedArticle, PipelineOutcome, RetrievalResult};
use crate::error::{FailureReason, PipelineError};
use crate::extract::{ExtractionConfig, ExtractionStrategy, extract_article};
use crate::fetch::Fetcher;
use crate::readability::ReadabilityConfig;
use crate::retrieve::{RetrievalConfig, RetrievalStrategy, StrategyTimeouts, retrieve};
use crate::trace::Trace;
use crate::Result;

/// Configuration for a whole pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Budget for retrieval and extraction together (default: 45 s)
    pub overall_timeout: Duration,
    pub retrieval: RetrievalConfig,
    pub extraction: ExtractionConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            overall_timeout: Duration::from_secs(45),
            retrieval: RetrievalConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Creates a new builder for PipelineConfig.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }
}

/// Builder for PipelineConfig.
///
/// ```rust
/// use readmode_core::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .min_readability_words(100)
///     .degraded_acceptance(false)
///     .strip_images(true)
///     .build();
/// assert_eq!(config.extraction.min_readability_words, 100);
/// ```
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: PipelineConfig::default() }
    }

    pub fn overall_timeout(mut self, value: Duration) -> Self {
        self.config.overall_timeout = value;
        self
    }

    /// Sets the retrieval strategies in the order they are tried.
    pub fn retrieval_strategies(mut self, value: Vec<RetrievalStrategy>) -> Self {
        self.config.retrieval.strategies = value;
        self
    }

    /// Sets the extraction strategies in the order they are tried.
    pub fn extraction_strategies(mut self, value: Vec<ExtractionStrategy>) -> Self {
        self.config.extraction.strategies = value;
        self
    }

    /// Sets the reader service endpoint template.
    pub fn reader_proxy(mut self, template: impl Into<String>) -> Self {
        self.config.retrieval.reader_proxy = template.into();
        self
    }

    /// Sets the web proxy endpoint template.
    pub fn web_proxy(mut self, template: impl Into<String>) -> Self {
        self.config.retrieval.web_proxy = template.into();
        self
    }

    /// Sets the archive availability API template.
    pub fn archive_api(mut self, template: impl Into<String>) -> Self {
        self.config.retrieval.archive_api = template.into();
        self
    }

    pub fn strategy_timeouts(mut self, value: StrategyTimeouts) -> Self {
        self.config.retrieval.timeouts = value;
        self
    }

    pub fn min_readability_words(mut self, value: usize) -> Self {
        self.config.extraction.min_readability_words = value;
        self
    }

    pub fn min_structured_chars(mut self, value: usize) -> Self {
        self.config.extraction.min_structured_chars = value;
        self
    }

    pub fn min_selector_words(mut self, value: usize) -> Self {
        self.config.extraction.min_selector_words = value;
        self
    }

    /// Sets whether below-bar readability output is accepted as a last resort.
    pub fn degraded_acceptance(mut self, value: bool) -> Self {
        self.config.extraction.degraded_acceptance = value;
        self
    }

    pub fn degraded_min_words(mut self, value: usize) -> Self {
        self.config.extraction.degraded_min_words = value;
        self
    }

    /// Sets whether images are stripped from the article markup.
    pub fn strip_images(mut self, value: bool) -> Self {
        self.config.extraction.postprocess.strip_images = value;
        self
    }

    pub fn readability(mut self, value: ReadabilityConfig) -> Self {
        self.config.extraction.readability = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> PipelineConfig {
        self.config
    }
}

impl Default for PipelineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a read-mode request URL.
///
/// Only absolute `http`/`https` URLs with a host are accepted.
pub fn validate_url(input: &str) -> std::result::Result<Url, PipelineError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(PipelineError::from_reason(FailureReason::InvalidInput));
    }

    let url = Url::parse(input).map_err(|_| PipelineError::invalid_input("Invalid URL"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(PipelineError::invalid_input("URL must use http or https"));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(PipelineError::invalid_input("URL must include a host"));
    }

    Ok(url)
}

/// Retrieval followed by extraction, for one URL at a time.
///
/// Runs share no state beyond the HTTP connection pool, so one `Pipeline` can
/// serve many concurrent requests.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    fetcher: Fetcher,
}

impl Pipeline {
    /// Creates a pipeline with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(PipelineConfig::default())
    }

    pub fn with_config(config: PipelineConfig) -> Result<Self> {
        Ok(Self { config, fetcher: Fetcher::new()? })
    }

    /// Creates a pipeline around an existing fetcher.
    pub fn with_fetcher(config: PipelineConfig, fetcher: Fetcher) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Produce a readable article for `url`.
    pub async fn run(&self, url: &str) -> PipelineOutcome {
        self.run_traced(url).await.0
    }

    /// Like [`run`](Self::run), also returning the attempted strategies.
    ///
    /// Invalid input fails before any network call. When the overall budget
    /// elapses the trace holds the attempts that had finished.
    pub async fn run_traced(&self, url: &str) -> (PipelineOutcome, Trace) {
        let mut trace = Trace::new();
        let started = Instant::now();

        let result = match validate_url(url) {
            Ok(target) => {
                match tokio::time::timeout(self.config.overall_timeout, self.execute(&target, &mut trace)).await {
                    Ok(result) => result,
                    Err(_) => Err(PipelineError::from_reason(FailureReason::Timeout)),
                }
            }
            Err(err) => Err(err),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(article) => {
                tracing::info!(url, elapsed_ms, title = %article.title, "read-mode succeeded");
            }
            Err(err) => {
                tracing::warn!(url, elapsed_ms, reason = ?err.reason, "read-mode failed");
            }
        }

        (result.into(), trace)
    }

    async fn execute(&self, url: &Url, trace: &mut Trace) -> std::result::Result<ExtractedArticle, PipelineError> {
        match retrieve(&self.fetcher, url, &self.config.retrieval, trace).await? {
            RetrievalResult::Structured { article, source } => {
                tracing::debug!(url = %url, strategy = %source, "skipping extraction for pre-extracted content");
                Ok(ExtractedArticle::from_structured(article, url))
            }
            RetrievalResult::RawHtml { body, .. } => extract_article(&body, url, &self.config.extraction, trace),
        }
    }
}

/// One-shot run with default settings.
pub async fn read_mode(url: &str) -> PipelineOutcome {
    if let Err(err) = validate_url(url) {
        return PipelineOutcome::Failure(err);
    }

    match Pipeline::new() {
        Ok(pipeline) => pipeline.run(url).await,
        Err(err) => {
            tracing::error!(reason = %err, "HTTP client could not be created");
            PipelineOutcome::Failure(PipelineError::from_reason(FailureReason::AllRetrievalStrategiesExhausted))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://example.com/a")]
    #[case("http://example.com")]
    #[case("  https://example.com/path?q=1  ")]
    fn test_valid_urls(#[case] input: &str) {
        assert!(validate_url(input).is_ok());
    }

    #[rstest]
    #[case("", "URL is required")]
    #[case("   ", "URL is required")]
    #[case("not-a-url", "Invalid URL")]
    #[case("ftp://example.com/file", "URL must use http or https")]
    #[case("javascript:alert(1)", "URL must use http or https")]
    fn test_invalid_urls(#[case] input: &str, #[case] message: &str) {
        let err = validate_url(input).unwrap_err();
        assert_eq!(err.reason, FailureReason::InvalidInput);
        assert_eq!(err.message, message);
    }

    #[test]
    fn test_builder_defaults() {
        let config = PipelineConfig::builder().build();
        assert_eq!(config.overall_timeout, Duration::from_secs(45));
        assert_eq!(config.retrieval.min_reader_chars, 200);
        assert_eq!(config.extraction.min_structured_chars, 250);
        assert!(config.extraction.degraded_acceptance);
    }

    #[test]
    fn test_builder_overrides() {
        let config = PipelineConfig::builder()
            .web_proxy("https://proxy.example/?u={url}")
            .extraction_strategies(vec![ExtractionStrategy::Selectors])
            .strip_images(true)
            .degraded_min_words(20)
            .build();

        assert_eq!(config.retrieval.web_proxy, "https://proxy.example/?u={url}");
        assert_eq!(config.extraction.strategies, vec![ExtractionStrategy::Selectors]);
        assert!(config.extraction.postprocess.strip_images);
        assert_eq!(config.extraction.degraded_min_words, 20);
    }

    #[tokio::test]
    async fn test_invalid_input_records_nothing() {
        let pipeline = Pipeline::new().unwrap();
        let (outcome, trace) = pipeline.run_traced("not-a-url").await;

        assert_eq!(outcome.status_code(), 400);
        assert!(trace.retrieval.is_empty());
        assert!(trace.extraction.is_empty());
    }
}
