//! Extraction coordinator.
//!
//! Runs the extraction strategies in order over one raw HTML page. Every
//! strategy must clear its own quality gate; the first that does wins. When
//! none does, the readability output can still be accepted as a degraded
//! result if it holds any text at all.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::Serialize;
use url::Url;

use crate::article::{ExtractedArticle, fallback_title};
use crate::error::{FailureReason, PipelineError};
use crate::metadata::Metadata;
use crate::parse::Document;
use crate::postprocess::{PostProcessConfig, postprocess_html};
use crate::preprocess::PreprocessConfig;
use crate::readability::{self, ReadabilityConfig};
use crate::selectors::extract_by_selectors;
use crate::structured::extract_structured;
use crate::text::{count_words, html_to_text};
use crate::trace::{AttemptOutcome, Trace};
use crate::{ReadModeError, Result};

/// One way of isolating the article from a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionStrategy {
    /// Content-density heuristic over the cleaned DOM
    Readability,
    /// JSON-LD `Article` bodies
    StructuredData,
    /// Common article-body selectors over the cleaned DOM
    Selectors,
}

impl ExtractionStrategy {
    pub const ALL: [ExtractionStrategy; 3] =
        [ExtractionStrategy::Readability, ExtractionStrategy::StructuredData, ExtractionStrategy::Selectors];

    pub fn name(self) -> &'static str {
        match self {
            ExtractionStrategy::Readability => "readability",
            ExtractionStrategy::StructuredData => "structured-data",
            ExtractionStrategy::Selectors => "selectors",
        }
    }

    /// Parse a comma-separated list of strategy names.
    pub fn parse_list(list: &str) -> std::result::Result<Vec<ExtractionStrategy>, String> {
        let strategies = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if strategies.is_empty() {
            return Err("at least one extraction strategy is required".to_string());
        }
        Ok(strategies)
    }
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ExtractionStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "readability" => Ok(ExtractionStrategy::Readability),
            "structured-data" | "json-ld" => Ok(ExtractionStrategy::StructuredData),
            "selectors" => Ok(ExtractionStrategy::Selectors),
            _ => Err(format!("unknown extraction strategy '{s}'")),
        }
    }
}

/// Configuration for the extraction stage.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Strategies in the order they are tried
    pub strategies: Vec<ExtractionStrategy>,
    /// Readability output must exceed this many words (default: 50)
    pub min_readability_words: usize,
    /// Structured-data bodies must exceed this many characters (default: 250)
    pub min_structured_chars: usize,
    /// Selector matches must exceed this many words (default: 80)
    pub min_selector_words: usize,
    /// Accept below-bar readability output when nothing else qualifies
    pub degraded_acceptance: bool,
    /// Word floor for degraded acceptance (default: 1)
    pub degraded_min_words: usize,
    pub readability: ReadabilityConfig,
    pub postprocess: PostProcessConfig,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            strategies: ExtractionStrategy::ALL.to_vec(),
            min_readability_words: 50,
            min_structured_chars: 250,
            min_selector_words: 80,
            degraded_acceptance: true,
            degraded_min_words: 1,
            readability: ReadabilityConfig::default(),
            postprocess: PostProcessConfig::default(),
        }
    }
}

/// Output of one strategy before its quality gate.
#[derive(Debug, Clone)]
struct Candidate {
    content_html: String,
    plain_text: String,
    words: usize,
    /// Readability score, when it fell below the configured minimum
    low_score: Option<f64>,
    title: Option<String>,
    byline: Option<String>,
    site_name: Option<String>,
}

impl Candidate {
    fn from_html(content: &str, postprocess: &PostProcessConfig) -> Result<Self> {
        let content_html = postprocess_html(content, postprocess);
        let plain_text = html_to_text(&content_html);
        if content_html.is_empty() || plain_text.is_empty() {
            return Err(ReadModeError::NoContent);
        }

        let words = count_words(&plain_text);
        Ok(Self { content_html, plain_text, words, low_score: None, title: None, byline: None, site_name: None })
    }

    fn into_article(self, url: &Url) -> ExtractedArticle {
        ExtractedArticle {
            title: self.title.unwrap_or_else(|| fallback_title(url)),
            content_html: self.content_html,
            plain_text: self.plain_text,
            byline: self.byline,
            site_name: self.site_name,
        }
    }
}

/// Extract the article from a retrieved page.
///
/// `url` resolves relative links and images and provides the last-resort
/// title. Each DOM strategy works on its own fresh parse.
///
/// # Errors
///
/// [`FailureReason::NoExtractionStrategySucceeded`] when no strategy clears
/// its gate and degraded acceptance does not apply.
pub fn extract_article(
    html: &str, url: &Url, config: &ExtractionConfig, trace: &mut Trace,
) -> std::result::Result<ExtractedArticle, PipelineError> {
    let raw = Document::parse(html).map_err(|err| {
        tracing::warn!(url = %url, reason = %err, "page could not be parsed");
        PipelineError::from_reason(FailureReason::NoExtractionStrategySucceeded)
    })?;
    let metadata = raw.extract_metadata();
    let preprocess = PreprocessConfig::with_base_url(url);
    let mut degraded: Option<Candidate> = None;

    for &strategy in &config.strategies {
        let started = Instant::now();
        let result = match strategy {
            ExtractionStrategy::Readability => readability_candidate(html, &preprocess, &metadata, config),
            ExtractionStrategy::StructuredData => structured_candidate(&raw, &metadata, config),
            ExtractionStrategy::Selectors => selector_candidate(html, &preprocess, &metadata, config),
        };
        let elapsed = started.elapsed();
        let elapsed_ms = elapsed.as_millis() as u64;

        let failure = match result {
            Ok(candidate) => match quality_gate(strategy, &candidate, config) {
                Ok(()) => {
                    tracing::info!(url = %url, strategy = %strategy, elapsed_ms, words = candidate.words, "extraction succeeded");
                    trace.record_extraction(strategy, elapsed, AttemptOutcome::Accepted);
                    return Ok(candidate.into_article(url));
                }
                Err(err) => {
                    if strategy == ExtractionStrategy::Readability {
                        degraded = Some(candidate);
                    }
                    err
                }
            },
            Err(err) => err,
        };

        tracing::warn!(url = %url, strategy = %strategy, elapsed_ms, reason = %failure, "extraction strategy rejected");
        trace.record_extraction(
            strategy,
            elapsed,
            AttemptOutcome::Failed { reason: failure.to_string(), timed_out: false },
        );
    }

    if config.degraded_acceptance
        && let Some(candidate) = degraded
        && candidate.words >= config.degraded_min_words
    {
        tracing::info!(url = %url, strategy = %ExtractionStrategy::Readability, words = candidate.words, "accepting degraded readability output");
        trace.record_extraction(ExtractionStrategy::Readability, Duration::ZERO, AttemptOutcome::AcceptedDegraded);
        return Ok(candidate.into_article(url));
    }

    Err(PipelineError::from_reason(FailureReason::NoExtractionStrategySucceeded))
}

fn quality_gate(strategy: ExtractionStrategy, candidate: &Candidate, config: &ExtractionConfig) -> Result<()> {
    if let Some(score) = candidate.low_score {
        return Err(ReadModeError::NotReadable { score, threshold: config.readability.min_score });
    }

    let (found, required) = match strategy {
        ExtractionStrategy::Readability => (candidate.words, config.min_readability_words),
        ExtractionStrategy::StructuredData => (candidate.plain_text.chars().count(), config.min_structured_chars),
        ExtractionStrategy::Selectors => (candidate.words, config.min_selector_words),
    };

    if found > required { Ok(()) } else { Err(ReadModeError::BelowThreshold { found, required }) }
}

fn readability_candidate(
    html: &str, preprocess: &PreprocessConfig, metadata: &Metadata, config: &ExtractionConfig,
) -> Result<Candidate> {
    let doc = Document::parse_cleaned(html, preprocess)?;
    let found = readability::extract_best(&doc, &config.readability)?;
    tracing::debug!(top_score = found.top_score, elements = found.element_count, "readability candidate");

    let candidate = Candidate::from_html(&found.content, &config.postprocess)?;
    Ok(Candidate {
        low_score: (found.top_score < config.readability.min_score).then_some(found.top_score),
        title: metadata.title.clone(),
        byline: metadata.byline.clone(),
        site_name: metadata.site_name.clone(),
        ..candidate
    })
}

fn structured_candidate(raw: &Document, metadata: &Metadata, config: &ExtractionConfig) -> Result<Candidate> {
    let article = extract_structured(raw)?;
    let candidate = Candidate::from_html(&article.content_html, &config.postprocess)?;

    Ok(Candidate {
        plain_text: article.plain_text,
        title: article.title.or_else(|| metadata.title.clone()),
        byline: article.byline,
        site_name: article.site_name,
        ..candidate
    })
}

fn selector_candidate(
    html: &str, preprocess: &PreprocessConfig, metadata: &Metadata, config: &ExtractionConfig,
) -> Result<Candidate> {
    let doc = Document::parse_cleaned(html, preprocess)?;
    let found = extract_by_selectors(&doc, config.min_selector_words)?;
    tracing::debug!(selector = found.selector, words = found.word_count, "selector match");

    let candidate = Candidate::from_html(&found.content, &config.postprocess)?;
    Ok(Candidate { title: metadata.title.clone(), ..candidate })
}
