//! Read-mode article extraction.
//!
//! Given an article URL, [`Pipeline`] obtains the page through an ordered
//! list of retrieval strategies (reader service, web proxy, archive
//! snapshot, direct fetches) and isolates the article from it through an
//! ordered list of extraction strategies (readability heuristic, JSON-LD,
//! semantic selectors), returning a sanitized [`ExtractedArticle`] or a
//! classified [`PipelineError`].
//!
//! ```rust,no_run
//! # #[tokio::main]
//! # async fn main() {
//! let outcome = readmode_core::read_mode("https://example.com/article").await;
//! println!("{} {:?}", outcome.status_code(), outcome.to_response());
//! # }
//! ```

pub mod article;
pub mod error;
pub mod extract;
pub mod fetch;
#[cfg(feature = "markdown")]
pub mod markdown;
pub mod metadata;
pub mod parse;
pub mod pipeline;
pub mod postprocess;
pub mod preprocess;
pub mod readability;
pub mod retrieve;
pub mod scoring;
pub mod selectors;
pub mod structured;
pub mod text;
pub mod trace;

pub use article::{ExtractedArticle, PipelineOutcome, ReadModeResponse, RetrievalResult, StructuredArticle};
pub use error::{FailureReason, PipelineError, ReadModeError, Result};
pub use extract::{ExtractionConfig, ExtractionStrategy, extract_article};
pub use fetch::{FetchedPage, Fetcher, HeaderProfile};
#[cfg(feature = "markdown")]
pub use markdown::MarkdownConfig;
pub use metadata::Metadata;
pub use parse::{Document, Element};
pub use pipeline::{Pipeline, PipelineConfig, PipelineConfigBuilder, read_mode, validate_url};
#[doc(hidden)]
pub use postprocess::PostProcessConfig;
#[doc(hidden)]
pub use preprocess::PreprocessConfig;
pub use readability::{ReadabilityConfig, ReadabilityContent};
pub use retrieve::{RetrievalConfig, RetrievalStrategy, StrategyTimeouts, retrieve};
#[doc(hidden)]
pub use scoring::{ElementScore, ScoringConfig, score_element};
pub use trace::{Attempt, AttemptOutcome, Trace};
