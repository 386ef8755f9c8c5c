//! Article records produced by the pipeline.
//!
//! [`RetrievalResult`] is what the retrieval stage hands to extraction,
//! [`ExtractedArticle`] is the terminal success value, and
//! [`ReadModeResponse`] is its wire form.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{FailureReason, PipelineError};
use crate::retrieve::RetrievalStrategy;

/// A fully extracted, sanitized article.
///
/// Serializes with the field names of the read-mode response:
/// `title`, `content`, `textContent`, `byline`, `siteName`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedArticle {
    pub title: String,
    /// Sanitized article body markup
    #[serde(rename = "content")]
    pub content_html: String,
    #[serde(rename = "textContent")]
    pub plain_text: String,
    pub byline: Option<String>,
    #[serde(rename = "siteName")]
    pub site_name: Option<String>,
}

impl ExtractedArticle {
    /// Complete a pre-extracted article, falling back to the URL host for a
    /// missing title.
    pub fn from_structured(article: StructuredArticle, url: &Url) -> Self {
        Self {
            title: article.title.unwrap_or_else(|| fallback_title(url)),
            content_html: article.content_html,
            plain_text: article.plain_text,
            byline: article.byline,
            site_name: article.site_name,
        }
    }
}

/// Title of last resort: the page's host, or the whole URL.
pub(crate) fn fallback_title(url: &Url) -> String {
    url.host_str().map(str::to_string).unwrap_or_else(|| url.to_string())
}

/// Content that arrived already extracted, from a reader service or JSON-LD.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructuredArticle {
    pub title: Option<String>,
    pub content_html: String,
    pub plain_text: String,
    pub byline: Option<String>,
    pub site_name: Option<String>,
}

/// Output of the retrieval stage.
#[derive(Debug, Clone)]
pub enum RetrievalResult {
    /// A raw page that still needs extraction
    RawHtml { body: String, source: RetrievalStrategy },
    /// Content that skips the extraction stage
    Structured { article: StructuredArticle, source: RetrievalStrategy },
}

impl RetrievalResult {
    pub fn source(&self) -> RetrievalStrategy {
        match self {
            RetrievalResult::RawHtml { source, .. } | RetrievalResult::Structured { source, .. } => *source,
        }
    }
}

/// Terminal result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Success(ExtractedArticle),
    Failure(PipelineError),
}

impl PipelineOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineOutcome::Success(_))
    }

    /// The failure classification, if any.
    pub fn failure_reason(&self) -> Option<FailureReason> {
        match self {
            PipelineOutcome::Success(_) => None,
            PipelineOutcome::Failure(err) => Some(err.reason),
        }
    }

    /// HTTP status that represents this outcome.
    pub fn status_code(&self) -> u16 {
        match self {
            PipelineOutcome::Success(_) => 200,
            PipelineOutcome::Failure(err) => err.status_code(),
        }
    }

    pub fn to_response(&self) -> ReadModeResponse {
        match self {
            PipelineOutcome::Success(article) => ReadModeResponse::success(article.clone()),
            PipelineOutcome::Failure(err) => ReadModeResponse::failure(err.message.clone()),
        }
    }

    pub fn into_result(self) -> Result<ExtractedArticle, PipelineError> {
        match self {
            PipelineOutcome::Success(article) => Ok(article),
            PipelineOutcome::Failure(err) => Err(err),
        }
    }
}

impl From<Result<ExtractedArticle, PipelineError>> for PipelineOutcome {
    fn from(result: Result<ExtractedArticle, PipelineError>) -> Self {
        match result {
            Ok(article) => PipelineOutcome::Success(article),
            Err(err) => PipelineOutcome::Failure(err),
        }
    }
}

/// JSON body of the read-mode endpoint.
///
/// `{ "success": true, "article": {...} }` or
/// `{ "success": false, "error": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadModeResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub article: Option<ExtractedArticle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReadModeResponse {
    pub fn success(article: ExtractedArticle) -> Self {
        Self { success: true, article: Some(article), error: None }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self { success: false, article: None, error: Some(error.into()) }
    }
}
