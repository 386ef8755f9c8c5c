//! Error types for read-mode operations.
//!
//! Two layers of errors exist. [`ReadModeError`] describes why a single
//! retrieval or extraction strategy failed; it is logged and recorded in the
//! [`Trace`](crate::Trace) but never handed to callers. [`PipelineError`] is
//! the classified, caller-facing failure carrying a [`FailureReason`] and a
//! generic message.
//!
//! # Example
//!
//! ```rust
//! use readmode_core::{FailureReason, PipelineError};
//!
//! let err = PipelineError::from_reason(FailureReason::Timeout);
//! assert_eq!(err.status_code(), 504);
//! assert_eq!(err.to_string(), "Request timed out");
//! ```

use serde::Serialize;
use thiserror::Error;

/// Failure of one strategy.
///
/// Every variant demotes to "this strategy produced nothing" at the
/// coordinator boundary.
#[derive(Error, Debug)]
pub enum ReadModeError {
    /// Network errors from reqwest: DNS, connect, TLS, body read.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// A strategy exceeded its own time allotment.
    #[error("Request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// A URL or endpoint template could not be turned into a request URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The server answered with a non-2xx status.
    #[error("Unexpected HTTP status {0}")]
    HttpStatus(u16),

    /// The response is not an HTML document (images, PDFs, JSON...).
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),

    /// The body is empty or implausibly short for a real page.
    #[error("Response body too short ({len} < {min} characters)")]
    BodyTooShort { len: usize, min: usize },

    /// The body exceeds the fetcher's size limit.
    #[error("Response body too large ({len} > {max} bytes)")]
    BodyTooLarge { len: usize, max: usize },

    /// A JSON service answered with something we could not read.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The archive has no snapshot for the requested URL.
    #[error("No archived snapshot available")]
    SnapshotUnavailable,

    /// HTML or CSS selector parsing errors.
    #[error("Markdown conversion failed: {0}")]
    MarkdownConversion(String),

    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// The best candidate scored below the readability threshold.
    #[error("Content is not readable (score {score:.1} below threshold {threshold:.1})")]
    NotReadable { score: f64, threshold: f64 },

    /// No candidate content was found at all.
    #[error("No content could be extracted from the document")]
    NoContent,

    /// Content was produced but did not meet the strategy's quality bar.
    #[error("Content below quality bar ({found} < {required})")]
    BelowThreshold { found: usize, required: usize },
}

impl ReadModeError {
    /// Whether this failure is a timeout, for overall failure classification.
    pub fn is_timeout(&self) -> bool {
        match self {
            ReadModeError::Timeout { .. } => true,
            ReadModeError::HttpError(e) => e.is_timeout(),
            _ => false,
        }
    }
}

/// Result type alias for [`ReadModeError`].
pub type Result<T> = std::result::Result<T, ReadModeError>;

/// Classification of a failed pipeline run.
///
/// This is the externally observed taxonomy; each reason maps to a fixed
/// HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureReason {
    /// Malformed or missing URL. No network call was made.
    InvalidInput,
    /// Every retrieval strategy failed.
    AllRetrievalStrategiesExhausted,
    /// HTML was retrieved but no extraction strategy produced usable content.
    NoExtractionStrategySucceeded,
    /// The overall budget elapsed, or every retrieval attempt timed out.
    Timeout,
}

impl FailureReason {
    /// HTTP status associated with this failure.
    pub fn status_code(self) -> u16 {
        match self {
            FailureReason::InvalidInput => 400,
            FailureReason::NoExtractionStrategySucceeded => 422,
            FailureReason::AllRetrievalStrategiesExhausted => 502,
            FailureReason::Timeout => 504,
        }
    }

    /// Generic, caller-safe message.
    pub fn default_message(self) -> &'static str {
        match self {
            FailureReason::InvalidInput => "URL is required",
            FailureReason::AllRetrievalStrategiesExhausted => "Failed to fetch article",
            FailureReason::NoExtractionStrategySucceeded => "Failed to parse article content",
            FailureReason::Timeout => "Request timed out",
        }
    }
}

/// A classified pipeline failure.
///
/// The message never names strategies or carries raw error text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct PipelineError {
    pub reason: FailureReason,
    pub message: String,
}

impl PipelineError {
    pub fn new(reason: FailureReason, message: impl Into<String>) -> Self {
        Self { reason, message: message.into() }
    }

    /// Builds an error carrying the reason's default message.
    pub fn from_reason(reason: FailureReason) -> Self {
        Self::new(reason, reason.default_message())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(FailureReason::InvalidInput, message)
    }

    pub fn status_code(&self) -> u16 {
        self.reason.status_code()
    }
}
