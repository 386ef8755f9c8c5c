//! Retrieval coordinator.
//!
//! Tries each configured [`RetrievalStrategy`] in order, each under its own
//! time budget, and stops at the first one that yields usable content. A
//! reader-service hit comes back already extracted; everything else is a raw
//! HTML page for the extraction stage.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::Serialize;
use url::Url;

use crate::article::RetrievalResult;
use crate::error::{FailureReason, PipelineError, ReadModeError};
use crate::fetch::{self, Fetcher, HeaderProfile};
use crate::trace::{AttemptOutcome, Trace};

pub const DEFAULT_READER_PROXY: &str = "https://r.jina.ai/{raw_url}";
pub const DEFAULT_WEB_PROXY: &str = "https://api.allorigins.win/raw?url={url}";
pub const DEFAULT_ARCHIVE_API: &str = "https://archive.org/wayback/available?url={url}";

/// One way of obtaining the article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RetrievalStrategy {
    /// Reader service returning pre-extracted content
    ReaderProxy,
    /// Pass-through web proxy returning the raw page
    WebProxy,
    /// Closest web-archive snapshot
    ArchiveSnapshot,
    /// The target itself, under a client identity
    Direct(HeaderProfile),
}

impl RetrievalStrategy {
    /// The default order: reader, proxy, archive, then direct fetches from the
    /// most to the least elaborate identity.
    pub fn default_order() -> Vec<RetrievalStrategy> {
        let mut order = vec![RetrievalStrategy::ReaderProxy, RetrievalStrategy::WebProxy, RetrievalStrategy::ArchiveSnapshot];
        order.extend(HeaderProfile::ALL.map(RetrievalStrategy::Direct));
        order
    }

    /// Parse a comma-separated list. A bare `direct` expands to every header
    /// profile.
    pub fn parse_list(list: &str) -> Result<Vec<RetrievalStrategy>, String> {
        let mut strategies = Vec::new();
        for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if name.eq_ignore_ascii_case("direct") {
                strategies.extend(HeaderProfile::ALL.map(RetrievalStrategy::Direct));
            } else {
                strategies.push(name.parse()?);
            }
        }

        if strategies.is_empty() {
            return Err("at least one retrieval strategy is required".to_string());
        }
        Ok(strategies)
    }
}

impl fmt::Display for RetrievalStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetrievalStrategy::ReaderProxy => f.write_str("reader-proxy"),
            RetrievalStrategy::WebProxy => f.write_str("web-proxy"),
            RetrievalStrategy::ArchiveSnapshot => f.write_str("archive"),
            RetrievalStrategy::Direct(profile) => write!(f, "direct:{profile}"),
        }
    }
}

impl FromStr for RetrievalStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        match name.as_str() {
            "reader-proxy" | "reader" => Ok(RetrievalStrategy::ReaderProxy),
            "web-proxy" | "proxy" => Ok(RetrievalStrategy::WebProxy),
            "archive" | "archive-snapshot" => Ok(RetrievalStrategy::ArchiveSnapshot),
            _ => match name.strip_prefix("direct:") {
                Some(profile) => profile.parse().map(RetrievalStrategy::Direct),
                None => Err(format!("unknown retrieval strategy '{s}'")),
            },
        }
    }
}

/// Per-strategy time allotments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyTimeouts {
    pub reader_proxy: Duration,
    pub web_proxy: Duration,
    pub archive: Duration,
    pub browser: Duration,
    pub crawler: Duration,
    pub mobile: Duration,
}

impl Default for StrategyTimeouts {
    fn default() -> Self {
        Self {
            reader_proxy: Duration::from_secs(15),
            web_proxy: Duration::from_secs(12),
            archive: Duration::from_secs(15),
            browser: Duration::from_secs(15),
            crawler: Duration::from_secs(10),
            mobile: Duration::from_secs(8),
        }
    }
}

impl StrategyTimeouts {
    pub fn for_strategy(&self, strategy: RetrievalStrategy) -> Duration {
        match strategy {
            RetrievalStrategy::ReaderProxy => self.reader_proxy,
            RetrievalStrategy::WebProxy => self.web_proxy,
            RetrievalStrategy::ArchiveSnapshot => self.archive,
            RetrievalStrategy::Direct(HeaderProfile::Browser) => self.browser,
            RetrievalStrategy::Direct(HeaderProfile::Crawler) => self.crawler,
            RetrievalStrategy::Direct(HeaderProfile::Mobile) => self.mobile,
        }
    }

    /// Apply the same allotment to every strategy.
    pub fn uniform(timeout: Duration) -> Self {
        Self {
            reader_proxy: timeout,
            web_proxy: timeout,
            archive: timeout,
            browser: timeout,
            crawler: timeout,
            mobile: timeout,
        }
    }
}

/// Configuration for the retrieval stage.
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Strategies in the order they are tried
    pub strategies: Vec<RetrievalStrategy>,
    /// Reader service endpoint template
    pub reader_proxy: String,
    /// Web proxy endpoint template
    pub web_proxy: String,
    /// Archive availability API template
    pub archive_api: String,
    pub timeouts: StrategyTimeouts,
    /// Minimum characters of reader-service article text (default: 200)
    pub min_reader_chars: usize,
    /// Minimum body length of a proxied page (default: 500)
    pub min_proxy_body: usize,
    /// Minimum body length of an archived page (default: 500)
    pub min_archive_body: usize,
    /// Minimum body length of a direct fetch (default: 100)
    pub min_direct_body: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            strategies: RetrievalStrategy::default_order(),
            reader_proxy: DEFAULT_READER_PROXY.to_string(),
            web_proxy: DEFAULT_WEB_PROXY.to_string(),
            archive_api: DEFAULT_ARCHIVE_API.to_string(),
            timeouts: StrategyTimeouts::default(),
            min_reader_chars: 200,
            min_proxy_body: 500,
            min_archive_body: 500,
            min_direct_body: 100,
        }
    }
}

/// Run the retrieval strategies in order until one succeeds.
///
/// Strategies are strictly sequential; later ones are never contacted after
/// a success. Each attempt is logged and recorded in `trace`.
///
/// # Errors
///
/// [`FailureReason::Timeout`] when every attempt ran out of time, otherwise
/// [`FailureReason::AllRetrievalStrategiesExhausted`].
pub async fn retrieve(
    fetcher: &Fetcher, url: &Url, config: &RetrievalConfig, trace: &mut Trace,
) -> Result<RetrievalResult, PipelineError> {
    let mut all_timed_out = !config.strategies.is_empty();

    for &strategy in &config.strategies {
        let budget = config.timeouts.for_strategy(strategy);
        let started = Instant::now();

        let result = match tokio::time::timeout(budget, run_strategy(fetcher, strategy, url, config)).await {
            Ok(result) => result,
            Err(_) => Err(ReadModeError::Timeout { timeout_ms: budget.as_millis() as u64 }),
        };
        let elapsed = started.elapsed();
        let elapsed_ms = elapsed.as_millis() as u64;

        match result {
            Ok(found) => {
                tracing::info!(url = %url, strategy = %strategy, elapsed_ms, "retrieval succeeded");
                trace.record_retrieval(strategy, elapsed, AttemptOutcome::Accepted);
                return Ok(found);
            }
            Err(err) => {
                let timed_out = err.is_timeout();
                all_timed_out &= timed_out;
                tracing::warn!(url = %url, strategy = %strategy, elapsed_ms, reason = %err, "retrieval strategy failed");
                trace.record_retrieval(strategy, elapsed, AttemptOutcome::Failed { reason: err.to_string(), timed_out });
            }
        }
    }

    let reason =
        if all_timed_out { FailureReason::Timeout } else { FailureReason::AllRetrievalStrategiesExhausted };
    Err(PipelineError::from_reason(reason))
}

async fn run_strategy(
    fetcher: &Fetcher, strategy: RetrievalStrategy, url: &Url, config: &RetrievalConfig,
) -> crate::Result<RetrievalResult> {
    let source = strategy;
    match strategy {
        RetrievalStrategy::ReaderProxy => {
            let article = fetch::fetch_reader(fetcher, &config.reader_proxy, url, config.min_reader_chars).await?;
            Ok(RetrievalResult::Structured { article, source })
        }
        RetrievalStrategy::WebProxy => {
            let body = fetch::fetch_via_proxy(fetcher, &config.web_proxy, url, config.min_proxy_body).await?;
            Ok(RetrievalResult::RawHtml { body, source })
        }
        RetrievalStrategy::ArchiveSnapshot => {
            let body = fetch::fetch_snapshot(fetcher, &config.archive_api, url, config.min_archive_body).await?;
            Ok(RetrievalResult::RawHtml { body, source })
        }
        RetrievalStrategy::Direct(profile) => {
            let body = fetch::fetch_direct(fetcher, profile, url, config.min_direct_body).await?;
            Ok(RetrievalResult::RawHtml { body, source })
        }
    }
}
