//! Per-run record of which strategies were attempted and how each ended.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::extract::ExtractionStrategy;
use crate::retrieve::RetrievalStrategy;

/// How a single strategy attempt ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Accepted,
    /// Accepted below the normal quality bar because nothing else qualified
    AcceptedDegraded,
    Failed { reason: String, timed_out: bool },
}

impl AttemptOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, AttemptOutcome::Accepted | AttemptOutcome::AcceptedDegraded)
    }
}

/// One attempt of strategy `S`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(bound(serialize = "S: fmt::Display"))]
pub struct Attempt<S> {
    #[serde(serialize_with = "serialize_display")]
    pub strategy: S,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    pub outcome: AttemptOutcome,
}

/// Ordered attempts of one pipeline run, retrieval first.
///
/// Useful for debugging and for asserting ordering in tests; never part of the
/// read-mode response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Trace {
    pub retrieval: Vec<Attempt<RetrievalStrategy>>,
    pub extraction: Vec<Attempt<ExtractionStrategy>>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_retrieval(&mut self, strategy: RetrievalStrategy, elapsed: Duration, outcome: AttemptOutcome) {
        self.retrieval.push(Attempt { strategy, elapsed, outcome });
    }

    pub fn record_extraction(&mut self, strategy: ExtractionStrategy, elapsed: Duration, outcome: AttemptOutcome) {
        self.extraction.push(Attempt { strategy, elapsed, outcome });
    }

    /// Retrieval strategies in the order they were tried.
    pub fn retrieval_order(&self) -> Vec<RetrievalStrategy> {
        self.retrieval.iter().map(|a| a.strategy).collect()
    }

    /// Extraction strategies in the order they were tried.
    pub fn extraction_order(&self) -> Vec<ExtractionStrategy> {
        self.extraction.iter().map(|a| a.strategy).collect()
    }

    /// The retrieval strategy that produced content, if any.
    pub fn accepted_retrieval(&self) -> Option<RetrievalStrategy> {
        self.retrieval.iter().find(|a| a.outcome.is_accepted()).map(|a| a.strategy)
    }

    /// The extraction strategy whose output was used, if any.
    pub fn accepted_extraction(&self) -> Option<&Attempt<ExtractionStrategy>> {
        self.extraction.iter().find(|a| a.outcome.is_accepted())
    }
}

fn serialize_display<S: serde::Serializer, T: fmt::Display>(value: &T, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

fn serialize_millis<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_millis() as u64)
}
