//! Core result types shared across the engine.

use std::fmt;
use std::time::SystemTime;

use serde::Serialize;
use uuid::Uuid;

/// Where an acquired record came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    /// Served from the cache without touching the session or limiter.
    Cache,
    /// Produced by the named strategy.
    Strategy(String),
}

impl Source {
    /// The source label as used in session records and metrics.
    pub fn label(&self) -> &str {
        match self {
            Source::Cache => "cache",
            Source::Strategy(label) => label,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A successfully acquired record.
///
/// Produced once per `acquire` call and never mutated. `session_id` is
/// `None` for cache hits, which bypass session bookkeeping entirely.
#[derive(Debug, Clone)]
pub struct Acquisition<T> {
    /// The acquired record.
    pub data: T,
    /// Cache or the winning strategy.
    pub source: Source,
    /// Static confidence declared by the winning strategy, if any.
    /// Cache hits carry the confidence the record was stored with.
    pub confidence: Option<f32>,
    /// Wall-clock time the record was handed to the caller.
    pub fetched_at: SystemTime,
    /// Session that produced the record; `None` on cache hits.
    pub session_id: Option<Uuid>,
}
