//! Strategy orchestration.
//!
//! [`Orchestrator`] is the single entry point of the engine: it probes
//! the cache, opens a session, and walks the strategy chain in
//! preference order, gating every attempt behind the rate limiter and
//! applying exponential backoff between failures. First success wins
//! and is written back to the cache; only exhaustion of the whole chain
//! is surfaced to the caller.
//!
//! ```text
//! acquire("jdoe")
//!       │
//!       ▼
//! ┌────────────┐ hit
//! │ CacheStore │ ────► Acquisition { source: Cache }
//! └─────┬──────┘
//!       │ miss ── open session
//!       ▼
//! ┌────────────────────────────────────────────┐
//! │ for strategy in chain:                     │
//! │   limiter.wait_for_slot()                  │
//! │   strategy.attempt()                       │
//! │     ok  → cache.set, session Completed ────┼──► Acquisition
//! │     err → record, backoff, next strategy   │
//! └─────┬──────────────────────────────────────┘
//!       │ all failed ── session Failed
//!       ▼
//!   Err(Exhausted { last_error, session_id })
//! ```

mod builder;

pub use builder::{Muninn, OrchestratorBuilder};

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::cache::{CacheStats, CacheStore};
use crate::limiter::{RateLimitStats, RateLimiter};
use crate::session::{Session, SessionStatus, SessionTracker, SessionUpdate};
use crate::strategies::AcquisitionStrategy;
use crate::telemetry;
use crate::types::{Acquisition, Source};
use crate::{MuninnError, Result};

/// What the orchestrator persists in the cache: the record plus the
/// confidence it was acquired with, so cache hits report it back.
#[derive(Debug, Clone)]
pub struct CachedRecord<T> {
    /// The acquired record.
    pub data: T,
    /// Confidence of the strategy that produced it.
    pub confidence: Option<f32>,
}

/// Counts removed by one [`Orchestrator::cleanup`] sweep.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CleanupReport {
    /// Expired cache entries swept.
    pub expired_cache_entries: usize,
    /// Sessions reaped past the retention window.
    pub reaped_sessions: usize,
}

/// The acquisition engine. Construct via [`Muninn::builder`].
pub struct Orchestrator<T> {
    limiter: Arc<RateLimiter>,
    cache: Arc<CacheStore<CachedRecord<T>>>,
    sessions: Arc<SessionTracker>,
    strategies: Vec<Arc<dyn AcquisitionStrategy<T>>>,
    cache_ttl: Duration,
    base_delay: Duration,
    patience: Option<Duration>,
}

fn cache_key(identifier: &str) -> String {
    format!("profile:{identifier}")
}

impl<T: Clone + Send + Sync + 'static> Orchestrator<T> {
    /// Acquire a record for `identifier`.
    ///
    /// Cache hits return immediately, tagged [`Source::Cache`], without
    /// touching the session tracker or the rate limiter. On a miss the
    /// strategy chain runs as described in the module docs. Individual
    /// strategy failures never cross this boundary; the possible errors
    /// are [`MuninnError::Exhausted`], [`MuninnError::RateLimited`]
    /// (only with a patience threshold configured), and
    /// [`MuninnError::InvalidInput`] for an empty identifier.
    #[instrument(skip(self), fields(identifier = %identifier))]
    pub async fn acquire(&self, identifier: &str) -> Result<Acquisition<T>> {
        let start = std::time::Instant::now();
        if identifier.is_empty() {
            return Err(MuninnError::InvalidInput(
                "identifier must be non-empty".into(),
            ));
        }

        let key = cache_key(identifier);
        if let Some(record) = self.cache.get(&key) {
            Self::record_request(start, true);
            return Ok(Acquisition {
                data: record.data,
                source: Source::Cache,
                confidence: record.confidence,
                fetched_at: SystemTime::now(),
                session_id: None,
            });
        }

        let session = self.sessions.create_session(identifier);

        if let Some(patience) = self.patience {
            let wait = self.limiter.required_wait();
            if wait > patience {
                self.note(
                    session.id,
                    SessionUpdate::new()
                        .status(SessionStatus::RateLimited)
                        .error(format!("projected wait {wait:?} exceeds patience")),
                );
                Self::record_request(start, false);
                return Err(MuninnError::RateLimited {
                    wait,
                    patience,
                    session_id: session.id,
                });
            }
        }

        let mut last_error: Option<String> = None;
        let total = self.strategies.len();

        for (index, strategy) in self.strategies.iter().enumerate() {
            self.limiter.wait_for_slot().await;

            let label = strategy.source().to_string();
            self.note(session.id, SessionUpdate::new().strategy(&*label));

            match strategy.attempt(identifier).await {
                Ok(data) => {
                    let confidence = strategy.confidence();
                    self.cache.set_with_ttl(
                        &key,
                        CachedRecord {
                            data: data.clone(),
                            confidence,
                        },
                        self.cache_ttl,
                    );

                    let mut update = SessionUpdate::new()
                        .status(SessionStatus::Completed)
                        .source(&*label);
                    if let Some(confidence) = confidence {
                        update = update.confidence(confidence);
                    }
                    self.note(session.id, update);

                    metrics::counter!(telemetry::STRATEGY_ATTEMPTS_TOTAL,
                        "strategy" => label.clone(),
                        "status" => "ok",
                    )
                    .increment(1);
                    Self::record_request(start, true);

                    return Ok(Acquisition {
                        data,
                        source: Source::Strategy(label),
                        confidence,
                        fetched_at: SystemTime::now(),
                        session_id: Some(session.id),
                    });
                }
                Err(e) => {
                    warn!(strategy = %label, error = %e, "strategy failed, falling through");
                    metrics::counter!(telemetry::STRATEGY_ATTEMPTS_TOTAL,
                        "strategy" => label.clone(),
                        "status" => "error",
                    )
                    .increment(1);

                    let message = e.to_string();
                    let attempts = self
                        .sessions
                        .update_session(
                            session.id,
                            SessionUpdate::new().record_attempt().error(&*message),
                        )
                        .map(|s| s.attempts)
                        .unwrap_or((index + 1) as u32);
                    last_error = Some(message);

                    if index + 1 < total {
                        let delay = self.backoff_delay(attempts);
                        metrics::counter!(telemetry::BACKOFFS_TOTAL).increment(1);
                        debug!(
                            delay_ms = delay.as_millis() as u64,
                            "backing off before next strategy"
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        let last_error = last_error.unwrap_or_else(|| "no strategies attempted".into());
        self.note(
            session.id,
            SessionUpdate::new()
                .status(SessionStatus::Failed)
                .error(&*last_error),
        );
        Self::record_request(start, false);

        Err(MuninnError::Exhausted {
            attempts: total as u32,
            last_error,
            session_id: session.id,
        })
    }

    /// Inter-strategy delay: `min(max_backoff, base_delay * multiplier^attempts)`.
    fn backoff_delay(&self, attempts: u32) -> Duration {
        let config = self.limiter.config();
        let factor = config.backoff_multiplier.powi(attempts as i32);
        let secs = (self.base_delay.as_secs_f64() * factor).min(config.max_backoff.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    /// Session writes inside the acquisition path only fail if the
    /// session was reaped mid-flight; absorb rather than abort.
    fn note(&self, id: Uuid, update: SessionUpdate) {
        if let Err(e) = self.sessions.update_session(id, update) {
            debug!(session = %id, error = %e, "session update dropped");
        }
    }

    fn record_request(start: std::time::Instant, ok: bool) {
        let status = if ok { "ok" } else { "error" };
        metrics::counter!(telemetry::REQUESTS_TOTAL, "status" => status).increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS)
            .record(start.elapsed().as_secs_f64());
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Look up a session by id.
    pub fn session(&self, id: Uuid) -> Option<Session> {
        self.sessions.get_session(id)
    }

    /// Current rate-limit window counts.
    pub fn rate_limit_stats(&self) -> RateLimitStats {
        self.limiter.stats()
    }

    /// Current cache size and accounting.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Strategy source labels, in preference order.
    pub fn strategy_labels(&self) -> Vec<&str> {
        self.strategies.iter().map(|s| s.source()).collect()
    }

    /// Sweep expired cache entries and reap old sessions.
    ///
    /// Intended to be driven periodically by the caller (a scheduler
    /// collaborator); once a minute is plenty.
    pub fn cleanup(&self) -> CleanupReport {
        CleanupReport {
            expired_cache_entries: self.cache.cleanup(),
            reaped_sessions: self.sessions.cleanup(),
        }
    }
}
