//! Builder for configuring acquisition engines.

use std::sync::Arc;
use std::time::Duration;

use super::{CachedRecord, Orchestrator};
use crate::cache::{CacheConfig, CacheStore};
use crate::limiter::{RateLimitConfig, RateLimiter};
use crate::session::{DEFAULT_RETENTION, SessionTracker};
use crate::strategies::AcquisitionStrategy;
use crate::{MuninnError, Result};

/// Main entry point for creating acquisition engines.
pub struct Muninn;

impl Muninn {
    /// Create a new builder for the given record type.
    pub fn builder<T: Clone + Send + Sync + 'static>() -> OrchestratorBuilder<T> {
        OrchestratorBuilder::new()
    }
}

/// Builder for [`Orchestrator`] instances.
///
/// Strategies are tried in the order they are added (first added =
/// most preferred). The limiter and session tracker are constructed
/// from their configs unless shared instances are injected.
pub struct OrchestratorBuilder<T> {
    strategies: Vec<Arc<dyn AcquisitionStrategy<T>>>,
    rate_limit: RateLimitConfig,
    cache: CacheConfig,
    cache_ttl: Option<Duration>,
    retention: Duration,
    base_delay: Duration,
    patience: Option<Duration>,
    limiter: Option<Arc<RateLimiter>>,
    sessions: Option<Arc<SessionTracker>>,
}

impl<T: Clone + Send + Sync + 'static> OrchestratorBuilder<T> {
    /// Create a builder with default configuration and no strategies.
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
            rate_limit: RateLimitConfig::default(),
            cache: CacheConfig::default(),
            cache_ttl: None,
            retention: DEFAULT_RETENTION,
            base_delay: Duration::from_secs(1),
            patience: None,
            limiter: None,
            sessions: None,
        }
    }

    /// Append a strategy to the chain (lowest preference so far).
    pub fn strategy(mut self, strategy: impl AcquisitionStrategy<T> + 'static) -> Self {
        self.strategies.push(Arc::new(strategy));
        self
    }

    /// Append an already-shared strategy to the chain.
    pub fn strategy_arc(mut self, strategy: Arc<dyn AcquisitionStrategy<T>>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Set the rate limit and backoff configuration.
    ///
    /// Ignored when a shared limiter is injected via
    /// [`rate_limiter`](Self::rate_limiter).
    pub fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limit = config;
        self
    }

    /// Set the cache configuration.
    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = config;
        self
    }

    /// TTL for records written back on strategy success.
    ///
    /// Defaults to the cache's `default_ttl`.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Retention window for session records. Default: 24 hours.
    ///
    /// Ignored when a shared tracker is injected via
    /// [`session_tracker`](Self::session_tracker).
    pub fn session_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Base delay for inter-strategy backoff. Default: 1 s.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Bail out with [`MuninnError::RateLimited`] instead of waiting
    /// when the limiter's projected wait exceeds this threshold.
    ///
    /// Off by default: without a patience threshold, `acquire` waits
    /// however long the windows require.
    pub fn patience(mut self, patience: Duration) -> Self {
        self.patience = Some(patience);
        self
    }

    /// Share a rate limiter with other engines.
    pub fn rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Share a session tracker with other engines.
    pub fn session_tracker(mut self, sessions: Arc<SessionTracker>) -> Self {
        self.sessions = Some(sessions);
        self
    }

    /// Validate the configuration and build the engine.
    ///
    /// Fails fast: an empty strategy chain, zero limits or TTLs, and a
    /// sub-1.0 backoff multiplier are all rejected here, not at first
    /// use.
    pub fn build(self) -> Result<Orchestrator<T>> {
        if self.strategies.is_empty() {
            return Err(MuninnError::NoStrategy);
        }
        if let Some(ttl) = self.cache_ttl
            && ttl.is_zero()
        {
            return Err(MuninnError::Configuration(
                "cache_ttl must be positive".into(),
            ));
        }

        let limiter = match self.limiter {
            Some(limiter) => limiter,
            None => Arc::new(RateLimiter::new(self.rate_limit)?),
        };
        let cache_ttl = self.cache_ttl.unwrap_or(self.cache.default_ttl);
        let cache: Arc<CacheStore<CachedRecord<T>>> = Arc::new(CacheStore::new(self.cache)?);
        let sessions = self
            .sessions
            .unwrap_or_else(|| Arc::new(SessionTracker::with_retention(self.retention)));

        Ok(Orchestrator {
            limiter,
            cache,
            sessions,
            strategies: self.strategies,
            cache_ttl,
            base_delay: self.base_delay,
            patience: self.patience,
        })
    }
}

impl<T: Clone + Send + Sync + 'static> Default for OrchestratorBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}
