//! Sliding-window rate limiting.
//!
//! [`RateLimiter`] tracks grant timestamps in three trailing windows
//! (minute, hour, day) and suspends callers until granting a request
//! would not push any window over its configured limit. It has no notion
//! of permanent denial: [`RateLimiter::wait_for_slot`] only ever delays.
//!
//! # Concurrency
//!
//! The window bookkeeping lives behind one `std::sync::Mutex`, never held
//! across an await point. The prune → check → record sequence is atomic
//! under the lock, and a waiter re-validates after waking before it
//! records a grant, so concurrent waiters cannot over-grant a window.
//!
//! # Invariant
//!
//! Windows are pruned whenever they are consulted: no window holds a
//! timestamp older than its own span.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

use crate::telemetry;
use crate::{MuninnError, Result};

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3_600);
const DAY: Duration = Duration::from_secs(86_400);

/// Rate limiting and backoff configuration.
///
/// The window limits gate [`RateLimiter::wait_for_slot`]; the backoff
/// fields are consumed by the orchestrator between failed strategy
/// attempts.
///
/// ```rust
/// # use muninn::RateLimitConfig;
/// # use std::time::Duration;
/// let config = RateLimitConfig::new()
///     .requests_per_minute(5)
///     .max_backoff(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Grants allowed in any trailing 60 s. Default: 10.
    pub requests_per_minute: u32,
    /// Grants allowed in any trailing hour. Default: 100.
    pub requests_per_hour: u32,
    /// Grants allowed in any trailing day. Default: 500.
    pub requests_per_day: u32,
    /// Exponential backoff base multiplier. Default: 2.0.
    pub backoff_multiplier: f64,
    /// Cap on any single backoff delay. Default: 30 s.
    pub max_backoff: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: 10,
            requests_per_hour: 100,
            requests_per_day: 500,
            backoff_multiplier: 2.0,
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RateLimitConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-minute grant limit.
    pub fn requests_per_minute(mut self, n: u32) -> Self {
        self.requests_per_minute = n;
        self
    }

    /// Set the per-hour grant limit.
    pub fn requests_per_hour(mut self, n: u32) -> Self {
        self.requests_per_hour = n;
        self
    }

    /// Set the per-day grant limit.
    pub fn requests_per_day(mut self, n: u32) -> Self {
        self.requests_per_day = n;
        self
    }

    /// Set the exponential backoff multiplier.
    pub fn backoff_multiplier(mut self, m: f64) -> Self {
        self.backoff_multiplier = m;
        self
    }

    /// Set the cap on any single backoff delay.
    pub fn max_backoff(mut self, d: Duration) -> Self {
        self.max_backoff = d;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.requests_per_minute == 0 || self.requests_per_hour == 0 || self.requests_per_day == 0
        {
            return Err(MuninnError::Configuration(
                "rate limit window limits must be positive".into(),
            ));
        }
        if self.backoff_multiplier < 1.0 {
            return Err(MuninnError::Configuration(
                "backoff_multiplier must be at least 1.0".into(),
            ));
        }
        if self.max_backoff.is_zero() {
            return Err(MuninnError::Configuration(
                "max_backoff must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// One sliding window: grant timestamps plus its span and limit.
struct Window {
    timestamps: VecDeque<Instant>,
    span: Duration,
    limit: u32,
}

impl Window {
    fn new(span: Duration, limit: u32) -> Self {
        Self {
            timestamps: VecDeque::new(),
            span,
            limit,
        }
    }

    /// Drop timestamps that have aged out of the window.
    ///
    /// The window is the half-open interval `(now - span, now]`: a grant
    /// exactly `span` old is outside it. This keeps `required_wait`
    /// strictly positive for a full window, so a waiter waking at the
    /// boundary re-observes a free slot rather than recording into a
    /// still-full window.
    fn prune(&mut self, now: Instant) {
        while let Some(oldest) = self.timestamps.front() {
            if now.duration_since(*oldest) >= self.span {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    /// Delay until this window would admit a new grant. Assumes pruned.
    fn required_wait(&self, now: Instant) -> Option<Duration> {
        if (self.timestamps.len() as u32) < self.limit {
            return None;
        }
        let oldest = self.timestamps.front()?;
        Some(self.span.saturating_sub(now.duration_since(*oldest)))
    }

    fn count(&self) -> u32 {
        self.timestamps.len() as u32
    }
}

struct Windows {
    minute: Window,
    hour: Window,
    day: Window,
}

impl Windows {
    fn prune(&mut self, now: Instant) {
        self.minute.prune(now);
        self.hour.prune(now);
        self.day.prune(now);
    }

    /// Maximum of the three per-window delays; zero when all admit.
    fn required_wait(&self, now: Instant) -> Duration {
        [&self.minute, &self.hour, &self.day]
            .into_iter()
            .filter_map(|w| w.required_wait(now))
            .max()
            .unwrap_or(Duration::ZERO)
    }

    fn record(&mut self, now: Instant) {
        self.minute.timestamps.push_back(now);
        self.hour.timestamps.push_back(now);
        self.day.timestamps.push_back(now);
    }
}

/// Current per-window grant counts and configured limits.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitStats {
    /// Grants in the trailing minute.
    pub last_minute: u32,
    /// Configured per-minute limit.
    pub minute_limit: u32,
    /// Grants in the trailing hour.
    pub last_hour: u32,
    /// Configured per-hour limit.
    pub hour_limit: u32,
    /// Grants in the trailing day.
    pub last_day: u32,
    /// Configured per-day limit.
    pub day_limit: u32,
}

/// Shared sliding-window rate limiter.
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<Windows>,
}

impl RateLimiter {
    /// Create a limiter from the given configuration.
    ///
    /// Rejects zero window limits, a sub-1.0 multiplier, or a zero
    /// backoff cap eagerly.
    pub fn new(config: RateLimitConfig) -> Result<Self> {
        config.validate()?;
        let windows = Windows {
            minute: Window::new(MINUTE, config.requests_per_minute),
            hour: Window::new(HOUR, config.requests_per_hour),
            day: Window::new(DAY, config.requests_per_day),
        };
        Ok(Self {
            config,
            windows: Mutex::new(windows),
        })
    }

    /// The configuration this limiter was built with.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Suspend until a grant fits all three windows, then record it.
    ///
    /// Loops prune → check → record-or-sleep. Limits are re-validated
    /// after every wake-up, so a grant is only ever recorded against
    /// windows that were observed under-limit in the same critical
    /// section.
    pub async fn wait_for_slot(&self) {
        loop {
            let wait = {
                let mut windows = self.windows.lock().expect("limiter lock poisoned");
                let now = Instant::now();
                windows.prune(now);
                let wait = windows.required_wait(now);
                if wait.is_zero() {
                    windows.record(now);
                    return;
                }
                wait
            };
            metrics::counter!(telemetry::RATE_LIMIT_WAITS_TOTAL).increment(1);
            debug!(wait_ms = wait.as_millis() as u64, "rate limit window full, waiting");
            tokio::time::sleep(wait).await;
        }
    }

    /// Delay a new grant would currently require, without committing.
    ///
    /// `Duration::ZERO` when a slot is free. Used by callers that want to
    /// bail out instead of waiting (patience short-circuit).
    pub fn required_wait(&self) -> Duration {
        let mut windows = self.windows.lock().expect("limiter lock poisoned");
        let now = Instant::now();
        windows.prune(now);
        windows.required_wait(now)
    }

    /// Read-only per-window counts. Prunes before counting.
    pub fn stats(&self) -> RateLimitStats {
        let mut windows = self.windows.lock().expect("limiter lock poisoned");
        windows.prune(Instant::now());
        RateLimitStats {
            last_minute: windows.minute.count(),
            minute_limit: self.config.requests_per_minute,
            last_hour: windows.hour.count(),
            hour_limit: self.config.requests_per_hour,
            last_day: windows.day.count(),
            day_limit: self.config.requests_per_day,
        }
    }
}
