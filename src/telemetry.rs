//! Telemetry metric name constants.
//!
//! Centralised metric names for muninn operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `muninn_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `strategy` — strategy source label (e.g. "remote-api")
//! - `status` — outcome: "ok" or "error"

/// Total acquisition requests through the orchestrator.
///
/// Labels: `status` ("ok" | "error").
pub const REQUESTS_TOTAL: &str = "muninn_requests_total";

/// Acquisition duration in seconds, cache hits included.
pub const REQUEST_DURATION_SECONDS: &str = "muninn_request_duration_seconds";

/// Total strategy attempts.
///
/// Labels: `strategy`, `status` ("ok" | "error").
pub const STRATEGY_ATTEMPTS_TOTAL: &str = "muninn_strategy_attempts_total";

/// Total inter-strategy backoff delays applied.
pub const BACKOFFS_TOTAL: &str = "muninn_backoffs_total";

/// Total cache hits.
pub const CACHE_HITS_TOTAL: &str = "muninn_cache_hits_total";

/// Total cache misses.
pub const CACHE_MISSES_TOTAL: &str = "muninn_cache_misses_total";

/// Total cache evictions (capacity pressure, not expiry).
pub const CACHE_EVICTIONS_TOTAL: &str = "muninn_cache_evictions_total";

/// Total times `wait_for_slot` had to sleep for a window to clear.
pub const RATE_LIMIT_WAITS_TOTAL: &str = "muninn_rate_limit_waits_total";
