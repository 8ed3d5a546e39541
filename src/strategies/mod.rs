//! Acquisition strategies.
//!
//! A strategy is one pluggable way of obtaining a record for an
//! identifier. The orchestrator holds strategies in preference order
//! (index 0 = cheapest / most trusted) and tries them one at a time.
//!
//! # Fallback semantics
//!
//! Any error returned from [`AcquisitionStrategy::attempt`] is
//! recoverable from the orchestrator's point of view: the failure is
//! recorded into the session and the next strategy in the chain is
//! tried after a backoff delay. A strategy's internal retry and timeout
//! behaviour is its own responsibility.

mod fixed;
mod http;

pub use fixed::FixedStrategy;
pub use http::HttpApiStrategy;

use async_trait::async_trait;

use crate::Result;

/// A single method of obtaining a record for an identifier.
#[async_trait]
pub trait AcquisitionStrategy<T>: Send + Sync {
    /// Source label for results, session bookkeeping, and logging.
    fn source(&self) -> &str;

    /// Static confidence in `[0, 1]` for records this strategy produces.
    fn confidence(&self) -> Option<f32> {
        None
    }

    /// Attempt to obtain a record.
    ///
    /// An `Err` signals this strategy cannot produce a record right now;
    /// the orchestrator falls through to the next strategy.
    async fn attempt(&self, identifier: &str) -> Result<T>;
}
