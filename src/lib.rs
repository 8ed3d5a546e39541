//! Muninn - resilient profile acquisition engine
//!
//! This crate obtains a record for an identifier while respecting
//! multi-window rate limits, caching successful results, and falling
//! back across an ordered chain of acquisition strategies with
//! exponential backoff between failures.
//!
//! # Example
//!
//! ```rust,no_run
//! use muninn::{FixedStrategy, HttpApiStrategy, Muninn};
//! use serde::Deserialize;
//!
//! #[derive(Clone, Deserialize)]
//! struct Profile {
//!     name: String,
//!     headline: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> muninn::Result<()> {
//!     let engine = Muninn::builder::<Profile>()
//!         .strategy(HttpApiStrategy::new("https://api.example.com"))
//!         .strategy(
//!             FixedStrategy::new(Profile {
//!                 name: "unknown".into(),
//!                 headline: String::new(),
//!             })
//!             .label("placeholder"),
//!         )
//!         .build()?;
//!
//!     let result = engine.acquire("jdoe").await?;
//!     println!("{} (source: {})", result.data.name, result.source);
//!     Ok(())
//! }
//! ```
//!
//! A repeated `acquire` for the same identifier is served from the
//! cache without touching the rate limiter or opening a session. See
//! the [`orchestrator`] module docs for the full control flow.

pub mod cache;
pub mod error;
pub mod limiter;
pub mod orchestrator;
pub mod session;
pub mod strategies;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use cache::{CacheConfig, CacheStats, CacheStore};
pub use error::{MuninnError, Result};
pub use limiter::{RateLimitConfig, RateLimitStats, RateLimiter};
pub use orchestrator::{CachedRecord, CleanupReport, Muninn, Orchestrator, OrchestratorBuilder};
pub use session::{Session, SessionStatus, SessionTracker, SessionUpdate};
pub use strategies::{AcquisitionStrategy, FixedStrategy, HttpApiStrategy};
pub use types::{Acquisition, Source};
