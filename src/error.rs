//! Muninn error types

use std::time::Duration;

use uuid::Uuid;

use crate::session::SessionStatus;

/// Muninn error types
#[derive(Debug, thiserror::Error)]
pub enum MuninnError {
    // Strategy/network errors
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A single strategy could not produce a record.
    ///
    /// Absorbed by the orchestrator, which falls through to the next
    /// strategy in the chain. Only surfaces to callers when a strategy
    /// is invoked directly.
    #[error("strategy '{strategy}' failed: {message}")]
    Strategy { strategy: String, message: String },

    /// Every strategy in the chain failed.
    ///
    /// The only acquisition failure that crosses the orchestrator
    /// boundary. Carries the last strategy's error for diagnostics and
    /// the session id for introspection.
    #[error("all strategies exhausted after {attempts} attempts: {last_error}")]
    Exhausted {
        attempts: u32,
        last_error: String,
        session_id: Uuid,
    },

    /// The limiter's projected wait exceeded the caller's patience.
    ///
    /// Returned before any strategy attempt; the session is marked
    /// rate-limited. Not produced unless a patience threshold is set.
    #[error("rate limited: projected wait {wait:?} exceeds patience {patience:?}")]
    RateLimited {
        wait: Duration,
        patience: Duration,
        session_id: Uuid,
    },

    // Session errors
    #[error("unknown session: {0}")]
    UnknownSession(Uuid),

    /// Sessions are immutable once their status leaves `Active`.
    #[error("session {id} is already {status}")]
    SessionTerminal { id: Uuid, status: SessionStatus },

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Configuration errors
    #[error("no strategy configured")]
    NoStrategy,

    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result type alias for Muninn operations
pub type Result<T> = std::result::Result<T, MuninnError>;
