//! Per-request acquisition session tracking.
//!
//! A [`Session`] records the lifecycle of one cache-miss acquisition:
//! which strategies were tried, how many attempts were made, and how it
//! ended. [`SessionTracker`] owns the records for their lifetime — an
//! in-memory map of short-lived entries reaped after a retention window
//! (24 hours by default), regardless of status.
//!
//! # State machine
//!
//! ```text
//! Active ──► Completed   (a strategy succeeded)
//!        ──► Failed      (all strategies exhausted)
//!        ──► RateLimited (short-circuited before any attempt)
//! ```
//!
//! Terminal states are immutable: [`SessionTracker::update_session`] is
//! the only mutation path and rejects writes to a non-active session.
//! `attempts` only ever increases.

use std::collections::HashMap;
use std::fmt;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use serde::Serialize;
use tokio::time::Instant;
use uuid::Uuid;

use crate::{MuninnError, Result};

/// Default retention before a session becomes eligible for reaping.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(24 * 3600);

/// Lifecycle state of an acquisition session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionStatus {
    /// Acquisition in progress.
    Active,
    /// A strategy produced a record.
    Completed,
    /// Every strategy failed.
    Failed,
    /// Short-circuited before any attempt because the projected
    /// rate-limit wait exceeded the caller's patience.
    RateLimited,
}

impl SessionStatus {
    /// Whether this state admits no further transitions.
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionStatus::Active)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionStatus::Active => "active",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
            SessionStatus::RateLimited => "rate-limited",
        };
        f.write_str(s)
    }
}

/// Bookkeeping record for one cache-miss acquisition.
///
/// The record payload itself is not stored here — it lives in the cache
/// and in the returned [`Acquisition`](crate::Acquisition); the session
/// keeps the winning source label and confidence instead.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    /// Unique session id.
    pub id: Uuid,
    /// The identifier being acquired.
    pub identifier: String,
    /// Wall-clock time the session was opened.
    pub started_at: SystemTime,
    /// Current lifecycle state.
    pub status: SessionStatus,
    /// Strategy currently (or last) attempted.
    pub current_strategy: Option<String>,
    /// Failed attempts so far. Only ever increases.
    pub attempts: u32,
    /// Source labels of every strategy attempted, in order.
    pub strategies_tried: Vec<String>,
    /// Source label of the winning strategy, on completion.
    pub source: Option<String>,
    /// Confidence of the winning strategy, on completion.
    pub confidence: Option<f32>,
    /// Last observed strategy error, if any.
    pub error: Option<String>,
}

/// Partial-field merge for [`SessionTracker::update_session`].
///
/// ```rust
/// # use muninn::SessionUpdate;
/// let update = SessionUpdate::new()
///     .strategy("remote-api")
///     .record_attempt()
///     .error("connection refused");
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    status: Option<SessionStatus>,
    strategy: Option<String>,
    record_attempt: bool,
    source: Option<String>,
    confidence: Option<f32>,
    error: Option<String>,
}

impl SessionUpdate {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transition the session to `status`.
    pub fn status(mut self, status: SessionStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the current strategy; also appends to the tried list.
    pub fn strategy(mut self, label: impl Into<String>) -> Self {
        self.strategy = Some(label.into());
        self
    }

    /// Increment the attempt counter.
    pub fn record_attempt(mut self) -> Self {
        self.record_attempt = true;
        self
    }

    /// Set the winning source label.
    pub fn source(mut self, label: impl Into<String>) -> Self {
        self.source = Some(label.into());
        self
    }

    /// Set the winning confidence.
    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Record the last observed error.
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error = Some(message.into());
        self
    }
}

struct Entry {
    session: Session,
    /// Monotonic open time, used for retention-based reaping.
    opened: Instant,
}

/// In-memory tracker for acquisition sessions.
pub struct SessionTracker {
    retention: Duration,
    sessions: Mutex<HashMap<Uuid, Entry>>,
}

impl SessionTracker {
    /// Create a tracker with the default 24-hour retention.
    pub fn new() -> Self {
        Self::with_retention(DEFAULT_RETENTION)
    }

    /// Create a tracker with a custom retention window.
    pub fn with_retention(retention: Duration) -> Self {
        Self {
            retention,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Open a session for `identifier` in state [`SessionStatus::Active`].
    pub fn create_session(&self, identifier: &str) -> Session {
        let session = Session {
            id: Uuid::new_v4(),
            identifier: identifier.to_string(),
            started_at: SystemTime::now(),
            status: SessionStatus::Active,
            current_strategy: None,
            attempts: 0,
            strategies_tried: Vec::new(),
            source: None,
            confidence: None,
            error: None,
        };
        let mut sessions = self.sessions.lock().expect("session lock poisoned");
        sessions.insert(
            session.id,
            Entry {
                session: session.clone(),
                opened: Instant::now(),
            },
        );
        session
    }

    /// Merge `update` into the session, returning the updated record.
    ///
    /// The only mutation path. Rejects unknown ids and any write to a
    /// session that has already left [`SessionStatus::Active`].
    pub fn update_session(&self, id: Uuid, update: SessionUpdate) -> Result<Session> {
        let mut sessions = self.sessions.lock().expect("session lock poisoned");
        let entry = sessions
            .get_mut(&id)
            .ok_or(MuninnError::UnknownSession(id))?;
        let session = &mut entry.session;

        if session.status.is_terminal() {
            return Err(MuninnError::SessionTerminal {
                id,
                status: session.status,
            });
        }

        if let Some(label) = update.strategy {
            session.strategies_tried.push(label.clone());
            session.current_strategy = Some(label);
        }
        if update.record_attempt {
            session.attempts += 1;
        }
        if let Some(source) = update.source {
            session.source = Some(source);
        }
        if let Some(confidence) = update.confidence {
            session.confidence = Some(confidence);
        }
        if let Some(error) = update.error {
            session.error = Some(error);
        }
        if let Some(status) = update.status {
            session.status = status;
        }

        Ok(session.clone())
    }

    /// Read-only lookup. `None` when the id is unknown or reaped.
    pub fn get_session(&self, id: Uuid) -> Option<Session> {
        let sessions = self.sessions.lock().expect("session lock poisoned");
        sessions.get(&id).map(|e| e.session.clone())
    }

    /// Reap sessions older than the retention window, regardless of
    /// status. Returns the reaped count.
    pub fn cleanup(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().expect("session lock poisoned");
        let before = sessions.len();
        sessions.retain(|_, e| now.duration_since(e.opened) <= self.retention);
        before - sessions.len()
    }

    /// Number of tracked sessions, terminal ones included.
    pub fn len(&self) -> usize {
        self.sessions.lock().expect("session lock poisoned").len()
    }

    /// Whether no sessions are tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionTracker {
    fn default() -> Self {
        Self::new()
    }
}
