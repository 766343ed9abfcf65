//! Conversation session state
//!
//! Holds the server-issued session identifier and the lifecycle flag.
//! Once ended, a session never becomes active again.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque session token issued by the remote service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of the single conversation this client drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Lifecycle {
    #[default]
    NotStarted,
    Active,
    Ended,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    session_id: Option<SessionId>,
    lifecycle: Lifecycle,
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the session. `None` is the degraded mode where the service never
    /// issued an identifier.
    ///
    /// Beginning an already active session overwrites the identifier; the
    /// server is the source of truth. Beginning after `end` is ignored.
    pub fn begin(&mut self, session_id: Option<SessionId>) {
        match self.lifecycle {
            Lifecycle::Ended => {
                tracing::warn!(
                    session_id = ?session_id.as_ref().map(SessionId::as_str),
                    "Ignoring begin on an ended session"
                );
            }
            Lifecycle::Active => {
                tracing::debug!(
                    old = ?self.session_id.as_ref().map(SessionId::as_str),
                    new = ?session_id.as_ref().map(SessionId::as_str),
                    "Overwriting session identifier"
                );
                self.session_id = session_id;
            }
            Lifecycle::NotStarted => {
                self.session_id = session_id;
                self.lifecycle = Lifecycle::Active;
            }
        }
    }

    /// Idempotent.
    pub fn end(&mut self) {
        self.lifecycle = Lifecycle::Ended;
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lifecycle == Lifecycle::Active
    }

    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.lifecycle == Lifecycle::Ended
    }

    #[must_use]
    pub fn current_session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }
}
