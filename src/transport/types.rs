//! Request and reply types for the chat service
//!
//! Wire shapes:
//! - `POST /api/start` -> `{ message, session_id?, timeout? }` or `{ error, end? }`
//! - `POST /api/message` with `{ message, session_id? }` ->
//!   `{ message, end, timeout? }` or `{ error, end? }`

use super::TransportError;
use crate::session::SessionId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Domain types
// ============================================================================

/// One turn sent to the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnRequest {
    /// Empty only for silence-triggered turns
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
}

impl TurnRequest {
    #[must_use]
    pub fn is_silence(&self) -> bool {
        self.message.is_empty()
    }
}

/// Decoded service reply
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TurnReply {
    pub display_text: Option<String>,
    pub is_error: bool,
    pub is_end: bool,
    /// Silence window before the next automatic turn; `None` means do not arm
    pub next_timeout: Option<Duration>,
    pub diagnostics: ReplyDiagnostics,
}

impl TurnReply {
    #[must_use]
    pub fn message(text: impl Into<String>) -> Self {
        Self {
            display_text: Some(text.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            display_text: Some(text.into()),
            is_error: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_end(mut self, is_end: bool) -> Self {
        self.is_end = is_end;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.next_timeout = Some(timeout);
        self
    }

    /// Text worth rendering, if any
    #[must_use]
    pub fn visible_text(&self) -> Option<&str> {
        self.display_text.as_deref().filter(|t| !t.is_empty())
    }
}

/// Dialogue bookkeeping the service includes for debugging. Logged, never acted on.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReplyDiagnostics {
    pub current_step: Option<String>,
    pub total_silence_timeout: Option<f64>,
    pub remaining_total_timeout: Option<f64>,
    pub silence_count: Option<u32>,
    pub no_op: bool,
}

/// Reply to the start-of-conversation request
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StartReply {
    pub session_id: Option<SessionId>,
    pub reply: TurnReply,
}

// ============================================================================
// Wire format
// ============================================================================

/// Raw reply body shared by both endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReplyBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub end: Option<bool>,
    #[serde(default)]
    pub timeout: Option<f64>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub current_step: Option<String>,
    #[serde(default)]
    pub total_silence_timeout: Option<f64>,
    #[serde(default)]
    pub remaining_total_timeout: Option<f64>,
    #[serde(default)]
    pub current_silence_count: Option<u32>,
    #[serde(default)]
    pub no_op: Option<bool>,
}

impl ReplyBody {
    /// Decode into a turn reply.
    ///
    /// An `error` field wins over `message`.
    ///
    /// # Errors
    ///
    /// Returns a decode error when the body has neither `message` nor `error`.
    pub fn into_turn_reply(self) -> Result<TurnReply, TransportError> {
        let diagnostics = ReplyDiagnostics {
            current_step: self.current_step,
            total_silence_timeout: self.total_silence_timeout,
            remaining_total_timeout: self.remaining_total_timeout,
            silence_count: self.current_silence_count,
            no_op: self.no_op.unwrap_or(false),
        };
        let next_timeout = self.timeout.and_then(timeout_from_millis);
        let is_end = self.end.unwrap_or(false);

        let (display_text, is_error) = match (self.error, self.message) {
            (Some(error), _) => (Some(error), true),
            (None, Some(message)) => (Some(message), false),
            (None, None) => {
                return Err(TransportError::decode(
                    "reply has neither `message` nor `error`",
                ))
            }
        };

        Ok(TurnReply {
            display_text,
            is_error,
            is_end,
            next_timeout,
            diagnostics,
        })
    }

    /// Decode into a start reply; an empty `session_id` counts as absent.
    ///
    /// # Errors
    ///
    /// Fails the same way as [`ReplyBody::into_turn_reply`].
    pub fn into_start_reply(mut self) -> Result<StartReply, TransportError> {
        let session_id = self
            .session_id
            .take()
            .filter(|id| !id.is_empty())
            .map(SessionId::new);
        Ok(StartReply {
            session_id,
            reply: self.into_turn_reply()?,
        })
    }
}

/// Longest silence window honoured; larger server values are clamped to it
pub const MAX_SILENCE_TIMEOUT: Duration = Duration::from_millis(4_294_967_295);

/// Server timeouts are milliseconds; zero, negative or non-finite means "do not arm"
#[must_use]
pub fn timeout_from_millis(millis: f64) -> Option<Duration> {
    if !millis.is_finite() || millis <= 0.0 {
        return None;
    }
    if millis >= f64::from(u32::MAX) {
        return Some(MAX_SILENCE_TIMEOUT);
    }
    Duration::try_from_secs_f64(millis / 1000.0).ok()
}
