//! Effects produced by state transitions

use crate::session::SessionId;
use crate::transport::TurnRequest;
use std::time::Duration;

/// Effects to be executed after state transition, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Ask the gateway to begin a conversation
    RequestStart,

    /// Record the session as active
    BeginSession { session_id: Option<SessionId> },

    /// Mark the session permanently inactive
    EndSession,

    /// Echo the user's own message
    RenderUser { text: String },

    /// Show service text (greeting, reply, error or fallback)
    RenderBot { text: String, is_error: bool },

    /// Show or hide the "waiting for reply" indicator
    SetWaiting { waiting: bool },

    ClearInput,

    /// Disable all send affordances (terminal)
    DisableInput,

    /// Cancel-then-schedule the silence timer. `None` leaves it disarmed.
    ArmSilence { timeout: Option<Duration> },

    CancelSilence,

    /// Send one turn to the gateway (spawns as background task)
    DispatchTurn { request: TurnRequest },
}

impl Effect {
    #[must_use]
    pub fn render_bot(text: impl Into<String>) -> Self {
        Effect::RenderBot {
            text: text.into(),
            is_error: false,
        }
    }

    #[must_use]
    pub fn render_error(text: impl Into<String>) -> Self {
        Effect::RenderBot {
            text: text.into(),
            is_error: true,
        }
    }

    #[must_use]
    pub fn dispatch(message: impl Into<String>, session_id: Option<SessionId>) -> Self {
        Effect::DispatchTurn {
            request: TurnRequest {
                message: message.into(),
                session_id,
            },
        }
    }
}
