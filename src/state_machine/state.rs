//! Controller state types

use crate::session::SessionState;

pub const DEFAULT_FALLBACK_GREETING: &str = "Hello! Welcome to the customer service assistant.";
pub const DEFAULT_NETWORK_ERROR: &str =
    "Network connection failed, please check your network and try again.";

// ============================================================================
// Controller State
// ============================================================================

/// Turn controller state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    /// Constructed, startup not yet requested
    #[default]
    Idle,

    /// Start-of-conversation request in flight
    AwaitingStart,

    /// Conversation running, no turn in flight
    ActiveIdle,

    /// Conversation running with turns in flight.
    ///
    /// `in_flight` is always at least 1. It only exceeds 1 when a silence fire
    /// is dispatched while another turn is still outstanding.
    ActivePending { in_flight: u32 },

    /// Conversation over; terminal
    Ended,
}

impl TurnState {
    /// Short name for logs and state-change notifications
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            TurnState::Idle => "idle",
            TurnState::AwaitingStart => "awaiting_start",
            TurnState::ActiveIdle => "active_idle",
            TurnState::ActivePending { .. } => "active_pending",
            TurnState::Ended => "ended",
        }
    }

    /// The pending-turn flag
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, TurnState::ActivePending { .. })
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnState::Ended)
    }

    /// Whether a user-initiated send would be accepted
    #[must_use]
    pub fn accepts_user_input(&self) -> bool {
        matches!(self, TurnState::ActiveIdle)
    }
}

// ============================================================================
// Context
// ============================================================================

/// Texts the controller renders on its own, without the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyTexts {
    /// Shown when the start-of-conversation request fails
    pub fallback_greeting: String,
    /// Shown when a turn fails at the transport level
    pub network_error: String,
}

impl Default for ReplyTexts {
    fn default() -> Self {
        Self {
            fallback_greeting: DEFAULT_FALLBACK_GREETING.to_string(),
            network_error: DEFAULT_NETWORK_ERROR.to_string(),
        }
    }
}

/// Data the transition function reads besides the state itself.
///
/// The runtime owns the session and mutates it only through
/// `BeginSession`/`EndSession` effects.
#[derive(Debug, Clone, Default)]
pub struct TurnContext {
    pub session: SessionState,
    pub texts: ReplyTexts,
}

impl TurnContext {
    #[must_use]
    pub fn new(texts: ReplyTexts) -> Self {
        Self {
            session: SessionState::new(),
            texts,
        }
    }
}
