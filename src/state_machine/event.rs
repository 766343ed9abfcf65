//! Events that can occur in a conversation

use crate::transport::{StartReply, TurnReply};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    /// Application startup
    Start,

    // Start-of-conversation outcomes
    StartReplied {
        reply: StartReply,
    },
    StartFailed {
        message: String,
    },

    // User events
    UserSubmit {
        text: String,
    },

    /// The silence timer fired for the given arming
    SilenceElapsed {
        generation: u64,
    },

    // Turn outcomes
    TurnReplied {
        reply: TurnReply,
    },
    TurnFailed {
        message: String,
    },
}

impl Event {
    #[must_use]
    pub fn user_submit(text: impl Into<String>) -> Self {
        Event::UserSubmit { text: text.into() }
    }

    /// Short name used in logs and transition errors
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::StartReplied { .. } => "start_replied",
            Event::StartFailed { .. } => "start_failed",
            Event::UserSubmit { .. } => "user_submit",
            Event::SilenceElapsed { .. } => "silence_elapsed",
            Event::TurnReplied { .. } => "turn_replied",
            Event::TurnFailed { .. } => "turn_failed",
        }
    }
}
