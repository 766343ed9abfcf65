//! Pure state transition function

use super::{Effect, Event, TurnContext, TurnState};
use crate::transport::TurnReply;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: TurnState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    #[must_use]
    pub fn new(state: TurnState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    #[must_use]
    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Rejections of events that are not valid in the current state.
///
/// The guard rejections (`TurnPending`, `ConversationEnded`, `NotReady`,
/// `EmptyMessage`) are silent: nothing is sent and nothing is rendered.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("A turn is already in flight")]
    TurnPending,
    #[error("The conversation has ended")]
    ConversationEnded,
    #[error("The conversation has not started yet")]
    NotReady,
    #[error("Message is empty")]
    EmptyMessage,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same state, context and event it always produces the same
/// result, with no I/O. Effects are listed in the order they must run.
///
/// # Errors
///
/// Returns a [`TransitionError`] when a guard rejects the event or the event
/// makes no sense in `state`. The caller's state is left unchanged.
pub fn transition(
    state: &TurnState,
    context: &TurnContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Startup
        // ============================================================
        (TurnState::Idle, Event::Start) => {
            Ok(TransitionResult::new(TurnState::AwaitingStart).with_effect(Effect::RequestStart))
        }

        (TurnState::AwaitingStart, Event::StartReplied { reply }) => {
            if reply.reply.is_end {
                Ok(end_conversation(&reply.reply))
            } else {
                Ok(TransitionResult::new(TurnState::ActiveIdle)
                    .with_effect(Effect::BeginSession {
                        session_id: reply.session_id,
                    })
                    .with_effects(render_reply(&reply.reply))
                    .with_effect(Effect::ArmSilence {
                        timeout: reply.reply.next_timeout,
                    }))
            }
        }

        // Degraded start: no session id, fallback greeting, no timer
        (TurnState::AwaitingStart, Event::StartFailed { .. }) => {
            Ok(TransitionResult::new(TurnState::ActiveIdle)
                .with_effect(Effect::BeginSession { session_id: None })
                .with_effect(Effect::render_bot(context.texts.fallback_greeting.clone())))
        }

        // ============================================================
        // User sends
        // ============================================================
        (TurnState::ActiveIdle, Event::UserSubmit { text }) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(TransitionError::EmptyMessage);
            }
            let session_id = context.session.current_session_id().cloned();
            Ok(
                TransitionResult::new(TurnState::ActivePending { in_flight: 1 })
                    .with_effect(Effect::CancelSilence)
                    .with_effect(Effect::RenderUser {
                        text: text.to_string(),
                    })
                    .with_effect(Effect::ClearInput)
                    .with_effect(Effect::SetWaiting { waiting: true })
                    .with_effect(Effect::dispatch(text, session_id)),
            )
        }

        (TurnState::ActivePending { .. }, Event::UserSubmit { .. }) => {
            Err(TransitionError::TurnPending)
        }

        (TurnState::Ended, Event::UserSubmit { .. } | Event::SilenceElapsed { .. }) => {
            Err(TransitionError::ConversationEnded)
        }

        (TurnState::Idle | TurnState::AwaitingStart, Event::UserSubmit { .. }) => {
            Err(TransitionError::NotReady)
        }

        // ============================================================
        // Silence-triggered sends (exempt from the pending guard)
        // ============================================================
        (TurnState::ActiveIdle, Event::SilenceElapsed { .. }) => {
            let session_id = context.session.current_session_id().cloned();
            Ok(
                TransitionResult::new(TurnState::ActivePending { in_flight: 1 })
                    .with_effect(Effect::SetWaiting { waiting: true })
                    .with_effect(Effect::dispatch(String::new(), session_id)),
            )
        }

        (TurnState::ActivePending { in_flight }, Event::SilenceElapsed { .. }) => {
            let session_id = context.session.current_session_id().cloned();
            Ok(TransitionResult::new(TurnState::ActivePending {
                in_flight: in_flight + 1,
            })
            .with_effect(Effect::dispatch(String::new(), session_id)))
        }

        // ============================================================
        // Turn outcomes
        // ============================================================
        (TurnState::ActivePending { .. }, Event::TurnReplied { reply }) if reply.is_end => {
            Ok(TransitionResult::new(TurnState::Ended)
                .with_effect(Effect::SetWaiting { waiting: false })
                .with_effects(end_conversation(&reply).effects))
        }

        (TurnState::ActivePending { in_flight }, Event::TurnReplied { reply }) => {
            Ok(settle(*in_flight)
                .with_effects(render_reply(&reply))
                .with_effect(Effect::ArmSilence {
                    timeout: reply.next_timeout,
                }))
        }

        // Transport failure: timer is left exactly as it was
        (TurnState::ActivePending { in_flight }, Event::TurnFailed { .. }) => {
            Ok(settle(*in_flight)
                .with_effect(Effect::render_error(context.texts.network_error.clone())))
        }

        // Late outcomes after the conversation ended are dropped
        (TurnState::Ended, Event::TurnReplied { .. } | Event::TurnFailed { .. }) => {
            Ok(TransitionResult::new(TurnState::Ended))
        }

        // ============================================================
        // Everything else
        // ============================================================
        (state, event) => Err(TransitionError::InvalidTransition(format!(
            "{} in state {}",
            event.name(),
            state.name()
        ))),
    }
}

/// One in-flight turn resolved. Clears the pending flag and hides the
/// waiting indicator when it was the last one.
fn settle(in_flight: u32) -> TransitionResult {
    if in_flight > 1 {
        TransitionResult::new(TurnState::ActivePending {
            in_flight: in_flight - 1,
        })
    } else {
        TransitionResult::new(TurnState::ActiveIdle)
            .with_effect(Effect::SetWaiting { waiting: false })
    }
}

fn render_reply(reply: &TurnReply) -> Option<Effect> {
    let text = reply.visible_text()?;
    Some(if reply.is_error {
        Effect::render_error(text)
    } else {
        Effect::render_bot(text)
    })
}

/// Terminal outcome: render final text, stop the timer for good, end the
/// session and disable input
fn end_conversation(reply: &TurnReply) -> TransitionResult {
    TransitionResult::new(TurnState::Ended)
        .with_effects(render_reply(reply))
        .with_effect(Effect::CancelSilence)
        .with_effect(Effect::EndSession)
        .with_effect(Effect::DisableInput)
}
