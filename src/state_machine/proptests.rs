//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::*;
use crate::session::SessionId;
use crate::transport::{StartReply, TurnReply, TurnRequest};
use proptest::prelude::*;
use std::time::Duration;

// ============================================================================
// Test Helpers
// ============================================================================

fn fresh_context() -> TurnContext {
    TurnContext::new(ReplyTexts::default())
}

fn test_context(session_id: Option<&str>) -> TurnContext {
    let mut context = TurnContext::new(ReplyTexts::default());
    context.session.begin(session_id.map(SessionId::new));
    context
}

/// Apply session effects the way the runtime does
fn apply_session_effects(context: &mut TurnContext, effects: &[Effect]) {
    for effect in effects {
        match effect {
            Effect::BeginSession { session_id } => context.session.begin(session_id.clone()),
            Effect::EndSession => context.session.end(),
            _ => {}
        }
    }
}

fn dispatches(effects: &[Effect]) -> Vec<&TurnRequest> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::DispatchTurn { request } => Some(request),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_timeout() -> impl Strategy<Value = Option<Duration>> {
    prop_oneof![Just(None), (1u64..60_000).prop_map(|ms| Some(Duration::from_millis(ms)))]
}

fn arb_turn_reply() -> impl Strategy<Value = TurnReply> {
    (
        proptest::option::of("[a-zA-Z \n]{0,30}"),
        any::<bool>(),
        any::<bool>(),
        arb_timeout(),
    )
        .prop_map(|(display_text, is_error, is_end, next_timeout)| TurnReply {
            display_text,
            is_error,
            is_end,
            next_timeout,
            ..TurnReply::default()
        })
}

fn arb_start_reply() -> impl Strategy<Value = StartReply> {
    (proptest::option::of("[a-z0-9]{1,12}"), arb_turn_reply()).prop_map(|(id, reply)| {
        StartReply {
            session_id: id.map(SessionId::new),
            reply,
        }
    })
}

fn arb_state() -> impl Strategy<Value = TurnState> {
    prop_oneof![
        Just(TurnState::Idle),
        Just(TurnState::AwaitingStart),
        Just(TurnState::ActiveIdle),
        (1u32..4).prop_map(|in_flight| TurnState::ActivePending { in_flight }),
        Just(TurnState::Ended),
    ]
}

fn arb_user_submit_event() -> impl Strategy<Value = Event> {
    "[a-zA-Z ]{0,30}".prop_map(|text| Event::UserSubmit { text })
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        Just(Event::Start),
        arb_start_reply().prop_map(|reply| Event::StartReplied { reply }),
        "[a-z ]{1,20}".prop_map(|message| Event::StartFailed { message }),
        arb_user_submit_event(),
        (1u64..10).prop_map(|generation| Event::SilenceElapsed { generation }),
        arb_turn_reply().prop_map(|reply| Event::TurnReplied { reply }),
        "[a-z ]{1,20}".prop_map(|message| Event::TurnFailed { message }),
    ]
}

// ============================================================================
// State Validity Checkers
// ============================================================================

fn is_valid_state(state: &TurnState) -> bool {
    match state {
        TurnState::ActivePending { in_flight } => *in_flight >= 1,
        _ => true,
    }
}

fn effects_are_valid(effects: &[Effect], new_state: &TurnState) -> bool {
    let has_dispatch = effects
        .iter()
        .any(|e| matches!(e, Effect::DispatchTurn { .. }));
    let has_request_start = effects.iter().any(|e| matches!(e, Effect::RequestStart));
    let has_disable = effects.iter().any(|e| matches!(e, Effect::DisableInput));

    // A dispatched turn always leaves the controller pending
    if has_dispatch && !new_state.is_pending() {
        return false;
    }

    if has_request_start && *new_state != TurnState::AwaitingStart {
        return false;
    }

    // Input is only ever disabled on the way into Ended
    if has_disable && !new_state.is_terminal() {
        return false;
    }

    true
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    // Invariant 1: Valid state and effects after any sequence of transitions
    #[test]
    fn prop_transitions_preserve_validity(events in proptest::collection::vec(arb_event(), 0..30)) {
        let mut state = TurnState::Idle;
        let mut ctx = fresh_context();

        for event in events {
            if let Ok(result) = transition(&state, &ctx, event) {
                state = result.new_state;
                apply_session_effects(&mut ctx, &result.effects);
                prop_assert!(is_valid_state(&state), "Invalid state: {:?}", state);
                prop_assert!(
                    effects_are_valid(&result.effects, &state),
                    "Invalid effects for state {:?}: {:?}",
                    state,
                    result.effects
                );
            }
        }
    }

    // Invariant 2: Pending rejects every user send, with no effects at all
    #[test]
    fn prop_pending_rejects_user_sends(
        in_flight in 1u32..4,
        event in arb_user_submit_event()
    ) {
        let state = TurnState::ActivePending { in_flight };
        let result = transition(&state, &test_context(Some("abc")), event);
        prop_assert_eq!(result.unwrap_err(), TransitionError::TurnPending);
    }

    // Invariant 3: Ended is absorbing and never dispatches
    #[test]
    fn prop_ended_is_terminal(events in proptest::collection::vec(arb_event(), 1..20)) {
        let mut ctx = test_context(Some("abc"));
        ctx.session.end();

        for event in events {
            if let Ok(result) = transition(&TurnState::Ended, &ctx, event) {
                prop_assert_eq!(result.new_state, TurnState::Ended);
                prop_assert!(result.effects.is_empty(), "Ended produced effects: {:?}", result.effects);
            }
        }
    }

    // Invariant 4: Every accepted user send cancels the silence timer before dispatching
    #[test]
    fn prop_user_send_cancels_before_dispatch(text in "[a-zA-Z]{1,10}[a-zA-Z ]{0,20}") {
        let result = transition(
            &TurnState::ActiveIdle,
            &test_context(Some("abc")),
            Event::UserSubmit { text },
        ).unwrap();

        let cancel_at = result.effects.iter().position(|e| *e == Effect::CancelSilence);
        let dispatch_at = result
            .effects
            .iter()
            .position(|e| matches!(e, Effect::DispatchTurn { .. }));
        prop_assert!(cancel_at.is_some());
        prop_assert!(dispatch_at.is_some());
        prop_assert!(cancel_at < dispatch_at);
    }

    // Invariant 5: Every dispatch echoes the session id issued at start
    #[test]
    fn prop_session_id_echoed(
        session_id in "[a-z0-9]{1,12}",
        events in proptest::collection::vec(arb_event(), 0..30)
    ) {
        let mut state = TurnState::AwaitingStart;
        let mut ctx = fresh_context();

        let start = StartReply {
            session_id: Some(SessionId::new(session_id.clone())),
            reply: TurnReply::message("Welcome"),
        };
        let result = transition(&state, &ctx, Event::StartReplied { reply: start }).unwrap();
        state = result.new_state;
        apply_session_effects(&mut ctx, &result.effects);

        for event in events {
            // Another start reply can only arrive from a second start request, which never happens
            if matches!(event, Event::StartReplied { .. } | Event::StartFailed { .. }) {
                continue;
            }
            if let Ok(result) = transition(&state, &ctx, event) {
                for request in dispatches(&result.effects) {
                    prop_assert_eq!(
                        request.session_id.as_ref().map(SessionId::as_str),
                        Some(session_id.as_str())
                    );
                }
                state = result.new_state;
                apply_session_effects(&mut ctx, &result.effects);
            }
        }
    }

    // Invariant 6: A terminal reply always ends the session and disables input
    #[test]
    fn prop_terminal_reply_ends(in_flight in 1u32..4, reply in arb_turn_reply()) {
        let reply = reply.with_end(true);
        let result = transition(
            &TurnState::ActivePending { in_flight },
            &test_context(Some("abc")),
            Event::TurnReplied { reply },
        ).unwrap();

        prop_assert_eq!(result.new_state, TurnState::Ended);
        prop_assert!(result.effects.contains(&Effect::CancelSilence));
        prop_assert!(result.effects.contains(&Effect::EndSession));
        prop_assert!(result.effects.contains(&Effect::DisableInput));
        prop_assert!(dispatches(&result.effects).is_empty());
    }

    // Invariant 7: Transport failures never touch the silence timer
    #[test]
    fn prop_transport_failure_leaves_timer(in_flight in 1u32..4, message in "[a-z ]{1,20}") {
        let result = transition(
            &TurnState::ActivePending { in_flight },
            &test_context(Some("abc")),
            Event::TurnFailed { message },
        ).unwrap();

        let touched_timer = result.effects.iter().any(|e| matches!(
            e,
            Effect::ArmSilence { .. } | Effect::CancelSilence
        ));
        prop_assert!(!touched_timer, "Transport failure touched the timer: {:?}", result.effects);
        prop_assert!(!result.new_state.is_terminal());
    }

    // Invariant 8: Non-terminal replies relay the server timeout verbatim
    #[test]
    fn prop_reply_relays_timeout(reply in arb_turn_reply()) {
        let reply = reply.with_end(false);
        let expected = reply.next_timeout;
        let result = transition(
            &TurnState::ActivePending { in_flight: 1 },
            &test_context(Some("abc")),
            Event::TurnReplied { reply },
        ).unwrap();

        prop_assert_eq!(result.new_state, TurnState::ActiveIdle);
        let relayed = result.effects.contains(&Effect::ArmSilence { timeout: expected });
        prop_assert!(relayed, "Timeout {:?} not relayed: {:?}", expected, result.effects);
    }

    // Invariant 9: Arbitrary events from any state never panic
    #[test]
    fn prop_any_event_from_any_state(state in arb_state(), event in arb_event()) {
        let _ = transition(&state, &test_context(Some("abc")), event);
    }
}
