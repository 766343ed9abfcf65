//! Turn runtime executor

use super::traits::{MessageRenderer, TransportGateway};
use super::{RuntimeEvent, TurnHandle};

use crate::session::SessionId;
use crate::silence::SilenceTimer;
use crate::state_machine::{transition, Effect, Event, TurnContext, TurnState};
use crate::transport::TurnRequest;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// Generic turn runtime that can work with any gateway and renderer implementations
pub struct TurnRuntime<G, R>
where
    G: TransportGateway + 'static,
    R: MessageRenderer + 'static,
{
    context: TurnContext,
    state: TurnState,
    gateway: Arc<G>,
    renderer: R,
    silence: SilenceTimer,
    event_rx: mpsc::Receiver<Event>,
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<RuntimeEvent>,
    /// Stops the event loop and any in-flight gateway calls
    shutdown: CancellationToken,
}

impl<G, R> TurnRuntime<G, R>
where
    G: TransportGateway + 'static,
    R: MessageRenderer + 'static,
{
    /// Build a runtime in `Idle` together with the handle used to drive it
    #[must_use]
    pub fn new(context: TurnContext, gateway: G, renderer: R) -> (Self, TurnHandle) {
        let (event_tx, event_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);
        let shutdown = CancellationToken::new();

        let handle = TurnHandle {
            event_tx: event_tx.clone(),
            broadcast_tx: broadcast_tx.clone(),
            shutdown: shutdown.clone(),
        };

        let runtime = Self {
            context,
            state: TurnState::Idle,
            gateway: Arc::new(gateway),
            renderer,
            silence: SilenceTimer::new(event_tx.clone()),
            event_rx,
            event_tx,
            broadcast_tx,
            shutdown,
        };

        (runtime, handle)
    }

    /// Process events until the conversation ends or shutdown is requested.
    /// Returns the final state.
    pub async fn run(mut self) -> TurnState {
        tracing::info!("Starting turn runtime");

        // Process events in a loop - no recursion
        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => {
                    tracing::info!(state = self.state.name(), "Shutdown requested");
                    break;
                }
                Some(event) = self.event_rx.recv() => {
                    self.process_event(event);
                    if self.state.is_terminal() {
                        break;
                    }
                }
                else => break,
            }
        }

        // Nothing outlives the loop: pending fire and in-flight requests go with it
        self.silence.cancel();
        self.shutdown.cancel();
        tracing::info!(state = self.state.name(), "Turn runtime stopped");
        self.state
    }

    fn process_event(&mut self, event: Event) {
        // A fire that lost to a cancel or a re-arm is dropped before it reaches the machine
        if let Event::SilenceElapsed { generation } = &event {
            let generation = *generation;
            if !self.silence.claim(generation) {
                return;
            }
            tracing::info!(generation, "Silence timeout elapsed");
        }

        let event_name = event.name();

        // Pure state transition
        let result = match transition(&self.state, &self.context, event) {
            Ok(r) => r,
            Err(e) => {
                // Guard rejections are silent to the user
                tracing::debug!(
                    event = event_name,
                    state = self.state.name(),
                    error = %e,
                    "Event rejected"
                );
                let _ = self.broadcast_tx.send(RuntimeEvent::Rejected { error: e });
                return;
            }
        };

        let old_state = std::mem::replace(&mut self.state, result.new_state);

        for effect in result.effects {
            self.execute_effect(effect);
        }

        if old_state != self.state {
            tracing::debug!(
                from = old_state.name(),
                to = self.state.name(),
                event = event_name,
                "State changed"
            );
            let _ = self
                .broadcast_tx
                .send(RuntimeEvent::StateChanged { state: self.state });
            if self.state.is_terminal() {
                tracing::info!(
                    session_id = ?self.context.session.current_session_id().map(SessionId::as_str),
                    "Conversation ended"
                );
                let _ = self.broadcast_tx.send(RuntimeEvent::Ended);
            }
        }
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::RequestStart => {
                let gateway = self.gateway.clone();
                let event_tx = self.event_tx.clone();
                let shutdown = self.shutdown.clone();

                // Spawn start request as background task
                tokio::spawn(async move {
                    let outcome = tokio::select! {
                        () = shutdown.cancelled() => return,
                        outcome = gateway.start() => outcome,
                    };
                    let event = match outcome {
                        Ok(reply) => Event::StartReplied { reply },
                        Err(e) => {
                            tracing::warn!(error = %e, "Start failed, continuing without a session");
                            Event::StartFailed {
                                message: e.to_string(),
                            }
                        }
                    };
                    let _ = event_tx.send(event).await;
                });
            }

            Effect::BeginSession { session_id } => {
                self.context.session.begin(session_id);
            }

            Effect::EndSession => {
                self.context.session.end();
            }

            Effect::RenderUser { text } => {
                self.renderer.render_user(&text);
            }

            Effect::RenderBot { text, is_error } => {
                self.renderer.render_bot(&text, is_error);
            }

            Effect::SetWaiting { waiting } => {
                self.renderer.set_waiting(waiting);
            }

            Effect::ClearInput => {
                self.renderer.clear_input();
            }

            Effect::DisableInput => {
                self.renderer.disable_input();
            }

            Effect::ArmSilence { timeout } => {
                self.silence.arm(timeout);
            }

            Effect::CancelSilence => {
                self.silence.cancel();
            }

            Effect::DispatchTurn { request } => {
                if !self.context.session.is_active() {
                    // Settle the turn so the controller never waits on a request that was not sent
                    tracing::warn!("Session inactive, refusing to dispatch turn");
                    let event_tx = self.event_tx.clone();
                    tokio::spawn(async move {
                        let _ = event_tx
                            .send(Event::TurnFailed {
                                message: "session is not active".to_string(),
                            })
                            .await;
                    });
                    return;
                }
                self.spawn_turn(request);
            }
        }
    }

    fn spawn_turn(&self, request: TurnRequest) {
        let gateway = self.gateway.clone();
        let event_tx = self.event_tx.clone();
        let shutdown = self.shutdown.clone();

        tracing::info!(
            silence = request.is_silence(),
            session_id = ?request.session_id.as_ref().map(SessionId::as_str),
            "Dispatching turn (background)"
        );

        tokio::spawn(async move {
            let outcome = tokio::select! {
                () = shutdown.cancelled() => return,
                outcome = gateway.send_turn(&request) => outcome,
            };
            let event = match outcome {
                Ok(reply) => Event::TurnReplied { reply },
                Err(e) => {
                    tracing::warn!(kind = e.kind.as_str(), error = %e, "Turn failed");
                    Event::TurnFailed {
                        message: e.to_string(),
                    }
                }
            };
            let _ = event_tx.send(event).await;
        });
    }
}
