//! Runtime for executing the turn controller
//!
//! The runtime task owns all mutable state. Everything else talks to it
//! through a [`TurnHandle`] and observes it through [`RuntimeEvent`]s.

mod executor;
pub mod traits;


pub use executor::TurnRuntime;
pub use traits::*;

use crate::render::TerminalRenderer;
use crate::state_machine::{Event, TransitionError, TurnState};
use crate::transport::LoggingGateway;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime = TurnRuntime<LoggingGateway, TerminalRenderer>;

/// Events published to observers of a running conversation
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    StateChanged {
        state: TurnState,
    },
    /// A guard rejected an event; nothing was sent and nothing changed
    Rejected {
        error: TransitionError,
    },
    /// The conversation reached its terminal state
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("turn runtime has stopped")]
pub struct RuntimeStopped;

/// Handle to interact with a running conversation
#[derive(Clone)]
pub struct TurnHandle {
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<RuntimeEvent>,
    shutdown: CancellationToken,
}

impl TurnHandle {
    /// Ask the runtime to begin the conversation
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeStopped`] once the runtime has shut down.
    pub async fn start(&self) -> Result<(), RuntimeStopped> {
        self.send(Event::Start).await
    }

    /// Submit user text. Acceptance is decided by the runtime; a rejected
    /// submit shows up as [`RuntimeEvent::Rejected`].
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeStopped`] once the runtime has shut down.
    pub async fn submit(&self, text: impl Into<String>) -> Result<(), RuntimeStopped> {
        self.send(Event::user_submit(text)).await
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.broadcast_tx.subscribe()
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    #[cfg(test)]
    fn is_stopped(&self) -> bool {
        self.shutdown.is_cancelled() || self.event_tx.is_closed()
    }

    async fn send(&self, event: Event) -> Result<(), RuntimeStopped> {
        if self.shutdown.is_cancelled() {
            return Err(RuntimeStopped);
        }
        self.event_tx.send(event).await.map_err(|_| RuntimeStopped)
    }
}
