//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the runtime with mock implementations.

use crate::transport::{StartReply, TransportError, TurnReply, TurnRequest};
use async_trait::async_trait;
use std::sync::Arc;

/// Client for the remote chat service
#[async_trait]
pub trait TransportGateway: Send + Sync {
    /// Begin a conversation
    async fn start(&self) -> Result<StartReply, TransportError>;

    /// Send one turn. An empty message is a silence-triggered turn.
    async fn send_turn(&self, request: &TurnRequest) -> Result<TurnReply, TransportError>;
}

/// Sink for everything the user sees
///
/// Calls are made from the runtime task in effect order, so implementations
/// never see interleaved output from two transitions.
pub trait MessageRenderer: Send + Sync {
    fn render_user(&self, text: &str);

    fn render_bot(&self, text: &str, is_error: bool);

    /// Show or hide the waiting indicator
    fn set_waiting(&self, waiting: bool);

    fn clear_input(&self);

    /// Terminal: no further sends will be accepted
    fn disable_input(&self);
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: TransportGateway + ?Sized> TransportGateway for Arc<T> {
    async fn start(&self) -> Result<StartReply, TransportError> {
        (**self).start().await
    }

    async fn send_turn(&self, request: &TurnRequest) -> Result<TurnReply, TransportError> {
        (**self).send_turn(request).await
    }
}

impl<T: MessageRenderer + ?Sized> MessageRenderer for Arc<T> {
    fn render_user(&self, text: &str) {
        (**self).render_user(text);
    }

    fn render_bot(&self, text: &str, is_error: bool) {
        (**self).render_bot(text, is_error);
    }

    fn set_waiting(&self, waiting: bool) {
        (**self).set_waiting(waiting);
    }

    fn clear_input(&self) {
        (**self).clear_input();
    }

    fn disable_input(&self) {
        (**self).disable_input();
    }
}
