//! Chat service transport
//!
//! Provides the HTTP gateway to the remote chat service and the wire types
//! it speaks.

mod error;
mod http;
mod types;

pub use error::{TransportError, TransportErrorKind};
pub use http::HttpGateway;
pub use types::*;

use crate::runtime::TransportGateway;
use async_trait::async_trait;
use std::sync::Arc;

/// Logging wrapper for gateways
pub struct LoggingGateway {
    inner: Arc<dyn TransportGateway>,
}

impl LoggingGateway {
    #[must_use]
    pub fn new(inner: Arc<dyn TransportGateway>) -> Self {
        Self { inner }
    }

    fn log_reply(operation: &str, duration: std::time::Duration, reply: &TurnReply) {
        tracing::info!(
            operation,
            duration_ms = %duration.as_millis(),
            is_error = reply.is_error,
            is_end = reply.is_end,
            timeout_ms = ?reply.next_timeout.map(|t| t.as_millis()),
            "Chat service request completed"
        );
        tracing::debug!(
            operation,
            step = ?reply.diagnostics.current_step,
            total_silence_timeout = ?reply.diagnostics.total_silence_timeout,
            remaining_total_timeout = ?reply.diagnostics.remaining_total_timeout,
            silence_count = ?reply.diagnostics.silence_count,
            no_op = reply.diagnostics.no_op,
            "Reply diagnostics"
        );
    }

    fn log_error(operation: &str, duration: std::time::Duration, error: &TransportError) {
        tracing::error!(
            operation,
            duration_ms = %duration.as_millis(),
            kind = error.kind.as_str(),
            error = %error.message,
            "Chat service request failed"
        );
    }
}

#[async_trait]
impl TransportGateway for LoggingGateway {
    async fn start(&self) -> Result<StartReply, TransportError> {
        let start = std::time::Instant::now();
        let result = self.inner.start().await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    session_id = ?reply.session_id.as_ref().map(crate::session::SessionId::as_str),
                    "Conversation started"
                );
                Self::log_reply("start", duration, &reply.reply);
            }
            Err(e) => Self::log_error("start", duration, e),
        }

        result
    }

    async fn send_turn(&self, request: &TurnRequest) -> Result<TurnReply, TransportError> {
        let start = std::time::Instant::now();
        let result = self.inner.send_turn(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => Self::log_reply("message", duration, reply),
            Err(e) => Self::log_error("message", duration, e),
        }

        result
    }
}
