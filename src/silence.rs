//! Single-slot silence timer
//!
//! Arming spawns a task that sleeps for the server-provided window and then
//! posts `Event::SilenceElapsed { generation }` to the runtime. Each arming
//! gets a fresh generation; only the live generation can be claimed, so a
//! fire that raced with a cancel or a re-arm is discarded by the runtime.

use crate::state_machine::Event;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

struct Pending {
    generation: u64,
    handle: JoinHandle<()>,
}

pub struct SilenceTimer {
    event_tx: mpsc::Sender<Event>,
    next_generation: u64,
    pending: Option<Pending>,
}

impl SilenceTimer {
    #[must_use]
    pub fn new(event_tx: mpsc::Sender<Event>) -> Self {
        Self {
            event_tx,
            next_generation: 1,
            pending: None,
        }
    }

    /// Cancel any pending fire, then schedule a new one if `timeout` is a
    /// positive duration. Returns the generation of the new arming.
    pub fn arm(&mut self, timeout: Option<Duration>) -> Option<u64> {
        self.cancel();

        let timeout = timeout.filter(|t| !t.is_zero())?;
        let generation = self.next_generation;
        self.next_generation += 1;

        let event_tx = self.event_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let _ = event_tx.send(Event::SilenceElapsed { generation }).await;
        });

        tracing::debug!(generation, timeout_ms = %timeout.as_millis(), "Silence timer armed");
        self.pending = Some(Pending { generation, handle });
        Some(generation)
    }

    /// No-op when nothing is pending. Returns whether a pending fire was cancelled.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                pending.handle.abort();
                tracing::debug!(generation = pending.generation, "Silence timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Accept a fire for `generation`. Succeeds at most once and only for the
    /// live arming; the timer is disarmed afterwards.
    pub fn claim(&mut self, generation: u64) -> bool {
        match &self.pending {
            Some(pending) if pending.generation == generation => {
                self.pending = None;
                true
            }
            _ => {
                tracing::debug!(generation, "Discarding stale silence fire");
                false
            }
        }
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    #[cfg(test)]
    fn armed_generation(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.generation)
    }
}

impl Drop for SilenceTimer {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
        }
    }
}
