//! Turn Chat - client-side controller for turn-based chat services
//!
//! Drives a conversation against a remote chat service: one turn in flight at
//! a time, server-directed silence timeouts that auto-submit empty turns, and
//! a terminal `end` signal after which nothing more is sent.

pub mod config;
pub mod render;
pub mod runtime;
pub mod session;
pub mod shell;
pub mod silence;
pub mod state_machine;
pub mod transport;
