//! Interactive stdin loop
//!
//! Reads lines from stdin and feeds them to the runtime until the
//! conversation ends, stdin closes, or the user quits.

use crate::config::ClientConfig;
use crate::runtime::{RuntimeEvent, RuntimeStopped, TurnHandle};
use std::fmt::Write as _;
use std::io::BufRead;
use tokio::sync::{broadcast, mpsc};

/// One line of user input, interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Send(String),
    Quit,
    Help,
    /// Slash command that matched nothing
    Unknown(String),
}

/// Interpret a line. `/N` picks quick reply N; anything not starting with
/// `/` is sent as typed.
#[must_use]
pub fn parse_line(line: &str, config: &ClientConfig) -> Command {
    let trimmed = line.trim();
    let Some(command) = trimmed.strip_prefix('/') else {
        return Command::Send(line.to_string());
    };

    match command {
        "quit" | "exit" | "q" => Command::Quit,
        "help" | "?" => Command::Help,
        _ => command
            .parse::<usize>()
            .ok()
            .and_then(|n| config.quick_reply(n))
            .map_or_else(
                || Command::Unknown(trimmed.to_string()),
                |reply| Command::Send(reply.to_string()),
            ),
    }
}

fn help_text(config: &ClientConfig) -> String {
    let mut text = String::from("Commands: /help, /quit");
    for (i, reply) in config.quick_replies.iter().enumerate() {
        let _ = write!(text, "\n  /{} -> {reply}", i + 1);
    }
    text
}

/// Read stdin on a plain thread so a pending read never holds up exit
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read stdin");
                    break;
                }
            }
        }
    });
    rx
}

/// Drive the conversation from stdin. Returns when the conversation ends,
/// stdin reaches EOF, or the user quits.
///
/// # Errors
///
/// Returns [`RuntimeStopped`] if the runtime is already gone when the
/// conversation is started.
pub async fn run(handle: TurnHandle, config: &ClientConfig) -> Result<(), RuntimeStopped> {
    let mut events = handle.subscribe();
    handle.start().await?;

    let mut lines = spawn_stdin_reader();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(RuntimeEvent::Ended) | Err(broadcast::error::RecvError::Closed) => break,
                Ok(RuntimeEvent::Rejected { error }) => {
                    tracing::debug!(error = %error, "Input not accepted");
                }
                Ok(RuntimeEvent::StateChanged { .. }) => {}
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Runtime events lagged");
                }
            },
            line = lines.recv() => {
                let Some(line) = line else {
                    tracing::info!("stdin closed");
                    break;
                };

                match parse_line(&line, config) {
                    Command::Send(text) => {
                        if handle.submit(text).await.is_err() {
                            break;
                        }
                    }
                    Command::Quit => break,
                    Command::Help => println!("{}", help_text(config)),
                    Command::Unknown(command) => {
                        println!("Unknown command {command}. Type /help for commands.");
                    }
                }
            }
        }
    }

    handle.shutdown();
    Ok(())
}
