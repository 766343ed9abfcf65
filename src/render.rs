//! Terminal rendering of the conversation
//!
//! Every message is split on newlines and written one line per terminal
//! line under a speaker prefix. Empty text renders nothing.

use crate::runtime::MessageRenderer;
use crossterm::style::{StyledContent, Stylize};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

const BOT_PREFIX: &str = "bot";
const USER_PREFIX: &str = "you";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Speaker {
    User,
    Bot,
    BotError,
    Notice,
}

/// `MessageRenderer` writing to a terminal (or any writer)
pub struct TerminalRenderer {
    out: Mutex<Box<dyn Write + Send>>,
    color: bool,
    waiting: AtomicBool,
    input_enabled: AtomicBool,
}

impl TerminalRenderer {
    #[must_use]
    pub fn stdout(color: bool) -> Self {
        Self::with_writer(std::io::stdout(), color)
    }

    #[must_use]
    pub fn with_writer(writer: impl Write + Send + 'static, color: bool) -> Self {
        Self {
            out: Mutex::new(Box::new(writer)),
            color,
            waiting: AtomicBool::new(false),
            input_enabled: AtomicBool::new(true),
        }
    }

    /// False once the conversation has ended
    #[must_use]
    pub fn input_enabled(&self) -> bool {
        self.input_enabled.load(Ordering::SeqCst)
    }

    fn write_lines(&self, speaker: Speaker, text: &str) {
        let lines = format_lines(speaker, text, self.color);
        if lines.is_empty() {
            return;
        }

        let Ok(mut out) = self.out.lock() else {
            tracing::warn!("Renderer output lock poisoned");
            return;
        };
        let result = lines
            .iter()
            .try_for_each(|line| writeln!(out, "{line}"))
            .and_then(|()| out.flush());
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to write to terminal");
        }
    }
}

impl MessageRenderer for TerminalRenderer {
    fn render_user(&self, text: &str) {
        self.write_lines(Speaker::User, text);
    }

    fn render_bot(&self, text: &str, is_error: bool) {
        let speaker = if is_error {
            Speaker::BotError
        } else {
            Speaker::Bot
        };
        self.write_lines(speaker, text);
    }

    fn set_waiting(&self, waiting: bool) {
        // Only the off-to-on edge is shown; the reply itself replaces the indicator
        if waiting && !self.waiting.swap(true, Ordering::SeqCst) {
            self.write_lines(Speaker::Notice, "(waiting for reply...)");
        } else if !waiting {
            self.waiting.store(false, Ordering::SeqCst);
        }
    }

    fn clear_input(&self) {
        // The line editor consumed the input already
    }

    fn disable_input(&self) {
        if self.input_enabled.swap(false, Ordering::SeqCst) {
            self.write_lines(Speaker::Notice, "[conversation ended]");
        }
    }
}

/// Render `text` as terminal lines for `speaker`
fn format_lines(speaker: Speaker, text: &str, color: bool) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let prefix = match speaker {
        Speaker::User => Some(USER_PREFIX),
        Speaker::Bot | Speaker::BotError => Some(BOT_PREFIX),
        Speaker::Notice => None,
    };

    // `lines` drops a trailing newline but keeps blank lines in the middle
    text.lines()
        .map(|line| {
            let line = match prefix {
                Some(prefix) => format!("{prefix}> {line}"),
                None => line.to_string(),
            };
            if color {
                styled(speaker, line).to_string()
            } else {
                line
            }
        })
        .collect()
}

fn styled(speaker: Speaker, line: String) -> StyledContent<String> {
    match speaker {
        Speaker::User => line.green(),
        Speaker::Bot => line.cyan(),
        Speaker::BotError => line.red(),
        Speaker::Notice => line.dim(),
    }
}
