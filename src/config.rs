//! Command-line and environment configuration

use crate::state_machine::state::{DEFAULT_FALLBACK_GREETING, DEFAULT_NETWORK_ERROR};
use crate::state_machine::ReplyTexts;
use clap::builder::FalseyValueParser;
use clap::Parser;
use reqwest::Url;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("base URL must use http or https, got {0:?}")]
    UnsupportedScheme(String),
    #[error("request timeout must be greater than zero")]
    ZeroTimeout,
    #[error("quick reply {0} is empty")]
    EmptyQuickReply(usize),
}

/// Terminal client for a turn-based chat service
#[derive(Debug, Parser)]
#[command(name = "turn-chat", version, about)]
pub struct Cli {
    /// Base URL of the chat service
    #[arg(long, env = "TURN_CHAT_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "TURN_CHAT_REQUEST_TIMEOUT_SECS", default_value = "30")]
    pub request_timeout_secs: u64,

    /// Greeting shown when the service cannot be reached at startup
    #[arg(long, env = "TURN_CHAT_FALLBACK_GREETING")]
    pub fallback_greeting: Option<String>,

    /// Message shown when a turn fails to reach the service
    #[arg(long, env = "TURN_CHAT_NETWORK_ERROR_TEXT")]
    pub network_error_text: Option<String>,

    /// Canned reply, sent by typing `/1`, `/2`, ... (repeatable)
    #[arg(
        long = "quick-reply",
        env = "TURN_CHAT_QUICK_REPLIES",
        value_delimiter = ','
    )]
    pub quick_replies: Vec<String>,

    /// Emit logs as JSON
    #[arg(long, env = "TURN_CHAT_LOG_JSON", value_parser = FalseyValueParser::new())]
    pub log_json: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", value_parser = FalseyValueParser::new())]
    pub no_color: bool,
}

impl Cli {
    /// Resolve into a validated client configuration
    ///
    /// # Errors
    ///
    /// Fails when the base URL does not parse or [`ClientConfig::validate`] rejects the result.
    pub fn into_config(self) -> Result<ClientConfig, ConfigError> {
        let base_url = Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;

        let config = ClientConfig {
            base_url,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            texts: ReplyTexts {
                fallback_greeting: self
                    .fallback_greeting
                    .unwrap_or_else(|| DEFAULT_FALLBACK_GREETING.to_string()),
                network_error: self
                    .network_error_text
                    .unwrap_or_else(|| DEFAULT_NETWORK_ERROR.to_string()),
            },
            quick_replies: self
                .quick_replies
                .into_iter()
                .map(|reply| reply.trim().to_string())
                .collect(),
            log_json: self.log_json,
            color: !self.no_color,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Validated client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub request_timeout: Duration,
    pub texts: ReplyTexts,
    pub quick_replies: Vec<String>,
    pub log_json: bool,
    pub color: bool,
}

impl ClientConfig {
    /// # Errors
    ///
    /// Rejects a non-HTTP base URL, a zero request timeout and empty quick replies.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !matches!(self.base_url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(
                self.base_url.scheme().to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if let Some(index) = self.quick_replies.iter().position(String::is_empty) {
            return Err(ConfigError::EmptyQuickReply(index + 1));
        }
        Ok(())
    }

    /// Quick reply by its 1-based number
    #[must_use]
    pub fn quick_reply(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|index| self.quick_replies.get(index))
            .map(String::as_str)
    }
}
