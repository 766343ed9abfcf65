//! Turn Chat - terminal client for turn-based chat services

use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use turn_chat::config::Cli;
use turn_chat::render::TerminalRenderer;
use turn_chat::runtime::{ProductionRuntime, TransportGateway};
use turn_chat::shell;
use turn_chat::state_machine::TurnContext;
use turn_chat::transport::{HttpGateway, LoggingGateway};

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "turn_chat=warn".into());

    // stdout belongs to the conversation
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;
    init_logging(config.log_json);

    let gateway = HttpGateway::from_config(&config)?;
    tracing::info!(
        start_url = %gateway.start_url(),
        message_url = %gateway.message_url(),
        timeout_secs = config.request_timeout.as_secs(),
        "Chat service configured"
    );
    let gateway: Arc<dyn TransportGateway> = Arc::new(gateway);

    let (runtime, handle) = ProductionRuntime::new(
        TurnContext::new(config.texts.clone()),
        LoggingGateway::new(gateway),
        TerminalRenderer::stdout(config.color),
    );
    let runtime_task = tokio::spawn(runtime.run());

    shell::run(handle, &config).await?;

    let final_state = runtime_task.await?;
    tracing::info!(state = final_state.name(), "Exiting");

    Ok(())
}
