use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;

use relaycode_agent::AgentInvoker;
use relaycode_core::BridgeConfig;
use relaycode_telegram::{BridgeState, TelegramAdapter};

/// Telegram bridge for a CLI coding agent.
#[derive(Debug, Parser)]
#[command(name = "relaycode", version)]
struct Args {
    /// Path to relaycode.toml (default: ~/.relaycode/relaycode.toml).
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "relaycode=info".into()),
        )
        .init();

    let args = Args::parse();

    // load config: explicit flag > RELAYCODE_CONFIG env > ~/.relaycode/relaycode.toml
    let config_path = args
        .config
        .or_else(|| std::env::var("RELAYCODE_CONFIG").ok());
    let config = BridgeConfig::load(config_path.as_deref())?;

    info!(
        command = %config.agent.command,
        restricted = config.telegram.allowed_chat.is_some(),
        "starting relaycode bridge"
    );

    let invoker = AgentInvoker::new(config.agent.command.clone())
        .with_timeout(Duration::from_secs(config.agent.run_timeout_secs));
    let state = Arc::new(BridgeState::new(invoker));

    TelegramAdapter::new(&config.telegram, state).run().await;

    Ok(())
}
