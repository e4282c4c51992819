//! Ledger invoke client
//!
//! Endorses a chaincode invocation on every configured peer, submits it to
//! the sequencer and waits until every peer confirms the commit.

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ledger_cli::args::Cli;
use ledger_cli::config::load_config;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr, results to stdout
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(channel) = cli.channel {
        config.channel_id = channel;
    }
    info!("Using channel {} with {} peers", config.channel_id, config.peers.len());

    let (output, success) = match ledger_cli::run(cli.command, &config).await {
        Ok(result) => result,
        Err(e) => {
            error!("Command failed: {:#}", e);
            return Err(e);
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    if !success {
        std::process::exit(1);
    }
    Ok(())
}
