#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Development transport that drives the room server over stdio.
//!
//! Each stdin line is a JSON object `{"player": <id>, "intent": {...}}` or
//! `{"player": <id>, "disconnect": true}`. Every outbound message is written to
//! stdout as one `{"to": ..., "message": ...}` line. Logs go to stderr.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use rampart_core::{IntentFault, PlayerId, RoomError};
use rampart_server::{ChannelBroadcaster, ClientIntent, Outbound, RoomRegistry, ServerConfig};
use serde::Deserialize;
use serde_json::Value;
use tokio::{
    io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader},
    sync::mpsc,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the room server.
#[derive(Debug, Parser)]
#[command(name = "rampart-server", about = "Co-op wave defense room server")]
struct Args {
    /// Path to a TOML configuration file; defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    log: String,
}

#[derive(Debug, Deserialize)]
struct InboundLine {
    player: PlayerId,
    #[serde(default)]
    intent: Option<Value>,
    #[serde(default)]
    disconnect: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log);

    let config = match &args.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    config.validate()?;

    let (broadcaster, outbound) = ChannelBroadcaster::new();
    let writer = tokio::spawn(write_outbound(outbound));
    let registry = RoomRegistry::new(&config, Arc::new(broadcaster));
    info!(
        tick_ms = config.timing.tick_interval_ms,
        "room server listening on stdin"
    );

    let mut lines = BufReader::new(io::stdin()).lines();
    while let Some(line) = lines
        .next_line()
        .await
        .context("failed to read from stdin")?
    {
        if line.trim().is_empty() {
            continue;
        }
        let inbound: InboundLine = match serde_json::from_str(&line) {
            Ok(inbound) => inbound,
            Err(error) => {
                warn!(%error, "ignoring malformed transport line");
                continue;
            }
        };
        if inbound.disconnect {
            registry.leave(inbound.player).await;
            continue;
        }
        match inbound.intent.map(ClientIntent::from_value) {
            Some(Ok(intent)) => registry.dispatch(inbound.player, intent).await,
            Some(Err(error)) => registry.reject(inbound.player, error),
            None => registry.reject(
                inbound.player,
                RoomError::InvalidIntent(IntentFault::Malformed),
            ),
        }
    }

    info!("stdin closed, shutting down");
    registry.shutdown().await;
    drop(registry);
    writer.await.context("outbound writer task panicked")??;
    Ok(())
}

fn init_tracing(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn write_outbound(mut outbound: mpsc::UnboundedReceiver<Outbound>) -> Result<()> {
    let mut stdout = io::stdout();
    while let Some(message) = outbound.recv().await {
        let mut line =
            serde_json::to_vec(&message).context("failed to encode outbound message")?;
        line.push(b'\n');
        stdout
            .write_all(&line)
            .await
            .context("failed to write to stdout")?;
        stdout.flush().await.context("failed to flush stdout")?;
    }
    Ok(())
}
