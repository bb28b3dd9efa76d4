//! Main Entrypoint for the MindMate Terminal Client
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment and CLI flags.
//! 2. Initializing logging.
//! 3. Spawning the relay transport task and the audio workers.
//! 4. Running the session event loop until the user quits.

mod app;
mod capture;
mod config;
mod playback;

use crate::app::App;
use crate::capture::CpalCapture;
use crate::config::Config;
use crate::playback::Player;
use anyhow::Context;
use clap::Parser;
use mindmate_relay::RelayConfig;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "mindmate", version, about = "Voice/text chat client for the MindMate relay")]
struct Cli {
    /// WebSocket endpoint of the relay, overriding MINDMATE_RELAY_URL.
    #[arg(long)]
    url: Option<String>,

    /// Delay between reconnect attempts in milliseconds, overriding
    /// MINDMATE_RECONNECT_MS.
    #[arg(long)]
    reconnect_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let cli = Cli::parse();
    let mut config = Config::from_env().context("Failed to load configuration")?;
    config.apply_overrides(cli.url, cli.reconnect_ms)?;

    // --- 2. Initialize Logging ---
    // Logs go to stderr; stdout belongs to the transcript.
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();
    info!(url = %config.relay_url, "configuration loaded, starting session");

    // --- 3. Spawn the Transport and Audio Workers ---
    let (relay_commands, relay_events, relay_task) = mindmate_relay::spawn(RelayConfig {
        url: config.relay_url.clone(),
    });
    let capture = Box::new(CpalCapture::new(config.input_device.clone()));
    let player = Player::spawn();

    // --- 4. Run the Session ---
    let app = App::new(
        config.reconnect_delay,
        capture,
        player,
        relay_commands,
        relay_events,
    );
    app.run().await?;

    relay_task.await.ok();
    info!("session ended");
    Ok(())
}
