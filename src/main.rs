//! # Live Transcriber - Main Application Entry Point
//!
//! Captures live microphone audio, streams it to a remote speech-recognition
//! backend over a bidirectional WebSocket, and renders interim and final
//! transcription results incrementally on the terminal.
//!
//! ## Application Architecture:
//! - **config**: Application configuration (TOML file + environment variables)
//! - **error**: Pipeline error taxonomy
//! - **audio**: Microphone capture and frame batching
//! - **transcription**: Wire protocol and the bidirectional streaming session
//! - **render**: Incremental result rendering, keyword termination, CSV log
//! - **controller**: Wires the pipeline and owns the session lifecycle
//!
//! ## Exit Behavior:
//! Clean termination (keyword match, backend close, Ctrl-C) exits zero after
//! an "Exiting.." notice; device and stream failures print a diagnostic to
//! stderr and exit non-zero.

mod audio;         // Microphone capture and batching (audio/ directory)
mod config;        // Configuration management (config.rs)
mod controller;    // Session lifecycle (controller.rs)
mod error;         // Error taxonomy (error.rs)
mod render;        // Result rendering (render/ directory)
mod transcription; // Backend streaming (transcription/ directory)

use anyhow::Result;
use crate::config::AppConfig;
use crate::controller::SessionController;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    init_tracing()?;

    let config = AppConfig::load()?;
    config.validate()?;

    info!("Starting live-transcriber v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Backend {} ({}), {} Hz capture, interim results {}",
        config.backend.url,
        config.backend.language_code,
        config.audio.sample_rate,
        if config.backend.interim_results { "on" } else { "off" }
    );

    let controller = SessionController::new(config);
    controller.run().await?;

    info!("Session ended cleanly");
    Ok(())
}

/// Initialize the tracing (logging) system.
///
/// ## Environment Variables:
/// - `RUST_LOG`: Controls what gets logged; defaults to
///   `live_transcriber=debug` so pipeline internals are visible during
///   development without drowning in dependency noise.
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "live_transcriber=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}
