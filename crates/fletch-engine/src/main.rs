//! # Fletch
//!
//! Runs a scripted archer against a practice range and logs what happens.
//!
//! Usage: `fletch [config.toml]`. Without an argument `fletch.toml` in the
//! working directory is used, and defaults if that file does not exist.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fletch_engine::config::CONFIG_FILE;
use fletch_engine::{EngineConfig, RangeSession};

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("fletch=info".parse()?))
        .init();

    info!("Fletch starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let path = std::env::args().nth(1).unwrap_or_else(|| CONFIG_FILE.to_string());
    let mut config = EngineConfig::load_from(&path);
    config.validate();

    let ticks = config.total_ticks();
    info!(
        ticks,
        tick_rate = config.tick_rate,
        mode = ?config.archery.sensing.mode,
        "Running range session"
    );

    let mut session = RangeSession::new(&config)?;
    let summary = session.run(ticks)?;

    info!("{summary}");
    info!("Fletch shutdown complete");
    Ok(())
}
