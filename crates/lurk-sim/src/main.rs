//! # Lurk Sim
//!
//! Headless driver for the Lurk monster AI. Loads a scenario, runs the
//! monsters against a simulated world and a scripted player, then prints a
//! summary.
//!
//! Usage: `lurk-sim [scenario.toml]` (defaults to `lurk.toml`, falling back
//! to the built-in manor scenario).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod app;
mod config;
mod player;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{ScenarioConfig, SCENARIO_FILE};

/// Main entry point.
fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("lurk=info".parse()?))
        .init();

    info!("Lurk sim starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| SCENARIO_FILE.to_string());
    let config = ScenarioConfig::load_or_default(&path)?;
    let summary = app::run(&config)?;
    println!("{summary}");

    info!("Lurk sim finished");
    Ok(())
}
