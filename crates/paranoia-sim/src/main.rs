//! Simulation driver for the Paranoia sanity engine.
//!
//! Wires the sanity core to a scripted wanderer: loads configuration,
//! builds the lookup tables and demo effects, and runs a day/night cycle
//! with weather, sleep, death, and a mid-run save and reload.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `paranoia.yaml` (or the path given as the
//!    first argument)
//! 2. Initialize structured logging (tracing)
//! 3. Run the simulation
//! 4. Log the result

mod driver;
mod effects;
mod error;
mod world;

use std::path::{Path, PathBuf};

use paranoia_core::ParanoiaConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::SimError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "paranoia.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or the simulation
/// fails.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let path = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let (config, loaded) = load_config(&path)?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("paranoia-sim starting");
    if loaded {
        info!(path = %path.display(), "Configuration loaded");
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
    }
    info!(
        ticks = config.simulation.ticks,
        day_length_ticks = config.simulation.day_length_ticks,
        seed = config.simulation.seed,
        floor = config.bounds.floor,
        ceiling = config.bounds.ceiling,
        "Simulation configured"
    );

    // 3. Run the simulation.
    let summary = driver::run(&config)?;

    // 4. Log results.
    info!(
        ticks = summary.ticks,
        final_sanity = summary.final_sanity,
        final_temp_ceiling = summary.final_temp_ceiling,
        storms = summary.storms,
        deaths = summary.deaths,
        attacks = summary.attacks,
        reloads = summary.reloads,
        replayed = summary.replayed,
        "paranoia-sim shutdown complete"
    );

    Ok(())
}

/// Load configuration from `path`, falling back to defaults when the file
/// does not exist. Returns whether the file was read.
fn load_config(path: &Path) -> Result<(ParanoiaConfig, bool), SimError> {
    if path.exists() {
        Ok((ParanoiaConfig::from_file(path)?, true))
    } else {
        Ok((ParanoiaConfig::default(), false))
    }
}
