//! Configuration loading and typed config structures for the sanity engine.
//!
//! The canonical configuration lives in `paranoia.yaml` at the project root.
//! This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file.
//! Every section is optional; missing fields fall back to the defaults
//! documented on each field.

use std::collections::BTreeMap;
use std::path::Path;

use paranoia_types::Identifier;
use serde::Deserialize;

use crate::bounds::{DEFAULT_CEILING, DEFAULT_FLOOR, DEFAULT_TEMP_FLOOR_OFFSET, SanityValue};
use crate::error::SanityError;
use crate::scheduler::{DEFAULT_STORM_LIGHT_REDUCTION, TickScheduler};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level engine configuration.
///
/// Mirrors the structure of `paranoia.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ParanoiaConfig {
    /// Sanity bounds for newly tracked entities.
    #[serde(default)]
    pub bounds: BoundsConfig,

    /// Amounts applied by host reactions.
    #[serde(default)]
    pub rules: RulesConfig,

    /// Threshold and amount tables.
    #[serde(default)]
    pub tables: TablesConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Settings for the bundled simulation driver.
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl ParanoiaConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// A scheduler configured with these rules.
    pub fn scheduler(&self) -> TickScheduler {
        TickScheduler::new(self.rules.storm_light_reduction)
    }
}

/// Sanity bounds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BoundsConfig {
    /// Immutable lower bound.
    #[serde(default = "default_floor")]
    pub floor: i32,

    /// Immutable upper bound.
    #[serde(default = "default_ceiling")]
    pub ceiling: i32,

    /// Starting value. Defaults to the ceiling.
    #[serde(default)]
    pub initial: Option<i32>,

    /// Distance from the floor to the starting temporary floor.
    #[serde(default = "default_temp_floor_offset")]
    pub temp_floor_offset: i32,
}

impl BoundsConfig {
    /// Build the starting value.
    ///
    /// # Errors
    ///
    /// Returns [`SanityError::InvalidBounds`] if `floor > ceiling`.
    pub fn to_value(&self) -> Result<SanityValue, SanityError> {
        SanityValue::new(
            self.floor,
            self.ceiling,
            self.initial.unwrap_or(self.ceiling),
            self.floor.saturating_add(self.temp_floor_offset),
            self.ceiling,
        )
    }
}

impl Default for BoundsConfig {
    fn default() -> Self {
        Self {
            floor: default_floor(),
            ceiling: default_ceiling(),
            initial: None,
            temp_floor_offset: default_temp_floor_offset(),
        }
    }
}

/// Amounts applied by host reactions and weather.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RulesConfig {
    /// Temporary ceiling lost on death.
    #[serde(default = "default_death_ceiling_penalty")]
    pub death_ceiling_penalty: i32,

    /// Temporary ceiling gained after sleeping through the night.
    #[serde(default = "default_sleep_ceiling_bonus")]
    pub sleep_ceiling_bonus: i32,

    /// Sanity gained after sleeping through the night.
    #[serde(default = "default_sleep_sanity_bonus")]
    pub sleep_sanity_bonus: i32,

    /// Light levels subtracted during a thunderstorm.
    #[serde(default = "default_storm_light_reduction")]
    pub storm_light_reduction: u8,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            death_ceiling_penalty: default_death_ceiling_penalty(),
            sleep_ceiling_bonus: default_sleep_ceiling_bonus(),
            sleep_sanity_bonus: default_sleep_sanity_bonus(),
            storm_light_reduction: default_storm_light_reduction(),
        }
    }
}

/// Threshold and amount tables.
///
/// Keys are levels or light levels; values are tick counts unless noted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TablesConfig {
    /// Ticks between attacks, keyed by sanity level.
    #[serde(default)]
    pub attack: BTreeMap<i32, u32>,

    /// Ticks per point of temporary ceiling recovery, keyed by light level.
    /// Signs are ignored.
    #[serde(default)]
    pub recovery: BTreeMap<u8, i64>,

    /// Level-change thresholds keyed by light level.
    #[serde(default)]
    pub levels: BTreeMap<u8, LevelBreakdown>,

    /// Sanity lost when damaged by an entity kind.
    #[serde(default)]
    pub entity_loss: AmountTable,

    /// Sanity gained when finishing use of an item.
    #[serde(default)]
    pub item_gain: AmountTable,
}

/// Level-change thresholds for one light level.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LevelBreakdown {
    /// Signed thresholds indexed by hearts bucket. Positive raises sanity,
    /// negative lowers it, zero disables the channel.
    #[serde(default)]
    pub hearts_breakdown: Vec<i64>,
}

/// Amounts keyed by identifier, with layering control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AmountTable {
    /// Discard entries from earlier layers before applying this one.
    #[serde(default)]
    pub replace: bool,

    /// Amount per identifier.
    #[serde(default)]
    pub entries: BTreeMap<Identifier, i32>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG`
    /// is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Settings for the bundled simulation driver.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Total ticks to run.
    #[serde(default = "default_ticks")]
    pub ticks: u64,

    /// Ticks in one day/night cycle.
    #[serde(default = "default_day_length_ticks")]
    pub day_length_ticks: u64,

    /// Save and restore the tracker at this tick.
    #[serde(default)]
    pub save_at_tick: Option<u64>,

    /// Chance per day that a thunderstorm rolls in.
    #[serde(default = "default_thunder_chance")]
    pub thunder_chance: f64,

    /// Seed for weather rolls.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Entity health in half-heart points.
    #[serde(default = "default_health")]
    pub health: f32,

    /// Emit a progress line every N ticks.
    #[serde(default = "default_report_interval_ticks")]
    pub report_interval_ticks: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks: default_ticks(),
            day_length_ticks: default_day_length_ticks(),
            save_at_tick: None,
            thunder_chance: default_thunder_chance(),
            seed: default_seed(),
            health: default_health(),
            report_interval_ticks: default_report_interval_ticks(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

const fn default_floor() -> i32 {
    DEFAULT_FLOOR
}

const fn default_ceiling() -> i32 {
    DEFAULT_CEILING
}

const fn default_temp_floor_offset() -> i32 {
    DEFAULT_TEMP_FLOOR_OFFSET
}

const fn default_death_ceiling_penalty() -> i32 {
    10
}

const fn default_sleep_ceiling_bonus() -> i32 {
    5
}

const fn default_sleep_sanity_bonus() -> i32 {
    15
}

const fn default_storm_light_reduction() -> u8 {
    DEFAULT_STORM_LIGHT_REDUCTION
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_ticks() -> u64 {
    72_000
}

const fn default_day_length_ticks() -> u64 {
    24_000
}

const fn default_thunder_chance() -> f64 {
    0.2
}

const fn default_seed() -> u64 {
    42
}

const fn default_health() -> f32 {
    20.0
}

const fn default_report_interval_ticks() -> u64 {
    1_000
}
