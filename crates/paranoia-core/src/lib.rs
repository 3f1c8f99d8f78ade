//! Sanity thresholds, crossing callbacks, and tick scheduling.
//!
//! This crate tracks a bounded sanity value per entity and drives callbacks
//! as the value falls through their start levels and rises back through
//! their stop levels. A tick scheduler decides when the value moves next
//! from light, health, and pluggable multipliers. Everything the engine
//! needs from the host (the entity, callback constructors, threshold
//! tables) is borrowed through traits for the duration of a call.
//!
//! # Modules
//!
//! - [`bounds`] -- The five-integer [`SanityValue`] and its clamping rules.
//! - [`callback`] -- [`SanityCallback`] registrations and the [`Handler`]
//!   trait.
//! - [`config`] -- Configuration loading from `paranoia.yaml` into
//!   strongly-typed structs.
//! - [`deferred`] -- Queued starts replayed once a target is attached.
//! - [`error`] -- Error types ([`SanityError`], [`LookupError`]).
//! - [`hooks`] -- [`TickContext`], [`TickHook`], and [`MultiplierHook`].
//! - [`lookup`] -- The [`LookupProvider`] trait and the per-call [`Session`].
//! - [`reactions`] -- Host event reactions (items, damage, sleep, death).
//! - [`registry`] -- The [`CallbackRegistry`] trait and a constructor table.
//! - [`sanity`] -- The per-entity [`Sanity`] tracker and its tick pipeline.
//! - [`scheduler`] -- The [`TickScheduler`] countdown channels.
//! - [`state`] -- [`SanityState`]: the value, partitions, and crossing sweep.
//! - [`tables`] -- [`SanityTables`], the data-driven lookup provider.
//! - [`target`] -- The [`Target`] capability and [`TargetHandle`].

pub mod bounds;
pub mod callback;
pub mod config;
pub mod deferred;
pub mod error;
pub mod hooks;
pub mod lookup;
pub mod reactions;
pub mod registry;
pub mod sanity;
pub mod scheduler;
pub mod state;
pub mod tables;
pub mod target;

#[cfg(test)]
mod testing;

pub use bounds::SanityValue;
pub use callback::{Handler, Phase, SanityCallback};
pub use config::{ConfigError, ParanoiaConfig};
pub use error::{LookupError, SanityError};
pub use hooks::{MultiplierHook, TickContext, TickHook};
pub use lookup::{LookupProvider, Session};
pub use reactions::Reactions;
pub use registry::{CallbackRegistry, Registry};
pub use sanity::Sanity;
pub use scheduler::{DueChannels, TickScheduler};
pub use state::SanityState;
pub use tables::SanityTables;
pub use target::{Target, TargetHandle};
