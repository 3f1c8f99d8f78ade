//! Shared type definitions for the Paranoia sanity engine.
//!
//! This crate holds the plain data types that flow between the sanity core,
//! its lookup tables, and persistent storage. It carries no behavior beyond
//! parsing and small arithmetic helpers.
//!
//! # Modules
//!
//! - [`ids`] -- Namespaced [`Identifier`] keys for callbacks, hooks, entities, and items
//! - [`threshold`] -- Direction-aware tick [`Threshold`] for the level-change channel
//! - [`record`] -- The persisted [`SanityRecord`] shape

pub mod ids;
pub mod record;
pub mod threshold;

// Re-export all public types at crate root for convenience.
pub use ids::{DEFAULT_NAMESPACE, Identifier, IdentifierError};
pub use record::{ActiveEntry, SanityRecord};
pub use threshold::{Direction, Threshold};
