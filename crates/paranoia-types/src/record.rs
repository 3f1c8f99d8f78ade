//! Persisted sanity record.
//!
//! [`SanityRecord`] is the storage shape written on save and read on load.
//! It carries the five bounds, the crossing bookkeeping for both callback
//! partitions, and the scheduler's counters. Handler-private data rides
//! along inside active entries as opaque JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::Identifier;
use crate::threshold::Threshold;

/// One active callback in a persisted record.
///
/// Callbacks without private data are stored as a bare identifier string;
/// callbacks with data are stored as `{ "id": ..., "data": ... }`. Any
/// other shape fails to deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActiveEntry {
    /// A callback with no private data.
    Bare(Identifier),
    /// A callback together with its handler's private data.
    WithData {
        /// The callback identifier.
        id: Identifier,
        /// Handler-owned data blob.
        data: serde_json::Value,
    },
}

impl ActiveEntry {
    /// The callback identifier.
    pub const fn id(&self) -> &Identifier {
        match self {
            Self::Bare(id) | Self::WithData { id, .. } => id,
        }
    }

    /// The handler's private data, if any.
    pub const fn data(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Bare(_) => None,
            Self::WithData { data, .. } => Some(data),
        }
    }
}

/// The full persisted state of one tracked entity's sanity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SanityRecord {
    /// Immutable lower bound.
    pub floor: i32,
    /// Immutable upper bound.
    pub ceiling: i32,
    /// Current value.
    pub current: i32,
    /// Value before the most recent change.
    pub previous: i32,
    /// Adjustable lower bound.
    pub temp_floor: i32,
    /// Adjustable upper bound.
    pub temp_ceiling: i32,
    /// Whether the callback partitions have been built.
    pub first_interaction: bool,
    /// Ticks accumulated on the level-change channel.
    pub elapsed: u32,
    /// Ticks accumulated on the recovery channel.
    pub recovery_elapsed: u32,
    /// Ticks accumulated on the attack channel.
    pub attack_elapsed: u32,
    /// Pending level-change threshold.
    pub change_threshold: Threshold,
    /// Pending recovery threshold in ticks.
    pub recovery_threshold: Option<u32>,
    /// Pending attack threshold in ticks.
    pub attack_threshold: Option<u32>,
    /// Dormant callbacks keyed by start level.
    pub dormant: BTreeMap<i32, Vec<Identifier>>,
    /// Active callbacks keyed by stop level.
    pub active: BTreeMap<i32, Vec<ActiveEntry>>,
}
