//! Direction-aware tick thresholds.
//!
//! The level-change channel needs to know both *how many* ticks must pass
//! and *which way* the value moves when they do. Lookup tables encode this
//! as a signed integer (positive raises, negative lowers); inside the engine
//! it is split into an explicit direction and magnitude so that "no
//! threshold" can never be confused with a small negative count.

use serde::{Deserialize, Serialize};

/// Which way a firing threshold moves the sanity value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// The value increases by one when the threshold fires.
    Rising,
    /// The value decreases by one when the threshold fires.
    Falling,
}

impl Direction {
    /// The unit step applied to the value when a threshold in this
    /// direction fires.
    pub const fn step(self) -> i32 {
        match self {
            Self::Rising => 1,
            Self::Falling => -1,
        }
    }
}

/// A countdown in ticks with a direction, or no countdown at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Threshold {
    /// No threshold registered.
    #[default]
    Inactive,
    /// Raise the value after this many ticks.
    Rising(u32),
    /// Lower the value after this many ticks.
    Falling(u32),
}

impl Threshold {
    /// Decode a signed table entry. Zero means no threshold.
    pub const fn from_signed(ticks: i64) -> Self {
        if ticks > 0 {
            Self::Rising(saturate_u32(ticks.unsigned_abs()))
        } else if ticks < 0 {
            Self::Falling(saturate_u32(ticks.unsigned_abs()))
        } else {
            Self::Inactive
        }
    }

    /// Encode back into the signed table form.
    pub fn to_signed(self) -> i64 {
        match self {
            Self::Inactive => 0,
            Self::Rising(ticks) => i64::from(ticks),
            Self::Falling(ticks) => -i64::from(ticks),
        }
    }

    /// Direction, if active.
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::Inactive => None,
            Self::Rising(_) => Some(Direction::Rising),
            Self::Falling(_) => Some(Direction::Falling),
        }
    }

    /// Tick count, if active.
    pub const fn magnitude(self) -> Option<u32> {
        match self {
            Self::Inactive => None,
            Self::Rising(ticks) | Self::Falling(ticks) => Some(ticks),
        }
    }

    /// Whether a threshold is registered.
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Inactive)
    }

    /// Scale the magnitude by a non-negative factor, truncating to whole
    /// ticks. The result is never shorter than one tick.
    #[must_use]
    pub fn scaled(self, multiplier: f64) -> Self {
        match self {
            Self::Inactive => Self::Inactive,
            Self::Rising(ticks) => Self::Rising(scale_ticks(ticks, multiplier)),
            Self::Falling(ticks) => Self::Falling(scale_ticks(ticks, multiplier)),
        }
    }

    /// Merge a freshly computed candidate into the pending threshold.
    ///
    /// - An inactive candidate leaves the pending threshold untouched.
    /// - A rising candidate against a rising threshold keeps the longer wait;
    ///   against anything else it replaces the pending threshold.
    /// - A falling candidate against a falling threshold keeps the shorter
    ///   wait; against anything else (inactive counts as unbounded) it
    ///   replaces the pending threshold.
    #[must_use]
    pub fn merge_change(self, candidate: Self) -> Self {
        match (self, candidate) {
            (current, Self::Inactive) => current,
            (Self::Rising(current), Self::Rising(next)) => Self::Rising(current.max(next)),
            (Self::Falling(current), Self::Falling(next)) => Self::Falling(current.min(next)),
            (_, next) => next,
        }
    }
}

/// Scale a tick count, truncating, with a floor of one tick.
///
/// Non-finite or negative factors collapse to the one-tick floor.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn scale_ticks(ticks: u32, multiplier: f64) -> u32 {
    let scaled = (f64::from(ticks) * multiplier).trunc();
    if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else if scaled >= 1.0 {
        scaled as u32
    } else {
        1
    }
}

const fn saturate_u32(value: u64) -> u32 {
    if value > u32::MAX as u64 {
        u32::MAX
    } else {
        value as u32
    }
}
