//! The bounded sanity value.
//!
//! [`SanityValue`] holds the five integers that describe an entity's sanity
//! and enforces `floor <= temp_floor <= current <= temp_ceiling <= ceiling`
//! on every mutation by clamping. The immutable pair is fixed at
//! construction; the temporary pair moves inside it and the current value
//! moves inside the temporary pair.

use crate::error::SanityError;

/// Default immutable floor.
pub const DEFAULT_FLOOR: i32 = 0;

/// Default immutable ceiling.
pub const DEFAULT_CEILING: i32 = 100;

/// Distance between the immutable floor and the default temporary floor.
pub const DEFAULT_TEMP_FLOOR_OFFSET: i32 = 10;

/// Bounded sanity value with adjustable inner bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanityValue {
    floor: i32,
    ceiling: i32,
    current: i32,
    temp_floor: i32,
    temp_ceiling: i32,
}

impl SanityValue {
    /// Create a value with explicit bounds. Every field except the
    /// immutable pair is clamped into order.
    ///
    /// # Errors
    ///
    /// Returns [`SanityError::InvalidBounds`] if `floor > ceiling`.
    pub fn new(
        floor: i32,
        ceiling: i32,
        current: i32,
        temp_floor: i32,
        temp_ceiling: i32,
    ) -> Result<Self, SanityError> {
        if floor > ceiling {
            return Err(SanityError::InvalidBounds { floor, ceiling });
        }
        let temp_ceiling = temp_ceiling.clamp(floor, ceiling);
        let temp_floor = temp_floor.clamp(floor, temp_ceiling);
        let current = current.clamp(temp_floor, temp_ceiling);
        Ok(Self {
            floor,
            ceiling,
            current,
            temp_floor,
            temp_ceiling,
        })
    }

    /// Create a value at full sanity with the default temporary floor.
    ///
    /// # Errors
    ///
    /// Returns [`SanityError::InvalidBounds`] if `floor > ceiling`.
    pub fn with_bounds(floor: i32, ceiling: i32) -> Result<Self, SanityError> {
        Self::new(
            floor,
            ceiling,
            ceiling,
            floor.saturating_add(DEFAULT_TEMP_FLOOR_OFFSET),
            ceiling,
        )
    }

    /// Immutable lower bound.
    pub const fn floor(&self) -> i32 {
        self.floor
    }

    /// Immutable upper bound.
    pub const fn ceiling(&self) -> i32 {
        self.ceiling
    }

    /// Current value.
    pub const fn current(&self) -> i32 {
        self.current
    }

    /// Adjustable lower bound.
    pub const fn temp_floor(&self) -> i32 {
        self.temp_floor
    }

    /// Adjustable upper bound.
    pub const fn temp_ceiling(&self) -> i32 {
        self.temp_ceiling
    }

    /// Whether the adjustable ceiling has room to recover.
    pub const fn has_ceiling_gap(&self) -> bool {
        self.temp_ceiling != self.ceiling
    }

    /// Clamp a candidate into the current adjustable bounds.
    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.temp_floor, self.temp_ceiling)
    }

    /// Store a value, clamped. Returns the previous value.
    pub fn set_current(&mut self, value: i32) -> i32 {
        let previous = self.current;
        self.current = self.clamp(value);
        previous
    }

    /// Move the adjustable ceiling, clamped into `[temp_floor, ceiling]`.
    /// The current value is not re-clamped here.
    pub fn set_temp_ceiling(&mut self, value: i32) {
        self.temp_ceiling = value.clamp(self.temp_floor, self.ceiling);
    }

    /// Move the adjustable floor, clamped into `[floor, temp_ceiling]`.
    /// The current value is not re-clamped here.
    pub fn set_temp_floor(&mut self, value: i32) {
        self.temp_floor = value.clamp(self.floor, self.temp_ceiling);
    }

    /// Whether the ordering invariant holds.
    pub const fn is_ordered(&self) -> bool {
        self.floor <= self.temp_floor
            && self.temp_floor <= self.current
            && self.current <= self.temp_ceiling
            && self.temp_ceiling <= self.ceiling
    }
}

impl Default for SanityValue {
    fn default() -> Self {
        Self {
            floor: DEFAULT_FLOOR,
            ceiling: DEFAULT_CEILING,
            current: DEFAULT_CEILING,
            temp_floor: DEFAULT_FLOOR + DEFAULT_TEMP_FLOOR_OFFSET,
            temp_ceiling: DEFAULT_CEILING,
        }
    }
}
