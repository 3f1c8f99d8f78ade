//! Per-tick context and pluggable tick behaviors.
//!
//! Hosts describe each tick with a [`TickContext`]. Two kinds of hooks can be
//! registered on a tracker:
//!
//! - [`TickHook`]s run unconditionally every tick while registered (for
//!   example a "sleeping" effect added on bed entry and removed on wake).
//! - [`MultiplierHook`]s scale the tick thresholds read from the lookup
//!   tables. Their factors multiply together.

use crate::target::Target;

/// Environmental signals for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    /// Light level at the entity's position (0-15).
    pub light_level: u8,
    /// Whether a thunderstorm is in progress.
    pub thundering: bool,
    /// Entity health in half-heart points.
    pub health: f32,
    /// Whether this tick runs on the authoritative side.
    pub authoritative: bool,
}

impl TickContext {
    /// An authoritative, clear-weather context.
    pub const fn new(light_level: u8, health: f32) -> Self {
        Self {
            light_level,
            thundering: false,
            health,
            authoritative: true,
        }
    }

    /// Same context with the thunderstorm flag set.
    #[must_use]
    pub const fn with_thunder(mut self, thundering: bool) -> Self {
        self.thundering = thundering;
        self
    }

    /// Same context marked as a remote (non-authoritative) replica.
    #[must_use]
    pub const fn remote(mut self) -> Self {
        self.authoritative = false;
        self
    }

    /// Hearts bucket for the level-change table: health rounded up to whole
    /// hearts.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn hearts(&self) -> usize {
        if !self.health.is_finite() || self.health <= 0.0 {
            return 0;
        }
        (self.health / 2.0).ceil() as usize
    }
}

/// Behavior run every tick while registered.
pub trait TickHook {
    /// Run one tick of the hook's side effects.
    fn tick(&mut self, context: &TickContext, target: &mut dyn Target);
}

impl<F> TickHook for F
where
    F: FnMut(&TickContext, &mut dyn Target),
{
    fn tick(&mut self, context: &TickContext, target: &mut dyn Target) {
        self(context, target);
    }
}

/// Factor applied to tick thresholds.
pub trait MultiplierHook {
    /// Factor for rising thresholds and recovery.
    fn multiplier(&self, context: &TickContext) -> f64;

    /// Factor for falling thresholds. Defaults to the forward factor.
    fn reverse_multiplier(&self, context: &TickContext) -> f64 {
        self.multiplier(context)
    }
}

/// A multiplier that ignores the context.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantMultiplier {
    /// Factor for rising thresholds and recovery.
    pub forward: f64,
    /// Factor for falling thresholds.
    pub reverse: f64,
}

impl MultiplierHook for ConstantMultiplier {
    fn multiplier(&self, _context: &TickContext) -> f64 {
        self.forward
    }

    fn reverse_multiplier(&self, _context: &TickContext) -> f64 {
        self.reverse
    }
}
