//! The live entity a sanity tracker acts upon.
//!
//! The engine never constructs targets. The host hands one in for the
//! duration of a call, or hands in [`TargetHandle::Uninitialized`] while the
//! entity's data is loaded but the entity itself is not yet attached (for
//! example between a restore and the owning player logging in).

/// Host capability for the tracked entity.
pub trait Target {
    /// Whether the entity is alive.
    fn is_alive(&self) -> bool;

    /// Whether the entity is in a mode that suspends sanity (for example a
    /// spectator or creative game mode).
    fn is_restricted(&self) -> bool {
        false
    }

    /// Whether sanity may change without an explicit override.
    fn is_eligible(&self) -> bool {
        self.is_alive() && !self.is_restricted()
    }

    /// Apply the damage side effect of a sanity attack.
    fn sanity_attack(&mut self, level: i32);
}

/// Either a live target or the explicit absence of one.
pub enum TargetHandle<'a> {
    /// No live target is attached yet.
    Uninitialized,
    /// A live, attached target.
    Live(&'a mut dyn Target),
}

impl<'a> TargetHandle<'a> {
    /// Wrap a live target.
    pub fn live(target: &'a mut dyn Target) -> Self {
        Self::Live(target)
    }

    /// Borrow the live target, if attached.
    pub fn get(&mut self) -> Option<&mut (dyn Target + 'a)> {
        match self {
            Self::Uninitialized => None,
            Self::Live(target) => Some(&mut **target),
        }
    }

    /// Whether a target is attached.
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }

    /// Whether a target is attached and eligible for sanity changes.
    pub fn is_eligible(&self) -> bool {
        match self {
            Self::Uninitialized => false,
            Self::Live(target) => target.is_eligible(),
        }
    }
}

impl core::fmt::Debug for TargetHandle<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Uninitialized => f.write_str("Uninitialized"),
            Self::Live(_) => f.write_str("Live"),
        }
    }
}
