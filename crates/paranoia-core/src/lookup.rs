//! Threshold lookups and the per-call session snapshot.

use paranoia_types::{Identifier, Threshold};

use crate::error::LookupError;
use crate::registry::CallbackRegistry;
use crate::target::TargetHandle;

/// Data-driven source of tick thresholds and sanity amounts.
///
/// Misses resolve to defaults: `None` for thresholds, `0` for amounts.
pub trait LookupProvider {
    /// Ticks until the next attack at `level`.
    fn attack_time_for(&self, level: i32) -> Option<u32>;

    /// Ticks per point of ceiling recovery at `light_level`.
    fn recovery_time_for(&self, light_level: u8) -> Option<u32>;

    /// Number of hearts buckets configured for `light_level`.
    fn hearts_buckets(&self, light_level: u8) -> usize;

    /// Signed level-change threshold for `light_level` and `hearts`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::OutOfRange`] if `hearts` is not below
    /// [`hearts_buckets`](LookupProvider::hearts_buckets).
    fn level_change_time_for(&self, light_level: u8, hearts: usize)
    -> Result<Threshold, LookupError>;

    /// Sanity change when damaged by an entity of `kind`.
    fn loss_for_entity_kind(&self, kind: &Identifier) -> i32;

    /// Sanity change when finishing use of `item`.
    fn gain_for_item(&self, item: &Identifier) -> i32;
}

/// Everything one sanity operation borrows from the host.
///
/// The registry and tables are read-only for the lifetime of the session,
/// so a hot reload between ticks never lands mid-sweep.
pub struct Session<'a> {
    /// Callback registrations.
    pub registry: &'a dyn CallbackRegistry,
    /// Threshold tables.
    pub lookup: &'a dyn LookupProvider,
    /// The live entity, if attached.
    pub target: TargetHandle<'a>,
}

impl<'a> Session<'a> {
    /// A session against a live target.
    pub fn live(
        registry: &'a dyn CallbackRegistry,
        lookup: &'a dyn LookupProvider,
        target: &'a mut dyn crate::target::Target,
    ) -> Self {
        Self {
            registry,
            lookup,
            target: TargetHandle::live(target),
        }
    }

    /// A session with no target attached.
    pub const fn detached(
        registry: &'a dyn CallbackRegistry,
        lookup: &'a dyn LookupProvider,
    ) -> Self {
        Self {
            registry,
            lookup,
            target: TargetHandle::Uninitialized,
        }
    }
}

impl core::fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
