//! Tick accumulation for the sanity channels.
//!
//! The scheduler decides *when* sanity moves. It keeps three independent
//! countdown channels, each with an elapsed counter and a threshold:
//!
//! | Channel      | Threshold              | Merge on new candidate        | Fires                  |
//! |--------------|------------------------|-------------------------------|------------------------|
//! | Level change | [`Threshold`]          | rising: longer wins; falling: shorter wins | value +1 or -1 |
//! | Recovery     | `Option<u32>`          | longer wins                   | temp ceiling +1        |
//! | Attack       | `Option<u32>`          | shorter wins                  | target attack effect   |
//!
//! A firing channel resets its counter and clears its threshold. The
//! scheduler never touches the sanity value itself; [`Sanity`] applies the
//! [`DueChannels`] it reports.
//!
//! [`Sanity`]: crate::sanity::Sanity

use std::collections::BTreeMap;

use paranoia_types::threshold::scale_ticks;
use paranoia_types::{Direction, Identifier, Threshold};
use tracing::{trace, warn};

use crate::error::SanityError;
use crate::hooks::{MultiplierHook, TickContext, TickHook};
use crate::lookup::LookupProvider;
use crate::target::Target;

/// Light levels subtracted while a thunderstorm is in progress.
pub const DEFAULT_STORM_LIGHT_REDUCTION: u8 = 10;

/// Channels that reached their thresholds this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DueChannels {
    /// The recovery channel fired.
    pub recovery: bool,
    /// The level-change channel fired in this direction.
    pub change: Option<Direction>,
    /// The attack channel fired.
    pub attack: bool,
}

/// Counter and threshold state for the tick channels, plus hooks.
pub struct TickScheduler {
    elapsed: u32,
    recovery_elapsed: u32,
    attack_elapsed: u32,
    change_threshold: Threshold,
    recovery_threshold: Option<u32>,
    attack_threshold: Option<u32>,
    storm_light_reduction: u8,
    temporary_hooks: BTreeMap<Identifier, Box<dyn TickHook>>,
    modifiers: BTreeMap<Identifier, Box<dyn MultiplierHook>>,
}

impl Default for TickScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_STORM_LIGHT_REDUCTION)
    }
}

impl TickScheduler {
    /// Create an idle scheduler.
    pub fn new(storm_light_reduction: u8) -> Self {
        Self {
            elapsed: 0,
            recovery_elapsed: 0,
            attack_elapsed: 0,
            change_threshold: Threshold::Inactive,
            recovery_threshold: None,
            attack_threshold: None,
            storm_light_reduction,
            temporary_hooks: BTreeMap::new(),
            modifiers: BTreeMap::new(),
        }
    }

    /// Ticks accumulated on the level-change channel.
    pub const fn elapsed(&self) -> u32 {
        self.elapsed
    }

    /// Ticks accumulated on the recovery channel.
    pub const fn recovery_elapsed(&self) -> u32 {
        self.recovery_elapsed
    }

    /// Ticks accumulated on the attack channel.
    pub const fn attack_elapsed(&self) -> u32 {
        self.attack_elapsed
    }

    /// Pending level-change threshold.
    pub const fn change_threshold(&self) -> Threshold {
        self.change_threshold
    }

    /// Pending recovery threshold.
    pub const fn recovery_threshold(&self) -> Option<u32> {
        self.recovery_threshold
    }

    /// Pending attack threshold.
    pub const fn attack_threshold(&self) -> Option<u32> {
        self.attack_threshold
    }

    /// Overwrite every counter and threshold, as on restore.
    pub(crate) const fn restore_counters(
        &mut self,
        elapsed: u32,
        recovery_elapsed: u32,
        attack_elapsed: u32,
        change_threshold: Threshold,
        recovery_threshold: Option<u32>,
        attack_threshold: Option<u32>,
    ) {
        self.elapsed = elapsed;
        self.recovery_elapsed = recovery_elapsed;
        self.attack_elapsed = attack_elapsed;
        self.change_threshold = change_threshold;
        self.recovery_threshold = recovery_threshold;
        self.attack_threshold = attack_threshold;
    }

    // -----------------------------------------------------------------------
    // Hooks
    // -----------------------------------------------------------------------

    /// Register a temporary tick hook, replacing any hook under the same
    /// identifier.
    pub fn add_temporary_tickable(&mut self, id: Identifier, hook: Box<dyn TickHook>) {
        trace!(hook = %id, "Adding temporary tick hook");
        self.temporary_hooks.insert(id, hook);
    }

    /// Remove a temporary tick hook.
    ///
    /// # Errors
    ///
    /// Returns [`SanityError::HookNotFound`] if nothing was registered under
    /// `id`. The scheduler is unchanged in that case.
    pub fn remove_temporary_tickable(&mut self, id: &Identifier) -> Result<(), SanityError> {
        if self.temporary_hooks.remove(id).is_some() {
            trace!(hook = %id, "Removed temporary tick hook");
            Ok(())
        } else {
            warn!(hook = %id, "Temporary tick hook does not exist");
            Err(SanityError::HookNotFound(id.clone()))
        }
    }

    /// Whether a temporary tick hook is registered under `id`.
    pub fn has_temporary_tickable(&self, id: &Identifier) -> bool {
        self.temporary_hooks.contains_key(id)
    }

    /// Register a threshold multiplier, replacing any under the same
    /// identifier.
    pub fn add_modifier(&mut self, id: Identifier, hook: Box<dyn MultiplierHook>) {
        self.modifiers.insert(id, hook);
    }

    /// Remove a threshold multiplier. Returns whether one was registered.
    pub fn remove_modifier(&mut self, id: &Identifier) -> bool {
        self.modifiers.remove(id).is_some()
    }

    /// Run every temporary hook once.
    pub fn run_hooks(&mut self, context: &TickContext, target: &mut dyn Target) {
        for hook in self.temporary_hooks.values_mut() {
            hook.tick(context, target);
        }
    }

    // -----------------------------------------------------------------------
    // Signals
    // -----------------------------------------------------------------------

    /// Light level used for lookups, darkened during thunderstorms.
    pub const fn effective_light(&self, context: &TickContext) -> u8 {
        if context.thundering {
            context.light_level.saturating_sub(self.storm_light_reduction)
        } else {
            context.light_level
        }
    }

    /// Combined `(forward, reverse)` factors from every modifier.
    ///
    /// Negative or non-finite factors are ignored.
    pub fn multipliers(&self, context: &TickContext) -> (f64, f64) {
        let mut forward = 1.0_f64;
        let mut reverse = 1.0_f64;
        for (id, hook) in &self.modifiers {
            forward *= sanitize(id, hook.multiplier(context));
            reverse *= sanitize(id, hook.reverse_multiplier(context));
        }
        (forward, reverse)
    }

    // -----------------------------------------------------------------------
    // Threshold merging
    // -----------------------------------------------------------------------

    /// Merge a recovery candidate. The longer wait wins.
    pub fn offer_recovery(&mut self, candidate: Option<u32>, multiplier: f64) {
        let Some(ticks) = candidate else {
            return;
        };
        let scaled = scale_ticks(ticks, multiplier);
        self.recovery_threshold = Some(self.recovery_threshold.map_or(scaled, |current| current.max(scaled)));
    }

    /// Merge a level-change candidate, scaled by the reverse factor when it
    /// lowers sanity and the forward factor otherwise. A flip in direction
    /// restarts the channel's counter.
    pub fn offer_change(&mut self, candidate: Threshold, forward: f64, reverse: f64) {
        let scaled = match candidate.direction() {
            None => return,
            Some(Direction::Falling) => candidate.scaled(reverse),
            Some(Direction::Rising) => candidate.scaled(forward),
        };
        let merged = self.change_threshold.merge_change(scaled);
        if self.change_threshold.is_active() && merged.direction() != self.change_threshold.direction() {
            self.elapsed = 0;
        }
        self.change_threshold = merged;
    }

    /// Look up and merge the level-change candidate for this tick.
    ///
    /// The hearts bucket is capped to the configured range; a light level
    /// with no configured buckets offers nothing.
    pub fn offer_level_change(
        &mut self,
        light_level: u8,
        context: &TickContext,
        lookup: &dyn LookupProvider,
        multipliers: (f64, f64),
    ) {
        let buckets = lookup.hearts_buckets(light_level);
        let Some(last) = buckets.checked_sub(1) else {
            return;
        };
        let hearts = context.hearts().min(last);
        match lookup.level_change_time_for(light_level, hearts) {
            Ok(candidate) => self.offer_change(candidate, multipliers.0, multipliers.1),
            Err(error) => warn!(%error, "Level-change lookup failed"),
        }
    }

    /// Recompute the attack channel for `level`.
    ///
    /// With no attack configured at `level` the channel is cleared.
    /// Otherwise the shorter of the pending and new thresholds wins.
    pub fn recompute_attack(&mut self, level: i32, lookup: &dyn LookupProvider) {
        match lookup.attack_time_for(level) {
            None => {
                self.attack_threshold = None;
                self.attack_elapsed = 0;
            }
            Some(ticks) => {
                self.attack_threshold = Some(self.attack_threshold.map_or(ticks, |current| current.min(ticks)));
            }
        }
        trace!(level, attack_threshold = ?self.attack_threshold, "Attack threshold recomputed");
    }

    // -----------------------------------------------------------------------
    // Counters
    // -----------------------------------------------------------------------

    /// Advance the counters by one tick.
    ///
    /// The recovery channel only runs while the temporary ceiling is below
    /// the immutable ceiling; otherwise it is reset.
    pub const fn advance(&mut self, has_ceiling_gap: bool) {
        if self.attack_threshold.is_some() {
            self.attack_elapsed = self.attack_elapsed.saturating_add(1);
        }
        if has_ceiling_gap {
            self.recovery_elapsed = self.recovery_elapsed.saturating_add(1);
        } else {
            self.recovery_elapsed = 0;
            self.recovery_threshold = None;
        }
        self.elapsed = self.elapsed.saturating_add(1);
    }

    /// Collect every channel whose counter reached its threshold, resetting
    /// each one that fired.
    pub const fn take_due(&mut self) -> DueChannels {
        let mut due = DueChannels {
            recovery: false,
            change: None,
            attack: false,
        };
        if let Some(ticks) = self.recovery_threshold
            && self.recovery_elapsed >= ticks
        {
            due.recovery = true;
            self.recovery_elapsed = 0;
            self.recovery_threshold = None;
        }
        if let Some(ticks) = self.change_threshold.magnitude()
            && self.elapsed >= ticks
        {
            due.change = self.change_threshold.direction();
            self.elapsed = 0;
            self.change_threshold = Threshold::Inactive;
        }
        if let Some(ticks) = self.attack_threshold
            && self.attack_elapsed >= ticks
        {
            due.attack = true;
            self.attack_elapsed = 0;
            self.attack_threshold = None;
        }
        due
    }
}

fn sanitize(id: &Identifier, factor: f64) -> f64 {
    if factor.is_finite() && factor >= 0.0 {
        factor
    } else {
        warn!(modifier = %id, factor, "Ignoring invalid threshold multiplier");
        1.0
    }
}

impl core::fmt::Debug for TickScheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TickScheduler")
            .field("elapsed", &self.elapsed)
            .field("recovery_elapsed", &self.recovery_elapsed)
            .field("attack_elapsed", &self.attack_elapsed)
            .field("change_threshold", &self.change_threshold)
            .field("recovery_threshold", &self.recovery_threshold)
            .field("attack_threshold", &self.attack_threshold)
            .field("temporary_hooks", &self.temporary_hooks.keys().collect::<Vec<_>>())
            .field("modifiers", &self.modifiers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
