//! The per-entity sanity tracker.
//!
//! [`Sanity`] composes the bounded [`SanityState`] with its
//! [`TickScheduler`]. Value operations go through here so the attack
//! channel is recomputed after every change, and the per-tick pipeline
//! lives here because it drives both halves.
//!
//! # Tick pipeline
//!
//! 1. Skip unless the context is authoritative and the target is live and
//!    eligible.
//! 2. Resolve the effective light level and the combined multipliers.
//! 3. Merge the recovery candidate while the temporary ceiling is below the
//!    immutable ceiling.
//! 4. Merge the level-change candidate for the light level and hearts.
//! 5. Run temporary hooks.
//! 6. Advance the counters.
//! 7. Fire due channels in order: recovery, level change, attack.

use std::collections::BTreeMap;

use paranoia_types::{Identifier, SanityRecord, Threshold};
use tracing::{debug, trace};

use crate::bounds::SanityValue;
use crate::error::SanityError;
use crate::hooks::{MultiplierHook, TickContext, TickHook};
use crate::lookup::Session;
use crate::registry::CallbackRegistry;
use crate::scheduler::{DueChannels, TickScheduler};
use crate::state::SanityState;
use crate::target::Target;

/// Sanity value, callback partitions, and tick channels for one entity.
#[derive(Debug, Default)]
pub struct Sanity {
    state: SanityState,
    scheduler: TickScheduler,
}

impl Sanity {
    /// Create a tracker around `value` with a default scheduler.
    pub fn new(value: SanityValue) -> Self {
        Self::with_scheduler(value, TickScheduler::default())
    }

    /// Create a tracker around `value` with a configured scheduler.
    pub fn with_scheduler(value: SanityValue, scheduler: TickScheduler) -> Self {
        Self {
            state: SanityState::new(value),
            scheduler,
        }
    }

    /// The value and partitions.
    pub const fn state(&self) -> &SanityState {
        &self.state
    }

    /// The tick channels.
    pub const fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    /// Current sanity.
    pub const fn current(&self) -> i32 {
        self.state.current()
    }

    /// The bounded value.
    pub const fn value(&self) -> &SanityValue {
        self.state.value()
    }

    // -----------------------------------------------------------------------
    // Value operations
    // -----------------------------------------------------------------------

    /// Set sanity. See [`SanityState::set_value`].
    pub fn set_value(&mut self, value: i32, allow_override: bool, session: &mut Session<'_>) -> bool {
        let changed = self.state.set_value(value, allow_override, session);
        self.after_change(changed, session)
    }

    /// Shift sanity by `delta`.
    pub fn change_value(&mut self, delta: i32, allow_override: bool, session: &mut Session<'_>) -> bool {
        let changed = self.state.change_value(delta, allow_override, session);
        self.after_change(changed, session)
    }

    /// Move the temporary ceiling.
    pub fn set_ceiling_bound(&mut self, ceiling: i32, allow_override: bool, session: &mut Session<'_>) -> bool {
        let changed = self.state.set_ceiling_bound(ceiling, allow_override, session);
        self.after_change(changed, session)
    }

    /// Shift the temporary ceiling by `delta`.
    pub fn change_ceiling_bound(&mut self, delta: i32, allow_override: bool, session: &mut Session<'_>) -> bool {
        let changed = self.state.change_ceiling_bound(delta, allow_override, session);
        self.after_change(changed, session)
    }

    /// Move the temporary floor.
    pub fn set_floor_bound(&mut self, floor: i32, allow_override: bool, session: &mut Session<'_>) -> bool {
        let changed = self.state.set_floor_bound(floor, allow_override, session);
        self.after_change(changed, session)
    }

    /// Shift the temporary floor by `delta`.
    pub fn change_floor_bound(&mut self, delta: i32, allow_override: bool, session: &mut Session<'_>) -> bool {
        let changed = self.state.change_floor_bound(delta, allow_override, session);
        self.after_change(changed, session)
    }

    fn after_change(&mut self, changed: bool, session: &Session<'_>) -> bool {
        if changed {
            self.scheduler.recompute_attack(self.state.current(), session.lookup);
        }
        changed
    }

    /// Replay deferred starts against a now-live target.
    pub fn execute_login_callbacks(&mut self, target: &mut dyn Target) -> usize {
        self.state.execute_login_callbacks(target)
    }

    // -----------------------------------------------------------------------
    // Hooks
    // -----------------------------------------------------------------------

    /// Register a temporary tick hook.
    pub fn add_temporary_tickable(&mut self, id: Identifier, hook: Box<dyn TickHook>) {
        self.scheduler.add_temporary_tickable(id, hook);
    }

    /// Remove a temporary tick hook.
    ///
    /// # Errors
    ///
    /// Returns [`SanityError::HookNotFound`] if nothing was registered under
    /// `id`.
    pub fn remove_temporary_tickable(&mut self, id: &Identifier) -> Result<(), SanityError> {
        self.scheduler.remove_temporary_tickable(id)
    }

    /// Register a threshold multiplier.
    pub fn add_modifier(&mut self, id: Identifier, hook: Box<dyn MultiplierHook>) {
        self.scheduler.add_modifier(id, hook);
    }

    /// Remove a threshold multiplier.
    pub fn remove_modifier(&mut self, id: &Identifier) -> bool {
        self.scheduler.remove_modifier(id)
    }

    // -----------------------------------------------------------------------
    // Tick
    // -----------------------------------------------------------------------

    /// Run one tick. Returns the channels that fired.
    pub fn tick(&mut self, context: &TickContext, session: &mut Session<'_>) -> DueChannels {
        if !context.authoritative {
            return DueChannels::default();
        }
        if !session.target.is_eligible() {
            trace!(attached = session.target.is_live(), "Skipping sanity tick for ineligible target");
            return DueChannels::default();
        }

        let light = self.scheduler.effective_light(context);
        let multipliers = self.scheduler.multipliers(context);

        if self.state.value().has_ceiling_gap() {
            let candidate = session.lookup.recovery_time_for(light);
            self.scheduler.offer_recovery(candidate, multipliers.0);
        }
        self.scheduler
            .offer_level_change(light, context, session.lookup, multipliers);

        if let Some(target) = session.target.get() {
            self.scheduler.run_hooks(context, target);
        }

        self.scheduler.advance(self.state.value().has_ceiling_gap());
        let due = self.scheduler.take_due();

        if due.recovery {
            self.change_ceiling_bound(1, false, session);
        }
        if let Some(direction) = due.change {
            self.change_value(direction.step(), false, session);
        }
        if due.attack {
            let level = self.state.current();
            if let Some(target) = session.target.get() {
                target.sanity_attack(level);
            }
            debug!(level, "Sanity attack");
            self.scheduler.recompute_attack(level, session.lookup);
        }
        due
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    /// Snapshot everything that persists.
    ///
    /// Temporary hooks and modifiers are runtime registrations and are not
    /// included.
    pub fn serialize(&self) -> SanityRecord {
        let scheduler = &self.scheduler;
        let mut record = SanityRecord {
            floor: 0,
            ceiling: 0,
            current: 0,
            previous: 0,
            temp_floor: 0,
            temp_ceiling: 0,
            first_interaction: false,
            elapsed: scheduler.elapsed(),
            recovery_elapsed: scheduler.recovery_elapsed(),
            attack_elapsed: scheduler.attack_elapsed(),
            change_threshold: scheduler.change_threshold(),
            recovery_threshold: scheduler.recovery_threshold(),
            attack_threshold: scheduler.attack_threshold(),
            dormant: BTreeMap::new(),
            active: BTreeMap::new(),
        };
        self.state.write_record(&mut record);
        record
    }

    /// Snapshot as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SanityError::Decode`] if a handler produced data that cannot
    /// be represented as JSON.
    pub fn to_json(&self) -> Result<serde_json::Value, SanityError> {
        Ok(serde_json::to_value(self.serialize())?)
    }

    /// Replace the persisted parts of this tracker with `record`,
    /// reconciling callbacks against `registry`.
    ///
    /// Runtime hooks and modifiers are kept.
    ///
    /// # Errors
    ///
    /// Returns [`SanityError::Decode`] if the record's bounds are out of
    /// order or a handler rejects its private data. Nothing is applied in
    /// that case.
    pub fn deserialize(
        &mut self,
        record: &SanityRecord,
        registry: &dyn CallbackRegistry,
    ) -> Result<(), SanityError> {
        let state = SanityState::restore(record, registry)?;
        let recovery_threshold = match record.recovery_threshold {
            Some(0) => None,
            other => other,
        };
        let attack_threshold = match record.attack_threshold {
            Some(0) => None,
            other => other,
        };
        let change_threshold = match record.change_threshold {
            Threshold::Rising(0) | Threshold::Falling(0) => Threshold::Inactive,
            other => other,
        };
        self.state = state;
        self.scheduler.restore_counters(
            record.elapsed,
            record.recovery_elapsed,
            record.attack_elapsed,
            change_threshold,
            recovery_threshold,
            attack_threshold,
        );
        debug!(
            current = self.state.current(),
            deferred = self.state.deferred().len(),
            "Sanity restored"
        );
        Ok(())
    }

    /// Restore from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SanityError::Decode`] if `value` does not have the record
    /// shape, or for any reason [`deserialize`](Self::deserialize) fails.
    pub fn from_json(
        &mut self,
        value: serde_json::Value,
        registry: &dyn CallbackRegistry,
    ) -> Result<(), SanityError> {
        let record: SanityRecord = serde_json::from_value(value)?;
        self.deserialize(&record, registry)
    }
}
