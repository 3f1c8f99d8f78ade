//! The authoritative sanity value and its callback partitions.
//!
//! [`SanityState`] owns the bounded value, the two callback partitions, and
//! the deferred queue. Every change runs a crossing sweep that fires each
//! start and stop exactly once:
//!
//! - **Falling**: every active callback receives an update, then dormant
//!   callbacks keyed at levels `previous - 1` down to `next` are started in
//!   descending level order and moved to the active partition at their stop
//!   level.
//! - **Rising**: active callbacks keyed at levels `previous + 1` up to
//!   `next` are stopped in ascending level order and moved to the dormant
//!   partition at their start level, then every remaining active callback
//!   receives an update.
//!
//! While no target is attached, starts are queued for replay at login. A
//! callback that was started against a live target and then stops while
//! detached keeps its handler until login delivers the stop; one whose start
//! was itself still queued simply drops that start.
//!
//! The partitions are built lazily from the registry on the first change,
//! classified against the value *before* that change so the change itself
//! still produces its crossings.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use paranoia_types::{ActiveEntry, Identifier, SanityRecord};
use tracing::{debug, trace, warn};

use crate::bounds::SanityValue;
use crate::callback::{Phase, SanityCallback};
use crate::deferred::{DeferredCallback, DeferredQueue};
use crate::error::SanityError;
use crate::lookup::Session;
use crate::registry::CallbackRegistry;
use crate::target::{Target, TargetHandle};

/// Which partition a callback currently sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    /// Waiting to start, keyed by start level.
    Dormant(i32),
    /// Running, keyed by stop level.
    Active(i32),
}

/// Bounded sanity value with crossing bookkeeping.
#[derive(Debug)]
pub struct SanityState {
    value: SanityValue,
    previous: i32,
    initialized: bool,
    dormant: BTreeMap<i32, BTreeSet<Identifier>>,
    active: BTreeMap<i32, Vec<SanityCallback>>,
    deferred: DeferredQueue,
    stopping: Vec<SanityCallback>,
}

impl Default for SanityState {
    fn default() -> Self {
        Self::new(SanityValue::default())
    }
}

impl SanityState {
    /// Create a state around an initial value. Partitions are built on the
    /// first change.
    pub fn new(value: SanityValue) -> Self {
        Self {
            previous: value.current(),
            value,
            initialized: false,
            dormant: BTreeMap::new(),
            active: BTreeMap::new(),
            deferred: DeferredQueue::default(),
            stopping: Vec::new(),
        }
    }

    /// The bounded value.
    pub const fn value(&self) -> &SanityValue {
        &self.value
    }

    /// Current sanity.
    pub const fn current(&self) -> i32 {
        self.value.current()
    }

    /// Sanity before the most recent change.
    pub const fn previous(&self) -> i32 {
        self.previous
    }

    /// Whether the partitions have been built.
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Pending deferred commands.
    pub const fn deferred(&self) -> &DeferredQueue {
        &self.deferred
    }

    /// Locate a callback in the partitions.
    pub fn partition_of(&self, id: &Identifier) -> Option<Partition> {
        if let Some((level, _)) = self.dormant.iter().find(|(_, ids)| ids.contains(id)) {
            return Some(Partition::Dormant(*level));
        }
        self.active
            .iter()
            .find(|(_, callbacks)| callbacks.iter().any(|callback| callback.id() == id))
            .map(|(level, _)| Partition::Active(*level))
    }

    /// Dormant identifiers keyed by start level.
    pub const fn dormant(&self) -> &BTreeMap<i32, BTreeSet<Identifier>> {
        &self.dormant
    }

    /// Active identifiers keyed by stop level.
    pub fn active_ids(&self) -> BTreeMap<i32, Vec<Identifier>> {
        self.active
            .iter()
            .map(|(level, callbacks)| {
                (*level, callbacks.iter().map(|callback| callback.id().clone()).collect())
            })
            .collect()
    }

    /// Set the value.
    ///
    /// Does nothing unless `allow_override` is set or the target is live and
    /// eligible. Returns whether the value changed.
    pub fn set_value(&mut self, value: i32, allow_override: bool, session: &mut Session<'_>) -> bool {
        if !allow_override && !session.target.is_eligible() {
            trace!(requested = value, "Ignoring sanity change for ineligible target");
            return false;
        }
        let clamped = self.value.clamp(value);
        if clamped == self.value.current() {
            return false;
        }
        let previous = self.value.set_current(clamped);
        self.previous = previous;
        debug!(previous, current = clamped, "Sanity changed");
        self.update_crossings(previous, clamped, session.registry, &mut session.target);
        true
    }

    /// Shift the value by `delta`. Returns whether the value changed.
    pub fn change_value(&mut self, delta: i32, allow_override: bool, session: &mut Session<'_>) -> bool {
        let target = self.value.current().saturating_add(delta);
        self.set_value(target, allow_override, session)
    }

    /// Move the adjustable ceiling, then re-clamp the value. Returns whether
    /// the value changed.
    pub fn set_ceiling_bound(
        &mut self,
        ceiling: i32,
        allow_override: bool,
        session: &mut Session<'_>,
    ) -> bool {
        if !allow_override && !session.target.is_eligible() {
            return false;
        }
        self.value.set_temp_ceiling(ceiling);
        self.set_value(self.value.current(), true, session)
    }

    /// Shift the adjustable ceiling by `delta`.
    pub fn change_ceiling_bound(
        &mut self,
        delta: i32,
        allow_override: bool,
        session: &mut Session<'_>,
    ) -> bool {
        let ceiling = self.value.temp_ceiling().saturating_add(delta);
        self.set_ceiling_bound(ceiling, allow_override, session)
    }

    /// Move the adjustable floor, then re-clamp the value. Returns whether
    /// the value changed.
    pub fn set_floor_bound(&mut self, floor: i32, allow_override: bool, session: &mut Session<'_>) -> bool {
        if !allow_override && !session.target.is_eligible() {
            return false;
        }
        self.value.set_temp_floor(floor);
        self.set_value(self.value.current(), true, session)
    }

    /// Shift the adjustable floor by `delta`.
    pub fn change_floor_bound(
        &mut self,
        delta: i32,
        allow_override: bool,
        session: &mut Session<'_>,
    ) -> bool {
        let floor = self.value.temp_floor().saturating_add(delta);
        self.set_floor_bound(floor, allow_override, session)
    }

    /// Build the partitions from the registry, classifying against `level`.
    /// Runs once; later calls do nothing.
    pub fn initialize(&mut self, level: i32, registry: &dyn CallbackRegistry) {
        if self.initialized {
            return;
        }
        self.dormant.clear();
        self.active.clear();
        for id in registry.ids() {
            let Some(callback) = registry.create(&id) else {
                continue;
            };
            self.classify(callback, level);
        }
        self.initialized = true;
        debug!(
            level,
            dormant = self.dormant.values().map(BTreeSet::len).sum::<usize>(),
            active = self.active.values().map(Vec::len).sum::<usize>(),
            "Sanity callback partitions built"
        );
    }

    /// Place a callback into the partition matching `level`. Returns whether
    /// it went into the active partition.
    fn classify(&mut self, callback: SanityCallback, level: i32) -> bool {
        if level <= callback.start_level() {
            self.active.entry(callback.stop_level()).or_default().push(callback);
            true
        } else {
            self.dormant
                .entry(callback.start_level())
                .or_default()
                .insert(callback.id().clone());
            false
        }
    }

    /// Run the crossing sweep for a change from `previous` to `next`.
    pub fn update_crossings(
        &mut self,
        previous: i32,
        next: i32,
        registry: &dyn CallbackRegistry,
        target: &mut TargetHandle<'_>,
    ) {
        self.initialize(previous, registry);
        if previous == next {
            return;
        }
        if next < previous {
            self.fall(previous, next, registry, target);
        } else {
            self.rise(previous, next, target);
        }
    }

    fn fall(
        &mut self,
        previous: i32,
        next: i32,
        registry: &dyn CallbackRegistry,
        target: &mut TargetHandle<'_>,
    ) {
        self.update_active(next, target);
        let levels: Vec<i32> = self.dormant.range(next..previous).rev().map(|(level, _)| *level).collect();
        for level in levels {
            let Some(ids) = self.dormant.remove(&level) else {
                continue;
            };
            for id in ids {
                let Some(mut callback) = registry.create(&id) else {
                    warn!(callback = %id, "Dormant sanity callback is no longer registered");
                    continue;
                };
                match target.get() {
                    Some(live) => callback.dispatch(Phase::Start, live, next),
                    None => self.deferred.push(DeferredCallback::Start(id.clone())),
                }
                self.active.entry(callback.stop_level()).or_default().push(callback);
            }
        }
    }

    fn rise(&mut self, previous: i32, next: i32, target: &mut TargetHandle<'_>) {
        let levels: Vec<i32> = self
            .active
            .range((Bound::Excluded(previous), Bound::Included(next)))
            .map(|(level, _)| *level)
            .collect();
        for level in levels {
            let Some(callbacks) = self.active.remove(&level) else {
                continue;
            };
            for mut callback in callbacks {
                self.dormant
                    .entry(callback.start_level())
                    .or_default()
                    .insert(callback.id().clone());
                match target.get() {
                    Some(live) => callback.dispatch(Phase::Stop, live, next),
                    None => {
                        if !self.deferred.cancel_start(callback.id()) {
                            self.deferred.push(DeferredCallback::Stop(callback.id().clone()));
                            self.stopping.push(callback);
                        }
                    }
                }
            }
        }
        self.update_active(next, target);
    }

    fn update_active(&mut self, level: i32, target: &mut TargetHandle<'_>) {
        let Some(live) = target.get() else {
            return;
        };
        for callback in self.active.values_mut().flatten() {
            callback.dispatch(Phase::Update, live, level);
        }
    }

    /// Replay deferred commands against a live target, then clear the queue.
    /// Returns how many commands ran.
    pub fn execute_login_callbacks(&mut self, target: &mut dyn Target) -> usize {
        let commands = self.deferred.drain();
        let level = self.value.current();
        let mut executed = 0_usize;
        for command in commands {
            let ran = match &command {
                DeferredCallback::Start(id) => {
                    let mut active = self.active.values_mut().flatten();
                    if let Some(callback) = active.find(|callback| callback.id() == id) {
                        callback.dispatch(Phase::Start, target, level);
                        true
                    } else {
                        false
                    }
                }
                DeferredCallback::Stop(id) => {
                    if let Some(index) = self.stopping.iter().position(|callback| callback.id() == id) {
                        self.stopping.swap_remove(index).dispatch(Phase::Stop, target, level);
                        true
                    } else {
                        false
                    }
                }
            };
            if ran {
                executed = executed.saturating_add(1);
            } else {
                debug!(callback = %command.id(), "Deferred callback skipped, nothing to replay");
            }
        }
        if executed > 0 {
            debug!(executed, level, "Ran deferred sanity callbacks");
        }
        executed
    }

    /// Write the bounds and partitions into `record`.
    pub(crate) fn write_record(&self, record: &mut SanityRecord) {
        record.floor = self.value.floor();
        record.ceiling = self.value.ceiling();
        record.current = self.value.current();
        record.previous = self.previous;
        record.temp_floor = self.value.temp_floor();
        record.temp_ceiling = self.value.temp_ceiling();
        record.first_interaction = self.initialized;
        record.dormant = self
            .dormant
            .iter()
            .map(|(level, ids)| (*level, ids.iter().cloned().collect()))
            .collect();
        record.active = self
            .active
            .iter()
            .map(|(level, callbacks)| {
                let entries = callbacks
                    .iter()
                    .map(|callback| {
                        let handler = callback.handler();
                        if handler.has_private_data() {
                            ActiveEntry::WithData {
                                id: callback.id().clone(),
                                data: handler.serialize_private_data(),
                            }
                        } else {
                            ActiveEntry::Bare(callback.id().clone())
                        }
                    })
                    .collect();
                (*level, entries)
            })
            .collect();
    }

    /// Rebuild a state from a record, reconciling against the registry.
    ///
    /// - Entries whose identifier is no longer registered are dropped.
    /// - Active entries restore their handler data, and are queued for a
    ///   deferred start if their handler restarts on reload.
    /// - Registrations missing from the record are classified against the
    ///   restored value; those that land in the active partition are queued
    ///   for a deferred start.
    ///
    /// A record whose partitions were never built restores with empty
    /// partitions and builds them lazily, like a fresh state.
    pub(crate) fn restore(record: &SanityRecord, registry: &dyn CallbackRegistry) -> Result<Self, SanityError> {
        let value = SanityValue::new(
            record.floor,
            record.ceiling,
            record.current,
            record.temp_floor,
            record.temp_ceiling,
        )
        .map_err(|source| SanityError::Decode {
            reason: source.to_string(),
        })?;
        if value.current() != record.current
            || value.temp_floor() != record.temp_floor
            || value.temp_ceiling() != record.temp_ceiling
        {
            return Err(SanityError::Decode {
                reason: format!(
                    "bounds out of order: floor {} <= temp floor {} <= current {} <= temp ceiling {} <= ceiling {}",
                    record.floor, record.temp_floor, record.current, record.temp_ceiling, record.ceiling
                ),
            });
        }

        let mut state = Self::new(value);
        state.previous = record.previous;
        if !record.first_interaction {
            return Ok(state);
        }
        state.initialized = true;

        let mut unseen: BTreeSet<Identifier> = registry.ids().into_iter().collect();
        let mut seen: BTreeSet<Identifier> = BTreeSet::new();
        let mut accept = |id: &Identifier| -> bool {
            if unseen.remove(id) {
                seen.insert(id.clone());
                true
            } else if seen.contains(id) {
                warn!(callback = %id, "Duplicate sanity callback in record, keeping first");
                false
            } else {
                debug!(callback = %id, "Dropping unregistered sanity callback from record");
                false
            }
        };

        for (level, ids) in &record.dormant {
            for id in ids {
                if accept(id) {
                    state.dormant.entry(*level).or_default().insert(id.clone());
                }
            }
        }

        for (level, entries) in &record.active {
            for entry in entries {
                let id = entry.id();
                if !accept(id) {
                    continue;
                }
                let Some(mut callback) = registry.create(id) else {
                    continue;
                };
                if let Some(data) = entry.data() {
                    callback.handler_mut().deserialize_private_data(data)?;
                }
                if callback.handler().restart_on_reload() {
                    state.deferred.push(DeferredCallback::Start(id.clone()));
                }
                state.active.entry(*level).or_default().push(callback);
            }
        }

        for id in unseen {
            let Some(callback) = registry.create(&id) else {
                continue;
            };
            if state.classify(callback, value.current()) {
                state.deferred.push(DeferredCallback::Start(id));
            }
        }

        Ok(state)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{EmptyTables, Event, TestTarget, id, recording_registry};

    #[test]
    fn falling_through_start_level_starts_once() {
        let (registry, log) = recording_registry(&[("dread", 50, 30)]);
        let tables = EmptyTables;
        let mut target = TestTarget::default();
        let mut state = SanityState::default();
        let mut session = Session::live(&registry, &tables, &mut target);

        assert!(state.set_value(20, false, &mut session));
        assert_eq!(log.take(), vec![Event::start("dread", 20)]);
        assert_eq!(state.partition_of(&id("dread")), Some(Partition::Active(30)));
    }

    #[test]
    fn rising_through_stop_level_stops_once() {
        let (registry, log) = recording_registry(&[("dread", 50, 30)]);
        let tables = EmptyTables;
        let mut target = TestTarget::default();
        let mut state = SanityState::default();
        let mut session = Session::live(&registry, &tables, &mut target);

        state.set_value(20, false, &mut session);
        log.take();
        state.set_value(35, false, &mut session);
        assert_eq!(log.take(), vec![Event::stop("dread", 35)]);
        assert_eq!(state.partition_of(&id("dread")), Some(Partition::Dormant(50)));
    }

    #[test]
    fn active_callbacks_receive_updates_in_both_directions() {
        let (registry, log) = recording_registry(&[("dread", 50, 30)]);
        let tables = EmptyTables;
        let mut target = TestTarget::default();
        let mut state = SanityState::default();
        let mut session = Session::live(&registry, &tables, &mut target);

        state.set_value(45, false, &mut session);
        log.take();
        state.set_value(40, false, &mut session);
        state.set_value(42, false, &mut session);
        assert_eq!(log.take(), vec![Event::update("dread", 40), Event::update("dread", 42)]);
    }

    #[test]
    fn falling_updates_before_starting() {
        let (registry, log) = recording_registry(&[("early", 80, 90), ("late", 50, 60)]);
        let tables = EmptyTables;
        let mut target = TestTarget::default();
        let mut state = SanityState::default();
        let mut session = Session::live(&registry, &tables, &mut target);

        state.set_value(70, false, &mut session);
        log.take();
        state.set_value(40, false, &mut session);
        assert_eq!(log.take(), vec![Event::update("early", 40), Event::start("late", 40)]);
    }

    #[test]
    fn sweep_order_follows_direction() {
        let (registry, log) = recording_registry(&[("a", 70, 75), ("b", 60, 65), ("c", 50, 55)]);
        let tables = EmptyTables;
        let mut target = TestTarget::default();
        let mut state = SanityState::default();
        let mut session = Session::live(&registry, &tables, &mut target);

        state.set_value(40, false, &mut session);
        let starts: Vec<_> = log.take().into_iter().map(|event| event.callback).collect();
        assert_eq!(starts, vec!["a", "b", "c"]);

        state.set_value(100, false, &mut session);
        let stops: Vec<_> = log
            .take()
            .into_iter()
            .filter(|event| event.phase == Phase::Stop)
            .map(|event| event.callback)
            .collect();
        assert_eq!(stops, vec!["c", "b", "a"]);
    }

    #[test]
    fn lazy_init_classifies_against_pre_change_value() {
        let (registry, log) = recording_registry(&[("dread", 50, 30), ("calm", 100, 101)]);
        let tables = EmptyTables;
        let mut target = TestTarget::default();
        let mut state = SanityState::default();
        let mut session = Session::live(&registry, &tables, &mut target);

        assert!(!state.is_initialized());
        state.set_value(99, false, &mut session);
        assert!(state.is_initialized());
        // Already at or below its start level before the change, so it is
        // classified active without a start notification.
        assert_eq!(state.partition_of(&id("calm")), Some(Partition::Active(101)));
        assert_eq!(log.take(), vec![Event::update("calm", 99)]);
    }

    #[test]
    fn ineligible_target_blocks_change_without_override() {
        let (registry, _log) = recording_registry(&[]);
        let tables = EmptyTables;
        let mut target = TestTarget {
            alive: false,
            ..TestTarget::default()
        };
        let mut state = SanityState::default();
        let mut session = Session::live(&registry, &tables, &mut target);

        assert!(!state.set_value(20, false, &mut session));
        assert_eq!(state.current(), 100);
        assert!(state.set_value(20, true, &mut session));
        assert_eq!(state.current(), 20);
    }

    #[test]
    fn unchanged_value_has_no_side_effects() {
        let (registry, log) = recording_registry(&[("dread", 50, 30)]);
        let tables = EmptyTables;
        let mut target = TestTarget::default();
        let mut state = SanityState::default();
        let mut session = Session::live(&registry, &tables, &mut target);

        assert!(!state.set_value(150, false, &mut session));
        assert!(!state.is_initialized());
        assert!(log.take().is_empty());
    }

    #[test]
    fn ceiling_below_temp_floor_clamps_to_temp_floor() {
        let (registry, _log) = recording_registry(&[]);
        let tables = EmptyTables;
        let mut target = TestTarget::default();
        let mut state = SanityState::default();
        let mut session = Session::live(&registry, &tables, &mut target);

        state.set_ceiling_bound(2, false, &mut session);
        assert_eq!(state.value().temp_ceiling(), 10);
        assert_eq!(state.current(), 10);
        assert!(state.value().is_ordered());
    }

    #[test]
    fn set_above_ceiling_clamps_to_temp_ceiling() {
        let (registry, _log) = recording_registry(&[]);
        let tables = EmptyTables;
        let mut target = TestTarget::default();
        let mut state = SanityState::default();
        let mut session = Session::live(&registry, &tables, &mut target);

        state.set_ceiling_bound(70, false, &mut session);
        assert_eq!(state.current(), 70);
        state.set_value(10_000, false, &mut session);
        assert_eq!(state.current(), 70);
    }

    #[test]
    fn detached_start_is_deferred_until_login() {
        let (registry, log) = recording_registry(&[("dread", 50, 30)]);
        let tables = EmptyTables;
        let mut state = SanityState::default();
        let mut session = Session::detached(&registry, &tables);

        assert!(state.set_value(20, true, &mut session));
        assert!(log.take().is_empty());
        assert_eq!(state.deferred().len(), 1);

        let mut target = TestTarget::default();
        assert_eq!(state.execute_login_callbacks(&mut target), 1);
        assert_eq!(log.take(), vec![Event::start("dread", 20)]);
        assert_eq!(state.execute_login_callbacks(&mut target), 0);
        assert!(log.take().is_empty());
    }

    #[test]
    fn detached_stop_cancels_pending_start() {
        let (registry, log) = recording_registry(&[("dread", 50, 30)]);
        let tables = EmptyTables;
        let mut state = SanityState::default();
        let mut session = Session::detached(&registry, &tables);

        state.set_value(20, true, &mut session);
        state.set_value(90, true, &mut session);
        assert!(state.deferred().is_empty());

        let mut target = TestTarget::default();
        assert_eq!(state.execute_login_callbacks(&mut target), 0);
        assert!(log.take().is_empty());
    }

    #[test]
    fn detached_rise_defers_stop_of_started_callback() {
        let (registry, log) = recording_registry(&[("dread", 50, 30)]);
        let tables = EmptyTables;
        let mut target = TestTarget::default();
        let mut state = SanityState::default();

        let mut session = Session::live(&registry, &tables, &mut target);
        state.set_value(20, false, &mut session);
        assert_eq!(log.take(), vec![Event::start("dread", 20)]);

        let mut session = Session::detached(&registry, &tables);
        state.set_value(90, true, &mut session);
        assert!(log.take().is_empty());
        assert_eq!(state.partition_of(&id("dread")), Some(Partition::Dormant(50)));
        assert_eq!(state.deferred().len(), 1);

        assert_eq!(state.execute_login_callbacks(&mut target), 1);
        assert_eq!(log.take(), vec![Event::stop("dread", 90)]);
        assert_eq!(state.execute_login_callbacks(&mut target), 0);
        assert!(log.take().is_empty());
    }

    #[test]
    fn detached_stop_then_restart_replays_both_in_order() {
        let (registry, log) = recording_registry(&[("dread", 50, 30)]);
        let tables = EmptyTables;
        let mut target = TestTarget::default();
        let mut state = SanityState::default();

        let mut session = Session::live(&registry, &tables, &mut target);
        state.set_value(20, false, &mut session);
        log.take();

        let mut session = Session::detached(&registry, &tables);
        state.set_value(90, true, &mut session);
        state.set_value(40, true, &mut session);
        assert_eq!(state.partition_of(&id("dread")), Some(Partition::Active(30)));

        assert_eq!(state.execute_login_callbacks(&mut target), 2);
        assert_eq!(log.take(), vec![Event::stop("dread", 40), Event::start("dread", 40)]);
    }

    #[test]
    fn login_on_empty_queue_is_noop() {
        let mut state = SanityState::default();
        let mut target = TestTarget::default();
        assert_eq!(state.execute_login_callbacks(&mut target), 0);
    }

    #[test]
    fn every_registration_in_exactly_one_partition() {
        let (registry, _log) =
            recording_registry(&[("a", 90, 95), ("b", 60, 30), ("c", 20, 40), ("d", 5, 6)]);
        let tables = EmptyTables;
        let mut target = TestTarget::default();
        let mut state = SanityState::default();
        let mut session = Session::live(&registry, &tables, &mut target);

        for value in [70, 15, 100, 33, 12, 12, 88, 41, 10, 100] {
            state.set_value(value, false, &mut session);
            for callback in registry.ids() {
                let dormant = state.dormant().values().filter(|ids| ids.contains(&callback)).count();
                let active = state
                    .active_ids()
                    .values()
                    .filter(|ids| ids.contains(&callback))
                    .count();
                assert_eq!(dormant + active, 1, "{callback} after {value}");
            }
            assert!(state.value().is_ordered());
        }
    }
}
