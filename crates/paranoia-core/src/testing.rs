//! Shared fixtures for unit tests.

#![allow(clippy::unwrap_used, missing_docs)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use paranoia_types::{Identifier, Threshold};
use serde_json::json;

use crate::callback::{Handler, Phase, SanityCallback};
use crate::error::{LookupError, SanityError};
use crate::lookup::LookupProvider;
use crate::registry::Registry;
use crate::target::Target;

pub fn id(path: &str) -> Identifier {
    Identifier::new("paranoia", path).unwrap()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub callback: String,
    pub phase: Phase,
    pub level: i32,
}

impl Event {
    pub fn start(callback: &str, level: i32) -> Self {
        Self {
            callback: callback.to_owned(),
            phase: Phase::Start,
            level,
        }
    }

    pub fn stop(callback: &str, level: i32) -> Self {
        Self {
            callback: callback.to_owned(),
            phase: Phase::Stop,
            level,
        }
    }

    pub fn update(callback: &str, level: i32) -> Self {
        Self {
            callback: callback.to_owned(),
            phase: Phase::Update,
            level,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventLog(Rc<RefCell<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.borrow_mut().push(event);
    }

    pub fn take(&self) -> Vec<Event> {
        core::mem::take(&mut *self.0.borrow_mut())
    }
}

pub struct RecordingHandler {
    name: String,
    log: EventLog,
    starts: u64,
    persistent: bool,
    restart: bool,
}

impl Handler for RecordingHandler {
    fn on_start(&mut self, _target: &mut dyn Target, level: i32) {
        self.starts += 1;
        self.log.push(Event::start(&self.name, level));
    }

    fn on_stop(&mut self, _target: &mut dyn Target, level: i32) {
        self.log.push(Event::stop(&self.name, level));
    }

    fn on_update(&mut self, _target: &mut dyn Target, level: i32) {
        self.log.push(Event::update(&self.name, level));
    }

    fn has_private_data(&self) -> bool {
        self.persistent
    }

    fn serialize_private_data(&self) -> serde_json::Value {
        json!({ "starts": self.starts })
    }

    fn deserialize_private_data(&mut self, data: &serde_json::Value) -> Result<(), SanityError> {
        self.starts = data
            .get("starts")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| SanityError::Decode {
                reason: "missing starts".to_owned(),
            })?;
        self.log.push(Event {
            callback: self.name.clone(),
            phase: Phase::Update,
            level: -1,
        });
        Ok(())
    }

    fn restart_on_reload(&self) -> bool {
        self.restart
    }
}

/// `(name, start, stop, persistent, restart)`
pub type Fixture<'a> = (&'a str, i32, i32, bool, bool);

pub fn custom_registry(fixtures: &[Fixture<'_>]) -> (Registry, EventLog) {
    let log = EventLog::default();
    let mut registry = Registry::new();
    for &(name, start, stop, persistent, restart) in fixtures {
        let log = log.clone();
        let name = name.to_owned();
        registry.register(id(&name), move |callback_id| {
            SanityCallback::new(
                callback_id.clone(),
                start,
                stop,
                Box::new(RecordingHandler {
                    name: name.clone(),
                    log: log.clone(),
                    starts: 0,
                    persistent,
                    restart,
                }),
            )
            .ok()
        });
    }
    (registry, log)
}

pub fn recording_registry(fixtures: &[(&str, i32, i32)]) -> (Registry, EventLog) {
    let fixtures: Vec<Fixture<'_>> = fixtures
        .iter()
        .map(|&(name, start, stop)| (name, start, stop, false, false))
        .collect();
    custom_registry(&fixtures)
}

#[derive(Debug)]
pub struct TestTarget {
    pub alive: bool,
    pub restricted: bool,
    pub attacks: Vec<i32>,
}

impl Default for TestTarget {
    fn default() -> Self {
        Self {
            alive: true,
            restricted: false,
            attacks: Vec::new(),
        }
    }
}

impl Target for TestTarget {
    fn is_alive(&self) -> bool {
        self.alive
    }

    fn is_restricted(&self) -> bool {
        self.restricted
    }

    fn sanity_attack(&mut self, level: i32) {
        self.attacks.push(level);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EmptyTables;

impl LookupProvider for EmptyTables {
    fn attack_time_for(&self, _level: i32) -> Option<u32> {
        None
    }

    fn recovery_time_for(&self, _light_level: u8) -> Option<u32> {
        None
    }

    fn hearts_buckets(&self, _light_level: u8) -> usize {
        0
    }

    fn level_change_time_for(&self, light_level: u8, hearts: usize) -> Result<Threshold, LookupError> {
        Err(LookupError::OutOfRange { light_level, hearts })
    }

    fn loss_for_entity_kind(&self, _kind: &Identifier) -> i32 {
        0
    }

    fn gain_for_item(&self, _item: &Identifier) -> i32 {
        0
    }
}

/// Light-independent tables for scheduler tests.
#[derive(Debug, Clone, Default)]
pub struct StubTables {
    pub attack: BTreeMap<i32, u32>,
    pub recovery: Option<u32>,
    pub change: Vec<Threshold>,
}

impl LookupProvider for StubTables {
    fn attack_time_for(&self, level: i32) -> Option<u32> {
        self.attack.get(&level).copied()
    }

    fn recovery_time_for(&self, _light_level: u8) -> Option<u32> {
        self.recovery
    }

    fn hearts_buckets(&self, _light_level: u8) -> usize {
        self.change.len()
    }

    fn level_change_time_for(&self, light_level: u8, hearts: usize) -> Result<Threshold, LookupError> {
        self.change
            .get(hearts)
            .copied()
            .ok_or(LookupError::OutOfRange { light_level, hearts })
    }

    fn loss_for_entity_kind(&self, _kind: &Identifier) -> i32 {
        0
    }

    fn gain_for_item(&self, _item: &Identifier) -> i32 {
        0
    }
}
