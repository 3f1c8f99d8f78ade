//! Demo sanity effects.
//!
//! Three callbacks with overlapping bands, each logging what a player would
//! experience. The heartbeat keeps a beat count across saves and restarts
//! on reload so its sound loop resumes after login.

use paranoia_core::{Handler, Registry, SanityCallback, SanityError, Target};
use paranoia_types::Identifier;
use serde_json::json;
use tracing::{debug, info, trace, warn};

/// `(path, start level, stop level)` for each demo effect.
pub const HEARTBEAT: (&str, i32, i32) = ("heartbeat", 60, 70);
/// Ambient whispers.
pub const WHISPERS: (&str, i32, i32) = ("whispers", 40, 45);
/// Shadows at the edge of vision.
pub const SHADOWS: (&str, i32, i32) = ("shadows", 20, 25);

/// A heartbeat sound loop that counts beats while active.
#[derive(Debug, Default)]
pub struct Heartbeat {
    beats: u64,
}

impl Heartbeat {
    /// Beats counted so far.
    pub const fn beats(&self) -> u64 {
        self.beats
    }
}

impl Handler for Heartbeat {
    fn on_start(&mut self, _target: &mut dyn Target, level: i32) {
        info!(level, beats = self.beats, "Heartbeat quickens");
    }

    fn on_stop(&mut self, _target: &mut dyn Target, level: i32) {
        info!(level, beats = self.beats, "Heartbeat settles");
    }

    fn on_update(&mut self, _target: &mut dyn Target, level: i32) {
        self.beats = self.beats.saturating_add(1);
        trace!(level, beats = self.beats, "Heartbeat");
    }

    fn has_private_data(&self) -> bool {
        true
    }

    fn serialize_private_data(&self) -> serde_json::Value {
        json!({ "beats": self.beats })
    }

    fn deserialize_private_data(&mut self, data: &serde_json::Value) -> Result<(), SanityError> {
        self.beats = data
            .get("beats")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| SanityError::Decode {
                reason: "heartbeat data is missing `beats`".to_owned(),
            })?;
        Ok(())
    }

    fn restart_on_reload(&self) -> bool {
        true
    }
}

/// A stateless effect that only logs its transitions.
#[derive(Debug)]
pub struct Ambient {
    name: &'static str,
}

impl Handler for Ambient {
    fn on_start(&mut self, _target: &mut dyn Target, level: i32) {
        info!(effect = self.name, level, "Effect begins");
    }

    fn on_stop(&mut self, _target: &mut dyn Target, level: i32) {
        info!(effect = self.name, level, "Effect fades");
    }

    fn on_update(&mut self, _target: &mut dyn Target, level: i32) {
        trace!(effect = self.name, level, "Effect continues");
    }
}

/// Build the registry of demo effects.
pub fn demo_registry() -> Result<Registry, SanityError> {
    let mut registry = Registry::new();

    let (path, start, stop) = HEARTBEAT;
    registry.register(Identifier::parse(path)?, move |id| {
        build(id, start, stop, Box::new(Heartbeat::default()))
    });

    for (path, start, stop) in [WHISPERS, SHADOWS] {
        registry.register(Identifier::parse(path)?, move |id| {
            build(id, start, stop, Box::new(Ambient { name: path }))
        });
    }

    debug!(effects = registry.len(), "Demo effects registered");
    Ok(registry)
}

fn build(id: &Identifier, start: i32, stop: i32, handler: Box<dyn Handler>) -> Option<SanityCallback> {
    SanityCallback::new(id.clone(), start, stop, handler)
        .inspect_err(|error| warn!(%error, "Skipping invalid sanity effect"))
        .ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use paranoia_core::CallbackRegistry;

    use super::*;

    #[test]
    fn registry_builds_every_effect() {
        let registry = demo_registry().unwrap();
        let ids = registry.ids();
        assert_eq!(ids.len(), 3);
        for id in &ids {
            assert!(registry.create(id).is_some(), "{id}");
        }
    }

    #[test]
    fn heartbeat_data_survives_reload() {
        let mut heartbeat = Heartbeat { beats: 17 };
        let data = heartbeat.serialize_private_data();
        heartbeat.beats = 0;
        heartbeat.deserialize_private_data(&data).unwrap();
        assert_eq!(heartbeat.beats(), 17);
        assert!(heartbeat.deserialize_private_data(&json!({})).is_err());
    }
}
