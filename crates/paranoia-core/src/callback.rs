//! Sanity callbacks and their handlers.
//!
//! A [`SanityCallback`] binds an identifier to a pair of breakpoints and a
//! [`Handler`]. The handler starts when a falling value sweeps through the
//! start level, stops when a rising value sweeps through the stop level,
//! and receives an update on every change while it is running.

use core::fmt;

use paranoia_types::Identifier;
use tracing::trace;

use crate::error::SanityError;
use crate::target::Target;

/// The notification a handler is receiving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// The value fell through the start level.
    Start,
    /// The value rose through the stop level.
    Stop,
    /// The value changed while the callback was active.
    Update,
}

/// Host-supplied behavior attached to a callback.
pub trait Handler {
    /// Called once when the callback becomes active.
    fn on_start(&mut self, target: &mut dyn Target, level: i32);

    /// Called once when the callback becomes dormant again.
    fn on_stop(&mut self, target: &mut dyn Target, level: i32);

    /// Called on every value change while active.
    fn on_update(&mut self, _target: &mut dyn Target, _level: i32) {}

    /// Whether [`serialize_private_data`](Handler::serialize_private_data)
    /// produces anything worth persisting.
    fn has_private_data(&self) -> bool {
        false
    }

    /// Persist handler-owned state.
    fn serialize_private_data(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    /// Restore handler-owned state.
    ///
    /// # Errors
    ///
    /// Returns [`SanityError::Decode`] if the blob is not understood.
    fn deserialize_private_data(&mut self, _data: &serde_json::Value) -> Result<(), SanityError> {
        Ok(())
    }

    /// Whether an active callback should be started again after a restore.
    fn restart_on_reload(&self) -> bool {
        false
    }
}

/// A registered breakpoint pair with its handler.
pub struct SanityCallback {
    id: Identifier,
    start_level: i32,
    stop_level: i32,
    handler: Box<dyn Handler>,
}

impl SanityCallback {
    /// Create a callback.
    ///
    /// # Errors
    ///
    /// Returns [`SanityError::InvalidCallbackLevels`] when both levels are
    /// equal.
    pub fn new(
        id: Identifier,
        start_level: i32,
        stop_level: i32,
        handler: Box<dyn Handler>,
    ) -> Result<Self, SanityError> {
        if start_level == stop_level {
            return Err(SanityError::InvalidCallbackLevels {
                id,
                level: start_level,
            });
        }
        Ok(Self {
            id,
            start_level,
            stop_level,
            handler,
        })
    }

    /// The callback identifier.
    pub const fn id(&self) -> &Identifier {
        &self.id
    }

    /// Level at or below which the callback starts.
    pub const fn start_level(&self) -> i32 {
        self.start_level
    }

    /// Level through which a rising value stops the callback.
    pub const fn stop_level(&self) -> i32 {
        self.stop_level
    }

    /// The attached handler.
    pub fn handler(&self) -> &dyn Handler {
        self.handler.as_ref()
    }

    /// The attached handler, mutably.
    pub fn handler_mut(&mut self) -> &mut dyn Handler {
        self.handler.as_mut()
    }

    /// Route a phase to the matching handler method.
    pub fn dispatch(&mut self, phase: Phase, target: &mut dyn Target, level: i32) {
        trace!(callback = %self.id, ?phase, level, "Dispatching sanity callback");
        match phase {
            Phase::Start => self.handler.on_start(target, level),
            Phase::Stop => self.handler.on_stop(target, level),
            Phase::Update => self.handler.on_update(target, level),
        }
    }
}

impl fmt::Debug for SanityCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SanityCallback")
            .field("id", &self.id)
            .field("start_level", &self.start_level)
            .field("stop_level", &self.stop_level)
            .finish_non_exhaustive()
    }
}
