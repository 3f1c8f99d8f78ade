//! Deferred callback commands.
//!
//! Starts and stops that happen while no target is attached (during a
//! restore, or a forced change before login) are queued here and replayed
//! once a live target arrives. Each entry runs at most once.

use paranoia_types::Identifier;

/// A queued notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredCallback {
    /// Start the active callback with this identifier.
    Start(Identifier),
    /// Stop a callback that was started against a live target and has
    /// since been moved back to the dormant partition.
    Stop(Identifier),
}

impl DeferredCallback {
    /// The callback this command targets.
    pub const fn id(&self) -> &Identifier {
        match self {
            Self::Start(id) | Self::Stop(id) => id,
        }
    }
}

/// Ordered queue of deferred commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeferredQueue {
    entries: Vec<DeferredCallback>,
}

impl DeferredQueue {
    /// Append a command unless an identical one is already pending.
    pub fn push(&mut self, command: DeferredCallback) {
        if !self.entries.contains(&command) {
            self.entries.push(command);
        }
    }

    /// Drop any pending start for `id`. Returns whether one was pending.
    pub fn cancel_start(&mut self, id: &Identifier) -> bool {
        let before = self.entries.len();
        self.entries
            .retain(|command| !matches!(command, DeferredCallback::Start(pending) if pending == id));
        self.entries.len() != before
    }

    /// Remove and return every pending command, in order.
    pub fn drain(&mut self) -> Vec<DeferredCallback> {
        core::mem::take(&mut self.entries)
    }

    /// Number of pending commands.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn id(path: &str) -> Identifier {
        Identifier::new("paranoia", path).unwrap()
    }

    #[test]
    fn push_deduplicates() {
        let mut queue = DeferredQueue::default();
        queue.push(DeferredCallback::Start(id("heartbeat")));
        queue.push(DeferredCallback::Start(id("heartbeat")));
        queue.push(DeferredCallback::Stop(id("heartbeat")));
        assert_eq!(queue.len(), 2);
        assert_eq!(DeferredCallback::Stop(id("heartbeat")).id(), &id("heartbeat"));
    }

    #[test]
    fn cancel_removes_only_matching_start() {
        let mut queue = DeferredQueue::default();
        queue.push(DeferredCallback::Start(id("heartbeat")));
        queue.push(DeferredCallback::Stop(id("heartbeat")));
        queue.push(DeferredCallback::Start(id("whispers")));
        assert!(queue.cancel_start(&id("heartbeat")));
        assert!(!queue.cancel_start(&id("heartbeat")));
        assert_eq!(
            queue.drain(),
            vec![
                DeferredCallback::Stop(id("heartbeat")),
                DeferredCallback::Start(id("whispers")),
            ]
        );
    }

    #[test]
    fn drain_empties_queue() {
        let mut queue = DeferredQueue::default();
        queue.push(DeferredCallback::Start(id("heartbeat")));
        assert_eq!(queue.drain().len(), 1);
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }
}
