//! The callback registry.
//!
//! The registry enumerates every callback identifier the host knows about
//! and constructs fresh callbacks on demand. The sanity state borrows it as
//! a read-only snapshot per call and only reconciles against it when the
//! partitions are first built or a record is restored.

use std::collections::BTreeMap;

use paranoia_types::Identifier;
use tracing::warn;

use crate::callback::SanityCallback;

/// Source of callback registrations.
pub trait CallbackRegistry {
    /// Every registered callback identifier.
    fn ids(&self) -> Vec<Identifier>;

    /// Construct a fresh callback for `id`, or `None` if it is not
    /// registered.
    fn create(&self, id: &Identifier) -> Option<SanityCallback>;
}

/// Constructor stored per registered identifier.
pub type CallbackConstructor = Box<dyn Fn(&Identifier) -> Option<SanityCallback>>;

/// A table of callback constructors keyed by identifier.
#[derive(Default)]
pub struct Registry {
    constructors: BTreeMap<Identifier, CallbackConstructor>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor. A second registration under the same
    /// identifier replaces the first.
    pub fn register<F>(&mut self, id: Identifier, constructor: F)
    where
        F: Fn(&Identifier) -> Option<SanityCallback> + 'static,
    {
        if self.constructors.insert(id.clone(), Box::new(constructor)).is_some() {
            warn!(callback = %id, "Replacing existing sanity callback registration");
        }
    }

    /// Remove a registration, returning whether it existed.
    pub fn unregister(&mut self, id: &Identifier) -> bool {
        self.constructors.remove(id).is_some()
    }

    /// Number of registrations.
    pub fn len(&self) -> usize {
        self.constructors.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.constructors.is_empty()
    }
}

impl CallbackRegistry for Registry {
    fn ids(&self) -> Vec<Identifier> {
        self.constructors.keys().cloned().collect()
    }

    fn create(&self, id: &Identifier) -> Option<SanityCallback> {
        let constructor = self.constructors.get(id)?;
        let callback = constructor(id);
        if callback.is_none() {
            warn!(callback = %id, "Sanity callback constructor produced nothing");
        }
        callback
    }
}

impl core::fmt::Debug for Registry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registry")
            .field("ids", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{id, recording_registry};

    #[test]
    fn ids_are_sorted() {
        let (registry, _log) = recording_registry(&[("whispers", 40, 45), ("dread", 50, 30)]);
        assert_eq!(registry.ids(), vec![id("dread"), id("whispers")]);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn create_builds_fresh_callbacks() {
        let (registry, _log) = recording_registry(&[("dread", 50, 30)]);
        let callback = registry.create(&id("dread")).unwrap();
        assert_eq!(callback.id(), &id("dread"));
        assert!(registry.create(&id("missing")).is_none());
    }

    #[test]
    fn constructor_may_decline() {
        let mut registry = Registry::new();
        registry.register(id("broken"), |_| None);
        assert!(registry.create(&id("broken")).is_none());
        assert_eq!(registry.ids(), vec![id("broken")]);
    }

    #[test]
    fn unregister_removes() {
        let (mut registry, _log) = recording_registry(&[("dread", 50, 30)]);
        assert!(registry.unregister(&id("dread")));
        assert!(!registry.unregister(&id("dread")));
        assert!(registry.is_empty());
    }
}
