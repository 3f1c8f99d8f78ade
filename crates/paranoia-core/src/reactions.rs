//! Host event reactions.
//!
//! Hosts forward entity lifecycle events here. Each reaction translates the
//! event into value, bound, or hook operations on a [`Sanity`] tracker
//! using the amounts in [`RulesConfig`] and the lookup tables.

use paranoia_types::{DEFAULT_NAMESPACE, Identifier};
use tracing::{debug, error, info};

use crate::config::RulesConfig;
use crate::error::SanityError;
use crate::hooks::TickHook;
use crate::lookup::Session;
use crate::sanity::Sanity;
use crate::target::Target;

/// Path of the temporary hook registered while an entity sleeps.
pub const SLEEPING_HOOK: &str = "sleeping";

/// Event reactions configured with a rule set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reactions {
    rules: RulesConfig,
    sleeping: Identifier,
}

impl Reactions {
    /// Create reactions for `rules`.
    ///
    /// # Errors
    ///
    /// Returns [`SanityError::InvalidIdentifier`] if the sleeping hook
    /// identifier cannot be built.
    pub fn new(rules: RulesConfig) -> Result<Self, SanityError> {
        Ok(Self {
            rules,
            sleeping: Identifier::new(DEFAULT_NAMESPACE, SLEEPING_HOOK)?,
        })
    }

    /// The rule set.
    pub const fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// Identifier of the sleeping hook.
    pub const fn sleeping_hook(&self) -> &Identifier {
        &self.sleeping
    }

    /// The entity finished using `item`.
    pub fn on_item_used(&self, sanity: &mut Sanity, item: &Identifier, session: &mut Session<'_>) -> bool {
        let amount = session.lookup.gain_for_item(item);
        if amount == 0 {
            return false;
        }
        debug!(%item, amount, "Item changed sanity");
        sanity.change_value(amount, false, session)
    }

    /// The entity was damaged by an entity of `kind`.
    pub fn on_damaged_by(&self, sanity: &mut Sanity, kind: &Identifier, session: &mut Session<'_>) -> bool {
        let amount = session.lookup.loss_for_entity_kind(kind);
        if amount == 0 {
            return false;
        }
        debug!(%kind, amount, "Damage changed sanity");
        sanity.change_value(amount, false, session)
    }

    /// The entity got into bed. `hook` runs every tick until
    /// [`on_wake`](Self::on_wake).
    pub fn on_sleep_started(&self, sanity: &mut Sanity, hook: Box<dyn TickHook>) {
        sanity.add_temporary_tickable(self.sleeping.clone(), hook);
    }

    /// The night was skipped by sleeping.
    pub fn on_sleep_finished(&self, sanity: &mut Sanity, session: &mut Session<'_>) {
        sanity.change_ceiling_bound(self.rules.sleep_ceiling_bonus, false, session);
        sanity.change_value(self.rules.sleep_sanity_bonus, false, session);
    }

    /// Whether the sleeping hook is registered.
    pub fn is_sleeping(&self, sanity: &Sanity) -> bool {
        sanity.scheduler().has_temporary_tickable(&self.sleeping)
    }

    /// The entity left its bed. Returns whether a sleeping hook was
    /// registered.
    pub fn on_wake(&self, sanity: &mut Sanity) -> bool {
        match sanity.remove_temporary_tickable(&self.sleeping) {
            Ok(()) => true,
            Err(err) => {
                error!(error = %err, "Woke without a sleeping hook");
                false
            }
        }
    }

    /// The entity came online. Returns how many deferred starts ran.
    pub fn on_login(&self, sanity: &mut Sanity, target: &mut dyn Target) -> usize {
        sanity.execute_login_callbacks(target)
    }

    /// The entity was recreated from `original`, after death when `died`
    /// is set.
    ///
    /// The persisted state carries over. A death costs
    /// `death_ceiling_penalty` from the temporary ceiling and resets the
    /// value to the new ceiling, regardless of eligibility. When the session
    /// carries a live target, starts deferred by the restore run at once
    /// instead of waiting for a login. Returns how many ran.
    ///
    /// # Errors
    ///
    /// Propagates any error from restoring `original` into `respawned`,
    /// which is left untouched in that case.
    pub fn on_respawn(
        &self,
        respawned: &mut Sanity,
        original: &Sanity,
        died: bool,
        session: &mut Session<'_>,
    ) -> Result<usize, SanityError> {
        respawned.deserialize(&original.serialize(), session.registry)?;
        if died {
            respawned.change_ceiling_bound(self.rules.death_ceiling_penalty.saturating_neg(), true, session);
            let ceiling = respawned.value().temp_ceiling();
            respawned.set_value(ceiling, true, session);
            info!(
                temp_ceiling = ceiling,
                current = respawned.current(),
                "Death penalty applied"
            );
        }
        let replayed = session
            .target
            .get()
            .map_or(0, |target| respawned.execute_login_callbacks(target));
        Ok(replayed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::bounds::SanityValue;
    use crate::config::ParanoiaConfig;
    use crate::hooks::TickContext;
    use crate::tables::SanityTables;
    use crate::testing::{EmptyTables, Event, TestTarget, custom_registry, recording_registry};

    fn reactions() -> Reactions {
        Reactions::new(RulesConfig::default()).unwrap()
    }

    fn tables() -> SanityTables {
        let config = ParanoiaConfig::parse(
            r#"
tables:
  entity_loss:
    entries: { "minecraft:zombie": 3 }
  item_gain:
    entries: { "minecraft:cookie": 2 }
"#,
        )
        .unwrap();
        SanityTables::from_config(&config.tables)
    }

    #[test]
    fn sleeping_hook_lives_in_default_namespace() {
        assert_eq!(reactions().sleeping_hook().to_string(), "paranoia:sleeping");
    }

    #[test]
    fn items_and_damage_use_tables() {
        let (registry, _log) = recording_registry(&[]);
        let tables = tables();
        let mut target = TestTarget::default();
        let mut session = Session::live(&registry, &tables, &mut target);
        let mut sanity = Sanity::new(SanityValue::new(0, 100, 50, 10, 100).unwrap());
        let reactions = reactions();

        let zombie = Identifier::parse("minecraft:zombie").unwrap();
        let cookie = Identifier::parse("minecraft:cookie").unwrap();
        let pig = Identifier::parse("minecraft:pig").unwrap();

        assert!(reactions.on_damaged_by(&mut sanity, &zombie, &mut session));
        assert_eq!(sanity.current(), 47);
        assert!(reactions.on_item_used(&mut sanity, &cookie, &mut session));
        assert_eq!(sanity.current(), 49);
        assert!(!reactions.on_damaged_by(&mut sanity, &pig, &mut session));
        assert_eq!(sanity.current(), 49);
    }

    #[test]
    fn sleep_raises_ceiling_then_value() {
        let (registry, _log) = recording_registry(&[]);
        let tables = EmptyTables;
        let mut target = TestTarget::default();
        let mut session = Session::live(&registry, &tables, &mut target);
        let mut sanity = Sanity::new(SanityValue::new(0, 100, 50, 10, 60).unwrap());

        reactions().on_sleep_finished(&mut sanity, &mut session);
        assert_eq!(sanity.value().temp_ceiling(), 65);
        assert_eq!(sanity.current(), 65);
    }

    #[test]
    fn wake_removes_sleeping_hook() {
        let (registry, _log) = recording_registry(&[]);
        let tables = EmptyTables;
        let mut target = TestTarget::default();
        let reactions = reactions();
        let mut sanity = Sanity::default();

        reactions.on_sleep_started(
            &mut sanity,
            Box::new(|_: &TickContext, target: &mut dyn Target| target.sanity_attack(0)),
        );
        {
            let mut session = Session::live(&registry, &tables, &mut target);
            sanity.tick(&TickContext::new(0, 20.0), &mut session);
        }
        assert!(reactions.is_sleeping(&sanity));
        assert!(reactions.on_wake(&mut sanity));
        assert!(!reactions.is_sleeping(&sanity));
        assert!(!reactions.on_wake(&mut sanity));
        assert_eq!(target.attacks, vec![0]);
    }

    #[test]
    fn respawn_after_death_applies_penalty() {
        let (registry, log) = recording_registry(&[("dread", 50, 30)]);
        let tables = EmptyTables;
        let mut target = TestTarget::default();
        let mut session = Session::live(&registry, &tables, &mut target);
        let reactions = reactions();

        let mut original = Sanity::default();
        original.set_value(20, false, &mut session);
        log.take();

        let mut respawned = Sanity::default();
        reactions
            .on_respawn(&mut respawned, &original, true, &mut session)
            .unwrap();
        assert_eq!(respawned.value().temp_ceiling(), 90);
        assert_eq!(respawned.current(), 90);
        assert_eq!(log.take(), vec![Event::stop("dread", 90)]);
    }

    #[test]
    fn respawn_without_death_copies_state() {
        let (registry, _log) = recording_registry(&[("dread", 50, 30)]);
        let tables = EmptyTables;
        let mut target = TestTarget::default();
        let mut session = Session::live(&registry, &tables, &mut target);

        let mut original = Sanity::default();
        original.set_value(40, false, &mut session);

        let mut respawned = Sanity::default();
        let replayed = reactions()
            .on_respawn(&mut respawned, &original, false, &mut session)
            .unwrap();
        assert_eq!(replayed, 0);
        assert_eq!(respawned.serialize(), original.serialize());
    }

    #[test]
    fn respawn_replays_restarts_on_live_target() {
        let (registry, log) = custom_registry(&[("dread", 50, 30, false, true)]);
        let tables = EmptyTables;
        let mut target = TestTarget::default();
        let mut session = Session::live(&registry, &tables, &mut target);

        let mut original = Sanity::default();
        original.set_value(20, false, &mut session);
        assert_eq!(log.take(), vec![Event::start("dread", 20)]);

        let mut respawned = Sanity::default();
        let replayed = reactions()
            .on_respawn(&mut respawned, &original, false, &mut session)
            .unwrap();
        assert_eq!(replayed, 1);
        assert_eq!(log.take(), vec![Event::start("dread", 20)]);
        assert!(respawned.state().deferred().is_empty());
    }

    #[test]
    fn detached_respawn_keeps_restarts_for_login() {
        let (registry, log) = custom_registry(&[("dread", 50, 30, false, true)]);
        let tables = EmptyTables;
        let mut original = Sanity::default();
        {
            let mut target = TestTarget::default();
            let mut session = Session::live(&registry, &tables, &mut target);
            original.set_value(20, false, &mut session);
        }
        log.take();

        let mut respawned = Sanity::default();
        let mut session = Session::detached(&registry, &tables);
        let replayed = reactions()
            .on_respawn(&mut respawned, &original, false, &mut session)
            .unwrap();
        assert_eq!(replayed, 0);
        assert!(log.take().is_empty());
        assert_eq!(respawned.state().deferred().len(), 1);
    }

    #[test]
    fn login_runs_deferred_starts() {
        let (registry, log) = recording_registry(&[("dread", 50, 30)]);
        let tables = EmptyTables;
        let mut sanity = Sanity::default();
        {
            let mut session = Session::detached(&registry, &tables);
            sanity.set_value(20, true, &mut session);
        }
        let mut target = TestTarget::default();
        assert_eq!(reactions().on_login(&mut sanity, &mut target), 1);
        assert_eq!(log.take(), vec![Event::start("dread", 20)]);
    }
}
