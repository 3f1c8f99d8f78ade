//! Data-driven threshold and amount tables.
//!
//! [`SanityTables`] is the bundled [`LookupProvider`]. It is built from one
//! or more [`TablesConfig`] layers: later layers overwrite earlier keys, and
//! an amount table marked `replace` discards everything layered before it.
//!
//! Entity loss is authored as a positive amount lost and stored negated, so
//! [`loss_for_entity_kind`](LookupProvider::loss_for_entity_kind) can be
//! passed straight to a value change. Recovery times are stored as absolute
//! tick counts.

use std::collections::{BTreeMap, BTreeSet};

use paranoia_types::{Identifier, Threshold};
use tracing::{debug, warn};

use crate::config::{AmountTable, TablesConfig};
use crate::error::LookupError;
use crate::lookup::LookupProvider;

/// Merged lookup tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SanityTables {
    attack: BTreeMap<i32, u32>,
    recovery: BTreeMap<u8, u32>,
    levels: BTreeMap<u8, Vec<Threshold>>,
    entity_loss: BTreeMap<Identifier, i32>,
    item_gain: BTreeMap<Identifier, i32>,
}

impl SanityTables {
    /// Build tables from a single layer.
    pub fn from_config(config: &TablesConfig) -> Self {
        let mut tables = Self::default();
        tables.merge(config);
        tables
    }

    /// Layer `config` on top of the current tables.
    pub fn merge(&mut self, config: &TablesConfig) {
        self.attack
            .extend(config.attack.iter().map(|(level, ticks)| (*level, *ticks)));
        self.recovery.extend(config.recovery.iter().map(|(light, ticks)| {
            let ticks = u32::try_from(ticks.unsigned_abs()).unwrap_or(u32::MAX);
            (*light, ticks)
        }));
        self.levels.extend(config.levels.iter().map(|(light, breakdown)| {
            let thresholds = breakdown
                .hearts_breakdown
                .iter()
                .map(|ticks| Threshold::from_signed(*ticks))
                .collect();
            (*light, thresholds)
        }));
        merge_amounts(&mut self.entity_loss, &config.entity_loss, i32::saturating_neg);
        merge_amounts(&mut self.item_gain, &config.item_gain, |amount| amount);
        debug!(
            attack = self.attack.len(),
            recovery = self.recovery.len(),
            levels = self.levels.len(),
            entity_loss = self.entity_loss.len(),
            item_gain = self.item_gain.len(),
            "Sanity tables merged"
        );
    }

    /// Drop entity and item entries the host does not recognize, warning
    /// about each one. Returns how many entries were dropped.
    pub fn retain_known(
        &mut self,
        entities: &BTreeSet<Identifier>,
        items: &BTreeSet<Identifier>,
    ) -> usize {
        retain_table(&mut self.entity_loss, entities, "entity")
            .saturating_add(retain_table(&mut self.item_gain, items, "item"))
    }
}

fn merge_amounts(table: &mut BTreeMap<Identifier, i32>, layer: &AmountTable, map: fn(i32) -> i32) {
    if layer.replace {
        table.clear();
    }
    table.extend(layer.entries.iter().map(|(id, amount)| (id.clone(), map(*amount))));
}

fn retain_table(table: &mut BTreeMap<Identifier, i32>, known: &BTreeSet<Identifier>, kind: &str) -> usize {
    let before = table.len();
    table.retain(|id, _| {
        let keep = known.contains(id);
        if !keep {
            warn!(%id, kind, "Unknown identifier in sanity tables, skipping");
        }
        keep
    });
    before.saturating_sub(table.len())
}

impl LookupProvider for SanityTables {
    fn attack_time_for(&self, level: i32) -> Option<u32> {
        self.attack.get(&level).copied().filter(|ticks| *ticks > 0)
    }

    fn recovery_time_for(&self, light_level: u8) -> Option<u32> {
        self.recovery.get(&light_level).copied().filter(|ticks| *ticks > 0)
    }

    fn hearts_buckets(&self, light_level: u8) -> usize {
        self.levels.get(&light_level).map_or(0, Vec::len)
    }

    fn level_change_time_for(&self, light_level: u8, hearts: usize) -> Result<Threshold, LookupError> {
        self.levels
            .get(&light_level)
            .and_then(|breakdown| breakdown.get(hearts))
            .copied()
            .ok_or(LookupError::OutOfRange { light_level, hearts })
    }

    fn loss_for_entity_kind(&self, kind: &Identifier) -> i32 {
        self.entity_loss.get(kind).copied().unwrap_or(0)
    }

    fn gain_for_item(&self, item: &Identifier) -> i32 {
        self.item_gain.get(item).copied().unwrap_or(0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ParanoiaConfig;

    fn ident(raw: &str) -> Identifier {
        Identifier::parse(raw).unwrap()
    }

    fn layer(yaml: &str) -> TablesConfig {
        ParanoiaConfig::parse(yaml).unwrap().tables
    }

    fn base() -> SanityTables {
        SanityTables::from_config(&layer(
            r#"
tables:
  attack: { 20: 300, 10: 0 }
  recovery: { 15: -400, 7: 900 }
  levels:
    0: { hearts_breakdown: [-100, -50, 0] }
  entity_loss:
    entries: { "minecraft:zombie": 3, "minecraft:creeper": 8 }
  item_gain:
    entries: { "minecraft:cookie": 2 }
"#,
        ))
    }

    #[test]
    fn lookups_resolve_and_default() {
        let tables = base();
        assert_eq!(tables.attack_time_for(20), Some(300));
        assert_eq!(tables.attack_time_for(10), None);
        assert_eq!(tables.attack_time_for(99), None);
        assert_eq!(tables.recovery_time_for(15), Some(400));
        assert_eq!(tables.recovery_time_for(7), Some(900));
        assert_eq!(tables.recovery_time_for(3), None);
        assert_eq!(tables.loss_for_entity_kind(&ident("minecraft:zombie")), -3);
        assert_eq!(tables.loss_for_entity_kind(&ident("minecraft:pig")), 0);
        assert_eq!(tables.gain_for_item(&ident("minecraft:cookie")), 2);
        assert_eq!(tables.gain_for_item(&ident("minecraft:apple")), 0);
    }

    #[test]
    fn level_change_reports_out_of_range() {
        let tables = base();
        assert_eq!(tables.hearts_buckets(0), 3);
        assert_eq!(tables.level_change_time_for(0, 0), Ok(Threshold::Falling(100)));
        assert_eq!(tables.level_change_time_for(0, 2), Ok(Threshold::Inactive));
        assert_eq!(
            tables.level_change_time_for(0, 3),
            Err(LookupError::OutOfRange {
                light_level: 0,
                hearts: 3
            })
        );
        assert_eq!(tables.hearts_buckets(9), 0);
        assert!(tables.level_change_time_for(9, 0).is_err());
    }

    #[test]
    fn layers_overwrite_and_replace() {
        let mut tables = base();
        tables.merge(&layer(
            r#"
tables:
  attack: { 20: 150 }
  entity_loss:
    replace: true
    entries: { "minecraft:skeleton": 4 }
  item_gain:
    entries: { "minecraft:bread": 1 }
"#,
        ));
        assert_eq!(tables.attack_time_for(20), Some(150));
        assert_eq!(tables.loss_for_entity_kind(&ident("minecraft:zombie")), 0);
        assert_eq!(tables.loss_for_entity_kind(&ident("minecraft:skeleton")), -4);
        assert_eq!(tables.gain_for_item(&ident("minecraft:cookie")), 2);
        assert_eq!(tables.gain_for_item(&ident("minecraft:bread")), 1);
    }

    #[test]
    fn unknown_identifiers_are_dropped() {
        let mut tables = base();
        let entities: BTreeSet<_> = [ident("minecraft:zombie")].into_iter().collect();
        let items = BTreeSet::new();
        assert_eq!(tables.retain_known(&entities, &items), 2);
        assert_eq!(tables.loss_for_entity_kind(&ident("minecraft:zombie")), -3);
        assert_eq!(tables.loss_for_entity_kind(&ident("minecraft:creeper")), 0);
        assert_eq!(tables.gain_for_item(&ident("minecraft:cookie")), 0);
    }
}
