//! The simulation loop.
//!
//! One wanderer lives through `ticks` ticks of alternating day and night.
//! Each day opens with a weather roll and a snack; storms bring a zombie
//! at dusk; the wanderer sleeps through the last part of each night. A
//! death respawns the wanderer with the death penalty, and at the
//! configured tick the tracker is saved to JSON text and reloaded, with
//! deferred starts replayed on login.

use paranoia_core::{
    ParanoiaConfig, Reactions, Registry, Sanity, SanityTables, Session, Target, TickContext,
};
use paranoia_types::Identifier;
use tracing::{debug, info, trace};

use crate::effects::demo_registry;
use crate::error::SimError;
use crate::world::{Wanderer, Weather, light_at};

/// Ticks spent asleep each night.
pub const SLEEP_TICKS: u64 = 100;

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Ticks simulated.
    pub ticks: u64,
    /// Sanity at the end of the run.
    pub final_sanity: i32,
    /// Temporary ceiling at the end of the run.
    pub final_temp_ceiling: i32,
    /// Days with a thunderstorm.
    pub storms: u64,
    /// Deaths and respawns.
    pub deaths: u32,
    /// Sanity attacks suffered across all lives.
    pub attacks: u32,
    /// Deferred callbacks replayed after reloads and respawns.
    pub replayed: usize,
    /// Save-and-reload cycles performed.
    pub reloads: u32,
}

/// Everything one run owns.
struct Simulation<'c> {
    config: &'c ParanoiaConfig,
    registry: Registry,
    tables: SanityTables,
    reactions: Reactions,
    sanity: Sanity,
    wanderer: Wanderer,
    weather: Weather,
    snack: Identifier,
    zombie: Identifier,
    summary: RunSummary,
}

/// Run the simulation described by `config`.
pub fn run(config: &ParanoiaConfig) -> Result<RunSummary, SimError> {
    let mut simulation = Simulation::new(config)?;
    for tick in 0..config.simulation.ticks {
        simulation.step(tick)?;
    }
    Ok(simulation.finish())
}

impl<'c> Simulation<'c> {
    fn new(config: &'c ParanoiaConfig) -> Result<Self, SimError> {
        let registry = demo_registry()?;
        let tables = SanityTables::from_config(&config.tables);
        let reactions = Reactions::new(config.rules.clone())?;
        let sanity = Sanity::with_scheduler(config.bounds.to_value()?, config.scheduler());
        info!(
            effects = registry.len(),
            sanity = sanity.current(),
            "Wanderer sets out"
        );
        Ok(Self {
            config,
            registry,
            tables,
            reactions,
            sanity,
            wanderer: Wanderer::new(config.simulation.health),
            weather: Weather::new(config.simulation.seed, config.simulation.thunder_chance),
            snack: Identifier::parse("minecraft:cookie")?,
            zombie: Identifier::parse("minecraft:zombie")?,
            summary: RunSummary {
                ticks: 0,
                final_sanity: 0,
                final_temp_ceiling: 0,
                storms: 0,
                deaths: 0,
                attacks: 0,
                replayed: 0,
                reloads: 0,
            },
        })
    }

    fn step(&mut self, tick: u64) -> Result<(), SimError> {
        let day_length = self.config.simulation.day_length_ticks.max(4);
        let phase = tick.checked_rem(day_length).unwrap_or(0);
        let dusk = day_length.checked_div(2).unwrap_or(0);
        let bedtime = day_length.saturating_sub(SLEEP_TICKS.min(day_length.checked_div(4).unwrap_or(0)));

        if phase == 0 {
            self.dawn();
        }
        if phase == dusk && self.weather.thundering() {
            let mut session = Session::live(&self.registry, &self.tables, &mut self.wanderer);
            self.reactions
                .on_damaged_by(&mut self.sanity, &self.zombie, &mut session);
        }
        if phase == bedtime && !self.reactions.is_sleeping(&self.sanity) {
            self.fall_asleep();
        }

        let context = TickContext::new(light_at(tick, day_length), self.wanderer.health())
            .with_thunder(self.weather.thundering());
        {
            let mut session = Session::live(&self.registry, &self.tables, &mut self.wanderer);
            self.sanity.tick(&context, &mut session);
        }

        if !self.wanderer.is_alive() {
            self.respawn()?;
        }
        if self.config.simulation.save_at_tick == Some(tick) {
            self.reload()?;
        }
        let interval = self.config.simulation.report_interval_ticks.max(1);
        if tick.checked_rem(interval) == Some(0) {
            info!(
                tick,
                sanity = self.sanity.current(),
                temp_ceiling = self.sanity.value().temp_ceiling(),
                light = context.light_level,
                thundering = context.thundering,
                health = self.wanderer.health(),
                "Progress"
            );
        }
        self.summary.ticks = tick.saturating_add(1);
        Ok(())
    }

    fn dawn(&mut self) {
        if self.reactions.is_sleeping(&self.sanity) {
            let mut session = Session::live(&self.registry, &self.tables, &mut self.wanderer);
            self.reactions.on_sleep_finished(&mut self.sanity, &mut session);
            self.reactions.on_wake(&mut self.sanity);
            debug!(sanity = self.sanity.current(), "Woke at dawn");
        }
        if self.weather.roll_day() {
            self.summary.storms = self.summary.storms.saturating_add(1);
            info!("A thunderstorm rolls in");
        }
        let mut session = Session::live(&self.registry, &self.tables, &mut self.wanderer);
        self.reactions
            .on_item_used(&mut self.sanity, &self.snack, &mut session);
    }

    fn fall_asleep(&mut self) {
        self.reactions.on_sleep_started(
            &mut self.sanity,
            Box::new(|context: &TickContext, target: &mut dyn Target| {
                trace!(light = context.light_level, alive = target.is_alive(), "Sleeping");
            }),
        );
    }

    fn respawn(&mut self) -> Result<(), SimError> {
        self.summary.attacks = self.summary.attacks.saturating_add(self.wanderer.attacks());
        self.wanderer = Wanderer::new(self.config.simulation.health);
        let mut respawned = Sanity::with_scheduler(self.config.bounds.to_value()?, self.config.scheduler());
        let mut session = Session::live(&self.registry, &self.tables, &mut self.wanderer);
        let replayed = self
            .reactions
            .on_respawn(&mut respawned, &self.sanity, true, &mut session)?;
        self.sanity = respawned;
        self.summary.replayed = self.summary.replayed.saturating_add(replayed);
        self.summary.deaths = self.summary.deaths.saturating_add(1);
        info!(
            sanity = self.sanity.current(),
            temp_ceiling = self.sanity.value().temp_ceiling(),
            "Wanderer respawned"
        );
        Ok(())
    }

    fn reload(&mut self) -> Result<(), SimError> {
        let text = serde_json::to_string(&self.sanity.to_json()?)?;
        info!(bytes = text.len(), "Sanity saved");

        let mut restored = Sanity::with_scheduler(self.config.bounds.to_value()?, self.config.scheduler());
        restored.from_json(serde_json::from_str(&text)?, &self.registry)?;
        let sleeping = self.reactions.is_sleeping(&self.sanity);
        self.sanity = restored;
        if sleeping {
            self.fall_asleep();
        }
        let replayed = self.reactions.on_login(&mut self.sanity, &mut self.wanderer);
        self.summary.replayed = self.summary.replayed.saturating_add(replayed);
        self.summary.reloads = self.summary.reloads.saturating_add(1);
        info!(replayed, sanity = self.sanity.current(), "Sanity reloaded");
        Ok(())
    }

    fn finish(mut self) -> RunSummary {
        self.summary.final_sanity = self.sanity.current();
        self.summary.final_temp_ceiling = self.sanity.value().temp_ceiling();
        self.summary.attacks = self.summary.attacks.saturating_add(self.wanderer.attacks());
        self.summary
    }
}
