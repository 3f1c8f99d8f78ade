//! The simulated wanderer and its surroundings.

use paranoia_core::Target;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

/// Health lost per sanity attack, in half-heart points.
pub const ATTACK_DAMAGE: f32 = 1.0;

/// The tracked entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Wanderer {
    health: f32,
    attacks: u32,
}

impl Wanderer {
    /// A wanderer at `health` half-hearts.
    pub const fn new(health: f32) -> Self {
        Self { health, attacks: 0 }
    }

    /// Current health in half-heart points.
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Attacks suffered so far.
    pub const fn attacks(&self) -> u32 {
        self.attacks
    }
}

impl Target for Wanderer {
    fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    fn sanity_attack(&mut self, level: i32) {
        self.health = (self.health - ATTACK_DAMAGE).max(0.0);
        self.attacks = self.attacks.saturating_add(1);
        if self.health > 0.0 {
            info!(level, health = self.health, "Something lunges from the dark");
        } else {
            warn!(level, "The wanderer succumbed");
        }
    }
}

/// Light level at `tick` for a day of `day_length` ticks.
///
/// The first half of the day is bright, the third quarter is dusk, and the
/// last quarter is full dark.
pub fn light_at(tick: u64, day_length: u64) -> u8 {
    let day_length = day_length.max(4);
    let phase = tick.checked_rem(day_length).unwrap_or(0);
    let quarter = day_length.checked_div(4).unwrap_or(1);
    match phase.checked_div(quarter).unwrap_or(0) {
        0 | 1 => 15,
        2 => 7,
        _ => 0,
    }
}

/// Seeded daily thunderstorm rolls.
#[derive(Debug)]
pub struct Weather {
    rng: StdRng,
    chance: f64,
    thundering: bool,
}

impl Weather {
    /// Weather seeded with `seed`, storming on a day with probability
    /// `chance`.
    pub fn new(seed: u64, chance: f64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            chance,
            thundering: false,
        }
    }

    /// Roll the weather for a new day. Returns whether it storms.
    pub fn roll_day(&mut self) -> bool {
        self.thundering = self.rng.random::<f64>() < self.chance;
        self.thundering
    }

    /// Whether a storm is in progress.
    pub const fn thundering(&self) -> bool {
        self.thundering
    }
}
