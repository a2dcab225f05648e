//! Combat configuration types.
//!
//! Hosts configure a session at startup by providing:
//! - `GridConfig`: battlefield dimensions
//! - `AiConfig`: scoring constants for the AI planner
//! - `CombatConfig`: combines all configuration
//!
//! All types derive serde so hosts can load them from JSON or TOML.

use serde::{Deserialize, Serialize};

use crate::grid::GridBounds;

/// Battlefield dimensions. Defaults to the 8×6 reference layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    pub width: i32,
    pub height: i32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { width: 8, height: 6 }
    }
}

impl GridConfig {
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub const fn bounds(&self) -> GridBounds {
        GridBounds::new(self.width, self.height)
    }
}

/// Scoring constants for the AI planner.
///
/// A candidate in priority bucket `i` starts at
/// `base_score - bucket_step * i` and is then adjusted by the bonuses below.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub base_score: i32,
    pub bucket_step: i32,

    /// Targets below this HP fraction earn `low_hp_bonus`.
    pub low_hp_threshold: f32,
    pub low_hp_bonus: i32,

    /// Area actions earn this when more than one opponent is alive.
    pub multi_enemy_bonus: i32,

    pub in_range_bonus: i32,
    /// Subtracted when the target lies beyond the action's range.
    pub out_of_range_penalty: i32,

    /// Below this own-HP fraction, defensive actions earn `self_preservation_bonus`.
    pub self_low_hp_threshold: f32,
    pub self_preservation_bonus: i32,

    /// Above this own-HP fraction, offensive actions earn `aggression_bonus`.
    pub self_high_hp_threshold: f32,
    pub aggression_bonus: i32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            base_score: 100,
            bucket_step: 15,
            low_hp_threshold: 0.5,
            low_hp_bonus: 20,
            multi_enemy_bonus: 10,
            in_range_bonus: 10,
            out_of_range_penalty: 50,
            self_low_hp_threshold: 0.3,
            self_preservation_bonus: 25,
            self_high_hp_threshold: 0.8,
            aggression_bonus: 10,
        }
    }
}

impl AiConfig {
    #[must_use]
    pub fn with_low_hp_threshold(mut self, threshold: f32) -> Self {
        self.low_hp_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_bucket_step(mut self, step: i32) -> Self {
        self.bucket_step = step;
        self
    }

    #[must_use]
    pub fn with_out_of_range_penalty(mut self, penalty: i32) -> Self {
        self.out_of_range_penalty = penalty;
        self
    }
}

/// Complete session configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    pub grid: GridConfig,
    pub ai: AiConfig,

    /// Cap on the preferred distance of ranged combatants.
    pub max_ideal_range: u32,

    /// Seed for the default `GameRng` dice source.
    pub seed: u64,

    /// Let the AI planner drive the player-controlled entity too.
    pub autoplay_player: bool,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            ai: AiConfig::default(),
            max_ideal_range: 4,
            seed: 42,
            autoplay_player: false,
        }
    }
}

impl CombatConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_grid(mut self, width: i32, height: i32) -> Self {
        self.grid = GridConfig::new(width, height);
        self
    }

    #[must_use]
    pub fn with_ai(mut self, ai: AiConfig) -> Self {
        self.ai = ai;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_max_ideal_range(mut self, range: u32) -> Self {
        self.max_ideal_range = range;
        self
    }

    #[must_use]
    pub fn with_autoplay_player(mut self, autoplay: bool) -> Self {
        self.autoplay_player = autoplay;
        self
    }
}
