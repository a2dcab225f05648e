//! # tactical-combat
//!
//! A turn-based tactical combat engine for small party-vs-monsters fights
//! on a square grid.
//!
//! ## Design Principles
//!
//! 1. **Host-Driven**: The engine never blocks. Each call resolves one
//!    entity's turn and hands back a report; the player's turn suspends
//!    until the host submits a decision.
//!
//! 2. **Injectable Dice**: Every random roll goes through `DiceSource`, so
//!    tests script exact outcomes and hosts seed reproducible fights.
//!
//! 3. **Configuration Over Convention**: Grid size, AI scoring weights and
//!    the roster come from `CombatConfig` and a `CharacterProvider`.
//!
//! ## Architecture
//!
//! - **Resolve, then apply**: Attack and spell resolution is pure; the
//!   outcome is applied to `CombatState` in a separate step.
//!
//! - **Priority buckets**: The AI scores candidate actions by the bucket
//!   of the entity's priority list they came from, adjusted by situational
//!   bonuses.
//!
//! - **Persistent Logs**: Narrative log and action history use `im::Vector`
//!   so snapshots clone in O(1).
//!
//! ## Modules
//!
//! - `core`: Entities, actions, combat state, RNG, configuration
//! - `dice`: Dice expressions and injectable dice sources
//! - `grid`: Distance, bounds, reachability, area shapes
//! - `effects`: Status effects and start-of-turn ticking
//! - `spellcasting`: Spells, slots, the spell book
//! - `resolver`: Attack and spell resolution
//! - `ai`: Candidate generation, scoring, movement
//! - `turns`: Initiative order and phases
//! - `session`: The combat session the host drives
//! - `roster`: Stat-block registry and stock content

pub mod core;
pub mod dice;
pub mod grid;
pub mod effects;
pub mod spellcasting;
pub mod resolver;
pub mod ai;
pub mod turns;
pub mod session;
pub mod roster;
pub mod error;

// Re-export commonly used types
pub use crate::core::{
    Ability, AbilityScores, Attack, AttackKind, Entity, EntityId, Role, Team,
    Action, ActionKind, ActionRecord,
    CombatConfig, AiConfig, GridConfig,
    CombatState, LogEntry, MessageCategory,
    GameRng,
};

pub use crate::dice::{DiceExpr, DiceSource, ScriptedDice};

pub use crate::grid::{manhattan_distance, AreaShape, GridBounds, Position};

pub use crate::effects::{StatusEffectKind, StatusEffectRegistry};

pub use crate::spellcasting::{Spell, SpellBook, SpellCasting, SpellId, SpellcastingProfile};

pub use crate::resolver::{CombatResolver, HpChange};

pub use crate::ai::{AiPlanner, Priority};

pub use crate::turns::{CombatOutcome, Phase, TurnScheduler};

pub use crate::session::{
    CharacterProvider, CombatPorts, CombatSession,
    EncounterSpec, Participant, PendingDecision, PlayerChoice,
    TurnReport, TurnStatus,
};

pub use crate::roster::{reference_encounter, reference_party, reference_registry, TemplateRegistry};

pub use crate::error::{CombatError, Result};
