//! Core combat types: entities, actions, state, RNG, configuration.
//!
//! This module contains the building blocks every other component shares.
//! Hosts configure these via `CombatConfig` rather than modifying the core.

pub mod entity;
pub mod rng;
pub mod config;
pub mod action;
pub mod state;

pub use entity::{ability_modifier, Ability, AbilityScores, Attack, AttackKind, Entity, EntityId, OnHit, Role, Team};
pub use rng::GameRng;
pub use config::{AiConfig, CombatConfig, GridConfig};
pub use action::{Action, ActionEffect, ActionKind, ActionRecord, ActionSource};
pub use state::{CombatState, LogEntry, MessageCategory};
