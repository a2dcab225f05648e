//! Timed status effects.
//!
//! - `StatusEffectKind`: the catalog of effect types; each kind maps to a
//!   fixed `EffectModifiers` set
//! - `StatusEffects`: the per-entity collection (one instance per kind)
//! - `StatusEffectRegistry`: entity-level apply / tick / aggregate
//!
//! ## Stacking
//!
//! Re-applying a kind that is already active never adds a second entry.
//! The longer remaining duration wins.
//!
//! ## Ticking
//!
//! At the start of the bearer's turn every effect rolls its periodic
//! damage/healing, then counts down by one. An effect applied with
//! duration `n` therefore shapes the bearer's next `n - 1` turns.

mod status;
mod registry;

pub use status::{EffectModifiers, Periodic, StatusEffect, StatusEffectKind};
pub use registry::{AggregateModifiers, ApplyOutcome, EffectTick, StatusEffectRegistry, StatusEffects, TickReport};
