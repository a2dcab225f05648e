//! Action resolution.
//!
//! `CombatResolver` turns an attack or spell into an outcome using a
//! `DiceSource`, without touching any entity. Applying the outcome to the
//! `CombatState` is a separate step, so the planner can resolve
//! hypothetically and the session decides when results become real.

mod attack;
mod spell;
mod apply;

pub use attack::{hit_check, AttackOutcome};
pub use spell::{SaveResult, SpellOutcome, TargetOutcome};
pub use apply::HpChange;

/// Resolves attacks and spells.
pub struct CombatResolver;
