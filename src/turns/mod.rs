//! Turn scheduling.
//!
//! Initiative is rolled once at session start and the resulting order is
//! fixed for the whole fight. `TurnScheduler` walks that order, skipping
//! dead entries, and owns the session phase.

mod phase;
mod scheduler;

pub use phase::{CombatOutcome, Phase};
pub use scheduler::{roll_initiative, TurnAdvance, TurnEntry, TurnScheduler};
