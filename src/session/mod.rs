//! Combat session orchestration.
//!
//! A [`CombatSession`] owns the roster, the initiative order, the dice and
//! the host's callbacks. The host drives it one step at a time:
//!
//! 1. [`CombatSession::advance_turn`] resolves AI turns and suspends on the
//!    player's turn with a [`PendingDecision`].
//! 2. The host optionally moves the player
//!    ([`CombatSession::submit_player_move`]) and then submits an action
//!    ([`CombatSession::submit_player_action`]).
//! 3. Repeat until the session reaches `victory` or `defeat`.
//!
//! Nothing in this module blocks or sleeps; presentation pacing belongs to
//! the host.

mod encounter;
mod orchestrator;
mod ports;
mod report;

pub use encounter::{EncounterSpec, Participant, Placement};
pub use orchestrator::CombatSession;
pub use ports::{CharacterProvider, CombatPorts};
pub use report::{ActionOption, PendingDecision, PlayerChoice, SessionSnapshot, SkipReason, TurnReport, TurnStatus};
