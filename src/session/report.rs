//! What the session hands back to its host.

use serde::{Deserialize, Serialize};

use crate::core::{Action, Entity, EntityId, LogEntry};
use crate::error::CombatError;
use crate::grid::Position;
use crate::spellcasting::SpellId;
use crate::turns::{CombatOutcome, Phase, TurnEntry};

/// An action the player can submit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerChoice {
    /// Attack at this index of the player's attack list.
    Attack(usize),
    /// Single-target (or self) spell.
    Spell(SpellId),
    /// Area spell aimed at a cell.
    SpellAt(SpellId, Position),
    Pass,
}

/// One usable action with the targets it can currently reach.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionOption {
    pub choice: PlayerChoice,
    pub label: String,
    /// Living targets in range. Empty for area spells and passing.
    pub targets: Vec<EntityId>,
}

/// The player's turn, suspended until the host submits a choice.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingDecision {
    pub entity: EntityId,
    /// Cells the player may move to (empty once moved or when immobilized).
    pub reachable: Vec<Position>,
    pub options: Vec<ActionOption>,
    pub moved: bool,
    /// A choice the host has staged but not yet submitted.
    #[serde(default)]
    pub staged: Option<(PlayerChoice, Vec<EntityId>)>,
}

/// Why a turn passed without an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Dead,
    /// Missing stats or position.
    Malformed,
    /// Stunned or paralyzed.
    Incapacitated,
    /// Periodic damage at the start of the turn was lethal.
    DiedFromEffects,
}

/// How a turn ended.
#[derive(Clone, Debug, PartialEq)]
pub enum TurnStatus {
    Acted,
    Skipped(SkipReason),
    /// The chosen action was invalid; it was logged and the turn passed.
    ActionFailed(CombatError),
    /// Suspended on the player's decision.
    AwaitingPlayer,
    Ended(CombatOutcome),
}

/// Result of one orchestrator step.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnReport {
    /// Round the step happened in.
    pub turn: u32,
    pub actor: Option<EntityId>,
    pub status: TurnStatus,
    pub action: Option<Action>,
    pub moved_to: Option<Position>,
    /// Narrative lines emitted during the step.
    pub messages: Vec<String>,
    /// Phase after the step.
    pub phase: Phase,
}

impl TurnReport {
    #[must_use]
    pub fn is_awaiting_player(&self) -> bool {
        self.status == TurnStatus::AwaitingPlayer
    }

    /// Set once the fight is over, including on the step that ended it.
    #[must_use]
    pub fn outcome(&self) -> Option<CombatOutcome> {
        match self.phase {
            Phase::Victory => Some(CombatOutcome::Victory),
            Phase::Defeat => Some(CombatOutcome::Defeat),
            _ => None,
        }
    }
}

/// Serializable view of a running session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub turn_number: u32,
    pub current: Option<EntityId>,
    pub turn_order: Vec<TurnEntry>,
    pub entities: Vec<Entity>,
    pub pending: Option<PendingDecision>,
    pub log: Vec<LogEntry>,
}
