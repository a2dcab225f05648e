//! Crate error type.
//!
//! Failures inside a running turn are recovered locally: the orchestrator
//! matches them, logs them at `warn` and turns them into a skipped action.
//! Only misuse of the public API reaches the caller as `Err`.

use thiserror::Error;

use crate::core::EntityId;
use crate::dice::DiceError;
use crate::grid::Position;
use crate::spellcasting::SpellId;

/// Why a move was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MovementRejection {
    OutOfBounds,
    Occupied,
    OutOfRange,
    /// Effects forbid moving this turn.
    Immobilized,
    /// The entity already moved this turn.
    AlreadyMoved,
}

impl std::fmt::Display for MovementRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MovementRejection::OutOfBounds => "out of bounds",
            MovementRejection::Occupied => "cell occupied",
            MovementRejection::OutOfRange => "beyond movement range",
            MovementRejection::Immobilized => "cannot move",
            MovementRejection::AlreadyMoved => "already moved this turn",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum CombatError {
    #[error("no living target in range for {actor}")]
    InvalidTarget { actor: EntityId },

    #[error("{entity} cannot move to {to}: {reason}")]
    InvalidMovement {
        entity: EntityId,
        to: Position,
        reason: MovementRejection,
    },

    #[error("{entity} has no resource for {what}")]
    NoResourceAvailable { entity: EntityId, what: String },

    #[error("{entity} is malformed: {reason}")]
    MalformedEntity { entity: EntityId, reason: &'static str },

    #[error(transparent)]
    Dice(#[from] DiceError),

    #[error("unknown template `{0}`")]
    UnknownTemplate(String),

    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),

    #[error("unknown spell `{0}`")]
    UnknownSpell(SpellId),

    #[error("`{spell}` is not known and cannot be prepared")]
    SpellNotKnown { spell: SpellId },

    #[error("cannot prepare more than {max} spells")]
    PreparationLimit { max: usize },

    #[error("no player decision is pending")]
    NotAwaitingPlayer,

    #[error("the session has already ended")]
    SessionEnded,

    #[error("encounter has no combatants")]
    EmptyEncounter,
}

pub type Result<T> = std::result::Result<T, CombatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CombatError::InvalidMovement {
            entity: EntityId(2),
            to: Position::new(9, 1),
            reason: MovementRejection::OutOfBounds,
        };
        assert_eq!(err.to_string(), "Entity(2) cannot move to (9, 1): out of bounds");

        let err = CombatError::PreparationLimit { max: 4 };
        assert_eq!(err.to_string(), "cannot prepare more than 4 spells");
    }

    #[test]
    fn test_dice_error_converts() {
        let err: CombatError = DiceError::Empty.into();
        assert!(matches!(err, CombatError::Dice(DiceError::Empty)));
    }
}
