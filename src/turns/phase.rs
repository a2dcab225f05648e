//! Session phases and outcomes.

use serde::{Deserialize, Serialize};

/// Where a combat session is in its lifecycle.
///
/// ```text
/// initializing -> initiative-display -> turn <-> player-movement
///                                        |  \-> executing-turn -> turn
///                                        v
///                                 victory | defeat
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    #[default]
    Initializing,
    /// Initiative rolled, order shown, no turn taken yet.
    InitiativeDisplay,
    /// Waiting on the current entity.
    Turn,
    /// The player is choosing a destination cell.
    PlayerMovement,
    /// An action is being resolved.
    ExecutingTurn,
    Victory,
    Defeat,
}

impl Phase {
    #[must_use]
    pub const fn is_ended(self) -> bool {
        matches!(self, Phase::Victory | Phase::Defeat)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Phase::Initializing => "initializing",
            Phase::InitiativeDisplay => "initiative-display",
            Phase::Turn => "turn",
            Phase::PlayerMovement => "player-movement",
            Phase::ExecutingTurn => "executing-turn",
            Phase::Victory => "victory",
            Phase::Defeat => "defeat",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a finished combat ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatOutcome {
    /// Every enemy is down.
    Victory,
    /// The player and every companion are down.
    Defeat,
}

impl CombatOutcome {
    #[must_use]
    pub const fn phase(self) -> Phase {
        match self {
            CombatOutcome::Victory => Phase::Victory,
            CombatOutcome::Defeat => Phase::Defeat,
        }
    }
}
