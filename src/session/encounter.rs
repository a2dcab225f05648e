//! Encounter layout and participants.

use serde::{Deserialize, Serialize};

use crate::core::Team;
use crate::grid::{GridBounds, Position};

/// An enemy placed by the encounter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub template: String,
    pub position: Position,
    /// Display name override.
    #[serde(default)]
    pub name: Option<String>,
}

/// Battlefield and enemy layout of one fight.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncounterSpec {
    pub name: String,
    /// Grid size; falls back to the session config when absent.
    #[serde(default)]
    pub grid: Option<GridBounds>,
    #[serde(default)]
    pub enemies: Vec<Placement>,
    /// Starting cells for participants that don't bring their own, in
    /// participant order.
    #[serde(default)]
    pub party_slots: Vec<Position>,
}

impl EncounterSpec {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_grid(mut self, width: i32, height: i32) -> Self {
        self.grid = Some(GridBounds::new(width, height));
        self
    }

    #[must_use]
    pub fn with_enemy(mut self, template: impl Into<String>, position: Position) -> Self {
        self.enemies.push(Placement {
            template: template.into(),
            position,
            name: None,
        });
        self
    }

    #[must_use]
    pub fn with_named_enemy(mut self, template: impl Into<String>, name: impl Into<String>, position: Position) -> Self {
        self.enemies.push(Placement {
            template: template.into(),
            position,
            name: Some(name.into()),
        });
        self
    }

    #[must_use]
    pub fn with_party_slot(mut self, position: Position) -> Self {
        self.party_slots.push(position);
        self
    }
}

/// A party member joining the encounter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub template: String,
    pub team: Team,
    /// Explicit starting cell; otherwise the next party slot.
    #[serde(default)]
    pub position: Option<Position>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Participant {
    #[must_use]
    pub fn player(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            team: Team::Player,
            position: None,
            name: None,
        }
    }

    #[must_use]
    pub fn companion(template: impl Into<String>) -> Self {
        Self {
            team: Team::Companion,
            ..Self::player(template)
        }
    }

    #[must_use]
    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}
