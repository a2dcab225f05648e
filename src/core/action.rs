//! Action representation: a tagged kind plus resolved targets.
//!
//! An action names its source (an attack slot on the actor, or a spell id),
//! carries the numbers the planner scores it by (range, damage/healing dice,
//! saving throw) and the target set it was built against. The resolver
//! looks the source up again at execution time, so a stale action simply
//! fails validation instead of resolving against outdated numbers.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::entity::{Ability, Attack, AttackKind, EntityId};
use crate::dice::DiceExpr;
use crate::grid::Position;
use crate::spellcasting::{Spell, SpellEffect, SpellId, SpellResolution};

/// What kind of action this is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Melee,
    Ranged,
    /// Offensive spell.
    Spell,
    /// Healing or buffing spell aimed at allies.
    Support,
    /// The "pass turn" sentinel.
    Pass,
}

/// Where the action's numbers come from.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSource {
    None,
    /// Index into the actor's attack list.
    Attack(usize),
    Spell(SpellId),
}

/// Damage or healing carried by an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionEffect {
    None,
    Damage(DiceExpr),
    Healing(DiceExpr),
}

/// A complete combat action.
///
/// ## Example
///
/// ```
/// use tactical_combat::core::{Action, ActionKind, Attack, EntityId};
/// use tactical_combat::dice::DiceExpr;
///
/// let sword = Attack::melee("Longsword", 5, DiceExpr::new(1, 8, 3));
/// let action = Action::from_attack(EntityId(0), 0, &sword, EntityId(4));
///
/// assert_eq!(action.kind, ActionKind::Melee);
/// assert_eq!(action.primary_target(), Some(EntityId(4)));
/// assert!(Action::pass(EntityId(0)).is_pass());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub actor: EntityId,
    pub kind: ActionKind,
    pub source: ActionSource,
    /// Reach in grid cells.
    pub range: u32,
    pub effect: ActionEffect,
    /// Ability the targets save with, if the action allows a save.
    pub save: Option<Ability>,
    /// Resolved target set.
    /// SmallVec avoids heap allocation for the common 1-4 targets.
    pub targets: SmallVec<[EntityId; 4]>,
    /// Aim cell for area actions.
    pub aim: Option<Position>,
}

impl Action {
    /// The "pass turn" sentinel.
    #[must_use]
    pub fn pass(actor: EntityId) -> Self {
        Self {
            actor,
            kind: ActionKind::Pass,
            source: ActionSource::None,
            range: 0,
            effect: ActionEffect::None,
            save: None,
            targets: SmallVec::new(),
            aim: None,
        }
    }

    /// Use the attack at `index` in the actor's attack list against `target`.
    #[must_use]
    pub fn from_attack(actor: EntityId, index: usize, attack: &Attack, target: EntityId) -> Self {
        let kind = match attack.kind {
            AttackKind::Melee => ActionKind::Melee,
            AttackKind::Ranged => ActionKind::Ranged,
        };
        let mut targets = SmallVec::new();
        targets.push(target);
        Self {
            actor,
            kind,
            source: ActionSource::Attack(index),
            range: attack.range,
            effect: ActionEffect::Damage(attack.damage),
            save: None,
            targets,
            aim: None,
        }
    }

    /// Cast `spell` on `targets`, optionally aimed at a cell.
    #[must_use]
    pub fn from_spell(actor: EntityId, spell: &Spell, targets: &[EntityId], aim: Option<Position>) -> Self {
        let kind = if spell.target.is_friendly() {
            ActionKind::Support
        } else {
            ActionKind::Spell
        };
        let effect = match spell.effect {
            SpellEffect::Damage(dice) => ActionEffect::Damage(dice),
            SpellEffect::Healing(dice) => ActionEffect::Healing(dice),
            SpellEffect::None => ActionEffect::None,
        };
        let save = match spell.resolution {
            SpellResolution::Save(ability) => Some(ability),
            _ => None,
        };
        Self {
            actor,
            kind,
            source: ActionSource::Spell(spell.id.clone()),
            range: spell.range,
            effect,
            save,
            targets: SmallVec::from_slice(targets),
            aim,
        }
    }

    #[must_use]
    pub fn is_pass(&self) -> bool {
        self.kind == ActionKind::Pass
    }

    /// Damaging or hindering the other side.
    #[must_use]
    pub fn is_offensive(&self) -> bool {
        matches!(self.kind, ActionKind::Melee | ActionKind::Ranged | ActionKind::Spell)
    }

    /// Healing or buffing the own side.
    #[must_use]
    pub fn is_defensive(&self) -> bool {
        self.kind == ActionKind::Support
    }

    #[must_use]
    pub fn primary_target(&self) -> Option<EntityId> {
        self.targets.first().copied()
    }
}

/// A committed action with metadata for history tracking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub actor: EntityId,
    pub action: Action,
    /// Round number when the action was taken.
    pub turn: u32,
    /// Session-wide sequence number (for ordering).
    pub sequence: u32,
}

impl ActionRecord {
    #[must_use]
    pub fn new(actor: EntityId, action: Action, turn: u32, sequence: u32) -> Self {
        Self {
            actor,
            action,
            turn,
            sequence,
        }
    }
}
