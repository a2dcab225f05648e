//! Committing resolved outcomes to the combat state.

use serde::{Deserialize, Serialize};

use super::attack::AttackOutcome;
use super::spell::SpellOutcome;
use super::CombatResolver;
use crate::core::{CombatState, EntityId, MessageCategory, Team};
use crate::effects::{ApplyOutcome, StatusEffectKind, StatusEffectRegistry};

/// An HP change actually applied to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HpChange {
    pub entity: EntityId,
    pub team: Team,
    /// Signed: negative for damage.
    pub delta: i32,
    pub hp: i32,
    pub max_hp: i32,
    /// Who caused it (`None` for periodic effects).
    pub source: Option<EntityId>,
}

impl HpChange {
    #[must_use]
    pub fn is_lethal(&self) -> bool {
        self.delta < 0 && self.hp == 0
    }
}

impl CombatResolver {
    /// Apply an attack outcome: log it, deal damage, attach the on-hit
    /// effect if the target survived.
    pub fn apply_attack(state: &mut CombatState, outcome: &AttackOutcome, turn: u32) -> Vec<HpChange> {
        state.push_log(turn, MessageCategory::Attack, outcome.text.clone());

        let mut changes = Vec::new();
        if let Some(change) = Self::apply_damage(state, outcome.target, outcome.damage, Some(outcome.attacker), turn) {
            changes.push(change);
        }
        if let Some(on_hit) = outcome.on_hit {
            Self::apply_status(state, outcome.target, on_hit.effect, on_hit.duration, outcome.attacker, turn);
        }
        changes
    }

    /// Apply a spell outcome target by target.
    pub fn apply_spell(state: &mut CombatState, outcome: &SpellOutcome, turn: u32) -> Vec<HpChange> {
        state.push_log(turn, MessageCategory::Spell, outcome.text.clone());

        let mut changes = Vec::new();
        for target in &outcome.targets {
            state.push_log(turn, MessageCategory::Spell, target.text.clone());
            if let Some(change) = Self::apply_damage(state, target.target, target.damage, Some(outcome.caster), turn) {
                changes.push(change);
            }
            if let Some(change) = Self::apply_healing(state, target.target, target.healing, outcome.caster) {
                changes.push(change);
            }
            if let Some(rider) = target.status {
                Self::apply_status(state, target.target, rider.kind, rider.duration, outcome.caster, turn);
            }
        }
        changes
    }

    fn apply_damage(
        state: &mut CombatState,
        target: EntityId,
        amount: i32,
        source: Option<EntityId>,
        turn: u32,
    ) -> Option<HpChange> {
        if amount <= 0 {
            return None;
        }
        let entity = state.entity_mut(target)?;
        if !entity.is_alive() {
            return None;
        }
        let lost = entity.take_damage(amount);
        let change = HpChange {
            entity: target,
            team: entity.team,
            delta: -lost,
            hp: entity.hp(),
            max_hp: entity.max_hp(),
            source,
        };
        let name = entity.name.clone();
        if change.is_lethal() {
            state.push_log(turn, MessageCategory::Death, format!("{name} falls"));
        }
        Some(change)
    }

    fn apply_healing(state: &mut CombatState, target: EntityId, amount: i32, source: EntityId) -> Option<HpChange> {
        if amount <= 0 {
            return None;
        }
        let entity = state.entity_mut(target)?;
        let gained = entity.heal(amount);
        (gained > 0).then(|| HpChange {
            entity: target,
            team: entity.team,
            delta: gained,
            hp: entity.hp(),
            max_hp: entity.max_hp(),
            source: Some(source),
        })
    }

    fn apply_status(
        state: &mut CombatState,
        target: EntityId,
        kind: StatusEffectKind,
        duration: u32,
        source: EntityId,
        turn: u32,
    ) {
        let Some(entity) = state.entity_mut(target) else {
            return;
        };
        if !entity.is_alive() {
            return;
        }
        let name = entity.name.clone();
        match StatusEffectRegistry::apply_effect(entity, kind, duration, Some(source)) {
            ApplyOutcome::Added | ApplyOutcome::Refreshed => {
                state.push_log(turn, MessageCategory::Status, format!("{name} is {kind}"));
            }
            ApplyOutcome::Ignored => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Attack, Entity};
    use crate::dice::{DiceExpr, ScriptedDice};
    use crate::grid::{GridBounds, Position};

    fn state() -> CombatState {
        let mut state = CombatState::new(GridBounds::default());
        state.add_entity(Entity::new(EntityId(0), "Spider", Team::Enemy, 26, 14).at(Position::new(1, 1)));
        state.add_entity(Entity::new(EntityId(0), "Fighter", Team::Player, 10, 16).at(Position::new(2, 1)));
        state
    }

    fn bite() -> Attack {
        Attack::melee("Bite", 5, DiceExpr::new(1, 8, 3)).with_on_hit(StatusEffectKind::Poisoned, 2)
    }

    #[test]
    fn test_apply_attack_damage_and_on_hit() {
        let mut state = state();
        let mut dice = ScriptedDice::new([15, 2]);
        let outcome = {
            let spider = state.entity(EntityId(0)).unwrap();
            let fighter = state.entity(EntityId(1)).unwrap();
            CombatResolver::resolve_attack(spider, fighter, &bite(), &mut dice)
        };

        let changes = CombatResolver::apply_attack(&mut state, &outcome, 1);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].delta, -5);
        assert_eq!(changes[0].hp, 5);

        let fighter = state.entity(EntityId(1)).unwrap();
        assert!(fighter.effects.has(StatusEffectKind::Poisoned));
        assert_eq!(state.log.len(), 2);
        assert_eq!(state.log[1].text, "Fighter is poisoned");
    }

    #[test]
    fn test_lethal_damage_logs_death_and_skips_effect() {
        let mut state = state();
        let mut dice = ScriptedDice::new([15, 8]);
        let outcome = {
            let spider = state.entity(EntityId(0)).unwrap();
            let fighter = state.entity(EntityId(1)).unwrap();
            CombatResolver::resolve_attack(spider, fighter, &bite(), &mut dice)
        };

        let changes = CombatResolver::apply_attack(&mut state, &outcome, 1);
        assert!(changes[0].is_lethal());
        // 11 damage against 10 HP
        assert_eq!(changes[0].delta, -10);

        let fighter = state.entity(EntityId(1)).unwrap();
        assert!(!fighter.is_alive());
        assert!(fighter.effects.is_empty());
        assert!(state.log.iter().any(|e| e.category == MessageCategory::Death));
    }

    #[test]
    fn test_miss_changes_nothing() {
        let mut state = state();
        let mut dice = ScriptedDice::new([2]);
        let outcome = {
            let spider = state.entity(EntityId(0)).unwrap();
            let fighter = state.entity(EntityId(1)).unwrap();
            CombatResolver::resolve_attack(spider, fighter, &bite(), &mut dice)
        };

        assert!(CombatResolver::apply_attack(&mut state, &outcome, 1).is_empty());
        assert_eq!(state.entity(EntityId(1)).unwrap().hp(), 10);
        assert_eq!(state.log.len(), 1);
    }
}
