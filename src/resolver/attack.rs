//! Weapon and natural attack resolution.

use serde::{Deserialize, Serialize};

use super::CombatResolver;
use crate::core::{Attack, Entity, EntityId, OnHit};
use crate::dice::{roll_d20_with_mode, D20Roll, DiceSource, RollMode};

/// Result of one attack roll.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackOutcome {
    pub attacker: EntityId,
    pub target: EntityId,
    pub roll: D20Roll,
    pub hit: bool,
    pub critical: bool,
    pub damage: i32,
    /// Effect to apply because the attack hit.
    pub on_hit: Option<OnHit>,
    pub text: String,
}

/// `(hit, critical)` for a d20 attack roll against `armor_class`.
///
/// A natural 20 always hits and is critical. Otherwise the attack hits
/// iff the total meets the AC. A natural 1 gets no special treatment.
#[must_use]
pub fn hit_check(roll: &D20Roll, armor_class: i32) -> (bool, bool) {
    let critical = roll.is_natural_20();
    (critical || roll.total >= armor_class, critical)
}

impl CombatResolver {
    /// Roll mode for `attacker` attacking `target`: effect disadvantage on
    /// the attacker, advantage against an incapacitated target.
    #[must_use]
    pub fn attack_mode(attacker: &Entity, target: &Entity) -> RollMode {
        let attacker_mods = attacker.effects.aggregate();
        let target_mods = target.effects.aggregate();
        RollMode::combine(target_mods.incapacitated, attacker_mods.attack_disadvantage)
    }

    /// Resolve `attack` from `attacker` against `target`.
    ///
    /// Damage dice are only rolled on a hit. Nothing is mutated.
    pub fn resolve_attack<D: DiceSource + ?Sized>(
        attacker: &Entity,
        target: &Entity,
        attack: &Attack,
        dice: &mut D,
    ) -> AttackOutcome {
        let bonus = attack.attack_bonus + attacker.effects.aggregate().attack_bonus;
        let roll = roll_d20_with_mode(dice, bonus, Self::attack_mode(attacker, target));
        let (hit, critical) = hit_check(&roll, target.armor_class);

        let damage = if hit {
            attack.damage.roll(dice).damage(critical)
        } else {
            0
        };

        let text = match (hit, critical) {
            (true, true) => format!(
                "{} critically hits {} with {} ({} vs AC {}) for {} damage",
                attacker.name, target.name, attack.name, roll.total, target.armor_class, damage
            ),
            (true, false) => format!(
                "{} hits {} with {} ({} vs AC {}) for {} damage",
                attacker.name, target.name, attack.name, roll.total, target.armor_class, damage
            ),
            _ => format!(
                "{} misses {} with {} ({} vs AC {})",
                attacker.name, target.name, attack.name, roll.total, target.armor_class
            ),
        };

        AttackOutcome {
            attacker: attacker.id,
            target: target.id,
            roll,
            hit,
            critical,
            damage,
            on_hit: if hit { attack.on_hit } else { None },
            text,
        }
    }
}
