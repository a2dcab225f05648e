//! Spell resolution against one or more targets.

use serde::{Deserialize, Serialize};

use super::attack::hit_check;
use super::CombatResolver;
use crate::core::{Ability, Entity, EntityId};
use crate::dice::{roll_d20_with_mode, roll_d20_with_modifier, D20Roll, DiceRoll, DiceSource};
use crate::spellcasting::{Spell, SpellCasting, SpellEffect, SpellId, SpellResolution, StatusRider};

/// A target's saving throw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResult {
    pub ability: Ability,
    pub roll: D20Roll,
    pub dc: i32,
    pub success: bool,
}

/// What a spell did to one target.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOutcome {
    pub target: EntityId,
    /// Whether the spell reached the target at all. A successful save
    /// still counts (half damage).
    pub hit: bool,
    pub critical: bool,
    /// Spell attack roll, for attack-roll spells.
    pub attack_roll: Option<D20Roll>,
    pub save: Option<SaveResult>,
    pub damage: i32,
    pub healing: i32,
    /// Status to apply, already filtered by the save.
    pub status: Option<StatusRider>,
    pub text: String,
}

/// Result of casting one spell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellOutcome {
    pub caster: EntityId,
    pub spell: SpellId,
    pub targets: Vec<TargetOutcome>,
    /// "{caster} casts {spell}" header.
    pub text: String,
}

impl SpellOutcome {
    /// Header followed by one line per target.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.text.as_str()).chain(self.targets.iter().map(|t| t.text.as_str()))
    }

    #[must_use]
    pub fn total_damage(&self) -> i32 {
        self.targets.iter().map(|t| t.damage).sum()
    }
}

struct Landing {
    hit: bool,
    critical: bool,
    attack_roll: Option<D20Roll>,
    save: Option<SaveResult>,
}

impl CombatResolver {
    /// Resolve `spell` cast by `caster` on `targets`.
    ///
    /// Every landing check (attack roll or save) is made first, then the
    /// effect dice are rolled once and shared by every target, so an area
    /// spell deals the same base damage to all. A critical spell attack
    /// doubles the dice for that target only. A successful save halves
    /// damage (rounded down) and blocks the status rider. Healing adds the
    /// caster's spellcasting modifier when positive.
    ///
    /// Slots are not touched here; the caller consumes them.
    pub fn resolve_spell<D: DiceSource + ?Sized>(
        caster: &Entity,
        spell: &Spell,
        targets: &[&Entity],
        dice: &mut D,
    ) -> SpellOutcome {
        let landings: Vec<Landing> = targets
            .iter()
            .map(|target| Self::spell_landing(caster, target, spell, dice))
            .collect();

        let base: Option<DiceRoll> = match spell.effect {
            SpellEffect::Damage(expr) | SpellEffect::Healing(expr) if landings.iter().any(|l| l.hit) => {
                Some(expr.roll(dice))
            }
            _ => None,
        };

        let outcomes = targets
            .iter()
            .zip(landings)
            .map(|(target, landing)| Self::spell_target_outcome(caster, target, spell, landing, base.as_ref()))
            .collect();

        SpellOutcome {
            caster: caster.id,
            spell: spell.id.clone(),
            targets: outcomes,
            text: format!("{} casts {}", caster.name, spell.name),
        }
    }

    fn spell_landing<D: DiceSource + ?Sized>(
        caster: &Entity,
        target: &Entity,
        spell: &Spell,
        dice: &mut D,
    ) -> Landing {
        match spell.resolution {
            SpellResolution::AutoHit => Landing { hit: true, critical: false, attack_roll: None, save: None },
            SpellResolution::AttackRoll => {
                let bonus = caster.spell_attack_bonus() + caster.effects.aggregate().attack_bonus;
                let roll = roll_d20_with_mode(dice, bonus, Self::attack_mode(caster, target));
                let (hit, critical) = hit_check(&roll, target.armor_class);
                Landing { hit, critical, attack_roll: Some(roll), save: None }
            }
            SpellResolution::Save(ability) => {
                let dc = caster.spell_save_dc();
                let roll = roll_d20_with_modifier(dice, target.save_bonus(ability));
                let success = roll.total >= dc;
                Landing {
                    hit: true,
                    critical: false,
                    attack_roll: None,
                    save: Some(SaveResult { ability, roll, dc, success }),
                }
            }
        }
    }

    fn spell_target_outcome(
        caster: &Entity,
        target: &Entity,
        spell: &Spell,
        landing: Landing,
        base: Option<&DiceRoll>,
    ) -> TargetOutcome {
        let saved = landing.save.is_some_and(|s| s.success);

        let (damage, healing) = match (spell.effect, base) {
            (SpellEffect::Damage(_), Some(roll)) if landing.hit => {
                let full = roll.damage(landing.critical);
                (if saved { full / 2 } else { full }, 0)
            }
            (SpellEffect::Healing(_), Some(roll)) if landing.hit => {
                (0, roll.total.max(0) + caster.spellcasting_modifier().max(0))
            }
            _ => (0, 0),
        };

        let status = if landing.hit && !saved { spell.status } else { None };

        let mut text = match (&landing.attack_roll, &landing.save) {
            (Some(roll), _) if !landing.hit => {
                format!("{} misses {} ({} vs AC {})", spell.name, target.name, roll.total, target.armor_class)
            }
            (Some(roll), _) => format!(
                "{} {} {} ({} vs AC {})",
                spell.name,
                if landing.critical { "critically hits" } else { "hits" },
                target.name,
                roll.total,
                target.armor_class
            ),
            (None, Some(save)) => format!(
                "{} {} the {} save ({} vs DC {})",
                target.name,
                if save.success { "succeeds on" } else { "fails" },
                save.ability.abbreviation(),
                save.roll.total,
                save.dc
            ),
            (None, None) => format!("{} strikes {}", spell.name, target.name),
        };
        if damage > 0 {
            text.push_str(&format!(" for {damage} damage"));
        }
        if healing > 0 {
            text = format!("{} restores {} HP to {}", spell.name, healing, target.name);
        }
        if let Some(rider) = status {
            text.push_str(&format!(", {} for {} turns", rider.kind, rider.duration));
        }

        TargetOutcome {
            target: target.id,
            hit: landing.hit,
            critical: landing.critical,
            attack_roll: landing.attack_roll,
            save: landing.save,
            damage,
            healing,
            status,
            text,
        }
    }
}
