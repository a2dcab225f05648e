//! Candidate action generation per priority bucket.

use smallvec::SmallVec;

use super::priority::Priority;
use crate::core::{Action, CombatState, Entity, EntityId};
use crate::grid::{area_of_effect, manhattan_distance, Direction, Position};
use crate::spellcasting::{Spell, SpellBook, SpellTarget};

/// A structurally valid action the planner may pick.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub action: Action,
    pub priority: Priority,
    /// Index of `priority` in the actor's list.
    pub bucket: usize,
    /// Distance from the actor to the cell the action must reach.
    pub distance: u32,
    /// Distance the action covers.
    pub reach: u32,
    /// HP fraction of the primary target.
    pub target_hp_fraction: f32,
}

impl Candidate {
    #[must_use]
    pub fn in_range(&self) -> bool {
        self.distance <= self.reach
    }
}

/// The bucket a spell falls into, if any.
#[must_use]
pub fn classify_spell(spell: &Spell) -> Option<Priority> {
    if spell.target.is_friendly() {
        if spell.is_healing() {
            Some(Priority::Heal)
        } else if spell.status.is_some() {
            Some(Priority::Buff)
        } else {
            None
        }
    } else if spell.is_area() {
        Some(Priority::AreaSpell)
    } else if spell.is_damaging() {
        Some(Priority::DamageSpell)
    } else if spell.status.is_some() {
        Some(Priority::ControlSpell)
    } else {
        None
    }
}

/// Living opponents of `caster` standing inside `spell`'s area when aimed
/// at `aim`, in roster order.
///
/// Spheres and circles are centered on the aim cell. Cones and lines start
/// at the caster and point toward it.
#[must_use]
pub fn area_targets(state: &CombatState, caster: &Entity, spell: &Spell, aim: Position) -> SmallVec<[EntityId; 4]> {
    let Some(area) = spell.area else {
        return SmallVec::new();
    };
    let cells = if area.shape.is_directional() {
        let Some(origin) = caster.position else {
            return SmallVec::new();
        };
        let Some(direction) = Direction::toward(origin, aim) else {
            return SmallVec::new();
        };
        area_of_effect(state.bounds(), area.shape, origin, area.size, direction)
    } else {
        area_of_effect(state.bounds(), area.shape, aim, area.size, Direction::North)
    };

    state
        .opponents_of(caster.team)
        .filter(|e| e.position.is_some_and(|p| cells.contains(&p)))
        .map(|e| e.id)
        .collect()
}

/// Every candidate `actor` has for `priority`.
///
/// Spells come from the actor's castable list, so a bucket whose spells
/// are out of slots (or silenced) yields nothing and the planner falls
/// through to the next one. Targets without a position are skipped.
#[must_use]
pub fn generate(state: &CombatState, book: &SpellBook, actor: &Entity, priority: Priority, bucket: usize) -> Vec<Candidate> {
    let Some(origin) = actor.position else {
        return Vec::new();
    };
    match priority {
        Priority::MeleeAttack | Priority::RangedAttack => {
            attack_candidates(state, actor, origin, priority, bucket)
        }
        _ => actor
            .castable_spells(book)
            .filter(|spell| classify_spell(spell) == Some(priority))
            .flat_map(|spell| spell_candidates(state, actor, origin, spell, priority, bucket))
            .collect(),
    }
}

fn attack_candidates(
    state: &CombatState,
    actor: &Entity,
    origin: Position,
    priority: Priority,
    bucket: usize,
) -> Vec<Candidate> {
    let want_melee = priority == Priority::MeleeAttack;
    let mut out = Vec::new();
    for (index, attack) in actor.attacks.iter().enumerate() {
        if attack.is_melee() != want_melee {
            continue;
        }
        for target in state.opponents_of(actor.team) {
            let Some(pos) = target.position else { continue };
            out.push(Candidate {
                action: Action::from_attack(actor.id, index, attack, target.id),
                priority,
                bucket,
                distance: manhattan_distance(origin, pos),
                reach: attack.range,
                target_hp_fraction: target.hp_fraction(),
            });
        }
    }
    out
}

fn spell_candidates(
    state: &CombatState,
    actor: &Entity,
    origin: Position,
    spell: &Spell,
    priority: Priority,
    bucket: usize,
) -> Vec<Candidate> {
    let single = |target: &Entity, pos: Position| Candidate {
        action: Action::from_spell(actor.id, spell, &[target.id], None),
        priority,
        bucket,
        distance: manhattan_distance(origin, pos),
        reach: spell.range,
        target_hp_fraction: target.hp_fraction(),
    };

    match priority {
        Priority::Heal | Priority::Buff => {
            let allies: Vec<&Entity> = if spell.target == SpellTarget::SelfOnly {
                vec![actor]
            } else {
                state.allies_of(actor.team).collect()
            };
            allies
                .into_iter()
                .filter(|ally| match priority {
                    Priority::Heal => ally.hp() < ally.max_hp(),
                    _ => spell.status.is_some_and(|rider| !ally.effects.has(rider.kind)),
                })
                .filter_map(|ally| ally.position.map(|pos| single(ally, pos)))
                .collect()
        }
        Priority::AreaSpell => state
            .opponents_of(actor.team)
            .filter_map(|target| {
                let aim = target.position?;
                let targets = area_targets(state, actor, spell, aim);
                if targets.is_empty() {
                    return None;
                }
                Some(Candidate {
                    action: Action::from_spell(actor.id, spell, &targets, Some(aim)),
                    priority,
                    bucket,
                    distance: manhattan_distance(origin, aim),
                    reach: spell.reach(),
                    target_hp_fraction: target.hp_fraction(),
                })
            })
            .collect(),
        Priority::ControlSpell => state
            .opponents_of(actor.team)
            .filter(|target| spell.status.is_some_and(|rider| !target.effects.has(rider.kind)))
            .filter_map(|target| target.position.map(|pos| single(target, pos)))
            .collect(),
        _ => state
            .opponents_of(actor.team)
            .filter_map(|target| target.position.map(|pos| single(target, pos)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Ability, Attack, Team};
    use crate::dice::DiceExpr;
    use crate::effects::StatusEffectKind;
    use crate::grid::GridBounds;
    use crate::spellcasting::{SpellId, SpellcastingProfile};

    fn spell(id: &str) -> Spell {
        SpellBook::standard().get(&SpellId::from(id)).cloned().unwrap()
    }

    #[test]
    fn test_classify_catalog() {
        assert_eq!(classify_spell(&spell("cure_wounds")), Some(Priority::Heal));
        assert_eq!(classify_spell(&spell("bless")), Some(Priority::Buff));
        assert_eq!(classify_spell(&spell("fire_bolt")), Some(Priority::DamageSpell));
        assert_eq!(classify_spell(&spell("ray_of_frost")), Some(Priority::DamageSpell));
        assert_eq!(classify_spell(&spell("fireball")), Some(Priority::AreaSpell));
        assert_eq!(classify_spell(&spell("burning_hands")), Some(Priority::AreaSpell));
        assert_eq!(classify_spell(&spell("hold_person")), Some(Priority::ControlSpell));
    }

    fn state_with(entities: Vec<Entity>) -> CombatState {
        let mut state = CombatState::new(GridBounds::default());
        for e in entities {
            state.add_entity(e);
        }
        state
    }

    #[test]
    fn test_attack_candidates_per_opponent() {
        let state = state_with(vec![
            Entity::new(EntityId(0), "Fighter", Team::Player, 28, 16)
                .at(Position::new(0, 2))
                .with_attack(Attack::melee("Longsword", 5, DiceExpr::new(1, 8, 3)))
                .with_attack(Attack::ranged("Handaxe", 5, DiceExpr::new(1, 6, 3), 4)),
            Entity::new(EntityId(0), "Goblin", Team::Enemy, 7, 15).at(Position::new(1, 2)),
            Entity::new(EntityId(0), "Goblin", Team::Enemy, 7, 15).at(Position::new(5, 2)),
            Entity::new(EntityId(0), "Dead", Team::Enemy, 7, 15).at(Position::new(6, 2)).with_hp(0),
        ]);
        let book = SpellBook::standard();
        let fighter = state.entity(EntityId(0)).unwrap();

        let melee = generate(&state, &book, fighter, Priority::MeleeAttack, 0);
        assert_eq!(melee.len(), 2);
        assert!(melee[0].in_range());
        assert!(!melee[1].in_range());

        let ranged = generate(&state, &book, fighter, Priority::RangedAttack, 1);
        assert_eq!(ranged.len(), 2);
        assert_eq!(ranged[1].distance, 5);
        assert_eq!(ranged[1].bucket, 1);
    }

    #[test]
    fn test_heal_targets_wounded_allies_only() {
        let state = state_with(vec![
            Entity::new(EntityId(0), "Cleric", Team::Companion, 22, 16)
                .at(Position::new(0, 3))
                .with_level(3)
                .with_spellcasting(SpellcastingProfile::new(Ability::Wisdom).with_slots(1, 2).with_prepared("cure_wounds")),
            Entity::new(EntityId(0), "Fighter", Team::Player, 28, 16).at(Position::new(0, 2)).with_hp(10),
            Entity::new(EntityId(0), "Wizard", Team::Companion, 16, 12).at(Position::new(1, 4)),
        ]);
        let cleric = state.entity(EntityId(0)).unwrap();

        let heals = generate(&state, &SpellBook::standard(), cleric, Priority::Heal, 0);
        assert_eq!(heals.len(), 1);
        assert_eq!(heals[0].action.primary_target(), Some(EntityId(1)));
        assert!(heals[0].action.is_defensive());
    }

    #[test]
    fn test_no_slots_no_candidates() {
        let state = state_with(vec![
            Entity::new(EntityId(0), "Cleric", Team::Companion, 22, 16)
                .at(Position::new(0, 3))
                .with_spellcasting(SpellcastingProfile::new(Ability::Wisdom).with_prepared("cure_wounds")),
            Entity::new(EntityId(0), "Fighter", Team::Player, 28, 16).at(Position::new(0, 2)).with_hp(10),
        ]);
        let cleric = state.entity(EntityId(0)).unwrap();
        assert!(generate(&state, &SpellBook::standard(), cleric, Priority::Heal, 0).is_empty());
    }

    #[test]
    fn test_control_skips_already_affected() {
        let mut held = Entity::new(EntityId(0), "Held", Team::Player, 10, 10).at(Position::new(1, 1));
        held.effects.apply(StatusEffectKind::Paralyzed, 2, None);
        let state = state_with(vec![
            Entity::new(EntityId(0), "Shaman", Team::Enemy, 20, 13)
                .at(Position::new(5, 1))
                .with_spellcasting(SpellcastingProfile::new(Ability::Wisdom).with_slots(2, 1).with_prepared("hold_person")),
            held,
            Entity::new(EntityId(0), "Free", Team::Player, 10, 10).at(Position::new(2, 1)),
        ]);
        let shaman = state.entity(EntityId(0)).unwrap();

        let control = generate(&state, &SpellBook::standard(), shaman, Priority::ControlSpell, 0);
        assert_eq!(control.len(), 1);
        assert_eq!(control[0].action.primary_target(), Some(EntityId(2)));
    }

    #[test]
    fn test_area_candidates_collect_clustered_opponents() {
        let state = state_with(vec![
            Entity::new(EntityId(0), "Wizard", Team::Companion, 16, 12)
                .at(Position::new(0, 2))
                .with_spellcasting(SpellcastingProfile::new(Ability::Intelligence).with_slots(3, 1).with_prepared("fireball")),
            Entity::new(EntityId(0), "Fighter", Team::Player, 28, 16).at(Position::new(4, 3)),
            Entity::new(EntityId(0), "Goblin", Team::Enemy, 7, 15).at(Position::new(5, 2)),
            Entity::new(EntityId(0), "Goblin", Team::Enemy, 7, 15).at(Position::new(5, 3)),
        ]);
        let wizard = state.entity(EntityId(0)).unwrap();

        let area = generate(&state, &SpellBook::standard(), wizard, Priority::AreaSpell, 0);
        assert_eq!(area.len(), 2);
        // allies inside the sphere are never targeted
        assert_eq!(area[0].action.targets.as_slice(), &[EntityId(2), EntityId(3)]);
        assert_eq!(area[0].action.aim, Some(Position::new(5, 2)));
    }

    #[test]
    fn test_cone_points_from_caster() {
        let state = state_with(vec![
            Entity::new(EntityId(0), "Wizard", Team::Companion, 16, 12).at(Position::new(2, 2)),
            Entity::new(EntityId(0), "Goblin", Team::Enemy, 7, 15).at(Position::new(3, 2)),
            Entity::new(EntityId(0), "Goblin", Team::Enemy, 7, 15).at(Position::new(4, 3)),
            Entity::new(EntityId(0), "Behind", Team::Enemy, 7, 15).at(Position::new(1, 2)),
        ]);
        let wizard = state.entity(EntityId(0)).unwrap();

        let hit = area_targets(&state, wizard, &spell("burning_hands"), Position::new(3, 2));
        assert_eq!(hit.as_slice(), &[EntityId(1), EntityId(2)]);
    }
}
