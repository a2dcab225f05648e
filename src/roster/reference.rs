//! The stock roster and encounter used by demos and tests.

use crate::core::{Ability, AbilityScores, Attack, Entity, EntityId, Role, Team};
use crate::dice::DiceExpr;
use crate::effects::StatusEffectKind;
use crate::grid::Position;
use crate::session::{EncounterSpec, Participant};
use crate::spellcasting::SpellcastingProfile;

use super::registry::TemplateRegistry;

fn fighter() -> Entity {
    Entity::new(EntityId(0), "Fighter", Team::Player, 28, 16)
        .with_level(3)
        .with_abilities(AbilityScores::new(16, 12, 14, 10, 12, 10))
        .with_role(Role::Tank)
        .with_attack(Attack::melee("Longsword", 5, DiceExpr::new(1, 8, 3)))
        .with_role_priorities()
}

fn cleric() -> Entity {
    Entity::new(EntityId(0), "Cleric", Team::Companion, 22, 16)
        .with_level(3)
        .with_abilities(AbilityScores::new(14, 10, 14, 10, 16, 12))
        .with_role(Role::Healer)
        .with_attack(Attack::melee("Mace", 4, DiceExpr::new(1, 6, 2)))
        .with_spellcasting(
            SpellcastingProfile::new(Ability::Wisdom)
                .with_slots(1, 4)
                .with_slots(2, 2)
                .with_cantrip("sacred_flame")
                .with_prepared("cure_wounds")
                .with_prepared("healing_word")
                .with_prepared("bless")
                .with_prepared("hold_person"),
        )
        .with_role_priorities()
}

fn wizard() -> Entity {
    Entity::new(EntityId(0), "Wizard", Team::Companion, 16, 12)
        .with_level(3)
        .with_abilities(AbilityScores::new(8, 14, 12, 16, 12, 10))
        .with_role(Role::Artillery)
        .with_attack(Attack::ranged("Light Crossbow", 4, DiceExpr::new(1, 8, 2), 6))
        .with_spellcasting(
            SpellcastingProfile::new(Ability::Intelligence)
                .with_slots(1, 4)
                .with_slots(2, 2)
                .with_cantrip("fire_bolt")
                .with_cantrip("ray_of_frost")
                .with_prepared("magic_missile")
                .with_prepared("burning_hands"),
        )
        .with_role_priorities()
}

fn goblin() -> Entity {
    Entity::new(EntityId(0), "Goblin", Team::Enemy, 7, 15)
        .with_abilities(AbilityScores::new(8, 14, 10, 10, 8, 8))
        .with_role(Role::Striker)
        .with_attack(Attack::melee("Scimitar", 4, DiceExpr::new(1, 6, 2)))
        .with_movement(6)
        .with_role_priorities()
}

fn goblin_archer() -> Entity {
    Entity::new(EntityId(0), "Goblin Archer", Team::Enemy, 7, 13)
        .with_abilities(AbilityScores::new(8, 14, 10, 10, 8, 8))
        .with_role(Role::Skirmisher)
        .with_attack(Attack::ranged("Shortbow", 4, DiceExpr::new(1, 6, 2), 8))
        .with_movement(6)
        .with_role_priorities()
}

fn orc_shaman() -> Entity {
    Entity::new(EntityId(0), "Orc Shaman", Team::Enemy, 22, 13)
        .with_level(3)
        .with_abilities(AbilityScores::new(14, 10, 14, 8, 14, 10))
        .with_role(Role::Controller)
        .with_attack(Attack::melee("Quarterstaff", 4, DiceExpr::new(1, 6, 2)))
        .with_spellcasting(
            SpellcastingProfile::new(Ability::Wisdom)
                .with_fixed_save_dc(12)
                .with_fixed_attack_bonus(4)
                .with_slots(1, 2)
                .with_slots(2, 1)
                .with_cantrip("poison_spray")
                .with_prepared("burning_hands")
                .with_prepared("hold_person"),
        )
        .with_role_priorities()
}

fn giant_spider() -> Entity {
    Entity::new(EntityId(0), "Giant Spider", Team::Enemy, 26, 14)
        .with_level(2)
        .with_abilities(AbilityScores::new(14, 16, 12, 2, 11, 4))
        .with_role(Role::Striker)
        .with_attack(Attack::melee("Bite", 5, DiceExpr::new(1, 8, 3)).with_on_hit(StatusEffectKind::Poisoned, 3))
        .with_movement(6)
        .with_role_priorities()
}

/// Registry holding the stock stat blocks: `fighter`, `cleric`, `wizard`,
/// `goblin`, `goblin_archer`, `orc_shaman` and `giant_spider`.
#[must_use]
pub fn reference_registry() -> TemplateRegistry {
    let mut registry = TemplateRegistry::new();
    registry.register("fighter", fighter());
    registry.register("cleric", cleric());
    registry.register("wizard", wizard());
    registry.register("goblin", goblin());
    registry.register("goblin_archer", goblin_archer());
    registry.register("orc_shaman", orc_shaman());
    registry.register("giant_spider", giant_spider());
    registry
}

/// Goblin ambush on an 8×6 field: party on the left columns, four enemies
/// on the right.
#[must_use]
pub fn reference_encounter() -> EncounterSpec {
    EncounterSpec::new("Goblin Ambush")
        .with_grid(8, 6)
        .with_party_slot(Position::new(0, 2))
        .with_party_slot(Position::new(0, 3))
        .with_party_slot(Position::new(1, 4))
        .with_enemy("goblin", Position::new(5, 2))
        .with_enemy("goblin", Position::new(6, 3))
        .with_enemy("goblin_archer", Position::new(7, 1))
        .with_enemy("orc_shaman", Position::new(7, 4))
}

/// The player's fighter with a cleric and a wizard in tow.
#[must_use]
pub fn reference_party() -> Vec<Participant> {
    vec![
        Participant::player("fighter"),
        Participant::companion("cleric"),
        Participant::companion("wizard"),
    ]
}
