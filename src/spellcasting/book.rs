//! Spell registry for definition lookup.

use rustc_hash::FxHashMap;

use super::spell::{Spell, SpellId, SpellTarget};
use crate::core::Ability;
use crate::dice::DiceExpr;
use crate::effects::StatusEffectKind;
use crate::grid::AreaShape;

/// Registry of spell definitions.
///
/// ## Example
///
/// ```
/// use tactical_combat::spellcasting::{Spell, SpellBook, SpellId, SpellTarget};
///
/// let mut book = SpellBook::new();
/// book.register(Spell::new("light", "Light", 0, 1, SpellTarget::Ally));
///
/// assert!(book.contains(&SpellId::from("light")));
/// assert!(SpellBook::standard().get(&SpellId::from("fireball")).is_some());
/// ```
#[derive(Clone, Debug, Default)]
pub struct SpellBook {
    spells: FxHashMap<SpellId, Spell>,
}

impl SpellBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in catalog.
    #[must_use]
    pub fn standard() -> Self {
        let mut book = Self::new();
        for spell in standard_spells() {
            book.register(spell);
        }
        book
    }

    /// Register a spell, returning the definition it replaced.
    pub fn register(&mut self, spell: Spell) -> Option<Spell> {
        self.spells.insert(spell.id.clone(), spell)
    }

    #[must_use]
    pub fn get(&self, id: &SpellId) -> Option<&Spell> {
        self.spells.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &SpellId) -> bool {
        self.spells.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.spells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spells.is_empty()
    }

    /// Iterate over all spells (unordered).
    pub fn iter(&self) -> impl Iterator<Item = &Spell> {
        self.spells.values()
    }

    /// Find spells matching a predicate.
    pub fn find<F>(&self, predicate: F) -> impl Iterator<Item = &Spell>
    where
        F: Fn(&Spell) -> bool,
    {
        self.spells.values().filter(move |s| predicate(s))
    }
}

fn standard_spells() -> Vec<Spell> {
    vec![
        // Cantrips
        Spell::new("fire_bolt", "Fire Bolt", 0, 6, SpellTarget::Opponent)
            .with_attack_roll()
            .with_damage(DiceExpr::new(1, 10, 0)),
        Spell::new("ray_of_frost", "Ray of Frost", 0, 6, SpellTarget::Opponent)
            .with_attack_roll()
            .with_damage(DiceExpr::new(1, 8, 0))
            .with_status(StatusEffectKind::Slowed, 2),
        Spell::new("sacred_flame", "Sacred Flame", 0, 6, SpellTarget::Opponent)
            .with_save(Ability::Dexterity)
            .with_damage(DiceExpr::new(1, 8, 0)),
        Spell::new("poison_spray", "Poison Spray", 0, 2, SpellTarget::Opponent)
            .with_save(Ability::Constitution)
            .with_damage(DiceExpr::new(1, 12, 0))
            .with_status(StatusEffectKind::Poisoned, 2),
        // 1st level
        Spell::new("magic_missile", "Magic Missile", 1, 6, SpellTarget::Opponent)
            .with_damage(DiceExpr::new(3, 4, 3)),
        Spell::new("burning_hands", "Burning Hands", 1, 3, SpellTarget::Opponent)
            .with_save(Ability::Dexterity)
            .with_damage(DiceExpr::new(3, 6, 0))
            .with_area(AreaShape::Cone, 3),
        Spell::new("cure_wounds", "Cure Wounds", 1, 1, SpellTarget::Ally)
            .with_healing(DiceExpr::new(1, 8, 0)),
        Spell::new("healing_word", "Healing Word", 1, 6, SpellTarget::Ally)
            .with_healing(DiceExpr::new(1, 4, 0)),
        Spell::new("bless", "Bless", 1, 6, SpellTarget::Ally)
            .with_status(StatusEffectKind::Blessed, 3),
        // 2nd level
        Spell::new("hold_person", "Hold Person", 2, 6, SpellTarget::Opponent)
            .with_save(Ability::Wisdom)
            .with_status(StatusEffectKind::Paralyzed, 2),
        // 3rd level
        Spell::new("fireball", "Fireball", 3, 8, SpellTarget::Opponent)
            .with_save(Ability::Dexterity)
            .with_damage(DiceExpr::new(8, 6, 0))
            .with_area(AreaShape::Sphere, 1),
    ]
}
