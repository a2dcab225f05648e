//! The uniform spellcasting interface shared by every entity category.

use serde::{Deserialize, Serialize};

use super::book::SpellBook;
use super::slots::SpellSlots;
use super::spell::{Spell, SpellId};
use crate::core::{Ability, Entity, Team};
use crate::error::CombatError;

/// `ceil(level / 4) + 1`.
#[must_use]
pub const fn proficiency_bonus(level: u32) -> i32 {
    level.div_ceil(4) as i32 + 1
}

/// An entity's spellcasting stats: ability, slots, spell lists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellcastingProfile {
    pub ability: Ability,
    #[serde(default)]
    pub slots: SpellSlots,
    #[serde(default)]
    pub cantrips: Vec<SpellId>,
    /// Leveled spells the caster may prepare.
    #[serde(default)]
    pub known: Vec<SpellId>,
    /// Leveled spells ready to cast.
    #[serde(default)]
    pub prepared: Vec<SpellId>,
    /// Pinned save DC from a monster stat block.
    #[serde(default)]
    pub fixed_save_dc: Option<i32>,
    /// Pinned spell attack bonus from a monster stat block.
    #[serde(default)]
    pub fixed_attack_bonus: Option<i32>,
}

impl SpellcastingProfile {
    #[must_use]
    pub fn new(ability: Ability) -> Self {
        Self {
            ability,
            slots: SpellSlots::new(),
            cantrips: Vec::new(),
            known: Vec::new(),
            prepared: Vec::new(),
            fixed_save_dc: None,
            fixed_attack_bonus: None,
        }
    }

    #[must_use]
    pub fn with_slots(mut self, level: u8, count: u8) -> Self {
        self.slots = self.slots.with_slots(level, count);
        self
    }

    #[must_use]
    pub fn with_cantrip(mut self, id: &str) -> Self {
        self.cantrips.push(SpellId::from(id));
        self
    }

    #[must_use]
    pub fn with_known(mut self, id: &str) -> Self {
        self.known.push(SpellId::from(id));
        self
    }

    /// Know and prepare a spell, bypassing the preparation limit.
    #[must_use]
    pub fn with_prepared(mut self, id: &str) -> Self {
        let id = SpellId::from(id);
        if !self.known.contains(&id) {
            self.known.push(id.clone());
        }
        self.prepared.push(id);
        self
    }

    #[must_use]
    pub fn with_fixed_save_dc(mut self, dc: i32) -> Self {
        self.fixed_save_dc = Some(dc);
        self
    }

    #[must_use]
    pub fn with_fixed_attack_bonus(mut self, bonus: i32) -> Self {
        self.fixed_attack_bonus = Some(bonus);
        self
    }

    /// Whether `spell` is on the ready list for its level.
    #[must_use]
    pub fn is_ready(&self, spell: &Spell) -> bool {
        if spell.is_cantrip() {
            self.cantrips.contains(&spell.id)
        } else {
            self.prepared.contains(&spell.id)
        }
    }

    /// Cantrips then prepared spells, in authored order.
    pub fn ready_spells(&self) -> impl Iterator<Item = &SpellId> {
        self.cantrips.iter().chain(self.prepared.iter())
    }
}

/// Uniform "can this entity cast, and how well" interface.
pub trait SpellCasting {
    /// Whether any spell can be cast right now.
    fn can_cast(&self, book: &SpellBook) -> bool;

    fn spellcasting_ability(&self) -> Option<Ability>;

    fn caster_level(&self) -> u32;

    /// Modifier of the spellcasting ability (0 without one).
    fn spellcasting_modifier(&self) -> i32;

    fn proficiency_bonus(&self) -> i32 {
        proficiency_bonus(self.caster_level())
    }

    fn spell_attack_bonus(&self) -> i32 {
        self.proficiency_bonus() + self.spellcasting_modifier()
    }

    fn spell_save_dc(&self) -> i32 {
        8 + self.proficiency_bonus() + self.spellcasting_modifier()
    }

    /// `level + max(1, ability modifier)`.
    fn max_prepared(&self) -> usize {
        (self.caster_level() as i32 + self.spellcasting_modifier().max(1)).max(0) as usize
    }

    /// Whether this particular spell can be cast right now.
    fn can_cast_spell(&self, spell: &Spell) -> bool;
}

impl SpellCasting for Entity {
    fn can_cast(&self, book: &SpellBook) -> bool {
        self.castable_spells(book).next().is_some()
    }

    fn spellcasting_ability(&self) -> Option<Ability> {
        self.spellcasting.as_ref().map(|p| p.ability)
    }

    fn caster_level(&self) -> u32 {
        self.level
    }

    fn spellcasting_modifier(&self) -> i32 {
        self.spellcasting_ability()
            .map_or(0, |ability| self.abilities.modifier(ability))
    }

    fn spell_attack_bonus(&self) -> i32 {
        let pinned = self.spellcasting.as_ref().and_then(|p| p.fixed_attack_bonus);
        match pinned {
            Some(bonus) if self.team == Team::Enemy => bonus,
            _ => self.proficiency_bonus() + self.spellcasting_modifier(),
        }
    }

    fn spell_save_dc(&self) -> i32 {
        let pinned = self.spellcasting.as_ref().and_then(|p| p.fixed_save_dc);
        match pinned {
            Some(dc) if self.team == Team::Enemy => dc,
            _ => 8 + self.proficiency_bonus() + self.spellcasting_modifier(),
        }
    }

    fn can_cast_spell(&self, spell: &Spell) -> bool {
        let Some(profile) = &self.spellcasting else {
            return false;
        };
        self.is_alive()
            && self.effects.aggregate().can_cast()
            && profile.is_ready(spell)
            && profile.slots.find_slot(spell.level).is_some()
    }
}

impl Entity {
    /// Spells castable right now, cantrips first, in authored order.
    pub fn castable_spells<'a>(&'a self, book: &'a SpellBook) -> impl Iterator<Item = &'a Spell> + 'a {
        self.spellcasting
            .iter()
            .flat_map(|profile| profile.ready_spells())
            .filter_map(|id| book.get(id))
            .filter(|spell| self.can_cast_spell(spell))
    }

    /// Move a known spell onto the prepared list.
    ///
    /// Already-prepared spells are accepted without change.
    pub fn prepare_spell(&mut self, id: &SpellId) -> Result<(), CombatError> {
        let max = self.max_prepared();
        let entity = self.id;
        let profile = self.spellcasting.as_mut().ok_or_else(|| CombatError::NoResourceAvailable {
            entity,
            what: "spellcasting".to_string(),
        })?;
        if profile.prepared.contains(id) {
            return Ok(());
        }
        if !profile.known.contains(id) {
            return Err(CombatError::SpellNotKnown { spell: id.clone() });
        }
        if profile.prepared.len() >= max {
            return Err(CombatError::PreparationLimit { max });
        }
        profile.prepared.push(id.clone());
        Ok(())
    }

    /// Refill all spell slots.
    pub fn restore_spell_slots(&mut self) {
        if let Some(profile) = &mut self.spellcasting {
            profile.slots.restore_all();
        }
    }
}
