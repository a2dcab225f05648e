//! Spellcasting: spell definitions, the spell book, slots, and the
//! `SpellCasting` trait every entity category answers through.
//!
//! ## Design
//!
//! Party members derive their spell attack bonus and save DC from level
//! and ability. Enemy stat blocks may pin either value, as monster stat
//! blocks do, and the pinned value wins. Everything else (slots, cantrips,
//! prepared lists) works the same for every category, so the planner and
//! the resolver never branch on who is casting.
//!
//! ```
//! use tactical_combat::core::{Ability, AbilityScores, Entity, EntityId, Team};
//! use tactical_combat::spellcasting::{SpellBook, SpellCasting, SpellcastingProfile};
//!
//! let wizard = Entity::new(EntityId(2), "Wizard", Team::Companion, 16, 12)
//!     .with_level(3)
//!     .with_abilities(AbilityScores::new(8, 14, 12, 16, 12, 10))
//!     .with_spellcasting(
//!         SpellcastingProfile::new(Ability::Intelligence)
//!             .with_slots(1, 4)
//!             .with_cantrip("fire_bolt")
//!             .with_prepared("magic_missile"),
//!     );
//!
//! assert_eq!(wizard.spell_save_dc(), 13);
//! assert!(wizard.can_cast(&SpellBook::standard()));
//! ```

mod spell;
mod book;
mod slots;
mod caster;

pub use spell::{AreaSpec, Spell, SpellEffect, SpellId, SpellResolution, SpellTarget, StatusRider};
pub use book::SpellBook;
pub use slots::{SlotLevel, SpellSlots};
pub use caster::{proficiency_bonus, SpellCasting, SpellcastingProfile};
