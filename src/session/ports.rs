//! Collaborators the session talks to: narrative sink, HP sinks and the
//! character provider.

use crate::core::{Attack, Entity, MessageCategory};
use crate::resolver::HpChange;
use crate::spellcasting::SpellBook;

type MessageFn = Box<dyn FnMut(&str, MessageCategory)>;
type HpFn = Box<dyn FnMut(&HpChange)>;

/// Outbound callbacks, resolved once when the session is created.
///
/// Every port defaults to a no-op, so hosts only wire what they use.
///
/// ## Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
/// use tactical_combat::session::CombatPorts;
///
/// let lines = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&lines);
/// let mut ports = CombatPorts::new().with_message(move |text, _| sink.borrow_mut().push(text.to_string()));
///
/// ports.message("Goblin falls", tactical_combat::core::MessageCategory::Death);
/// assert_eq!(lines.borrow().as_slice(), ["Goblin falls"]);
/// ```
pub struct CombatPorts {
    on_message: MessageFn,
    on_party_hp: HpFn,
    on_enemy_hp: HpFn,
}

impl Default for CombatPorts {
    fn default() -> Self {
        Self {
            on_message: Box::new(|_, _| {}),
            on_party_hp: Box::new(|_| {}),
            on_enemy_hp: Box::new(|_| {}),
        }
    }
}

impl std::fmt::Debug for CombatPorts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombatPorts").finish_non_exhaustive()
    }
}

impl CombatPorts {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Narrative log sink.
    #[must_use]
    pub fn with_message(mut self, f: impl FnMut(&str, MessageCategory) + 'static) -> Self {
        self.on_message = Box::new(f);
        self
    }

    /// HP changes of the player and companions.
    #[must_use]
    pub fn with_party_hp(mut self, f: impl FnMut(&HpChange) + 'static) -> Self {
        self.on_party_hp = Box::new(f);
        self
    }

    /// HP changes of enemies.
    #[must_use]
    pub fn with_enemy_hp(mut self, f: impl FnMut(&HpChange) + 'static) -> Self {
        self.on_enemy_hp = Box::new(f);
        self
    }

    pub fn message(&mut self, text: &str, category: MessageCategory) {
        (self.on_message)(text, category);
    }

    /// Route an HP change to the sink for its team.
    pub fn hp_changed(&mut self, change: &HpChange) {
        if change.team.is_party() {
            (self.on_party_hp)(change);
        } else {
            (self.on_enemy_hp)(change);
        }
    }
}

/// Supplies stat blocks and equipment for the combatants of an encounter.
pub trait CharacterProvider {
    /// A fresh copy of the stat block registered under `key`.
    fn stat_block(&self, key: &str) -> Option<Entity>;

    /// Attacks granted by the equipment of `key`, added to the stat block's
    /// own attacks.
    fn equipment_attacks(&self, _key: &str) -> Vec<Attack> {
        Vec::new()
    }

    /// Spell definitions the encounter resolves spell ids against.
    fn spell_book(&self) -> SpellBook {
        SpellBook::standard()
    }
}
