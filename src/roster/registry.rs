//! Template registry for stat-block lookup.
//!
//! The `TemplateRegistry` stores every stat block an encounter may
//! instantiate, keyed by template name, along with equipment attacks and
//! the spell book. It is the stock `CharacterProvider`.

use rustc_hash::FxHashMap;

use crate::core::{Attack, Entity};
use crate::session::CharacterProvider;
use crate::spellcasting::SpellBook;

/// Registry of stat blocks.
///
/// ## Example
///
/// ```
/// use tactical_combat::core::{Attack, Entity, EntityId, Team};
/// use tactical_combat::dice::DiceExpr;
/// use tactical_combat::roster::TemplateRegistry;
/// use tactical_combat::session::CharacterProvider;
///
/// let mut registry = TemplateRegistry::new();
/// registry.register(
///     "kobold",
///     Entity::new(EntityId(0), "Kobold", Team::Enemy, 5, 12)
///         .with_attack(Attack::melee("Dagger", 4, DiceExpr::new(1, 4, 2))),
/// );
///
/// let kobold = registry.stat_block("kobold").unwrap();
/// assert_eq!(kobold.template, "kobold");
/// assert!(registry.stat_block("dragon").is_none());
/// ```
#[derive(Clone, Debug)]
pub struct TemplateRegistry {
    templates: FxHashMap<String, Entity>,
    equipment: FxHashMap<String, Vec<Attack>>,
    spells: SpellBook,
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self {
            templates: FxHashMap::default(),
            equipment: FxHashMap::default(),
            spells: SpellBook::standard(),
        }
    }
}

impl TemplateRegistry {
    /// Empty registry over the standard spell book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the spell book.
    #[must_use]
    pub fn with_spells(mut self, spells: SpellBook) -> Self {
        self.spells = spells;
        self
    }

    /// Register a stat block under `key`, returning the one it replaced.
    pub fn register(&mut self, key: impl Into<String>, entity: Entity) -> Option<Entity> {
        let key = key.into();
        let entity = entity.with_template(key.clone());
        self.templates.insert(key, entity)
    }

    /// Grant `key` an equipment attack on top of its stat block.
    pub fn equip(&mut self, key: impl Into<String>, attack: Attack) {
        self.equipment.entry(key.into()).or_default().push(attack);
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Entity> {
        self.templates.get(key)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.templates.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Registered template names, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl CharacterProvider for TemplateRegistry {
    fn stat_block(&self, key: &str) -> Option<Entity> {
        self.templates.get(key).cloned()
    }

    fn equipment_attacks(&self, key: &str) -> Vec<Attack> {
        self.equipment.get(key).cloned().unwrap_or_default()
    }

    fn spell_book(&self) -> SpellBook {
        self.spells.clone()
    }
}
