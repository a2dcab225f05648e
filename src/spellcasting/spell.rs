//! Spell definitions.

use serde::{Deserialize, Serialize};

use crate::core::Ability;
use crate::dice::DiceExpr;
use crate::effects::StatusEffectKind;
use crate::grid::AreaShape;

/// Spell identifier (snake_case key such as `"fire_bolt"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpellId(pub String);

impl SpellId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SpellId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for SpellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a spell decides whether it lands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellResolution {
    /// Spell attack roll against AC.
    AttackRoll,
    /// Always lands.
    AutoHit,
    /// Targets save against the caster's DC.
    Save(Ability),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellEffect {
    None,
    Damage(DiceExpr),
    Healing(DiceExpr),
}

/// Which side a spell may target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpellTarget {
    Opponent,
    Ally,
    SelfOnly,
}

impl SpellTarget {
    #[must_use]
    pub const fn is_friendly(self) -> bool {
        matches!(self, SpellTarget::Ally | SpellTarget::SelfOnly)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AreaSpec {
    pub shape: AreaShape,
    pub size: u32,
}

/// Status effect a spell attaches to the targets it affects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusRider {
    pub kind: StatusEffectKind,
    pub duration: u32,
}

/// A spell definition.
///
/// ```
/// use tactical_combat::core::Ability;
/// use tactical_combat::dice::DiceExpr;
/// use tactical_combat::grid::AreaShape;
/// use tactical_combat::spellcasting::{Spell, SpellTarget};
///
/// let fireball = Spell::new("fireball", "Fireball", 3, 8, SpellTarget::Opponent)
///     .with_save(Ability::Dexterity)
///     .with_damage(DiceExpr::new(8, 6, 0))
///     .with_area(AreaShape::Sphere, 1);
///
/// assert!(fireball.is_area());
/// assert!(!fireball.is_cantrip());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spell {
    pub id: SpellId,
    pub name: String,
    /// 0 for cantrips.
    pub level: u8,
    /// Cast range in grid cells.
    pub range: u32,
    pub resolution: SpellResolution,
    pub effect: SpellEffect,
    pub target: SpellTarget,
    #[serde(default)]
    pub area: Option<AreaSpec>,
    #[serde(default)]
    pub status: Option<StatusRider>,
}

impl Spell {
    /// An auto-hit spell with no effect yet.
    pub fn new(id: impl Into<String>, name: impl Into<String>, level: u8, range: u32, target: SpellTarget) -> Self {
        Self {
            id: SpellId::new(id),
            name: name.into(),
            level,
            range,
            resolution: SpellResolution::AutoHit,
            effect: SpellEffect::None,
            target,
            area: None,
            status: None,
        }
    }

    #[must_use]
    pub fn with_attack_roll(mut self) -> Self {
        self.resolution = SpellResolution::AttackRoll;
        self
    }

    #[must_use]
    pub fn with_save(mut self, ability: Ability) -> Self {
        self.resolution = SpellResolution::Save(ability);
        self
    }

    #[must_use]
    pub fn with_damage(mut self, dice: DiceExpr) -> Self {
        self.effect = SpellEffect::Damage(dice);
        self
    }

    #[must_use]
    pub fn with_healing(mut self, dice: DiceExpr) -> Self {
        self.effect = SpellEffect::Healing(dice);
        self
    }

    #[must_use]
    pub fn with_area(mut self, shape: AreaShape, size: u32) -> Self {
        self.area = Some(AreaSpec { shape, size });
        self
    }

    #[must_use]
    pub fn with_status(mut self, kind: StatusEffectKind, duration: u32) -> Self {
        self.status = Some(StatusRider { kind, duration });
        self
    }

    #[must_use]
    pub fn is_cantrip(&self) -> bool {
        self.level == 0
    }

    #[must_use]
    pub fn is_area(&self) -> bool {
        self.area.is_some()
    }

    #[must_use]
    pub fn is_healing(&self) -> bool {
        matches!(self.effect, SpellEffect::Healing(_))
    }

    #[must_use]
    pub fn is_damaging(&self) -> bool {
        matches!(self.effect, SpellEffect::Damage(_))
    }

    #[must_use]
    pub fn is_offensive(&self) -> bool {
        self.target == SpellTarget::Opponent
    }

    /// Distance from the caster at which the spell can take effect.
    ///
    /// Cones and lines start at the caster, so their reach is their size.
    #[must_use]
    pub fn reach(&self) -> u32 {
        match self.area {
            Some(area) if area.shape.is_directional() => area.size,
            _ => self.range,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spell_builder() {
        let spell = Spell::new("ray_of_frost", "Ray of Frost", 0, 6, SpellTarget::Opponent)
            .with_attack_roll()
            .with_damage(DiceExpr::new(1, 8, 0))
            .with_status(StatusEffectKind::Slowed, 2);

        assert!(spell.is_cantrip());
        assert!(spell.is_damaging());
        assert!(spell.is_offensive());
        assert_eq!(spell.resolution, SpellResolution::AttackRoll);
        assert_eq!(spell.status.map(|s| s.kind), Some(StatusEffectKind::Slowed));
    }

    #[test]
    fn test_reach_of_directional_area() {
        let cone = Spell::new("burning_hands", "Burning Hands", 1, 1, SpellTarget::Opponent)
            .with_area(AreaShape::Cone, 3);
        assert_eq!(cone.reach(), 3);

        let sphere = Spell::new("fireball", "Fireball", 3, 8, SpellTarget::Opponent)
            .with_area(AreaShape::Sphere, 1);
        assert_eq!(sphere.reach(), 8);
    }

    #[test]
    fn test_spell_id() {
        let id = SpellId::from("bless");
        assert_eq!(id.as_str(), "bless");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"bless\"");
    }

    #[test]
    fn test_spell_serialization() {
        let spell = Spell::new("cure_wounds", "Cure Wounds", 1, 1, SpellTarget::Ally)
            .with_healing(DiceExpr::new(1, 8, 0));
        let json = serde_json::to_string(&spell).unwrap();
        let back: Spell = serde_json::from_str(&json).unwrap();
        assert_eq!(spell, back);
    }
}
