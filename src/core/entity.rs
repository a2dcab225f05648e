//! Combatant identity and stat blocks.
//!
//! Every combatant in a session has a unique `EntityId` allocated when it
//! is cloned from its template into the session.
//!
//! ## Usage
//!
//! ```
//! use tactical_combat::core::{Entity, EntityId, Team};
//! use tactical_combat::grid::Position;
//!
//! let mut goblin = Entity::new(EntityId(3), "Goblin", Team::Enemy, 7, 15)
//!     .at(Position::new(5, 2));
//!
//! assert_eq!(goblin.take_damage(10), 7);
//! assert_eq!(goblin.hp(), 0);
//! assert!(!goblin.is_alive());
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ai::Priority;
use crate::dice::DiceExpr;
use crate::effects::{StatusEffectKind, StatusEffects};
use crate::grid::Position;
use crate::spellcasting::SpellcastingProfile;

/// Unique identifier for a combatant within one session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for EntityId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// Team/category of a combatant.
///
/// `Player` and `Companion` form the party; `Enemy` is the opposing side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Player,
    Companion,
    Enemy,
}

impl Team {
    /// Whether this team belongs to the party side.
    #[must_use]
    pub const fn is_party(self) -> bool {
        matches!(self, Team::Player | Team::Companion)
    }

    /// Whether `other` fights on the same side.
    #[must_use]
    pub const fn is_ally_of(self, other: Team) -> bool {
        self.is_party() == other.is_party()
    }

    /// Whether `other` fights on the opposing side.
    #[must_use]
    pub const fn is_opponent_of(self, other: Team) -> bool {
        !self.is_ally_of(other)
    }

    /// Initiative tie-break rank (lower acts first).
    #[must_use]
    pub const fn initiative_rank(self) -> u8 {
        match self {
            Team::Player => 0,
            Team::Companion => 1,
            Team::Enemy => 2,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Team::Player => "player",
            Team::Companion => "companion",
            Team::Enemy => "enemy",
        };
        f.write_str(s)
    }
}

/// One of the six abilities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    /// Short uppercase label ("STR", "DEX", ...).
    #[must_use]
    pub const fn abbreviation(self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }
}

impl FromStr for Ability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "str" | "strength" => Ok(Ability::Strength),
            "dex" | "dexterity" => Ok(Ability::Dexterity),
            "con" | "constitution" => Ok(Ability::Constitution),
            "int" | "intelligence" => Ok(Ability::Intelligence),
            "wis" | "wisdom" => Ok(Ability::Wisdom),
            "cha" | "charisma" => Ok(Ability::Charisma),
            other => Err(format!("unknown ability `{other}`")),
        }
    }
}

/// Modifier for an ability score: `floor((score - 10) / 2)`.
#[must_use]
pub const fn ability_modifier(score: i32) -> i32 {
    (score - 10).div_euclid(2)
}

/// The six ability scores of a stat block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::uniform(10)
    }
}

impl AbilityScores {
    /// All six scores set to the same value.
    #[must_use]
    pub const fn uniform(score: i32) -> Self {
        Self {
            strength: score,
            dexterity: score,
            constitution: score,
            intelligence: score,
            wisdom: score,
            charisma: score,
        }
    }

    /// Scores in STR, DEX, CON, INT, WIS, CHA order.
    #[must_use]
    pub const fn new(str_: i32, dex: i32, con: i32, int: i32, wis: i32, cha: i32) -> Self {
        Self {
            strength: str_,
            dexterity: dex,
            constitution: con,
            intelligence: int,
            wisdom: wis,
            charisma: cha,
        }
    }

    #[must_use]
    pub const fn score(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }

    #[must_use]
    pub const fn modifier(&self, ability: Ability) -> i32 {
        ability_modifier(self.score(ability))
    }
}

/// Combat role tag. Roles seed a default priority list for templates
/// that do not author one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Tank,
    #[default]
    Striker,
    Skirmisher,
    Healer,
    Controller,
    Artillery,
}

/// Delivery of an innate attack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackKind {
    Melee,
    Ranged,
}

/// Status effect inflicted when an attack hits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnHit {
    pub effect: StatusEffectKind,
    pub duration: u32,
}

/// An innate or equipment-granted attack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attack {
    pub name: String,
    pub kind: AttackKind,
    /// To-hit bonus added to the d20.
    pub attack_bonus: i32,
    /// Damage dice including the flat bonus.
    pub damage: DiceExpr,
    /// Reach in grid cells (Manhattan).
    pub range: u32,
    #[serde(default)]
    pub on_hit: Option<OnHit>,
}

impl Attack {
    /// Melee attack with a reach of one cell.
    pub fn melee(name: impl Into<String>, attack_bonus: i32, damage: DiceExpr) -> Self {
        Self {
            name: name.into(),
            kind: AttackKind::Melee,
            attack_bonus,
            damage,
            range: 1,
            on_hit: None,
        }
    }

    /// Ranged attack reaching `range` cells.
    pub fn ranged(name: impl Into<String>, attack_bonus: i32, damage: DiceExpr, range: u32) -> Self {
        Self {
            name: name.into(),
            kind: AttackKind::Ranged,
            attack_bonus,
            damage,
            range,
            on_hit: None,
        }
    }

    /// Inflict `effect` for `duration` turns on a hit (builder pattern).
    #[must_use]
    pub fn with_on_hit(mut self, effect: StatusEffectKind, duration: u32) -> Self {
        self.on_hit = Some(OnHit { effect, duration });
        self
    }

    #[must_use]
    pub fn is_melee(&self) -> bool {
        self.kind == AttackKind::Melee
    }
}

/// A combatant's full stat block plus its live combat state.
///
/// HP is private so that `0 <= hp <= max_hp` holds after every mutation.
/// An entity at 0 HP is dead: healing no longer applies to it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    /// Key of the template this entity was cloned from.
    #[serde(default)]
    pub template: String,
    pub team: Team,
    #[serde(default)]
    pub role: Role,
    pub level: u32,
    pub abilities: AbilityScores,
    hp: i32,
    max_hp: i32,
    pub armor_class: i32,
    pub position: Option<Position>,
    #[serde(default)]
    pub attacks: Vec<Attack>,
    #[serde(default)]
    pub spellcasting: Option<SpellcastingProfile>,
    /// Ordered action-priority buckets for the AI planner.
    #[serde(default)]
    pub priorities: Vec<Priority>,
    #[serde(default)]
    pub effects: StatusEffects,
    /// Movement range in cells per turn.
    pub movement: u32,
}

impl Entity {
    /// Create a level-1 entity at full HP with no position.
    pub fn new(id: EntityId, name: impl Into<String>, team: Team, max_hp: i32, armor_class: i32) -> Self {
        let max_hp = max_hp.max(0);
        Self {
            id,
            name: name.into(),
            template: String::new(),
            team,
            role: Role::default(),
            level: 1,
            abilities: AbilityScores::default(),
            hp: max_hp,
            max_hp,
            armor_class,
            position: None,
            attacks: Vec::new(),
            spellcasting: None,
            priorities: Vec::new(),
            effects: StatusEffects::new(),
            movement: 5,
        }
    }

    #[must_use]
    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    #[must_use]
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub fn with_abilities(mut self, abilities: AbilityScores) -> Self {
        self.abilities = abilities;
        self
    }

    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    #[must_use]
    pub fn with_attack(mut self, attack: Attack) -> Self {
        self.attacks.push(attack);
        self
    }

    #[must_use]
    pub fn with_spellcasting(mut self, profile: SpellcastingProfile) -> Self {
        self.spellcasting = Some(profile);
        self
    }

    #[must_use]
    pub fn with_priorities(mut self, priorities: impl IntoIterator<Item = Priority>) -> Self {
        self.priorities = priorities.into_iter().collect();
        self
    }

    /// Use the role's default priority list.
    #[must_use]
    pub fn with_role_priorities(mut self) -> Self {
        self.priorities = self.role.default_priorities();
        self
    }

    #[must_use]
    pub fn with_movement(mut self, movement: u32) -> Self {
        self.movement = movement;
        self
    }

    /// Start the entity below full HP (clamped).
    #[must_use]
    pub fn with_hp(mut self, hp: i32) -> Self {
        self.set_hp(hp);
        self
    }

    // === Hit points ===

    #[must_use]
    pub fn hp(&self) -> i32 {
        self.hp
    }

    #[must_use]
    pub fn max_hp(&self) -> i32 {
        self.max_hp
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Current HP as a fraction of max HP (0.0 for a zero-HP stat block).
    #[must_use]
    pub fn hp_fraction(&self) -> f32 {
        if self.max_hp <= 0 {
            0.0
        } else {
            self.hp as f32 / self.max_hp as f32
        }
    }

    /// Set HP directly, clamped to `[0, max_hp]`.
    pub fn set_hp(&mut self, hp: i32) {
        self.hp = hp.clamp(0, self.max_hp.max(0));
    }

    /// Pull HP back into `0 <= hp <= max_hp` after deserialization, which
    /// skips the checks in [`Entity::new`].
    pub fn normalize_hp(&mut self) {
        self.max_hp = self.max_hp.max(0);
        self.hp = self.hp.clamp(0, self.max_hp);
    }

    /// Apply damage. Negative amounts are ignored.
    ///
    /// Returns the HP actually lost.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let before = self.hp;
        self.hp = self.hp.saturating_sub(amount.max(0)).max(0);
        before - self.hp
    }

    /// Apply healing to a living entity. Negative amounts are ignored.
    ///
    /// Returns the HP actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        if !self.is_alive() {
            return 0;
        }
        let before = self.hp;
        self.hp = self.hp.saturating_add(amount.max(0)).min(self.max_hp.max(0));
        self.hp - before
    }

    // === Derived values ===

    /// Dexterity-derived initiative bonus.
    #[must_use]
    pub fn initiative_bonus(&self) -> i32 {
        self.abilities.modifier(Ability::Dexterity)
    }

    /// Saving throw bonus for an ability.
    #[must_use]
    pub fn save_bonus(&self, ability: Ability) -> i32 {
        self.abilities.modifier(ability)
    }

    /// Missing stats or position: such an entity never takes a turn.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        self.position.is_none() || self.max_hp <= 0
    }

    #[must_use]
    pub fn has_melee_attack(&self) -> bool {
        self.attacks.iter().any(Attack::is_melee)
    }

    #[must_use]
    pub fn has_ranged_attack(&self) -> bool {
        self.attacks.iter().any(|a| !a.is_melee())
    }
}
