//! Status effect kinds and their mechanical modifiers.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::EntityId;
use crate::dice::DiceExpr;

/// Types of status effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusEffectKind {
    /// Damage over time, attacks at disadvantage.
    Poisoned,
    /// Fire damage over time.
    Burning,
    /// Healing over time.
    Regenerating,
    Stunned,
    Paralyzed,
    /// Cannot move, attacks at disadvantage.
    Restrained,
    Frightened,
    Slowed,
    Hasted,
    Blessed,
    Weakened,
    /// Cannot cast spells.
    Silenced,
}

impl StatusEffectKind {
    pub const ALL: [StatusEffectKind; 12] = [
        StatusEffectKind::Poisoned,
        StatusEffectKind::Burning,
        StatusEffectKind::Regenerating,
        StatusEffectKind::Stunned,
        StatusEffectKind::Paralyzed,
        StatusEffectKind::Restrained,
        StatusEffectKind::Frightened,
        StatusEffectKind::Slowed,
        StatusEffectKind::Hasted,
        StatusEffectKind::Blessed,
        StatusEffectKind::Weakened,
        StatusEffectKind::Silenced,
    ];

    /// Mechanical effect of one active instance.
    #[must_use]
    pub const fn modifiers(self) -> EffectModifiers {
        let base = EffectModifiers::NONE;
        match self {
            StatusEffectKind::Poisoned => EffectModifiers {
                periodic: Some(Periodic::Damage(DiceExpr::new(1, 4, 0))),
                attack_disadvantage: true,
                ..base
            },
            StatusEffectKind::Burning => EffectModifiers {
                periodic: Some(Periodic::Damage(DiceExpr::new(1, 6, 0))),
                ..base
            },
            StatusEffectKind::Regenerating => EffectModifiers {
                periodic: Some(Periodic::Healing(DiceExpr::new(1, 4, 0))),
                ..base
            },
            StatusEffectKind::Stunned | StatusEffectKind::Paralyzed => EffectModifiers {
                incapacitated: true,
                prevents_movement: true,
                prevents_action: true,
                ..base
            },
            StatusEffectKind::Restrained => EffectModifiers {
                prevents_movement: true,
                attack_disadvantage: true,
                ..base
            },
            StatusEffectKind::Frightened => EffectModifiers {
                attack_disadvantage: true,
                ..base
            },
            StatusEffectKind::Slowed => EffectModifiers {
                speed_multiplier: 0.5,
                attack_bonus: -1,
                ..base
            },
            StatusEffectKind::Hasted => EffectModifiers {
                speed_multiplier: 2.0,
                attack_bonus: 1,
                ..base
            },
            StatusEffectKind::Blessed => EffectModifiers {
                attack_bonus: 2,
                ..base
            },
            StatusEffectKind::Weakened => EffectModifiers {
                attack_bonus: -2,
                ..base
            },
            StatusEffectKind::Silenced => EffectModifiers {
                prevents_casting: true,
                ..base
            },
        }
    }

    /// Harmful to the bearer.
    #[must_use]
    pub const fn is_debuff(self) -> bool {
        !matches!(
            self,
            StatusEffectKind::Regenerating | StatusEffectKind::Hasted | StatusEffectKind::Blessed
        )
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            StatusEffectKind::Poisoned => "poisoned",
            StatusEffectKind::Burning => "burning",
            StatusEffectKind::Regenerating => "regenerating",
            StatusEffectKind::Stunned => "stunned",
            StatusEffectKind::Paralyzed => "paralyzed",
            StatusEffectKind::Restrained => "restrained",
            StatusEffectKind::Frightened => "frightened",
            StatusEffectKind::Slowed => "slowed",
            StatusEffectKind::Hasted => "hasted",
            StatusEffectKind::Blessed => "blessed",
            StatusEffectKind::Weakened => "weakened",
            StatusEffectKind::Silenced => "silenced",
        }
    }
}

impl std::fmt::Display for StatusEffectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusEffectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        match s.as_str() {
            "poison" => return Ok(StatusEffectKind::Poisoned),
            "burn" | "fire" => return Ok(StatusEffectKind::Burning),
            "stun" => return Ok(StatusEffectKind::Stunned),
            "haste" => return Ok(StatusEffectKind::Hasted),
            "slow" => return Ok(StatusEffectKind::Slowed),
            "bless" => return Ok(StatusEffectKind::Blessed),
            _ => {}
        }
        StatusEffectKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown status effect `{s}`"))
    }
}

/// Periodic HP change applied at the start of the bearer's turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Periodic {
    Damage(DiceExpr),
    Healing(DiceExpr),
}

/// Mechanical modifier set of a single effect.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectModifiers {
    pub speed_multiplier: f32,
    pub attack_bonus: i32,
    pub attack_disadvantage: bool,
    pub prevents_movement: bool,
    pub prevents_action: bool,
    pub prevents_casting: bool,
    pub incapacitated: bool,
    pub periodic: Option<Periodic>,
}

impl EffectModifiers {
    pub const NONE: EffectModifiers = EffectModifiers {
        speed_multiplier: 1.0,
        attack_bonus: 0,
        attack_disadvantage: false,
        prevents_movement: false,
        prevents_action: false,
        prevents_casting: false,
        incapacitated: false,
        periodic: None,
    };
}

/// An active effect on one entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusEffectKind,
    /// Turns remaining, counted down at the start of each of the bearer's turns.
    pub remaining: u32,
    pub source: Option<EntityId>,
}

impl StatusEffect {
    #[must_use]
    pub fn new(kind: StatusEffectKind, remaining: u32, source: Option<EntityId>) -> Self {
        Self { kind, remaining, source }
    }

    #[must_use]
    pub fn modifiers(&self) -> EffectModifiers {
        self.kind.modifiers()
    }
}
