//! Action-priority buckets.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::Role;

/// One bucket in an entity's ordered priority list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Healing spell on a wounded ally (self included).
    Heal,
    /// Beneficial status spell on an ally.
    Buff,
    MeleeAttack,
    RangedAttack,
    /// Single-target damaging spell.
    DamageSpell,
    /// Damaging spell with an area of effect.
    AreaSpell,
    /// Non-damaging spell that imposes a status.
    ControlSpell,
}

impl Priority {
    pub const ALL: [Priority; 7] = [
        Priority::Heal,
        Priority::Buff,
        Priority::MeleeAttack,
        Priority::RangedAttack,
        Priority::DamageSpell,
        Priority::AreaSpell,
        Priority::ControlSpell,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Priority::Heal => "heal",
            Priority::Buff => "buff",
            Priority::MeleeAttack => "melee_attack",
            Priority::RangedAttack => "ranged_attack",
            Priority::DamageSpell => "damage_spell",
            Priority::AreaSpell => "area_spell",
            Priority::ControlSpell => "control_spell",
        }
    }

    /// Buckets whose actions help allies rather than hurt opponents.
    #[must_use]
    pub const fn is_supportive(self) -> bool {
        matches!(self, Priority::Heal | Priority::Buff)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "heal" | "healing" => Ok(Priority::Heal),
            "buff" | "support" => Ok(Priority::Buff),
            "melee_attack" | "melee" => Ok(Priority::MeleeAttack),
            "ranged_attack" | "ranged" => Ok(Priority::RangedAttack),
            "damage_spell" => Ok(Priority::DamageSpell),
            "area_spell" | "aoe" | "aoe_spell" => Ok(Priority::AreaSpell),
            "control_spell" | "control" => Ok(Priority::ControlSpell),
            _ => Err(format!("unknown priority `{s}`")),
        }
    }
}

impl Role {
    /// Priority list used when a stat block doesn't author one.
    #[must_use]
    pub fn default_priorities(self) -> Vec<Priority> {
        match self {
            Role::Tank => vec![Priority::MeleeAttack],
            Role::Striker => vec![Priority::MeleeAttack, Priority::RangedAttack],
            Role::Skirmisher => vec![Priority::RangedAttack, Priority::MeleeAttack],
            Role::Healer => vec![
                Priority::Heal,
                Priority::Buff,
                Priority::DamageSpell,
                Priority::MeleeAttack,
            ],
            Role::Controller => vec![Priority::ControlSpell, Priority::AreaSpell, Priority::DamageSpell],
            Role::Artillery => vec![Priority::AreaSpell, Priority::DamageSpell, Priority::RangedAttack],
        }
    }
}
