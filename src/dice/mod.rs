//! Dice primitives: die rolls, dice-notation parsing, d20 checks.
//!
//! Everything here is stateless apart from consuming the shared
//! [`DiceSource`].
//!
//! ## Usage
//!
//! ```
//! use tactical_combat::dice::{roll_d20_with_modifier, roll_dice, ScriptedDice};
//!
//! let mut dice = ScriptedDice::new([9, 2, 5]);
//!
//! let check = roll_d20_with_modifier(&mut dice, 5);
//! assert_eq!(check.total, 14);
//!
//! assert_eq!(roll_dice(&mut dice, "2d6+1").unwrap(), 8);
//! ```

pub mod expr;
pub mod source;

use serde::{Deserialize, Serialize};

pub use expr::{DiceError, DiceExpr, DiceRoll, MAX_DICE, MAX_SIDES};
pub use source::{DiceSource, ScriptedDice};

/// How a d20 is rolled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollMode {
    #[default]
    Normal,
    /// Roll two, keep the higher.
    Advantage,
    /// Roll two, keep the lower.
    Disadvantage,
}

impl RollMode {
    /// Advantage and disadvantage cancel to a normal roll.
    #[must_use]
    pub const fn combine(advantage: bool, disadvantage: bool) -> Self {
        match (advantage, disadvantage) {
            (true, false) => RollMode::Advantage,
            (false, true) => RollMode::Disadvantage,
            _ => RollMode::Normal,
        }
    }
}

/// A d20 check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct D20Roll {
    /// The kept die.
    pub natural: u32,
    pub modifier: i32,
    pub total: i32,
    pub mode: RollMode,
    /// The discarded die under advantage/disadvantage.
    pub dropped: Option<u32>,
}

impl D20Roll {
    #[must_use]
    pub const fn is_natural_20(&self) -> bool {
        self.natural == 20
    }

    #[must_use]
    pub const fn is_natural_1(&self) -> bool {
        self.natural == 1
    }
}

pub fn roll_d20<D: DiceSource + ?Sized>(dice: &mut D) -> u32 {
    dice.roll_die(20)
}

pub fn roll_die<D: DiceSource + ?Sized>(dice: &mut D, sides: u32) -> u32 {
    dice.roll_die(sides)
}

/// Parse `notation` and roll it, returning the total.
pub fn roll_dice<D: DiceSource + ?Sized>(dice: &mut D, notation: &str) -> Result<i32, DiceError> {
    let expr: DiceExpr = notation.parse()?;
    Ok(expr.roll(dice).total)
}

pub fn roll_d20_with_modifier<D: DiceSource + ?Sized>(dice: &mut D, modifier: i32) -> D20Roll {
    roll_d20_with_mode(dice, modifier, RollMode::Normal)
}

pub fn roll_d20_with_mode<D: DiceSource + ?Sized>(dice: &mut D, modifier: i32, mode: RollMode) -> D20Roll {
    let first = dice.roll_die(20);
    let (natural, dropped) = match mode {
        RollMode::Normal => (first, None),
        RollMode::Advantage => {
            let second = dice.roll_die(20);
            (first.max(second), Some(first.min(second)))
        }
        RollMode::Disadvantage => {
            let second = dice.roll_die(20);
            (first.min(second), Some(first.max(second)))
        }
    };
    D20Roll {
        natural,
        modifier,
        total: natural as i32 + modifier,
        mode,
        dropped,
    }
}
