//! Dice notation: parse "2d6+3", "d8", "4d6-2" or a bare constant "5".

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::source::DiceSource;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("empty dice notation")]
    Empty,
    #[error("invalid dice count `{0}`")]
    InvalidCount(String),
    #[error("invalid die sides `{0}`")]
    InvalidSides(String),
    #[error("invalid modifier `{0}`")]
    InvalidModifier(String),
    #[error("too many dice: {0} (at most 100)")]
    TooManyDice(u32),
    #[error("too many sides: {0} (at most 1000)")]
    TooManySides(u32),
}

/// Largest dice count accepted in notation.
pub const MAX_DICE: u32 = 100;
/// Largest die accepted in notation.
pub const MAX_SIDES: u32 = 1000;

/// A parsed dice expression: `count` dice of `sides` faces plus `bonus`.
///
/// A flat constant has `count == 0`. Serializes as its notation string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DiceExpr {
    pub count: u32,
    pub sides: u32,
    pub bonus: i32,
}

impl DiceExpr {
    #[must_use]
    pub const fn new(count: u32, sides: u32, bonus: i32) -> Self {
        Self { count, sides, bonus }
    }

    /// A constant with no dice.
    #[must_use]
    pub const fn flat(value: i32) -> Self {
        Self { count: 0, sides: 0, bonus: value }
    }

    #[must_use]
    pub const fn min(&self) -> i32 {
        clamp_to_i32(self.count as u64).saturating_add(self.bonus)
    }

    #[must_use]
    pub const fn max(&self) -> i32 {
        clamp_to_i32(self.count as u64 * self.sides as u64).saturating_add(self.bonus)
    }

    /// Expected value, rounded down.
    #[must_use]
    pub fn average(&self) -> i32 {
        let per_die = (1.0 + self.sides as f64) / 2.0;
        (self.count as f64 * per_die + self.bonus as f64).floor() as i32
    }

    /// Roll every die and add the bonus. At most `MAX_DICE` dice are rolled.
    pub fn roll<D: DiceSource + ?Sized>(&self, dice: &mut D) -> DiceRoll {
        let rolls: Vec<u32> = (0..self.count.min(MAX_DICE)).map(|_| dice.roll_die(self.sides)).collect();
        let sum = i32::try_from(sum_dice(&rolls)).unwrap_or(i32::MAX);
        DiceRoll {
            rolls,
            bonus: self.bonus,
            total: sum.saturating_add(self.bonus),
        }
    }
}

impl FromStr for DiceExpr {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

impl TryFrom<String> for DiceExpr {
    type Error = DiceError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        parse(&s)
    }
}

impl From<DiceExpr> for String {
    fn from(expr: DiceExpr) -> Self {
        expr.to_string()
    }
}

impl std::fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            return write!(f, "{}", self.bonus);
        }
        match self.bonus {
            0 => write!(f, "{}d{}", self.count, self.sides),
            b if b > 0 => write!(f, "{}d{}+{}", self.count, self.sides, b),
            b => write!(f, "{}d{}{}", self.count, self.sides, b),
        }
    }
}

fn parse(notation: &str) -> Result<DiceExpr, DiceError> {
    let notation: String = notation
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    if notation.is_empty() {
        return Err(DiceError::Empty);
    }

    let Some(d_pos) = notation.find('d') else {
        let value = notation
            .parse::<i32>()
            .map_err(|_| DiceError::InvalidModifier(notation.clone()))?;
        return Ok(DiceExpr::flat(value));
    };

    // "d6" means "1d6"
    let count_str = &notation[..d_pos];
    let count = if count_str.is_empty() {
        1
    } else {
        count_str
            .parse::<u32>()
            .map_err(|_| DiceError::InvalidCount(count_str.to_string()))?
    };
    if count == 0 {
        return Err(DiceError::InvalidCount(count_str.to_string()));
    }
    if count > MAX_DICE {
        return Err(DiceError::TooManyDice(count));
    }

    let rest = &notation[d_pos + 1..];
    let (sides_str, bonus) = match rest.find(|c| c == '+' || c == '-') {
        Some(i) => {
            let modifier = &rest[i..];
            let bonus = modifier
                .parse::<i32>()
                .map_err(|_| DiceError::InvalidModifier(modifier.to_string()))?;
            (&rest[..i], bonus)
        }
        None => (rest, 0),
    };

    let sides = sides_str
        .parse::<u32>()
        .map_err(|_| DiceError::InvalidSides(sides_str.to_string()))?;
    if sides == 0 {
        return Err(DiceError::InvalidSides(sides_str.to_string()));
    }
    if sides > MAX_SIDES {
        return Err(DiceError::TooManySides(sides));
    }

    Ok(DiceExpr { count, sides, bonus })
}

const fn clamp_to_i32(value: u64) -> i32 {
    if value > i32::MAX as u64 {
        i32::MAX
    } else {
        value as i32
    }
}

fn sum_dice(rolls: &[u32]) -> u32 {
    rolls.iter().fold(0u32, |acc, &r| acc.saturating_add(r))
}

/// Result of rolling a `DiceExpr`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiceRoll {
    /// Individual die results.
    pub rolls: Vec<u32>,
    pub bonus: i32,
    pub total: i32,
}

impl DiceRoll {
    /// Sum of the dice without the bonus.
    #[must_use]
    pub fn dice_total(&self) -> i32 {
        i32::try_from(sum_dice(&self.rolls)).unwrap_or(i32::MAX)
    }

    /// Total with the dice doubled on a critical hit, never below zero.
    ///
    /// The flat bonus is added once either way.
    #[must_use]
    pub fn damage(&self, critical: bool) -> i32 {
        let dice = if critical { self.dice_total().saturating_mul(2) } else { self.dice_total() };
        dice.saturating_add(self.bonus).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;

    #[test]
    fn test_parse_basic() {
        assert_eq!("2d6".parse::<DiceExpr>(), Ok(DiceExpr::new(2, 6, 0)));
        assert_eq!("1d20+5".parse::<DiceExpr>(), Ok(DiceExpr::new(1, 20, 5)));
        assert_eq!("3d8-2".parse::<DiceExpr>(), Ok(DiceExpr::new(3, 8, -2)));
    }

    #[test]
    fn test_parse_implicit_one_and_whitespace() {
        assert_eq!("d8".parse::<DiceExpr>(), Ok(DiceExpr::new(1, 8, 0)));
        assert_eq!("  2D10 + 3 ".parse::<DiceExpr>(), Ok(DiceExpr::new(2, 10, 3)));
    }

    #[test]
    fn test_parse_constant() {
        assert_eq!("5".parse::<DiceExpr>(), Ok(DiceExpr::flat(5)));
        assert_eq!(DiceExpr::flat(5).to_string(), "5");
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<DiceExpr>(), Err(DiceError::Empty));
        assert!(matches!("0d6".parse::<DiceExpr>(), Err(DiceError::InvalidCount(_))));
        assert!(matches!("xd6".parse::<DiceExpr>(), Err(DiceError::InvalidCount(_))));
        assert!(matches!("2d0".parse::<DiceExpr>(), Err(DiceError::InvalidSides(_))));
        assert!(matches!("2d".parse::<DiceExpr>(), Err(DiceError::InvalidSides(_))));
        assert!(matches!("2d6+x".parse::<DiceExpr>(), Err(DiceError::InvalidModifier(_))));
        assert!(matches!("fire".parse::<DiceExpr>(), Err(DiceError::InvalidModifier(_))));
    }

    #[test]
    fn test_parse_rejects_huge_pools() {
        let err: crate::error::CombatError = "100000000d6".parse::<DiceExpr>().unwrap_err().into();
        assert!(matches!(err, crate::error::CombatError::Dice(DiceError::TooManyDice(100_000_000))));
        assert!(matches!("2d99999".parse::<DiceExpr>(), Err(DiceError::TooManySides(99_999))));
        assert_eq!("100d6".parse::<DiceExpr>(), Ok(DiceExpr::new(100, 6, 0)));
    }

    #[test]
    fn test_roll_saturates_instead_of_overflowing() {
        let mut dice = ScriptedDice::new([u32::MAX]);
        let roll = DiceExpr::new(u32::MAX, u32::MAX, i32::MAX).roll(&mut dice);

        assert_eq!(roll.rolls.len(), MAX_DICE as usize);
        assert_eq!(roll.total, i32::MAX);
        assert_eq!(roll.damage(true), i32::MAX);
    }

    #[test]
    fn test_display() {
        assert_eq!(DiceExpr::new(2, 6, 3).to_string(), "2d6+3");
        assert_eq!(DiceExpr::new(4, 6, -2).to_string(), "4d6-2");
        assert_eq!(DiceExpr::new(1, 8, 0).to_string(), "1d8");
    }

    #[test]
    fn test_stats() {
        let expr = DiceExpr::new(2, 6, 3);
        assert_eq!(expr.min(), 5);
        assert_eq!(expr.max(), 15);
        assert_eq!(expr.average(), 10);
    }

    #[test]
    fn test_roll_sums_dice_and_bonus() {
        let mut dice = ScriptedDice::new([3, 5]);
        let roll = DiceExpr::new(2, 6, 3).roll(&mut dice);

        assert_eq!(roll.rolls, vec![3, 5]);
        assert_eq!(roll.total, 11);
        assert_eq!(roll.dice_total(), 8);
    }

    #[test]
    fn test_critical_doubles_dice_only() {
        let mut dice = ScriptedDice::new([4]);
        let roll = DiceExpr::new(1, 8, 3).roll(&mut dice);

        assert_eq!(roll.damage(false), 7);
        assert_eq!(roll.damage(true), 11);
    }

    #[test]
    fn test_damage_never_negative() {
        let mut dice = ScriptedDice::new([1]);
        let roll = DiceExpr::new(1, 4, -3).roll(&mut dice);
        assert_eq!(roll.total, -2);
        assert_eq!(roll.damage(false), 0);
    }

    #[test]
    fn test_serde_as_notation() {
        let expr = DiceExpr::new(3, 6, 0);
        let json = serde_json::to_string(&expr).unwrap();
        assert_eq!(json, "\"3d6\"");

        let back: DiceExpr = serde_json::from_str("\"1d8+2\"").unwrap();
        assert_eq!(back, DiceExpr::new(1, 8, 2));
        assert!(serde_json::from_str::<DiceExpr>("\"nope\"").is_err());
    }
}
