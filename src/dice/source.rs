//! Randomness sources.
//!
//! Every roll in the engine goes through a `DiceSource`. Production code
//! uses [`GameRng`](crate::core::GameRng); tests and replays use
//! [`ScriptedDice`], which hands out a fixed sequence.

use std::collections::VecDeque;

/// Supplies individual die results.
pub trait DiceSource {
    /// Roll one die with `sides` faces, returning a value in `1..=sides`.
    fn roll_die(&mut self, sides: u32) -> u32;
}

impl<T: DiceSource + ?Sized> DiceSource for &mut T {
    fn roll_die(&mut self, sides: u32) -> u32 {
        (**self).roll_die(sides)
    }
}

impl<T: DiceSource + ?Sized> DiceSource for Box<T> {
    fn roll_die(&mut self, sides: u32) -> u32 {
        (**self).roll_die(sides)
    }
}

/// Replays a fixed sequence of die results.
///
/// Values are clamped into `1..=sides` of the die being rolled. Once the
/// script runs out, the last value repeats (or 1 if the script was empty).
///
/// ```
/// use tactical_combat::dice::{DiceSource, ScriptedDice};
///
/// let mut dice = ScriptedDice::new([20, 3]);
/// assert_eq!(dice.roll_die(20), 20);
/// assert_eq!(dice.roll_die(4), 3);
/// assert_eq!(dice.roll_die(6), 3);
/// ```
#[derive(Clone, Debug, Default)]
pub struct ScriptedDice {
    queue: VecDeque<u32>,
    last: Option<u32>,
    consumed: usize,
}

impl ScriptedDice {
    pub fn new(values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            queue: values.into_iter().collect(),
            last: None,
            consumed: 0,
        }
    }

    /// Append more results to the end of the script.
    pub fn extend(&mut self, values: impl IntoIterator<Item = u32>) {
        self.queue.extend(values);
    }

    /// Results not yet handed out.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Number of dice rolled so far.
    #[must_use]
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

impl DiceSource for ScriptedDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        let value = match self.queue.pop_front() {
            Some(v) => {
                self.last = Some(v);
                v
            }
            None => self.last.unwrap_or(1),
        };
        self.consumed += 1;
        value.clamp(1, sides.max(1))
    }
}
