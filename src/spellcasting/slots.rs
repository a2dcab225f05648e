//! Spell slot bookkeeping for levels 1 through 9.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotLevel {
    pub max: u8,
    pub available: u8,
}

/// Slots per spell level.
///
/// ```
/// use tactical_combat::spellcasting::SpellSlots;
///
/// let mut slots = SpellSlots::new().with_slots(1, 0).with_slots(2, 1);
///
/// // No 1st-level slot left, so a 1st-level spell burns the 2nd-level one
/// assert_eq!(slots.consume(1), Some(2));
/// assert_eq!(slots.consume(1), None);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellSlots {
    levels: [SlotLevel; 9],
}

impl SpellSlots {
    pub const MAX_LEVEL: u8 = 9;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `count` slots (all available) at `level`. Levels outside 1..=9
    /// are ignored.
    #[must_use]
    pub fn with_slots(mut self, level: u8, count: u8) -> Self {
        if let Some(slot) = self.slot_mut(level) {
            *slot = SlotLevel { max: count, available: count };
        }
        self
    }

    #[must_use]
    pub fn get(&self, level: u8) -> SlotLevel {
        match level {
            1..=Self::MAX_LEVEL => self.levels[usize::from(level - 1)],
            _ => SlotLevel::default(),
        }
    }

    #[must_use]
    pub fn available(&self, level: u8) -> u8 {
        self.get(level).available
    }

    /// Total available slots across all levels.
    #[must_use]
    pub fn total_available(&self) -> u32 {
        self.levels.iter().map(|s| u32::from(s.available)).sum()
    }

    /// Lowest slot level `>= level` with a slot available. Cantrips
    /// (level 0) need no slot and always return `Some(0)`.
    #[must_use]
    pub fn find_slot(&self, level: u8) -> Option<u8> {
        if level == 0 {
            return Some(0);
        }
        (level..=Self::MAX_LEVEL).find(|&l| self.available(l) > 0)
    }

    /// Spend the slot `find_slot` would pick, returning its level.
    pub fn consume(&mut self, level: u8) -> Option<u8> {
        let used = self.find_slot(level)?;
        if let Some(slot) = self.slot_mut(used) {
            slot.available -= 1;
        }
        Some(used)
    }

    /// Refill every level.
    pub fn restore_all(&mut self) {
        for slot in &mut self.levels {
            slot.available = slot.max;
        }
    }

    fn slot_mut(&mut self, level: u8) -> Option<&mut SlotLevel> {
        match level {
            1..=Self::MAX_LEVEL => self.levels.get_mut(usize::from(level - 1)),
            _ => None,
        }
    }
}
