//! Per-entity effect collection: apply, tick, expire and aggregate.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::status::{Periodic, StatusEffect, StatusEffectKind};
use crate::core::{Entity, EntityId};
use crate::dice::DiceSource;

/// What `apply` did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyOutcome {
    /// New instance appended.
    Added,
    /// Existing instance replaced by a longer one.
    Refreshed,
    /// Zero duration, or the existing instance already lasts as long.
    Ignored,
}

/// Combined mechanical effect of every active effect on an entity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregateModifiers {
    /// Product of all speed multipliers.
    pub speed_multiplier: f32,
    /// Sum of all attack bonuses.
    pub attack_bonus: i32,
    pub attack_disadvantage: bool,
    pub movement_blocked: bool,
    pub action_blocked: bool,
    pub casting_blocked: bool,
    pub incapacitated: bool,
}

impl Default for AggregateModifiers {
    fn default() -> Self {
        Self {
            speed_multiplier: 1.0,
            attack_bonus: 0,
            attack_disadvantage: false,
            movement_blocked: false,
            action_blocked: false,
            casting_blocked: false,
            incapacitated: false,
        }
    }
}

impl AggregateModifiers {
    #[must_use]
    pub fn can_move(&self) -> bool {
        !self.movement_blocked && !self.incapacitated
    }

    #[must_use]
    pub fn can_act(&self) -> bool {
        !self.action_blocked && !self.incapacitated
    }

    #[must_use]
    pub fn can_cast(&self) -> bool {
        self.can_act() && !self.casting_blocked
    }

    /// `floor(base * speed_multiplier)`, or 0 when movement is blocked.
    #[must_use]
    pub fn effective_movement(&self, base: u32) -> u32 {
        if !self.can_move() {
            return 0;
        }
        (base as f32 * self.speed_multiplier).floor().max(0.0) as u32
    }
}

/// Raw result of counting down a collection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EffectTick {
    pub damage: Vec<(StatusEffectKind, i32)>,
    pub healing: Vec<(StatusEffectKind, i32)>,
    pub expired: Vec<StatusEffectKind>,
}

/// Active effects on one entity. At most one instance per kind.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffects {
    effects: Vec<StatusEffect>,
}

impl StatusEffects {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `kind` for `duration` turns.
    ///
    /// An existing instance is replaced only by a strictly longer one.
    pub fn apply(&mut self, kind: StatusEffectKind, duration: u32, source: Option<EntityId>) -> ApplyOutcome {
        if duration == 0 {
            return ApplyOutcome::Ignored;
        }
        match self.effects.iter_mut().find(|e| e.kind == kind) {
            Some(existing) if duration > existing.remaining => {
                *existing = StatusEffect::new(kind, duration, source);
                ApplyOutcome::Refreshed
            }
            Some(_) => ApplyOutcome::Ignored,
            None => {
                self.effects.push(StatusEffect::new(kind, duration, source));
                ApplyOutcome::Added
            }
        }
    }

    /// Remove `kind`. Returns whether it was present.
    pub fn remove(&mut self, kind: StatusEffectKind) -> bool {
        let before = self.effects.len();
        self.effects.retain(|e| e.kind != kind);
        self.effects.len() != before
    }

    #[must_use]
    pub fn has(&self, kind: StatusEffectKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    #[must_use]
    pub fn get(&self, kind: StatusEffectKind) -> Option<&StatusEffect> {
        self.effects.iter().find(|e| e.kind == kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffect> {
        self.effects.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Remove every harmful effect, returning how many were removed.
    pub fn clear_debuffs(&mut self) -> usize {
        let before = self.effects.len();
        self.effects.retain(|e| !e.kind.is_debuff());
        before - self.effects.len()
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }

    #[must_use]
    pub fn aggregate(&self) -> AggregateModifiers {
        self.effects.iter().fold(AggregateModifiers::default(), |mut acc, effect| {
            let m = effect.modifiers();
            acc.speed_multiplier *= m.speed_multiplier;
            acc.attack_bonus += m.attack_bonus;
            acc.attack_disadvantage |= m.attack_disadvantage;
            acc.movement_blocked |= m.prevents_movement;
            acc.action_blocked |= m.prevents_action;
            acc.casting_blocked |= m.prevents_casting;
            acc.incapacitated |= m.incapacitated;
            acc
        })
    }

    /// Roll periodic effects, count every duration down by one and drop
    /// the ones reaching zero.
    pub fn tick<D: DiceSource + ?Sized>(&mut self, dice: &mut D) -> EffectTick {
        let mut tick = EffectTick::default();
        for effect in &mut self.effects {
            match effect.modifiers().periodic {
                Some(Periodic::Damage(expr)) => tick.damage.push((effect.kind, expr.roll(dice).total.max(0))),
                Some(Periodic::Healing(expr)) => tick.healing.push((effect.kind, expr.roll(dice).total.max(0))),
                None => {}
            }
            effect.remaining = effect.remaining.saturating_sub(1);
            if effect.remaining == 0 {
                tick.expired.push(effect.kind);
            }
        }
        self.effects.retain(|e| e.remaining > 0);
        tick
    }
}

/// HP and expiry changes from one start-of-turn tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// HP actually lost.
    pub damage: i32,
    /// HP actually restored.
    pub healing: i32,
    pub expired: Vec<StatusEffectKind>,
    /// Narrative lines, in the order things happened.
    pub messages: Vec<String>,
}

impl TickReport {
    #[must_use]
    pub fn hp_delta(&self) -> i32 {
        self.healing - self.damage
    }
}

/// Entity-level entry points for the effect system.
pub struct StatusEffectRegistry;

impl StatusEffectRegistry {
    /// Apply an effect to `target`.
    pub fn apply_effect(
        target: &mut Entity,
        kind: StatusEffectKind,
        duration: u32,
        source: Option<EntityId>,
    ) -> ApplyOutcome {
        let outcome = target.effects.apply(kind, duration, source);
        debug!(entity = %target.id, ?kind, duration, ?outcome, "apply effect");
        outcome
    }

    /// Start-of-turn processing for `target`: periodic damage, then
    /// periodic healing (skipped if the damage was lethal), then expiry.
    pub fn tick_start_of_turn<D: DiceSource + ?Sized>(target: &mut Entity, dice: &mut D) -> TickReport {
        let tick = target.effects.tick(dice);
        let mut report = TickReport::default();

        for (kind, amount) in tick.damage {
            let lost = target.take_damage(amount);
            report.damage += lost;
            report.messages.push(format!("{} takes {} damage from being {}", target.name, lost, kind));
        }
        if target.is_alive() {
            for (kind, amount) in tick.healing {
                let gained = target.heal(amount);
                report.healing += gained;
                report.messages.push(format!("{} regains {} HP from {}", target.name, gained, kind));
            }
        }
        for kind in &tick.expired {
            report.messages.push(format!("{} is no longer {}", target.name, kind));
        }
        report.expired = tick.expired;
        report
    }

    #[must_use]
    pub fn aggregate_modifiers(target: &Entity) -> AggregateModifiers {
        target.effects.aggregate()
    }
}
