//! Initiative order and turn advancement.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::phase::{CombatOutcome, Phase};
use crate::core::{Entity, EntityId, Team};
use crate::dice::{roll_d20, DiceSource};

/// One slot in the initiative order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnEntry {
    pub entity: EntityId,
    pub initiative: i32,
    pub team: Team,
}

/// Roll d20 + initiative bonus for every entity and sort the results.
///
/// Higher initiative goes first. Ties go player, then companions, then
/// enemies; anything still tied keeps roster order.
pub fn roll_initiative<'a, D: DiceSource + ?Sized>(
    entities: impl IntoIterator<Item = &'a Entity>,
    dice: &mut D,
) -> Vec<TurnEntry> {
    let mut order: Vec<TurnEntry> = entities
        .into_iter()
        .map(|e| TurnEntry {
            entity: e.id,
            initiative: roll_d20(dice) as i32 + e.initiative_bonus(),
            team: e.team,
        })
        .collect();
    order.sort_by(|a, b| {
        b.initiative
            .cmp(&a.initiative)
            .then(a.team.initiative_rank().cmp(&b.team.initiative_rank()))
    });
    order
}

/// Result of one `next_turn` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TurnAdvance {
    /// Entity now on turn (`None` once the session has ended).
    pub entity: Option<EntityId>,
    /// Slots stepped over, dead ones included.
    pub steps: usize,
    /// Whether the order wrapped into a new round.
    pub wrapped: bool,
    pub outcome: Option<CombatOutcome>,
}

/// Fixed initiative order plus the phase state machine.
///
/// The order is set once and never re-sorted. Dead entries stay in place
/// and are skipped.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnScheduler {
    order: Vec<TurnEntry>,
    current: usize,
    /// 1-based round counter.
    turn_number: u32,
    phase: Phase,
}

impl TurnScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a precomputed order; moves to `initiative-display`.
    #[must_use]
    pub fn with_order(order: Vec<TurnEntry>) -> Self {
        Self {
            order,
            current: 0,
            turn_number: 1,
            phase: Phase::InitiativeDisplay,
        }
    }

    /// Roll initiative and build the scheduler.
    pub fn roll<'a, D: DiceSource + ?Sized>(entities: impl IntoIterator<Item = &'a Entity>, dice: &mut D) -> Self {
        Self::with_order(roll_initiative(entities, dice))
    }

    /// Leave `initiative-display` and land on the first living entry.
    ///
    /// Has no effect outside `initiative-display`.
    pub fn begin(&mut self, is_alive: impl Fn(EntityId) -> bool) -> Option<CombatOutcome> {
        if self.phase != Phase::InitiativeDisplay {
            return self.outcome();
        }
        self.phase = Phase::Turn;
        if let Some(outcome) = self.check_end(&is_alive) {
            return Some(outcome);
        }
        let first_down = self.order.first().is_some_and(|e| !is_alive(e.entity));
        if first_down {
            return self.next_turn(is_alive).outcome;
        }
        None
    }

    /// Step to the next living entity, wrapping into a new round at the
    /// end of the order, then check the end conditions.
    ///
    /// The search visits at most `order.len()` slots.
    pub fn next_turn(&mut self, is_alive: impl Fn(EntityId) -> bool) -> TurnAdvance {
        if self.phase.is_ended() || self.order.is_empty() {
            return TurnAdvance {
                entity: None,
                steps: 0,
                wrapped: false,
                outcome: self.outcome(),
            };
        }

        let len = self.order.len();
        let mut steps = 0;
        let mut wrapped = false;
        while steps < len {
            steps += 1;
            self.current += 1;
            if self.current >= len {
                self.current = 0;
                self.turn_number += 1;
                wrapped = true;
            }
            if is_alive(self.order[self.current].entity) {
                break;
            }
        }

        let outcome = self.check_end(&is_alive);
        if outcome.is_none() {
            self.phase = Phase::Turn;
        }
        debug!(current = self.current, turn = self.turn_number, steps, wrapped, ?outcome, "next turn");

        TurnAdvance {
            entity: if outcome.is_some() { None } else { self.current_entity() },
            steps,
            wrapped,
            outcome,
        }
    }

    /// Transition to `victory` or `defeat` if either condition holds.
    /// Victory is checked first.
    pub fn check_end(&mut self, is_alive: impl Fn(EntityId) -> bool) -> Option<CombatOutcome> {
        if self.phase.is_ended() {
            return self.outcome();
        }
        let enemies_down = !self
            .order
            .iter()
            .any(|e| e.team == Team::Enemy && is_alive(e.entity));
        let party_down = !self
            .order
            .iter()
            .any(|e| e.team.is_party() && is_alive(e.entity));

        let outcome = if enemies_down {
            Some(CombatOutcome::Victory)
        } else if party_down {
            Some(CombatOutcome::Defeat)
        } else {
            None
        };
        if let Some(outcome) = outcome {
            self.phase = outcome.phase();
        }
        outcome
    }

    /// Outcome implied by the current phase.
    #[must_use]
    pub fn outcome(&self) -> Option<CombatOutcome> {
        match self.phase {
            Phase::Victory => Some(CombatOutcome::Victory),
            Phase::Defeat => Some(CombatOutcome::Defeat),
            _ => None,
        }
    }

    /// Move between the in-turn phases. End phases are final.
    pub fn set_phase(&mut self, phase: Phase) {
        if !self.phase.is_ended() {
            self.phase = phase;
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_entity(&self) -> Option<EntityId> {
        self.order.get(self.current).map(|e| e.entity)
    }

    #[must_use]
    pub fn order(&self) -> &[TurnEntry] {
        &self.order
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AbilityScores;
    use crate::dice::ScriptedDice;

    fn entry(id: u32, initiative: i32, team: Team) -> TurnEntry {
        TurnEntry { entity: EntityId(id), initiative, team }
    }

    fn four() -> TurnScheduler {
        TurnScheduler::with_order(vec![
            entry(0, 18, Team::Player),
            entry(1, 12, Team::Enemy),
            entry(2, 7, Team::Companion),
            entry(3, 5, Team::Enemy),
        ])
    }

    #[test]
    fn test_initiative_sort_and_tie_break() {
        let entities = vec![
            Entity::new(EntityId(0), "Goblin", Team::Enemy, 7, 15),
            Entity::new(EntityId(1), "Cleric", Team::Companion, 22, 16),
            Entity::new(EntityId(2), "Fighter", Team::Player, 28, 16)
                .with_abilities(AbilityScores::new(16, 12, 14, 10, 10, 10)),
            Entity::new(EntityId(3), "Archer", Team::Enemy, 7, 13),
        ];
        // goblin 12, cleric 12, fighter 11 + 1, archer 15
        let mut dice = ScriptedDice::new([12, 12, 11, 15]);

        let order = roll_initiative(&entities, &mut dice);
        let ids: Vec<u32> = order.iter().map(|e| e.entity.raw()).collect();
        assert_eq!(ids, vec![3, 2, 1, 0]);
        assert_eq!(order[1].initiative, 12);
    }

    #[test]
    fn test_begin_and_advance() {
        let mut s = four();
        assert_eq!(s.phase(), Phase::InitiativeDisplay);
        assert_eq!(s.begin(|_| true), None);
        assert_eq!(s.phase(), Phase::Turn);
        assert_eq!(s.current_entity(), Some(EntityId(0)));

        let adv = s.next_turn(|_| true);
        assert_eq!(adv.entity, Some(EntityId(1)));
        assert!(!adv.wrapped);

        s.next_turn(|_| true);
        s.next_turn(|_| true);
        let adv = s.next_turn(|_| true);
        assert_eq!(adv.entity, Some(EntityId(0)));
        assert!(adv.wrapped);
        assert_eq!(s.turn_number(), 2);
    }

    #[test]
    fn test_skips_dead() {
        let mut s = four();
        s.begin(|_| true);
        let adv = s.next_turn(|id| id != EntityId(1));
        assert_eq!(adv.entity, Some(EntityId(2)));
        assert_eq!(adv.steps, 2);
    }

    #[test]
    fn test_begin_skips_dead_first() {
        let mut s = four();
        s.begin(|id| id != EntityId(0));
        // player 0 dead but companion alive, so the fight goes on
        assert_eq!(s.current_entity(), Some(EntityId(1)));
    }

    #[test]
    fn test_victory_when_enemies_down() {
        let mut s = four();
        s.begin(|_| true);
        let adv = s.next_turn(|id| id != EntityId(1) && id != EntityId(3));
        assert_eq!(adv.outcome, Some(CombatOutcome::Victory));
        assert_eq!(adv.entity, None);
        assert_eq!(s.phase(), Phase::Victory);

        // ended sessions ignore advances
        let again = s.next_turn(|_| true);
        assert_eq!(again.steps, 0);
        assert_eq!(again.outcome, Some(CombatOutcome::Victory));
    }

    #[test]
    fn test_defeat_when_party_down() {
        let mut s = four();
        s.begin(|_| true);
        let adv = s.next_turn(|id| id == EntityId(1) || id == EntityId(3));
        assert_eq!(adv.outcome, Some(CombatOutcome::Defeat));
    }

    #[test]
    fn test_victory_wins_when_everyone_is_down() {
        let mut s = four();
        s.begin(|_| true);
        let adv = s.next_turn(|_| false);
        assert_eq!(adv.steps, 4);
        assert_eq!(adv.outcome, Some(CombatOutcome::Victory));
    }

    #[test]
    fn test_set_phase_cannot_leave_end() {
        let mut s = four();
        s.begin(|_| true);
        s.set_phase(Phase::PlayerMovement);
        assert_eq!(s.phase(), Phase::PlayerMovement);

        s.check_end(|id| id == EntityId(1));
        s.set_phase(Phase::Turn);
        assert_eq!(s.phase(), Phase::Defeat);
    }
}
