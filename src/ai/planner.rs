//! Best-action selection.

use tracing::debug;

use super::candidates::{self, Candidate};
use super::movement::nearest_opponent;
use super::scoring::{score, select_best, ScoredCandidate, ScoringContext};
use crate::core::{Action, AiConfig, CombatState, Entity};
use crate::grid::manhattan_distance;
use crate::spellcasting::SpellBook;

/// Picks one action per turn for AI-controlled entities.
///
/// The planner is pure: it reads the state, never rolls dice and never
/// mutates anything. The same state always yields the same action.
#[derive(Clone, Copy, Debug)]
pub struct AiPlanner<'a> {
    config: &'a AiConfig,
    book: &'a SpellBook,
}

impl<'a> AiPlanner<'a> {
    #[must_use]
    pub fn new(config: &'a AiConfig, book: &'a SpellBook) -> Self {
        Self { config, book }
    }

    /// Best action for `actor`, or the pass sentinel.
    ///
    /// Dead and unplaced entities always pass.
    #[must_use]
    pub fn best_action(&self, state: &CombatState, actor: &Entity) -> Action {
        if !actor.is_alive() || actor.position.is_none() {
            return Action::pass(actor.id);
        }
        if actor.priorities.is_empty() {
            return self.fallback_action(state, actor);
        }

        let scored = self.scored_candidates(state, actor);
        match select_best(scored) {
            Some(best) => {
                debug!(
                    entity = %actor.id,
                    priority = %best.candidate.priority,
                    score = best.score,
                    "selected action"
                );
                best.candidate.action
            }
            None => {
                debug!(entity = %actor.id, "no candidates, passing");
                Action::pass(actor.id)
            }
        }
    }

    /// Every candidate across the actor's buckets, scored, in generation
    /// order.
    #[must_use]
    pub fn scored_candidates(&self, state: &CombatState, actor: &Entity) -> Vec<ScoredCandidate> {
        let ctx = ScoringContext {
            self_hp_fraction: actor.hp_fraction(),
            living_opponents: state.opponents_of(actor.team).count(),
        };

        actor
            .priorities
            .iter()
            .enumerate()
            .flat_map(|(bucket, &priority)| candidates::generate(state, self.book, actor, priority, bucket))
            .map(|candidate: Candidate| {
                let score = score(&candidate, &ctx, self.config);
                debug!(
                    entity = %actor.id,
                    priority = %candidate.priority,
                    distance = candidate.distance,
                    reach = candidate.reach,
                    score,
                    "candidate"
                );
                ScoredCandidate { candidate, score }
            })
            .collect()
    }

    /// No authored priorities: first attack that reaches the nearest
    /// opponent, else pass.
    fn fallback_action(&self, state: &CombatState, actor: &Entity) -> Action {
        let (Some(origin), Some(target)) = (actor.position, nearest_opponent(state, actor)) else {
            return Action::pass(actor.id);
        };
        let Some(target_pos) = target.position else {
            return Action::pass(actor.id);
        };
        let distance = manhattan_distance(origin, target_pos);
        actor
            .attacks
            .iter()
            .enumerate()
            .find(|(_, attack)| attack.range >= distance)
            .map_or_else(
                || Action::pass(actor.id),
                |(index, attack)| Action::from_attack(actor.id, index, attack, target.id),
            )
    }
}
