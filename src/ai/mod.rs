//! Deterministic AI for non-player combatants.
//!
//! Each entity carries an ordered list of [`Priority`] buckets. For every
//! bucket the planner generates the structurally valid candidates, scores
//! them (bucket base plus situational adjustments from [`AiConfig`]) and
//! picks the highest with a stable tie-break. Movement is decided first,
//! separately, by [`calculate_optimal_movement`].
//!
//! [`AiConfig`]: crate::core::AiConfig

mod priority;
mod candidates;
mod scoring;
mod planner;
mod movement;

pub use priority::Priority;
pub use candidates::{area_targets, classify_spell, generate as generate_candidates, Candidate};
pub use scoring::{score as score_candidate, select_best, ScoredCandidate, ScoringContext};
pub use planner::AiPlanner;
pub use movement::{calculate_optimal_movement, ideal_distance, nearest_opponent};
