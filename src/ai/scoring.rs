//! Candidate scoring.

use super::candidates::Candidate;
use crate::core::AiConfig;

/// Facts about the acting entity that every candidate shares.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoringContext {
    pub self_hp_fraction: f32,
    pub living_opponents: usize,
}

/// A candidate with its final score.
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub score: i32,
}

/// Score one candidate.
///
/// Starts from the bucket base (`base_score - bucket_step * bucket`), then:
/// - `+low_hp_bonus` when the primary target is below `low_hp_threshold`
/// - `+multi_enemy_bonus` for area actions with more than one opponent alive
/// - `+in_range_bonus` if the target is within reach, `-out_of_range_penalty`
///   otherwise
/// - `+self_preservation_bonus` for defensive actions when the actor is
///   badly hurt, `+aggression_bonus` for offensive ones when it is healthy
#[must_use]
pub fn score(candidate: &Candidate, ctx: &ScoringContext, config: &AiConfig) -> i32 {
    let mut score = config.base_score - config.bucket_step * candidate.bucket as i32;

    if candidate.target_hp_fraction < config.low_hp_threshold {
        score += config.low_hp_bonus;
    }
    if candidate.action.aim.is_some() && ctx.living_opponents > 1 {
        score += config.multi_enemy_bonus;
    }
    if candidate.in_range() {
        score += config.in_range_bonus;
    } else {
        score -= config.out_of_range_penalty;
    }

    let action = &candidate.action;
    if ctx.self_hp_fraction < config.self_low_hp_threshold && action.is_defensive() {
        score += config.self_preservation_bonus;
    } else if ctx.self_hp_fraction > config.self_high_hp_threshold && action.is_offensive() {
        score += config.aggression_bonus;
    }
    score
}

/// Highest-scoring candidate; ties go to the earliest one.
#[must_use]
pub fn select_best(scored: Vec<ScoredCandidate>) -> Option<ScoredCandidate> {
    let mut best: Option<ScoredCandidate> = None;
    for entry in scored {
        // Strict comparison keeps the first of equal scores
        if best.as_ref().map_or(true, |b| entry.score > b.score) {
            best = Some(entry);
        }
    }
    best
}
