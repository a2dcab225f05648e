//! Combat state: the roster, the battlefield and the narrative record.
//!
//! ## CombatState
//!
//! Observable information for the whole fight:
//! - Entities in roster order (lookup by id through an `FxHashMap` index)
//! - Grid bounds
//! - Narrative log and committed action history
//!
//! The log and history use `im` persistent vectors so that snapshots of a
//! running session clone in O(1).

use im::Vector;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::action::{Action, ActionRecord};
use super::entity::{Entity, EntityId, Team};
use crate::grid::{self, GridBounds, Position, PositionMap};

/// Category tag for narrative messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageCategory {
    System,
    Initiative,
    Turn,
    Movement,
    Attack,
    Spell,
    Damage,
    Healing,
    Status,
    Death,
    Outcome,
}

/// One narrative log line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Round the message was emitted in.
    pub turn: u32,
    pub category: MessageCategory,
    pub text: String,
}

/// The roster and battlefield of one combat session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CombatState {
    bounds: GridBounds,

    /// Entities in roster order.
    entities: Vec<Entity>,

    /// Entity id to index in `entities`.
    index: FxHashMap<EntityId, usize>,

    /// Narrative log.
    pub log: Vector<LogEntry>,

    /// Every committed action in order.
    pub history: Vector<ActionRecord>,

    action_sequence: u32,
    next_entity_id: u32,
}

impl CombatState {
    #[must_use]
    pub fn new(bounds: GridBounds) -> Self {
        Self {
            bounds,
            entities: Vec::new(),
            index: FxHashMap::default(),
            log: Vector::new(),
            history: Vector::new(),
            action_sequence: 0,
            next_entity_id: 0,
        }
    }

    #[must_use]
    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    // === Entity Management ===

    /// Allocate a new entity ID.
    pub fn alloc_entity(&mut self) -> EntityId {
        let id = EntityId(self.next_entity_id);
        self.next_entity_id += 1;
        id
    }

    /// Add an entity to the roster, assigning it a fresh id.
    pub fn add_entity(&mut self, mut entity: Entity) -> EntityId {
        let id = self.alloc_entity();
        entity.id = id;
        self.index.insert(id, self.entities.len());
        self.entities.push(entity);
        id
    }

    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.index.get(&id).map(|&i| &self.entities[i])
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        match self.index.get(&id) {
            Some(&i) => self.entities.get_mut(i),
            None => None,
        }
    }

    /// All entities in roster order, dead ones included.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Whether `id` names a living entity.
    #[must_use]
    pub fn is_alive(&self, id: EntityId) -> bool {
        self.entity(id).is_some_and(Entity::is_alive)
    }

    /// Whether `id` still counts toward its side: alive and placed on the
    /// grid. Malformed entities can never be targeted, so they cannot hold
    /// a fight open.
    #[must_use]
    pub fn is_standing(&self, id: EntityId) -> bool {
        self.entity(id).is_some_and(|e| e.is_alive() && !e.is_malformed())
    }

    pub fn living(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|e| e.is_alive())
    }

    /// Living entities on the same side as `team` (the asking entity included).
    pub fn allies_of(&self, team: Team) -> impl Iterator<Item = &Entity> {
        self.living().filter(move |e| e.team.is_ally_of(team))
    }

    /// Living entities on the opposing side of `team`.
    pub fn opponents_of(&self, team: Team) -> impl Iterator<Item = &Entity> {
        self.living().filter(move |e| e.team.is_opponent_of(team))
    }

    // === Positions ===

    /// Positions of every placed entity.
    #[must_use]
    pub fn position_map(&self) -> PositionMap {
        self.entities
            .iter()
            .filter_map(|e| e.position.map(|p| (e.id, p)))
            .collect()
    }

    /// Whether a living entity other than `exclude` stands on `pos`.
    #[must_use]
    pub fn is_occupied(&self, pos: Position, exclude: Option<EntityId>) -> bool {
        grid::is_occupied(pos, &self.position_map(), |id| self.is_alive(id), exclude)
    }

    /// Living entity standing on `pos`, if any.
    #[must_use]
    pub fn entity_at(&self, pos: Position) -> Option<&Entity> {
        self.living().find(|e| e.position == Some(pos))
    }

    /// Place `id` on `to`. Returns false for an unknown id.
    pub fn move_entity(&mut self, id: EntityId, to: Position) -> bool {
        match self.entity_mut(id) {
            Some(entity) => {
                entity.position = Some(to);
                true
            }
            None => false,
        }
    }

    // === Log and History ===

    /// Append a narrative message.
    pub fn push_log(&mut self, turn: u32, category: MessageCategory, text: impl Into<String>) {
        self.log.push_back(LogEntry {
            turn,
            category,
            text: text.into(),
        });
    }

    /// Record a committed action, returning its sequence number.
    pub fn record_action(&mut self, action: Action, turn: u32) -> u32 {
        let sequence = self.next_sequence();
        self.history
            .push_back(ActionRecord::new(action.actor, action, turn, sequence));
        sequence
    }

    /// Get the next action sequence number and increment.
    pub fn next_sequence(&mut self) -> u32 {
        let seq = self.action_sequence;
        self.action_sequence += 1;
        seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_two() -> (CombatState, EntityId, EntityId) {
        let mut state = CombatState::new(GridBounds::new(8, 6));
        let hero = state.add_entity(Entity::new(EntityId(99), "Hero", Team::Player, 20, 15).at(Position::new(0, 2)));
        let orc = state.add_entity(Entity::new(EntityId(99), "Orc", Team::Enemy, 15, 13).at(Position::new(5, 2)));
        (state, hero, orc)
    }

    #[test]
    fn test_add_entity_assigns_ids() {
        let (state, hero, orc) = state_with_two();

        assert_eq!(hero, EntityId(0));
        assert_eq!(orc, EntityId(1));
        assert_eq!(state.entity(orc).map(|e| e.name.as_str()), Some("Orc"));
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn test_allies_and_opponents() {
        let (mut state, hero, orc) = state_with_two();
        let ally = state.add_entity(Entity::new(EntityId(0), "Cleric", Team::Companion, 12, 14).at(Position::new(0, 3)));

        let allies: Vec<_> = state.allies_of(Team::Player).map(|e| e.id).collect();
        assert_eq!(allies, vec![hero, ally]);

        let opponents: Vec<_> = state.opponents_of(Team::Companion).map(|e| e.id).collect();
        assert_eq!(opponents, vec![orc]);
    }

    #[test]
    fn test_unplaced_entities_are_not_standing() {
        let (mut state, hero, orc) = state_with_two();
        let lost = state.add_entity(Entity::new(EntityId(0), "Lost", Team::Enemy, 7, 12));

        assert!(state.is_standing(hero));
        assert!(state.is_alive(lost));
        assert!(!state.is_standing(lost));

        state.entity_mut(orc).unwrap().take_damage(15);
        assert!(!state.is_standing(orc));
        assert!(!state.is_standing(EntityId(42)));
    }

    #[test]
    fn test_dead_entities_do_not_occupy() {
        let (mut state, hero, orc) = state_with_two();
        let cell = Position::new(5, 2);

        assert!(state.is_occupied(cell, None));
        assert!(!state.is_occupied(cell, Some(orc)));

        state.entity_mut(orc).unwrap().take_damage(100);
        assert!(!state.is_occupied(cell, None));
        assert!(state.entity_at(cell).is_none());
        assert!(state.is_alive(hero));
        assert!(!state.is_alive(orc));
    }

    #[test]
    fn test_move_entity() {
        let (mut state, hero, _) = state_with_two();

        assert!(state.move_entity(hero, Position::new(3, 2)));
        assert_eq!(state.entity(hero).unwrap().position, Some(Position::new(3, 2)));
        assert!(!state.move_entity(EntityId(42), Position::new(0, 0)));
    }

    #[test]
    fn test_history_sequence() {
        let (mut state, hero, _) = state_with_two();

        assert_eq!(state.record_action(Action::pass(hero), 1), 0);
        assert_eq!(state.record_action(Action::pass(hero), 1), 1);
        assert_eq!(state.history.len(), 2);
        assert_eq!(state.history[1].sequence, 1);
    }

    #[test]
    fn test_log_snapshot_is_independent() {
        let (mut state, _, _) = state_with_two();
        state.push_log(1, MessageCategory::System, "Combat begins");

        let snapshot = state.log.clone();
        state.push_log(1, MessageCategory::Turn, "Hero's turn");

        assert_eq!(snapshot.len(), 1);
        assert_eq!(state.log.len(), 2);
    }

    #[test]
    fn test_state_serialization() {
        let (mut state, hero, _) = state_with_two();
        state.push_log(1, MessageCategory::System, "Combat begins");
        state.record_action(Action::pass(hero), 1);

        let json = serde_json::to_string(&state).unwrap();
        let back: CombatState = serde_json::from_str(&json).unwrap();

        assert_eq!(back.len(), 2);
        assert_eq!(back.entity(hero), state.entity(hero));
        assert_eq!(back.log, state.log);
        assert_eq!(back.history, state.history);
    }
}
