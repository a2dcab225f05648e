//! The combat session: one acting entity per step.

use rustc_hash::FxHashSet;
use tracing::{debug, info, warn};

use super::encounter::{EncounterSpec, Participant};
use super::ports::{CharacterProvider, CombatPorts};
use super::report::{
    ActionOption, PendingDecision, PlayerChoice, SessionSnapshot, SkipReason, TurnReport, TurnStatus,
};
use crate::ai::{area_targets, calculate_optimal_movement, AiPlanner};
use crate::core::{
    Action, ActionSource, CombatConfig, CombatState, Entity, EntityId, GameRng, MessageCategory, Team,
};
use crate::dice::DiceSource;
use crate::effects::StatusEffectRegistry;
use crate::error::{CombatError, MovementRejection, Result};
use crate::grid::{manhattan_distance, reachable_cells, Position};
use crate::resolver::{CombatResolver, HpChange};
use crate::spellcasting::{SpellBook, SpellCasting, SpellTarget};
use crate::turns::{CombatOutcome, Phase, TurnScheduler};

/// What one step did, before it is turned into a report.
struct Step {
    status: TurnStatus,
    action: Option<Action>,
    moved_to: Option<Position>,
}

impl Step {
    fn status(status: TurnStatus) -> Self {
        Self {
            status,
            action: None,
            moved_to: None,
        }
    }

    fn skipped(reason: SkipReason) -> Self {
        Self::status(TurnStatus::Skipped(reason))
    }
}

/// A running fight.
///
/// Each call to [`advance_turn`](Self::advance_turn) resolves exactly one
/// entity's turn. When the player-controlled entity comes up, the session
/// suspends with a [`PendingDecision`] until the host submits an action.
///
/// ## Example
///
/// ```
/// use tactical_combat::core::CombatConfig;
/// use tactical_combat::dice::ScriptedDice;
/// use tactical_combat::roster::{reference_encounter, reference_party, reference_registry};
/// use tactical_combat::session::{CombatPorts, CombatSession};
///
/// let registry = reference_registry();
/// let mut session = CombatSession::start(
///     &reference_encounter(),
///     &reference_party(),
///     &registry,
///     CombatPorts::default(),
///     Box::new(ScriptedDice::new([10])),
///     CombatConfig::default(),
/// )
/// .unwrap();
///
/// let reports = session.advance_until_input(50);
/// assert!(!reports.is_empty());
/// assert!(session.pending().is_some() || session.is_over());
/// ```
pub struct CombatSession {
    state: CombatState,
    scheduler: TurnScheduler,
    spells: SpellBook,
    config: CombatConfig,
    dice: Box<dyn DiceSource>,
    ports: CombatPorts,
    pending: Option<PendingDecision>,
    /// Log entries already forwarded to the message port.
    flushed: usize,
}

impl std::fmt::Debug for CombatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombatSession")
            .field("phase", &self.scheduler.phase())
            .field("turn", &self.scheduler.turn_number())
            .field("current", &self.scheduler.current_entity())
            .field("pending", &self.pending.is_some())
            .finish_non_exhaustive()
    }
}

impl CombatSession {
    // === Construction ===

    /// Build the roster, validate placement, roll initiative and land on
    /// the first living entity.
    ///
    /// Entities placed out of bounds or on an occupied cell lose their
    /// position; they stay in the initiative order but skip every turn.
    pub fn start(
        spec: &EncounterSpec,
        participants: &[Participant],
        provider: &dyn CharacterProvider,
        ports: CombatPorts,
        mut dice: Box<dyn DiceSource>,
        config: CombatConfig,
    ) -> Result<Self> {
        if participants.is_empty() && spec.enemies.is_empty() {
            return Err(CombatError::EmptyEncounter);
        }

        let bounds = spec.grid.unwrap_or_else(|| config.grid.bounds());
        let mut state = CombatState::new(bounds);

        let mut slots = spec.party_slots.iter().copied();
        for participant in participants {
            let position = participant.position.or_else(|| slots.next());
            let entity = instantiate(
                provider,
                &participant.template,
                participant.team,
                participant.name.as_deref(),
                position,
            )?;
            state.add_entity(entity);
        }
        for placement in &spec.enemies {
            let entity = instantiate(
                provider,
                &placement.template,
                Team::Enemy,
                placement.name.as_deref(),
                Some(placement.position),
            )?;
            state.add_entity(entity);
        }
        validate_positions(&mut state);

        let scheduler = TurnScheduler::roll(state.entities(), dice.as_mut());
        let mut session = Self {
            state,
            scheduler,
            spells: provider.spell_book(),
            config,
            dice,
            ports,
            pending: None,
            flushed: 0,
        };

        session.log(MessageCategory::System, format!("Combat begins: {}", spec.name));
        let lines: Vec<String> = session
            .scheduler
            .order()
            .iter()
            .filter_map(|entry| {
                let entity = session.state.entity(entry.entity)?;
                Some(format!("{} rolls {} for initiative", entity.name, entry.initiative))
            })
            .collect();
        for line in lines {
            session.log(MessageCategory::Initiative, line);
        }

        let outcome = {
            let state = &session.state;
            session.scheduler.begin(|id| state.is_alive(id));
            session.scheduler.check_end(|id| state.is_standing(id))
        };
        if let Some(outcome) = outcome {
            session.announce_outcome(outcome);
        }
        session.flush();

        info!(
            encounter = %spec.name,
            combatants = session.state.len(),
            phase = %session.scheduler.phase(),
            "combat started"
        );
        Ok(session)
    }

    /// `start` with a `GameRng` seeded from `config.seed`.
    pub fn start_seeded(
        spec: &EncounterSpec,
        participants: &[Participant],
        provider: &dyn CharacterProvider,
        ports: CombatPorts,
        config: CombatConfig,
    ) -> Result<Self> {
        let rng = GameRng::new(config.seed);
        Self::start(spec, participants, provider, ports, Box::new(rng), config)
    }

    // === Accessors ===

    #[must_use]
    pub fn state(&self) -> &CombatState {
        &self.state
    }

    #[must_use]
    pub fn scheduler(&self) -> &TurnScheduler {
        &self.scheduler
    }

    #[must_use]
    pub fn spells(&self) -> &SpellBook {
        &self.spells
    }

    #[must_use]
    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.scheduler.phase()
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.scheduler.phase().is_ended()
    }

    #[must_use]
    pub fn outcome(&self) -> Option<CombatOutcome> {
        self.scheduler.outcome()
    }

    #[must_use]
    pub fn current_entity(&self) -> Option<EntityId> {
        self.scheduler.current_entity()
    }

    #[must_use]
    pub fn pending(&self) -> Option<&PendingDecision> {
        self.pending.as_ref()
    }

    /// Serializable view of the whole session.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.scheduler.phase(),
            turn_number: self.scheduler.turn_number(),
            current: self.scheduler.current_entity(),
            turn_order: self.scheduler.order().to_vec(),
            entities: self.state.entities().to_vec(),
            pending: self.pending.clone(),
            log: self.state.log.iter().cloned().collect(),
        }
    }

    // === Turn loop ===

    /// Resolve the current entity's turn.
    ///
    /// Returns without doing anything while a player decision is pending or
    /// after the session has ended.
    pub fn advance_turn(&mut self) -> TurnReport {
        let mark = self.state.log.len();
        let turn = self.scheduler.turn_number();
        let actor = self.scheduler.current_entity();
        let step = self.step();
        self.flush();
        self.report(mark, turn, actor, step)
    }

    /// Run turns until the player must decide or the fight ends, at most
    /// `max_steps` of them.
    pub fn advance_until_input(&mut self, max_steps: usize) -> Vec<TurnReport> {
        let mut reports = Vec::new();
        for _ in 0..max_steps {
            if self.is_over() || self.pending.is_some() {
                break;
            }
            let report = self.advance_turn();
            let stop = report.is_awaiting_player() || report.outcome().is_some();
            reports.push(report);
            if stop {
                break;
            }
        }
        reports
    }

    fn step(&mut self) -> Step {
        if let Some(outcome) = self.scheduler.outcome() {
            return Step::status(TurnStatus::Ended(outcome));
        }
        if self.pending.is_some() {
            return Step::status(TurnStatus::AwaitingPlayer);
        }
        if let Some(outcome) = self.check_end() {
            return Step::status(TurnStatus::Ended(outcome));
        }
        match self.scheduler.current_entity() {
            Some(actor) => self.run_turn(actor),
            None => {
                warn!("empty turn order");
                Step::skipped(SkipReason::Malformed)
            }
        }
    }

    fn run_turn(&mut self, actor: EntityId) -> Step {
        let Some(entity) = self.state.entity(actor) else {
            warn!(entity = %actor, "turn order references unknown entity");
            return self.finish(Step::skipped(SkipReason::Malformed));
        };
        let name = entity.name.clone();
        if !entity.is_alive() {
            return self.finish(Step::skipped(SkipReason::Dead));
        }
        if entity.is_malformed() {
            let err = CombatError::MalformedEntity {
                entity: actor,
                reason: if entity.position.is_none() { "no position" } else { "no hit points" },
            };
            warn!(error = %err, "skipping turn");
            self.log(MessageCategory::System, format!("{name} cannot act"));
            return self.finish(Step::skipped(SkipReason::Malformed));
        }

        let round = self.scheduler.turn_number();
        self.log(MessageCategory::Turn, format!("{name}'s turn (round {round})"));

        if self.tick_effects(actor) {
            return self.finish(Step::skipped(SkipReason::DiedFromEffects));
        }

        let can_act = self
            .state
            .entity(actor)
            .is_some_and(|e| e.effects.aggregate().can_act());
        if !can_act {
            self.log(MessageCategory::Status, format!("{name} is incapacitated and loses the turn"));
            return self.finish(Step::skipped(SkipReason::Incapacitated));
        }

        if self.is_player_controlled(actor) {
            self.pending = self.build_pending(actor, false);
            debug!(entity = %actor, "awaiting player decision");
            return Step::status(TurnStatus::AwaitingPlayer);
        }

        let moved_to = self.ai_move(actor);
        let action = match self.state.entity(actor) {
            Some(entity) => AiPlanner::new(&self.config.ai, &self.spells).best_action(&self.state, entity),
            None => Action::pass(actor),
        };
        let status = self.commit(&action);
        self.finish(Step {
            status,
            action: Some(action),
            moved_to,
        })
    }

    /// Start-of-turn effect processing. Returns whether the entity died.
    fn tick_effects(&mut self, actor: EntityId) -> bool {
        let Some(entity) = self.state.entity_mut(actor) else {
            return false;
        };
        let report = StatusEffectRegistry::tick_start_of_turn(entity, self.dice.as_mut());
        let change = HpChange {
            entity: actor,
            team: entity.team,
            delta: report.hp_delta(),
            hp: entity.hp(),
            max_hp: entity.max_hp(),
            source: None,
        };
        let died = !entity.is_alive();
        let name = entity.name.clone();

        for message in report.messages {
            self.log(MessageCategory::Status, message);
        }
        if report.damage > 0 || report.healing > 0 {
            self.ports.hp_changed(&change);
        }
        if died {
            self.log(MessageCategory::Death, format!("{name} falls"));
        }
        died
    }

    fn ai_move(&mut self, actor: EntityId) -> Option<Position> {
        let entity = self.state.entity(actor)?;
        let name = entity.name.clone();
        let cell = calculate_optimal_movement(&self.state, &self.spells, entity, self.config.max_ideal_range)?;
        if !self.state.move_entity(actor, cell) {
            return None;
        }
        self.log(MessageCategory::Movement, format!("{name} moves to {cell}"));
        Some(cell)
    }

    /// Advance the scheduler past the entity that just finished.
    fn finish(&mut self, step: Step) -> Step {
        let (advance, outcome) = {
            let state = &self.state;
            let advance = self.scheduler.next_turn(|id| state.is_alive(id));
            (advance, self.scheduler.check_end(|id| state.is_standing(id)))
        };
        match outcome {
            Some(outcome) => self.announce_outcome(outcome),
            None if advance.wrapped => {
                let round = self.scheduler.turn_number();
                self.log(MessageCategory::Turn, format!("Round {round} begins"));
            }
            None => {}
        }
        step
    }

    fn check_end(&mut self) -> Option<CombatOutcome> {
        let outcome = {
            let state = &self.state;
            self.scheduler.check_end(|id| state.is_standing(id))
        };
        if let Some(outcome) = outcome {
            self.announce_outcome(outcome);
        }
        outcome
    }

    fn announce_outcome(&mut self, outcome: CombatOutcome) {
        self.pending = None;
        let text = match outcome {
            CombatOutcome::Victory => "Victory! All enemies are defeated.",
            CombatOutcome::Defeat => "Defeat. The party has fallen.",
        };
        self.log(MessageCategory::Outcome, text);
        info!(?outcome, turn = self.scheduler.turn_number(), "combat ended");
    }

    // === Action execution ===

    /// Validate, resolve and apply an action as one unit. Failures are
    /// logged and reported; they never stop the session.
    fn commit(&mut self, action: &Action) -> TurnStatus {
        self.scheduler.set_phase(Phase::ExecutingTurn);
        let result = self.execute(action);
        self.scheduler.set_phase(Phase::Turn);

        match result {
            Ok(changes) => {
                for change in &changes {
                    self.ports.hp_changed(change);
                }
                let turn = self.scheduler.turn_number();
                let sequence = self.state.record_action(action.clone(), turn);
                debug!(entity = %action.actor, kind = ?action.kind, sequence, "action committed");
                TurnStatus::Acted
            }
            Err(err) => {
                warn!(entity = %action.actor, error = %err, "action failed");
                let name = self
                    .state
                    .entity(action.actor)
                    .map_or_else(|| action.actor.to_string(), |e| e.name.clone());
                self.log(MessageCategory::System, format!("{name}'s action fails: {err}"));
                TurnStatus::ActionFailed(err)
            }
        }
    }

    fn execute(&mut self, action: &Action) -> Result<Vec<HpChange>> {
        let turn = self.scheduler.turn_number();
        let state = &self.state;
        let actor = state
            .entity(action.actor)
            .ok_or(CombatError::UnknownEntity(action.actor))?;

        match &action.source {
            ActionSource::None => {
                let text = format!("{} passes", actor.name);
                self.log(MessageCategory::Turn, text);
                Ok(Vec::new())
            }
            ActionSource::Attack(index) => {
                let attack = actor.attacks.get(*index).ok_or_else(|| CombatError::NoResourceAvailable {
                    entity: actor.id,
                    what: format!("attack #{index}"),
                })?;
                let target = validate_target(state, actor, action.primary_target(), attack.range, false)?;
                let outcome = CombatResolver::resolve_attack(actor, target, attack, self.dice.as_mut());
                Ok(CombatResolver::apply_attack(&mut self.state, &outcome, turn))
            }
            ActionSource::Spell(id) => {
                let spell = self.spells.get(id).ok_or_else(|| CombatError::UnknownSpell(id.clone()))?;
                if !actor.can_cast_spell(spell) {
                    return Err(CombatError::NoResourceAvailable {
                        entity: actor.id,
                        what: format!("spell `{id}`"),
                    });
                }

                let targets: Vec<&Entity> = if spell.is_area() {
                    let invalid = || CombatError::InvalidTarget { actor: actor.id };
                    let aim = action.aim.ok_or_else(invalid)?;
                    let origin = actor.position.ok_or_else(invalid)?;
                    if manhattan_distance(origin, aim) > spell.reach() {
                        return Err(invalid());
                    }
                    area_targets(state, actor, spell, aim)
                        .iter()
                        .filter_map(|&id| state.entity(id))
                        .collect()
                } else if spell.target == SpellTarget::SelfOnly {
                    vec![actor]
                } else {
                    action
                        .targets
                        .iter()
                        .map(|&id| validate_target(state, actor, Some(id), spell.range, spell.target.is_friendly()))
                        .collect::<Result<_>>()?
                };
                if targets.is_empty() {
                    return Err(CombatError::InvalidTarget { actor: actor.id });
                }

                let outcome = CombatResolver::resolve_spell(actor, spell, &targets, self.dice.as_mut());
                let level = spell.level;
                let caster = actor.id;

                if let Some(profile) = self.state.entity_mut(caster).and_then(|e| e.spellcasting.as_mut()) {
                    let slot = profile.slots.consume(level);
                    debug!(entity = %caster, spell = %id, ?slot, "spell slot consumed");
                }
                Ok(CombatResolver::apply_spell(&mut self.state, &outcome, turn))
            }
        }
    }

    // === Player flow ===

    fn is_player_controlled(&self, id: EntityId) -> bool {
        !self.config.autoplay_player && self.state.entity(id).is_some_and(|e| e.team == Team::Player)
    }

    fn build_pending(&self, actor: EntityId, moved: bool) -> Option<PendingDecision> {
        let entity = self.state.entity(actor)?;
        let origin = entity.position?;

        let reachable = if moved {
            Vec::new()
        } else {
            let range = entity.effects.aggregate().effective_movement(entity.movement);
            let mut cells = if range == 0 {
                Vec::new()
            } else {
                reachable_cells(self.state.bounds(), origin, range, |cell| {
                    self.state.is_occupied(cell, Some(actor))
                })
            };
            cells.retain(|&cell| cell != origin);
            cells
        };

        let mut options = Vec::new();
        for (index, attack) in entity.attacks.iter().enumerate() {
            let targets = targets_in_range(&self.state, entity, origin, attack.range, false);
            if !targets.is_empty() {
                options.push(ActionOption {
                    choice: PlayerChoice::Attack(index),
                    label: attack.name.clone(),
                    targets,
                });
            }
        }
        for spell in entity.castable_spells(&self.spells) {
            if spell.is_area() {
                for opponent in self.state.opponents_of(entity.team) {
                    let Some(aim) = opponent.position else { continue };
                    if manhattan_distance(origin, aim) > spell.reach() {
                        continue;
                    }
                    options.push(ActionOption {
                        choice: PlayerChoice::SpellAt(spell.id.clone(), aim),
                        label: format!("{} at {}", spell.name, aim),
                        targets: area_targets(&self.state, entity, spell, aim).to_vec(),
                    });
                }
            } else {
                let targets = if spell.target == SpellTarget::SelfOnly {
                    vec![actor]
                } else {
                    targets_in_range(&self.state, entity, origin, spell.range, spell.target.is_friendly())
                };
                if !targets.is_empty() {
                    options.push(ActionOption {
                        choice: PlayerChoice::Spell(spell.id.clone()),
                        label: spell.name.clone(),
                        targets,
                    });
                }
            }
        }
        options.push(ActionOption {
            choice: PlayerChoice::Pass,
            label: "Pass".to_string(),
            targets: Vec::new(),
        });

        Some(PendingDecision {
            entity: actor,
            reachable,
            options,
            moved,
            staged: None,
        })
    }

    fn pending_ref(&self) -> Result<&PendingDecision> {
        if self.is_over() {
            return Err(CombatError::SessionEnded);
        }
        self.pending.as_ref().ok_or(CombatError::NotAwaitingPlayer)
    }

    /// Enter `player-movement`, returning the cells the player may pick.
    pub fn begin_player_movement(&mut self) -> Result<Vec<Position>> {
        let pending = self.pending_ref()?;
        if pending.moved {
            let entity = pending.entity;
            let to = self.state.entity(entity).and_then(|e| e.position).unwrap_or_default();
            return Err(CombatError::InvalidMovement {
                entity,
                to,
                reason: MovementRejection::AlreadyMoved,
            });
        }
        let cells = pending.reachable.clone();
        self.scheduler.set_phase(Phase::PlayerMovement);
        Ok(cells)
    }

    /// Leave `player-movement` without moving.
    pub fn cancel_player_movement(&mut self) -> Result<()> {
        self.pending_ref()?;
        self.scheduler.set_phase(Phase::Turn);
        Ok(())
    }

    /// Move the player to `cell` (once per turn).
    ///
    /// A rejected move leaves the player in place and the decision pending.
    pub fn submit_player_move(&mut self, cell: Position) -> Result<Position> {
        let pending = self.pending_ref()?;
        let actor = pending.entity;
        let moved = pending.moved;
        self.scheduler.set_phase(Phase::Turn);

        let entity = self.state.entity(actor).ok_or(CombatError::UnknownEntity(actor))?;
        let name = entity.name.clone();
        let range = entity.effects.aggregate().effective_movement(entity.movement);
        let rejection = match entity.position {
            _ if moved => Some(MovementRejection::AlreadyMoved),
            _ if range == 0 => Some(MovementRejection::Immobilized),
            _ if !self.state.bounds().contains(cell) => Some(MovementRejection::OutOfBounds),
            Some(origin) if manhattan_distance(origin, cell) > range => Some(MovementRejection::OutOfRange),
            None => Some(MovementRejection::OutOfRange),
            _ if self.state.is_occupied(cell, Some(actor)) => Some(MovementRejection::Occupied),
            _ => None,
        };

        if let Some(reason) = rejection {
            let err = CombatError::InvalidMovement { entity: actor, to: cell, reason };
            warn!(error = %err, "movement rejected");
            self.log(MessageCategory::Movement, format!("{name} cannot move to {cell}: {reason}"));
            self.flush();
            return Err(err);
        }

        self.state.move_entity(actor, cell);
        self.log(MessageCategory::Movement, format!("{name} moves to {cell}"));
        self.pending = self.build_pending(actor, true);
        self.flush();
        Ok(cell)
    }

    /// Hold a choice without resolving it.
    pub fn stage_player_action(&mut self, choice: PlayerChoice, targets: &[EntityId]) -> Result<()> {
        self.pending_ref()?;
        if let Some(pending) = self.pending.as_mut() {
            pending.staged = Some((choice, targets.to_vec()));
        }
        Ok(())
    }

    /// Drop the staged choice. The turn stays pending and nothing else
    /// changes.
    pub fn cancel_pending(&mut self) -> Result<()> {
        self.pending_ref()?;
        if let Some(pending) = self.pending.as_mut() {
            pending.staged = None;
        }
        Ok(())
    }

    /// Submit the staged choice.
    pub fn submit_staged(&mut self) -> Result<TurnReport> {
        let (choice, targets) = self
            .pending_ref()?
            .staged
            .clone()
            .ok_or(CombatError::NotAwaitingPlayer)?;
        self.submit_player_action(choice, &targets)
    }

    /// Resolve the player's action and advance the turn.
    ///
    /// A choice that cannot even be built (unknown attack slot or spell,
    /// missing target) is returned as `Err` and the decision stays
    /// pending. A well-formed action that fails validation is logged and
    /// the turn passes, as for any other entity.
    pub fn submit_player_action(&mut self, choice: PlayerChoice, targets: &[EntityId]) -> Result<TurnReport> {
        let pending = self.pending_ref()?;
        let actor = pending.entity;
        let moved = pending.moved;
        let action = self.build_player_action(actor, &choice, targets)?;

        let mark = self.state.log.len();
        let turn = self.scheduler.turn_number();
        self.pending = None;
        let status = self.commit(&action);
        let moved_to = if moved { self.state.entity(actor).and_then(|e| e.position) } else { None };
        let step = self.finish(Step {
            status,
            action: Some(action),
            moved_to,
        });
        self.flush();
        Ok(self.report(mark, turn, Some(actor), step))
    }

    fn build_player_action(&self, actor: EntityId, choice: &PlayerChoice, targets: &[EntityId]) -> Result<Action> {
        let entity = self.state.entity(actor).ok_or(CombatError::UnknownEntity(actor))?;
        match choice {
            PlayerChoice::Pass => Ok(Action::pass(actor)),
            PlayerChoice::Attack(index) => {
                let attack = entity.attacks.get(*index).ok_or_else(|| CombatError::NoResourceAvailable {
                    entity: actor,
                    what: format!("attack #{index}"),
                })?;
                let target = targets.first().copied().ok_or(CombatError::InvalidTarget { actor })?;
                Ok(Action::from_attack(actor, *index, attack, target))
            }
            PlayerChoice::Spell(id) => {
                let spell = self.spells.get(id).ok_or_else(|| CombatError::UnknownSpell(id.clone()))?;
                if spell.is_area() {
                    return Err(CombatError::InvalidTarget { actor });
                }
                if spell.target == SpellTarget::SelfOnly {
                    return Ok(Action::from_spell(actor, spell, &[actor], None));
                }
                if targets.is_empty() {
                    return Err(CombatError::InvalidTarget { actor });
                }
                Ok(Action::from_spell(actor, spell, targets, None))
            }
            PlayerChoice::SpellAt(id, aim) => {
                let spell = self.spells.get(id).ok_or_else(|| CombatError::UnknownSpell(id.clone()))?;
                if !entity.can_cast_spell(spell) {
                    return Err(CombatError::NoResourceAvailable {
                        entity: actor,
                        what: format!("spell `{id}`"),
                    });
                }
                let in_reach = entity
                    .position
                    .is_some_and(|origin| manhattan_distance(origin, *aim) <= spell.reach());
                if !spell.is_area() || !self.state.bounds().contains(*aim) || !in_reach {
                    return Err(CombatError::InvalidTarget { actor });
                }
                let hit = area_targets(&self.state, entity, spell, *aim);
                Ok(Action::from_spell(actor, spell, &hit, Some(*aim)))
            }
        }
    }

    // === Messages ===

    fn log(&mut self, category: MessageCategory, text: impl Into<String>) {
        let turn = self.scheduler.turn_number();
        self.state.push_log(turn, category, text);
    }

    /// Forward log entries the message port has not seen yet.
    fn flush(&mut self) {
        let entries: Vec<_> = self.state.log.iter().skip(self.flushed).cloned().collect();
        self.flushed = self.state.log.len();
        for entry in entries {
            self.ports.message(&entry.text, entry.category);
        }
    }

    fn report(&self, mark: usize, turn: u32, actor: Option<EntityId>, step: Step) -> TurnReport {
        TurnReport {
            turn,
            actor,
            status: step.status,
            action: step.action,
            moved_to: step.moved_to,
            messages: self.state.log.iter().skip(mark).map(|e| e.text.clone()).collect(),
            phase: self.scheduler.phase(),
        }
    }
}

/// Fresh entity for `template` with the session's team, name and position.
fn instantiate(
    provider: &dyn CharacterProvider,
    template: &str,
    team: Team,
    name: Option<&str>,
    position: Option<Position>,
) -> Result<Entity> {
    let mut entity = provider
        .stat_block(template)
        .ok_or_else(|| CombatError::UnknownTemplate(template.to_string()))?;
    entity.normalize_hp();
    entity.template = template.to_string();
    entity.team = team;
    entity.position = position;
    if let Some(name) = name {
        entity.name = name.to_string();
    }
    entity.attacks.extend(provider.equipment_attacks(template));
    Ok(entity)
}

/// Strip positions that are out of bounds or already taken. Earlier roster
/// entries keep contested cells.
fn validate_positions(state: &mut CombatState) {
    let bounds = state.bounds();
    let placed: Vec<(EntityId, Option<Position>)> = state.entities().iter().map(|e| (e.id, e.position)).collect();
    let mut taken = FxHashSet::default();

    for (id, position) in placed {
        let Some(pos) = position else {
            warn!(entity = %id, "no starting position");
            continue;
        };
        let reason = if !bounds.contains(pos) {
            "out of bounds"
        } else if !taken.insert(pos) {
            "already occupied"
        } else {
            continue;
        };
        warn!(entity = %id, %pos, reason, "invalid starting position");
        if let Some(entity) = state.entity_mut(id) {
            entity.position = None;
            let text = format!("{} cannot be placed at {}: {}", entity.name, pos, reason);
            state.push_log(0, MessageCategory::System, text);
        }
    }
}

/// Living targets on the requested side within `range` of `origin`.
fn targets_in_range(state: &CombatState, actor: &Entity, origin: Position, range: u32, friendly: bool) -> Vec<EntityId> {
    state
        .living()
        .filter(|e| {
            if friendly {
                e.team.is_ally_of(actor.team)
            } else {
                e.team.is_opponent_of(actor.team)
            }
        })
        .filter(|e| e.position.is_some_and(|p| manhattan_distance(origin, p) <= range))
        .map(|e| e.id)
        .collect()
}

/// The living target `target` if it is on the right side and within
/// `range` of `actor`.
fn validate_target<'a>(
    state: &'a CombatState,
    actor: &Entity,
    target: Option<EntityId>,
    range: u32,
    friendly: bool,
) -> Result<&'a Entity> {
    let invalid = || CombatError::InvalidTarget { actor: actor.id };
    let target = target.and_then(|id| state.entity(id)).ok_or_else(invalid)?;
    let side_ok = if friendly {
        target.team.is_ally_of(actor.team)
    } else {
        target.team.is_opponent_of(actor.team)
    };
    let (Some(from), Some(to)) = (actor.position, target.position) else {
        return Err(invalid());
    };
    if !target.is_alive() || !side_ok || manhattan_distance(from, to) > range {
        return Err(invalid());
    }
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Attack;
    use crate::dice::{DiceExpr, ScriptedDice};
    use rustc_hash::FxHashMap;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Blocks(FxHashMap<&'static str, Entity>);

    impl CharacterProvider for Blocks {
        fn stat_block(&self, key: &str) -> Option<Entity> {
            self.0.get(key).cloned()
        }
    }

    fn blocks() -> Blocks {
        let mut map = FxHashMap::default();
        map.insert(
            "fighter",
            Entity::new(EntityId(0), "Fighter", Team::Player, 20, 10)
                .with_attack(Attack::melee("Longsword", 5, DiceExpr::new(1, 8, 3))),
        );
        map.insert(
            "goblin",
            Entity::new(EntityId(0), "Goblin", Team::Enemy, 5, 10)
                .with_attack(Attack::melee("Scimitar", 4, DiceExpr::new(1, 6, 2))),
        );
        Blocks(map)
    }

    fn duel_at(goblin: Position) -> EncounterSpec {
        EncounterSpec::new("duel").with_grid(6, 4).with_enemy("goblin", goblin)
    }

    fn start_with(spec: &EncounterSpec, dice: Vec<u32>, ports: CombatPorts) -> CombatSession {
        let party = [Participant::player("fighter").at(Position::new(0, 0))];
        CombatSession::start(
            spec,
            &party,
            &blocks(),
            ports,
            Box::new(ScriptedDice::new(dice)),
            CombatConfig::default(),
        )
        .unwrap()
    }

    fn duel(dice: Vec<u32>) -> CombatSession {
        start_with(&duel_at(Position::new(1, 0)), dice, CombatPorts::default())
    }

    const FIGHTER: EntityId = EntityId(0);
    const GOBLIN: EntityId = EntityId(1);

    #[test]
    fn test_start_rejects_empty_encounter() {
        let err = CombatSession::start(
            &EncounterSpec::new("nobody"),
            &[],
            &blocks(),
            CombatPorts::default(),
            Box::new(ScriptedDice::new([10])),
            CombatConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, CombatError::EmptyEncounter);
    }

    #[test]
    fn test_start_rejects_unknown_template() {
        let spec = EncounterSpec::new("bad").with_enemy("dragon", Position::new(3, 3));
        let err = CombatSession::start(
            &spec,
            &[],
            &blocks(),
            CombatPorts::default(),
            Box::new(ScriptedDice::new([10])),
            CombatConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, CombatError::UnknownTemplate("dragon".to_string()));
    }

    #[test]
    fn test_player_turn_suspends_until_submission() {
        let mut session = duel(vec![15, 5]);
        assert_eq!(session.current_entity(), Some(FIGHTER));

        let report = session.advance_turn();
        assert!(report.is_awaiting_player());
        let pending = session.pending().unwrap();
        assert_eq!(pending.entity, FIGHTER);
        assert_eq!(pending.options[0].choice, PlayerChoice::Attack(0));
        assert_eq!(pending.options[0].targets, vec![GOBLIN]);
        assert_eq!(pending.options.last().unwrap().choice, PlayerChoice::Pass);

        // Nothing moves while the decision is open.
        let again = session.advance_turn();
        assert_eq!(again.status, TurnStatus::AwaitingPlayer);
        assert!(again.messages.is_empty());
        assert_eq!(session.current_entity(), Some(FIGHTER));
    }

    #[test]
    fn test_player_attack_ends_combat() {
        // Initiative 15/5, attack roll 15, damage 8 + 3.
        let mut session = duel(vec![15, 5, 15, 8]);
        session.advance_turn();

        let report = session.submit_player_action(PlayerChoice::Attack(0), &[GOBLIN]).unwrap();

        assert_eq!(report.status, TurnStatus::Acted);
        assert_eq!(report.outcome(), Some(CombatOutcome::Victory));
        assert!(session.is_over());
        assert!(!session.state().is_alive(GOBLIN));
        assert!(report.messages.iter().any(|m| m == "Goblin falls"));
        assert_eq!(report.messages.last().unwrap(), "Victory! All enemies are defeated.");

        assert_eq!(
            session.submit_player_action(PlayerChoice::Pass, &[]),
            Err(CombatError::SessionEnded)
        );
    }

    #[test]
    fn test_invalid_player_action_passes_turn() {
        let mut session = duel(vec![15, 5]);
        session.advance_turn();

        let report = session.submit_player_action(PlayerChoice::Attack(0), &[FIGHTER]).unwrap();

        assert_eq!(report.status, TurnStatus::ActionFailed(CombatError::InvalidTarget { actor: FIGHTER }));
        assert!(session.pending().is_none());
        assert_eq!(session.current_entity(), Some(GOBLIN));
    }

    #[test]
    fn test_unbuildable_choice_keeps_decision_pending() {
        let mut session = duel(vec![15, 5]);
        session.advance_turn();

        let err = session.submit_player_action(PlayerChoice::Attack(0), &[]).unwrap_err();
        assert_eq!(err, CombatError::InvalidTarget { actor: FIGHTER });
        assert!(session.pending().is_some());
        assert_eq!(session.current_entity(), Some(FIGHTER));
    }

    #[test]
    fn test_player_movement_rules() {
        let mut session = duel(vec![15, 5]);
        session.advance_turn();

        let cells = session.begin_player_movement().unwrap();
        assert_eq!(session.phase(), Phase::PlayerMovement);
        assert!(!cells.contains(&Position::new(0, 0)));
        assert!(!cells.contains(&Position::new(1, 0)));

        let reject = |err: CombatError| match err {
            CombatError::InvalidMovement { reason, .. } => reason,
            other => panic!("unexpected error {other:?}"),
        };
        assert_eq!(
            reject(session.submit_player_move(Position::new(9, 9)).unwrap_err()),
            MovementRejection::OutOfBounds
        );
        assert_eq!(session.phase(), Phase::Turn);
        assert_eq!(
            reject(session.submit_player_move(Position::new(5, 3)).unwrap_err()),
            MovementRejection::OutOfRange
        );
        assert_eq!(
            reject(session.submit_player_move(Position::new(1, 0)).unwrap_err()),
            MovementRejection::Occupied
        );

        assert_eq!(session.submit_player_move(Position::new(0, 1)), Ok(Position::new(0, 1)));
        assert_eq!(session.state().entity(FIGHTER).unwrap().position, Some(Position::new(0, 1)));
        assert!(session.pending().unwrap().moved);
        assert!(session.pending().unwrap().reachable.is_empty());

        assert_eq!(
            reject(session.submit_player_move(Position::new(0, 2)).unwrap_err()),
            MovementRejection::AlreadyMoved
        );
        assert!(session.begin_player_movement().is_err());
    }

    #[test]
    fn test_staged_choice_can_be_cancelled() {
        let mut session = duel(vec![15, 5]);
        session.advance_turn();

        session.stage_player_action(PlayerChoice::Pass, &[]).unwrap();
        assert!(session.pending().unwrap().staged.is_some());

        session.cancel_pending().unwrap();
        assert!(session.pending().unwrap().staged.is_none());
        assert_eq!(session.current_entity(), Some(FIGHTER));

        session.stage_player_action(PlayerChoice::Pass, &[]).unwrap();
        let report = session.submit_staged().unwrap();
        assert_eq!(report.status, TurnStatus::Acted);
        assert_eq!(session.current_entity(), Some(GOBLIN));
    }

    #[test]
    fn test_ai_turn_reports_hp_to_party_port() {
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&changes);
        let ports = CombatPorts::new().with_party_hp(move |c| sink.borrow_mut().push(c.clone()));
        // Goblin wins initiative, hits with 15 + 4 and deals 6 + 2.
        let mut session = start_with(&duel_at(Position::new(1, 0)), vec![5, 15, 15, 6], ports);
        assert_eq!(session.current_entity(), Some(GOBLIN));

        let report = session.advance_turn();

        assert_eq!(report.status, TurnStatus::Acted);
        assert_eq!(report.moved_to, None);
        assert_eq!(session.state().entity(FIGHTER).unwrap().hp(), 12);
        let changes = changes.borrow();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].delta, -8);
        assert_eq!(changes[0].source, Some(GOBLIN));
        assert_eq!(session.current_entity(), Some(FIGHTER));
    }

    #[test]
    fn test_ai_closes_distance_before_acting() {
        let mut session = start_with(&duel_at(Position::new(5, 0)), vec![5, 15, 2], CombatPorts::default());

        let report = session.advance_turn();

        assert_eq!(report.moved_to, Some(Position::new(1, 0)));
        assert_eq!(report.status, TurnStatus::Acted);
        assert!(report.messages.iter().any(|m| m == "Goblin moves to (1, 0)"));
    }

    fn skirmish() -> EncounterSpec {
        duel_at(Position::new(1, 0)).with_enemy("goblin", Position::new(9, 9))
    }

    const LOST_GOBLIN: EntityId = EntityId(2);

    #[test]
    fn test_misplaced_entity_is_stripped_and_skipped() {
        let mut session = start_with(&skirmish(), vec![10, 5, 15], CombatPorts::default());

        assert_eq!(session.state().entity(LOST_GOBLIN).unwrap().position, None);
        assert!(session.state().log.iter().any(|e| e.text.contains("cannot be placed")));

        let report = session.advance_turn();
        assert_eq!(report.status, TurnStatus::Skipped(SkipReason::Malformed));
        assert_eq!(session.current_entity(), Some(FIGHTER));
    }

    #[test]
    fn test_unplaced_enemy_does_not_block_victory() {
        let config = CombatConfig {
            autoplay_player: true,
            ..CombatConfig::default()
        };
        let party = [Participant::player("fighter").at(Position::new(0, 0))];
        // Fighter 15, goblins 5 and 1, then a 19 to hit and 8 damage
        let mut session = CombatSession::start(
            &skirmish(),
            &party,
            &blocks(),
            CombatPorts::default(),
            Box::new(ScriptedDice::new([15, 5, 1, 19, 8])),
            config,
        )
        .unwrap();

        session.advance_until_input(50);

        assert_eq!(session.outcome(), Some(CombatOutcome::Victory));
        let lost = session.state().entity(LOST_GOBLIN).unwrap();
        assert!(lost.is_alive());
        assert_eq!(lost.position, None);
    }

    #[test]
    fn test_only_unplaced_party_is_defeat() {
        let party = [Participant::player("fighter").at(Position::new(9, 9))];
        let session = CombatSession::start(
            &duel_at(Position::new(1, 0)),
            &party,
            &blocks(),
            CombatPorts::default(),
            Box::new(ScriptedDice::new([15, 5])),
            CombatConfig::default(),
        )
        .unwrap();

        assert_eq!(session.outcome(), Some(CombatOutcome::Defeat));
        assert!(session.is_over());
    }

    #[test]
    fn test_provider_hp_is_normalized() {
        let mut value = serde_json::to_value(blocks().0["goblin"].clone()).unwrap();
        value["hp"] = 50.into();
        let mut provider = blocks();
        provider.0.insert("goblin", serde_json::from_value(value).unwrap());

        let session = CombatSession::start(
            &duel_at(Position::new(1, 0)),
            &[Participant::player("fighter").at(Position::new(0, 0))],
            &provider,
            CombatPorts::default(),
            Box::new(ScriptedDice::new([15, 5])),
            CombatConfig::default(),
        )
        .unwrap();

        let goblin = session.state().entity(GOBLIN).unwrap();
        assert_eq!((goblin.hp(), goblin.max_hp()), (5, 5));
    }

    #[test]
    fn test_area_aim_from_non_caster_is_rejected() {
        let mut session = duel(vec![15, 5]);
        session.advance_turn();

        let err = session
            .submit_player_action(PlayerChoice::SpellAt("fireball".into(), Position::new(i32::MAX, 0)), &[])
            .unwrap_err();

        assert!(matches!(err, CombatError::NoResourceAvailable { entity: FIGHTER, .. }));
        assert!(session.pending().is_some());
    }

    #[test]
    fn test_unknown_attack_index_keeps_decision_pending() {
        let mut session = duel(vec![15, 5]);
        session.advance_turn();

        let err = session.submit_player_action(PlayerChoice::Attack(9), &[GOBLIN]).unwrap_err();

        assert!(matches!(err, CombatError::NoResourceAvailable { entity: FIGHTER, .. }));
        assert_eq!(session.current_entity(), Some(FIGHTER));
        assert!(session.pending().is_some());
    }

    #[test]
    fn test_messages_reach_port_once() {
        let lines = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&lines);
        let ports = CombatPorts::new().with_message(move |text, _| sink.borrow_mut().push(text.to_string()));
        let mut session = start_with(&duel_at(Position::new(1, 0)), vec![15, 5], ports);
        session.advance_turn();
        session.advance_turn();

        let lines = lines.borrow();
        assert_eq!(lines.len(), session.state().log.len());
        assert_eq!(lines[0], "Combat begins: duel");
    }

    #[test]
    fn test_autoplay_runs_to_completion() {
        let config = CombatConfig {
            autoplay_player: true,
            ..CombatConfig::default()
        };
        let party = [Participant::player("fighter").at(Position::new(0, 0))];
        let mut session = CombatSession::start(
            &duel_at(Position::new(1, 0)),
            &party,
            &blocks(),
            CombatPorts::default(),
            Box::new(ScriptedDice::new([15, 5, 15, 8])),
            config,
        )
        .unwrap();

        let reports = session.advance_until_input(10);

        assert_eq!(reports.len(), 1);
        assert_eq!(session.outcome(), Some(CombatOutcome::Victory));
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut session = duel(vec![15, 5]);
        session.advance_turn();

        let snapshot = session.snapshot();
        assert_eq!(snapshot.pending.as_ref().map(|p| p.entity), Some(FIGHTER));
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: SessionSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
