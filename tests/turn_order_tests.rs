//! Initiative and turn-order integration tests.

use tactical_combat::core::{CombatConfig, Entity, EntityId, Team};
use tactical_combat::dice::ScriptedDice;
use tactical_combat::grid::Position;
use tactical_combat::roster::reference_registry;
use tactical_combat::session::{CharacterProvider, CombatPorts, CombatSession, EncounterSpec, Participant, TurnStatus};
use tactical_combat::turns::{roll_initiative, CombatOutcome, Phase, TurnScheduler};

fn block(template: &str, team: Team) -> Entity {
    let mut entity = reference_registry().stat_block(template).unwrap();
    entity.team = team;
    entity
}

// =============================================================================
// Initiative
// =============================================================================

/// Test that initiative adds the Dexterity modifier and sorts descending.
#[test]
fn test_initiative_sorted_with_dex_bonus() {
    let mut fighter = block("fighter", Team::Player);
    let mut goblin = block("goblin", Team::Enemy);
    fighter.id = EntityId(0);
    goblin.id = EntityId(1);

    // Fighter 8 + 1, goblin 12 + 2
    let order = roll_initiative([&fighter, &goblin], &mut ScriptedDice::new([8, 12]));

    assert_eq!(order.len(), 2);
    assert_eq!(order[0].entity, goblin.id);
    assert_eq!(order[0].initiative, 14);
    assert_eq!(order[1].initiative, 9);
}

/// Test that ties go to the player, then companions, then enemies.
#[test]
fn test_initiative_ties_favor_party() {
    let mut goblin = block("goblin", Team::Enemy);
    let mut cleric = block("cleric", Team::Companion);
    let mut fighter = block("fighter", Team::Player);
    goblin.id = EntityId(0);
    cleric.id = EntityId(1);
    fighter.id = EntityId(2);

    // Everyone lands on 11: goblin 9 + 2, cleric 11 + 0, fighter 10 + 1
    let order = roll_initiative([&goblin, &cleric, &fighter], &mut ScriptedDice::new([9, 11, 10]));

    let teams: Vec<Team> = order.iter().map(|e| e.team).collect();
    assert_eq!(teams, vec![Team::Player, Team::Companion, Team::Enemy]);
    assert!(order.iter().all(|e| e.initiative == 11));
}

// =============================================================================
// Scheduling
// =============================================================================

/// Test that the order keeps its slots when entities die.
#[test]
fn test_order_is_fixed_for_the_fight() {
    let entities: Vec<Entity> = ["fighter", "goblin", "goblin"]
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let team = if i == 0 { Team::Player } else { Team::Enemy };
            let mut e = block(t, team);
            e.id = EntityId(i as u32);
            e
        })
        .collect();
    let mut scheduler = TurnScheduler::roll(&entities, &mut ScriptedDice::new([15, 10, 5]));
    scheduler.begin(|_| true);
    let before: Vec<_> = scheduler.order().to_vec();

    // The middle goblin dies; its slot stays but is skipped.
    let dead = before[1].entity;
    let advance = scheduler.next_turn(|id| id != dead);

    assert_eq!(scheduler.order(), before.as_slice());
    assert_eq!(advance.entity, Some(before[2].entity));
    assert_eq!(advance.steps, 2);
    assert_eq!(scheduler.phase(), Phase::Turn);

    let advance = scheduler.next_turn(|id| id == before[0].entity);
    assert_eq!(advance.outcome, Some(CombatOutcome::Victory));
    assert!(scheduler.phase().is_ended());
}

/// Test that a full pass through the order starts a new round.
#[test]
fn test_round_wraps_in_session() {
    let spec = EncounterSpec::new("field")
        .with_grid(8, 6)
        .with_enemy("goblin", Position::new(7, 5));
    let party = [Participant::player("fighter").at(Position::new(0, 0))];
    let config = CombatConfig {
        autoplay_player: true,
        ..CombatConfig::default()
    };
    // Fighter 15 + 1, goblin 5 + 2, then every roll is a 1.
    let mut session = CombatSession::start(
        &spec,
        &party,
        &reference_registry(),
        CombatPorts::default(),
        Box::new(ScriptedDice::new([15, 5, 1])),
        config,
    )
    .unwrap();
    assert_eq!(session.scheduler().turn_number(), 1);

    let first = session.advance_turn();
    let second = session.advance_turn();

    assert_eq!(first.actor, Some(EntityId(0)));
    assert!(first.moved_to.is_some());
    assert_eq!(second.actor, Some(EntityId(1)));
    assert!(matches!(second.status, TurnStatus::Acted | TurnStatus::ActionFailed(_)));
    assert_eq!(session.scheduler().turn_number(), 2);
    assert!(session.state().log.iter().any(|e| e.text == "Round 2 begins"));
    assert_eq!(session.current_entity(), Some(EntityId(0)));
}
