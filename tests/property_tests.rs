//! Property tests for the invariants every fight must keep.

use proptest::prelude::*;
use rustc_hash::FxHashSet;

use tactical_combat::core::{CombatConfig, Entity, EntityId, Team};
use tactical_combat::dice::ScriptedDice;
use tactical_combat::effects::StatusEffectKind;
use tactical_combat::grid::{manhattan_distance, reachable_cells, GridBounds, Position};
use tactical_combat::roster::{reference_encounter, reference_party, reference_registry};
use tactical_combat::session::{CombatPorts, CombatSession};
use tactical_combat::turns::roll_initiative;

#[derive(Clone, Debug)]
enum HpOp {
    Damage(i32),
    Heal(i32),
}

fn hp_op() -> impl Strategy<Value = HpOp> {
    prop_oneof![(0..50i32).prop_map(HpOp::Damage), (0..50i32).prop_map(HpOp::Heal)]
}

proptest! {
    #[test]
    fn prop_hp_stays_in_bounds(max_hp in 1..60i32, ops in prop::collection::vec(hp_op(), 0..40)) {
        let mut entity = Entity::new(EntityId(0), "Dummy", Team::Enemy, max_hp, 10);
        for op in ops {
            match op {
                HpOp::Damage(n) => { entity.take_damage(n); }
                HpOp::Heal(n) => { entity.heal(n); }
            }
            prop_assert!(entity.hp() >= 0 && entity.hp() <= entity.max_hp());
            prop_assert_eq!(entity.is_alive(), entity.hp() > 0);
        }
    }

    #[test]
    fn prop_initiative_covers_everyone_once(rolls in prop::collection::vec(1..=20u32, 1..12)) {
        let entities: Vec<Entity> = rolls
            .iter()
            .enumerate()
            .map(|(i, _)| {
                let team = match i % 3 { 0 => Team::Player, 1 => Team::Companion, _ => Team::Enemy };
                Entity::new(EntityId(i as u32), format!("E{i}"), team, 10, 10)
            })
            .collect();
        let order = roll_initiative(&entities, &mut ScriptedDice::new(rolls.clone()));

        prop_assert_eq!(order.len(), entities.len());
        let ids: FxHashSet<EntityId> = order.iter().map(|e| e.entity).collect();
        prop_assert_eq!(ids.len(), entities.len());
        for pair in order.windows(2) {
            prop_assert!(pair[0].initiative >= pair[1].initiative);
            if pair[0].initiative == pair[1].initiative {
                prop_assert!(pair[0].team.initiative_rank() <= pair[1].team.initiative_rank());
            }
        }
    }

    #[test]
    fn prop_effects_never_duplicate(applications in prop::collection::vec((0..12usize, 0..6u32), 0..30)) {
        let mut entity = Entity::new(EntityId(0), "Dummy", Team::Enemy, 10, 10);
        for (kind, duration) in applications {
            entity.effects.apply(StatusEffectKind::ALL[kind], duration, None);
        }
        let kinds: FxHashSet<StatusEffectKind> = entity.effects.iter().map(|e| e.kind).collect();
        prop_assert_eq!(kinds.len(), entity.effects.len());
        prop_assert!(entity.effects.iter().all(|e| e.remaining > 0));
    }

    #[test]
    fn prop_reachable_cells_are_legal(
        width in 1..12i32,
        height in 1..12i32,
        x in 0..12i32,
        y in 0..12i32,
        range in 0..8u32,
        blocked in prop::collection::vec((0..12i32, 0..12i32), 0..10),
    ) {
        let bounds = GridBounds::new(width, height);
        let origin = Position::new(x % width, y % height);
        let blocked: FxHashSet<Position> = blocked.into_iter().map(|(bx, by)| Position::new(bx, by)).collect();

        let cells = reachable_cells(bounds, origin, range, |c| blocked.contains(&c));

        for cell in &cells {
            prop_assert!(bounds.contains(*cell));
            prop_assert!(manhattan_distance(origin, *cell) <= range);
            prop_assert!(!blocked.contains(cell));
        }
        let unique: FxHashSet<Position> = cells.iter().copied().collect();
        prop_assert_eq!(unique.len(), cells.len());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_seeded_fights_keep_the_board_consistent(seed in any::<u64>()) {
        let config = CombatConfig { seed, autoplay_player: true, ..CombatConfig::default() };
        let registry = reference_registry();
        let mut session = CombatSession::start_seeded(
            &reference_encounter(),
            &reference_party(),
            &registry,
            CombatPorts::default(),
            config,
        ).unwrap();

        for _ in 0..300 {
            if session.is_over() {
                break;
            }
            session.advance_turn();

            let state = session.state();
            let mut occupied = FxHashSet::default();
            for entity in state.entities() {
                prop_assert!(entity.hp() >= 0 && entity.hp() <= entity.max_hp());
                if let (true, Some(pos)) = (entity.is_alive(), entity.position) {
                    prop_assert!(state.bounds().contains(pos));
                    prop_assert!(occupied.insert(pos), "two living entities on {}", pos);
                }
            }
        }
    }
}
