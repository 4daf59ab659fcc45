//! Combat integration tests
//!
//! Drives a full `Simulation` against a `GridSpatial` world, syncing bodies
//! before every tick the way a host engine would.

use glam::Vec2;
use skirmish_common::{ActorId, Cardinal};
use skirmish_core::*;

/// Binary-exact tick so accumulated time hits deadlines exactly.
const DT: f32 = 1.0 / 64.0;

fn step(sim: &mut Simulation, grid: &mut GridSpatial, ticks: usize) {
    for _ in 0..ticks {
        grid.sync_bodies(sim.bodies());
        sim.tick(DT, grid);
    }
}

fn press(sim: &mut Simulation, grid: &mut GridSpatial, player: ActorId, input: PlayerInput) {
    sim.submit_input(player, input).expect("player exists");
    step(sim, grid, 1);
}

/// An enemy that stands still and does not get pushed around.
fn dummy() -> EnemyConfig {
    EnemyConfig {
        stats: ActorStats::default().with_knockback(0.0, 0.25),
        patrol_distance: 0.0,
        ..EnemyConfig::default()
    }
}

fn combo_steps(events: &[CombatEvent]) -> Vec<(usize, i32)> {
    events
        .iter()
        .filter_map(|e| match e {
            CombatEvent::ComboStep { step, damage, .. } => Some((*step, *damage)),
            _ => None,
        })
        .collect()
}

fn health(sim: &Simulation, id: ActorId) -> i32 {
    sim.actor(id).map_or(i32::MIN, |a| a.health().current())
}

#[test]
fn test_three_step_combo_then_noop() {
    let mut grid = GridSpatial::new(1.0);
    let mut sim = Simulation::new(7);
    let player = sim.spawn_player(PlayerConfig::default(), Vec2::ZERO);
    let enemy = sim.spawn_enemy(dummy(), Vec2::new(1.0, 0.0), None);

    for _ in 0..4 {
        press(&mut sim, &mut grid, player, PlayerInput::attack());
        step(&mut sim, &mut grid, 27);
    }

    let events = sim.drain_events();
    assert_eq!(combo_steps(&events), vec![(0, 1), (1, 1), (2, 2)]);
    assert_eq!(health(&sim, enemy), 96);
}

#[test]
fn test_combo_resets_after_pause() {
    let mut grid = GridSpatial::new(1.0);
    let mut sim = Simulation::new(7);
    let player = sim.spawn_player(PlayerConfig::default(), Vec2::ZERO);
    sim.spawn_enemy(dummy(), Vec2::new(1.0, 0.0), None);

    press(&mut sim, &mut grid, player, PlayerInput::attack());
    step(&mut sim, &mut grid, 27);
    press(&mut sim, &mut grid, player, PlayerInput::attack());
    // Well past the reset time.
    step(&mut sim, &mut grid, 128);
    press(&mut sim, &mut grid, player, PlayerInput::attack());

    let steps: Vec<usize> = combo_steps(&sim.drain_events())
        .into_iter()
        .map(|(s, _)| s)
        .collect();
    assert_eq!(steps, vec![0, 1, 0]);
}

#[test]
fn test_early_press_queues_follow_up() {
    let mut grid = GridSpatial::new(1.0);
    let mut sim = Simulation::new(7);
    let player = sim.spawn_player(PlayerConfig::default(), Vec2::ZERO);
    sim.spawn_enemy(dummy(), Vec2::new(1.0, 0.0), None);

    press(&mut sim, &mut grid, player, PlayerInput::attack());
    // Past half the attack duration but before it ends.
    step(&mut sim, &mut grid, 15);
    press(&mut sim, &mut grid, player, PlayerInput::attack());
    assert_eq!(combo_steps(&sim.drain_events()).len(), 1);

    step(&mut sim, &mut grid, 16);
    assert_eq!(combo_steps(&sim.drain_events()), vec![(1, 1)]);
}

#[test]
fn test_walking_restarts_combo() {
    let mut grid = GridSpatial::new(1.0);
    let mut sim = Simulation::new(7);
    let player = sim.spawn_player(PlayerConfig::default(), Vec2::ZERO);

    press(&mut sim, &mut grid, player, PlayerInput::attack());
    step(&mut sim, &mut grid, 27);
    press(&mut sim, &mut grid, player, PlayerInput::moving(Vec2::Y));
    // Still inside the follow-up window, but the step restarted the chain.
    press(
        &mut sim,
        &mut grid,
        player,
        PlayerInput {
            movement: Vec2::ZERO,
            attack: true,
            dash_tap: None,
        },
    );
    step(&mut sim, &mut grid, 40);

    let steps: Vec<usize> = combo_steps(&sim.drain_events())
        .into_iter()
        .map(|(s, _)| s)
        .collect();
    assert_eq!(steps, vec![0, 0]);
    assert_eq!(sim.actor(player).map(Actor::position), Some(Vec2::new(0.0, 1.0)));
}

#[test]
fn test_combo_survives_knockback() {
    let mut grid = GridSpatial::new(1.0);
    let mut sim = Simulation::new(7);
    let player = sim.spawn_player(PlayerConfig::default(), Vec2::ZERO);

    press(&mut sim, &mut grid, player, PlayerInput::attack());
    step(&mut sim, &mut grid, 8);
    sim.apply_damage(DamageRequest::new(player, 5, Vec2::new(-1.0, 0.0)))
        .expect("damage");
    assert!(sim.actor(player).is_some_and(Actor::is_knocked_back));

    // Presses during the knockback are dropped.
    press(&mut sim, &mut grid, player, PlayerInput::attack());
    step(&mut sim, &mut grid, 22);
    assert!(!sim.actor(player).is_some_and(Actor::is_knocked_back));

    // Knockback over, still inside the follow-up window.
    press(&mut sim, &mut grid, player, PlayerInput::attack());

    let steps: Vec<usize> = combo_steps(&sim.drain_events())
        .into_iter()
        .map(|(s, _)| s)
        .collect();
    assert_eq!(steps, vec![0, 1]);
    assert_eq!(health(&sim, player), 95);
}

#[test]
fn test_double_tap_dash_stops_before_wall() {
    let mut grid = GridSpatial::new(1.0);
    grid.block_tile(3, 0);
    let mut sim = Simulation::new(7);
    let player = sim.spawn_player(PlayerConfig::default(), Vec2::ZERO);

    // Let any cooldown from a previous dash elapse.
    step(&mut sim, &mut grid, 64);
    press(&mut sim, &mut grid, player, PlayerInput::tap(Cardinal::Right));
    step(&mut sim, &mut grid, 8);
    press(&mut sim, &mut grid, player, PlayerInput::tap(Cardinal::Right));

    let dashes: Vec<_> = sim
        .drain_events()
        .into_iter()
        .filter_map(|e| match e {
            CombatEvent::DashStarted { to, .. } => Some(to),
            _ => None,
        })
        .collect();
    assert_eq!(dashes, vec![Vec2::new(2.0, 0.0)]);

    step(&mut sim, &mut grid, 16);
    let actor = sim.actor(player).expect("player");
    assert_eq!(actor.position(), Vec2::new(2.0, 0.0));
    assert!(!actor.as_player().expect("player brain").dash().is_dashing());
}

#[test]
fn test_dash_cooldown_and_mixed_taps() {
    let mut grid = GridSpatial::new(1.0);
    let mut sim = Simulation::new(7);
    let player = sim.spawn_player(PlayerConfig::default(), Vec2::ZERO);
    let count_dashes = |events: Vec<CombatEvent>| {
        events
            .iter()
            .filter(|e| matches!(e, CombatEvent::DashStarted { .. }))
            .count()
    };

    press(&mut sim, &mut grid, player, PlayerInput::tap(Cardinal::Up));
    press(&mut sim, &mut grid, player, PlayerInput::tap(Cardinal::Left));
    assert_eq!(count_dashes(sim.drain_events()), 0);

    press(&mut sim, &mut grid, player, PlayerInput::tap(Cardinal::Left));
    assert_eq!(count_dashes(sim.drain_events()), 1);

    // Dash over, cooldown still running.
    step(&mut sim, &mut grid, 20);
    press(&mut sim, &mut grid, player, PlayerInput::tap(Cardinal::Down));
    press(&mut sim, &mut grid, player, PlayerInput::tap(Cardinal::Down));
    assert_eq!(count_dashes(sim.drain_events()), 0);

    step(&mut sim, &mut grid, 40);
    press(&mut sim, &mut grid, player, PlayerInput::tap(Cardinal::Down));
    press(&mut sim, &mut grid, player, PlayerInput::tap(Cardinal::Down));
    assert_eq!(count_dashes(sim.drain_events()), 1);
}

#[test]
fn test_detection_boundary_hysteresis() {
    let mut grid = GridSpatial::new(1.0);
    let mut sim = Simulation::new(7);
    let player = sim.spawn_player(PlayerConfig::default(), Vec2::ZERO);

    let patrolling = sim.spawn_enemy(EnemyConfig::default(), Vec2::new(5.0, 0.0), Some(player));
    let chasing = sim.spawn_enemy(
        EnemyConfig {
            initial_state: EnemyState::Chase,
            ..EnemyConfig::default()
        },
        Vec2::new(0.0, -5.0),
        Some(player),
    );

    step(&mut sim, &mut grid, 1);
    assert_eq!(sim.enemy_state(patrolling), Ok(EnemyState::Patrol));
    assert_eq!(sim.enemy_state(chasing), Ok(EnemyState::Chase));
}

#[test]
fn test_enemy_chases_and_gives_up() {
    let mut grid = GridSpatial::new(1.0);
    let mut sim = Simulation::new(7);
    let player = sim.spawn_player(PlayerConfig::default(), Vec2::ZERO);
    let enemy = sim.spawn_enemy(
        EnemyConfig {
            initial_state: EnemyState::Idle,
            ..EnemyConfig::default()
        },
        Vec2::new(4.0, 0.0),
        Some(player),
    );

    step(&mut sim, &mut grid, 1);
    assert_eq!(sim.enemy_state(enemy), Ok(EnemyState::Chase));
    step(&mut sim, &mut grid, 32);
    let distance = sim
        .actor(enemy)
        .map_or(f32::MAX, |a| a.position().distance(Vec2::ZERO));
    assert!(distance < 4.0);

    // Teleport the target out of range by swapping in a far-away player.
    let far = sim.spawn_player(PlayerConfig::default(), Vec2::new(40.0, 0.0));
    sim.set_enemy_target(enemy, Some(far)).expect("rewire");
    step(&mut sim, &mut grid, 1);
    assert_eq!(sim.enemy_state(enemy), Ok(EnemyState::Patrol));
}

#[test]
fn test_knockback_retrigger_supersedes() {
    let mut grid = GridSpatial::new(1.0);
    let mut sim = Simulation::new(7);
    let enemy = sim.spawn_enemy(EnemyConfig::default(), Vec2::ZERO, None);

    sim.apply_damage(DamageRequest::new(enemy, 1, Vec2::new(-1.0, 0.0)))
        .expect("first hit");
    step(&mut sim, &mut grid, 4);
    let first = sim.actor(enemy).expect("enemy").reaction().knockback_generation();

    let above = sim.actor(enemy).map_or(Vec2::ZERO, Actor::position) + Vec2::Y;
    sim.apply_damage(DamageRequest::new(enemy, 1, above))
        .expect("second hit");
    let actor = sim.actor(enemy).expect("enemy");
    assert_ne!(actor.reaction().knockback_generation(), first);
    assert_eq!(actor.body().velocity, Vec2::ZERO);
    assert_eq!(
        actor.reaction().pending_impulse(),
        Some(Vec2::NEG_Y * actor.stats().knockback_force)
    );
    let duration = actor.stats().knockback_duration;
    assert_eq!(actor.reaction().knockback_remaining(sim.now()), duration);

    // The first hit's deadline passes without ending the lock.
    step(&mut sim, &mut grid, 12);
    assert!(sim.actor(enemy).is_some_and(Actor::is_knocked_back));

    step(&mut sim, &mut grid, 8);
    let actor = sim.actor(enemy).expect("enemy");
    assert!(!actor.is_knocked_back());
    assert_eq!(actor.body().velocity, Vec2::ZERO);
}

#[test]
fn test_enemy_death_and_removal() {
    let mut grid = GridSpatial::new(1.0);
    let mut sim = Simulation::new(7);
    let enemy = sim.spawn_enemy(
        EnemyConfig {
            stats: ActorStats::default().with_max_health(10),
            ..EnemyConfig::default()
        },
        Vec2::ZERO,
        None,
    );
    sim.drain_events();

    for amount in [4, 4] {
        sim.apply_damage(DamageRequest::new(enemy, amount, Vec2::new(-1.0, 0.0)))
            .expect("hit");
    }
    assert_eq!(health(&sim, enemy), 2);
    sim.apply_damage(DamageRequest::new(enemy, 4, Vec2::new(-1.0, 0.0)))
        .expect("hit");
    assert_eq!(health(&sim, enemy), -2);

    let actor = sim.actor(enemy).expect("enemy");
    assert!(actor.is_dead());
    assert!(actor.removal_pending());
    assert!(!actor.body().collidable);
    assert_eq!(
        sim.animation(enemy).map(|p| (p.state, p.flip_y)),
        Ok((AnimState::Die, true))
    );

    // Frozen: nothing moves it and further hits do nothing.
    sim.apply_damage(DamageRequest::new(enemy, 4, Vec2::new(-1.0, 0.0)))
        .expect("hit");
    step(&mut sim, &mut grid, 64);
    assert_eq!(health(&sim, enemy), -2);
    assert_eq!(sim.actor(enemy).map(Actor::position), Some(Vec2::ZERO));

    step(&mut sim, &mut grid, 64);
    assert!(sim.actor(enemy).is_none());
    let events = sim.drain_events();
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, CombatEvent::Died { .. }))
            .count(),
        1
    );
    assert!(events.contains(&CombatEvent::Removed { actor: enemy }));
}

#[test]
fn test_brawler_hits_player() {
    let mut grid = GridSpatial::new(1.0);
    let mut sim = Simulation::new(7);
    let player = sim.spawn_player(PlayerConfig::default(), Vec2::ZERO);
    let enemy = sim.spawn_enemy(EnemyPreset::Brawler.config(), Vec2::new(0.75, 0.0), Some(player));

    step(&mut sim, &mut grid, 2);

    assert_eq!(health(&sim, player), 90);
    let params = sim.animation(enemy).expect("enemy");
    assert_eq!(params.state, AnimState::Attack);
}

#[test]
fn test_player_loadout_adds_damage() {
    let mut grid = GridSpatial::new(1.0);
    let mut sim = Simulation::new(7);
    let player = sim.spawn_player(PlayerConfig::default(), Vec2::ZERO);
    let enemy = sim.spawn_enemy(dummy(), Vec2::new(1.0, 0.0), None);
    sim.equip(player, Equipment::new("Iron Sword", EquipmentSlot::Weapon).with_attack(3))
        .expect("equip");

    press(&mut sim, &mut grid, player, PlayerInput::attack());
    assert_eq!(health(&sim, enemy), 96);
}

#[test]
fn test_random_patrol_is_deterministic_per_seed() {
    let run = |seed: u64| {
        let mut grid = GridSpatial::new(1.0);
        let mut sim = Simulation::new(seed);
        let enemy = sim.spawn_enemy(EnemyPreset::Brawler.config(), Vec2::ZERO, None);
        step(&mut sim, &mut grid, 300);
        sim.actor(enemy).map(Actor::position)
    };
    assert_eq!(run(11), run(11));
}
