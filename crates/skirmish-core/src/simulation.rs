//! Simulation driver.
//!
//! [`Simulation`] owns every actor, the clock and the event bus. Each
//! [`Simulation::tick`] runs, in order:
//! 1. effects: timers expire, burns tick, dead actors past their delay leave
//! 2. logic: every live actor's brain runs against fresh input
//! 3. physics: impulses and movement are integrated
//!
//! Damage never mutates an actor directly from another actor's update; it is
//! queued as a [`DamageRequest`] and resolved in FIFO order, so a death that
//! releases more damage only appends to the queue.

use std::collections::{BTreeMap, VecDeque};

use glam::Vec2;
use skirmish_common::{ActorId, SimError, SimResult};
use tracing::{debug, info};

use crate::actor::{Actor, Brain, DamageOutcome};
use crate::animation::AnimationParams;
use crate::damage::DamageRequest;
use crate::enemy::{EnemyBehavior, EnemyConfig, EnemyState, TargetView};
use crate::equipment::Equipment;
use crate::events::{CombatEvent, EventBus};
use crate::player::{PlayerConfig, PlayerController, PlayerInput};
use crate::spatial::{BodySnapshot, LayerMask, SpatialHit, SpatialQuery};
use crate::timer::SimClock;

/// Mixes the simulation seed with an actor ID.
fn actor_seed(seed: u64, id: ActorId) -> u64 {
    seed ^ id.raw().wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// The combat world.
#[derive(Debug)]
pub struct Simulation {
    actors: BTreeMap<ActorId, Actor>,
    clock: SimClock,
    events: EventBus,
    damage_queue: VecDeque<DamageRequest>,
    seed: u64,
    next_id: ActorId,
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Simulation {
    /// Creates an empty world; `seed` drives every random patrol.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_events(seed, EventBus::default())
    }

    /// Creates an empty world publishing to `events`.
    #[must_use]
    pub fn with_events(seed: u64, events: EventBus) -> Self {
        Self {
            actors: BTreeMap::new(),
            clock: SimClock::new(),
            events,
            damage_queue: VecDeque::new(),
            seed,
            next_id: ActorId::from_raw(1),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Current simulation time.
    #[must_use]
    pub fn now(&self) -> f32 {
        self.clock.now()
    }

    /// Number of ticks run.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.clock.tick()
    }

    /// Looks up an actor.
    #[must_use]
    pub fn actor(&self, id: ActorId) -> Option<&Actor> {
        self.actors.get(&id)
    }

    /// All actors in ID order.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    /// Number of actors still in the world (dead ones included until removed).
    #[must_use]
    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }

    /// Collider state for syncing the physics layer.
    #[must_use]
    pub fn bodies(&self) -> Vec<BodySnapshot> {
        self.actors.values().map(Actor::snapshot).collect()
    }

    /// Animator parameters for an actor.
    pub fn animation(&self, id: ActorId) -> SimResult<AnimationParams> {
        self.actors
            .get(&id)
            .map(|a| a.animation(self.clock.now()))
            .ok_or(SimError::ActorNotFound(id))
    }

    /// Behavior state of an enemy.
    pub fn enemy_state(&self, id: ActorId) -> SimResult<EnemyState> {
        self.actors
            .get(&id)
            .ok_or(SimError::ActorNotFound(id))?
            .as_enemy()
            .map(EnemyBehavior::state)
            .ok_or(SimError::NotAnEnemy(id))
    }

    /// Event bus the presentation layer drains.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Drains all pending events.
    pub fn drain_events(&self) -> Vec<CombatEvent> {
        self.events.drain()
    }

    // ========================================================================
    // Spawning and wiring
    // ========================================================================

    fn allocate_id(&mut self) -> ActorId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }

    fn insert(&mut self, actor: Actor) -> ActorId {
        let id = actor.id();
        self.events.publish(CombatEvent::Spawned {
            actor: id,
            layer: actor.layer(),
            position: actor.position(),
        });
        debug!(actor = %id, layer = ?actor.layer(), position = ?actor.position(), "actor spawned");
        self.actors.insert(id, actor);
        id
    }

    /// Spawns a player-driven actor.
    pub fn spawn_player(&mut self, config: PlayerConfig, position: Vec2) -> ActorId {
        let id = self.allocate_id();
        let stats = config.stats.clone();
        let brain = Brain::Player(Box::new(PlayerController::new(config)));
        self.insert(Actor::new(id, stats, position, brain))
    }

    /// Spawns an enemy anchored at `position`, pursuing `target` when it is seen.
    pub fn spawn_enemy(
        &mut self,
        config: EnemyConfig,
        position: Vec2,
        target: Option<ActorId>,
    ) -> ActorId {
        let id = self.allocate_id();
        let stats = config.stats.clone();
        let behavior = EnemyBehavior::new(config, position, target, actor_seed(self.seed, id));
        self.insert(Actor::new(id, stats, position, Brain::Enemy(Box::new(behavior))))
    }

    /// Rewires an enemy's pursuit target.
    pub fn set_enemy_target(&mut self, enemy: ActorId, target: Option<ActorId>) -> SimResult<()> {
        if let Some(t) = target {
            if !self.actors.contains_key(&t) {
                return Err(SimError::ActorNotFound(t));
            }
        }
        let actor = self
            .actors
            .get_mut(&enemy)
            .ok_or(SimError::ActorNotFound(enemy))?;
        match &mut actor.brain {
            Brain::Enemy(behavior) => {
                behavior.set_target(target);
                Ok(())
            },
            Brain::Player(_) => Err(SimError::NotAnEnemy(enemy)),
        }
    }

    fn player_mut(&mut self, id: ActorId) -> SimResult<&mut PlayerController> {
        let actor = self
            .actors
            .get_mut(&id)
            .ok_or(SimError::ActorNotFound(id))?;
        match &mut actor.brain {
            Brain::Player(player) => Ok(&mut **player),
            Brain::Enemy(_) => Err(SimError::NotAPlayer(id)),
        }
    }

    /// Buffers input for a player; consumed by the next tick.
    pub fn submit_input(&mut self, player: ActorId, input: PlayerInput) -> SimResult<()> {
        self.player_mut(player)?.submit(input);
        Ok(())
    }

    /// Equips an item on a player, returning what it replaced.
    pub fn equip(&mut self, player: ActorId, item: Equipment) -> SimResult<Option<Equipment>> {
        Ok(self.player_mut(player)?.loadout_mut().equip(item))
    }

    // ========================================================================
    // External effects
    // ========================================================================

    /// Applies damage from outside the simulation (traps, scripts, tests).
    ///
    /// Resolves immediately, together with anything the hit triggers.
    pub fn apply_damage(&mut self, request: DamageRequest) -> SimResult<()> {
        if request.amount < 0 {
            return Err(SimError::NegativeDamage(request.amount));
        }
        if !self.actors.contains_key(&request.target) {
            return Err(SimError::ActorNotFound(request.target));
        }
        self.damage_queue.push_back(request);
        self.resolve_damage();
        Ok(())
    }

    /// Stuns an actor for `duration` seconds.
    pub fn stun(&mut self, id: ActorId, duration: f32) -> SimResult<()> {
        let now = self.clock.now();
        self.actors
            .get_mut(&id)
            .ok_or(SimError::ActorNotFound(id))?
            .stun(now, duration);
        Ok(())
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advances the world by `dt` seconds: effects, then logic, then physics.
    pub fn tick<S: SpatialQuery>(&mut self, dt: f32, spatial: &S) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let now = self.clock.advance(dt);

        self.update_effects(now);
        self.resolve_damage();

        let ids: Vec<ActorId> = self.actors.keys().copied().collect();
        for id in ids {
            self.update_logic(id, now, dt, spatial);
            self.resolve_damage();
        }

        self.integrate(dt);
    }

    fn update_effects(&mut self, now: f32) {
        let mut expired = Vec::new();
        for (id, actor) in &mut self.actors {
            actor.reaction.update(now, &mut actor.body.velocity);
            actor.stun.poll(now);
            if let Some(amount) = actor.burning.update(now) {
                self.damage_queue
                    .push_back(DamageRequest::self_inflicted(*id, amount));
            }
            if actor.removal.poll(now) {
                expired.push(*id);
            }
        }

        for id in expired {
            self.actors.remove(&id);
            self.events.publish(CombatEvent::Removed { actor: id });
            info!(actor = %id, "actor removed");
        }
    }

    fn target_view(&self, id: ActorId) -> Option<TargetView> {
        let target = self.actors.get(&id)?.as_enemy()?.target()?;
        self.actors.get(&target).map(|t| TargetView {
            id: target,
            position: t.position(),
            alive: !t.is_dead(),
        })
    }

    fn update_logic<S: SpatialQuery>(&mut self, id: ActorId, now: f32, dt: f32, spatial: &S) {
        let target = self.target_view(id);
        let Some(actor) = self.actors.get_mut(&id) else {
            return;
        };
        if actor.is_dead() {
            return;
        }
        let locked = actor.is_knocked_back() || actor.is_stunned();

        match &mut actor.brain {
            Brain::Player(player) => {
                let tick = player.update(now, &mut actor.body, locked, spatial);
                let origin = actor.body.position;
                if let Some(strike) = tick.strike {
                    self.events.publish(CombatEvent::ComboStep {
                        actor: id,
                        step: strike.step,
                        damage: strike.damage,
                        hits: strike.hits.len(),
                    });
                    for hit in &strike.hits {
                        self.damage_queue.push_back(
                            DamageRequest::new(hit.id, strike.damage, origin)
                                .with_kind(strike.kind)
                                .with_source(id),
                        );
                    }
                }
                if let Some(plan) = tick.dash {
                    self.events.publish(CombatEvent::DashStarted {
                        actor: id,
                        direction: plan.direction,
                        from: plan.from,
                        to: plan.to,
                    });
                }
            },
            Brain::Enemy(enemy) => {
                if locked {
                    enemy.halt();
                    return;
                }
                let origin = actor.body.position;
                let tick = enemy.update(now, dt, id, origin, target, spatial);
                for (from, to) in tick.transitions {
                    self.events
                        .publish(CombatEvent::EnemyStateChanged { actor: id, from, to });
                }
                if let Some(strike) = tick.strike {
                    for hit in strike.hits.iter().filter(|h| h.id != id) {
                        self.damage_queue.push_back(
                            DamageRequest::new(hit.id, strike.damage, origin).with_source(id),
                        );
                    }
                }
            },
        }
    }

    fn integrate(&mut self, dt: f32) {
        for actor in self.actors.values_mut() {
            if actor.body.frozen {
                continue;
            }
            if let Some(impulse) = actor.reaction.take_impulse() {
                actor.body.velocity = impulse;
            }
            actor.body.position += actor.body.velocity * dt;

            // A dash in flight finishes even under a lock.
            let locked = actor.is_knocked_back() || actor.is_stunned();
            match &mut actor.brain {
                Brain::Player(player) if !locked || player.dash().is_dashing() => {
                    player.integrate(&mut actor.body, dt);
                },
                Brain::Enemy(enemy) if !locked => {
                    actor.body.position = enemy.integrate(actor.body.position, dt);
                },
                _ => {},
            }
        }
    }

    // ========================================================================
    // Damage resolution
    // ========================================================================

    /// Collidable actors on `mask` overlapping a circle, from live state.
    fn overlap(&self, center: Vec2, radius: f32, mask: LayerMask) -> Vec<SpatialHit> {
        self.actors
            .values()
            .filter(|a| a.body.collidable && mask.contains(a.layer()))
            .filter(|a| a.position().distance(center) <= radius + a.stats.body_radius)
            .map(|a| SpatialHit {
                id: a.id,
                position: a.position(),
            })
            .collect()
    }

    fn resolve_damage(&mut self) {
        let now = self.clock.now();
        while let Some(request) = self.damage_queue.pop_front() {
            let Some(actor) = self.actors.get_mut(&request.target) else {
                continue;
            };
            let position = actor.position();
            let source_position = request.source_position.unwrap_or(position);
            let amount = request.kind.scale(request.amount.max(0));

            let DamageOutcome::Applied {
                remaining, killed, ..
            } = actor.apply_damage(now, amount, source_position)
            else {
                continue;
            };

            self.events.publish(CombatEvent::Damaged {
                actor: request.target,
                amount,
                kind: request.kind,
                position,
                source_position,
                remaining,
            });

            if killed {
                let burst = actor.stats.death_burst;
                self.events.publish(CombatEvent::Died {
                    actor: request.target,
                    position,
                });
                if let Some(burst) = burst {
                    let hits = self.overlap(position, burst.radius, burst.mask);
                    debug!(actor = %request.target, hits = hits.len(), "death burst");
                    for hit in hits {
                        self.damage_queue.push_back(
                            DamageRequest::new(hit.id, burst.damage, position)
                                .with_source(request.target),
                        );
                    }
                }
                continue;
            }

            if request.kind.ignites() {
                actor.ignite(now);
            }
            if let Some(duration) = request.kind.stun_duration() {
                actor.stun(now, duration);
            }
            if let Brain::Enemy(enemy) = &mut actor.brain {
                if let Some((from, to)) = enemy.provoke(request.target) {
                    self.events.publish(CombatEvent::EnemyStateChanged {
                        actor: request.target,
                        from,
                        to,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::damage::{DamageKind, DeathBurst};
    use crate::spatial::GridSpatial;

    const DT: f32 = 1.0 / 64.0;

    #[test]
    fn test_spawn_publishes_and_assigns_ids() {
        let mut sim = Simulation::new(1);
        let player = sim.spawn_player(PlayerConfig::default(), Vec2::ZERO);
        let enemy = sim.spawn_enemy(EnemyConfig::default(), Vec2::new(9.0, 0.0), Some(player));

        assert_ne!(player, enemy);
        assert_eq!(sim.actor_count(), 2);
        assert_eq!(sim.drain_events().len(), 2);
    }

    #[test]
    fn test_api_errors() {
        let mut sim = Simulation::new(1);
        let player = sim.spawn_player(PlayerConfig::default(), Vec2::ZERO);
        let enemy = sim.spawn_enemy(EnemyConfig::default(), Vec2::new(9.0, 0.0), None);
        let ghost = ActorId::from_raw(99);

        assert_eq!(
            sim.submit_input(enemy, PlayerInput::attack()),
            Err(SimError::NotAPlayer(enemy))
        );
        assert_eq!(
            sim.set_enemy_target(player, Some(enemy)),
            Err(SimError::NotAnEnemy(player))
        );
        assert_eq!(
            sim.set_enemy_target(enemy, Some(ghost)),
            Err(SimError::ActorNotFound(ghost))
        );
        assert_eq!(
            sim.apply_damage(DamageRequest::new(enemy, -3, Vec2::ZERO)),
            Err(SimError::NegativeDamage(-3))
        );
        assert!(sim.animation(ghost).is_err());
    }

    #[test]
    fn test_damage_publishes_and_provokes() {
        let mut sim = Simulation::new(1);
        let player = sim.spawn_player(PlayerConfig::default(), Vec2::ZERO);
        let enemy = sim.spawn_enemy(EnemyConfig::default(), Vec2::new(20.0, 0.0), Some(player));
        sim.drain_events();

        sim.apply_damage(DamageRequest::new(enemy, 5, Vec2::ZERO))
            .expect("damage");

        assert_eq!(sim.enemy_state(enemy), Ok(EnemyState::Chase));
        let events = sim.drain_events();
        assert!(matches!(
            events[0],
            CombatEvent::Damaged { amount: 5, remaining: 95, .. }
        ));
        assert!(matches!(
            events[1],
            CombatEvent::EnemyStateChanged { to: EnemyState::Chase, .. }
        ));
    }

    #[test]
    fn test_fire_burns_until_dead_or_out() {
        let grid = GridSpatial::new(1.0);
        let mut sim = Simulation::new(1);
        let enemy = sim.spawn_enemy(EnemyConfig::default(), Vec2::ZERO, None);

        sim.apply_damage(DamageRequest::new(enemy, 10, Vec2::new(-1.0, 0.0)).with_kind(DamageKind::Fire))
            .expect("damage");
        assert_eq!(sim.actor(enemy).map(|a| a.health().current()), Some(85));

        for _ in 0..128 {
            sim.tick(DT, &grid);
        }
        // Three ticks of 5.
        assert_eq!(sim.actor(enemy).map(|a| a.health().current()), Some(70));
        assert!(!sim.actor(enemy).is_some_and(Actor::is_burning));
    }

    #[test]
    fn test_ice_stuns() {
        let mut sim = Simulation::new(1);
        let enemy = sim.spawn_enemy(EnemyConfig::default(), Vec2::ZERO, None);
        sim.apply_damage(DamageRequest::new(enemy, 10, Vec2::new(-1.0, 0.0)).with_kind(DamageKind::Ice))
            .expect("damage");

        let actor = sim.actor(enemy).expect("enemy");
        assert_eq!(actor.health().current(), 88);
        assert!(actor.is_stunned());
    }

    #[test]
    fn test_stun_suspends_enemy_until_deadline() {
        let grid = GridSpatial::new(1.0);
        let mut sim = Simulation::new(1);
        let player = sim.spawn_player(PlayerConfig::default(), Vec2::new(3.0, 0.0));
        let enemy = sim.spawn_enemy(EnemyConfig::default(), Vec2::ZERO, Some(player));
        sim.stun(enemy, 0.5).expect("stun");
        sim.drain_events();

        // Target is inside detection range, but nothing runs while stunned.
        for _ in 0..31 {
            sim.tick(DT, &grid);
        }
        assert!(sim.actor(enemy).is_some_and(Actor::is_stunned));
        assert_eq!(sim.enemy_state(enemy), Ok(EnemyState::Patrol));
        assert_eq!(sim.actor(enemy).map(Actor::position), Some(Vec2::ZERO));
        assert!(!sim
            .drain_events()
            .iter()
            .any(|e| matches!(e, CombatEvent::EnemyStateChanged { .. })));

        // Expires exactly at 0.5.
        sim.tick(DT, &grid);
        assert!(!sim.actor(enemy).is_some_and(Actor::is_stunned));
        assert_eq!(sim.enemy_state(enemy), Ok(EnemyState::Chase));

        for _ in 0..16 {
            sim.tick(DT, &grid);
        }
        assert!(sim.actor(enemy).is_some_and(|a| a.position().x > 0.0));
    }

    #[test]
    fn test_second_stun_replaces_deadline() {
        let grid = GridSpatial::new(1.0);
        let mut sim = Simulation::new(1);
        let enemy = sim.spawn_enemy(EnemyConfig::default(), Vec2::ZERO, None);

        sim.stun(enemy, 0.5).expect("stun");
        for _ in 0..16 {
            sim.tick(DT, &grid);
        }
        // Restarted at 0.25, so the lock now ends at 0.75.
        sim.stun(enemy, 0.5).expect("stun");
        for _ in 0..16 {
            sim.tick(DT, &grid);
        }
        // Past the first deadline.
        assert!(sim.actor(enemy).is_some_and(Actor::is_stunned));
        for _ in 0..15 {
            sim.tick(DT, &grid);
        }
        assert!(sim.actor(enemy).is_some_and(Actor::is_stunned));
        sim.tick(DT, &grid);
        assert!(!sim.actor(enemy).is_some_and(Actor::is_stunned));

        // A shorter stun also replaces rather than extends.
        sim.stun(enemy, 0.5).expect("stun");
        sim.tick(DT, &grid);
        sim.stun(enemy, 0.125).expect("stun");
        for _ in 0..8 {
            sim.tick(DT, &grid);
        }
        assert!(!sim.actor(enemy).is_some_and(Actor::is_stunned));
    }

    #[test]
    fn test_stun_drops_player_input() {
        let grid = GridSpatial::new(1.0);
        let mut sim = Simulation::new(1);
        let player = sim.spawn_player(PlayerConfig::default(), Vec2::ZERO);
        sim.stun(player, 0.25).expect("stun");
        sim.drain_events();

        for _ in 0..15 {
            let input = PlayerInput {
                movement: Vec2::X,
                attack: true,
                dash_tap: None,
            };
            sim.submit_input(player, input).expect("input");
            sim.tick(DT, &grid);
        }
        assert_eq!(sim.actor(player).map(Actor::position), Some(Vec2::ZERO));
        assert_eq!(
            sim.actor(player)
                .and_then(Actor::as_player)
                .map(|p| p.combo().step()),
            Some(0)
        );
        assert!(!sim
            .drain_events()
            .iter()
            .any(|e| matches!(e, CombatEvent::ComboStep { .. })));

        sim.tick(DT, &grid);
        assert!(!sim.actor(player).is_some_and(Actor::is_stunned));
        sim.submit_input(player, PlayerInput::attack()).expect("input");
        sim.tick(DT, &grid);
        assert!(sim
            .drain_events()
            .iter()
            .any(|e| matches!(e, CombatEvent::ComboStep { step: 0, .. })));
    }

    #[test]
    fn test_death_burst_chains_once() {
        let mut sim = Simulation::new(1);
        let burst = DeathBurst {
            radius: 2.0,
            damage: 50,
            mask: LayerMask::ENEMY,
        };
        let config = EnemyConfig {
            stats: EnemyConfig::default()
                .stats
                .with_max_health(10)
                .with_death_burst(burst),
            ..EnemyConfig::default()
        };
        let first = sim.spawn_enemy(config.clone(), Vec2::ZERO, None);
        let second = sim.spawn_enemy(config, Vec2::new(1.0, 0.0), None);

        sim.apply_damage(DamageRequest::new(first, 10, Vec2::new(-1.0, 0.0)))
            .expect("damage");

        assert!(sim.actor(first).is_some_and(Actor::is_dead));
        assert!(sim.actor(second).is_some_and(Actor::is_dead));
        let deaths = sim
            .drain_events()
            .iter()
            .filter(|e| matches!(e, CombatEvent::Died { .. }))
            .count();
        assert_eq!(deaths, 2);
    }
}
