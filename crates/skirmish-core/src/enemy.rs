//! Enemy behavior state machine.
//!
//! Each tick an enemy runs the handler for its current [`EnemyState`], turns
//! to face where it is heading, then applies the detection override.
//! Steering in Chase blends direct pursuit with avoidance of nearby peers on
//! the same layer.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use skirmish_common::{ActorId, ConfigError};
use tracing::{debug, trace};

use crate::actor::ActorStats;
use crate::animation::{AnimState, AnimationParams};
use crate::spatial::{LayerMask, SpatialHit, SpatialQuery};
use crate::timer::TimerSlot;

/// Seconds the attack animation is shown after a swing.
const ATTACK_ANIM_TIME: f32 = 0.35;

/// Behavior state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyState {
    /// Pausing at a patrol point.
    Idle,
    /// Walking to a patrol point.
    Patrol,
    /// Pursuing the target.
    Chase,
}

/// Melee swing an enemy performs while chasing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyAttack {
    /// Damage per hit.
    pub damage: i32,
    /// Reach of the swing.
    pub range: f32,
    /// Seconds between swings.
    pub cooldown: f32,
}

impl Default for EnemyAttack {
    fn default() -> Self {
        Self {
            damage: 10,
            range: 1.0,
            cooldown: 1.0,
        }
    }
}

/// Enemy tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyConfig {
    /// Health, knockback and body tuning.
    pub stats: ActorStats,
    /// State on spawn.
    pub initial_state: EnemyState,
    /// Seconds spent idling at a patrol point.
    pub idle_time: f32,
    /// Speed while chasing.
    pub chase_speed: f32,
    /// Speed while patrolling.
    pub patrol_speed: f32,
    /// Distance under which the target is pursued.
    pub detection_range: f32,
    /// Distance at which pursuit stops short of the target.
    pub stop_distance: f32,
    /// Patrol radius (random mode) or offset (alternating mode).
    pub patrol_distance: f32,
    /// Pick random patrol points instead of alternating.
    pub random_patrol: bool,
    /// Tries at finding a walkable random patrol point.
    pub patrol_attempts: u32,
    /// Distance under which a patrol point counts as reached.
    pub arrive_epsilon: f32,
    /// Peer search radius.
    pub avoidance_radius: f32,
    /// Weight of avoidance against pursuit.
    pub avoidance_weight: f32,
    /// Floor on peer distance when scaling avoidance.
    pub min_avoidance_distance: f32,
    /// Minimum horizontal steering before facing can flip.
    pub direction_threshold: f32,
    /// Seconds between facing flips.
    pub flip_cooldown: f32,
    /// Flip the sprite vertically on death.
    pub flip_on_death: bool,
    /// Optional melee swing.
    pub attack: Option<EnemyAttack>,
    /// Layers the swing can hit.
    pub target_mask: LayerMask,
}

impl Default for EnemyConfig {
    fn default() -> Self {
        Self {
            stats: ActorStats::default(),
            initial_state: EnemyState::Patrol,
            idle_time: 1.0,
            chase_speed: 3.0,
            patrol_speed: 1.5,
            detection_range: 5.0,
            stop_distance: 0.5,
            patrol_distance: 3.0,
            random_patrol: false,
            patrol_attempts: 8,
            arrive_epsilon: 0.1,
            avoidance_radius: 1.0,
            avoidance_weight: 1.5,
            min_avoidance_distance: 0.1,
            direction_threshold: 0.5,
            flip_cooldown: 0.5,
            flip_on_death: true,
            attack: None,
            target_mask: LayerMask::PLAYER,
        }
    }
}

impl EnemyConfig {
    /// Checks the tuning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.stats.validate()?;
        for (field, value) in [
            ("idle_time", self.idle_time),
            ("chase_speed", self.chase_speed),
            ("patrol_speed", self.patrol_speed),
            ("detection_range", self.detection_range),
            ("stop_distance", self.stop_distance),
            ("patrol_distance", self.patrol_distance),
            ("arrive_epsilon", self.arrive_epsilon),
            ("avoidance_radius", self.avoidance_radius),
            ("flip_cooldown", self.flip_cooldown),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(field, format!("{value} is out of range")));
            }
        }
        if self.min_avoidance_distance <= 0.0 {
            return Err(ConfigError::invalid(
                "min_avoidance_distance",
                "must be positive",
            ));
        }
        if let Some(attack) = &self.attack {
            if attack.damage < 0 || attack.range <= 0.0 || attack.cooldown < 0.0 {
                return Err(ConfigError::invalid("attack", "damage, range and cooldown must be non-negative"));
            }
        }
        Ok(())
    }
}

/// What an enemy knows about its target this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetView {
    /// Target actor.
    pub id: ActorId,
    /// Target position.
    pub position: Vec2,
    /// Whether the target is still alive.
    pub alive: bool,
}

/// A swing that connected with something.
#[derive(Debug, Clone, PartialEq)]
pub struct EnemyStrike {
    /// Damage per hit.
    pub damage: i32,
    /// Actors caught by the swing.
    pub hits: Vec<SpatialHit>,
}

/// Result of one behavior update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnemyTick {
    /// State changes, in order.
    pub transitions: Vec<(EnemyState, EnemyState)>,
    /// Swing performed this tick.
    pub strike: Option<EnemyStrike>,
}

/// One enemy's perception and decision state.
#[derive(Debug, Clone)]
pub struct EnemyBehavior {
    config: EnemyConfig,
    state: EnemyState,
    target: Option<ActorId>,
    anchor: Vec2,
    patrol_target: Vec2,
    needs_patrol_target: bool,
    idle_timer: f32,
    facing_right: bool,
    last_flip_time: Option<f32>,
    movement: Vec2,
    attack_cooldown: TimerSlot,
    last_attack_time: Option<f32>,
    rng: fastrand::Rng,
}

impl EnemyBehavior {
    /// Creates a behavior anchored at `spawn`.
    #[must_use]
    pub fn new(config: EnemyConfig, spawn: Vec2, target: Option<ActorId>, seed: u64) -> Self {
        Self {
            state: config.initial_state,
            target,
            anchor: spawn,
            patrol_target: spawn,
            needs_patrol_target: true,
            idle_timer: 0.0,
            facing_right: true,
            last_flip_time: None,
            movement: Vec2::ZERO,
            attack_cooldown: TimerSlot::new(),
            last_attack_time: None,
            rng: fastrand::Rng::with_seed(seed),
            config,
        }
    }

    /// Tuning.
    #[must_use]
    pub fn config(&self) -> &EnemyConfig {
        &self.config
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> EnemyState {
        self.state
    }

    /// Pursuit target.
    #[must_use]
    pub fn target(&self) -> Option<ActorId> {
        self.target
    }

    /// Rewires the pursuit target.
    pub fn set_target(&mut self, target: Option<ActorId>) {
        self.target = target;
    }

    /// Patrol anchor (spawn point).
    #[must_use]
    pub fn anchor(&self) -> Vec2 {
        self.anchor
    }

    /// Current patrol destination.
    #[must_use]
    pub fn patrol_target(&self) -> Vec2 {
        self.patrol_target
    }

    /// Whether the sprite faces right.
    #[must_use]
    pub fn facing_right(&self) -> bool {
        self.facing_right
    }

    /// Normalized steering direction for the next physics step.
    #[must_use]
    pub fn movement(&self) -> Vec2 {
        self.movement
    }

    /// Speed for the current state.
    #[must_use]
    pub fn speed(&self) -> f32 {
        match self.state {
            EnemyState::Chase => self.config.chase_speed,
            EnemyState::Idle | EnemyState::Patrol => self.config.patrol_speed,
        }
    }

    /// Runs one logic tick.
    pub fn update<S: SpatialQuery>(
        &mut self,
        now: f32,
        dt: f32,
        id: ActorId,
        position: Vec2,
        target: Option<TargetView>,
        spatial: &S,
    ) -> EnemyTick {
        let mut tick = EnemyTick::default();
        if std::mem::take(&mut self.needs_patrol_target) {
            self.pick_patrol_target(position, spatial);
        }

        let mut heading = None;
        match self.state {
            EnemyState::Idle => {
                self.movement = Vec2::ZERO;
                self.idle_timer += dt;
                if self.idle_timer >= self.config.idle_time {
                    self.pick_patrol_target(position, spatial);
                    self.transition(id, EnemyState::Patrol, &mut tick);
                }
            },
            EnemyState::Patrol => {
                if position.distance(self.patrol_target) < self.config.arrive_epsilon {
                    self.movement = Vec2::ZERO;
                    self.idle_timer = 0.0;
                    self.transition(id, EnemyState::Idle, &mut tick);
                } else {
                    self.movement = (self.patrol_target - position).normalize_or_zero();
                    heading = Some(self.movement);
                }
            },
            EnemyState::Chase => match target {
                None => self.movement = Vec2::ZERO,
                Some(t) if !t.alive => {
                    self.movement = Vec2::ZERO;
                    self.pick_patrol_target(position, spatial);
                    self.transition(id, EnemyState::Patrol, &mut tick);
                },
                Some(t) => {
                    heading = Some((t.position - position).normalize_or_zero());
                    self.movement = self.chase_steering(id, position, t.position, spatial);
                    tick.strike = self.try_attack(now, position, t.position, spatial);
                },
            },
        }

        if let Some(direction) = heading {
            self.update_facing(now, direction);
        }

        if let Some(t) = target.filter(|t| t.alive) {
            self.detect(id, position, t.position, spatial, &mut tick);
        }

        tick
    }

    /// Detection override with a strict entry boundary.
    fn detect<S: SpatialQuery>(
        &mut self,
        id: ActorId,
        position: Vec2,
        target: Vec2,
        spatial: &S,
        tick: &mut EnemyTick,
    ) {
        let distance = position.distance(target);
        if distance < self.config.detection_range && self.state != EnemyState::Chase {
            self.transition(id, EnemyState::Chase, tick);
        } else if distance > self.config.detection_range && self.state == EnemyState::Chase {
            self.movement = Vec2::ZERO;
            self.pick_patrol_target(position, spatial);
            self.transition(id, EnemyState::Patrol, tick);
        }
    }

    fn chase_steering<S: SpatialQuery>(
        &self,
        id: ActorId,
        position: Vec2,
        target: Vec2,
        spatial: &S,
    ) -> Vec2 {
        if position.distance(target) <= self.config.stop_distance {
            return Vec2::ZERO;
        }
        let pursuit = (target - position).normalize_or_zero();
        let avoidance = self.avoidance(id, position, spatial);
        (pursuit + avoidance * self.config.avoidance_weight).normalize_or_zero()
    }

    /// Unit vector pointing away from nearby peers, or zero.
    pub fn avoidance<S: SpatialQuery>(&self, id: ActorId, position: Vec2, spatial: &S) -> Vec2 {
        let peers = spatial.overlap_circle(position, self.config.avoidance_radius, LayerMask::ENEMY);
        let mut push = Vec2::ZERO;
        for peer in peers.iter().filter(|p| p.id != id) {
            let away = position - peer.position;
            let distance = away.length().max(self.config.min_avoidance_distance);
            push += away.normalize_or_zero() / distance;
        }
        push.normalize_or_zero()
    }

    fn try_attack<S: SpatialQuery>(
        &mut self,
        now: f32,
        position: Vec2,
        target: Vec2,
        spatial: &S,
    ) -> Option<EnemyStrike> {
        let attack = self.config.attack?;
        self.attack_cooldown.poll(now);
        if self.attack_cooldown.is_armed() || position.distance(target) > attack.range {
            return None;
        }

        let hits = spatial.overlap_circle(position, attack.range, self.config.target_mask);
        self.attack_cooldown.arm(now, attack.cooldown);
        self.last_attack_time = Some(now);
        trace!(hits = hits.len(), damage = attack.damage, "enemy swing");
        Some(EnemyStrike {
            damage: attack.damage,
            hits,
        })
    }

    fn pick_patrol_target<S: SpatialQuery>(&mut self, position: Vec2, spatial: &S) {
        let reach = self.config.patrol_distance;
        if self.config.random_patrol {
            for _ in 0..self.config.patrol_attempts {
                let offset = Vec2::new(
                    self.rng.f32() * 2.0 - 1.0,
                    self.rng.f32() * 2.0 - 1.0,
                ) * reach;
                let candidate = self.anchor + offset;
                if spatial.is_walkable(candidate) {
                    self.patrol_target = candidate;
                    return;
                }
            }
            self.patrol_target = self.anchor;
            return;
        }

        // Alternate between the anchor and a point to its right.
        let offset_point = self.anchor + Vec2::new(reach, 0.0);
        let at_anchor = position.distance(self.anchor) < self.config.arrive_epsilon;
        self.patrol_target = if at_anchor && spatial.is_walkable(offset_point) {
            offset_point
        } else {
            self.anchor
        };
    }

    /// Flips facing toward `direction` once its horizontal part clears the
    /// threshold and the flip cooldown has passed.
    fn update_facing(&mut self, now: f32, direction: Vec2) {
        if direction.x.abs() <= self.config.direction_threshold {
            return;
        }
        if self
            .last_flip_time
            .is_some_and(|t| now - t <= self.config.flip_cooldown)
        {
            return;
        }
        let wants_right = direction.x > 0.0;
        if wants_right != self.facing_right {
            self.facing_right = wants_right;
            self.last_flip_time = Some(now);
        }
    }

    fn transition(&mut self, id: ActorId, to: EnemyState, tick: &mut EnemyTick) {
        let from = self.state;
        if from == to {
            return;
        }
        self.state = to;
        debug!(actor = %id, ?from, ?to, "enemy state changed");
        tick.transitions.push((from, to));
    }

    /// Being hit turns a passive enemy aggressive when it knows a target.
    pub fn provoke(&mut self, id: ActorId) -> Option<(EnemyState, EnemyState)> {
        if self.target.is_none() || self.state == EnemyState::Chase {
            return None;
        }
        let mut tick = EnemyTick::default();
        self.transition(id, EnemyState::Chase, &mut tick);
        tick.transitions.pop()
    }

    /// Moves `position` along the steering direction for one physics step.
    #[must_use]
    pub fn integrate(&self, position: Vec2, dt: f32) -> Vec2 {
        position + self.movement * self.speed() * dt
    }

    /// Drops planned movement (stun, knockback).
    pub fn halt(&mut self) {
        self.movement = Vec2::ZERO;
    }

    pub(crate) fn on_death(&mut self) {
        self.movement = Vec2::ZERO;
        self.attack_cooldown.cancel();
    }

    /// Presentation snapshot.
    #[must_use]
    pub fn animation(&self, now: f32, dead: bool) -> AnimationParams {
        let swinging = self
            .last_attack_time
            .is_some_and(|t| now - t < ATTACK_ANIM_TIME);
        let state = if dead {
            AnimState::Die
        } else if swinging {
            AnimState::Attack
        } else if self.movement != Vec2::ZERO {
            AnimState::Walk
        } else {
            AnimState::Idle
        };
        AnimationParams {
            state,
            move_x: self.movement.x,
            move_y: self.movement.y,
            flip_x: !self.facing_right,
            ..AnimationParams::default()
        }
    }
}
