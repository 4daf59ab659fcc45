//! Actor health model.
//!
//! Every combat participant is an [`Actor`]: a body, a health pool, a
//! hit-reaction controller and a [`Brain`] that selects which state machine
//! drives it. Damage goes through [`Actor::apply_damage`], which is the only
//! way health changes.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use skirmish_common::{ActorId, ConfigError};
use tracing::{debug, info};

use crate::animation::AnimationParams;
use crate::damage::{Burning, DeathBurst};
use crate::enemy::EnemyBehavior;
use crate::knockback::{knockback_direction, HitReaction, Tint};
use crate::player::PlayerController;
use crate::spatial::{BodySnapshot, Layer};
use crate::timer::TimerSlot;

/// Per-actor tuning shared by players and enemies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorStats {
    /// Starting and maximum health.
    pub max_health: i32,
    /// Base movement speed (units per second).
    pub move_speed: f32,
    /// Impulse magnitude applied when hit.
    pub knockback_force: f32,
    /// Seconds behavior stays locked after a hit.
    pub knockback_duration: f32,
    /// Ignore damage while a knockback is active.
    pub invulnerable_during_knockback: bool,
    /// Seconds the hit tint is shown.
    pub flash_duration: f32,
    /// Resting sprite tint.
    pub base_tint: Tint,
    /// Tint shown while flashing.
    pub hit_tint: Tint,
    /// Seconds between death and removal.
    pub removal_delay: f32,
    /// Collider radius.
    pub body_radius: f32,
    /// Area damage released on death.
    pub death_burst: Option<DeathBurst>,
}

impl Default for ActorStats {
    fn default() -> Self {
        Self {
            max_health: 100,
            move_speed: 3.0,
            knockback_force: 10.0,
            knockback_duration: 0.25,
            invulnerable_during_knockback: false,
            flash_duration: 0.15,
            base_tint: Tint::WHITE,
            hit_tint: Tint::RED,
            removal_delay: 2.0,
            body_radius: 0.3,
            death_burst: None,
        }
    }
}

impl ActorStats {
    /// Sets maximum health.
    #[must_use]
    pub fn with_max_health(mut self, max_health: i32) -> Self {
        self.max_health = max_health;
        self
    }

    /// Sets movement speed.
    #[must_use]
    pub fn with_move_speed(mut self, speed: f32) -> Self {
        self.move_speed = speed;
        self
    }

    /// Sets knockback force and duration.
    #[must_use]
    pub fn with_knockback(mut self, force: f32, duration: f32) -> Self {
        self.knockback_force = force;
        self.knockback_duration = duration;
        self
    }

    /// Sets the death burst.
    #[must_use]
    pub fn with_death_burst(mut self, burst: DeathBurst) -> Self {
        self.death_burst = Some(burst);
        self
    }

    /// Checks the stats for values the simulation cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_health <= 0 {
            return Err(ConfigError::invalid("max_health", "must be positive"));
        }
        if !(self.move_speed.is_finite() && self.move_speed > 0.0) {
            return Err(ConfigError::invalid("move_speed", "must be positive"));
        }
        for (field, value) in [
            ("knockback_force", self.knockback_force),
            ("knockback_duration", self.knockback_duration),
            ("flash_duration", self.flash_duration),
            ("removal_delay", self.removal_delay),
            ("body_radius", self.body_radius),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(field, format!("{value} is out of range")));
            }
        }
        Ok(())
    }
}

/// Result of subtracting damage from a [`Health`] pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthChange {
    /// Already dead; nothing changed.
    Ignored,
    /// Damage taken, still alive.
    Damaged {
        /// Health left.
        remaining: i32,
    },
    /// This hit was the killing blow.
    Killed {
        /// Health left (zero or negative).
        remaining: i32,
    },
}

/// Hit points with a one-way death transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    current: i32,
    max: i32,
    dead: bool,
}

impl Health {
    /// Full health pool.
    #[must_use]
    pub fn new(max: i32) -> Self {
        let max = max.max(1);
        Self {
            current: max,
            max,
            dead: false,
        }
    }

    /// Current health; may be negative after the killing blow.
    #[must_use]
    pub fn current(&self) -> i32 {
        self.current
    }

    /// Maximum health.
    #[must_use]
    pub fn max(&self) -> i32 {
        self.max
    }

    /// Whether the death transition has happened.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Remaining health as a fraction of max, clamped to `[0, 1]`.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        (self.current as f32 / self.max as f32).clamp(0.0, 1.0)
    }

    /// Subtracts `amount`; the pool dies exactly once, when it reaches zero.
    pub fn apply(&mut self, amount: i32) -> HealthChange {
        if self.dead {
            return HealthChange::Ignored;
        }
        self.current = self.current.saturating_sub(amount.max(0));
        if self.current <= 0 {
            self.dead = true;
            HealthChange::Killed {
                remaining: self.current,
            }
        } else {
            HealthChange::Damaged {
                remaining: self.current,
            }
        }
    }
}

/// Physical state of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// World position.
    pub position: Vec2,
    /// Velocity integrated by the physics step (knockback, free movement).
    pub velocity: Vec2,
    /// Collider participates in queries.
    pub collidable: bool,
    /// Frozen bodies ignore velocity and movement.
    pub frozen: bool,
    /// Death pose: sprite flipped vertically.
    pub flip_y: bool,
}

impl Body {
    /// Body at rest.
    #[must_use]
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            collidable: true,
            frozen: false,
            flip_y: false,
        }
    }
}

/// Which state machine drives an actor.
#[derive(Debug, Clone)]
pub enum Brain {
    /// Driven by player input.
    Player(Box<PlayerController>),
    /// Autonomous.
    Enemy(Box<EnemyBehavior>),
}

impl Brain {
    /// Collision layer for this kind of actor.
    #[must_use]
    pub fn layer(&self) -> Layer {
        match self {
            Self::Player(_) => Layer::Player,
            Self::Enemy(_) => Layer::Enemy,
        }
    }
}

/// Result of [`Actor::apply_damage`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Dead or invulnerable; nothing happened.
    Ignored,
    /// Damage landed.
    Applied {
        /// Amount subtracted.
        amount: i32,
        /// Health left.
        remaining: i32,
        /// Unit knockback direction used.
        direction: Vec2,
        /// This hit killed the actor.
        killed: bool,
    },
}

impl DamageOutcome {
    /// Whether this hit killed the actor.
    #[must_use]
    pub fn killed(&self) -> bool {
        matches!(self, Self::Applied { killed: true, .. })
    }
}

/// A combat participant.
#[derive(Debug, Clone)]
pub struct Actor {
    pub(crate) id: ActorId,
    pub(crate) stats: ActorStats,
    pub(crate) health: Health,
    pub(crate) body: Body,
    pub(crate) reaction: HitReaction,
    pub(crate) stun: TimerSlot,
    pub(crate) burning: Burning,
    pub(crate) removal: TimerSlot,
    pub(crate) brain: Brain,
}

impl Actor {
    /// Creates an actor at full health.
    #[must_use]
    pub fn new(id: ActorId, stats: ActorStats, position: Vec2, brain: Brain) -> Self {
        Self {
            id,
            health: Health::new(stats.max_health),
            body: Body::at(position),
            reaction: HitReaction::new(stats.base_tint, stats.hit_tint),
            stun: TimerSlot::new(),
            burning: Burning::default(),
            removal: TimerSlot::new(),
            stats,
            brain,
        }
    }

    /// Actor ID.
    #[must_use]
    pub fn id(&self) -> ActorId {
        self.id
    }

    /// Tuning this actor was spawned with.
    #[must_use]
    pub fn stats(&self) -> &ActorStats {
        &self.stats
    }

    /// Health pool.
    #[must_use]
    pub fn health(&self) -> &Health {
        &self.health
    }

    /// Body state.
    #[must_use]
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// World position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    /// Collision layer.
    #[must_use]
    pub fn layer(&self) -> Layer {
        self.brain.layer()
    }

    /// Driving state machine.
    #[must_use]
    pub fn brain(&self) -> &Brain {
        &self.brain
    }

    /// Player controller, if player-driven.
    #[must_use]
    pub fn as_player(&self) -> Option<&PlayerController> {
        match &self.brain {
            Brain::Player(p) => Some(&**p),
            Brain::Enemy(_) => None,
        }
    }

    /// Enemy behavior, if autonomous.
    #[must_use]
    pub fn as_enemy(&self) -> Option<&EnemyBehavior> {
        match &self.brain {
            Brain::Enemy(e) => Some(&**e),
            Brain::Player(_) => None,
        }
    }

    /// Hit-reaction controller.
    #[must_use]
    pub fn reaction(&self) -> &HitReaction {
        &self.reaction
    }

    /// Whether the actor is dead.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.health.is_dead()
    }

    /// Whether a knockback is locking behavior.
    #[must_use]
    pub fn is_knocked_back(&self) -> bool {
        self.reaction.is_knocked_back()
    }

    /// Whether a stun is locking behavior.
    #[must_use]
    pub fn is_stunned(&self) -> bool {
        self.stun.is_armed()
    }

    /// Whether a fire burn is ticking.
    #[must_use]
    pub fn is_burning(&self) -> bool {
        self.burning.is_active()
    }

    /// Dead, knocked back, or stunned.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.is_dead() || self.is_knocked_back() || self.is_stunned()
    }

    /// Whether removal has been scheduled.
    #[must_use]
    pub fn removal_pending(&self) -> bool {
        self.removal.is_armed()
    }

    /// Collider state for the physics layer.
    #[must_use]
    pub fn snapshot(&self) -> BodySnapshot {
        BodySnapshot {
            id: self.id,
            layer: self.layer(),
            position: self.body.position,
            radius: self.stats.body_radius,
            collidable: self.body.collidable,
        }
    }

    /// Applies `amount` of damage from `source_position`.
    ///
    /// Dead actors ignore damage. Otherwise health drops, the hit flash and a
    /// knockback away from the source start, and if health reaches zero the
    /// actor dies: its body freezes, its collider turns off and removal is
    /// scheduled `removal_delay` seconds out.
    pub fn apply_damage(&mut self, now: f32, amount: i32, source_position: Vec2) -> DamageOutcome {
        if self.is_dead() {
            return DamageOutcome::Ignored;
        }
        if self.stats.invulnerable_during_knockback && self.is_knocked_back() {
            debug!(actor = %self.id, amount, "damage ignored during knockback");
            return DamageOutcome::Ignored;
        }

        let (remaining, killed) = match self.health.apply(amount) {
            HealthChange::Ignored => return DamageOutcome::Ignored,
            HealthChange::Damaged { remaining } => (remaining, false),
            HealthChange::Killed { remaining } => (remaining, true),
        };

        self.reaction
            .flash_hit_color(now, self.stats.flash_duration);
        let direction = knockback_direction(self.body.position, source_position);
        self.reaction.apply_knockback(
            now,
            direction,
            self.stats.knockback_force,
            self.stats.knockback_duration,
            &mut self.body.velocity,
        );

        debug!(
            actor = %self.id,
            amount,
            remaining,
            max = self.health.max(),
            "actor took damage"
        );

        if killed {
            self.die(now);
        }

        DamageOutcome::Applied {
            amount,
            remaining,
            direction,
            killed,
        }
    }

    /// Locks behavior for `duration` seconds, superseding any earlier stun.
    pub fn stun(&mut self, now: f32, duration: f32) {
        if self.is_dead() {
            return;
        }
        self.stun.arm(now, duration);
        if !self.reaction.is_knocked_back() {
            self.body.velocity = Vec2::ZERO;
        }
        match &mut self.brain {
            Brain::Player(player) => player.on_lock(),
            Brain::Enemy(enemy) => enemy.halt(),
        }
    }

    /// Starts (or restarts) a fire burn.
    pub fn ignite(&mut self, now: f32) {
        if !self.is_dead() {
            self.burning.ignite(now);
        }
    }

    fn die(&mut self, now: f32) {
        info!(actor = %self.id, position = ?self.body.position, "actor died");

        self.reaction.cancel_knockback(&mut self.body.velocity);
        self.body.velocity = Vec2::ZERO;
        self.body.frozen = true;
        self.body.collidable = false;
        self.stun.cancel();
        self.burning.extinguish();
        self.removal.arm(now, self.stats.removal_delay);

        match &mut self.brain {
            Brain::Player(player) => player.on_death(),
            Brain::Enemy(enemy) => {
                enemy.on_death();
                self.body.flip_y = enemy.config().flip_on_death;
            },
        }
    }

    /// Presentation snapshot for the animator.
    #[must_use]
    pub fn animation(&self, now: f32) -> AnimationParams {
        let mut params = match &self.brain {
            Brain::Player(player) => player.animation(self.is_dead()),
            Brain::Enemy(enemy) => enemy.animation(now, self.is_dead()),
        };
        params.flip_y = self.body.flip_y;
        params.tint = self.reaction.tint();
        params
    }
}
