//! Player combat sequencer.
//!
//! [`PlayerController`] turns held movement intent and discrete action
//! triggers into locomotion, combo strikes and dashes. Input is buffered by
//! [`PlayerController::submit`] and consumed on the next logic tick.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use skirmish_common::{Cardinal, ConfigError};
use tracing::trace;

use crate::actor::{ActorStats, Body};
use crate::animation::{AnimState, AnimationParams};
use crate::combo::{ComboConfig, ComboState, ComboStrike};
use crate::damage::DamageKind;
use crate::dash::{DashConfig, DashPlan, DashState};
use crate::equipment::Loadout;
use crate::spatial::{LayerMask, SpatialHit, SpatialQuery};

/// How movement intent becomes motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LocomotionMode {
    /// One-tile steps along cardinal directions.
    #[default]
    Grid,
    /// Continuous velocity along the intent.
    Free,
}

/// Player tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Health, speed and knockback tuning.
    pub stats: ActorStats,
    /// Locomotion style.
    pub locomotion: LocomotionMode,
    /// Combo timings and damage table.
    pub combo: ComboConfig,
    /// Dash tuning; its tile size is also the grid step.
    pub dash: DashConfig,
    /// Radius of the melee query.
    pub attack_range: f32,
    /// Distance from the body to the melee query center.
    pub attack_offset: f32,
    /// Damage kind dealt by combo strikes.
    pub attack_kind: DamageKind,
    /// Layers the melee query can hit.
    pub enemy_mask: LayerMask,
    /// Equipped items.
    pub loadout: Loadout,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            stats: ActorStats::default(),
            locomotion: LocomotionMode::Grid,
            combo: ComboConfig::default(),
            dash: DashConfig::default(),
            attack_range: 0.5,
            attack_offset: 0.7,
            attack_kind: DamageKind::Normal,
            enemy_mask: LayerMask::ENEMY,
            loadout: Loadout::default(),
        }
    }
}

impl PlayerConfig {
    /// Checks the tuning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.stats.validate()?;
        self.combo.validate()?;
        self.dash.validate()?;
        if !(self.attack_range.is_finite() && self.attack_range > 0.0) {
            return Err(ConfigError::invalid("attack_range", "must be positive"));
        }
        if !self.attack_offset.is_finite() || self.attack_offset < 0.0 {
            return Err(ConfigError::invalid("attack_offset", "cannot be negative"));
        }
        Ok(())
    }
}

/// Input for one frame.
///
/// `movement` is held intent and persists until replaced; `attack` and
/// `dash_tap` are edge triggers consumed by the next logic tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerInput {
    /// Directional intent (4- or 8-way, need not be normalized).
    pub movement: Vec2,
    /// Attack pressed this frame.
    pub attack: bool,
    /// Direction key pressed this frame.
    pub dash_tap: Option<Cardinal>,
}

impl PlayerInput {
    /// Held movement only.
    #[must_use]
    pub fn moving(movement: Vec2) -> Self {
        Self {
            movement,
            ..Self::default()
        }
    }

    /// Attack press, no movement.
    #[must_use]
    pub fn attack() -> Self {
        Self {
            attack: true,
            ..Self::default()
        }
    }

    /// Direction tap, no movement.
    #[must_use]
    pub fn tap(direction: Cardinal) -> Self {
        Self {
            dash_tap: Some(direction),
            ..Self::default()
        }
    }
}

/// A combo step resolved against the world.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStrike {
    /// Zero-based step index.
    pub step: usize,
    /// Damage per target, bonuses included.
    pub damage: i32,
    /// Damage kind.
    pub kind: DamageKind,
    /// Center of the melee query.
    pub center: Vec2,
    /// Actors caught by the query.
    pub hits: Vec<SpatialHit>,
}

/// Result of one player logic tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerTick {
    /// Combo step executed this tick.
    pub strike: Option<PlayerStrike>,
    /// Dash started this tick.
    pub dash: Option<DashPlan>,
}

/// Locomotion, combo and dash for a player-driven actor.
#[derive(Debug, Clone)]
pub struct PlayerController {
    config: PlayerConfig,
    input: PlayerInput,
    combo: ComboState,
    dash: DashState,
    step_target: Option<Vec2>,
    moving: bool,
    last_move_dir: Vec2,
}

impl PlayerController {
    /// Creates an idle controller facing right.
    #[must_use]
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            config,
            input: PlayerInput::default(),
            combo: ComboState::new(),
            dash: DashState::new(),
            step_target: None,
            moving: false,
            last_move_dir: Vec2::X,
        }
    }

    /// Tuning.
    #[must_use]
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Equipped items.
    #[must_use]
    pub fn loadout(&self) -> &Loadout {
        &self.config.loadout
    }

    /// Mutable access for equipping items.
    pub fn loadout_mut(&mut self) -> &mut Loadout {
        &mut self.config.loadout
    }

    /// Combo progress.
    #[must_use]
    pub fn combo(&self) -> &ComboState {
        &self.combo
    }

    /// Dash progress.
    #[must_use]
    pub fn dash(&self) -> &DashState {
        &self.dash
    }

    /// Last non-zero movement direction.
    #[must_use]
    pub fn facing(&self) -> Vec2 {
        self.last_move_dir
    }

    /// Destination of the grid step in progress.
    #[must_use]
    pub fn step_target(&self) -> Option<Vec2> {
        self.step_target
    }

    /// Whether the body is in motion under its own power.
    #[must_use]
    pub fn is_moving(&self) -> bool {
        self.step_target.is_some() || self.dash.is_dashing() || self.moving
    }

    /// Center of the melee query for the current facing.
    #[must_use]
    pub fn attack_point(&self, position: Vec2) -> Vec2 {
        position + self.last_move_dir * self.config.attack_offset
    }

    /// Buffers input for the next logic tick.
    pub fn submit(&mut self, input: PlayerInput) {
        self.input.movement = input.movement;
        self.input.attack |= input.attack;
        if input.dash_tap.is_some() {
            self.input.dash_tap = input.dash_tap;
        }
    }

    /// Runs one logic tick.
    ///
    /// `locked` is true while the actor is knocked back or stunned: buffered
    /// input is dropped and locomotion stops, but the combo timers and an
    /// active dash keep running.
    pub fn update<S: SpatialQuery>(
        &mut self,
        now: f32,
        body: &mut Body,
        locked: bool,
        spatial: &S,
    ) -> PlayerTick {
        let movement = self.input.movement;
        let attack = std::mem::take(&mut self.input.attack);
        let dash_tap = self.input.dash_tap.take();
        let mut tick = PlayerTick::default();

        if self.dash.update(now) {
            body.position = self.dash.target();
        }

        if let Some(strike) = self.combo.update(now, &self.config.combo) {
            tick.strike = Some(self.resolve_strike(strike, body.position, spatial));
        }

        if locked {
            self.on_lock();
            return tick;
        }

        if self.dash.is_dashing() {
            return tick;
        }

        self.locomotion(movement, body, spatial);

        if attack {
            if let Some(strike) = self.combo.press(now, &self.config.combo) {
                tick.strike = Some(self.resolve_strike(strike, body.position, spatial));
            }
        }

        if let Some(direction) = dash_tap {
            if !self.combo.is_attacking()
                && self.dash.register_tap(now, direction, &self.config.dash)
            {
                tick.dash = Some(self.start_dash(now, direction, body, spatial));
            }
        }

        tick
    }

    fn locomotion<S: SpatialQuery>(&mut self, movement: Vec2, body: &mut Body, spatial: &S) {
        match self.config.locomotion {
            LocomotionMode::Grid => {
                if self.step_target.is_some() {
                    return;
                }
                let Some(direction) = Cardinal::from_intent(movement) else {
                    return;
                };
                let step = direction.to_vec2();
                self.last_move_dir = step;
                let target = body.position + step * self.config.dash.tile_size;
                if spatial.is_walkable(target) {
                    self.step_target = Some(target);
                    self.combo.cancel_for_movement();
                }
            },
            LocomotionMode::Free => {
                let intent = if movement.is_finite() {
                    movement.normalize_or_zero()
                } else {
                    Vec2::ZERO
                };
                if intent == Vec2::ZERO {
                    self.moving = false;
                } else {
                    self.last_move_dir = intent;
                    if !self.moving {
                        self.combo.cancel_for_movement();
                    }
                    self.moving = true;
                }
                body.velocity = intent * self.config.stats.move_speed;
            },
        }
    }

    fn resolve_strike<S: SpatialQuery>(
        &self,
        strike: ComboStrike,
        position: Vec2,
        spatial: &S,
    ) -> PlayerStrike {
        let center = self.attack_point(position);
        let hits = spatial.overlap_circle(center, self.config.attack_range, self.config.enemy_mask);
        let damage = strike.damage + self.config.loadout.attack_bonus();
        trace!(step = strike.step, damage, hits = hits.len(), "combo step");
        PlayerStrike {
            step: strike.step,
            damage,
            kind: self.config.attack_kind,
            center,
            hits,
        }
    }

    fn start_dash<S: SpatialQuery>(
        &mut self,
        now: f32,
        direction: Cardinal,
        body: &mut Body,
        spatial: &S,
    ) -> DashPlan {
        self.step_target = None;
        self.moving = false;
        body.velocity = Vec2::ZERO;
        self.combo.interrupt();
        self.last_move_dir = direction.to_vec2();
        self.dash
            .begin(now, body.position, direction, &self.config.dash, spatial)
    }

    /// Moves the body for one physics step (grid step or dash).
    pub fn integrate(&mut self, body: &mut Body, dt: f32) {
        if self.dash.is_dashing() {
            body.position = self.dash.advance(body.position, dt, &self.config.dash);
            return;
        }
        if let Some(target) = self.step_target {
            body.position =
                crate::step_towards(body.position, target, self.config.stats.move_speed * dt);
            if body.position == target {
                self.step_target = None;
            }
        }
    }

    /// Stops locomotion (knockback, stun).
    pub(crate) fn on_lock(&mut self) {
        self.step_target = None;
        self.moving = false;
    }

    /// Abandons everything in flight.
    pub(crate) fn on_death(&mut self) {
        self.combo.interrupt();
        self.dash.cancel();
        self.on_lock();
        self.input = PlayerInput::default();
    }

    /// Presentation snapshot.
    #[must_use]
    pub fn animation(&self, dead: bool) -> AnimationParams {
        let state = if dead {
            AnimState::Die
        } else if self.combo.is_attacking() {
            AnimState::Attack
        } else if self.is_moving() {
            AnimState::Walk
        } else {
            AnimState::Idle
        };
        AnimationParams {
            state,
            move_x: self.last_move_dir.x,
            move_y: self.last_move_dir.y,
            combo_step: i32::try_from(self.combo.display_step()).unwrap_or(i32::MAX),
            flip_x: self.last_move_dir.x < 0.0,
            ..AnimationParams::default()
        }
    }
}
