//! Double-tap dash.
//!
//! Tapping the same cardinal direction twice within the double-tap window
//! (and outside the cooldown) dashes up to `dash_tiles` tiles in that
//! direction, stopping short of the first tile that is not walkable.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use skirmish_common::{Cardinal, ConfigError};
use tracing::debug;

use crate::spatial::SpatialQuery;
use crate::timer::TimerSlot;

/// Dash tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    /// Maximum tiles covered by one dash.
    pub dash_tiles: u32,
    /// Dash travel speed (units per second).
    pub dash_speed: f32,
    /// Max seconds between the two taps.
    pub double_tap_window: f32,
    /// Min seconds between dash starts.
    pub dash_cooldown: f32,
    /// World size of one tile.
    pub tile_size: f32,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            dash_tiles: 3,
            dash_speed: 15.0,
            double_tap_window: 0.3,
            dash_cooldown: 0.8,
            tile_size: 1.0,
        }
    }
}

impl DashConfig {
    /// Time a full-length dash takes.
    #[must_use]
    pub fn nominal_duration(&self) -> f32 {
        self.dash_tiles as f32 * self.tile_size / self.dash_speed
    }

    /// Checks the tuning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.dash_speed.is_finite() && self.dash_speed > 0.0) {
            return Err(ConfigError::invalid("dash_speed", "must be positive"));
        }
        if !(self.tile_size.is_finite() && self.tile_size > 0.0) {
            return Err(ConfigError::invalid("tile_size", "must be positive"));
        }
        if self.double_tap_window < 0.0 || self.dash_cooldown < 0.0 {
            return Err(ConfigError::invalid(
                "dash_cooldown",
                "windows and cooldowns cannot be negative",
            ));
        }
        Ok(())
    }
}

/// A dash that has just started.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DashPlan {
    /// Direction tapped.
    pub direction: Cardinal,
    /// Start position.
    pub from: Vec2,
    /// Farthest walkable tile found (may equal `from`).
    pub to: Vec2,
    /// Seconds the dash lasts.
    pub duration: f32,
}

/// Double-tap tracking and the active dash.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashState {
    last_tap: Option<Cardinal>,
    last_tap_time: f32,
    last_dash_time: Option<f32>,
    dashing: bool,
    target: Vec2,
    end: TimerSlot,
}

impl DashState {
    /// Creates an idle dash state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a dash is in progress.
    #[must_use]
    pub fn is_dashing(&self) -> bool {
        self.dashing
    }

    /// Destination of the current (or last) dash.
    #[must_use]
    pub fn target(&self) -> Vec2 {
        self.target
    }

    /// Whether the cooldown since the last dash has elapsed.
    #[must_use]
    pub fn cooldown_ready(&self, now: f32, config: &DashConfig) -> bool {
        self.last_dash_time
            .map_or(true, |t| now - t >= config.dash_cooldown)
    }

    /// Records a directional tap; returns `true` when it completes a double tap.
    pub fn register_tap(&mut self, now: f32, direction: Cardinal, config: &DashConfig) -> bool {
        let repeated = self.last_tap == Some(direction)
            && now - self.last_tap_time <= config.double_tap_window;

        if repeated && self.cooldown_ready(now, config) {
            // A third tap has to start a fresh pair.
            self.last_tap = None;
            return true;
        }

        self.last_tap = Some(direction);
        self.last_tap_time = now;
        false
    }

    /// Farthest walkable tile along `direction`, scanning up to `dash_tiles`.
    pub fn scan_target<S: SpatialQuery>(
        start: Vec2,
        direction: Cardinal,
        config: &DashConfig,
        spatial: &S,
    ) -> Vec2 {
        let step = direction.to_vec2() * config.tile_size;
        let mut target = start;
        for i in 1..=config.dash_tiles {
            let next = start + step * i as f32;
            if !spatial.is_walkable(next) {
                break;
            }
            target = next;
        }
        target
    }

    /// Starts a dash from `start`.
    ///
    /// A dash that cannot move still consumes the cooldown and holds the
    /// dashing flag for the nominal duration.
    pub fn begin<S: SpatialQuery>(
        &mut self,
        now: f32,
        start: Vec2,
        direction: Cardinal,
        config: &DashConfig,
        spatial: &S,
    ) -> DashPlan {
        let to = Self::scan_target(start, direction, config, spatial);
        let distance = start.distance(to);
        let duration = if distance > f32::EPSILON {
            distance / config.dash_speed
        } else {
            config.nominal_duration()
        };

        self.dashing = true;
        self.target = to;
        self.last_dash_time = Some(now);
        self.end.arm(now, duration);

        debug!(?direction, ?start, ?to, duration, "dash started");
        DashPlan {
            direction,
            from: start,
            to,
            duration,
        }
    }

    /// Moves `position` toward the dash target for one physics step.
    pub fn advance(&self, position: Vec2, dt: f32, config: &DashConfig) -> Vec2 {
        if !self.dashing {
            return position;
        }
        crate::step_towards(position, self.target, config.dash_speed * dt)
    }

    /// Ends the dash when its deadline passes; returns `true` on the tick it ends.
    pub fn update(&mut self, now: f32) -> bool {
        if self.dashing && self.end.poll(now) {
            self.dashing = false;
            return true;
        }
        false
    }

    /// Aborts an in-progress dash without refunding the cooldown.
    pub fn cancel(&mut self) {
        self.dashing = false;
        self.end.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::GridSpatial;

    #[test]
    fn test_nominal_duration() {
        let config = DashConfig {
            dash_tiles: 3,
            dash_speed: 12.0,
            tile_size: 1.0,
            ..DashConfig::default()
        };
        assert!((config.nominal_duration() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_double_tap_same_direction() {
        let config = DashConfig::default();
        let mut dash = DashState::new();

        assert!(!dash.register_tap(1.0, Cardinal::Right, &config));
        assert!(dash.register_tap(1.25, Cardinal::Right, &config));
    }

    #[test]
    fn test_different_directions_never_dash() {
        let config = DashConfig::default();
        let mut dash = DashState::new();

        assert!(!dash.register_tap(1.0, Cardinal::Right, &config));
        assert!(!dash.register_tap(1.125, Cardinal::Left, &config));
        assert!(!dash.register_tap(1.25, Cardinal::Right, &config));
    }

    #[test]
    fn test_slow_taps_do_not_dash() {
        let config = DashConfig::default();
        let mut dash = DashState::new();

        assert!(!dash.register_tap(1.0, Cardinal::Up, &config));
        assert!(!dash.register_tap(1.5, Cardinal::Up, &config));
        // The second tap opened a new pair.
        assert!(dash.register_tap(1.75, Cardinal::Up, &config));
    }

    #[test]
    fn test_cooldown_blocks_second_dash() {
        let config = DashConfig::default();
        let grid = GridSpatial::new(1.0);
        let mut dash = DashState::new();

        dash.register_tap(0.0, Cardinal::Right, &config);
        assert!(dash.register_tap(0.125, Cardinal::Right, &config));
        dash.begin(0.125, Vec2::ZERO, Cardinal::Right, &config, &grid);

        dash.register_tap(0.5, Cardinal::Right, &config);
        assert!(!dash.register_tap(0.625, Cardinal::Right, &config));

        dash.register_tap(1.0, Cardinal::Right, &config);
        assert!(dash.register_tap(1.125, Cardinal::Right, &config));
    }

    #[test]
    fn test_scan_stops_before_wall() {
        let config = DashConfig::default();
        let mut grid = GridSpatial::new(1.0);
        grid.block_tile(3, 0);

        let to = DashState::scan_target(Vec2::ZERO, Cardinal::Right, &config, &grid);
        assert_eq!(to, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_blocked_dash_holds_for_nominal_duration() {
        let config = DashConfig::default();
        let mut grid = GridSpatial::new(1.0);
        grid.block_tile(0, 1);
        let mut dash = DashState::new();

        let plan = dash.begin(0.0, Vec2::ZERO, Cardinal::Up, &config, &grid);
        assert_eq!(plan.to, Vec2::ZERO);
        assert!((plan.duration - config.nominal_duration()).abs() < 1e-6);
        assert!(dash.is_dashing());
        assert!(!dash.cooldown_ready(0.5, &config));

        assert!(!dash.update(0.1));
        assert!(dash.update(0.25));
        assert!(!dash.is_dashing());
    }

    #[test]
    fn test_advance_moves_toward_target() {
        let config = DashConfig::default();
        let grid = GridSpatial::new(1.0);
        let mut dash = DashState::new();
        dash.begin(0.0, Vec2::ZERO, Cardinal::Left, &config, &grid);

        let p = dash.advance(Vec2::ZERO, 0.1, &config);
        assert!((p.x + 1.5).abs() < 1e-5);
        let p = dash.advance(p, 1.0, &config);
        assert_eq!(p, Vec2::new(-3.0, 0.0));
    }
}
