//! # Skirmish Core
//!
//! Real-time combat and agent-behavior core for a top-down action game.
//!
//! This crate decides, tick by tick, what the player and enemies are doing
//! and resolves the consequences:
//! - Health, damage and death for every actor
//! - Knockback and hit flash with superseding timers
//! - Player combo chains, grid/free locomotion and double-tap dash
//! - Enemy Idle / Patrol / Chase behavior with peer avoidance
//! - Spatial query contract for melee, avoidance and walkability
//! - Outbound events and animation parameters for presentation
//!
//! Rendering, input devices and collision geometry live outside; the core
//! talks to them through [`SpatialQuery`], [`PlayerInput`] and [`EventBus`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use glam::Vec2;

pub mod actor;
pub mod animation;
pub mod combo;
pub mod damage;
pub mod dash;
pub mod enemy;
pub mod equipment;
pub mod events;
pub mod knockback;
pub mod player;
pub mod presets;
pub mod simulation;
pub mod spatial;
pub mod timer;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::actor::*;
    pub use crate::animation::*;
    pub use crate::combo::*;
    pub use crate::damage::*;
    pub use crate::dash::*;
    pub use crate::enemy::*;
    pub use crate::equipment::*;
    pub use crate::events::*;
    pub use crate::knockback::*;
    pub use crate::player::*;
    pub use crate::presets::*;
    pub use crate::simulation::*;
    pub use crate::spatial::*;
    pub use crate::timer::*;
}

pub use prelude::*;

/// Moves `from` toward `to` by at most `max_delta`, landing exactly on `to`
/// when it is within reach.
#[must_use]
pub fn step_towards(from: Vec2, to: Vec2, max_delta: f32) -> Vec2 {
    let delta = to - from;
    let distance = delta.length();
    if distance <= max_delta || distance <= f32::EPSILON {
        return to;
    }
    from + delta / distance * max_delta.max(0.0)
}
