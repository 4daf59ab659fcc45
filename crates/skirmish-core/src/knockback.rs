//! Knockback and hit-reaction controller.
//!
//! A damage event turns into two independent timed effects:
//! - a knockback: velocity is zeroed, one impulse is queued for the next
//!   physics step, and behavior is locked until the deadline, at which point
//!   velocity is zeroed again;
//! - a color flash that always restores the original tint at expiry.
//!
//! Re-triggering either effect supersedes the pending deadline instead of
//! stacking a second one.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::timer::TimerSlot;

/// Sprite tint, linear RGBA.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tint {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
    /// Alpha channel.
    pub a: f32,
}

impl Tint {
    /// Untinted.
    pub const WHITE: Self = Self::rgba(1.0, 1.0, 1.0, 1.0);
    /// Default hit flash.
    pub const RED: Self = Self::rgba(1.0, 0.0, 0.0, 1.0);

    /// Creates a tint.
    #[must_use]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Tint {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Direction used when the source of a hit coincides with the victim.
pub const FALLBACK_KNOCKBACK_DIRECTION: Vec2 = Vec2::X;

/// Direction pointing from `source` to `position`, or
/// [`FALLBACK_KNOCKBACK_DIRECTION`] when the two coincide.
#[must_use]
pub fn knockback_direction(position: Vec2, source: Vec2) -> Vec2 {
    (position - source)
        .try_normalize()
        .unwrap_or(FALLBACK_KNOCKBACK_DIRECTION)
}

/// What expired during a [`HitReaction::update`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactionExpiry {
    /// The knockback lock was released this tick.
    pub knockback_ended: bool,
    /// The flash tint was restored this tick.
    pub flash_ended: bool,
}

/// Per-actor knockback and flash state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HitReaction {
    knockback: TimerSlot,
    /// Impulse waiting for the next physics step.
    pending_impulse: Option<Vec2>,
    flash: TimerSlot,
    original_tint: Tint,
    hit_tint: Tint,
    tint: Tint,
}

impl HitReaction {
    /// Creates a controller for an actor whose resting tint is `original`.
    #[must_use]
    pub fn new(original: Tint, hit: Tint) -> Self {
        Self {
            knockback: TimerSlot::new(),
            pending_impulse: None,
            flash: TimerSlot::new(),
            original_tint: original,
            hit_tint: hit,
            tint: original,
        }
    }

    /// Starts (or restarts) a knockback.
    ///
    /// Zeroes `velocity` and queues `direction * force` as the impulse for the
    /// next physics step, replacing any impulse from an earlier hit that has
    /// not been integrated yet. Returns the timer token.
    pub fn apply_knockback(
        &mut self,
        now: f32,
        direction: Vec2,
        force: f32,
        duration: f32,
        velocity: &mut Vec2,
    ) -> u32 {
        let direction = direction
            .try_normalize()
            .unwrap_or(FALLBACK_KNOCKBACK_DIRECTION);
        *velocity = Vec2::ZERO;
        self.pending_impulse = Some(direction * force.max(0.0));
        self.knockback.arm(now, duration)
    }

    /// Starts (or restarts) the hit flash.
    pub fn flash_hit_color(&mut self, now: f32, duration: f32) {
        self.tint = self.hit_tint;
        self.flash.arm(now, duration);
    }

    /// Expires due effects.
    pub fn update(&mut self, now: f32, velocity: &mut Vec2) -> ReactionExpiry {
        let mut expiry = ReactionExpiry::default();
        if self.knockback.poll(now) {
            *velocity = Vec2::ZERO;
            self.pending_impulse = None;
            expiry.knockback_ended = true;
        }
        if self.flash.poll(now) {
            self.tint = self.original_tint;
            expiry.flash_ended = true;
        }
        expiry
    }

    /// Hands the queued impulse to the physics step.
    pub fn take_impulse(&mut self) -> Option<Vec2> {
        self.pending_impulse.take()
    }

    /// Queued impulse, if any.
    #[must_use]
    pub fn pending_impulse(&self) -> Option<Vec2> {
        self.pending_impulse
    }

    /// Whether behavior is currently locked by a knockback.
    #[must_use]
    pub fn is_knocked_back(&self) -> bool {
        self.knockback.is_armed()
    }

    /// Token of the active knockback deadline.
    #[must_use]
    pub fn knockback_generation(&self) -> u32 {
        self.knockback.generation()
    }

    /// Seconds left in the active knockback.
    #[must_use]
    pub fn knockback_remaining(&self, now: f32) -> f32 {
        self.knockback.remaining(now)
    }

    /// Ends the knockback immediately (used on death).
    pub fn cancel_knockback(&mut self, velocity: &mut Vec2) {
        self.knockback.cancel();
        self.pending_impulse = None;
        *velocity = Vec2::ZERO;
    }

    /// Current tint.
    #[must_use]
    pub fn tint(&self) -> Tint {
        self.tint
    }

    /// Whether the flash is showing.
    #[must_use]
    pub fn is_flashing(&self) -> bool {
        self.flash.is_armed()
    }
}
