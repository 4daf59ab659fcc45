//! Simulation clock and deadline timers.
//!
//! Every "wait, then act" behavior in the core is a [`TimerSlot`] checked by
//! the next tick that observes it, so timer granularity equals the tick
//! period. Re-arming a slot replaces its deadline and bumps its generation,
//! which invalidates any token handed out for the previous deadline.

use serde::{Deserialize, Serialize};

/// Monotonic simulation clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    /// Seconds since the simulation started.
    now: f32,
    /// Number of completed ticks.
    tick: u64,
}

impl SimClock {
    /// Creates a clock at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulation time in seconds.
    #[must_use]
    pub fn now(&self) -> f32 {
        self.now
    }

    /// Number of ticks advanced so far.
    #[must_use]
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Advances the clock by one tick of `dt` seconds and returns the new time.
    ///
    /// Negative or non-finite deltas advance the tick counter but not time.
    pub fn advance(&mut self, dt: f32) -> f32 {
        if dt.is_finite() && dt > 0.0 {
            self.now += dt;
        }
        self.tick += 1;
        self.now
    }
}

/// A single pending deadline with a generation token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimerSlot {
    deadline: Option<f32>,
    generation: u32,
}

impl TimerSlot {
    /// Creates an idle slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the slot to fire `duration` seconds after `now`.
    ///
    /// Any previously pending deadline is superseded. Returns the token for
    /// the new deadline.
    pub fn arm(&mut self, now: f32, duration: f32) -> u32 {
        self.generation = self.generation.wrapping_add(1);
        self.deadline = Some(now + duration.max(0.0));
        self.generation
    }

    /// Drops the pending deadline, if any.
    pub fn cancel(&mut self) {
        if self.deadline.take().is_some() {
            self.generation = self.generation.wrapping_add(1);
        }
    }

    /// Whether a deadline is pending.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Token of the most recent arm.
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Whether `token` still refers to the pending deadline.
    #[must_use]
    pub fn is_current(&self, token: u32) -> bool {
        self.deadline.is_some() && self.generation == token
    }

    /// Pending deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<f32> {
        self.deadline
    }

    /// Seconds left until the deadline (zero when idle or overdue).
    #[must_use]
    pub fn remaining(&self, now: f32) -> f32 {
        self.deadline.map_or(0.0, |d| (d - now).max(0.0))
    }

    /// Fires the slot if its deadline has been reached.
    ///
    /// Returns `true` exactly once per arm; the slot is idle afterwards.
    pub fn poll(&mut self, now: f32) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            },
            _ => false,
        }
    }
}
