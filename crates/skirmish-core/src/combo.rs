//! Melee combo sequencing.
//!
//! The sequencer is a two-state machine (idle / attacking) layered with a
//! step counter:
//! - pressing attack while idle executes the next step immediately;
//! - pressing during the second half of a step queues the next one, which
//!   fires as soon as the current step's timer expires;
//! - after the last queued step the combo stays open for a short window,
//!   then the counter returns to zero;
//! - a long pause or the start of locomotion also resets the counter.

use serde::{Deserialize, Serialize};
use skirmish_common::ConfigError;

use crate::timer::TimerSlot;

/// Combo tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComboConfig {
    /// Number of steps in a full chain.
    pub max_combo_hits: usize,
    /// How long the chain stays open after a step that was not followed up.
    pub combo_window_time: f32,
    /// Duration of one step.
    pub attack_duration: f32,
    /// Idle time after which the next press always starts from step 0.
    pub combo_reset_time: f32,
    /// Damage per step; shorter tables repeat their last entry.
    pub combo_damage: Vec<i32>,
}

impl Default for ComboConfig {
    fn default() -> Self {
        Self {
            max_combo_hits: 3,
            combo_window_time: 0.4,
            attack_duration: 0.35,
            combo_reset_time: 0.8,
            combo_damage: vec![1, 1, 2],
        }
    }
}

impl ComboConfig {
    /// Damage for a zero-based step index.
    ///
    /// Indices past the end of the table use its last entry; an empty table
    /// deals 1 per step.
    #[must_use]
    pub fn damage_for_step(&self, step: usize) -> i32 {
        self.combo_damage
            .get(step)
            .or_else(|| self.combo_damage.last())
            .copied()
            .unwrap_or(1)
    }

    /// Checks the tuning for values the sequencer cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_combo_hits == 0 {
            return Err(ConfigError::invalid("max_combo_hits", "must be at least 1"));
        }
        for (field, value) in [
            ("combo_window_time", self.combo_window_time),
            ("attack_duration", self.attack_duration),
            ("combo_reset_time", self.combo_reset_time),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(field, format!("{value} is not a duration")));
            }
        }
        if let Some(bad) = self.combo_damage.iter().find(|d| **d < 0) {
            return Err(ConfigError::invalid("combo_damage", format!("negative entry {bad}")));
        }
        Ok(())
    }
}

/// One executed combo step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComboStrike {
    /// Zero-based step index.
    pub step: usize,
    /// Table damage for the step (before bonuses).
    pub damage: i32,
}

/// In-progress melee sequence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComboState {
    step: usize,
    last_attack_time: Option<f32>,
    queued: bool,
    attacking: bool,
    step_timer: TimerSlot,
    window_timer: TimerSlot,
    /// Step index last shown to the animator.
    display_step: usize,
}

impl ComboState {
    /// Creates a fresh combo.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of steps executed in the current chain.
    #[must_use]
    pub fn step(&self) -> usize {
        self.step
    }

    /// Whether a step is in progress.
    #[must_use]
    pub fn is_attacking(&self) -> bool {
        self.attacking
    }

    /// Whether a follow-up is queued.
    #[must_use]
    pub fn is_queued(&self) -> bool {
        self.queued
    }

    /// Step index for the animator's combo parameter.
    #[must_use]
    pub fn display_step(&self) -> usize {
        self.display_step
    }

    /// Handles an attack press.
    ///
    /// Returns the step to execute now, if any.
    pub fn press(&mut self, now: f32, config: &ComboConfig) -> Option<ComboStrike> {
        let since_last = self
            .last_attack_time
            .map_or(f32::INFINITY, |t| now - t);

        if since_last > config.combo_reset_time {
            self.step = 0;
        }

        if self.attacking {
            if self.step < config.max_combo_hits && since_last >= config.attack_duration * 0.5 {
                self.queued = true;
            }
            return None;
        }

        if self.step < config.max_combo_hits {
            return Some(self.execute(now, config));
        }
        None
    }

    /// Advances the step and window timers.
    ///
    /// Returns a queued step that was chained this tick.
    pub fn update(&mut self, now: f32, config: &ComboConfig) -> Option<ComboStrike> {
        if self.step_timer.poll(now) {
            self.attacking = false;
            if self.queued && self.step < config.max_combo_hits {
                return Some(self.execute(now, config));
            }
            self.queued = false;
            self.window_timer.arm(now, config.combo_window_time);
        }

        if self.window_timer.poll(now) && !self.attacking {
            self.step = 0;
            self.display_step = 0;
        }
        None
    }

    /// Locomotion started: the chain restarts from step 0.
    ///
    /// A step already in progress keeps running to completion.
    pub fn cancel_for_movement(&mut self) {
        self.step = 0;
    }

    /// Drops the chain entirely (dash, death).
    pub fn interrupt(&mut self) {
        self.step = 0;
        self.queued = false;
        self.attacking = false;
        self.display_step = 0;
        self.step_timer.cancel();
        self.window_timer.cancel();
    }

    fn execute(&mut self, now: f32, config: &ComboConfig) -> ComboStrike {
        self.attacking = true;
        self.last_attack_time = Some(now);
        self.queued = false;

        let strike = ComboStrike {
            step: self.step,
            damage: config.damage_for_step(self.step),
        };
        self.display_step = self.step;
        self.step += 1;

        self.window_timer.cancel();
        self.step_timer.arm(now, config.attack_duration);
        strike
    }
}
