//! Damage requests and elemental side effects.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use skirmish_common::ActorId;

use crate::spatial::LayerMask;
use crate::timer::TimerSlot;

/// Elemental flavor of a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DamageKind {
    /// Plain physical damage.
    #[default]
    Normal,
    /// Extra damage plus a burn over time.
    Fire,
    /// Extra damage plus a short stun.
    Ice,
    /// Extra damage.
    Lightning,
}

impl DamageKind {
    /// Damage multiplier for this kind.
    #[must_use]
    pub fn multiplier(self) -> f32 {
        match self {
            Self::Normal => 1.0,
            Self::Fire => 1.5,
            Self::Ice => 1.2,
            Self::Lightning => 1.3,
        }
    }

    /// Scales a base amount, rounding to the nearest whole point.
    ///
    /// Halves round to even, so a Fire 3 is 4 and a Fire 7 is 10.
    #[must_use]
    pub fn scale(self, amount: i32) -> i32 {
        (amount as f32 * self.multiplier()).round_ties_even() as i32
    }

    /// Stun applied on hit, in seconds.
    #[must_use]
    pub fn stun_duration(self) -> Option<f32> {
        match self {
            Self::Ice => Some(1.0),
            _ => None,
        }
    }

    /// Whether the hit sets the victim on fire.
    #[must_use]
    pub fn ignites(self) -> bool {
        self == Self::Fire
    }
}

/// A pending damage application, resolved by the simulation in FIFO order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageRequest {
    /// Actor receiving the damage.
    pub target: ActorId,
    /// Base amount before the kind multiplier.
    pub amount: i32,
    /// Elemental kind.
    pub kind: DamageKind,
    /// Where the hit came from; only used for knockback direction.
    /// `None` means "from the target's own position".
    pub source_position: Option<Vec2>,
    /// Attacking actor, if any.
    pub source: Option<ActorId>,
}

impl DamageRequest {
    /// Creates a normal hit from a world position.
    #[must_use]
    pub fn new(target: ActorId, amount: i32, source_position: Vec2) -> Self {
        Self {
            target,
            amount,
            kind: DamageKind::Normal,
            source_position: Some(source_position),
            source: None,
        }
    }

    /// Creates a hit sourced at the target itself.
    #[must_use]
    pub fn self_inflicted(target: ActorId, amount: i32) -> Self {
        Self {
            target,
            amount,
            kind: DamageKind::Normal,
            source_position: None,
            source: None,
        }
    }

    /// Sets the elemental kind.
    #[must_use]
    pub fn with_kind(mut self, kind: DamageKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the attacking actor.
    #[must_use]
    pub fn with_source(mut self, source: ActorId) -> Self {
        self.source = Some(source);
        self
    }
}

/// Burn ticks per ignition.
pub const BURN_TICKS: u32 = 3;
/// Damage per burn tick.
pub const BURN_DAMAGE: i32 = 5;
/// Seconds between burn ticks.
pub const BURN_INTERVAL: f32 = 0.5;

/// Damage-over-time from a fire hit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Burning {
    ticks_left: u32,
    next_tick: TimerSlot,
}

impl Burning {
    /// Ignites (or re-ignites) at `now`; the first tick lands one interval later.
    pub fn ignite(&mut self, now: f32) {
        self.ticks_left = BURN_TICKS;
        self.next_tick.arm(now, BURN_INTERVAL);
    }

    /// Whether ticks are still pending.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.ticks_left > 0
    }

    /// Returns the damage due this tick, if any.
    pub fn update(&mut self, now: f32) -> Option<i32> {
        if self.ticks_left == 0 || !self.next_tick.poll(now) {
            return None;
        }
        self.ticks_left -= 1;
        if self.ticks_left > 0 {
            self.next_tick.arm(now, BURN_INTERVAL);
        }
        Some(BURN_DAMAGE)
    }

    /// Puts the fire out.
    pub fn extinguish(&mut self) {
        self.ticks_left = 0;
        self.next_tick.cancel();
    }
}

/// Area damage released when its owner dies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeathBurst {
    /// Blast radius.
    pub radius: f32,
    /// Damage dealt to everything caught in it.
    pub damage: i32,
    /// Layers the blast can hit.
    pub mask: LayerMask,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_scaling() {
        assert_eq!(DamageKind::Normal.scale(10), 10);
        assert_eq!(DamageKind::Fire.scale(10), 15);
        assert_eq!(DamageKind::Ice.scale(10), 12);
        assert_eq!(DamageKind::Lightning.scale(10), 13);
        assert_eq!(DamageKind::Fire.scale(0), 0);
    }

    #[test]
    fn test_scale_rounds_halves_to_even() {
        assert_eq!(DamageKind::Fire.scale(1), 2);
        assert_eq!(DamageKind::Fire.scale(3), 4);
        assert_eq!(DamageKind::Fire.scale(5), 8);
        assert_eq!(DamageKind::Fire.scale(7), 10);
    }

    #[test]
    fn test_kind_side_effects() {
        assert!(DamageKind::Fire.ignites());
        assert!(!DamageKind::Ice.ignites());
        assert_eq!(DamageKind::Ice.stun_duration(), Some(1.0));
        assert_eq!(DamageKind::Lightning.stun_duration(), None);
    }

    #[test]
    fn test_burn_ticks() {
        let mut burn = Burning::default();
        burn.ignite(0.0);

        assert_eq!(burn.update(0.25), None);
        assert_eq!(burn.update(0.5), Some(BURN_DAMAGE));
        assert_eq!(burn.update(1.0), Some(BURN_DAMAGE));
        assert_eq!(burn.update(1.5), Some(BURN_DAMAGE));
        assert!(!burn.is_active());
        assert_eq!(burn.update(2.0), None);
    }

    #[test]
    fn test_reignite_resets_ticks() {
        let mut burn = Burning::default();
        burn.ignite(0.0);
        burn.update(0.5);
        burn.ignite(0.75);

        assert_eq!(burn.update(1.0), None);
        assert_eq!(burn.update(1.25), Some(BURN_DAMAGE));
        assert!(burn.is_active());
    }

    #[test]
    fn test_extinguish() {
        let mut burn = Burning::default();
        burn.ignite(0.0);
        burn.extinguish();
        assert_eq!(burn.update(1.0), None);
    }
}
