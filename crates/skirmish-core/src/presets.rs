//! Named tuning presets.
//!
//! The game shipped several enemy and player variants with drifting
//! numbers; each survives here as a preset over the one canonical model.

use serde::{Deserialize, Serialize};

use crate::combo::ComboConfig;
use crate::dash::DashConfig;
use crate::enemy::{EnemyAttack, EnemyConfig, EnemyState};
use crate::player::{LocomotionMode, PlayerConfig};

/// Enemy variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EnemyPreset {
    /// Walks between its spawn point and a point to the right; never swings.
    #[default]
    Patroller,
    /// Wanders randomly, charges fast and trades blows up close.
    Brawler,
    /// Holds its post and hits hard from longer range.
    Sentinel,
}

impl EnemyPreset {
    /// All presets.
    #[must_use]
    pub const fn all() -> [Self; 3] {
        [Self::Patroller, Self::Brawler, Self::Sentinel]
    }

    /// Tuning for this preset.
    #[must_use]
    pub fn config(self) -> EnemyConfig {
        match self {
            Self::Patroller => EnemyConfig::default(),
            Self::Brawler => EnemyConfig {
                initial_state: EnemyState::Idle,
                chase_speed: 4.0,
                random_patrol: true,
                patrol_distance: 2.0,
                attack: Some(EnemyAttack {
                    damage: 10,
                    range: 1.0,
                    cooldown: 1.0,
                }),
                ..EnemyConfig::default()
            },
            Self::Sentinel => EnemyConfig {
                initial_state: EnemyState::Idle,
                detection_range: 7.0,
                patrol_distance: 0.0,
                attack: Some(EnemyAttack {
                    damage: 15,
                    range: 1.2,
                    cooldown: 1.5,
                }),
                ..EnemyConfig::default()
            },
        }
    }
}

/// Player variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlayerPreset {
    /// Tile-stepping player with the three-hit combo.
    #[default]
    Grid,
    /// Free-moving player with a single heavy swing.
    Free,
}

impl PlayerPreset {
    /// Tuning for this preset.
    #[must_use]
    pub fn config(self) -> PlayerConfig {
        match self {
            Self::Grid => PlayerConfig::default(),
            Self::Free => PlayerConfig {
                locomotion: LocomotionMode::Free,
                combo: ComboConfig {
                    max_combo_hits: 1,
                    attack_duration: 0.5,
                    combo_damage: vec![25],
                    ..ComboConfig::default()
                },
                dash: DashConfig {
                    dash_tiles: 2,
                    dash_speed: 10.0,
                    double_tap_window: 0.25,
                    dash_cooldown: 1.0,
                    ..DashConfig::default()
                },
                attack_range: 1.5,
                attack_offset: 0.75,
                ..PlayerConfig::default()
            },
        }
    }
}
