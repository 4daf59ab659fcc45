//! Runner configuration.
//!
//! Arena layout, actor presets and run length. Loaded from and saved to a
//! TOML file; anything missing falls back to defaults.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use skirmish_common::ConfigError;
use skirmish_core::{EnemyPreset, PlayerPreset};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use tracing::{info, warn};

/// Configuration file name.
pub const CONFIG_FILE: &str = "skirmish.toml";

/// One enemy to place in the arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemySpawn {
    /// Tuning preset.
    pub preset: EnemyPreset,
    /// Spawn position (also the patrol anchor).
    pub position: Vec2,
}

/// Runner configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Simulation Settings ===
    /// Seed for random patrols
    pub seed: u64,
    /// Logic/physics ticks per second
    pub tick_rate: u32,
    /// Seconds to simulate
    pub duration_secs: f32,
    /// Event bus capacity per frame
    pub event_capacity: usize,

    // === Arena Settings ===
    /// Arena width in tiles
    pub arena_width: i32,
    /// Arena height in tiles
    pub arena_height: i32,
    /// World size of one tile
    pub tile_size: f32,
    /// Blocked tiles
    pub walls: Vec<[i32; 2]>,

    // === Actor Settings ===
    /// Player tuning preset
    pub player_preset: PlayerPreset,
    /// Player spawn position
    pub player_spawn: Vec2,
    /// Enemies to place
    pub enemies: Vec<EnemySpawn>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            tick_rate: 64,
            duration_secs: 20.0,
            event_capacity: 1024,

            arena_width: 16,
            arena_height: 10,
            tile_size: 1.0,
            walls: vec![[7, 3], [7, 4], [7, 5]],

            player_preset: PlayerPreset::Grid,
            player_spawn: Vec2::new(2.0, 4.0),
            enemies: vec![
                EnemySpawn {
                    preset: EnemyPreset::Patroller,
                    position: Vec2::new(10.0, 2.0),
                },
                EnemySpawn {
                    preset: EnemyPreset::Brawler,
                    position: Vec2::new(12.0, 6.0),
                },
                EnemySpawn {
                    preset: EnemyPreset::Sentinel,
                    position: Vec2::new(5.0, 8.0),
                },
            ],
        }
    }
}

impl SimConfig {
    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        match fs::File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read config file: {e}");
                    return Self::default();
                }

                match toml::from_str(&contents) {
                    Ok(config) => {
                        info!("Loaded config from {}", path.display());
                        config
                    },
                    Err(e) => {
                        warn!("Failed to parse config file: {e}");
                        Self::default()
                    },
                }
            },
            Err(e) => {
                warn!("Failed to open config file: {e}");
                Self::default()
            },
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        self.tick_rate = self.tick_rate.clamp(10, 240);
        if !self.duration_secs.is_finite() {
            self.duration_secs = Self::default().duration_secs;
        }
        self.duration_secs = self.duration_secs.clamp(0.0, 600.0);
        self.event_capacity = self.event_capacity.clamp(16, 65_536);

        self.arena_width = self.arena_width.clamp(4, 256);
        self.arena_height = self.arena_height.clamp(4, 256);
        if !self.tile_size.is_finite() {
            self.tile_size = 1.0;
        }
        self.tile_size = self.tile_size.clamp(0.25, 8.0);
    }

    /// Checks the presets this config selects.
    pub fn check_presets(&self) -> Result<(), ConfigError> {
        self.player_preset.config().validate()?;
        for spawn in &self.enemies {
            spawn.preset.config().validate()?;
        }
        Ok(())
    }

    /// Seconds per tick.
    #[must_use]
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Number of ticks the run lasts.
    #[must_use]
    pub fn total_ticks(&self) -> u64 {
        (self.duration_secs * self.tick_rate as f32).round() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert_eq!(config.tick_rate, 64);
        assert_eq!(config.enemies.len(), 3);
        assert_eq!(config.total_ticks(), 1280);
        assert!(config.check_presets().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = SimConfig {
            tick_rate: 1,
            duration_secs: f32::NAN,
            arena_width: 1,
            tile_size: 100.0,
            ..SimConfig::default()
        };

        config.validate();

        assert_eq!(config.tick_rate, 10);
        assert_eq!(config.duration_secs, 20.0);
        assert_eq!(config.arena_width, 4);
        assert_eq!(config.tile_size, 8.0);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join(CONFIG_FILE);

        let mut config = SimConfig {
            seed: 99,
            player_preset: PlayerPreset::Free,
            ..SimConfig::default()
        };
        config.enemies.truncate(1);

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = SimConfig::load_from(&config_path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = SimConfig::load_from("/nonexistent/path/skirmish.toml");
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn test_config_load_garbage_falls_back() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join(CONFIG_FILE);
        fs::write(&config_path, "tick_rate = \"fast\"").expect("write");

        assert_eq!(SimConfig::load_from(&config_path), SimConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join(CONFIG_FILE);
        fs::write(
            &config_path,
            "seed = 3\n\n[[enemies]]\npreset = \"Sentinel\"\nposition = [4.0, 4.0]\n",
        )
        .expect("write");

        let config = SimConfig::load_from(&config_path);
        assert_eq!(config.seed, 3);
        assert_eq!(config.tick_rate, 64);
        assert_eq!(config.enemies.len(), 1);
        assert_eq!(config.enemies[0].preset, EnemyPreset::Sentinel);
    }
}
