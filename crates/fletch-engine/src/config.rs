//! Host configuration.
//!
//! Provides the tick clock, the scripted archer, the practice range layout and
//! the archery tuning in one TOML file. A missing or broken file falls back to
//! defaults so the host always starts.

use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use fletch_common::{ConfigError, FletchResult};
use fletch_gameplay::ArcheryConfig;

/// Configuration file name.
pub const CONFIG_FILE: &str = "fletch.toml";

/// How the scripted archer shoots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptedArcherConfig {
    /// Where the bow is held
    pub bow_position: Vec3,
    /// Half the distance between the string anchors
    pub string_half_length: f32,
    /// Ticks spent pulling from the nock to the target strength
    pub draw_ticks: u32,
    /// Ticks held at the target strength before letting go
    pub hold_ticks: u32,
    /// Ticks between a release and the next nock
    pub rest_ticks: u32,
    /// Strength to draw to and hold when letting go
    pub target_strength: f32,
    /// Aim on the high ballistic arc instead of the flat one
    pub prefer_high_arc: bool,
}

impl Default for ScriptedArcherConfig {
    fn default() -> Self {
        Self {
            bow_position: Vec3::new(0.0, 1.5, 0.0),
            string_half_length: 0.7,
            draw_ticks: 30,
            hold_ticks: 10,
            rest_ticks: 20,
            target_strength: 1.0,
            prefer_high_arc: false,
        }
    }
}

/// A walking enemy on the range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemySpec {
    /// Starting position
    pub position: Vec3,
    /// Walking velocity
    pub velocity: Vec3,
    /// Starting health
    pub max_health: i32,
    /// Hit sphere radius
    pub radius: f32,
}

impl Default for EnemySpec {
    fn default() -> Self {
        Self {
            position: Vec3::new(3.0, 1.0, 20.0),
            velocity: Vec3::ZERO,
            max_health: 20,
            radius: 0.5,
        }
    }
}

/// A fixed target on the range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetSpec {
    /// Centre of the target
    pub position: Vec3,
    /// Starting health
    pub max_health: i32,
    /// Hit sphere radius
    pub radius: f32,
}

impl Default for TargetSpec {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.5, 15.0),
            max_health: 30,
            radius: 0.6,
        }
    }
}

/// Everything standing on the practice range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangeLayout {
    /// Fixed targets, registered first
    pub targets: Vec<TargetSpec>,
    /// Enemies, registered after the targets
    pub enemies: Vec<EnemySpec>,
}

impl Default for RangeLayout {
    fn default() -> Self {
        Self {
            targets: vec![
                TargetSpec::default(),
                TargetSpec {
                    position: Vec3::new(-4.0, 1.5, 25.0),
                    ..TargetSpec::default()
                },
            ],
            enemies: vec![
                EnemySpec::default(),
                EnemySpec {
                    position: Vec3::new(5.0, 1.0, 30.0),
                    velocity: Vec3::new(0.0, 0.0, -0.5),
                    ..EnemySpec::default()
                },
            ],
        }
    }
}

impl RangeLayout {
    /// Rejects entities that cannot stand on the range.
    pub fn check(&self) -> Result<(), ConfigError> {
        for target in &self.targets {
            check_entity("range.targets", target.position, target.max_health)?;
        }
        for enemy in &self.enemies {
            check_entity("range.enemies", enemy.position, enemy.max_health)?;
            if !enemy.velocity.is_finite() {
                return Err(ConfigError::Invalid {
                    field: "range.enemies",
                    reason: format!("velocity {} is not finite", enemy.velocity),
                });
            }
        }
        Ok(())
    }
}

fn check_entity(field: &'static str, position: Vec3, max_health: i32) -> Result<(), ConfigError> {
    if !position.is_finite() {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("position {position} is not finite"),
        });
    }
    if max_health <= 0 {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("max_health {max_health} must be positive"),
        });
    }
    Ok(())
}

/// Host configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Seconds to simulate
    pub duration_secs: f32,
    /// Scripted archer
    pub archer: ScriptedArcherConfig,
    /// Practice range
    pub range: RangeLayout,
    /// Archery tuning
    pub archery: ArcheryConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            duration_secs: 30.0,
            archer: ScriptedArcherConfig::default(),
            range: RangeLayout::default(),
            archery: ArcheryConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a specific path.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Self::default();
        }

        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read config file: {e}");
                return Self::default();
            },
        };

        match Self::from_toml(&contents) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            },
            Err(e) => {
                warn!("{e}, using defaults");
                Self::default()
            },
        }
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> FletchResult<()> {
        let path = path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        fs::write(path, contents)?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Seconds per tick.
    #[must_use]
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Number of ticks covering `duration_secs`.
    #[must_use]
    pub fn total_ticks(&self) -> u64 {
        (f64::from(self.duration_secs) * f64::from(self.tick_rate)).ceil() as u64
    }

    /// Validate and clamp configuration values.
    pub fn validate(&mut self) {
        self.tick_rate = self.tick_rate.clamp(10, 1000);
        if !self.duration_secs.is_finite() || self.duration_secs < 0.0 {
            warn!(value = self.duration_secs, "invalid duration, using zero");
            self.duration_secs = 0.0;
        }

        let archer = &mut self.archer;
        archer.string_half_length = archer.string_half_length.max(0.05);
        archer.draw_ticks = archer.draw_ticks.max(1);
        archer.target_strength = archer.target_strength.clamp(0.0, 1.0);

        for target in &mut self.range.targets {
            target.radius = target.radius.max(0.01);
        }
        for enemy in &mut self.range.enemies {
            enemy.radius = enemy.radius.max(0.01);
        }

        self.archery.validate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fletch_gameplay::SensingMode;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.tick_rate, 60);
        assert_eq!(config.archer.draw_ticks, 30);
        assert_eq!(config.range.targets.len(), 2);
        assert_eq!(config.range.enemies.len(), 2);
        assert_eq!(config.total_ticks(), 1800);
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();

        // Set invalid values
        config.tick_rate = 0;
        config.duration_secs = -5.0;
        config.archer.draw_ticks = 0;
        config.archer.target_strength = 3.0;
        config.archery.sensing.touch_radius = 0.5;

        config.validate();

        // Should be clamped
        assert_eq!(config.tick_rate, 10);
        assert_eq!(config.duration_secs, 0.0);
        assert_eq!(config.archer.draw_ticks, 1);
        assert_eq!(config.archer.target_strength, 1.0);
        assert_eq!(config.archery.sensing.release_hysteresis_radius, 0.5);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("fletch.toml");

        let mut config = EngineConfig::default();
        config.tick_rate = 90;
        config.archer.target_strength = 0.5;
        config.archery.sensing.mode = SensingMode::Ambient;
        config.range.enemies.clear();

        config.save_to(&config_path).expect("Failed to save config");

        let loaded = EngineConfig::load_from(&config_path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_load_missing_file() {
        let config = EngineConfig::load_from("/nonexistent/path/fletch.toml");
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_config_load_broken_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join(CONFIG_FILE);
        fs::write(&config_path, "tick_rate = \"fast\"").expect("Failed to write config");

        let config = EngineConfig::load_from(&config_path);
        assert_eq!(config.tick_rate, 60);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml(
            r#"
            duration_secs = 5.0

            [[range.targets]]
            position = [0.0, 1.5, 10.0]
            "#,
        )
        .expect("parse partial config");

        assert_eq!(config.duration_secs, 5.0);
        assert_eq!(config.range.targets.len(), 1);
        assert_eq!(config.range.targets[0].max_health, 30);
        assert_eq!(config.range.enemies, RangeLayout::default().enemies);
        assert_eq!(config.archery, ArcheryConfig::default());
    }

    #[test]
    fn test_range_check_rejects_unplaceable_entities() {
        assert!(RangeLayout::default().check().is_ok());

        let mut layout = RangeLayout::default();
        layout.targets[1].max_health = 0;
        let err = layout.check().expect_err("dead on arrival");
        assert!(matches!(err, ConfigError::Invalid { field: "range.targets", .. }));

        let mut layout = RangeLayout::default();
        layout.enemies[0].velocity = Vec3::new(0.0, f32::NAN, 0.0);
        let err = layout.check().expect_err("walks nowhere");
        assert!(matches!(err, ConfigError::Invalid { field: "range.enemies", .. }));
        assert!(err.to_string().contains("velocity"));
    }

    #[test]
    fn test_config_toml_serialization() {
        let config = EngineConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("Failed to serialize");

        assert!(toml_str.contains("tick_rate"));
        assert!(toml_str.contains("max_pull_distance"));
        assert!(toml_str.contains("[[range.enemies]]"));
    }
}
