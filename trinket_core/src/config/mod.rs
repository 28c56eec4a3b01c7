//! Configuration loading from TOML files

mod applicator;
mod stats;
mod trinkets;

pub use applicator::{ApplicatorConfig, MovementBinding};
pub use stats::{default_conflicts, ConflictPair, StatOverride, StatRule, StatsConfig};
pub use trinkets::{HandshakeConfig, TrinketConfig};

use loot_core::LootConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration loading error
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
}

/// Load a TOML file and deserialize it
pub fn load_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Load a TOML string and deserialize it
pub fn parse_toml<T: serde::de::DeserializeOwned>(content: &str) -> Result<T, ConfigError> {
    let config: T = toml::from_str(content)?;
    Ok(config)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Every tunable of the stat and loot engines. An empty file yields the
/// built-in behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    #[serde(default)]
    pub stats: StatsConfig,
    #[serde(default = "default_conflicts")]
    pub conflicts: Vec<ConflictPair>,
    #[serde(default)]
    pub applicator: ApplicatorConfig,
    #[serde(default)]
    pub trinkets: TrinketConfig,
    #[serde(default)]
    pub loot: LootConfig,
    #[serde(default)]
    pub handshake: HandshakeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        CoreConfig {
            stats: StatsConfig::default(),
            conflicts: default_conflicts(),
            applicator: ApplicatorConfig::default(),
            trinkets: TrinketConfig::default(),
            loot: LootConfig::default(),
            handshake: HandshakeConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl CoreConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config: CoreConfig = load_toml(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: CoreConfig = parse_toml(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engines cannot honor
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (stat, rule) in self.stats.iter() {
            if let (Some(min), Some(max)) = (rule.min, rule.max) {
                if min > max {
                    return Err(ConfigError::ValidationError(format!(
                        "stat {stat}: min {min} exceeds max {max}"
                    )));
                }
            }
            if let Some(step) = rule.step {
                if step <= 0.0 || !step.is_finite() {
                    return Err(ConfigError::ValidationError(format!(
                        "stat {stat}: step must be positive, got {step}"
                    )));
                }
                // Flooring a bound that is off the step grid would leave the range
                for bound in [rule.min, rule.max].into_iter().flatten() {
                    if ((bound / step).round() * step - bound).abs() > 1e-9 {
                        return Err(ConfigError::ValidationError(format!(
                            "stat {stat}: bound {bound} is not a multiple of step {step}"
                        )));
                    }
                }
            }
        }

        for pair in &self.conflicts {
            if pair.a == pair.b {
                return Err(ConfigError::ValidationError(format!(
                    "conflict pair '{}' names the same effect twice",
                    pair.a
                )));
            }
        }

        let intervals = [
            ("passive_refresh_interval", self.applicator.passive_refresh_interval),
            ("signature_check_interval", self.applicator.signature_check_interval),
            ("mana_tick_interval", self.applicator.mana_tick_interval),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!(
                    "applicator.{name} must be at least 1"
                )));
            }
        }
        if self.applicator.mana_bar_frames.is_empty() {
            return Err(ConfigError::ValidationError(
                "applicator.mana_bar_frames must not be empty".to_string(),
            ));
        }

        if self.loot.region_size <= 0 {
            return Err(ConfigError::ValidationError(format!(
                "loot.region_size must be positive, got {}",
                self.loot.region_size
            )));
        }
        if self.loot.scan_radius < 0 {
            return Err(ConfigError::ValidationError(format!(
                "loot.scan_radius must not be negative, got {}",
                self.loot.scan_radius
            )));
        }
        if !(0.0..=1.0).contains(&self.loot.default_drop_chance) {
            return Err(ConfigError::ValidationError(format!(
                "loot.default_drop_chance {} outside [0, 1]",
                self.loot.default_drop_chance
            )));
        }

        Ok(())
    }
}
