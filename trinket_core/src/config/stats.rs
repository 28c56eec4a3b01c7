//! Stat defaults, bounds and quantization

use crate::types::StatName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How one stat starts and is constrained
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatRule {
    pub default: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Quantization step; results are floored to a multiple of it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

impl StatRule {
    pub const fn new(default: f64) -> Self {
        StatRule {
            default,
            min: None,
            max: None,
            step: None,
        }
    }

    pub const fn bounded(default: f64, min: f64, max: f64, step: f64) -> Self {
        StatRule {
            default,
            min: Some(min),
            max: Some(max),
            step: Some(step),
        }
    }

    /// Clamp, then floor to the step
    pub fn constrain(&self, value: f64) -> f64 {
        let mut value = value;
        if let Some(min) = self.min {
            value = value.max(min);
        }
        if let Some(max) = self.max {
            value = value.min(max);
        }
        if let Some(step) = self.step {
            value = step * (value / step).floor();
        }
        value
    }
}

/// Partial override from a config file; unset fields keep the built-in value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatOverrides(BTreeMap<String, StatOverride>);

/// Rule for every stat. Deserializes as overrides on top of the built-in table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StatOverrides", into = "StatOverrides")]
pub struct StatsConfig {
    rules: BTreeMap<StatName, StatRule>,
}

impl StatsConfig {
    pub fn rule(&self, stat: StatName) -> StatRule {
        self.rules
            .get(&stat)
            .copied()
            .unwrap_or(StatRule::new(0.0))
    }

    pub fn set_rule(&mut self, stat: StatName, rule: StatRule) {
        self.rules.insert(stat, rule);
    }

    pub fn iter(&self) -> impl Iterator<Item = (StatName, StatRule)> + '_ {
        self.rules.iter().map(|(stat, rule)| (*stat, *rule))
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        let mut rules: BTreeMap<StatName, StatRule> = StatName::all()
            .iter()
            .map(|stat| (*stat, StatRule::new(0.0)))
            .collect();

        rules.insert(StatName::Health, StatRule::bounded(20.0, 2.0, 100.0, 2.0));
        rules.insert(StatName::Mana, StatRule::new(100.0));
        rules.insert(StatName::KnockbackRes, StatRule::bounded(0.0, 0.0, 100.0, 1.0));
        rules.insert(
            StatName::DamageReduction,
            StatRule::bounded(0.0, -100.0, 100.0, 1.0),
        );
        rules.insert(StatName::Speed, StatRule::new(100.0));
        rules.insert(StatName::WaterSpeed, StatRule::new(100.0));
        rules.insert(StatName::LavaSpeed, StatRule::new(100.0));
        rules.insert(StatName::ManaRegen, StatRule::new(5.0));
        rules.insert(StatName::CritMulti, StatRule::new(25.0));
        rules.insert(StatName::CritChance, StatRule::new(5.0));

        StatsConfig { rules }
    }
}

impl TryFrom<StatOverrides> for StatsConfig {
    type Error = String;

    fn try_from(overrides: StatOverrides) -> Result<Self, Self::Error> {
        let mut config = StatsConfig::default();
        for (name, patch) in overrides.0 {
            let stat: StatName = name.parse()?;
            let mut rule = config.rule(stat);
            if let Some(default) = patch.default {
                rule.default = default;
            }
            if patch.min.is_some() {
                rule.min = patch.min;
            }
            if patch.max.is_some() {
                rule.max = patch.max;
            }
            if patch.step.is_some() {
                rule.step = patch.step;
            }
            config.set_rule(stat, rule);
        }
        Ok(config)
    }
}

impl From<StatsConfig> for StatOverrides {
    fn from(config: StatsConfig) -> Self {
        StatOverrides(
            config
                .rules
                .into_iter()
                .map(|(stat, rule)| {
                    (
                        stat.as_str().to_string(),
                        StatOverride {
                            default: Some(rule.default),
                            min: rule.min,
                            max: rule.max,
                            step: rule.step,
                        },
                    )
                })
                .collect(),
        )
    }
}

/// Two effects that cancel each other out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictPair {
    pub a: String,
    pub b: String,
}

impl ConflictPair {
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        ConflictPair {
            a: a.into(),
            b: b.into(),
        }
    }
}

pub fn default_conflicts() -> Vec<ConflictPair> {
    vec![
        ConflictPair::new("poison", "regeneration"),
        ConflictPair::new("weakness", "strength"),
        ConflictPair::new("mining_fatigue", "haste"),
        ConflictPair::new("slowness", "speed"),
    ]
}
