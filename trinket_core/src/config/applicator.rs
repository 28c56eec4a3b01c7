//! How resolved stats reach the host

use crate::types::StatName;
use serde::{Deserialize, Serialize};

/// A stat pushed into a movement attribute as `value / 100 * coefficient`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementBinding {
    pub stat: StatName,
    pub component: String,
    pub coefficient: f64,
}

impl MovementBinding {
    pub fn new(stat: StatName, component: &str, coefficient: f64) -> Self {
        MovementBinding {
            stat,
            component: component.to_string(),
            coefficient,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicatorConfig {
    #[serde(default = "default_movement")]
    pub movement: Vec<MovementBinding>,
    /// Stats pushed as `minecraft:<stat><value>` trigger events
    #[serde(default = "default_event_stats")]
    pub event_stats: Vec<StatName>,
    #[serde(default = "default_passive_refresh_interval")]
    pub passive_refresh_interval: u64,
    /// Long enough to bridge the refresh gap
    #[serde(default = "default_passive_duration")]
    pub passive_duration: u32,
    #[serde(default = "default_signature_check_interval")]
    pub signature_check_interval: u64,
    #[serde(default = "default_mana_tick_interval")]
    pub mana_tick_interval: u64,
    #[serde(default = "default_mana_bar_frames")]
    pub mana_bar_frames: Vec<String>,
    #[serde(default = "default_action_bar_padding")]
    pub action_bar_padding: String,
}

impl Default for ApplicatorConfig {
    fn default() -> Self {
        ApplicatorConfig {
            movement: default_movement(),
            event_stats: default_event_stats(),
            passive_refresh_interval: default_passive_refresh_interval(),
            passive_duration: default_passive_duration(),
            signature_check_interval: default_signature_check_interval(),
            mana_tick_interval: default_mana_tick_interval(),
            mana_bar_frames: default_mana_bar_frames(),
            action_bar_padding: default_action_bar_padding(),
        }
    }
}

fn default_movement() -> Vec<MovementBinding> {
    vec![
        MovementBinding::new(StatName::Speed, "minecraft:movement", 0.1),
        MovementBinding::new(StatName::WaterSpeed, "minecraft:underwater_movement", 0.02),
        MovementBinding::new(StatName::LavaSpeed, "minecraft:lava_movement", 0.01),
    ]
}
fn default_event_stats() -> Vec<StatName> {
    vec![
        StatName::Health,
        StatName::KnockbackRes,
        StatName::DamageReduction,
    ]
}
fn default_passive_refresh_interval() -> u64 {
    20
}
fn default_passive_duration() -> u32 {
    240
}
fn default_signature_check_interval() -> u64 {
    20
}
fn default_mana_tick_interval() -> u64 {
    4
}

/// Glyphs from the resource pack's private-use range, empty to full
fn default_mana_bar_frames() -> Vec<String> {
    (0..76u32)
        .filter_map(|i| char::from_u32(0xE100 + i))
        .map(String::from)
        .collect()
}
fn default_action_bar_padding() -> String {
    " ".repeat(25)
}
