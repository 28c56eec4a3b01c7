//! Tunable loot constants

use serde::{Deserialize, Serialize};

/// Loot engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootConfig {
    /// Edge length of a ledger region in blocks
    #[serde(default = "default_region_size")]
    pub region_size: i32,
    /// Half-size of the cube scanned around a chest
    #[serde(default = "default_scan_radius")]
    pub scan_radius: i32,
    /// Chest count at which a neighborhood is a chest cluster
    #[serde(default = "default_chest_cluster_threshold")]
    pub chest_cluster_threshold: u32,
    /// Vanilla items that injected loot may overwrite
    #[serde(default = "default_replaceable_items")]
    pub replaceable_items: Vec<String>,
    /// Drop chance used when a registration omits it
    #[serde(default = "default_drop_chance")]
    pub default_drop_chance: f64,
    /// Drop amount used when a registration omits it
    #[serde(default = "default_drop_amount")]
    pub default_drop_amount: u32,
}

impl Default for LootConfig {
    fn default() -> Self {
        LootConfig {
            region_size: default_region_size(),
            scan_radius: default_scan_radius(),
            chest_cluster_threshold: default_chest_cluster_threshold(),
            replaceable_items: default_replaceable_items(),
            default_drop_chance: default_drop_chance(),
            default_drop_amount: default_drop_amount(),
        }
    }
}

fn default_region_size() -> i32 {
    256
}
fn default_scan_radius() -> i32 {
    6
}
fn default_chest_cluster_threshold() -> u32 {
    6
}
fn default_replaceable_items() -> Vec<String> {
    [
        "minecraft:rotten_flesh",
        "minecraft:bone",
        "minecraft:string",
        "minecraft:gunpowder",
        "minecraft:gold_nugget",
        "minecraft:iron_nugget",
        "minecraft:coal",
        "minecraft:bread",
        "minecraft:wheat",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_drop_chance() -> f64 {
    0.10
}
fn default_drop_amount() -> u32 {
    1
}
