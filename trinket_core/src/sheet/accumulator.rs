//! StatAccumulator - Collects contributions before they become a sheet

use crate::config::{ConflictPair, StatsConfig};
use crate::sheet::conflicts::resolve_conflicts;
use crate::sheet::ResolvedStatSheet;
use crate::types::StatName;
use std::collections::{BTreeMap, BTreeSet};

/// Accumulates contributions from every source
///
/// Stats are raw sums until `finalize` clamps and quantizes them; effect
/// levels are raw sums until conflicts are resolved.
#[derive(Debug, Clone, Default)]
pub struct StatAccumulator {
    pub stats: BTreeMap<StatName, f64>,
    pub passives: BTreeMap<String, i32>,
    pub actives: BTreeMap<String, i32>,
    pub immunities: BTreeSet<String>,
}

impl StatAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_stat(&mut self, stat: StatName, delta: f64) {
        *self.stats.entry(stat).or_insert(0.0) += delta;
    }

    pub fn stat(&self, stat: StatName) -> f64 {
        self.stats.get(&stat).copied().unwrap_or(0.0)
    }

    pub fn add_passive(&mut self, effect: &str, level: i32) {
        add_level(&mut self.passives, effect, level);
    }

    pub fn add_active(&mut self, effect: &str, level: i32) {
        add_level(&mut self.actives, effect, level);
    }

    pub fn add_immunity(&mut self, effect: &str) {
        self.immunities.insert(effect.to_string());
    }

    /// Clamp and quantize every configured stat, then collapse opposing effects
    pub fn finalize(mut self, config: &StatsConfig, conflicts: &[ConflictPair]) -> ResolvedStatSheet {
        let stats = config
            .iter()
            .map(|(stat, rule)| (stat, rule.constrain(self.stat(stat))))
            .collect();

        resolve_conflicts(&mut self.passives, conflicts);
        resolve_conflicts(&mut self.actives, conflicts);

        ResolvedStatSheet {
            stats,
            passives: self.passives,
            actives: self.actives,
            immunities: self.immunities,
        }
    }
}

fn add_level(levels: &mut BTreeMap<String, i32>, effect: &str, level: i32) {
    let entry = levels.entry(effect.to_string()).or_insert(0);
    *entry = entry.saturating_add(level);
}
