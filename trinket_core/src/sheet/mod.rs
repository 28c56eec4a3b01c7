//! Resolved stat sheet and the pipeline that builds it

mod accumulator;
mod conflicts;
mod resolver;

pub use accumulator::StatAccumulator;
pub use conflicts::resolve_conflicts;
pub use resolver::resolve;

use crate::types::{canonical_effect_name, StatName};
use std::collections::{BTreeMap, BTreeSet};

/// A player's effective stats, recomputed in full on every equipment change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedStatSheet {
    /// Clamped and quantized value of every configured stat
    pub stats: BTreeMap<StatName, f64>,
    /// Effect levels continuously applied to the holder
    pub passives: BTreeMap<String, i32>,
    /// Effect levels applied to hit targets
    pub actives: BTreeMap<String, i32>,
    /// Canonical names of blocked effects
    pub immunities: BTreeSet<String>,
}

impl ResolvedStatSheet {
    pub fn stat(&self, stat: StatName) -> f64 {
        self.stats.get(&stat).copied().unwrap_or(0.0)
    }

    /// Stat as the integer used in trigger event names
    pub fn stat_int(&self, stat: StatName) -> i64 {
        self.stat(stat).round() as i64
    }

    pub fn is_immune(&self, effect_id: &str) -> bool {
        self.immunities.contains(&canonical_effect_name(effect_id))
    }
}
