//! Opposing effects collapse into one net effect

use crate::config::ConflictPair;
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// For each pair, keep only the stronger effect at the difference of the two
/// levels; equal levels cancel out. A pair is left alone unless at least one
/// side is positive.
pub fn resolve_conflicts(levels: &mut BTreeMap<String, i32>, pairs: &[ConflictPair]) {
    for pair in pairs {
        let a = levels.get(&pair.a).copied().unwrap_or(0);
        let b = levels.get(&pair.b).copied().unwrap_or(0);
        if a <= 0 && b <= 0 {
            continue;
        }

        let diff = a.saturating_sub(b);
        match diff.cmp(&0) {
            Ordering::Greater => {
                levels.insert(pair.a.clone(), diff);
                levels.remove(&pair.b);
            }
            Ordering::Less => {
                levels.insert(pair.b.clone(), diff.saturating_neg());
                levels.remove(&pair.a);
            }
            Ordering::Equal => {
                levels.remove(&pair.a);
                levels.remove(&pair.b);
            }
        }
    }
}
