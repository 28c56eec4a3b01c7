//! TrinketSource - Contributions of one equipped item

use crate::registry::ContributionRecord;
use crate::sheet::StatAccumulator;
use crate::source::StatSource;

/// An equipped item and its registered record
pub struct TrinketSource<'a> {
    pub item_id: &'a str,
    pub record: &'a ContributionRecord,
}

impl<'a> TrinketSource<'a> {
    pub fn new(item_id: &'a str, record: &'a ContributionRecord) -> Self {
        TrinketSource { item_id, record }
    }
}

impl StatSource for TrinketSource<'_> {
    fn id(&self) -> &str {
        self.item_id
    }

    fn apply(&self, acc: &mut StatAccumulator) {
        for (stat, delta) in self.record.stat_deltas() {
            acc.add_stat(stat, delta);
        }
        for (effect, level) in &self.record.passives {
            acc.add_passive(effect, *level);
        }
        for (effect, level) in &self.record.actives {
            acc.add_active(effect, *level);
        }
        for immunity in &self.record.immunities {
            acc.add_immunity(immunity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{StatName, TrinketSlot};

    #[test]
    fn test_trinket_contributions() {
        let record = ContributionRecord::trinket(TrinketSlot::Ring)
            .with_stat(StatName::Attack, 3.0)
            .with_passive("speed", 1)
            .with_active("poison", 2)
            .with_immunity("minecraft:wither");
        let source = TrinketSource::new("trinkets:ring", &record);
        let mut acc = StatAccumulator::new();
        source.apply(&mut acc);
        source.apply(&mut acc);

        assert!((acc.stat(StatName::Attack) - 6.0).abs() < 0.01);
        assert_eq!(acc.passives["speed"], 2);
        assert_eq!(acc.actives["poison"], 4);
        assert_eq!(acc.immunities.len(), 1);
        assert_eq!(source.id(), "trinkets:ring");
        assert_eq!(source.priority(), 0);
    }
}
