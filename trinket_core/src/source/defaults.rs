//! DefaultsSource - Configured starting value of every stat

use crate::config::StatsConfig;
use crate::sheet::StatAccumulator;
use crate::source::StatSource;

/// Seeds each stat with its configured default
pub struct DefaultsSource<'a> {
    pub config: &'a StatsConfig,
}

impl<'a> DefaultsSource<'a> {
    pub fn new(config: &'a StatsConfig) -> Self {
        DefaultsSource { config }
    }
}

impl StatSource for DefaultsSource<'_> {
    fn id(&self) -> &str {
        "defaults"
    }

    fn priority(&self) -> i32 {
        -100 // Defaults apply first
    }

    fn apply(&self, acc: &mut StatAccumulator) {
        for (stat, rule) in self.config.iter() {
            acc.add_stat(stat, rule.default);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StatName;

    #[test]
    fn test_defaults_seed_every_stat() {
        let config = StatsConfig::default();
        let source = DefaultsSource::new(&config);
        let mut acc = StatAccumulator::new();
        source.apply(&mut acc);

        assert!((acc.stat(StatName::Health) - 20.0).abs() < 0.01);
        assert!((acc.stat(StatName::CritMulti) - 25.0).abs() < 0.01);
        assert!(acc.stat(StatName::Thorns).abs() < 0.01);
        assert_eq!(source.priority(), -100);
    }
}
