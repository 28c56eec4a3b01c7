//! Equipped set + registry → resolved sheet

use crate::config::CoreConfig;
use crate::registry::Registry;
use crate::sheet::{ResolvedStatSheet, StatAccumulator};
use crate::source::{DefaultsSource, StatSource, TrinketSource};
use std::collections::BTreeSet;

/// Recompute a sheet from scratch. Duplicate ids count once and input order
/// does not matter; ids without a record contribute nothing.
pub fn resolve<'a, I>(equipped: I, registry: &Registry, config: &CoreConfig) -> ResolvedStatSheet
where
    I: IntoIterator<Item = &'a str>,
{
    let equipped: BTreeSet<&str> = equipped.into_iter().collect();

    let mut sources: Vec<Box<dyn StatSource + '_>> =
        vec![Box::new(DefaultsSource::new(&config.stats))];
    for id in equipped {
        if let Some(record) = registry.get(id) {
            sources.push(Box::new(TrinketSource::new(id, record)));
        }
    }
    sources.sort_by_key(|source| source.priority());

    let mut acc = StatAccumulator::new();
    for source in &sources {
        source.apply(&mut acc);
    }
    acc.finalize(&config.stats, &config.conflicts)
}
