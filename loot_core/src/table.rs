//! Biome and structure loot tables

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Where a chest is being resolved
#[derive(Debug, Clone, Copy)]
pub struct LootContext<'a> {
    pub dimension_id: &'a str,
    pub biome_id: &'a str,
}

/// Hard filter on a structure loot entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LootCondition {
    /// Required dimension id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
    /// Allowed biome ids
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biomes: Option<Vec<String>>,
}

impl LootCondition {
    pub fn passes(&self, ctx: &LootContext<'_>) -> bool {
        if let Some(ref dimension) = self.dimension {
            if dimension != ctx.dimension_id {
                return false;
            }
        }
        if let Some(ref biomes) = self.biomes {
            if !biomes.iter().any(|b| b == ctx.biome_id) {
                return false;
            }
        }
        true
    }
}

/// One item and its chance in a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootEntry {
    pub item: String,
    pub chance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<LootCondition>,
}

impl LootEntry {
    pub fn new(item: impl Into<String>, chance: f64) -> Self {
        LootEntry {
            item: item.into(),
            chance,
            conditions: None,
        }
    }

    pub fn with_conditions(mut self, conditions: LootCondition) -> Self {
        self.conditions = Some(conditions);
        self
    }

    fn passes(&self, ctx: &LootContext<'_>) -> bool {
        self.conditions.as_ref().map_or(true, |c| c.passes(ctx))
    }
}

/// Final item → chance table for one chest, in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergedLoot {
    entries: Vec<(String, f64)>,
}

impl MergedLoot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add to an item's chance, creating it if absent
    pub fn add(&mut self, item: &str, chance: f64) {
        if let Some(entry) = self.entries.iter_mut().find(|(i, _)| i == item) {
            entry.1 += chance;
        } else {
            self.entries.push((item.to_string(), chance));
        }
    }

    pub fn chance(&self, item: &str) -> Option<f64> {
        self.entries.iter().find(|(i, _)| i == item).map(|(_, c)| *c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(i, c)| (i.as_str(), *c))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Biome loot is the base layer; structure loot adds on top when its
/// conditions pass. Chances of the same item are summed.
pub fn merge_tables(
    biome: Option<&[LootEntry]>,
    structure: Option<&[LootEntry]>,
    ctx: &LootContext<'_>,
) -> MergedLoot {
    let mut merged = MergedLoot::new();

    for entry in biome.unwrap_or_default() {
        merged.add(&entry.item, entry.chance);
    }

    for entry in structure.unwrap_or_default() {
        if !entry.passes(ctx) {
            continue;
        }
        merged.add(&entry.item, entry.chance);
    }

    merged
}

/// Registered loot per biome id and per structure id
#[derive(Debug, Clone, Default)]
pub struct LootTables {
    biomes: HashMap<String, Vec<LootEntry>>,
    structures: HashMap<String, Vec<LootEntry>>,
}

impl LootTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge entries into a biome table. Duplicate items keep the higher chance.
    pub fn register_biome_loot(&mut self, biome_id: &str, entries: Vec<LootEntry>) {
        merge_keep_higher(self.biomes.entry(biome_id.to_string()).or_default(), entries);
    }

    /// Merge entries into a structure table. Duplicate items keep the higher chance.
    pub fn register_structure_loot(&mut self, structure_id: &str, entries: Vec<LootEntry>) {
        merge_keep_higher(
            self.structures.entry(structure_id.to_string()).or_default(),
            entries,
        );
    }

    pub fn biome_table(&self, biome_id: &str) -> Option<&[LootEntry]> {
        self.biomes.get(biome_id).map(Vec::as_slice)
    }

    pub fn structure_table(&self, structure_id: &str) -> Option<&[LootEntry]> {
        self.structures.get(structure_id).map(Vec::as_slice)
    }

    /// Build the chest table for a biome/structure pair
    pub fn merge(&self, biome_id: &str, structure_id: &str, dimension_id: &str) -> MergedLoot {
        let ctx = LootContext {
            dimension_id,
            biome_id,
        };
        merge_tables(
            self.biome_table(biome_id),
            self.structure_table(structure_id),
            &ctx,
        )
    }
}

fn merge_keep_higher(existing: &mut Vec<LootEntry>, incoming: Vec<LootEntry>) {
    for entry in incoming {
        match existing.iter_mut().find(|e| e.item == entry.item) {
            Some(prev) if entry.chance > prev.chance => *prev = entry,
            Some(_) => {}
            None => existing.push(entry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overworld_plains() -> LootContext<'static> {
        LootContext {
            dimension_id: "minecraft:overworld",
            biome_id: "minecraft:plains",
        }
    }

    #[test]
    fn test_merge_sums_biome_and_structure() {
        let biome = vec![LootEntry::new("a", 0.2)];
        let structure = vec![LootEntry::new("a", 0.1).with_conditions(LootCondition {
            dimension: Some("minecraft:overworld".to_string()),
            biomes: None,
        })];
        let merged = merge_tables(Some(biome.as_slice()), Some(structure.as_slice()), &overworld_plains());
        assert!((merged.chance("a").unwrap() - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_merge_skips_failed_condition() {
        let biome = vec![LootEntry::new("a", 0.2)];
        let structure = vec![LootEntry::new("a", 0.1).with_conditions(LootCondition {
            dimension: Some("minecraft:the_end".to_string()),
            biomes: None,
        })];
        let merged = merge_tables(Some(biome.as_slice()), Some(structure.as_slice()), &overworld_plains());
        assert!((merged.chance("a").unwrap() - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_biome_allow_list() {
        let cond = LootCondition {
            dimension: None,
            biomes: Some(vec!["minecraft:desert".to_string()]),
        };
        assert!(!cond.passes(&overworld_plains()));
        assert!(cond.passes(&LootContext {
            dimension_id: "minecraft:overworld",
            biome_id: "minecraft:desert",
        }));
    }

    #[test]
    fn test_duplicate_biome_entries_sum() {
        let biome = vec![LootEntry::new("a", 0.2), LootEntry::new("a", 0.05)];
        let merged = merge_tables(Some(biome.as_slice()), None, &overworld_plains());
        assert!((merged.chance("a").unwrap() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_empty_merge() {
        let merged = merge_tables(None, None, &overworld_plains());
        assert!(merged.is_empty());
    }

    #[test]
    fn test_registration_keeps_higher_chance() {
        let mut tables = LootTables::new();
        tables.register_structure_loot("bastion", vec![LootEntry::new("helmet", 0.12)]);
        tables.register_structure_loot("bastion", vec![LootEntry::new("helmet", 0.30)]);
        tables.register_structure_loot("bastion", vec![LootEntry::new("helmet", 0.20)]);
        tables.register_structure_loot("bastion", vec![LootEntry::new("heart", 0.15)]);

        let table = tables.structure_table("bastion").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].item, "helmet");
        assert!((table[0].chance - 0.30).abs() < 1e-9);
    }

    #[test]
    fn test_tables_merge_by_ids() {
        let mut tables = LootTables::new();
        tables.register_biome_loot("minecraft:ocean", vec![LootEntry::new("helmet", 0.15)]);
        tables.register_structure_loot("default", vec![LootEntry::new("orb", 0.05)]);

        let merged = tables.merge("minecraft:ocean", "default", "minecraft:overworld");
        assert_eq!(merged.len(), 2);
        let merged = tables.merge("minecraft:desert", "bastion", "minecraft:overworld");
        assert!(merged.is_empty());
    }
}
