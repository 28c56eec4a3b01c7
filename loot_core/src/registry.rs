//! Loot contributions carried by item registrations

use crate::config::LootConfig;
use crate::error::LootError;
use crate::mob::{DropCondition, MobDrop, MobDropTable};
use crate::structure::{StructureCatalog, StructureRequirement};
use crate::table::{LootCondition, LootEntry, LootTables};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomeLoot {
    pub biome: String,
    pub chance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureLoot {
    pub structure: String,
    pub chance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<LootCondition>,
}

/// The `loot` block of a registration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemLoot {
    #[serde(default)]
    pub biomes: Vec<BiomeLoot>,
    #[serde(default)]
    pub structures: Vec<StructureLoot>,
}

impl ItemLoot {
    pub fn is_empty(&self) -> bool {
        self.biomes.is_empty() && self.structures.is_empty()
    }
}

/// One entry of a registration's `drops` list. Missing fields take the
/// configured defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropSpec {
    pub entity: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<DropCondition>,
}

fn validate_loot(item: &str, loot: &ItemLoot) -> Result<(), LootError> {
    for entry in &loot.biomes {
        check_chance(item, entry.chance)?;
    }
    for entry in &loot.structures {
        check_chance(item, entry.chance)?;
    }
    Ok(())
}

fn check_chance(item: &str, chance: f64) -> Result<(), LootError> {
    if !(0.0..=1.0).contains(&chance) {
        return Err(LootError::InvalidEntry {
            item: item.to_string(),
            reason: format!("chance {chance} outside [0, 1]"),
        });
    }
    Ok(())
}

/// All loot state fed by registrations: chest tables, mob drops and the
/// structure catalog used to pick structure tables.
#[derive(Debug, Clone)]
pub struct LootRegistry {
    pub tables: LootTables,
    pub mob_drops: MobDropTable,
    pub structures: StructureCatalog,
    default_drop_chance: f64,
    default_drop_amount: u32,
}

impl LootRegistry {
    pub fn new(config: &LootConfig) -> Self {
        LootRegistry {
            tables: LootTables::new(),
            mob_drops: MobDropTable::new(),
            structures: StructureCatalog::with_defaults(),
            default_drop_chance: config.default_drop_chance,
            default_drop_amount: config.default_drop_amount,
        }
    }

    /// Check an item's loot and drops without touching any table
    pub fn validate_item(
        &self,
        item_id: &str,
        loot: Option<&ItemLoot>,
        drops: &[DropSpec],
    ) -> Result<(), LootError> {
        if let Some(loot) = loot {
            validate_loot(item_id, loot)?;
        }
        self.resolve_drops(item_id, drops).map(|_| ())
    }

    /// Register an item's chest loot. Every entry is validated before any is
    /// applied, so a bad entry leaves the tables untouched.
    pub fn register_item_loot(&mut self, item_id: &str, loot: &ItemLoot) -> Result<(), LootError> {
        validate_loot(item_id, loot)?;

        for entry in &loot.biomes {
            self.tables
                .register_biome_loot(&entry.biome, vec![LootEntry::new(item_id, entry.chance)]);
        }
        for entry in &loot.structures {
            let mut table_entry = LootEntry::new(item_id, entry.chance);
            table_entry.conditions = entry.conditions.clone();
            self.tables
                .register_structure_loot(&entry.structure, vec![table_entry]);
        }

        debug!(
            "Registered loot for {item_id}: {} biome, {} structure entries",
            loot.biomes.len(),
            loot.structures.len()
        );
        Ok(())
    }

    /// Register an item's mob drops, filling in default chance and amount
    pub fn register_item_drops(&mut self, item_id: &str, drops: &[DropSpec]) -> Result<(), LootError> {
        for (entity, drop) in self.resolve_drops(item_id, drops)? {
            self.mob_drops.register(&entity, drop);
        }
        Ok(())
    }

    fn resolve_drops(&self, item_id: &str, drops: &[DropSpec]) -> Result<Vec<(String, MobDrop)>, LootError> {
        let mut resolved = Vec::with_capacity(drops.len());
        for spec in drops {
            let chance = spec.chance.unwrap_or(self.default_drop_chance);
            check_chance(item_id, chance)?;
            let amount = spec.amount.unwrap_or(self.default_drop_amount);
            if amount == 0 {
                return Err(LootError::InvalidEntry {
                    item: item_id.to_string(),
                    reason: format!("zero drop amount for {}", spec.entity),
                });
            }
            resolved.push((
                spec.entity.clone(),
                MobDrop {
                    item: item_id.to_string(),
                    amount,
                    chance,
                    conditions: spec.conditions.clone(),
                },
            ));
        }
        Ok(resolved)
    }

    /// Add a structure definition after the existing ones. Duplicate ids are ignored.
    pub fn register_structure(&mut self, id: &str, requirement: StructureRequirement) -> bool {
        self.structures.register(id, requirement)
    }
}

impl Default for LootRegistry {
    fn default() -> Self {
        Self::new(&LootConfig::default())
    }
}
