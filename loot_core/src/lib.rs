//! loot_core - Loot distribution for registered trinket items
//!
//! This library provides:
//! - StructureDetector: Classifies a block neighborhood into a named structure
//! - ChestLedger: Per-region record of placed/opened chests
//! - LootTables: Biome and structure chance tables with conditional merging
//! - ChestLootInjector: Fills natural chests from the merged table
//! - MobDropTable: Per-entity drop chances rolled on death

pub mod config;
pub mod error;
pub mod inject;
pub mod ledger;
pub mod memory;
pub mod mob;
pub mod piston;
pub mod registry;
pub mod structure;
pub mod table;
pub mod types;

// Re-export core types for convenience
pub use config::LootConfig;
pub use error::{HostError, LootError};
pub use inject::{inject_loot, ChestLootInjector, ChestResolution, ChestSite, Container, SlotPools};
pub use ledger::{ChestLedger, LedgerKind, RegionKey, WorldStore};
pub use mob::{DeadEntity, DropCondition, ItemSpawner, MobDrop, MobDropTable};
pub use registry::{BiomeLoot, DropSpec, ItemLoot, LootRegistry, StructureLoot};
pub use structure::{
    BlockCounts, BlockSource, StructureCatalog, StructureDetector, StructureRequirement,
    CHEST_CLUSTER, DEFAULT_STRUCTURE,
};
pub use table::{LootCondition, LootContext, LootEntry, LootTables, MergedLoot};
pub use types::{BlockPos, ItemStack, Vec3, CHEST_BLOCK};
