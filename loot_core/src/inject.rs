//! Chest loot injection

use crate::config::LootConfig;
use crate::ledger::{ChestLedger, WorldStore};
use crate::structure::{BlockSource, StructureCatalog, StructureDetector};
use crate::table::{LootTables, MergedLoot};
use crate::types::{roll_chance, BlockPos, ItemStack};
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Slot access on a container block or entity
pub trait Container {
    fn size(&self) -> usize;
    fn item(&self, slot: usize) -> Option<&ItemStack>;
    /// Replace a slot's content; `None` clears it
    fn set_item(&mut self, slot: usize, item: Option<ItemStack>);

    fn is_empty_slot(&self, slot: usize) -> bool {
        self.item(slot).is_none()
    }

    /// Index of the first empty slot
    fn first_empty(&self) -> Option<usize> {
        (0..self.size()).find(|&i| self.is_empty_slot(i))
    }
}

/// Slots available to one injection pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotPools {
    pub empty: Vec<usize>,
    pub replaceable: Vec<usize>,
}

impl SlotPools {
    /// Partition a container's slots into empty and replaceable
    pub fn from_container(
        container: &(impl Container + ?Sized),
        replaceable: &HashSet<String>,
    ) -> Self {
        let mut pools = SlotPools::default();
        for slot in 0..container.size() {
            match container.item(slot) {
                None => pools.empty.push(slot),
                Some(item) if replaceable.contains(&item.type_id) => pools.replaceable.push(slot),
                Some(_) => {}
            }
        }
        pools
    }

    /// Take a random slot, preferring empty ones. `None` once both pools are drained.
    pub fn take<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<usize> {
        let pool = if !self.empty.is_empty() {
            &mut self.empty
        } else if !self.replaceable.is_empty() {
            &mut self.replaceable
        } else {
            return None;
        };
        let index = rng.gen_range(0..pool.len());
        Some(pool.swap_remove(index))
    }

    pub fn remaining(&self) -> usize {
        self.empty.len() + self.replaceable.len()
    }
}

/// Roll every merged entry and place winners into distinct slots.
/// Returns the `(slot, item)` placements made.
pub fn inject_loot<R: Rng + ?Sized>(
    container: &mut (impl Container + ?Sized),
    loot: &MergedLoot,
    replaceable: &HashSet<String>,
    rng: &mut R,
) -> Vec<(usize, String)> {
    let mut placements = Vec::new();
    if loot.is_empty() {
        return placements;
    }

    let mut pools = SlotPools::from_container(container, replaceable);

    for (item, chance) in loot.iter() {
        if !roll_chance(rng, chance) {
            continue;
        }
        let Some(slot) = pools.take(rng) else {
            break;
        };
        container.set_item(slot, Some(ItemStack::single(item)));
        placements.push((slot, item.to_string()));
    }

    placements
}

/// The chest being resolved and where it sits
#[derive(Debug, Clone, Copy)]
pub struct ChestSite<'a> {
    pub pos: BlockPos,
    pub dimension_id: &'a str,
    pub biome_id: &'a str,
}

/// Outcome of one chest resolution
#[derive(Debug, Clone, PartialEq)]
pub enum ChestResolution {
    /// Player-placed or already opened
    Skipped,
    Resolved {
        structure: String,
        placements: Vec<(usize, String)>,
    },
}

/// Single entry point for chest loot: gate, detect, merge, mark, inject
#[derive(Debug, Clone)]
pub struct ChestLootInjector {
    ledger: ChestLedger,
    scan_radius: i32,
    chest_cluster_threshold: u32,
    replaceable: HashSet<String>,
}

impl ChestLootInjector {
    pub fn new(config: &LootConfig) -> Self {
        ChestLootInjector {
            ledger: ChestLedger::new(config.region_size),
            scan_radius: config.scan_radius,
            chest_cluster_threshold: config.chest_cluster_threshold,
            replaceable: config.replaceable_items.iter().cloned().collect(),
        }
    }

    pub fn ledger(&self) -> &ChestLedger {
        &self.ledger
    }

    /// Resolve a chest once. The chest is marked opened whether or not any
    /// loot ends up in it.
    #[allow(clippy::too_many_arguments)]
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        site: ChestSite<'_>,
        tables: &LootTables,
        catalog: &StructureCatalog,
        blocks: &(impl BlockSource + ?Sized),
        store: &mut impl WorldStore,
        container: Option<&mut dyn Container>,
        rng: &mut R,
    ) -> ChestResolution {
        if !self.ledger.is_injectable(&*store, site.pos) {
            return ChestResolution::Skipped;
        }

        let detector = StructureDetector::new(catalog, self.scan_radius, self.chest_cluster_threshold);
        let structure = detector.detect(blocks, site.pos);
        let merged = tables.merge(site.biome_id, &structure, site.dimension_id);

        if let Err(e) = self.ledger.mark_opened(store, site.pos) {
            warn!("Could not mark chest {} as opened: {e}", site.pos);
        }

        let placements = match container {
            Some(container) if !merged.is_empty() => {
                inject_loot(container, &merged, &self.replaceable, rng)
            }
            _ => Vec::new(),
        };

        debug!(
            "Resolved chest at {} (biome {}, structure {}): {} placements",
            site.pos,
            site.biome_id,
            structure,
            placements.len()
        );

        ChestResolution::Resolved {
            structure,
            placements,
        }
    }
}
