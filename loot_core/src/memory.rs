//! In-memory host adapters for tests and offline simulation

use crate::error::HostError;
use crate::inject::Container;
use crate::ledger::WorldStore;
use crate::mob::ItemSpawner;
use crate::structure::BlockSource;
use crate::types::{BlockPos, ItemStack, Vec3};
use std::collections::{BTreeMap, HashMap};

/// Key/value world storage backed by a map
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl WorldStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Option<String>) {
        match value {
            Some(v) => {
                self.values.insert(key.to_string(), v);
            }
            None => {
                self.values.remove(key);
            }
        }
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

/// Fixed-size container
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryContainer {
    slots: Vec<Option<ItemStack>>,
}

impl MemoryContainer {
    pub fn new(size: usize) -> Self {
        MemoryContainer {
            slots: vec![None; size],
        }
    }

    /// Builder-style slot fill
    pub fn with_item(mut self, slot: usize, item: ItemStack) -> Self {
        self.set_item(slot, Some(item));
        self
    }

    pub fn items(&self) -> impl Iterator<Item = (usize, &ItemStack)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|item| (i, item)))
    }
}

impl Container for MemoryContainer {
    fn size(&self) -> usize {
        self.slots.len()
    }

    fn item(&self, slot: usize) -> Option<&ItemStack> {
        self.slots.get(slot).and_then(|s| s.as_ref())
    }

    fn set_item(&mut self, slot: usize, item: Option<ItemStack>) {
        if let Some(s) = self.slots.get_mut(slot) {
            *s = item;
        }
    }
}

/// Sparse block grid; unset positions read as air
#[derive(Debug, Clone, Default)]
pub struct GridBlocks {
    blocks: HashMap<BlockPos, String>,
}

impl GridBlocks {
    pub fn set(&mut self, pos: BlockPos, block_id: impl Into<String>) {
        self.blocks.insert(pos, block_id.into());
    }

    /// Place `count` copies of a block along +x starting at `start`
    pub fn fill_row(&mut self, start: BlockPos, block_id: &str, count: i32) {
        for i in 0..count {
            self.set(start.offset((1, 0, 0), i), block_id);
        }
    }
}

impl BlockSource for GridBlocks {
    fn block_type(&self, pos: BlockPos) -> Option<&str> {
        Some(
            self.blocks
                .get(&pos)
                .map(String::as_str)
                .unwrap_or("minecraft:air"),
        )
    }
}

/// Records spawned items; dimensions listed in `unloaded` reject spawns
#[derive(Debug, Clone, Default)]
pub struct MemorySpawner {
    pub spawned: Vec<(String, Vec3, ItemStack)>,
    pub unloaded: Vec<String>,
}

impl ItemSpawner for MemorySpawner {
    fn spawn_item(&mut self, dimension: &str, at: Vec3, item: ItemStack) -> Result<(), HostError> {
        if self.unloaded.iter().any(|d| d == dimension) {
            return Err(HostError::Unloaded);
        }
        self.spawned.push((dimension.to_string(), at, item));
        Ok(())
    }
}
