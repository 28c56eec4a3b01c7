//! ChestLedger - Per-region persisted sets of placed and opened chests
//!
//! Positions are grouped into square regions so that each storage key only
//! holds the chests of one area. A position that is marked in either set is
//! never eligible for loot injection again until the whole ledger is reset.

use crate::error::LootError;
use crate::piston::displaced;
use crate::types::BlockPos;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, warn};

/// Current version of the persisted region format
pub const LEDGER_FORMAT_VERSION: u32 = 1;

/// Per-world key/value storage provided by the host
pub trait WorldStore {
    fn get(&self, key: &str) -> Option<String>;
    /// Store a value, or delete the key when `value` is `None`
    fn set(&mut self, key: &str, value: Option<String>);
    fn keys(&self) -> Vec<String>;
}

/// Which set a position belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerKind {
    /// Placed by a player, never a natural chest
    Placed,
    /// Already resolved once
    Opened,
}

impl LedgerKind {
    pub fn all() -> &'static [LedgerKind] {
        &[LedgerKind::Placed, LedgerKind::Opened]
    }

    /// Storage key prefix for this kind
    pub fn base_key(self) -> &'static str {
        match self {
            LedgerKind::Placed => "trinkets:placed_chests",
            LedgerKind::Opened => "trinkets:opened_chests",
        }
    }
}

/// Grid cell of a position on the horizontal plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionKey {
    pub rx: i32,
    pub rz: i32,
}

impl RegionKey {
    pub fn of(pos: BlockPos, region_size: i32) -> Self {
        RegionKey {
            rx: pos.x.div_euclid(region_size),
            rz: pos.z.div_euclid(region_size),
        }
    }

    /// Full storage key for one kind in this region
    pub fn storage_key(self, kind: LedgerKind) -> String {
        format!("{}:{}", kind.base_key(), self)
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.rx, self.rz)
    }
}

/// Persisted form of one region's position set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub version: u32,
    pub positions: BTreeSet<BlockPos>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Versioned(LedgerEntry),
    /// Version 0: `{"x,y,z": 1, ...}`
    Legacy(BTreeMap<String, serde_json::Value>),
}

impl LedgerEntry {
    fn decode(key: &str, raw: &str) -> Result<Self, LootError> {
        let stored: StoredEntry =
            serde_json::from_str(raw).map_err(|source| LootError::LedgerDecode {
                key: key.to_string(),
                source,
            })?;
        match stored {
            StoredEntry::Versioned(entry) if entry.version <= LEDGER_FORMAT_VERSION => Ok(entry),
            StoredEntry::Versioned(entry) => Err(LootError::UnsupportedVersion {
                key: key.to_string(),
                version: entry.version,
            }),
            StoredEntry::Legacy(map) => Ok(LedgerEntry {
                version: 0,
                positions: map.keys().filter_map(|k| BlockPos::parse(k)).collect(),
            }),
        }
    }

    fn encode(&self) -> String {
        let entry = LedgerEntry {
            version: LEDGER_FORMAT_VERSION,
            positions: self.positions.clone(),
        };
        serde_json::to_string(&entry).unwrap_or_default()
    }
}

/// Region-partitioned record of chests excluded from loot injection
#[derive(Debug, Clone, Copy)]
pub struct ChestLedger {
    region_size: i32,
}

impl ChestLedger {
    pub fn new(region_size: i32) -> Self {
        ChestLedger {
            region_size: region_size.max(1),
        }
    }

    pub fn region_size(&self) -> i32 {
        self.region_size
    }

    /// Load the set of one kind for the region containing `pos`
    pub fn load(
        &self,
        store: &impl WorldStore,
        kind: LedgerKind,
        pos: BlockPos,
    ) -> Result<LedgerEntry, LootError> {
        let key = RegionKey::of(pos, self.region_size).storage_key(kind);
        match store.get(&key) {
            Some(raw) => LedgerEntry::decode(&key, &raw),
            None => Ok(LedgerEntry::default()),
        }
    }

    /// Whether `pos` is in either set. Unreadable entries count as marked.
    pub fn is_marked(&self, store: &impl WorldStore, pos: BlockPos) -> bool {
        LedgerKind::all().iter().any(|&kind| match self.load(store, kind, pos) {
            Ok(entry) => entry.positions.contains(&pos),
            Err(e) => {
                warn!("Treating {pos} as marked: {e}");
                true
            }
        })
    }

    /// A chest is injectable if it was neither placed by a player nor opened
    pub fn is_injectable(&self, store: &impl WorldStore, pos: BlockPos) -> bool {
        !self.is_marked(store, pos)
    }

    /// Add `pos` to the set of `kind`. Marking twice is a no-op.
    pub fn mark(
        &self,
        store: &mut impl WorldStore,
        kind: LedgerKind,
        pos: BlockPos,
    ) -> Result<(), LootError> {
        let mut entry = self.load(store, kind, pos)?;
        if entry.positions.insert(pos) || entry.version < LEDGER_FORMAT_VERSION {
            let key = RegionKey::of(pos, self.region_size).storage_key(kind);
            store.set(&key, Some(entry.encode()));
        }
        Ok(())
    }

    pub fn mark_opened(&self, store: &mut impl WorldStore, pos: BlockPos) -> Result<(), LootError> {
        self.mark(store, LedgerKind::Opened, pos)
    }

    pub fn mark_placed(&self, store: &mut impl WorldStore, pos: BlockPos) -> Result<(), LootError> {
        self.mark(store, LedgerKind::Placed, pos)
    }

    /// Follow blocks moved by a piston: every already-marked position marks
    /// both its origin and its destination as placed.
    pub fn propagate_piston(
        &self,
        store: &mut impl WorldStore,
        attached: &[BlockPos],
        facing: u8,
        extending: bool,
    ) -> Result<usize, LootError> {
        let mut moved = 0;
        for &pos in attached {
            if !self.is_marked(store, pos) {
                continue;
            }
            let dest = displaced(pos, facing, extending);
            self.mark_placed(store, pos)?;
            self.mark_placed(store, dest)?;
            debug!("Ledger mark followed piston from {pos} to {dest}");
            moved += 1;
        }
        Ok(moved)
    }

    /// Delete every stored region of both kinds. Returns the number of keys cleared.
    pub fn reset_all(&self, store: &mut impl WorldStore) -> usize {
        let keys: Vec<String> = store
            .keys()
            .into_iter()
            .filter(|k| {
                LedgerKind::all()
                    .iter()
                    .any(|kind| k.starts_with(kind.base_key()))
            })
            .collect();
        for key in &keys {
            store.set(key, None);
        }
        warn!("All chest tracking data has been reset ({} keys)", keys.len());
        keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[test]
    fn test_region_key_floors_negative() {
        assert_eq!(RegionKey::of(BlockPos::new(-1, 0, 255), 256), RegionKey { rx: -1, rz: 0 });
        assert_eq!(RegionKey::of(BlockPos::new(256, 0, -257), 256), RegionKey { rx: 1, rz: -2 });
    }

    #[test]
    fn test_mark_opened_blocks_injection() {
        let ledger = ChestLedger::new(256);
        let mut store = MemoryStore::default();
        let pos = BlockPos::new(5, 70, -3);
        assert!(ledger.is_injectable(&store, pos));
        ledger.mark_opened(&mut store, pos).unwrap();
        assert!(!ledger.is_injectable(&store, pos));
        assert!(ledger.is_injectable(&store, BlockPos::new(6, 70, -3)));
    }

    #[test]
    fn test_mark_is_idempotent() {
        let ledger = ChestLedger::new(256);
        let mut store = MemoryStore::default();
        let pos = BlockPos::new(1, 2, 3);
        ledger.mark_placed(&mut store, pos).unwrap();
        ledger.mark_placed(&mut store, pos).unwrap();
        let entry = ledger.load(&store, LedgerKind::Placed, pos).unwrap();
        assert_eq!(entry.positions.len(), 1);
    }

    #[test]
    fn test_reset_all_clears_both_kinds() {
        let ledger = ChestLedger::new(16);
        let mut store = MemoryStore::default();
        let a = BlockPos::new(0, 0, 0);
        let b = BlockPos::new(100, 0, 100);
        ledger.mark_opened(&mut store, a).unwrap();
        ledger.mark_placed(&mut store, b).unwrap();
        store.set("trinkets:registered", Some("true".to_string()));

        assert_eq!(ledger.reset_all(&mut store), 2);
        assert!(ledger.is_injectable(&store, a));
        assert!(ledger.is_injectable(&store, b));
        assert!(store.get("trinkets:registered").is_some());
    }

    #[test]
    fn test_legacy_entry_is_read_and_upgraded() {
        let ledger = ChestLedger::new(256);
        let mut store = MemoryStore::default();
        let key = RegionKey::of(BlockPos::new(1, 2, 3), 256).storage_key(LedgerKind::Opened);
        store.set(&key, Some(r#"{"1,2,3":1}"#.to_string()));

        assert!(!ledger.is_injectable(&store, BlockPos::new(1, 2, 3)));

        ledger.mark_opened(&mut store, BlockPos::new(4, 5, 6)).unwrap();
        let raw = store.get(&key).unwrap();
        assert!(raw.contains("\"version\":1"));
        let entry = ledger.load(&store, LedgerKind::Opened, BlockPos::new(1, 2, 3)).unwrap();
        assert_eq!(entry.positions.len(), 2);
    }

    #[test]
    fn test_corrupt_entry_is_treated_as_marked() {
        let ledger = ChestLedger::new(256);
        let mut store = MemoryStore::default();
        let pos = BlockPos::new(0, 0, 0);
        let key = RegionKey::of(pos, 256).storage_key(LedgerKind::Placed);
        store.set(&key, Some("not json".to_string()));
        assert!(!ledger.is_injectable(&store, pos));
        assert!(ledger.mark_placed(&mut store, pos).is_err());
    }

    #[test]
    fn test_future_version_is_rejected() {
        let ledger = ChestLedger::new(256);
        let mut store = MemoryStore::default();
        let pos = BlockPos::new(0, 0, 0);
        let key = RegionKey::of(pos, 256).storage_key(LedgerKind::Opened);
        store.set(&key, Some(r#"{"version":9,"positions":[]}"#.to_string()));
        assert!(matches!(
            ledger.load(&store, LedgerKind::Opened, pos),
            Err(LootError::UnsupportedVersion { version: 9, .. })
        ));
    }

    #[test]
    fn test_piston_propagates_marks() {
        let ledger = ChestLedger::new(256);
        let mut store = MemoryStore::default();
        let marked = BlockPos::new(10, 64, 10);
        let unmarked = BlockPos::new(10, 65, 10);
        ledger.mark_opened(&mut store, marked).unwrap();

        let moved = ledger
            .propagate_piston(&mut store, &[marked, unmarked], 5, true)
            .unwrap();
        assert_eq!(moved, 1);
        assert!(!ledger.is_injectable(&store, BlockPos::new(9, 64, 10)));
        assert!(ledger.is_injectable(&store, BlockPos::new(9, 65, 10)));
        let placed = ledger.load(&store, LedgerKind::Placed, marked).unwrap();
        assert!(placed.positions.contains(&marked));
    }
}
