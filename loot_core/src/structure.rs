//! Structure detection from a single block scan

use crate::types::{BlockPos, CHEST_BLOCK};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Id returned when the neighborhood holds enough chests
pub const CHEST_CLUSTER: &str = "chest_cluster";

/// Id returned when no definition matches
pub const DEFAULT_STRUCTURE: &str = "default";

/// Read access to block types in a dimension
pub trait BlockSource {
    /// Block type id at `pos`, or `None` when the position is unloaded
    fn block_type(&self, pos: BlockPos) -> Option<&str>;
}

/// What a structure needs to be recognized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StructureRequirement {
    /// Every listed block appears at least once
    Exists { blocks: Vec<String> },
    /// Every listed block meets its minimum count
    MinCounts { counts: BTreeMap<String, u32> },
}

impl StructureRequirement {
    pub fn exists<I, S>(blocks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StructureRequirement::Exists {
            blocks: blocks.into_iter().map(Into::into).collect(),
        }
    }

    pub fn min_counts<I, S>(counts: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        StructureRequirement::MinCounts {
            counts: counts.into_iter().map(|(b, n)| (b.into(), n)).collect(),
        }
    }

    /// Check the requirement against a scan result
    pub fn is_satisfied(&self, counts: &BlockCounts) -> bool {
        match self {
            StructureRequirement::Exists { blocks } => blocks.iter().all(|b| counts.contains(b)),
            StructureRequirement::MinCounts { counts: required } => required
                .iter()
                .all(|(block, min)| counts.count(block) >= *min),
        }
    }
}

/// A named structure and its requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureDefinition {
    pub id: String,
    pub requirement: StructureRequirement,
}

/// Frequency of each block type inside a scanned cube
#[derive(Debug, Clone, Default)]
pub struct BlockCounts {
    counts: HashMap<String, u32>,
    chests: u32,
}

impl BlockCounts {
    /// Scan every block of the cube `center ± radius` exactly once
    pub fn scan(source: &(impl BlockSource + ?Sized), center: BlockPos, radius: i32) -> Self {
        let mut result = BlockCounts::default();
        for dx in -radius..=radius {
            for dy in -radius..=radius {
                for dz in -radius..=radius {
                    let pos = BlockPos::new(center.x + dx, center.y + dy, center.z + dz);
                    if let Some(id) = source.block_type(pos) {
                        result.add(id);
                    }
                }
            }
        }
        result
    }

    /// Record one block of the given type
    pub fn add(&mut self, block_id: &str) {
        *self.counts.entry(block_id.to_string()).or_insert(0) += 1;
        if block_id == CHEST_BLOCK {
            self.chests += 1;
        }
    }

    pub fn count(&self, block_id: &str) -> u32 {
        self.counts.get(block_id).copied().unwrap_or(0)
    }

    pub fn contains(&self, block_id: &str) -> bool {
        self.counts.contains_key(block_id)
    }

    pub fn chests(&self) -> u32 {
        self.chests
    }
}

/// Ordered structure definitions. The first satisfied definition wins.
#[derive(Debug, Clone, Default)]
pub struct StructureCatalog {
    definitions: Vec<StructureDefinition>,
}

impl StructureCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        StructureCatalog {
            definitions: Vec::new(),
        }
    }

    /// The vanilla structures recognized out of the box
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();
        catalog.register(
            "desert_pyramid",
            StructureRequirement::min_counts([
                ("minecraft:chiseled_sandstone", 2),
                ("minecraft:tnt", 2),
            ]),
        );
        catalog.register(
            "ruined_portal",
            StructureRequirement::exists(["minecraft:obsidian", "minecraft:netherrack"]),
        );
        catalog.register(
            "buried_treasure",
            StructureRequirement::min_counts([("minecraft:sand", 2), ("minecraft:sandstone", 2)]),
        );
        catalog.register(
            "nether_fortress",
            StructureRequirement::min_counts([
                ("minecraft:nether_brick", 2),
                ("minecraft:nether_brick_fence", 1),
            ]),
        );
        catalog.register(
            "bastion",
            StructureRequirement::min_counts([("minecraft:blackstone", 4)]),
        );
        catalog.register(
            "pillager_outpost",
            StructureRequirement::min_counts([
                ("minecraft:dark_oak_log", 4),
                ("minecraft:birch_planks", 4),
            ]),
        );
        catalog
    }

    /// Append a definition. Returns false (and changes nothing) if the id exists.
    pub fn register(&mut self, id: impl Into<String>, requirement: StructureRequirement) -> bool {
        let id = id.into();
        if self.definitions.iter().any(|d| d.id == id) {
            return false;
        }
        self.definitions.push(StructureDefinition { id, requirement });
        true
    }

    pub fn definitions(&self) -> &[StructureDefinition] {
        &self.definitions
    }

    /// Classify a scan result
    pub fn classify(&self, counts: &BlockCounts, chest_cluster_threshold: u32) -> &str {
        if counts.chests() >= chest_cluster_threshold {
            return CHEST_CLUSTER;
        }
        self.definitions
            .iter()
            .find(|d| d.requirement.is_satisfied(counts))
            .map(|d| d.id.as_str())
            .unwrap_or(DEFAULT_STRUCTURE)
    }
}

/// Scans around a point and names the structure it belongs to
#[derive(Debug, Clone, Copy)]
pub struct StructureDetector<'a> {
    catalog: &'a StructureCatalog,
    radius: i32,
    chest_cluster_threshold: u32,
}

impl<'a> StructureDetector<'a> {
    pub fn new(catalog: &'a StructureCatalog, radius: i32, chest_cluster_threshold: u32) -> Self {
        StructureDetector {
            catalog,
            radius,
            chest_cluster_threshold,
        }
    }

    /// Detect the structure around `center`
    pub fn detect(&self, source: &(impl BlockSource + ?Sized), center: BlockPos) -> String {
        let counts = BlockCounts::scan(source, center, self.radius);
        self.catalog
            .classify(&counts, self.chest_cluster_threshold)
            .to_string()
    }
}
