//! Prelude module for convenient imports
//!
//! ```rust
//! use trinket_core::prelude::*;
//! ```

// Core types
pub use crate::sheet::ResolvedStatSheet;
pub use crate::types::{GameMode, StatName, TrinketSlot, VanillaSlot};

// Registration
pub use crate::registry::{Acknowledgement, ContributionRecord, Registry};

// Runtime
pub use crate::runtime::{ItemUse, Outbound, TrinketRuntime};
pub use crate::slots::{EquipOutcome, SlotLoadout};

// Host seams
pub use crate::host::{EntityStore, PlayerHost, ProxyHost};

// Config
pub use crate::config::CoreConfig;

// Re-exports from loot_core
pub use loot_core::{BlockPos, ChestSite, ItemStack, Vec3, WorldStore};
