//! trinket_core - Stat aggregation and trinket slots for equipped items
//!
//! This library provides:
//! - Registry: Contribution records announced by other systems over JSON
//! - resolve: Equipped set + registry → ResolvedStatSheet
//! - StatCache / EquipmentSignature: Versioned per-player persistence and change detection
//! - Applicator: Movement attributes, staggered trigger events, passive effects, mana bar
//! - TrinketSlotManager: The proxy container that edits a player's loadout
//! - TrinketRuntime: One entry point per host event

pub mod applicator;
pub mod cache;
pub mod config;
pub mod handshake;
pub mod host;
pub mod immunity;
pub mod jumps;
pub mod prelude;
pub mod registry;
pub mod runtime;
pub mod scheduler;
pub mod sheet;
pub mod slots;
pub mod source;
pub mod types;

// Re-export core types for convenience
pub use applicator::{mana_frame_index, Applicator, ManaState};
pub use cache::{CacheError, EquipmentSignature, StatCache, StatCategory};
pub use config::{ConfigError, CoreConfig};
pub use handshake::{DependencyWatch, WatchNotice};
pub use host::{EntityStore, PlayerHost, ProxyHost};
pub use registry::{Acknowledgement, ContributionRecord, EquipCondition, RegistrationError, RegistrationReport, Registry};
pub use runtime::{ItemUse, Outbound, TrinketRuntime};
pub use scheduler::{Deferred, DeferredQueue};
pub use sheet::{resolve, ResolvedStatSheet, StatAccumulator};
pub use slots::{EquipOutcome, EquipRejection, SlotLoadout, SlotReport, SlotTick, TrinketSlotManager};
pub use source::{DefaultsSource, StatSource, TrinketSource};
pub use types::{ActiveEffect, GameMode, StatName, TrinketSlot, VanillaSlot};

// Re-export loot_core types for convenience
pub use loot_core::{BlockPos, ItemStack, LootConfig, Vec3};
