//! Per-player persistence of the resolved sheet and change detection

use crate::host::{EntityStore, PlayerHost};
use crate::sheet::ResolvedStatSheet;
use crate::types::{StatName, VanillaSlot};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tracing::warn;

/// Current persisted format
pub const CACHE_FORMAT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to decode '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("'{key}' has unsupported format version {version}")]
    UnsupportedVersion { key: String, version: u32 },
    #[error("Failed to encode '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The four persisted categories of a sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatCategory {
    Stats,
    Passives,
    Actives,
    Immunities,
}

impl StatCategory {
    pub fn all() -> &'static [StatCategory] {
        &[
            StatCategory::Stats,
            StatCategory::Passives,
            StatCategory::Actives,
            StatCategory::Immunities,
        ]
    }

    pub fn storage_key(self) -> &'static str {
        match self {
            StatCategory::Stats => "trinkets:player_data.stats",
            StatCategory::Passives => "trinkets:player_data.passives",
            StatCategory::Actives => "trinkets:player_data.actives",
            StatCategory::Immunities => "trinkets:player_data.immunities",
        }
    }
}

#[derive(Serialize)]
struct Envelope<'a, T> {
    version: u32,
    value: &'a T,
}

/// Versioned values decode first; anything else is the bare pre-version format
#[derive(Deserialize)]
#[serde(untagged)]
enum Stored<T> {
    Versioned { version: u32, value: T },
    Legacy(T),
}

/// Read a versioned value. Absent keys yield `T::default()`.
pub fn load_versioned<T>(store: &(impl EntityStore + ?Sized), key: &str) -> Result<T, CacheError>
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = store.get_property(key) else {
        return Ok(T::default());
    };
    let stored: Stored<T> = serde_json::from_str(&raw).map_err(|source| CacheError::Decode {
        key: key.to_string(),
        source,
    })?;
    match stored {
        Stored::Versioned { version, value } if version <= CACHE_FORMAT_VERSION => Ok(value),
        Stored::Versioned { version, .. } => Err(CacheError::UnsupportedVersion {
            key: key.to_string(),
            version,
        }),
        Stored::Legacy(value) => Ok(value),
    }
}

/// Write a value in the current versioned format
pub fn save_versioned<T: Serialize>(
    store: &mut (impl EntityStore + ?Sized),
    key: &str,
    value: &T,
) -> Result<(), CacheError> {
    let json = serde_json::to_string(&Envelope {
        version: CACHE_FORMAT_VERSION,
        value,
    })
    .map_err(|source| CacheError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set_property(key, Some(json));
    Ok(())
}

/// Persists resolved sheets in the player's own storage
pub struct StatCache;

impl StatCache {
    /// Overwrite all four categories
    pub fn save(store: &mut impl EntityStore, sheet: &ResolvedStatSheet) -> Result<(), CacheError> {
        let stats: BTreeMap<&str, f64> = sheet
            .stats
            .iter()
            .map(|(stat, value)| (stat.as_str(), *value))
            .collect();
        save_versioned(store, StatCategory::Stats.storage_key(), &stats)?;
        save_versioned(store, StatCategory::Passives.storage_key(), &sheet.passives)?;
        save_versioned(store, StatCategory::Actives.storage_key(), &sheet.actives)?;
        save_versioned(store, StatCategory::Immunities.storage_key(), &sheet.immunities)?;
        Ok(())
    }

    /// Load the last saved sheet. Missing categories are empty; unknown stat
    /// names in old saves are dropped.
    pub fn load(store: &impl EntityStore) -> Result<ResolvedStatSheet, CacheError> {
        let raw_stats: BTreeMap<String, f64> =
            Self::load_category(store, StatCategory::Stats)?;
        let stats = raw_stats
            .into_iter()
            .filter_map(|(name, value)| name.parse::<StatName>().ok().map(|stat| (stat, value)))
            .collect();

        Ok(ResolvedStatSheet {
            stats,
            passives: Self::load_category(store, StatCategory::Passives)?,
            actives: Self::load_category(store, StatCategory::Actives)?,
            immunities: Self::load_category(store, StatCategory::Immunities)?,
        })
    }

    pub fn load_category<T>(store: &impl EntityStore, category: StatCategory) -> Result<T, CacheError>
    where
        T: DeserializeOwned + Default,
    {
        load_versioned(store, category.storage_key())
    }

    /// Load for a consumer that must not fail: decode errors are logged and
    /// read as an empty sheet.
    pub fn load_or_default(store: &impl EntityStore) -> ResolvedStatSheet {
        Self::load(store).unwrap_or_else(|e| {
            warn!("Discarding unreadable stat cache: {e}");
            ResolvedStatSheet::default()
        })
    }

    pub fn immunities(store: &impl EntityStore) -> BTreeSet<String> {
        Self::load_category(store, StatCategory::Immunities).unwrap_or_else(|e| {
            warn!("Discarding unreadable immunities: {e}");
            BTreeSet::new()
        })
    }
}

/// Vanilla equipment plus tags, compared by equality to detect changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquipmentSignature(String);

impl EquipmentSignature {
    pub fn capture(player: &impl PlayerHost) -> Self {
        let equipment = VanillaSlot::all()
            .iter()
            .map(|slot| player.equipment(*slot).unwrap_or_else(|| "none".to_string()))
            .collect::<Vec<_>>()
            .join("|");
        let mut tags = player.tags();
        tags.sort();
        EquipmentSignature(format!("{equipment}:{}", tags.join("|")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryPlayer;
    use loot_core::ItemStack;

    fn sample_sheet() -> ResolvedStatSheet {
        let mut sheet = ResolvedStatSheet::default();
        sheet.stats.insert(StatName::Health, 26.0);
        sheet.stats.insert(StatName::Speed, 120.0);
        sheet.passives.insert("speed".to_string(), 1);
        sheet.actives.insert("poison".to_string(), 2);
        sheet.immunities.insert("Wither".to_string());
        sheet
    }

    #[test]
    fn test_save_then_load() {
        let mut player = MemoryPlayer::new("p");
        let sheet = sample_sheet();
        StatCache::save(&mut player, &sheet).unwrap();
        assert_eq!(StatCache::load(&player).unwrap(), sheet);

        let raw = player.get_property("trinkets:player_data.passives").unwrap();
        assert_eq!(raw, r#"{"version":1,"value":{"speed":1}}"#);
    }

    #[test]
    fn test_missing_is_empty() {
        let player = MemoryPlayer::new("p");
        assert_eq!(StatCache::load(&player).unwrap(), ResolvedStatSheet::default());
    }

    #[test]
    fn test_legacy_bare_json() {
        let mut player = MemoryPlayer::new("p");
        player.set_property("trinkets:player_data.stats", Some(r#"{"health":24,"luck":3}"#.to_string()));
        player.set_property("trinkets:player_data.immunities", Some(r#"["Poison"]"#.to_string()));
        let sheet = StatCache::load(&player).unwrap();
        assert_eq!(sheet.stat(StatName::Health), 24.0);
        assert_eq!(sheet.stats.len(), 1);
        assert!(sheet.immunities.contains("Poison"));
    }

    #[test]
    fn test_future_version_rejected() {
        let mut player = MemoryPlayer::new("p");
        player.set_property(
            "trinkets:player_data.passives",
            Some(r#"{"version":7,"value":{}}"#.to_string()),
        );
        let err = StatCache::load(&player).unwrap_err();
        assert!(matches!(err, CacheError::UnsupportedVersion { version: 7, .. }));
        assert_eq!(StatCache::load_or_default(&player), ResolvedStatSheet::default());
    }

    #[test]
    fn test_signature_changes_with_tags_and_equipment() {
        let mut player = MemoryPlayer::new("p");
        let before = EquipmentSignature::capture(&player);
        assert_eq!(before.as_str(), "none|none|none|none|none|none:");

        player.tags.push("trinkets:ring".to_string());
        let tagged = EquipmentSignature::capture(&player);
        assert_ne!(before, tagged);

        player.equipment.insert(VanillaSlot::Head, ItemStack::single("minecraft:iron_helmet"));
        let helmet = EquipmentSignature::capture(&player);
        assert_eq!(helmet.as_str(), "minecraft:iron_helmet|none|none|none|none|none:trinkets:ring");
    }
}
