//! Contribution records: what one registered item grants

use crate::host::PlayerHost;
use crate::types::{canonical_effect_name, GameMode, StatName, TrinketSlot};
use loot_core::{DropSpec, ItemLoot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Requirements an equipped trinket must keep meeting. All present fields must hold.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_mode: Option<GameMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_tag: Option<String>,
}

impl EquipCondition {
    pub fn passes(&self, player: &impl PlayerHost) -> bool {
        if let Some(ref dimension) = self.dimension {
            if player.dimension() != dimension {
                return false;
            }
        }
        if let Some(mode) = self.game_mode {
            if player.game_mode() != mode {
                return false;
            }
        }
        if let Some(ref tag) = self.has_tag {
            if !player.has_tag(tag) {
                return false;
            }
        }
        true
    }
}

/// Everything an item contributes while equipped, plus where it can be found
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContributionRecord {
    /// Slot the item occupies; `None` means not equippable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trinket: Option<TrinketSlot>,
    #[serde(default)]
    pub stats: BTreeMap<String, f64>,
    #[serde(default)]
    pub passives: BTreeMap<String, i32>,
    #[serde(default)]
    pub actives: BTreeMap<String, i32>,
    #[serde(default)]
    pub immunities: Vec<String>,
    #[serde(default)]
    pub drops: Vec<DropSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loot: Option<ItemLoot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<EquipCondition>,
}

impl ContributionRecord {
    pub fn trinket(slot: TrinketSlot) -> Self {
        ContributionRecord {
            trinket: Some(slot),
            ..Default::default()
        }
    }

    pub fn with_stat(mut self, stat: StatName, delta: f64) -> Self {
        self.stats.insert(stat.as_str().to_string(), delta);
        self
    }

    pub fn with_passive(mut self, effect: &str, level: i32) -> Self {
        self.passives.insert(effect.to_string(), level);
        self
    }

    pub fn with_active(mut self, effect: &str, level: i32) -> Self {
        self.actives.insert(effect.to_string(), level);
        self
    }

    pub fn with_immunity(mut self, effect: &str) -> Self {
        self.immunities.push(canonical_effect_name(effect));
        self
    }

    /// Typed stat deltas. Names are checked at registration.
    pub fn stat_deltas(&self) -> impl Iterator<Item = (StatName, f64)> + '_ {
        self.stats
            .iter()
            .filter_map(|(name, delta)| name.parse::<StatName>().ok().map(|stat| (stat, *delta)))
    }

    /// Whether the current player state allows this item to stay equipped
    pub fn condition_passes(&self, player: &impl PlayerHost) -> bool {
        self.condition.as_ref().map_or(true, |c| c.passes(player))
    }

    /// Whether this record declares immunity to an effect id
    pub fn declares_immunity(&self, effect_id: &str) -> bool {
        let canonical = canonical_effect_name(effect_id);
        self.immunities.iter().any(|i| *i == canonical)
    }

    /// Check invariants and canonicalize immunity names
    pub(crate) fn normalize(mut self) -> Result<Self, String> {
        for (name, delta) in &self.stats {
            name.parse::<StatName>()?;
            if !delta.is_finite() {
                return Err(format!("stat {name} has non-finite delta"));
            }
        }
        for name in self.passives.keys().chain(self.actives.keys()) {
            if name.trim().is_empty() {
                return Err("effect name is empty".to_string());
            }
        }

        let mut immunities = Vec::with_capacity(self.immunities.len());
        for raw in &self.immunities {
            let canonical = canonical_effect_name(raw);
            if canonical.is_empty() {
                return Err("immunity name is empty".to_string());
            }
            if !immunities.contains(&canonical) {
                immunities.push(canonical);
            }
        }
        self.immunities = immunities;

        Ok(self)
    }
}
