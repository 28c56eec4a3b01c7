//! Core types for trinket stats and slots

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Numeric player attributes a trinket may modify
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatName {
    Health,
    Mana,
    Attack,
    AttackMulti,
    Knockback,
    KnockbackRes,
    DamageReduction,
    Speed,
    WaterSpeed,
    LavaSpeed,
    HealthRegen,
    LifeSteal,
    ManaRegen,
    ManaSteal,
    CritMulti,
    CritChance,
    Thorns,
    FireAspect,
    ExtraJumps,
}

impl StatName {
    /// Get all stats in resolution order
    pub fn all() -> &'static [StatName] {
        &[
            StatName::Health,
            StatName::Mana,
            StatName::Attack,
            StatName::AttackMulti,
            StatName::Knockback,
            StatName::KnockbackRes,
            StatName::DamageReduction,
            StatName::Speed,
            StatName::WaterSpeed,
            StatName::LavaSpeed,
            StatName::HealthRegen,
            StatName::LifeSteal,
            StatName::ManaRegen,
            StatName::ManaSteal,
            StatName::CritMulti,
            StatName::CritChance,
            StatName::Thorns,
            StatName::FireAspect,
            StatName::ExtraJumps,
        ]
    }

    /// Name as it appears in payloads and persisted state
    pub fn as_str(self) -> &'static str {
        match self {
            StatName::Health => "health",
            StatName::Mana => "mana",
            StatName::Attack => "attack",
            StatName::AttackMulti => "attackMulti",
            StatName::Knockback => "knockback",
            StatName::KnockbackRes => "knockbackRes",
            StatName::DamageReduction => "damageReduction",
            StatName::Speed => "speed",
            StatName::WaterSpeed => "waterSpeed",
            StatName::LavaSpeed => "lavaSpeed",
            StatName::HealthRegen => "healthRegen",
            StatName::LifeSteal => "lifeSteal",
            StatName::ManaRegen => "manaRegen",
            StatName::ManaSteal => "manaSteal",
            StatName::CritMulti => "critMulti",
            StatName::CritChance => "critChance",
            StatName::Thorns => "thorns",
            StatName::FireAspect => "fireAspect",
            StatName::ExtraJumps => "extraJumps",
        }
    }
}

impl fmt::Display for StatName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatName::all()
            .iter()
            .copied()
            .find(|stat| stat.as_str() == s)
            .ok_or_else(|| format!("unknown stat '{s}'"))
    }
}

/// The thirteen trinket slots, in enumeration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrinketSlot {
    Head,
    Body,
    Feet,
    Necklace,
    Ring,
    Charm,
    Talisman,
    Gauntlet,
    HeartyCharm,
    Doll,
    WitherRing,
    ArchaicCharm,
    Amulet,
}

impl TrinketSlot {
    pub const COUNT: usize = 13;

    /// Get all slots in enumeration order
    pub fn all() -> &'static [TrinketSlot] {
        &[
            TrinketSlot::Head,
            TrinketSlot::Body,
            TrinketSlot::Feet,
            TrinketSlot::Necklace,
            TrinketSlot::Ring,
            TrinketSlot::Charm,
            TrinketSlot::Talisman,
            TrinketSlot::Gauntlet,
            TrinketSlot::HeartyCharm,
            TrinketSlot::Doll,
            TrinketSlot::WitherRing,
            TrinketSlot::ArchaicCharm,
            TrinketSlot::Amulet,
        ]
    }

    /// Container index of this slot in the proxy inventory
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::all().get(index).copied()
    }
}

/// Vanilla equipment slots read for change detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VanillaSlot {
    Head,
    Chest,
    Legs,
    Feet,
    Mainhand,
    Offhand,
}

impl VanillaSlot {
    pub fn all() -> &'static [VanillaSlot] {
        &[
            VanillaSlot::Head,
            VanillaSlot::Chest,
            VanillaSlot::Legs,
            VanillaSlot::Feet,
            VanillaSlot::Mainhand,
            VanillaSlot::Offhand,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Survival,
    Creative,
    Adventure,
    Spectator,
}

/// A status effect currently on an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffect {
    pub type_id: String,
    pub amplifier: u32,
    pub duration: u32,
}

/// Canonical immunity name: namespace stripped, lower-cased, first letter upper-cased.
/// `minecraft:poison`, `POISON` and `Poison` all become `Poison`.
pub fn canonical_effect_name(effect: &str) -> String {
    let base = effect.rsplit(':').next().unwrap_or(effect).to_lowercase();
    let mut chars = base.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_name_round_trip() {
        for stat in StatName::all() {
            assert_eq!(stat.as_str().parse::<StatName>().unwrap(), *stat);
            let json = serde_json::to_string(stat).unwrap();
            assert_eq!(json, format!("\"{}\"", stat.as_str()));
        }
        assert!("strength".parse::<StatName>().is_err());
    }

    #[test]
    fn test_slot_indexes() {
        assert_eq!(TrinketSlot::all().len(), TrinketSlot::COUNT);
        for (i, slot) in TrinketSlot::all().iter().enumerate() {
            assert_eq!(slot.index(), i);
            assert_eq!(TrinketSlot::from_index(i), Some(*slot));
        }
        assert_eq!(TrinketSlot::Amulet.index(), 12);
        assert_eq!(TrinketSlot::from_index(13), None);
    }

    #[test]
    fn test_slot_serde_names() {
        let slot: TrinketSlot = serde_json::from_str("\"heartycharm\"").unwrap();
        assert_eq!(slot, TrinketSlot::HeartyCharm);
        let slot: TrinketSlot = serde_json::from_str("\"archaiccharm\"").unwrap();
        assert_eq!(slot, TrinketSlot::ArchaicCharm);
    }

    #[test]
    fn test_canonical_effect_name() {
        assert_eq!(canonical_effect_name("minecraft:poison"), "Poison");
        assert_eq!(canonical_effect_name("Darkness"), "Darkness");
        assert_eq!(canonical_effect_name("BAD_OMEN"), "Bad_omen");
        assert_eq!(canonical_effect_name(""), "");
    }
}
