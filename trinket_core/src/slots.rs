//! Trinket slots: the persisted loadout and the proxy container that edits it

use crate::cache::{load_versioned, save_versioned, CacheError};
use crate::config::TrinketConfig;
use crate::host::{return_item, PlayerHost, ProxyHost};
use crate::immunity::clear_declared_immunities;
use crate::registry::Registry;
use crate::types::{TrinketSlot, VanillaSlot};
use loot_core::{Container, ItemStack, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Storage key of the per-player loadout
pub const LOADOUT_KEY: &str = "trinkets:loadout";

/// Which item occupies which slot. Player tags mirror this map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotLoadout {
    slots: BTreeMap<TrinketSlot, String>,
}

impl SlotLoadout {
    /// Read the player's loadout. Unreadable data is logged and treated as empty.
    pub fn load(player: &impl PlayerHost) -> Self {
        load_versioned(player, LOADOUT_KEY).unwrap_or_else(|e| {
            warn!("Discarding unreadable loadout for {}: {e}", player.id());
            SlotLoadout::default()
        })
    }

    pub fn save(&self, player: &mut impl PlayerHost) -> Result<(), CacheError> {
        save_versioned(player, LOADOUT_KEY, self)
    }

    pub fn get(&self, slot: TrinketSlot) -> Option<&str> {
        self.slots.get(&slot).map(String::as_str)
    }

    /// Put an item in a slot, returning the previous occupant
    pub fn set(&mut self, slot: TrinketSlot, item_id: impl Into<String>) -> Option<String> {
        self.slots.insert(slot, item_id.into())
    }

    pub fn remove(&mut self, slot: TrinketSlot) -> Option<String> {
        self.slots.remove(&slot)
    }

    pub fn contains_item(&self, item_id: &str) -> bool {
        self.slots.values().any(|id| id == item_id)
    }

    /// Equipped item ids, in slot order
    pub fn item_ids(&self) -> impl Iterator<Item = &str> {
        self.slots.values().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TrinketSlot, &str)> {
        self.slots.iter().map(|(slot, id)| (*slot, id.as_str()))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// What one validation pass changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotReport {
    /// Items whose tag was granted this pass
    pub granted: Vec<String>,
    /// Items moved out of the proxy container
    pub evicted: Vec<String>,
    /// Tags removed because the item is gone or no longer qualifies
    pub revoked: Vec<String>,
}

impl SlotReport {
    pub fn changed(&self) -> bool {
        !(self.granted.is_empty() && self.evicted.is_empty() && self.revoked.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlotTick {
    /// The activation item is not held; any proxy was removed
    Inactive,
    /// A proxy was spawned this tick
    Spawned,
    Validated(SlotReport),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EquipRejection {
    ConditionFailed,
    /// The slot already holds this item
    SlotOccupied(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EquipOutcome {
    /// The item has no trinket slot; the use event is not ours
    NotATrinket,
    /// The selected stack could not be consumed
    NotHeld,
    Equipped(TrinketSlot),
    /// The item went back to the inventory or was dropped
    Rejected {
        slot: TrinketSlot,
        reason: EquipRejection,
    },
}

/// Keeps tags, loadout and proxy container in agreement
pub struct TrinketSlotManager<'a> {
    config: &'a TrinketConfig,
    registry: &'a Registry,
}

impl<'a> TrinketSlotManager<'a> {
    pub fn new(config: &'a TrinketConfig, registry: &'a Registry) -> Self {
        TrinketSlotManager { config, registry }
    }

    fn holds_activation_item(&self, player: &impl PlayerHost) -> bool {
        player.equipment(VanillaSlot::Mainhand).as_deref() == Some(self.config.activation_item.as_str())
    }

    /// Where the proxy should stand, leading the player by their velocity
    pub fn proxy_position(&self, player: &impl PlayerHost) -> Vec3 {
        let head = player.head_location();
        let view = player.view_direction();
        let velocity = player.velocity();
        let offset = self.config.view_offset;
        let lead = self.config.velocity_prediction;
        Vec3::new(
            head.x + view.x * offset + velocity.x * lead,
            head.y + view.y * offset + velocity.y * lead,
            head.z + view.z * offset + velocity.z * lead,
        )
    }

    /// Per-tick reconciliation of the proxy container with the player's tags
    pub fn tick(&self, player: &mut impl PlayerHost, proxies: &mut impl ProxyHost) -> SlotTick {
        let owner = player.id().to_string();

        if !self.holds_activation_item(&*player) {
            if proxies.despawn_proxy(&owner) {
                debug!("Despawned trinket proxy for {owner}");
            }
            return SlotTick::Inactive;
        }

        let position = self.proxy_position(&*player);
        if !proxies.has_proxy(&owner) {
            if let Err(e) = proxies.spawn_proxy(&owner, &self.config.proxy_entity, player.dimension(), position)
            {
                warn!("Could not spawn trinket proxy for {owner}: {e}");
                return SlotTick::Inactive;
            }
            return SlotTick::Spawned;
        }

        let stored = SlotLoadout::load(&*player);
        if !proxies.is_loaded(&owner) {
            if let Some(container) = proxies.container(&owner) {
                for (slot, item_id) in stored.iter() {
                    container.set_item(slot.index(), Some(ItemStack::single(item_id)));
                }
            }
            proxies.mark_loaded(&owner);
        }

        if let Err(e) = proxies.teleport_proxy(&owner, player.dimension(), position) {
            debug!("Could not move trinket proxy for {owner}: {e}");
        }

        let Some(container) = proxies.container(&owner) else {
            return SlotTick::Validated(SlotReport::default());
        };
        let (loadout, report) = self.validate(player, container);

        if loadout != stored {
            if let Err(e) = loadout.save(player) {
                warn!("Could not store loadout for {owner}: {e}");
            }
        }
        SlotTick::Validated(report)
    }

    /// Walk the container in slot order, keeping only items that belong where they sit
    fn validate(&self, player: &mut impl PlayerHost, container: &mut dyn Container) -> (SlotLoadout, SlotReport) {
        let mut report = SlotReport::default();
        let mut loadout = SlotLoadout::default();

        for index in 0..container.size() {
            // Filled by a relocation earlier in this pass
            if TrinketSlot::from_index(index).map_or(false, |slot| loadout.get(slot).is_some()) {
                continue;
            }
            let Some(item) = container.item(index).cloned() else {
                continue;
            };

            let target = self
                .registry
                .trinket(&item.type_id)
                .filter(|record| record.condition_passes(&*player))
                .and_then(|record| record.trinket);
            let Some(slot) = target else {
                evict(player, container, index, &mut report);
                continue;
            };

            let destination = slot.index();
            if destination != index {
                if destination >= container.size() || !container.is_empty_slot(destination) {
                    evict(player, container, index, &mut report);
                    continue;
                }
                container.set_item(index, None);
                container.set_item(destination, Some(item.clone()));
                debug!("Moved {} to slot {destination} for {}", item.type_id, player.id());
            }
            loadout.set(slot, item.type_id);
        }

        let equipped: Vec<String> = loadout.item_ids().map(str::to_string).collect();
        for item_id in equipped {
            if player.add_tag(&item_id) {
                if let Some(record) = self.registry.get(&item_id) {
                    clear_declared_immunities(player, record);
                }
                report.granted.push(item_id);
            }
        }

        for tag in player.tags() {
            if self.registry.trinket(&tag).is_some() && !loadout.contains_item(&tag) {
                player.remove_tag(&tag);
                report.revoked.push(tag);
            }
        }

        (loadout, report)
    }

    /// Handle a trinket being used from the hand
    pub fn try_equip(
        &self,
        player: &mut impl PlayerHost,
        proxies: &mut impl ProxyHost,
        item_id: &str,
    ) -> EquipOutcome {
        let Some(record) = self.registry.trinket(item_id) else {
            return EquipOutcome::NotATrinket;
        };
        let Some(slot) = record.trinket else {
            return EquipOutcome::NotATrinket;
        };

        let mut loadout = SlotLoadout::load(&*player);
        let rejection = if !record.condition_passes(&*player) {
            Some(EquipRejection::ConditionFailed)
        } else {
            self.occupant(&*player, &loadout, slot)
                .map(EquipRejection::SlotOccupied)
        };

        if let Err(e) = player.consume_selected(1) {
            warn!("Could not take {item_id} from {}: {e}", player.id());
            return EquipOutcome::NotHeld;
        }

        if let Some(reason) = rejection {
            debug!("Refused {item_id} for {}: {reason:?}", player.id());
            return_item(player, ItemStack::single(item_id));
            return EquipOutcome::Rejected { slot, reason };
        }

        loadout.set(slot, item_id);
        if let Err(e) = loadout.save(player) {
            warn!("Could not store loadout for {}: {e}", player.id());
        }
        player.add_tag(item_id);

        let owner = player.id().to_string();
        if proxies.is_loaded(&owner) {
            if let Some(container) = proxies.container(&owner) {
                if let Some(displaced) = container.item(slot.index()).cloned() {
                    debug!("Returning {} from slot {} for {owner}", displaced.type_id, slot.index());
                    return_item(player, displaced);
                }
                container.set_item(slot.index(), Some(ItemStack::single(item_id)));
            }
        }

        clear_declared_immunities(player, record);
        EquipOutcome::Equipped(slot)
    }

    fn occupant(&self, player: &impl PlayerHost, loadout: &SlotLoadout, slot: TrinketSlot) -> Option<String> {
        loadout.get(slot).map(str::to_string).or_else(|| {
            player
                .tags()
                .into_iter()
                .find(|tag| self.registry.trinket(tag).and_then(|r| r.trinket) == Some(slot))
        })
    }

    /// Return every equipped trinket to the player and clear all slots.
    /// Returns the ids handed back.
    pub fn unequip_all(&self, player: &mut impl PlayerHost, proxies: &mut impl ProxyHost) -> Vec<String> {
        let owner = player.id().to_string();
        let loadout = SlotLoadout::load(&*player);

        let mut stacks: Vec<ItemStack> = Vec::new();
        if let Some(container) = proxies.container(&owner) {
            for index in 0..container.size() {
                if let Some(item) = container.item(index).cloned() {
                    container.set_item(index, None);
                    stacks.push(item);
                }
            }
        }
        let tagged: Vec<String> = player
            .tags()
            .into_iter()
            .filter(|tag| self.registry.trinket(tag).is_some())
            .collect();
        let mut item_ids: BTreeSet<String> = stacks.iter().map(|s| s.type_id.clone()).collect();
        for item_id in loadout.item_ids().map(str::to_string).chain(tagged) {
            if item_ids.insert(item_id.clone()) {
                stacks.push(ItemStack::single(item_id));
            }
        }

        for item_id in &item_ids {
            player.remove_tag(item_id);
        }
        for stack in stacks {
            return_item(player, stack);
        }
        if let Err(e) = SlotLoadout::default().save(player) {
            warn!("Could not clear loadout for {owner}: {e}");
        }

        debug!("Unequipped {} trinkets for {owner}", item_ids.len());
        item_ids.into_iter().collect()
    }
}

fn evict(player: &mut impl PlayerHost, container: &mut dyn Container, index: usize, report: &mut SlotReport) {
    if let Some(item) = container.item(index).cloned() {
        container.set_item(index, None);
        debug!("Evicted {} from slot {index} for {}", item.type_id, player.id());
        report.evicted.push(item.type_id.clone());
        return_item(player, item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::{MemoryPlayer, MemoryProxyHost};
    use crate::registry::{ContributionRecord, EquipCondition};
    use crate::types::StatName;

    const SCROLL: &str = "trinkets:scroll";
    const RING_A: &str = "trinkets:ring_a";
    const RING_B: &str = "trinkets:ring_b";
    const NETHER_CHARM: &str = "trinkets:nether_charm";

    fn registry() -> Registry {
        let mut registry = Registry::default();
        registry
            .register(RING_A, ContributionRecord::trinket(TrinketSlot::Ring).with_stat(StatName::Health, 2.0))
            .unwrap();
        registry
            .register(RING_B, ContributionRecord::trinket(TrinketSlot::Ring).with_stat(StatName::Speed, 10.0))
            .unwrap();
        let mut charm = ContributionRecord::trinket(TrinketSlot::Charm).with_immunity("minecraft:poison");
        charm.condition = Some(EquipCondition {
            dimension: Some("minecraft:nether".to_string()),
            ..Default::default()
        });
        registry.register(NETHER_CHARM, charm).unwrap();
        registry
    }

    fn scroll_holder() -> MemoryPlayer {
        let mut player = MemoryPlayer::new("p");
        player.hold(ItemStack::single(SCROLL));
        player
    }

    /// Spawn and load the proxy so later ticks validate
    fn open_proxy(manager: &TrinketSlotManager, player: &mut MemoryPlayer, proxies: &mut MemoryProxyHost) {
        assert_eq!(manager.tick(player, proxies), SlotTick::Spawned);
        assert_eq!(manager.tick(player, proxies), SlotTick::Validated(SlotReport::default()));
    }

    #[test]
    fn test_proxy_follows_activation_item() {
        let config = TrinketConfig::default();
        let registry = registry();
        let manager = TrinketSlotManager::new(&config, &registry);
        let mut proxies = MemoryProxyHost::default();
        let mut player = scroll_holder();
        player.velocity = Vec3::new(0.1, 0.0, 0.0);

        assert_eq!(manager.tick(&mut player, &mut proxies), SlotTick::Spawned);
        let proxy = proxies.proxy("p").unwrap();
        assert_eq!(proxy.entity_type, "trinkets:trinkets_inv");
        assert!((proxy.location.x - 0.5).abs() < 1e-9);
        assert!((proxy.location.z - 0.5).abs() < 1e-9);

        player.equipment.clear();
        assert_eq!(manager.tick(&mut player, &mut proxies), SlotTick::Inactive);
        assert!(!proxies.has_proxy("p"));
    }

    #[test]
    fn test_wrong_slot_is_relocated() {
        let config = TrinketConfig::default();
        let registry = registry();
        let manager = TrinketSlotManager::new(&config, &registry);
        let mut proxies = MemoryProxyHost::default();
        let mut player = scroll_holder();
        open_proxy(&manager, &mut player, &mut proxies);

        let container = &mut proxies.proxy_mut("p").unwrap().container;
        container.set_item(0, Some(ItemStack::single(RING_A)));
        container.set_item(1, Some(ItemStack::single("minecraft:dirt")));

        let SlotTick::Validated(report) = manager.tick(&mut player, &mut proxies) else {
            panic!("expected validation");
        };
        assert_eq!(report.granted, vec![RING_A.to_string()]);
        assert_eq!(report.evicted, vec!["minecraft:dirt".to_string()]);

        let container = &proxies.proxy("p").unwrap().container;
        assert!(container.item(0).is_none());
        assert_eq!(container.item(TrinketSlot::Ring.index()).unwrap().type_id, RING_A);
        assert!(player.has_tag(RING_A));
        assert_eq!(player.count_item("minecraft:dirt"), 1);
        assert_eq!(SlotLoadout::load(&player).get(TrinketSlot::Ring), Some(RING_A));
    }

    #[test]
    fn test_blocked_relocation_evicts() {
        let config = TrinketConfig::default();
        let registry = registry();
        let manager = TrinketSlotManager::new(&config, &registry);
        let mut proxies = MemoryProxyHost::default();
        let mut player = scroll_holder();
        open_proxy(&manager, &mut player, &mut proxies);

        let container = &mut proxies.proxy_mut("p").unwrap().container;
        container.set_item(0, Some(ItemStack::single(RING_B)));
        container.set_item(TrinketSlot::Ring.index(), Some(ItemStack::single(RING_A)));

        manager.tick(&mut player, &mut proxies);
        assert!(player.has_tag(RING_A));
        assert!(!player.has_tag(RING_B));
        assert_eq!(player.count_item(RING_B), 1);
    }

    #[test]
    fn test_failed_condition_evicts_and_revokes() {
        let config = TrinketConfig::default();
        let registry = registry();
        let manager = TrinketSlotManager::new(&config, &registry);
        let mut proxies = MemoryProxyHost::default();
        let mut player = scroll_holder();
        player.tags.push(NETHER_CHARM.to_string());

        assert_eq!(manager.tick(&mut player, &mut proxies), SlotTick::Spawned);
        let SlotTick::Validated(report) = manager.tick(&mut player, &mut proxies) else {
            panic!("expected validation");
        };
        assert_eq!(report.revoked, vec![NETHER_CHARM.to_string()]);
        assert!(!player.has_tag(NETHER_CHARM));

        proxies
            .proxy_mut("p")
            .unwrap()
            .container
            .set_item(TrinketSlot::Charm.index(), Some(ItemStack::single(NETHER_CHARM)));
        let SlotTick::Validated(report) = manager.tick(&mut player, &mut proxies) else {
            panic!("expected validation");
        };
        assert_eq!(report.evicted, vec![NETHER_CHARM.to_string()]);
        assert!(!player.has_tag(NETHER_CHARM));
        assert_eq!(player.count_item(NETHER_CHARM), 1);
    }

    #[test]
    fn test_second_ring_is_returned() {
        let config = TrinketConfig::default();
        let registry = registry();
        let manager = TrinketSlotManager::new(&config, &registry);
        let mut proxies = MemoryProxyHost::default();
        let mut player = MemoryPlayer::new("p");

        player.hold(ItemStack::single(RING_A));
        assert_eq!(
            manager.try_equip(&mut player, &mut proxies, RING_A),
            EquipOutcome::Equipped(TrinketSlot::Ring)
        );

        player.hold(ItemStack::single(RING_B));
        assert_eq!(
            manager.try_equip(&mut player, &mut proxies, RING_B),
            EquipOutcome::Rejected {
                slot: TrinketSlot::Ring,
                reason: EquipRejection::SlotOccupied(RING_A.to_string()),
            }
        );
        assert!(player.equipment(VanillaSlot::Mainhand).is_none());
        assert_eq!(player.count_item(RING_B), 1);
        assert!(!player.has_tag(RING_B));
    }

    #[test]
    fn test_rejected_item_drops_when_full() {
        let config = TrinketConfig::default();
        let registry = registry();
        let manager = TrinketSlotManager::new(&config, &registry);
        let mut proxies = MemoryProxyHost::default();
        let mut player = MemoryPlayer::new("p").with_inventory_size(0);

        player.hold(ItemStack::single(NETHER_CHARM));
        let outcome = manager.try_equip(&mut player, &mut proxies, NETHER_CHARM);
        assert_eq!(
            outcome,
            EquipOutcome::Rejected {
                slot: TrinketSlot::Charm,
                reason: EquipRejection::ConditionFailed,
            }
        );
        assert_eq!(player.dropped, vec![ItemStack::single(NETHER_CHARM)]);
    }

    #[test]
    fn test_equip_clears_immune_effects() {
        let config = TrinketConfig::default();
        let registry = registry();
        let manager = TrinketSlotManager::new(&config, &registry);
        let mut proxies = MemoryProxyHost::default();
        let mut player = MemoryPlayer::new("p");
        player.dimension = "minecraft:nether".to_string();
        player.add_effect("minecraft:poison", 100, 1).unwrap();

        player.hold(ItemStack::single(NETHER_CHARM));
        assert_eq!(
            manager.try_equip(&mut player, &mut proxies, NETHER_CHARM),
            EquipOutcome::Equipped(TrinketSlot::Charm)
        );
        assert!(player.effects.is_empty());
    }

    #[test]
    fn test_non_trinket_use_is_ignored() {
        let config = TrinketConfig::default();
        let registry = registry();
        let manager = TrinketSlotManager::new(&config, &registry);
        let mut proxies = MemoryProxyHost::default();
        let mut player = MemoryPlayer::new("p");
        player.hold(ItemStack::single("minecraft:apple"));

        assert_eq!(
            manager.try_equip(&mut player, &mut proxies, "minecraft:apple"),
            EquipOutcome::NotATrinket
        );
        assert_eq!(player.count_item("minecraft:apple"), 1);
    }

    #[test]
    fn test_loadout_fills_new_proxy() {
        let config = TrinketConfig::default();
        let registry = registry();
        let manager = TrinketSlotManager::new(&config, &registry);
        let mut proxies = MemoryProxyHost::default();
        let mut player = MemoryPlayer::new("p");
        player.hold(ItemStack::single(RING_A));
        manager.try_equip(&mut player, &mut proxies, RING_A);

        player.hold(ItemStack::single(SCROLL));
        open_proxy(&manager, &mut player, &mut proxies);
        let container = &proxies.proxy("p").unwrap().container;
        assert_eq!(container.item(TrinketSlot::Ring.index()).unwrap().type_id, RING_A);
        assert!(player.has_tag(RING_A));
    }

    #[test]
    fn test_unequip_all() {
        let config = TrinketConfig::default();
        let registry = registry();
        let manager = TrinketSlotManager::new(&config, &registry);
        let mut proxies = MemoryProxyHost::default();
        let mut player = MemoryPlayer::new("p");
        player.hold(ItemStack::single(RING_A));
        manager.try_equip(&mut player, &mut proxies, RING_A);

        assert_eq!(manager.unequip_all(&mut player, &mut proxies), vec![RING_A.to_string()]);
        assert!(!player.has_tag(RING_A));
        assert!(SlotLoadout::load(&player).is_empty());
        assert_eq!(player.count_item(RING_A), 1);
    }

    #[test]
    fn test_unequip_all_returns_every_stack() {
        let config = TrinketConfig::default();
        let registry = registry();
        let manager = TrinketSlotManager::new(&config, &registry);
        let mut proxies = MemoryProxyHost::default();
        let mut player = scroll_holder();
        open_proxy(&manager, &mut player, &mut proxies);

        let container = &mut proxies.proxy_mut("p").unwrap().container;
        container.set_item(0, Some(ItemStack::single(RING_A)));
        container.set_item(TrinketSlot::Ring.index(), Some(ItemStack::single(RING_A)));

        assert_eq!(manager.unequip_all(&mut player, &mut proxies), vec![RING_A.to_string()]);
        assert_eq!(player.count_item(RING_A), 2);
        let container = &proxies.proxy("p").unwrap().container;
        assert!((0..container.size()).all(|i| container.item(i).is_none()));
    }

    #[test]
    fn test_equip_returns_displaced_container_item() {
        let config = TrinketConfig::default();
        let registry = registry();
        let manager = TrinketSlotManager::new(&config, &registry);
        let mut proxies = MemoryProxyHost::default();
        let mut player = scroll_holder();
        open_proxy(&manager, &mut player, &mut proxies);

        proxies
            .proxy_mut("p")
            .unwrap()
            .container
            .set_item(TrinketSlot::Ring.index(), Some(ItemStack::single("minecraft:diamond")));

        player.hold(ItemStack::single(RING_A));
        assert_eq!(
            manager.try_equip(&mut player, &mut proxies, RING_A),
            EquipOutcome::Equipped(TrinketSlot::Ring)
        );
        assert_eq!(player.count_item("minecraft:diamond"), 1);
        let container = &proxies.proxy("p").unwrap().container;
        assert_eq!(container.item(TrinketSlot::Ring.index()).unwrap().type_id, RING_A);
    }
}
