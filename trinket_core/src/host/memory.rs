//! In-memory hosts for tests and offline simulation

use super::{EntityStore, PlayerHost, ProxyHost};
use crate::types::{ActiveEffect, GameMode, VanillaSlot};
use loot_core::memory::MemoryContainer;
use loot_core::{Container, HostError, ItemStack, Vec3};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Scriptable player. Every field is public so tests can stage a situation.
#[derive(Debug, Clone)]
pub struct MemoryPlayer {
    pub id: String,
    pub valid: bool,
    pub dimension: String,
    pub location: Vec3,
    pub head: Vec3,
    pub view: Vec3,
    pub velocity: Vec3,
    pub on_ground: bool,
    pub falling: bool,
    pub jumping: bool,
    pub game_mode: GameMode,
    pub tags: Vec<String>,
    pub equipment: HashMap<VanillaSlot, ItemStack>,
    pub inventory: MemoryContainer,
    pub dropped: Vec<ItemStack>,
    pub effects: BTreeMap<String, ActiveEffect>,
    /// Effect ids the host refuses to add or remove
    pub rejected_effects: BTreeSet<String>,
    pub movement: BTreeMap<String, f64>,
    /// Movement components this player has
    pub movement_components: BTreeSet<String>,
    pub events: Vec<String>,
    pub action_bar: Option<String>,
    pub knockbacks: Vec<(f64, f64, f64)>,
    pub properties: BTreeMap<String, String>,
}

impl MemoryPlayer {
    pub fn new(id: &str) -> Self {
        MemoryPlayer {
            id: id.to_string(),
            valid: true,
            dimension: "minecraft:overworld".to_string(),
            location: Vec3::new(0.0, 64.0, 0.0),
            head: Vec3::new(0.0, 65.6, 0.0),
            view: Vec3::new(0.0, 0.0, 1.0),
            velocity: Vec3::default(),
            on_ground: true,
            falling: false,
            jumping: false,
            game_mode: GameMode::Survival,
            tags: Vec::new(),
            equipment: HashMap::new(),
            inventory: MemoryContainer::new(36),
            dropped: Vec::new(),
            effects: BTreeMap::new(),
            rejected_effects: BTreeSet::new(),
            movement: BTreeMap::new(),
            movement_components: [
                "minecraft:movement",
                "minecraft:underwater_movement",
                "minecraft:lava_movement",
            ]
            .into_iter()
            .map(str::to_string)
            .collect(),
            events: Vec::new(),
            action_bar: None,
            knockbacks: Vec::new(),
            properties: BTreeMap::new(),
        }
    }

    pub fn hold(&mut self, item: ItemStack) {
        self.equipment.insert(VanillaSlot::Mainhand, item);
    }

    pub fn with_inventory_size(mut self, size: usize) -> Self {
        self.inventory = MemoryContainer::new(size);
        self
    }

    /// Total units of an item across hand, inventory and drops
    pub fn count_item(&self, type_id: &str) -> u32 {
        let hand = self
            .equipment
            .values()
            .filter(|s| s.type_id == type_id)
            .map(|s| s.amount)
            .sum::<u32>();
        let inventory = self
            .inventory
            .items()
            .filter(|(_, s)| s.type_id == type_id)
            .map(|(_, s)| s.amount)
            .sum::<u32>();
        let dropped = self
            .dropped
            .iter()
            .filter(|s| s.type_id == type_id)
            .map(|s| s.amount)
            .sum::<u32>();
        hand + inventory + dropped
    }
}

impl EntityStore for MemoryPlayer {
    fn get_property(&self, key: &str) -> Option<String> {
        self.properties.get(key).cloned()
    }

    fn set_property(&mut self, key: &str, value: Option<String>) {
        match value {
            Some(v) => {
                self.properties.insert(key.to_string(), v);
            }
            None => {
                self.properties.remove(key);
            }
        }
    }
}

impl PlayerHost for MemoryPlayer {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn dimension(&self) -> &str {
        &self.dimension
    }

    fn location(&self) -> Vec3 {
        self.location
    }

    fn head_location(&self) -> Vec3 {
        self.head
    }

    fn view_direction(&self) -> Vec3 {
        self.view
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn is_on_ground(&self) -> bool {
        self.on_ground
    }

    fn is_falling(&self) -> bool {
        self.falling
    }

    fn is_jumping(&self) -> bool {
        self.jumping
    }

    fn game_mode(&self) -> GameMode {
        self.game_mode
    }

    fn tags(&self) -> Vec<String> {
        self.tags.clone()
    }

    fn add_tag(&mut self, tag: &str) -> bool {
        if self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    fn equipment(&self, slot: VanillaSlot) -> Option<String> {
        self.equipment.get(&slot).map(|s| s.type_id.clone())
    }

    fn consume_selected(&mut self, amount: u32) -> Result<(), HostError> {
        let Some(stack) = self.equipment.get_mut(&VanillaSlot::Mainhand) else {
            return Err(HostError::Rejected("nothing selected".to_string()));
        };
        if stack.amount < amount {
            return Err(HostError::Rejected(format!(
                "only {} of {} in hand",
                stack.amount, stack.type_id
            )));
        }
        stack.amount -= amount;
        if stack.amount == 0 {
            self.equipment.remove(&VanillaSlot::Mainhand);
        }
        Ok(())
    }

    fn give_item(&mut self, item: ItemStack) -> Result<(), ItemStack> {
        match self.inventory.first_empty() {
            Some(slot) => {
                self.inventory.set_item(slot, Some(item));
                Ok(())
            }
            None => Err(item),
        }
    }

    fn drop_item(&mut self, item: ItemStack) -> Result<(), HostError> {
        self.dropped.push(item);
        Ok(())
    }

    fn effects(&self) -> Vec<ActiveEffect> {
        self.effects.values().cloned().collect()
    }

    fn add_effect(&mut self, effect_id: &str, duration: u32, amplifier: u32) -> Result<(), HostError> {
        if self.rejected_effects.contains(effect_id) {
            return Err(HostError::Rejected(format!("unknown effect {effect_id}")));
        }
        self.effects.insert(
            effect_id.to_string(),
            ActiveEffect {
                type_id: effect_id.to_string(),
                amplifier,
                duration,
            },
        );
        Ok(())
    }

    fn remove_effect(&mut self, effect_id: &str) -> Result<(), HostError> {
        if self.rejected_effects.contains(effect_id) {
            return Err(HostError::Rejected(format!("cannot remove {effect_id}")));
        }
        self.effects.remove(effect_id);
        Ok(())
    }

    fn set_movement(&mut self, component: &str, value: f64) -> Result<(), HostError> {
        if !self.movement_components.contains(component) {
            return Err(HostError::MissingComponent(component.to_string()));
        }
        self.movement.insert(component.to_string(), value);
        Ok(())
    }

    fn trigger_event(&mut self, event: &str) -> Result<(), HostError> {
        self.events.push(event.to_string());
        Ok(())
    }

    fn set_action_bar(&mut self, text: &str) -> Result<(), HostError> {
        self.action_bar = Some(text.to_string());
        Ok(())
    }

    fn apply_knockback(&mut self, direction_x: f64, direction_z: f64, vertical: f64) {
        self.knockbacks.push((direction_x, direction_z, vertical));
    }
}

#[derive(Debug, Clone)]
pub struct MemoryProxy {
    pub entity_type: String,
    pub dimension: String,
    pub location: Vec3,
    pub loaded: bool,
    pub container: MemoryContainer,
}

/// Proxy entities keyed by owner id
#[derive(Debug, Clone, Default)]
pub struct MemoryProxyHost {
    pub proxies: HashMap<String, MemoryProxy>,
}

impl MemoryProxyHost {
    pub fn proxy(&self, owner: &str) -> Option<&MemoryProxy> {
        self.proxies.get(owner)
    }

    pub fn proxy_mut(&mut self, owner: &str) -> Option<&mut MemoryProxy> {
        self.proxies.get_mut(owner)
    }
}

impl ProxyHost for MemoryProxyHost {
    fn has_proxy(&self, owner: &str) -> bool {
        self.proxies.contains_key(owner)
    }

    fn spawn_proxy(
        &mut self,
        owner: &str,
        entity_type: &str,
        dimension: &str,
        at: Vec3,
    ) -> Result<(), HostError> {
        self.proxies.insert(
            owner.to_string(),
            MemoryProxy {
                entity_type: entity_type.to_string(),
                dimension: dimension.to_string(),
                location: at,
                loaded: false,
                container: MemoryContainer::new(crate::types::TrinketSlot::COUNT),
            },
        );
        Ok(())
    }

    fn despawn_proxy(&mut self, owner: &str) -> bool {
        self.proxies.remove(owner).is_some()
    }

    fn teleport_proxy(&mut self, owner: &str, dimension: &str, at: Vec3) -> Result<(), HostError> {
        let proxy = self.proxies.get_mut(owner).ok_or(HostError::Unloaded)?;
        proxy.dimension = dimension.to_string();
        proxy.location = at;
        Ok(())
    }

    fn is_loaded(&self, owner: &str) -> bool {
        self.proxies.get(owner).map_or(false, |p| p.loaded)
    }

    fn mark_loaded(&mut self, owner: &str) {
        if let Some(proxy) = self.proxies.get_mut(owner) {
            proxy.loaded = true;
        }
    }

    fn container(&mut self, owner: &str) -> Option<&mut dyn Container> {
        self.proxies
            .get_mut(owner)
            .map(|p| &mut p.container as &mut dyn Container)
    }
}
