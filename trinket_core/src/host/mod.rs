//! Host capabilities the engines call into

pub mod memory;

use crate::types::{ActiveEffect, GameMode, VanillaSlot};
use loot_core::{Container, HostError, ItemStack, Vec3};

/// Per-entity key/value strings
pub trait EntityStore {
    fn get_property(&self, key: &str) -> Option<String>;
    /// Store a value; `None` clears the key
    fn set_property(&mut self, key: &str, value: Option<String>);
}

/// Everything the engines read from or push to a player
pub trait PlayerHost: EntityStore {
    fn id(&self) -> &str;
    /// False once the player has left or been unloaded
    fn is_valid(&self) -> bool;

    fn dimension(&self) -> &str;
    fn location(&self) -> Vec3;
    fn head_location(&self) -> Vec3;
    fn view_direction(&self) -> Vec3;
    fn velocity(&self) -> Vec3;
    fn is_on_ground(&self) -> bool;
    fn is_falling(&self) -> bool;
    fn is_jumping(&self) -> bool;
    fn game_mode(&self) -> GameMode;

    fn tags(&self) -> Vec<String>;
    fn has_tag(&self, tag: &str) -> bool {
        self.tags().iter().any(|t| t == tag)
    }
    /// Returns false if the tag was already present
    fn add_tag(&mut self, tag: &str) -> bool;
    /// Returns false if the tag was absent
    fn remove_tag(&mut self, tag: &str) -> bool;

    /// Type id of the item in a vanilla equipment slot
    fn equipment(&self, slot: VanillaSlot) -> Option<String>;
    /// Remove `amount` units from the selected hotbar stack
    fn consume_selected(&mut self, amount: u32) -> Result<(), HostError>;
    /// Put an item in the inventory, handing it back when there is no room
    fn give_item(&mut self, item: ItemStack) -> Result<(), ItemStack>;
    /// Spawn an item at the player's feet
    fn drop_item(&mut self, item: ItemStack) -> Result<(), HostError>;

    fn effects(&self) -> Vec<ActiveEffect>;
    fn add_effect(&mut self, effect_id: &str, duration: u32, amplifier: u32) -> Result<(), HostError>;
    fn remove_effect(&mut self, effect_id: &str) -> Result<(), HostError>;

    /// Set a movement attribute's current value. `MissingComponent` when the
    /// player lacks it.
    fn set_movement(&mut self, component: &str, value: f64) -> Result<(), HostError>;
    fn trigger_event(&mut self, event: &str) -> Result<(), HostError>;
    fn set_action_bar(&mut self, text: &str) -> Result<(), HostError>;
    fn apply_knockback(&mut self, direction_x: f64, direction_z: f64, vertical: f64);
}

/// The per-player companion entity whose container holds equipped trinkets
pub trait ProxyHost {
    fn has_proxy(&self, owner: &str) -> bool;
    fn spawn_proxy(
        &mut self,
        owner: &str,
        entity_type: &str,
        dimension: &str,
        at: Vec3,
    ) -> Result<(), HostError>;
    /// Returns true if a proxy was removed
    fn despawn_proxy(&mut self, owner: &str) -> bool;
    fn teleport_proxy(&mut self, owner: &str, dimension: &str, at: Vec3) -> Result<(), HostError>;
    /// Whether the proxy's container has been filled from the loadout
    fn is_loaded(&self, owner: &str) -> bool;
    fn mark_loaded(&mut self, owner: &str);
    fn container(&mut self, owner: &str) -> Option<&mut dyn Container>;
}

/// Give an item back to a player, dropping it when the inventory is full.
/// Returns true if it went into the inventory.
pub fn return_item(player: &mut impl PlayerHost, item: ItemStack) -> bool {
    match player.give_item(item) {
        Ok(()) => true,
        Err(item) => {
            let type_id = item.type_id.clone();
            if let Err(e) = player.drop_item(item) {
                tracing::warn!("Could not drop {type_id} for {}: {e}", player.id());
            }
            false
        }
    }
}
