//! Per-entity drop tables rolled on death

use crate::error::HostError;
use crate::types::{roll_chance, ItemStack, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Spawns item entities into the world
pub trait ItemSpawner {
    fn spawn_item(&mut self, dimension: &str, at: Vec3, item: ItemStack) -> Result<(), HostError>;
}

/// Optional filter on a mob drop
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DropCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
}

/// One registered drop for an entity type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MobDrop {
    pub item: String,
    pub amount: u32,
    pub chance: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<DropCondition>,
}

/// Snapshot of an entity at the moment it died. Position fields are `None`
/// when the host could no longer resolve them.
#[derive(Debug, Clone, PartialEq)]
pub struct DeadEntity {
    pub type_id: String,
    pub dimension: Option<String>,
    pub location: Option<Vec3>,
}

/// Drops indexed by entity type id. Registrations append.
#[derive(Debug, Clone, Default)]
pub struct MobDropTable {
    drops: HashMap<String, Vec<MobDrop>>,
}

impl MobDropTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entity_type: &str, drop: MobDrop) {
        self.drops.entry(entity_type.to_string()).or_default().push(drop);
    }

    pub fn drops_for(&self, entity_type: &str) -> &[MobDrop] {
        self.drops.get(entity_type).map(Vec::as_slice).unwrap_or_default()
    }

    /// Roll every drop registered for the dead entity's type and spawn the
    /// winners. Spawns fall back to the killer's position when the dead
    /// entity's position is gone or the host rejects it.
    /// Returns the stacks that were spawned.
    pub fn resolve<R: Rng + ?Sized>(
        &self,
        dead: &DeadEntity,
        killer_dimension: &str,
        killer_location: Vec3,
        spawner: &mut impl ItemSpawner,
        rng: &mut R,
    ) -> Vec<ItemStack> {
        let mut spawned = Vec::new();

        for drop in self.drops_for(&dead.type_id) {
            if let Some(DropCondition {
                dimension: Some(ref required),
            }) = drop.conditions
            {
                if dead.dimension.as_deref() != Some(required.as_str()) {
                    continue;
                }
            }

            if !roll_chance(rng, drop.chance) {
                continue;
            }

            let stack = ItemStack::new(drop.item.clone(), drop.amount);
            let at_corpse = match (dead.dimension.as_deref(), dead.location) {
                (Some(dimension), Some(location)) => {
                    spawner.spawn_item(dimension, location, stack.clone())
                }
                _ => Err(HostError::Unloaded),
            };

            let result = at_corpse.or_else(|_| {
                spawner.spawn_item(killer_dimension, killer_location, stack.clone())
            });

            match result {
                Ok(()) => spawned.push(stack),
                Err(e) => warn!("Could not spawn drop {} for {}: {e}", drop.item, dead.type_id),
            }
        }

        spawned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemorySpawner;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn drop(item: &str, chance: f64) -> MobDrop {
        MobDrop {
            item: item.to_string(),
            amount: 1,
            chance,
            conditions: None,
        }
    }

    fn zombie(dimension: Option<&str>, location: Option<Vec3>) -> DeadEntity {
        DeadEntity {
            type_id: "minecraft:zombie".to_string(),
            dimension: dimension.map(str::to_string),
            location,
        }
    }

    #[test]
    fn test_register_appends() {
        let mut table = MobDropTable::new();
        table.register("minecraft:zombie", drop("a", 0.5));
        table.register("minecraft:zombie", drop("a", 0.2));
        assert_eq!(table.drops_for("minecraft:zombie").len(), 2);
        assert!(table.drops_for("minecraft:skeleton").is_empty());
    }

    #[test]
    fn test_spawns_at_corpse() {
        let mut table = MobDropTable::new();
        table.register("minecraft:zombie", drop("heart", 1.0));
        let mut spawner = MemorySpawner::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let corpse = Vec3::new(1.0, 2.0, 3.0);

        let spawned = table.resolve(
            &zombie(Some("minecraft:overworld"), Some(corpse)),
            "minecraft:overworld",
            Vec3::new(9.0, 9.0, 9.0),
            &mut spawner,
            &mut rng,
        );
        assert_eq!(spawned, vec![ItemStack::single("heart")]);
        assert_eq!(spawner.spawned[0].1, corpse);
    }

    #[test]
    fn test_falls_back_to_killer() {
        let mut table = MobDropTable::new();
        table.register("minecraft:zombie", drop("heart", 1.0));
        let mut spawner = MemorySpawner::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let killer = Vec3::new(9.0, 9.0, 9.0);

        table.resolve(&zombie(None, None), "minecraft:overworld", killer, &mut spawner, &mut rng);
        assert_eq!(spawner.spawned.len(), 1);
        assert_eq!(spawner.spawned[0].1, killer);

        spawner.spawned.clear();
        spawner.unloaded.push("minecraft:the_end".to_string());
        table.resolve(
            &zombie(Some("minecraft:the_end"), Some(Vec3::new(0.0, 0.0, 0.0))),
            "minecraft:overworld",
            killer,
            &mut spawner,
            &mut rng,
        );
        assert_eq!(spawner.spawned[0].0, "minecraft:overworld");
    }

    #[test]
    fn test_dimension_condition() {
        let mut table = MobDropTable::new();
        table.register(
            "minecraft:zombie",
            MobDrop {
                conditions: Some(DropCondition {
                    dimension: Some("minecraft:nether".to_string()),
                }),
                ..drop("ember", 1.0)
            },
        );
        let mut spawner = MemorySpawner::default();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let at = Vec3::new(0.0, 64.0, 0.0);

        let spawned = table.resolve(
            &zombie(Some("minecraft:overworld"), Some(at)),
            "minecraft:overworld",
            at,
            &mut spawner,
            &mut rng,
        );
        assert!(spawned.is_empty());

        let spawned = table.resolve(
            &zombie(Some("minecraft:nether"), Some(at)),
            "minecraft:nether",
            at,
            &mut spawner,
            &mut rng,
        );
        assert_eq!(spawned.len(), 1);
    }
}
