//! Host event routing
//!
//! `TrinketRuntime` owns the registry, the configuration and the deferred
//! queue, and exposes one entry point per host event. Hosts pass in the
//! current tick and the entities involved; nothing here reads ambient state.

use crate::applicator::{Applicator, ManaState};
use crate::cache::{EquipmentSignature, StatCache};
use crate::config::CoreConfig;
use crate::host::{PlayerHost, ProxyHost};
use crate::immunity::{blocks_effect, sweep_immune_effects};
use crate::jumps::tick_extra_jumps;
use crate::registry::{RegistrationReport, Registry};
use crate::scheduler::DeferredQueue;
use crate::sheet::{resolve, ResolvedStatSheet};
use crate::slots::{EquipOutcome, SlotLoadout, SlotTick, TrinketSlotManager};
use crate::types::StatName;
use loot_core::{
    BlockPos, BlockSource, ChestLootInjector, ChestResolution, ChestSite, Container, DeadEntity,
    ItemSpawner, ItemStack, WorldStore, CHEST_BLOCK,
};
use rand::Rng;
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Contributors send their JSON records here
pub const REGISTER_CHANNEL: &str = "trinkets:register_stat_data";
/// `{"registered": bool}` replies go out here
pub const ACK_CHANNEL: &str = "trinkets:stat_data_registered";
/// Force a recompute for the named player, or everyone when the body is empty
pub const UPDATE_STATS_CHANNEL: &str = "trinkets:update_stats";
/// Clear effects the named player (or everyone) is immune to
pub const UPDATE_EFFECTS_CHANNEL: &str = "trinkets:update_effects";
pub const RESET_CHESTS_CHANNEL: &str = "trinkets:reset_chest_tracking";

/// A message the host should send on the runtime's behalf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub channel: String,
    pub body: String,
}

/// Result of an item-use event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemUse {
    /// The recover item was used; these trinkets were handed back
    Recovered(Vec<String>),
    Equip(EquipOutcome),
}

#[derive(Debug, Default)]
struct PlayerSession {
    ticks: u64,
    signature: Option<EquipmentSignature>,
}

pub struct TrinketRuntime {
    config: CoreConfig,
    registry: Registry,
    injector: ChestLootInjector,
    queue: DeferredQueue,
    sessions: HashMap<String, PlayerSession>,
}

impl TrinketRuntime {
    pub fn new(config: CoreConfig) -> Self {
        let registry = Registry::new(&config.loot);
        Self::with_registry(config, registry)
    }

    /// Start from an already populated registry
    pub fn with_registry(config: CoreConfig, registry: Registry) -> Self {
        let injector = ChestLootInjector::new(&config.loot);
        TrinketRuntime {
            config,
            registry,
            injector,
            queue: DeferredQueue::new(),
            sessions: HashMap::new(),
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn pending_deferred(&self) -> usize {
        self.queue.len()
    }

    pub fn on_world_load(&self, store: &impl WorldStore) {
        info!(
            "Trinket runtime ready: {} registered items, {} stored world keys",
            self.registry.len(),
            store.keys().len()
        );
    }

    /// Start a fresh session and push the player's current stats
    pub fn on_player_spawn(&mut self, now: u64, player: &mut impl PlayerHost) -> ResolvedStatSheet {
        self.sessions
            .insert(player.id().to_string(), PlayerSession::default());
        self.refresh(now, player)
    }

    pub fn on_player_leave(&mut self, player_id: &str) {
        self.sessions.remove(player_id);
        self.queue.cancel_player(player_id);
    }

    /// Resolve from the loadout, persist, and push to the host
    pub fn recompute(&mut self, now: u64, player: &mut impl PlayerHost) -> ResolvedStatSheet {
        let loadout = SlotLoadout::load(&*player);
        let sheet = resolve(loadout.item_ids(), &self.registry, &self.config);
        if let Err(e) = StatCache::save(player, &sheet) {
            warn!("Could not store stats for {}: {e}", player.id());
        }

        let applicator = Applicator::new(&self.config.applicator);
        applicator.apply_stats(player, &sheet, &mut self.queue, now);
        applicator.apply_passives(player, &sheet.passives);
        debug!("Recomputed stats for {} from {} trinkets", player.id(), loadout.len());
        sheet
    }

    /// Recompute and remember the signature it was computed for
    fn refresh(&mut self, now: u64, player: &mut impl PlayerHost) -> ResolvedStatSheet {
        let sheet = self.recompute(now, player);
        let signature = EquipmentSignature::capture(&*player);
        if let Some(session) = self.sessions.get_mut(player.id()) {
            session.signature = Some(signature);
        }
        sheet
    }

    /// Per-player periodic work. Slots and extra jumps run every tick; the
    /// signature check, passive refresh and mana run on their own cadences.
    /// Invalid players are skipped.
    pub fn tick_player(
        &mut self,
        now: u64,
        player: &mut impl PlayerHost,
        proxies: &mut impl ProxyHost,
    ) -> Option<SlotTick> {
        if !player.is_valid() {
            return None;
        }

        let session = self.sessions.entry(player.id().to_string()).or_default();
        let ticks = session.ticks;
        session.ticks += 1;

        let slot_tick = TrinketSlotManager::new(&self.config.trinkets, &self.registry).tick(player, proxies);

        let intervals = &self.config.applicator;
        let check_signature = ticks % intervals.signature_check_interval == 0;
        let refresh_passives = ticks % intervals.passive_refresh_interval == 0;
        let tick_mana = ticks % intervals.mana_tick_interval == 0;

        let mut sheet = None;
        if check_signature {
            let signature = EquipmentSignature::capture(&*player);
            let changed = self
                .sessions
                .get(player.id())
                .map_or(true, |s| s.signature.as_ref() != Some(&signature));
            if changed {
                sheet = Some(self.refresh(now, player));
            }
        }
        let sheet = sheet.unwrap_or_else(|| StatCache::load_or_default(&*player));

        let applicator = Applicator::new(&self.config.applicator);
        if refresh_passives {
            applicator.apply_passives(player, &sheet.passives);
        }
        if tick_mana {
            applicator.tick_mana(player, &sheet);
        }
        tick_extra_jumps(
            player,
            sheet.stat(StatName::ExtraJumps),
            self.config.trinkets.extra_jump_strength,
        );

        Some(slot_tick)
    }

    /// Regenerate mana outside the normal cadence
    pub fn tick_mana(&self, player: &mut impl PlayerHost) -> ManaState {
        let sheet = StatCache::load_or_default(&*player);
        Applicator::new(&self.config.applicator).tick_mana(player, &sheet)
    }

    /// Fire every deferred event due at `now`. Events for players not in
    /// `players` (or no longer valid) are dropped. Returns the number fired.
    pub fn drain_deferred<P: PlayerHost>(&mut self, now: u64, players: &mut [P]) -> usize {
        let mut fired = 0;
        for deferred in self.queue.drain_due(now) {
            let id = deferred.player_id;
            let event = deferred.event;
            let Some(player) = players.iter_mut().find(|p| p.id() == id && p.is_valid()) else {
                debug!("Dropping {event} for absent player {id}");
                continue;
            };
            match player.trigger_event(&event) {
                Ok(()) => fired += 1,
                Err(e) => warn!("Could not trigger {event} on {id}: {e}"),
            }
        }
        fired
    }

    /// Equipment changed: recompute now instead of waiting for the signature check
    pub fn on_equipment_change(&mut self, now: u64, player: &mut impl PlayerHost) -> ResolvedStatSheet {
        self.sessions.entry(player.id().to_string()).or_default();
        self.refresh(now, player)
    }

    pub fn on_item_use(
        &mut self,
        now: u64,
        player: &mut impl PlayerHost,
        proxies: &mut impl ProxyHost,
        item_id: &str,
    ) -> ItemUse {
        let manager = TrinketSlotManager::new(&self.config.trinkets, &self.registry);
        let outcome = if item_id == self.config.trinkets.recover_item {
            ItemUse::Recovered(manager.unequip_all(player, proxies))
        } else {
            ItemUse::Equip(manager.try_equip(player, proxies, item_id))
        };

        let changed = match &outcome {
            ItemUse::Recovered(items) => !items.is_empty(),
            ItemUse::Equip(EquipOutcome::Equipped(_)) => true,
            ItemUse::Equip(_) => false,
        };
        if changed {
            self.refresh(now, player);
        }
        outcome
    }

    /// Whether an effect about to be added should be cancelled
    pub fn on_effect_added(&self, player: &impl PlayerHost, effect_id: &str) -> bool {
        let cancel = blocks_effect(player, effect_id);
        if cancel {
            debug!("Blocked {effect_id} on immune player {}", player.id());
        }
        cancel
    }

    /// Resolve loot for a chest the first time anyone interacts with it.
    /// Other blocks return `None`.
    #[allow(clippy::too_many_arguments)]
    pub fn on_block_interact<R: Rng + ?Sized>(
        &self,
        block_id: &str,
        site: ChestSite<'_>,
        blocks: &(impl BlockSource + ?Sized),
        store: &mut impl WorldStore,
        container: Option<&mut dyn Container>,
        rng: &mut R,
    ) -> Option<ChestResolution> {
        if block_id != CHEST_BLOCK {
            return None;
        }
        let loot = self.registry.loot();
        Some(self.injector.resolve(
            site,
            &loot.tables,
            &loot.structures,
            blocks,
            store,
            container,
            rng,
        ))
    }

    /// Player-placed chests never receive loot
    pub fn on_block_place(&self, block_id: &str, pos: BlockPos, store: &mut impl WorldStore) {
        if block_id != CHEST_BLOCK {
            return;
        }
        if let Err(e) = self.injector.ledger().mark_placed(store, pos) {
            warn!("Could not mark placed chest {pos}: {e}");
        }
    }

    pub fn on_piston(
        &self,
        store: &mut impl WorldStore,
        attached: &[BlockPos],
        facing: u8,
        extending: bool,
    ) -> usize {
        self.injector
            .ledger()
            .propagate_piston(store, attached, facing, extending)
            .unwrap_or_else(|e| {
                warn!("Piston ledger update failed: {e}");
                0
            })
    }

    /// Roll mob drops. Only deaths caused by a player drop anything.
    pub fn on_entity_death<P, R>(
        &self,
        dead: &DeadEntity,
        killer: Option<&P>,
        spawner: &mut impl ItemSpawner,
        rng: &mut R,
    ) -> Vec<ItemStack>
    where
        P: PlayerHost,
        R: Rng + ?Sized,
    {
        let Some(killer) = killer else {
            return Vec::new();
        };
        self.registry
            .loot()
            .mob_drops
            .resolve(dead, killer.dimension(), killer.location(), spawner, rng)
    }

    /// Handle a cross-system message. Player-directed channels take the
    /// player id as body; an empty body addresses every player given.
    pub fn on_message<P: PlayerHost>(
        &mut self,
        now: u64,
        channel: &str,
        body: &str,
        players: &mut [P],
        store: &mut impl WorldStore,
    ) -> Vec<Outbound> {
        match channel {
            REGISTER_CHANNEL => {
                let report = self.registry.register_payload(body);
                self.acknowledge(&report).into_iter().collect()
            }
            UPDATE_STATS_CHANNEL => {
                for player in addressed(players, body) {
                    self.refresh(now, player);
                }
                Vec::new()
            }
            UPDATE_EFFECTS_CHANNEL => {
                for player in addressed(players, body) {
                    let removed = sweep_immune_effects(player);
                    debug!("Cleared {removed} immune effects from {}", player.id());
                }
                Vec::new()
            }
            RESET_CHESTS_CHANNEL => {
                self.injector.ledger().reset_all(store);
                Vec::new()
            }
            _ => {
                debug!("Ignoring message on {channel}");
                Vec::new()
            }
        }
    }

    fn acknowledge(&self, report: &RegistrationReport) -> Option<Outbound> {
        match serde_json::to_string(&report.acknowledgement()) {
            Ok(body) => Some(Outbound {
                channel: ACK_CHANNEL.to_string(),
                body,
            }),
            Err(e) => {
                warn!("Could not encode registration acknowledgement: {e}");
                None
            }
        }
    }
}

fn addressed<'a, P: PlayerHost>(players: &'a mut [P], body: &'a str) -> impl Iterator<Item = &'a mut P> {
    let target = body.trim();
    players
        .iter_mut()
        .filter(move |p| p.is_valid() && (target.is_empty() || p.id() == target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::{MemoryPlayer, MemoryProxyHost};
    use crate::host::EntityStore;
    use crate::registry::ContributionRecord;
    use crate::types::TrinketSlot;
    use loot_core::memory::{MemoryContainer, MemorySpawner, MemoryStore};
    use loot_core::{MobDrop, Vec3};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const PAYLOAD: &str = r#"{
        "trinkets:speed_ring": {
            "trinket": "ring",
            "stats": {"speed": 20},
            "passives": {"minecraft:night_vision": 1}
        },
        "trinkets:antidote": {
            "trinket": "charm",
            "immunities": ["minecraft:poison"]
        }
    }"#;

    fn runtime() -> TrinketRuntime {
        let mut runtime = TrinketRuntime::new(CoreConfig::default());
        let mut store = MemoryStore::default();
        let replies = runtime.on_message::<MemoryPlayer>(0, REGISTER_CHANNEL, PAYLOAD, &mut [], &mut store);
        assert_eq!(
            replies,
            vec![Outbound {
                channel: ACK_CHANNEL.to_string(),
                body: r#"{"registered":true}"#.to_string(),
            }]
        );
        runtime
    }

    #[test]
    fn test_bad_payload_is_refused() {
        let mut runtime = TrinketRuntime::new(CoreConfig::default());
        let mut store = MemoryStore::default();
        let replies = runtime.on_message::<MemoryPlayer>(0, REGISTER_CHANNEL, "not json", &mut [], &mut store);
        assert_eq!(
            replies,
            vec![Outbound {
                channel: ACK_CHANNEL.to_string(),
                body: r#"{"registered":false}"#.to_string(),
            }]
        );
    }

    #[test]
    fn test_equip_recomputes_and_staggers_events() {
        let mut runtime = runtime();
        let mut proxies = MemoryProxyHost::default();
        let mut player = MemoryPlayer::new("p");

        player.hold(ItemStack::single("trinkets:speed_ring"));
        let outcome = runtime.on_item_use(100, &mut player, &mut proxies, "trinkets:speed_ring");
        assert_eq!(outcome, ItemUse::Equip(EquipOutcome::Equipped(TrinketSlot::Ring)));

        let sheet = StatCache::load(&player).unwrap();
        assert_eq!(sheet.stat(StatName::Speed), 120.0);
        assert!((player.movement["minecraft:movement"] - 0.12).abs() < 1e-9);
        assert!(player.effects.contains_key("minecraft:night_vision"));

        let mut players = vec![player];
        assert_eq!(runtime.drain_deferred(100, &mut players), 1);
        assert_eq!(players[0].events, vec!["minecraft:health20".to_string()]);
        assert_eq!(runtime.drain_deferred(102, &mut players), 2);
        assert_eq!(players[0].events.len(), 3);
        assert_eq!(runtime.pending_deferred(), 0);
    }

    #[test]
    fn test_recover_item_unequips() {
        let mut runtime = runtime();
        let mut proxies = MemoryProxyHost::default();
        let mut player = MemoryPlayer::new("p");
        player.hold(ItemStack::single("trinkets:speed_ring"));
        runtime.on_item_use(0, &mut player, &mut proxies, "trinkets:speed_ring");

        player.hold(ItemStack::single("trinkets:recover_scroll"));
        let outcome = runtime.on_item_use(10, &mut player, &mut proxies, "trinkets:recover_scroll");
        assert_eq!(outcome, ItemUse::Recovered(vec!["trinkets:speed_ring".to_string()]));
        assert_eq!(StatCache::load(&player).unwrap().stat(StatName::Speed), 100.0);
        assert_eq!(player.count_item("trinkets:recover_scroll"), 1);
    }

    #[test]
    fn test_signature_change_triggers_recompute() {
        let mut runtime = runtime();
        let mut proxies = MemoryProxyHost::default();
        let mut player = MemoryPlayer::new("p");
        runtime.on_player_spawn(0, &mut player);
        runtime.tick_player(0, &mut player, &mut proxies);
        assert_eq!(StatCache::load(&player).unwrap().stat(StatName::Speed), 100.0);

        // Equipped outside the runtime; only the signature check notices
        let mut loadout = SlotLoadout::default();
        loadout.set(TrinketSlot::Ring, "trinkets:speed_ring");
        loadout.save(&mut player).unwrap();
        player.tags.push("trinkets:speed_ring".to_string());

        for now in 1..20 {
            runtime.tick_player(now, &mut player, &mut proxies);
        }
        assert_eq!(StatCache::load(&player).unwrap().stat(StatName::Speed), 100.0);
        runtime.tick_player(20, &mut player, &mut proxies);
        assert_eq!(StatCache::load(&player).unwrap().stat(StatName::Speed), 120.0);
    }

    #[test]
    fn test_invalid_player_is_skipped() {
        let mut runtime = runtime();
        let mut proxies = MemoryProxyHost::default();
        let mut player = MemoryPlayer::new("p");
        player.valid = false;
        assert!(runtime.tick_player(0, &mut player, &mut proxies).is_none());
        assert!(player.properties.is_empty());
    }

    #[test]
    fn test_effect_gate_and_sweep() {
        let mut runtime = runtime();
        let mut proxies = MemoryProxyHost::default();
        let mut store = MemoryStore::default();
        let mut player = MemoryPlayer::new("p");
        player.hold(ItemStack::single("trinkets:antidote"));
        runtime.on_item_use(0, &mut player, &mut proxies, "trinkets:antidote");

        assert!(runtime.on_effect_added(&player, "minecraft:poison"));
        assert!(!runtime.on_effect_added(&player, "minecraft:speed"));

        player.add_effect("minecraft:poison", 100, 0).unwrap();
        let mut players = vec![player];
        runtime.on_message(1, UPDATE_EFFECTS_CHANNEL, "", &mut players, &mut store);
        assert!(players[0].effects.get("minecraft:poison").is_none());
    }

    #[test]
    fn test_chest_events() {
        let mut runtime = runtime();
        let mut store = MemoryStore::default();
        let blocks = loot_core::memory::GridBlocks::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let pos = BlockPos::new(10, 64, 10);
        let site = ChestSite {
            pos,
            dimension_id: "minecraft:overworld",
            biome_id: "minecraft:plains",
        };

        assert!(runtime
            .on_block_interact("minecraft:barrel", site, &blocks, &mut store, None, &mut rng)
            .is_none());

        runtime.on_block_place(CHEST_BLOCK, pos, &mut store);
        let mut chest = MemoryContainer::new(27);
        let resolution = runtime.on_block_interact(
            CHEST_BLOCK,
            site,
            &blocks,
            &mut store,
            Some(&mut chest as &mut dyn Container),
            &mut rng,
        );
        assert_eq!(resolution, Some(ChestResolution::Skipped));

        let moved = runtime.on_piston(&mut store, &[pos], 5, true);
        assert_eq!(moved, 1);

        let replies = runtime.on_message::<MemoryPlayer>(0, RESET_CHESTS_CHANNEL, "", &mut [], &mut store);
        assert!(replies.is_empty());
        assert!(store.keys().is_empty());
    }

    #[test]
    fn test_entity_death_needs_player_killer() {
        let mut runtime = runtime();
        runtime.registry_mut().loot_mut().mob_drops.register(
            "minecraft:zombie",
            MobDrop {
                item: "trinkets:speed_ring".to_string(),
                amount: 1,
                chance: 1.0,
                conditions: None,
            },
        );
        let dead = DeadEntity {
            type_id: "minecraft:zombie".to_string(),
            dimension: Some("minecraft:overworld".to_string()),
            location: Some(Vec3::new(1.0, 64.0, 1.0)),
        };
        let mut spawner = MemorySpawner::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        assert!(runtime
            .on_entity_death::<MemoryPlayer, _>(&dead, None, &mut spawner, &mut rng)
            .is_empty());
        let killer = MemoryPlayer::new("p");
        let spawned = runtime.on_entity_death(&dead, Some(&killer), &mut spawner, &mut rng);
        assert_eq!(spawned, vec![ItemStack::single("trinkets:speed_ring")]);
        assert_eq!(spawner.spawned.len(), 1);
    }

    #[test]
    fn test_leave_cancels_pending_events() {
        let mut runtime = runtime();
        let mut player = MemoryPlayer::new("p");
        runtime.on_player_spawn(0, &mut player);
        assert_eq!(runtime.pending_deferred(), 3);
        runtime.on_player_leave("p");
        assert_eq!(runtime.pending_deferred(), 0);
        assert!(player.get_property("trinkets:player_data.stats").is_some());
    }
}
