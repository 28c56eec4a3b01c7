//! trinket_sim - A headless session against in-memory hosts
//!
//! The session shows:
//! - A contributor registering trinkets over the message channel and waiting for the acknowledgement
//! - Equipping from the hand and through the proxy container
//! - Stat recomputation, staggered events, mana and extra jumps over a 200-tick session
//! - Natural chest loot, player-placed chests and mob drops
//!
//! Usage: `trinket_sim [config.toml] [registrations.json]`

use loot_core::memory::{GridBlocks, MemoryContainer, MemorySpawner, MemoryStore};
use loot_core::{ChestResolution, Container, DeadEntity, CHEST_BLOCK};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::error::Error;
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use trinket_core::handshake::{DependencyWatch, WatchNotice};
use trinket_core::host::memory::{MemoryPlayer, MemoryProxyHost};
use trinket_core::prelude::*;
use trinket_core::runtime::{ACK_CHANNEL, REGISTER_CHANNEL, UPDATE_EFFECTS_CHANNEL};
use trinket_core::{SlotTick, StatCache};

const DEFAULT_PAYLOAD: &str = include_str!("../data/trinkets.json");
const CONFIG_PATHS: [&str; 2] = ["trinket_sim/config/sim.toml", "config/sim.toml"];
const SEED: u64 = 7;
const SESSION_TICKS: u64 = 200;

/// Config from the first argument, else the first default path that exists, else built-ins
fn load_config(arg: Option<&str>) -> Result<CoreConfig, Box<dyn Error>> {
    if let Some(path) = arg {
        return Ok(CoreConfig::load(Path::new(path))?);
    }
    for path in CONFIG_PATHS {
        let path = Path::new(path);
        if path.exists() {
            return Ok(CoreConfig::load(path)?);
        }
    }
    Ok(CoreConfig::default())
}

fn init_logging(config: &CoreConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Route runtime output the way a host would: acknowledgements go to the
/// contributor's watch, anything else is logged.
fn deliver(outbound: Vec<Outbound>, watch: &mut DependencyWatch, world: &mut MemoryStore, now: u64) {
    for Outbound { channel, body } in outbound {
        if channel != ACK_CHANNEL {
            info!("[{channel}] {body}");
            continue;
        }
        match serde_json::from_str::<Acknowledgement>(&body) {
            Ok(ack) => watch.on_ack(&ack, world, now),
            Err(e) => warn!("Unreadable acknowledgement '{body}': {e}"),
        }
    }
}

fn print_sheet(label: &str, player: &MemoryPlayer) {
    let sheet = StatCache::load_or_default(player);
    println!("== {label} ==");
    for stat in StatName::all() {
        println!("  {:<16} {}", stat.as_str(), sheet.stat(*stat));
    }
    if !sheet.passives.is_empty() {
        println!("  passives         {:?}", sheet.passives);
    }
    if !sheet.actives.is_empty() {
        println!("  actives          {:?}", sheet.actives);
    }
    if !sheet.immunities.is_empty() {
        println!("  immunities       {:?}", sheet.immunities);
    }
}

/// A desert pyramid chamber around `center`, with the chest itself at the center
fn pyramid_blocks(center: BlockPos) -> GridBlocks {
    let mut blocks = GridBlocks::default();
    blocks.fill_row(center.offset((0, 0, 1), 2), "minecraft:chiseled_sandstone", 2);
    blocks.fill_row(center.offset((0, -1, 0), 2), "minecraft:tnt", 3);
    blocks.set(center, CHEST_BLOCK);
    blocks
}

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = load_config(args.first().map(String::as_str))?;
    init_logging(&config);

    let payload = match args.get(1) {
        Some(path) => fs::read_to_string(path)?,
        None => DEFAULT_PAYLOAD.to_string(),
    };

    let mut rng = ChaCha8Rng::seed_from_u64(SEED);
    let mut world = MemoryStore::default();
    let mut proxies = MemoryProxyHost::default();
    let mut spawner = MemorySpawner::default();
    let mut players = vec![MemoryPlayer::new("steve")];
    let mut runtime = TrinketRuntime::new(config.clone());

    // Contributor side: send the records and wait for the reply
    let mut watch = DependencyWatch::start(&config.handshake, &world, 0);
    let replies = runtime.on_message(0, REGISTER_CHANNEL, &payload, &mut players, &mut world);
    deliver(replies, &mut watch, &mut world, 0);

    runtime.on_world_load(&world);
    runtime.on_player_spawn(0, &mut players[0]);
    print_sheet("spawned", &players[0]);

    // Equip from the hand; the second ring is refused and handed back
    for item in ["trinkets:ruby_ring", "trinkets:antidote_charm", "trinkets:sapphire_ring"] {
        players[0].hold(ItemStack::single(item));
        let outcome = runtime.on_item_use(1, &mut players[0], &mut proxies, item);
        println!("use {item}: {outcome:?}");
    }

    // Open the trinket inventory and drop two more items into it
    players[0].hold(ItemStack::single(config.trinkets.activation_item.as_str()));
    for now in 2..4 {
        runtime.tick_player(now, &mut players[0], &mut proxies);
    }
    if let Some(proxy) = proxies.proxy_mut("steve") {
        proxy.container.set_item(0, Some(ItemStack::single("trinkets:feather_charm")));
        proxy.container.set_item(1, Some(ItemStack::single("trinkets:nether_talisman")));
    }

    let poison_blocked = runtime.on_effect_added(&players[0], "minecraft:poison");
    println!("poison blocked: {poison_blocked}");

    for now in 4..SESSION_TICKS {
        if now == 60 {
            players[0].on_ground = false;
            players[0].falling = true;
            players[0].jumping = true;
        }
        if now == 61 {
            players[0].on_ground = true;
            players[0].falling = false;
            players[0].jumping = false;
        }
        if let Some(SlotTick::Validated(report)) = runtime.tick_player(now, &mut players[0], &mut proxies) {
            if report.changed() {
                println!("tick {now}: {report:?}");
            }
        }
        runtime.drain_deferred(now, &mut players);
        if let Some(WatchNotice::Missing(text) | WatchNotice::Confirmed(text)) = watch.tick(now) {
            println!("[chat] {text}");
        }
    }
    print_sheet("after session", &players[0]);
    println!("events fired: {:?}", players[0].events);
    println!("extra jump knockbacks: {}", players[0].knockbacks.len());
    println!("action bar: {:?}", players[0].action_bar);

    let replies = runtime.on_message(SESSION_TICKS, UPDATE_EFFECTS_CHANNEL, "steve", &mut players, &mut world);
    deliver(replies, &mut watch, &mut world, SESSION_TICKS);

    // A natural chest in a desert pyramid, then one the player placed
    let center = BlockPos::new(40, 60, -120);
    let blocks = pyramid_blocks(center);
    let mut chest = MemoryContainer::new(27).with_item(0, ItemStack::new("minecraft:bone", 3));
    let site = ChestSite {
        pos: center,
        dimension_id: "minecraft:overworld",
        biome_id: "minecraft:desert",
    };
    match runtime.on_block_interact(
        CHEST_BLOCK,
        site,
        &blocks,
        &mut world,
        Some(&mut chest as &mut dyn Container),
        &mut rng,
    ) {
        Some(ChestResolution::Resolved {
            structure,
            placements,
        }) => println!("chest at {center} in {structure}: {placements:?}"),
        other => println!("chest at {center}: {other:?}"),
    }

    let placed = BlockPos::new(41, 60, -120);
    runtime.on_block_place(CHEST_BLOCK, placed, &mut world);
    let placed_site = ChestSite { pos: placed, ..site };
    let outcome = runtime.on_block_interact(CHEST_BLOCK, placed_site, &blocks, &mut world, None, &mut rng);
    println!("placed chest: {outcome:?}");

    // A spider killed by the player
    let spider = DeadEntity {
        type_id: "minecraft:spider".to_string(),
        dimension: Some("minecraft:overworld".to_string()),
        location: Some(Vec3::new(12.0, 64.0, 3.0)),
    };
    let drops = runtime.on_entity_death(&spider, Some(&players[0]), &mut spawner, &mut rng);
    println!("spider drops: {drops:?}");

    // Recover scroll hands everything back
    let recover = config.trinkets.recover_item.clone();
    players[0].hold(ItemStack::single(recover.as_str()));
    let recovered = runtime.on_item_use(SESSION_TICKS + 1, &mut players[0], &mut proxies, &recover);
    println!("recover: {recovered:?}");
    print_sheet("after recover", &players[0]);

    Ok(())
}
