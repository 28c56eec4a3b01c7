//! Effect immunities: blocking new effects and clearing active ones

use crate::cache::StatCache;
use crate::host::PlayerHost;
use crate::registry::ContributionRecord;
use crate::types::canonical_effect_name;
use tracing::warn;

/// Whether an effect about to be added to this player should be cancelled
pub fn blocks_effect(player: &impl PlayerHost, effect_id: &str) -> bool {
    StatCache::immunities(player).contains(&canonical_effect_name(effect_id))
}

/// Remove every active effect matching `is_immune`. A rejected removal is
/// logged and the sweep continues. Returns the number removed.
fn remove_matching(player: &mut impl PlayerHost, is_immune: impl Fn(&str) -> bool) -> usize {
    let mut removed = 0;
    for effect in player.effects() {
        if !is_immune(&canonical_effect_name(&effect.type_id)) {
            continue;
        }
        match player.remove_effect(&effect.type_id) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to remove effect '{}' from {}: {e}", effect.type_id, player.id()),
        }
    }
    removed
}

/// Clear every active effect covered by the player's persisted immunities
pub fn sweep_immune_effects(player: &mut impl PlayerHost) -> usize {
    let immunities = StatCache::immunities(&*player);
    if immunities.is_empty() {
        return 0;
    }
    remove_matching(player, |name| immunities.contains(name))
}

/// Clear active effects that one item declares immunity to
pub fn clear_declared_immunities(player: &mut impl PlayerHost, record: &ContributionRecord) -> usize {
    if record.immunities.is_empty() {
        return 0;
    }
    remove_matching(player, |name| record.immunities.iter().any(|i| i == name))
}
