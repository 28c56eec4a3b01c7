//! Mid-air extra jumps

use crate::cache::{load_versioned, save_versioned};
use crate::host::PlayerHost;
use tracing::warn;

/// Jumps left before the player lands again
pub const EXTRA_JUMPS_KEY: &str = "trinkets:extra_jumps";

/// Advance the extra-jump counter for one tick. Does nothing unless the
/// sheet grants jumps. Returns true if a jump was performed.
pub fn tick_extra_jumps(player: &mut impl PlayerHost, extra_jumps: f64, strength: f64) -> bool {
    if extra_jumps <= 0.0 {
        return false;
    }

    let mut jumps: u32 = load_versioned(&*player, EXTRA_JUMPS_KEY).unwrap_or_else(|e| {
        warn!("Resetting unreadable jump counter for {}: {e}", player.id());
        0
    });

    let mut jumped = false;
    if player.is_falling() && player.is_jumping() && jumps > 0 {
        let velocity = player.velocity();
        player.apply_knockback(velocity.x, velocity.z, strength);
        jumps -= 1;
        jumped = true;
    }
    if player.is_on_ground() {
        jumps = extra_jumps.floor() as u32;
    }

    if let Err(e) = save_versioned(player, EXTRA_JUMPS_KEY, &jumps) {
        warn!("Could not store jump counter for {}: {e}", player.id());
    }
    jumped
}
