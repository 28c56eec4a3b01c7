//! Pushes a resolved sheet into host primitives

use crate::cache::{load_versioned, save_versioned};
use crate::config::ApplicatorConfig;
use crate::host::PlayerHost;
use crate::scheduler::DeferredQueue;
use crate::sheet::ResolvedStatSheet;
use crate::types::{GameMode, StatName};
use loot_core::HostError;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Per-player mana pool
pub const MANA_KEY: &str = "trinkets:mana";

/// Mana after a regeneration tick and the bar frame shown for it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManaState {
    pub mana: f64,
    pub frame: usize,
}

/// `floor(clamp(mana / max, 0, 1) * (frames - 1))`
pub fn mana_frame_index(mana: f64, max: f64, frames: usize) -> usize {
    if frames == 0 || max <= 0.0 || !mana.is_finite() {
        return 0;
    }
    let ratio = (mana / max).clamp(0.0, 1.0);
    (ratio * (frames - 1) as f64).floor() as usize
}

pub struct Applicator<'a> {
    config: &'a ApplicatorConfig,
}

impl<'a> Applicator<'a> {
    pub fn new(config: &'a ApplicatorConfig) -> Self {
        Applicator { config }
    }

    /// Set movement attributes now and queue one trigger event per event
    /// stat, one tick apart starting at `now`. Returns the events queued.
    pub fn apply_stats(
        &self,
        player: &mut impl PlayerHost,
        sheet: &ResolvedStatSheet,
        queue: &mut DeferredQueue,
        now: u64,
    ) -> usize {
        for (offset, stat) in self.config.event_stats.iter().enumerate() {
            let event = format!("minecraft:{}{}", stat.as_str(), sheet.stat_int(*stat));
            queue.schedule(now + offset as u64, player.id(), event);
        }

        for binding in &self.config.movement {
            let value = sheet.stat(binding.stat) / 100.0 * binding.coefficient;
            match player.set_movement(&binding.component, value) {
                Ok(()) => {}
                Err(HostError::MissingComponent(component)) => {
                    debug!("{} has no {component}, skipping", player.id());
                }
                Err(e) => warn!("Could not set {} on {}: {e}", binding.component, player.id()),
            }
        }

        self.config.event_stats.len()
    }

    /// Refresh every passive effect. Levels below 1 are skipped; a rejected
    /// effect does not stop the rest. Returns the number applied.
    pub fn apply_passives(&self, player: &mut impl PlayerHost, passives: &BTreeMap<String, i32>) -> usize {
        let mut applied = 0;
        for (effect, level) in passives {
            if *level < 1 {
                continue;
            }
            let amplifier = (*level - 1) as u32;
            match player.add_effect(effect, self.config.passive_duration, amplifier) {
                Ok(()) => applied += 1,
                Err(e) => warn!("Error applying effect '{effect}' to {}: {e}", player.id()),
            }
        }
        applied
    }

    /// Regenerate mana toward the sheet's maximum and redraw the bar
    pub fn tick_mana(&self, player: &mut impl PlayerHost, sheet: &ResolvedStatSheet) -> ManaState {
        let max = sheet.stat(StatName::Mana);
        let stored: Option<f64> = load_versioned(&*player, MANA_KEY).unwrap_or_else(|e| {
            warn!("Resetting unreadable mana for {}: {e}", player.id());
            Some(0.0)
        });
        let mut mana = match stored {
            None => max,
            Some(m) if m.is_finite() && m >= 0.0 => m,
            Some(_) => 0.0,
        };

        let regen = (sheet.stat(StatName::ManaRegen) / 5.0).min(max - mana);
        mana += regen;

        if let Err(e) = save_versioned(player, MANA_KEY, &mana) {
            warn!("Could not store mana for {}: {e}", player.id());
        }

        let frame = mana_frame_index(mana, max, self.config.mana_bar_frames.len());
        if player.game_mode() == GameMode::Survival {
            if let Some(glyph) = self.config.mana_bar_frames.get(frame) {
                let text = format!("{}{glyph}", self.config.action_bar_padding);
                if let Err(e) = player.set_action_bar(&text) {
                    debug!("Action bar unavailable for {}: {e}", player.id());
                }
            }
        }

        ManaState { mana, frame }
    }
}
