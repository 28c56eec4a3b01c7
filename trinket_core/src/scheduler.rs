//! Deferred host pushes, staggered across ticks

use std::collections::BTreeMap;

/// A named trigger event to fire on a player at tick `due`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deferred {
    pub due: u64,
    pub player_id: String,
    pub event: String,
}

/// Events waiting for their tick. Same-tick actions drain in scheduling order.
#[derive(Debug, Clone, Default)]
pub struct DeferredQueue {
    pending: BTreeMap<(u64, u64), Deferred>,
    next_seq: u64,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: u64, player_id: impl Into<String>, event: impl Into<String>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.insert(
            (due, seq),
            Deferred {
                due,
                player_id: player_id.into(),
                event: event.into(),
            },
        );
    }

    /// Remove and return every event due at or before `now`
    pub fn drain_due(&mut self, now: u64) -> Vec<Deferred> {
        let due = match now.checked_add(1) {
            Some(next) => {
                let later = self.pending.split_off(&(next, 0));
                std::mem::replace(&mut self.pending, later)
            }
            None => std::mem::take(&mut self.pending),
        };
        due.into_values().collect()
    }

    /// Drop everything addressed to a player that is gone
    pub fn cancel_player(&mut self, player_id: &str) {
        self.pending
            .retain(|_, d| d.player_id != player_id);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
