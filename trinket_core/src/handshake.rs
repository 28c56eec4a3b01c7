//! Contributor side of the registration handshake

use crate::config::HandshakeConfig;
use crate::registry::Acknowledgement;
use loot_core::WorldStore;
use tracing::{info, warn};

/// World key set once registration has been confirmed
pub const REGISTRATION_MARKER: &str = "trinkets:registration_complete";

/// Text the contributor should show to players
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchNotice {
    Missing(String),
    Confirmed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchState {
    Waiting { next_warning: u64, warnings_left: u8 },
    Confirmed { notice_at: u64 },
    Settled,
}

/// Waits for `{registered: true}` after a payload was sent, warning twice if
/// it never arrives
#[derive(Debug, Clone)]
pub struct DependencyWatch {
    config: HandshakeConfig,
    state: WatchState,
}

impl DependencyWatch {
    /// Begin watching at tick `now`. A persisted marker means an earlier
    /// session already confirmed, so nothing will be emitted.
    pub fn start(config: &HandshakeConfig, store: &impl WorldStore, now: u64) -> Self {
        let state = if store.get(REGISTRATION_MARKER).is_some() {
            WatchState::Settled
        } else {
            WatchState::Waiting {
                next_warning: now.saturating_add(config.first_warning_delay),
                warnings_left: 2,
            }
        };
        DependencyWatch {
            config: config.clone(),
            state,
        }
    }

    pub fn on_ack(&mut self, ack: &Acknowledgement, store: &mut impl WorldStore, now: u64) {
        if !ack.registered {
            warn!("Stat registration was refused; waiting for a later confirmation");
            return;
        }
        if let WatchState::Waiting { .. } = self.state {
            store.set(REGISTRATION_MARKER, Some("true".to_string()));
            self.state = WatchState::Confirmed {
                notice_at: now.saturating_add(self.config.confirmation_notice_delay),
            };
            info!("Stat registration confirmed");
        }
    }

    /// Advance to tick `now`, returning a notice when one falls due
    pub fn tick(&mut self, now: u64) -> Option<WatchNotice> {
        match self.state {
            WatchState::Waiting {
                next_warning,
                warnings_left,
            } if now >= next_warning => {
                self.state = if warnings_left > 1 {
                    WatchState::Waiting {
                        next_warning: next_warning.saturating_add(self.config.retry_delay),
                        warnings_left: warnings_left - 1,
                    }
                } else {
                    WatchState::Settled
                };
                warn!("No stat registration confirmation by tick {now}");
                Some(WatchNotice::Missing(self.config.missing_message.clone()))
            }
            WatchState::Confirmed { notice_at } if now >= notice_at => {
                self.state = WatchState::Settled;
                Some(WatchNotice::Confirmed(self.config.confirmed_message.clone()))
            }
            _ => None,
        }
    }

    /// True once no further notice can be emitted
    pub fn is_settled(&self) -> bool {
        self.state == WatchState::Settled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loot_core::memory::MemoryStore;

    fn notices(watch: &mut DependencyWatch, until: u64) -> Vec<(u64, WatchNotice)> {
        (0..=until)
            .filter_map(|now| watch.tick(now).map(|n| (now, n)))
            .collect()
    }

    #[test]
    fn test_warns_twice_without_ack() {
        let config = HandshakeConfig::default();
        let store = MemoryStore::default();
        let mut watch = DependencyWatch::start(&config, &store, 0);

        let emitted = notices(&mut watch, 10_000);
        let ticks: Vec<u64> = emitted.iter().map(|(t, _)| *t).collect();
        assert_eq!(ticks, vec![300, 3900]);
        assert!(matches!(emitted[0].1, WatchNotice::Missing(_)));
        assert!(watch.is_settled());
    }

    #[test]
    fn test_ack_confirms_once() {
        let config = HandshakeConfig::default();
        let mut store = MemoryStore::default();
        let mut watch = DependencyWatch::start(&config, &store, 0);

        watch.on_ack(&Acknowledgement { registered: true }, &mut store, 10);
        let emitted = notices(&mut watch, 5_000);
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].0, 310);
        assert_eq!(emitted[0].1, WatchNotice::Confirmed(config.confirmed_message.clone()));
        assert!(store.get(REGISTRATION_MARKER).is_some());
    }

    #[test]
    fn test_refusal_keeps_waiting() {
        let config = HandshakeConfig::default();
        let mut store = MemoryStore::default();
        let mut watch = DependencyWatch::start(&config, &store, 0);

        watch.on_ack(&Acknowledgement { registered: false }, &mut store, 10);
        assert!(store.get(REGISTRATION_MARKER).is_none());
        assert!(matches!(watch.tick(300), Some(WatchNotice::Missing(_))));
    }

    #[test]
    fn test_marker_suppresses_warnings() {
        let config = HandshakeConfig::default();
        let mut store = MemoryStore::default();
        store.set(REGISTRATION_MARKER, Some("true".to_string()));
        let mut watch = DependencyWatch::start(&config, &store, 0);
        assert!(watch.is_settled());
        assert!(notices(&mut watch, 10_000).is_empty());
    }
}
