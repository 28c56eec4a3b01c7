//! Registry store fed by cross-system registration payloads

mod record;

pub use record::{ContributionRecord, EquipCondition};

use loot_core::{LootConfig, LootError, LootRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{info, warn};

/// Why a payload or one of its entries was refused
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Payload is not valid JSON: {0}")]
    NotJson(#[source] serde_json::Error),
    #[error("Payload is not a JSON object")]
    NotAnObject,
    #[error("Entry '{0}' is not a JSON object")]
    EntryNotAnObject(String),
    #[error("Entry '{id}' could not be decoded: {source}")]
    Decode {
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Entry '{id}' is invalid: {reason}")]
    Invalid { id: String, reason: String },
    #[error("Entry '{id}' has invalid loot: {source}")]
    Loot {
        id: String,
        #[source]
        source: LootError,
    },
}

/// Reply sent back on the acknowledgement channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub registered: bool,
}

/// Outcome of one payload
#[derive(Debug, Default)]
pub struct RegistrationReport {
    pub accepted: Vec<String>,
    pub rejected: Vec<(String, RegistrationError)>,
    /// Set when the payload as a whole could not be read
    pub payload_error: Option<RegistrationError>,
}

impl RegistrationReport {
    pub fn acknowledgement(&self) -> Acknowledgement {
        Acknowledgement {
            registered: self.payload_error.is_none() && self.rejected.is_empty(),
        }
    }
}

/// Item id → contribution record, plus the loot state registrations feed
#[derive(Debug, Clone)]
pub struct Registry {
    records: HashMap<String, ContributionRecord>,
    loot: LootRegistry,
}

impl Registry {
    pub fn new(loot_config: &LootConfig) -> Self {
        Registry {
            records: HashMap::new(),
            loot: LootRegistry::new(loot_config),
        }
    }

    pub fn get(&self, item_id: &str) -> Option<&ContributionRecord> {
        self.records.get(item_id)
    }

    /// Record for an item that occupies a trinket slot
    pub fn trinket(&self, item_id: &str) -> Option<&ContributionRecord> {
        self.get(item_id).filter(|r| r.trinket.is_some())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn loot(&self) -> &LootRegistry {
        &self.loot
    }

    pub fn loot_mut(&mut self) -> &mut LootRegistry {
        &mut self.loot
    }

    /// Register one record. Last write wins for the record itself; its loot
    /// and drops merge into the shared tables.
    pub fn register(&mut self, item_id: &str, record: ContributionRecord) -> Result<(), RegistrationError> {
        let record = record.normalize().map_err(|reason| RegistrationError::Invalid {
            id: item_id.to_string(),
            reason,
        })?;

        let loot_err = |source| RegistrationError::Loot {
            id: item_id.to_string(),
            source,
        };
        self.loot
            .validate_item(item_id, record.loot.as_ref(), &record.drops)
            .map_err(loot_err)?;
        if let Some(ref loot) = record.loot {
            self.loot.register_item_loot(item_id, loot).map_err(loot_err)?;
        }
        if !record.drops.is_empty() {
            self.loot
                .register_item_drops(item_id, &record.drops)
                .map_err(loot_err)?;
        }

        self.records.insert(item_id.to_string(), record);
        Ok(())
    }

    /// Apply a JSON payload mapping item id → record. Bad entries are skipped
    /// and reported; good ones are still applied.
    pub fn register_payload(&mut self, payload: &str) -> RegistrationReport {
        let mut report = RegistrationReport::default();

        let value: serde_json::Value = match serde_json::from_str(payload) {
            Ok(value) => value,
            Err(e) => {
                warn!("Registration payload is not valid JSON: {e}");
                report.payload_error = Some(RegistrationError::NotJson(e));
                return report;
            }
        };
        let serde_json::Value::Object(entries) = value else {
            warn!("Registration payload is not an object");
            report.payload_error = Some(RegistrationError::NotAnObject);
            return report;
        };

        for (id, entry) in entries {
            let result = if entry.is_object() {
                serde_json::from_value::<ContributionRecord>(entry)
                    .map_err(|source| RegistrationError::Decode {
                        id: id.clone(),
                        source,
                    })
                    .and_then(|record| self.register(&id, record))
            } else {
                Err(RegistrationError::EntryNotAnObject(id.clone()))
            };

            match result {
                Ok(()) => report.accepted.push(id),
                Err(e) => {
                    warn!("Skipping registration for '{id}': {e}");
                    report.rejected.push((id, e));
                }
            }
        }

        info!(
            "Registration payload applied: {} accepted, {} rejected",
            report.accepted.len(),
            report.rejected.len()
        );
        report
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(&LootConfig::default())
    }
}
