//! Error types for the loot engine and the host primitives it calls

use thiserror::Error;

/// Errors raised while reading or validating loot data
#[derive(Error, Debug)]
pub enum LootError {
    #[error("Failed to decode ledger entry '{key}': {source}")]
    LedgerDecode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Ledger entry '{key}' has unsupported format version {version}")]
    UnsupportedVersion { key: String, version: u32 },
    #[error("Invalid loot entry for '{item}': {reason}")]
    InvalidEntry { item: String, reason: String },
}

/// Failure reported by a host primitive (entity, container, world)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HostError {
    /// The host refused the operation (unknown id, bad parameter)
    #[error("Host rejected operation: {0}")]
    Rejected(String),
    /// The entity is no longer loaded
    #[error("Entity is no longer valid")]
    Unloaded,
    /// The entity lacks a component the operation needs
    #[error("Missing component: {0}")]
    MissingComponent(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LootError::InvalidEntry {
            item: "trinkets:ring".to_string(),
            reason: "chance 1.5 outside [0, 1]".to_string(),
        };
        assert!(err.to_string().contains("trinkets:ring"));

        let err = HostError::MissingComponent("minecraft:movement".to_string());
        assert!(err.to_string().contains("minecraft:movement"));
    }
}
