//! Trinket slot manager and registration handshake settings

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrinketConfig {
    /// Item that opens the trinket inventory while held in the main hand
    #[serde(default = "default_activation_item")]
    pub activation_item: String,
    /// Item that unequips every trinket when used
    #[serde(default = "default_recover_item")]
    pub recover_item: String,
    #[serde(default = "default_proxy_entity")]
    pub proxy_entity: String,
    /// Distance in front of the head along the view direction
    #[serde(default = "default_view_offset")]
    pub view_offset: f64,
    /// Velocity multiplier used to lead the player
    #[serde(default = "default_velocity_prediction")]
    pub velocity_prediction: f64,
    #[serde(default = "default_extra_jump_strength")]
    pub extra_jump_strength: f64,
}

impl Default for TrinketConfig {
    fn default() -> Self {
        TrinketConfig {
            activation_item: default_activation_item(),
            recover_item: default_recover_item(),
            proxy_entity: default_proxy_entity(),
            view_offset: default_view_offset(),
            velocity_prediction: default_velocity_prediction(),
            extra_jump_strength: default_extra_jump_strength(),
        }
    }
}

fn default_activation_item() -> String {
    "trinkets:scroll".to_string()
}
fn default_recover_item() -> String {
    "trinkets:recover_scroll".to_string()
}
fn default_proxy_entity() -> String {
    "trinkets:trinkets_inv".to_string()
}
fn default_view_offset() -> f64 {
    0.5
}
fn default_velocity_prediction() -> f64 {
    5.0
}
fn default_extra_jump_strength() -> f64 {
    0.6
}

/// Tick delays for the contributor side of the registration handshake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandshakeConfig {
    #[serde(default = "default_first_warning_delay")]
    pub first_warning_delay: u64,
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64,
    #[serde(default = "default_confirmation_notice_delay")]
    pub confirmation_notice_delay: u64,
    #[serde(default = "default_missing_message")]
    pub missing_message: String,
    #[serde(default = "default_confirmed_message")]
    pub confirmed_message: String,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        HandshakeConfig {
            first_warning_delay: default_first_warning_delay(),
            retry_delay: default_retry_delay(),
            confirmation_notice_delay: default_confirmation_notice_delay(),
            missing_message: default_missing_message(),
            confirmed_message: default_confirmed_message(),
        }
    }
}

fn default_first_warning_delay() -> u64 {
    300
}
fn default_retry_delay() -> u64 {
    3600
}
fn default_confirmation_notice_delay() -> u64 {
    300
}
fn default_missing_message() -> String {
    "Required dependency missing: trinket stat core.".to_string()
}
fn default_confirmed_message() -> String {
    "Trinket stat core initialized successfully.".to_string()
}
