//! Configuration schema definitions.
//!
//! This module defines the client and link configuration structures.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Root configuration for a messaging client.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Namespace endpoint (e.g., "amqps://bus.example.com").
    pub endpoint: String,

    /// Path of the entity to link to (queue, topic, subscription).
    pub entity_path: String,

    /// Total time budget for one establishment attempt, in seconds.
    pub operation_timeout_secs: u64,

    /// Prefix for generated client identifiers (diagnostics only).
    pub client_id_prefix: String,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            entity_path: String::new(),
            operation_timeout_secs: 60,
            client_id_prefix: "buslink".to_string(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ClientConfig {
    /// The operation timeout as a [`Duration`].
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level filter (e.g., "info", "buslink=debug").
    pub log_level: String,

    /// Emit JSON-formatted logs instead of human-readable output.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Role of the link to establish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkRole {
    /// Sends messages to the entity.
    Sender,
    /// Receives messages from the entity.
    Receiver,
    /// Request/response management operations against the entity.
    Management,
}

/// Protocol parameters for the desired link.
///
/// Supplied externally and passed through to the link factory unchanged;
/// the establishment workflow itself does not interpret these beyond the
/// role discriminator.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LinkSettings {
    /// Link role (sender, receiver, management).
    pub role: LinkRole,

    /// Source address (required for receivers).
    pub source: Option<String>,

    /// Target address (required for senders).
    pub target: Option<String>,

    /// Initial link credit granted to the remote.
    pub credit: u32,

    /// Extensible link properties.
    pub properties: HashMap<String, serde_json::Value>,
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            role: LinkRole::Sender,
            source: None,
            target: None,
            credit: 100,
            properties: HashMap::new(),
        }
    }
}
