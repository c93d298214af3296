use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection and lease settings handed to `ServiceRegistry::init`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Backend name, e.g. `"memory"`.
    pub registry: String,
    pub address: String,
    pub timeout_ms: u64,
    /// Lifetime of a registration that is not renewed.
    pub ttl_ms: u64,
    pub heartbeat_interval_ms: u64,
    /// How often expired records are swept and announced.
    pub sweep_interval_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            registry: "memory".to_string(),
            address: "localhost:6379".to_string(),
            timeout_ms: 10_000,
            ttl_ms: 30_000,
            heartbeat_interval_ms: 10_000,
            sweep_interval_ms: 1_000,
        }
    }
}

impl RegistryConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}
