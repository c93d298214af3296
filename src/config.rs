use crate::constants::DEFAULT_MAX_BODY_LENGTH;
use crate::frame::HeaderLayout;
use crate::serializer::SerializerKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-address connection pool limits.
///
/// Defaults: `min_size` 1, `max_size` 20, `acquire_timeout_ms` 5000.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Sockets opened eagerly the first time an address is used.
    pub min_size: usize,
    /// Hard ceiling on live sockets to one address.
    pub max_size: usize,
    /// How long `acquire` may wait for a socket to be released.
    pub acquire_timeout_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_size: 1,
            max_size: 20,
            acquire_timeout_ms: 5_000,
        }
    }
}

impl PoolConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub serializer: SerializerKind,
    pub layout: HeaderLayout,
    pub pool: PoolConfig,
    pub connect_timeout_ms: u64,
    pub response_timeout_ms: u64,
    pub max_body_length: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            serializer: SerializerKind::default(),
            layout: HeaderLayout::default(),
            pool: PoolConfig::default(),
            connect_timeout_ms: 5_000,
            response_timeout_ms: 10_000,
            max_body_length: DEFAULT_MAX_BODY_LENGTH,
        }
    }
}

impl TransportConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config: TransportConfig =
            serde_json::from_str(r#"{"serializer":"compact","pool":{"max_size":4}}"#).unwrap();

        assert_eq!(config.serializer, SerializerKind::Compact);
        assert_eq!(config.layout, HeaderLayout::Packed);
        assert_eq!(config.pool.max_size, 4);
        assert_eq!(config.pool.min_size, 1);
        assert_eq!(config.response_timeout(), Duration::from_secs(10));
    }
}
