use crate::frame::ProtocolError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializationError {
    #[error("{serializer} serialization failed: {reason}")]
    Serialize {
        serializer: &'static str,
        reason: String,
    },

    #[error("{serializer} deserialization failed: {reason}")]
    Deserialize {
        serializer: &'static str,
        reason: String,
    },
}

/// Failures of the network path between caller and provider.
///
/// This is the error class that retry strategies are expected to absorb.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("failed to connect to {addr}: {reason}")]
    Connect { addr: String, reason: String },

    #[error("connecting to {addr} timed out after {timeout_ms}ms")]
    ConnectTimeout { addr: String, timeout_ms: u64 },

    #[error("connection to {addr} closed")]
    ConnectionClosed { addr: String },

    #[error("socket I/O error on {addr}: {reason}")]
    Io { addr: String, reason: String },

    #[error("no response for request {request_id} within {timeout_ms}ms")]
    ResponseTimeout { request_id: u64, timeout_ms: u64 },

    #[error("no pooled connection to {addr} became available within {timeout_ms}ms")]
    PoolTimeout { addr: String, timeout_ms: u64 },

    #[error("transport has been shut down")]
    ShutDown,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("registry backend unreachable: {0}")]
    Unreachable(String),

    #[error("malformed registry record under {key}: {reason}")]
    MalformedRecord { key: String, reason: String },

    #[error("registry has not been initialized")]
    NotInitialized,

    #[error("registry backend error: {0}")]
    Backend(String),
}

/// The error surfaced to callers of the invocation pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error("no available instance for service {0}")]
    NoAvailableInstance(String),

    /// The provider ran the call and reported a failure.
    #[error("remote invocation failed: {0}")]
    Remote(String),
}

impl RpcError {
    /// Only transport faults are worth another attempt; everything else
    /// would fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RpcError::Transport(_))
    }
}
