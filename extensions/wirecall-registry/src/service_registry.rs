use crate::RegistryConfig;
use std::sync::Arc;
use wirecall::error::RegistryError;
use wirecall::rpc::ServiceMetaInfo;

/// Invoked with the node key of a registration that was deleted or expired.
pub type WatchListener = Arc<dyn Fn(&str) + Send + Sync>;

/// The contract every registry backend fulfils.
///
/// Registrations are leases: a record stored by `register` disappears after
/// the configured TTL unless `heart_beat` keeps renewing it.
#[async_trait::async_trait]
pub trait ServiceRegistry: Send + Sync {
    async fn init(&self, config: &RegistryConfig) -> Result<(), RegistryError>;

    /// Stores `info` under its node key and tracks it for renewal.
    async fn register(&self, info: &ServiceMetaInfo) -> Result<(), RegistryError>;

    async fn unregister(&self, info: &ServiceMetaInfo) -> Result<(), RegistryError>;

    /// All live instances registered under `service_key` (`name:version`).
    async fn discover(&self, service_key: &str) -> Result<Vec<ServiceMetaInfo>, RegistryError>;

    /// Starts periodic renewal of every locally registered key.
    ///
    /// Calling it again while renewal is running has no effect.
    async fn heart_beat(&self) -> Result<(), RegistryError>;

    /// Calls `listener` once when the record under `node_key` is deleted or
    /// expires, then drops the watch. If the record is already gone the
    /// listener runs before this returns. At most one watch is kept per node
    /// key; repeated calls for a key that is already watched are ignored.
    async fn watch(&self, node_key: &str, listener: WatchListener) -> Result<(), RegistryError>;

    /// Removes every locally registered key and stops background work.
    async fn destroy(&self);
}
