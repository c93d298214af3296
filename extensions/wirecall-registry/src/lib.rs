mod cached_registry;
mod keyed_task_set;
mod memory_registry;
mod memory_store;
mod registry_cache;
mod registry_config;
mod service_registry;

pub use cached_registry::CachedRegistry;
pub use keyed_task_set::KeyedTaskSet;
pub use memory_registry::{MemoryRegistry, REGISTRY_ROOT};
pub use memory_store::{KeyEvent, MemoryStore};
pub use registry_cache::RegistryCache;
pub use registry_config::RegistryConfig;
pub use service_registry::{ServiceRegistry, WatchListener};
