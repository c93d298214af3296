use crate::{RegistryCache, RegistryConfig, ServiceRegistry, WatchListener};
use std::sync::Arc;
use wirecall::error::RegistryError;
use wirecall::rpc::ServiceMetaInfo;

/// A backend fronted by a [`RegistryCache`].
///
/// A discover miss goes to the backend, installs a watch on every returned
/// node and caches the result. Any watched node disappearing invalidates its
/// service, so the following discover goes back to the backend.
pub struct CachedRegistry {
    backend: Arc<dyn ServiceRegistry>,
    cache: Arc<RegistryCache>,
}

impl CachedRegistry {
    pub fn new(backend: Arc<dyn ServiceRegistry>) -> Self {
        Self {
            backend,
            cache: Arc::new(RegistryCache::new()),
        }
    }

    pub fn cache(&self) -> &Arc<RegistryCache> {
        &self.cache
    }

    pub fn backend(&self) -> &Arc<dyn ServiceRegistry> {
        &self.backend
    }
}

#[async_trait::async_trait]
impl ServiceRegistry for CachedRegistry {
    async fn init(&self, config: &RegistryConfig) -> Result<(), RegistryError> {
        self.backend.init(config).await
    }

    async fn register(&self, info: &ServiceMetaInfo) -> Result<(), RegistryError> {
        self.backend.register(info).await
    }

    async fn unregister(&self, info: &ServiceMetaInfo) -> Result<(), RegistryError> {
        self.backend.unregister(info).await?;
        self.cache.invalidate(&info.service_key());
        Ok(())
    }

    async fn discover(&self, service_key: &str) -> Result<Vec<ServiceMetaInfo>, RegistryError> {
        if let Some(instances) = self.cache.read(service_key) {
            tracing::trace!(service_key, "registry cache hit");
            return Ok(instances);
        }

        let generation = self.cache.generation(service_key);
        let instances = self.backend.discover(service_key).await?;

        for instance in &instances {
            let cache = self.cache.clone();
            let listener: WatchListener = Arc::new(move |node_key: &str| {
                if cache.invalidate_node(node_key) {
                    tracing::debug!(node_key, "registry cache invalidated");
                }
            });
            self.backend.watch(&instance.node_key(), listener).await?;
        }

        // Empty results are never cached; there is no node to watch.
        if !instances.is_empty() && !self.cache.fill(service_key, generation, instances.clone()) {
            tracing::debug!(service_key, "discover result went stale before caching");
        }

        Ok(instances)
    }

    async fn heart_beat(&self) -> Result<(), RegistryError> {
        self.backend.heart_beat().await
    }

    async fn watch(&self, node_key: &str, listener: WatchListener) -> Result<(), RegistryError> {
        self.backend.watch(node_key, listener).await
    }

    async fn destroy(&self) {
        self.cache.clear();
        self.backend.destroy().await;
    }
}
