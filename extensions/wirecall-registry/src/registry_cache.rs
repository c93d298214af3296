use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use wirecall::rpc::ServiceMetaInfo;

#[derive(Debug, Default)]
struct CacheSlot {
    generation: u64,
    instances: Option<Vec<ServiceMetaInfo>>,
}

/// Consumer-side discovery cache, one entry per service key.
///
/// Every invalidation bumps the key's generation. A fill started before an
/// invalidation carries the old generation and is refused, so a result that
/// was already stale when it arrived is never cached.
#[derive(Debug, Default)]
pub struct RegistryCache {
    slots: DashMap<String, CacheSlot>,
}

impl RegistryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self, service_key: &str) -> Option<Vec<ServiceMetaInfo>> {
        self.slots
            .get(service_key)
            .and_then(|slot| slot.instances.clone())
    }

    /// Unconditionally stores `instances` for `service_key`.
    pub fn write(&self, service_key: &str, instances: Vec<ServiceMetaInfo>) {
        self.slots
            .entry(service_key.to_string())
            .or_default()
            .instances = Some(instances);
    }

    /// Current generation of `service_key`, to be passed to [`Self::fill`].
    pub fn generation(&self, service_key: &str) -> u64 {
        self.slots
            .get(service_key)
            .map(|slot| slot.generation)
            .unwrap_or(0)
    }

    /// Stores `instances` only if `service_key` has not been invalidated
    /// since `generation` was read. Returns whether the write happened.
    pub fn fill(
        &self,
        service_key: &str,
        generation: u64,
        instances: Vec<ServiceMetaInfo>,
    ) -> bool {
        match self.slots.entry(service_key.to_string()) {
            Entry::Occupied(mut entry) => {
                let slot = entry.get_mut();
                if slot.generation != generation {
                    return false;
                }
                slot.instances = Some(instances);
                true
            }
            Entry::Vacant(entry) => {
                if generation != 0 {
                    return false;
                }
                entry.insert(CacheSlot {
                    generation,
                    instances: Some(instances),
                });
                true
            }
        }
    }

    /// Drops the entry for `service_key`. Returns whether one was cached.
    pub fn invalidate(&self, service_key: &str) -> bool {
        let mut slot = self.slots.entry(service_key.to_string()).or_default();
        slot.generation += 1;
        slot.instances.take().is_some()
    }

    /// Invalidates the service that `node_key` (`name:version/host:port`)
    /// belongs to.
    pub fn invalidate_node(&self, node_key: &str) -> bool {
        match node_key.split_once('/') {
            Some((service_key, _)) => self.invalidate(service_key),
            None => false,
        }
    }

    pub fn clear(&self) {
        for mut slot in self.slots.iter_mut() {
            slot.generation += 1;
            slot.instances = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(port: u16) -> ServiceMetaInfo {
        ServiceMetaInfo::new("UserService", "10.0.0.1", port)
    }

    #[test]
    fn hit_after_write_miss_after_invalidate() {
        let cache = RegistryCache::new();
        assert_eq!(cache.read("UserService:1.0"), None);

        cache.write("UserService:1.0", vec![node(1)]);
        assert_eq!(cache.read("UserService:1.0"), Some(vec![node(1)]));

        assert!(cache.invalidate_node("UserService:1.0/10.0.0.1:1"));
        assert_eq!(cache.read("UserService:1.0"), None);
        assert!(!cache.invalidate("UserService:1.0"));
    }

    #[test]
    fn stale_fill_is_refused() {
        let cache = RegistryCache::new();
        let generation = cache.generation("UserService:1.0");

        cache.invalidate("UserService:1.0");
        assert!(!cache.fill("UserService:1.0", generation, vec![node(1)]));
        assert_eq!(cache.read("UserService:1.0"), None);

        let generation = cache.generation("UserService:1.0");
        assert!(cache.fill("UserService:1.0", generation, vec![node(2)]));
        assert_eq!(cache.read("UserService:1.0"), Some(vec![node(2)]));
    }

    #[test]
    fn clear_drops_everything() {
        let cache = RegistryCache::new();
        cache.write("A:1.0", vec![node(1)]);
        cache.write("B:1.0", vec![node(2)]);

        cache.clear();

        assert_eq!(cache.read("A:1.0"), None);
        assert_eq!(cache.read("B:1.0"), None);
    }
}
