use crate::{
    KeyEvent, KeyedTaskSet, MemoryStore, RegistryConfig, ServiceRegistry, WatchListener,
};
use dashmap::DashMap;
use std::sync::{Arc, OnceLock};
use tokio::sync::broadcast::error::RecvError;
use wirecall::error::RegistryError;
use wirecall::rpc::ServiceMetaInfo;

/// Root under which every registration is stored.
pub const REGISTRY_ROOT: &str = "/rpc/";

const HEARTBEAT_TASK: &str = "heartbeat";
const SWEEPER_TASK: &str = "sweeper";

fn store_key(node_key: &str) -> String {
    format!("{REGISTRY_ROOT}{node_key}")
}

/// Registry client backed by a shared [`MemoryStore`].
///
/// Each client remembers the registrations it made itself, so heartbeats
/// renew only those and `destroy` removes only those. A renewal that finds
/// its record gone (for example after an outage outlived the TTL) writes
/// the record back.
pub struct MemoryRegistry {
    store: Arc<MemoryStore>,
    config: OnceLock<RegistryConfig>,
    local: Arc<DashMap<String, ServiceMetaInfo>>,
    tasks: KeyedTaskSet,
}

impl MemoryRegistry {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            config: OnceLock::new(),
            local: Arc::new(DashMap::new()),
            tasks: KeyedTaskSet::new(),
        }
    }

    fn config(&self) -> Result<&RegistryConfig, RegistryError> {
        self.config.get().ok_or(RegistryError::NotInitialized)
    }

    /// Node keys registered through this client.
    pub fn local_node_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.local.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    /// Background tasks (sweeper, heartbeat, watches) still running.
    pub fn running_tasks(&self) -> usize {
        self.tasks.running()
    }

    /// Renews every local registration once. Returns how many were renewed.
    ///
    /// Failures are logged per key and never drop the local record; the next
    /// tick tries again.
    pub fn renew_local_keys(&self) -> Result<usize, RegistryError> {
        let ttl = self.config()?.ttl();
        Ok(Self::renew(&self.store, &self.local, ttl))
    }

    fn renew(
        store: &MemoryStore,
        local: &DashMap<String, ServiceMetaInfo>,
        ttl: std::time::Duration,
    ) -> usize {
        let snapshot: Vec<(String, ServiceMetaInfo)> = local
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();

        let mut renewed = 0;
        for (node_key, info) in snapshot {
            let key = store_key(&node_key);
            let outcome = match store.refresh(&key, ttl) {
                Ok(true) => Ok(()),
                Ok(false) => {
                    tracing::warn!(node_key = %node_key, "registration lapsed, writing it back");
                    serde_json::to_string(&info)
                        .map_err(|e| RegistryError::Backend(e.to_string()))
                        .and_then(|json| store.put(&key, json, ttl))
                }
                Err(err) => Err(err),
            };

            match outcome {
                Ok(()) => renewed += 1,
                Err(err) => {
                    tracing::error!(node_key = %node_key, error = %err, "failed to renew registration");
                }
            }
        }
        renewed
    }

    fn decode_record(key: &str, json: &str) -> Result<ServiceMetaInfo, RegistryError> {
        serde_json::from_str(json).map_err(|e| RegistryError::MalformedRecord {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl ServiceRegistry for MemoryRegistry {
    async fn init(&self, config: &RegistryConfig) -> Result<(), RegistryError> {
        if self.config.set(config.clone()).is_err() {
            tracing::warn!("memory registry already initialized, keeping first config");
        }

        let period = self.config()?.sweep_interval();
        self.tasks
            .spawn_if_absent(SWEEPER_TASK, self.store.sweeper(period));

        tracing::info!(address = %config.address, registry = %config.registry, "registry initialized");
        Ok(())
    }

    async fn register(&self, info: &ServiceMetaInfo) -> Result<(), RegistryError> {
        let ttl = self.config()?.ttl();
        let node_key = info.node_key();
        let json = serde_json::to_string(info).map_err(|e| RegistryError::Backend(e.to_string()))?;

        self.store.put(&store_key(&node_key), json, ttl)?;
        self.local.insert(node_key.clone(), info.clone());

        tracing::info!(node_key = %node_key, "service registered");
        Ok(())
    }

    async fn unregister(&self, info: &ServiceMetaInfo) -> Result<(), RegistryError> {
        let node_key = info.node_key();
        self.local.remove(&node_key);
        self.store.delete(&store_key(&node_key))?;

        tracing::info!(node_key = %node_key, "service unregistered");
        Ok(())
    }

    async fn discover(&self, service_key: &str) -> Result<Vec<ServiceMetaInfo>, RegistryError> {
        let prefix = store_key(&format!("{service_key}/"));

        self.store
            .scan_prefix(&prefix)?
            .into_iter()
            .map(|(key, json)| Self::decode_record(&key, &json))
            .collect()
    }

    async fn heart_beat(&self) -> Result<(), RegistryError> {
        let config = self.config()?;
        let (period, ttl) = (config.heartbeat_interval(), config.ttl());
        let store = self.store.clone();
        let local = self.local.clone();

        let started = self.tasks.spawn_if_absent(HEARTBEAT_TASK, async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let renewed = Self::renew(&store, &local, ttl);
                tracing::debug!(renewed, "registry heartbeat");
            }
        });

        if started {
            tracing::info!(interval_ms = period.as_millis() as u64, "registry heartbeat started");
        }
        Ok(())
    }

    async fn watch(&self, node_key: &str, listener: WatchListener) -> Result<(), RegistryError> {
        let task_key = format!("watch:{node_key}");
        if self.tasks.is_running(&task_key) {
            return Ok(());
        }

        let watched = store_key(node_key);
        let node_key = node_key.to_string();
        let mut events = self.store.subscribe();

        // A node removed before the subscription above produced no event we
        // can still receive.
        if self.store.get(&watched)?.is_none() {
            tracing::debug!(node_key = %node_key, "watched node already gone");
            listener(node_key.as_str());
            return Ok(());
        }

        // The task ends after the first notification. The invalidated cache
        // rediscovers and watches the node again if it comes back.
        self.tasks.spawn_if_absent(task_key, async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if event.key() != watched {
                            continue;
                        }
                        match &event {
                            KeyEvent::Deleted(_) => {
                                tracing::debug!(node_key = %node_key, "watched node deleted")
                            }
                            KeyEvent::Expired(_) => {
                                tracing::debug!(node_key = %node_key, "watched node expired")
                            }
                        }
                        listener(node_key.as_str());
                        break;
                    }
                    Err(RecvError::Lagged(missed)) => {
                        // Missed events may include ours, so assume the worst.
                        tracing::warn!(node_key = %node_key, missed, "watch lagged");
                        listener(node_key.as_str());
                        break;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Ok(())
    }

    async fn destroy(&self) {
        self.tasks.abort_all();

        let node_keys: Vec<String> = self.local.iter().map(|e| e.key().clone()).collect();
        for node_key in node_keys {
            if let Err(err) = self.store.delete(&store_key(&node_key)) {
                tracing::error!(node_key = %node_key, error = %err, "failed to remove registration");
            }
        }
        self.local.clear();

        tracing::info!("registry destroyed");
    }
}
