use dashmap::DashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use wirecall::error::RegistryError;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Key-space notification published by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    Deleted(String),
    Expired(String),
}

impl KeyEvent {
    pub fn key(&self) -> &str {
        match self {
            KeyEvent::Deleted(key) | KeyEvent::Expired(key) => key,
        }
    }
}

#[derive(Debug, Clone)]
struct StoredValue {
    payload: String,
    expires_at: Instant,
}

/// A shared in-process key/value store with per-key TTLs.
///
/// It plays the part of the remote store behind a registry: many registry
/// clients (providers and consumers) hold the same `Arc<MemoryStore>`.
/// Expiry is checked lazily on every read and also by an optional sweeper
/// task, which is what turns silent expiry into `KeyEvent::Expired`.
///
/// `set_available(false)` simulates an outage: every operation then fails
/// with `RegistryError::Unreachable`.
pub struct MemoryStore {
    entries: DashMap<String, StoredValue>,
    events: broadcast::Sender<KeyEvent>,
    available: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            entries: DashMap::new(),
            events,
            available: AtomicBool::new(true),
        })
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), RegistryError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RegistryError::Unreachable("memory store is offline".into()))
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<KeyEvent> {
        self.events.subscribe()
    }

    pub fn put(&self, key: &str, value: String, ttl: Duration) -> Result<(), RegistryError> {
        self.ensure_available()?;
        self.entries.insert(
            key.to_string(),
            StoredValue {
                payload: value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, RegistryError> {
        self.ensure_available()?;
        let now = Instant::now();

        match self.entries.get(key) {
            Some(stored) if stored.expires_at > now => return Ok(Some(stored.payload.clone())),
            Some(_) => {}
            None => return Ok(None),
        }

        self.expire(key, now);
        Ok(None)
    }

    /// Extends the lease of an existing key. Returns `false` when the key is
    /// missing or already expired.
    pub fn refresh(&self, key: &str, ttl: Duration) -> Result<bool, RegistryError> {
        self.ensure_available()?;
        let now = Instant::now();

        let refreshed = match self.entries.get_mut(key) {
            Some(mut stored) if stored.expires_at > now => {
                stored.expires_at = now + ttl;
                true
            }
            _ => false,
        };

        if !refreshed {
            self.expire(key, now);
        }
        Ok(refreshed)
    }

    /// Removes `key`, announcing `KeyEvent::Deleted` if it was live.
    pub fn delete(&self, key: &str) -> Result<bool, RegistryError> {
        self.ensure_available()?;
        let now = Instant::now();

        match self.entries.remove(key) {
            Some((key, stored)) if stored.expires_at > now => {
                let _ = self.events.send(KeyEvent::Deleted(key));
                Ok(true)
            }
            Some((key, _)) => {
                let _ = self.events.send(KeyEvent::Expired(key));
                Ok(false)
            }
            None => Ok(false),
        }
    }

    /// Every live `(key, value)` whose key starts with `prefix`.
    pub fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, RegistryError> {
        self.ensure_available()?;
        let now = Instant::now();
        let mut live = Vec::new();
        let mut dead = Vec::new();

        for entry in self.entries.iter() {
            if !entry.key().starts_with(prefix) {
                continue;
            }
            if entry.expires_at > now {
                live.push((entry.key().clone(), entry.payload.clone()));
            } else {
                dead.push(entry.key().clone());
            }
        }

        for key in dead {
            self.expire(&key, now);
        }

        live.sort();
        Ok(live)
    }

    /// Removes every expired key, announcing each. Returns how many went.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let dead: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.expires_at <= now)
            .map(|entry| entry.key().clone())
            .collect();

        dead.iter().filter(|key| self.expire(key, now)).count()
    }

    /// A task body running `sweep_expired` every `period` until the store
    /// is dropped.
    pub fn sweeper(self: &Arc<Self>, period: Duration) -> impl Future<Output = ()> + Send + 'static {
        let store: Weak<Self> = Arc::downgrade(self);
        async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                let Some(store) = store.upgrade() else {
                    break;
                };
                let swept = store.sweep_expired();
                if swept > 0 {
                    tracing::debug!(swept, "expired registry records swept");
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // Removes `key` only if it is still expired, so a concurrent re-put wins.
    fn expire(&self, key: &str, now: Instant) -> bool {
        match self
            .entries
            .remove_if(key, |_, stored| stored.expires_at <= now)
        {
            Some((key, _)) => {
                let _ = self.events.send(KeyEvent::Expired(key));
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn values_expire_after_ttl() {
        let store = MemoryStore::new();
        let mut events = store.subscribe();

        store.put("a", "1".into(), Duration::from_secs(5)).unwrap();
        assert_eq!(store.get("a").unwrap(), Some("1".to_string()));

        tokio::time::advance(Duration::from_secs(6)).await;

        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(events.recv().await.unwrap(), KeyEvent::Expired("a".into()));
        assert!(store.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_extends_a_live_lease() {
        let store = MemoryStore::new();
        store.put("a", "1".into(), Duration::from_secs(5)).unwrap();

        tokio::time::advance(Duration::from_secs(4)).await;
        assert!(store.refresh("a", Duration::from_secs(5)).unwrap());

        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(store.get("a").unwrap(), Some("1".to_string()));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(!store.refresh("a", Duration::from_secs(5)).unwrap());
    }

    #[tokio::test]
    async fn delete_announces_and_scan_filters_by_prefix() {
        let store = MemoryStore::new();
        let mut events = store.subscribe();
        let ttl = Duration::from_secs(30);

        store.put("/rpc/A:1.0/h:1", "x".into(), ttl).unwrap();
        store.put("/rpc/A:1.0/h:2", "y".into(), ttl).unwrap();
        store.put("/rpc/B:1.0/h:1", "z".into(), ttl).unwrap();

        let found = store.scan_prefix("/rpc/A:1.0/").unwrap();
        assert_eq!(
            found,
            vec![
                ("/rpc/A:1.0/h:1".to_string(), "x".to_string()),
                ("/rpc/A:1.0/h:2".to_string(), "y".to_string()),
            ]
        );

        assert!(store.delete("/rpc/A:1.0/h:1").unwrap());
        assert!(!store.delete("/rpc/A:1.0/h:1").unwrap());
        assert_eq!(
            events.recv().await.unwrap(),
            KeyEvent::Deleted("/rpc/A:1.0/h:1".into())
        );
    }

    #[tokio::test]
    async fn offline_store_reports_unreachable() {
        let store = MemoryStore::new();
        store.set_available(false);

        assert!(matches!(
            store.put("a", "1".into(), Duration::from_secs(1)),
            Err(RegistryError::Unreachable(_))
        ));
        assert!(matches!(store.get("a"), Err(RegistryError::Unreachable(_))));

        store.set_available(true);
        assert_eq!(store.get("a").unwrap(), None);
    }
}
