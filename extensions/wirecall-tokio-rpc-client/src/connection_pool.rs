use crate::PendingRequests;
use crate::connection::{Connection, PoolSlots};
use dashmap::DashMap;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use wirecall::config::PoolConfig;
use wirecall::error::TransportError;

/// Point-in-time socket counts for one address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub live: usize,
    pub idle: usize,
    pub busy: usize,
}

/// Sockets to a single address.
struct AddressPool {
    addr: String,
    slots: Arc<PoolSlots>,
    idle: DashMap<u64, Arc<Connection>>,
    busy: DashMap<u64, Arc<Connection>>,
}

impl AddressPool {
    fn take_idle(&self) -> Option<Arc<Connection>> {
        loop {
            let id = *self.idle.iter().next()?.key();
            let Some((_, connection)) = self.idle.remove(&id) else {
                continue;
            };
            if connection.is_usable() {
                return Some(connection);
            }
            connection.close();
        }
    }

    fn close_all(&self) {
        for entry in self.idle.iter().chain(self.busy.iter()) {
            entry.value().close();
        }
        self.idle.clear();
        self.busy.clear();
    }
}

struct PoolInner {
    config: PoolConfig,
    connect_timeout: Duration,
    max_body_length: usize,
    pending: Arc<PendingRequests>,
    pools: DashMap<String, Arc<AddressPool>>,
    next_connection_id: AtomicU64,
    shut_down: AtomicBool,
}

impl PoolInner {
    async fn open(&self, pool: &AddressPool) -> Result<Arc<Connection>, TransportError> {
        let id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);
        match Connection::open(
            id,
            &pool.addr,
            self.connect_timeout,
            self.max_body_length,
            pool.slots.clone(),
            self.pending.clone(),
        )
        .await
        {
            Ok(connection) => Ok(Arc::new(connection)),
            Err(e) => {
                pool.slots.unreserve();
                Err(e)
            }
        }
    }

    fn release(&self, pool: &AddressPool, connection: Arc<Connection>) {
        pool.busy.remove(&connection.id());

        if self.shut_down.load(Ordering::SeqCst) || !connection.is_usable() {
            tracing::debug!(addr = %pool.addr, connection_id = connection.id(), "discarding connection");
            connection.close();
        } else {
            pool.idle.insert(connection.id(), connection);
        }
        pool.slots.changed.notify_one();
    }
}

/// Bounded sets of persistent sockets, one set per remote address.
///
/// Sockets are leased only while a frame is written, so one socket carries
/// many concurrent calls. Cloning is cheap and shares the pool.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    pub fn new(
        config: PoolConfig,
        connect_timeout: Duration,
        max_body_length: usize,
        pending: Arc<PendingRequests>,
    ) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                config,
                connect_timeout,
                max_body_length,
                pending,
                pools: DashMap::new(),
                next_connection_id: AtomicU64::new(1),
                shut_down: AtomicBool::new(false),
            }),
        }
    }

    /// Leases a socket to `addr`: an idle one if any, else a new one while
    /// under `max_size`, else the first one released within the acquire
    /// timeout.
    pub async fn acquire(&self, addr: &str) -> Result<ConnectionLease, TransportError> {
        let pool = self.address_pool(addr)?;
        let timeout = self.inner.config.acquire_timeout();
        let deadline = Instant::now() + timeout;

        loop {
            let changed = pool.slots.changed.notified();
            tokio::pin!(changed);
            changed.as_mut().enable();

            if self.inner.shut_down.load(Ordering::SeqCst) {
                return Err(TransportError::ShutDown);
            }

            let connection = match pool.take_idle() {
                Some(connection) => Some(connection),
                None if pool.slots.try_reserve() => Some(self.inner.open(&pool).await?),
                None => None,
            };

            if let Some(connection) = connection {
                pool.busy.insert(connection.id(), connection.clone());
                return Ok(ConnectionLease {
                    connection,
                    pool: pool.clone(),
                    inner: self.inner.clone(),
                });
            }

            if tokio::time::timeout_at(deadline, changed).await.is_err() {
                tracing::debug!(addr, "timed out waiting for a pooled connection");
                return Err(TransportError::PoolTimeout {
                    addr: addr.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
        }
    }

    pub fn stats(&self, addr: &str) -> Option<PoolStats> {
        let pool = self.inner.pools.get(addr)?;
        let idle = pool
            .idle
            .iter()
            .filter(|entry| !entry.value().is_closed())
            .count();
        let live = pool.slots.live();
        Some(PoolStats {
            live,
            idle,
            busy: live.saturating_sub(idle),
        })
    }

    /// Closes every socket to every address. Later calls are no-ops.
    pub fn shutdown(&self) {
        if self.inner.shut_down.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!(addresses = self.inner.pools.len(), "shutting down connection pool");
        for pool in self.inner.pools.iter() {
            pool.close_all();
            pool.slots.changed.notify_waiters();
        }
    }

    /// Drops closed idle sockets, then forgets every address with no live
    /// socket that no lease or pending acquire refers to. Returns how many
    /// addresses were dropped. Runs whenever a new address is first used.
    pub fn prune(&self) -> usize {
        for pool in self.inner.pools.iter() {
            pool.idle.retain(|_, connection| !connection.is_closed());
        }

        let before = self.inner.pools.len();
        self.inner.pools.retain(|addr, pool| {
            let unused = Arc::strong_count(pool) == 1
                && pool.slots.live() == 0
                && pool.idle.is_empty()
                && pool.busy.is_empty();
            if unused {
                tracing::debug!(addr = %addr, "dropping unused address pool");
            }
            !unused
        });
        before.saturating_sub(self.inner.pools.len())
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shut_down.load(Ordering::SeqCst)
    }

    fn address_pool(&self, addr: &str) -> Result<Arc<AddressPool>, TransportError> {
        if self.is_shut_down() {
            return Err(TransportError::ShutDown);
        }
        if let Some(pool) = self.inner.pools.get(addr) {
            return Ok(pool.clone());
        }

        self.prune();
        let pool = self
            .inner
            .pools
            .entry(addr.to_string())
            .or_insert_with(|| {
                let pool = Arc::new(AddressPool {
                    addr: addr.to_string(),
                    slots: Arc::new(PoolSlots::new(self.inner.config.max_size)),
                    idle: DashMap::new(),
                    busy: DashMap::new(),
                });
                self.warm_up(pool.clone());
                pool
            })
            .clone();
        Ok(pool)
    }

    /// Opens `min_size` sockets in the background.
    fn warm_up(&self, pool: Arc<AddressPool>) {
        let inner = self.inner.clone();
        let target = inner.config.min_size;
        if target == 0 {
            return;
        }

        tokio::spawn(async move {
            for _ in 0..target {
                if inner.shut_down.load(Ordering::SeqCst) || pool.slots.live() >= target {
                    break;
                }
                if !pool.slots.try_reserve() {
                    break;
                }
                match inner.open(&pool).await {
                    Ok(connection) => {
                        pool.idle.insert(connection.id(), connection);
                        pool.slots.changed.notify_one();
                    }
                    Err(e) => {
                        tracing::debug!(addr = %pool.addr, error = %e, "warm-up connect failed");
                        break;
                    }
                }
            }
        });
    }
}

/// A leased socket. Dropping the lease hands the socket back to its pool.
pub struct ConnectionLease {
    connection: Arc<Connection>,
    pool: Arc<AddressPool>,
    inner: Arc<PoolInner>,
}

impl Deref for ConnectionLease {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.connection
    }
}

impl Drop for ConnectionLease {
    fn drop(&mut self) {
        self.inner.release(&self.pool, self.connection.clone());
    }
}
