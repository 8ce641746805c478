//! The pool itself: acquisition policy, idle/in-use bookkeeping, the TTL
//! sweeper, and graceful shutdown.
//!
//! Grounded on `ConnectionPoolImpl.cpp`. All state lives behind one
//! `tokio::sync::Mutex`, matching spec.md §4.3's "single mutex in
//! threaded mode... no lock is held across any IO operation": every
//! critical section here is synchronous bookkeeping, never an `.await`
//! on a socket.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use restc_errors::RestcError;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::connection::Connection;
use crate::key::PoolKey;

struct Entry {
    connection: Connection,
    last_used: Instant,
}

struct PoolState {
    idle: HashMap<PoolKey, VecDeque<Entry>>,
    in_use_count: HashMap<PoolKey, usize>,
    closed: bool,
}

impl PoolState {
    fn total_idle(&self) -> usize {
        self.idle.values().map(VecDeque::len).sum()
    }

    fn total_in_use(&self) -> usize {
        self.in_use_count.values().sum()
    }

    fn per_endpoint_count(&self, key: &PoolKey) -> usize {
        self.idle.get(key).map(VecDeque::len).unwrap_or(0)
            + self.in_use_count.get(key).copied().unwrap_or(0)
    }

    /// Evict the least-recently-used idle entry across every key.
    /// Returns `true` if an entry was evicted.
    fn evict_oldest_idle(&mut self) -> bool {
        let oldest_key = self
            .idle
            .iter()
            .filter(|(_, list)| !list.is_empty())
            .min_by_key(|(_, list)| list.front().map(|e| e.last_used))
            .map(|(key, _)| key.clone());

        let Some(key) = oldest_key else {
            return false;
        };
        if let Some(list) = self.idle.get_mut(&key) {
            list.pop_front();
            if list.is_empty() {
                self.idle.remove(&key);
            }
        }
        true
    }

    fn sweep_expired(&mut self, ttl: Duration) {
        let now = Instant::now();
        self.idle.retain(|_, list| {
            list.retain(|entry| now.duration_since(entry.last_used) < ttl);
            !list.is_empty()
        });
    }
}

struct PoolInner {
    state: Mutex<PoolState>,
    max_connections: usize,
    max_connections_per_endpoint: usize,
    ttl: Duration,
}

/// A handle to a connection pool. Cloning shares the same underlying
/// state; the pool is dropped (and its sweeper stopped) once the last
/// clone and every outstanding [`PooledConnection`] are dropped.
#[derive(Clone)]
pub struct Pool {
    inner: Arc<PoolInner>,
    sweeper: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Pool {
    /// Build a pool with the given caps and idle TTL, and start its
    /// background sweeper on `cleanup_interval`.
    pub fn new(
        max_connections: usize,
        max_connections_per_endpoint: usize,
        ttl: Duration,
        cleanup_interval: Duration,
    ) -> Self {
        let inner = Arc::new(PoolInner {
            state: Mutex::new(PoolState {
                idle: HashMap::new(),
                in_use_count: HashMap::new(),
                closed: false,
            }),
            max_connections,
            max_connections_per_endpoint,
            ttl,
        });

        let sweeper_inner = inner.clone();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(cleanup_interval);
            interval.tick().await; // first tick fires immediately
            loop {
                interval.tick().await;
                let mut state = sweeper_inner.state.lock().await;
                if state.closed {
                    return;
                }
                state.sweep_expired(sweeper_inner.ttl);
            }
        });

        Self {
            inner,
            sweeper: Arc::new(Mutex::new(Some(handle))),
        }
    }

    /// Acquire a connection for `key`.
    ///
    /// If `force_new` is `false` and an idle entry exists, the most
    /// recently used one is reused. Otherwise a fresh, not-yet-connected
    /// slot is returned, after checking the per-endpoint and global
    /// caps (evicting the oldest idle entry across all keys if the
    /// global cap is reached and an eviction would make room).
    ///
    /// # Errors
    ///
    /// Returns [`RestcError::ObjectExpired`] if the pool has been shut
    /// down, or [`RestcError::Constraint`] if a cap is reached and no
    /// idle entry can be evicted to make room.
    pub async fn acquire(&self, key: PoolKey, force_new: bool) -> Result<PooledConnection, RestcError> {
        let mut state = self.inner.state.lock().await;
        if state.closed {
            return Err(RestcError::ObjectExpired("connection pool is closed".into()));
        }

        if !force_new {
            if let Some(list) = state.idle.get_mut(&key) {
                if let Some(entry) = list.pop_back() {
                    if list.is_empty() {
                        state.idle.remove(&key);
                    }
                    *state.in_use_count.entry(key.clone()).or_insert(0) += 1;
                    tracing::trace!(%key, "reusing idle connection");
                    return Ok(PooledConnection::new(
                        Arc::downgrade(&self.inner),
                        key,
                        entry.connection,
                    ));
                }
            }

            if state.per_endpoint_count(&key) >= self.inner.max_connections_per_endpoint {
                return Err(RestcError::Constraint(format!(
                    "per-endpoint connection cap reached for {key}"
                )));
            }
        }

        if state.total_idle() + state.total_in_use() >= self.inner.max_connections
            && !state.evict_oldest_idle()
        {
            return Err(RestcError::Constraint("connection pool exhausted".into()));
        }

        *state.in_use_count.entry(key.clone()).or_insert(0) += 1;
        tracing::trace!(%key, "creating new connection slot");
        Ok(PooledConnection::new(
            Arc::downgrade(&self.inner),
            key,
            Connection::new(),
        ))
    }

    /// Number of idle connections currently held, across all keys.
    pub async fn idle_count(&self) -> usize {
        self.inner.state.lock().await.total_idle()
    }

    /// Number of in-use connections currently checked out, across all
    /// keys.
    pub async fn in_use_count(&self) -> usize {
        self.inner.state.lock().await.total_in_use()
    }

    /// Shut the pool down: cancels the sweeper, drops all idle entries,
    /// and causes future [`Pool::acquire`] calls to fail. Outstanding
    /// in-use connections finish naturally; their release is silently
    /// discarded.
    pub async fn shutdown(&self) {
        let mut state = self.inner.state.lock().await;
        state.closed = true;
        state.idle.clear();
        drop(state);

        if let Some(handle) = self.sweeper.lock().await.take() {
            handle.abort();
        }
    }

    fn release(self_inner: &Weak<PoolInner>, key: PoolKey, connection: Connection) {
        let Some(inner) = self_inner.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            let mut state = inner.state.lock().await;
            if let Some(count) = state.in_use_count.get_mut(&key) {
                *count -= 1;
                if *count == 0 {
                    state.in_use_count.remove(&key);
                }
            }

            if state.closed || !connection.is_open() {
                tracing::trace!(%key, "discarding connection after use");
                return;
            }

            tracing::trace!(%key, "recycling connection after use");
            state.idle.entry(key).or_default().push_back(Entry {
                connection,
                last_used: Instant::now(),
            });
        });
    }
}

/// An in-use connection borrowed from the [`Pool`].
///
/// On drop, the connection returns to the idle set unless it is closed
/// or the pool has been shut down, matching spec.md §4.3's acquisition
/// contract.
pub struct PooledConnection {
    pool: Weak<PoolInner>,
    key: PoolKey,
    connection: Option<Connection>,
}

impl PooledConnection {
    fn new(pool: Weak<PoolInner>, key: PoolKey, connection: Connection) -> Self {
        Self {
            pool,
            key,
            connection: Some(connection),
        }
    }

    /// The endpoint/transport this connection was acquired for.
    pub fn key(&self) -> &PoolKey {
        &self.key
    }
}

impl std::ops::Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.connection.as_ref().expect("connection taken before drop")
    }
}

impl std::ops::DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Connection {
        self.connection.as_mut().expect("connection taken before drop")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            Pool::release(&self.pool, self.key.clone(), connection);
        }
    }
}
