//! Connection pooling: endpoint+transport keyed idle/in-use sets with
//! global and per-endpoint caps, LRU eviction, a TTL sweeper, and
//! graceful shutdown.
//!
//! Grounded on `ConnectionPoolImpl.cpp` / `Connection.h`.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod connection;
mod key;
mod pool;

pub use connection::Connection;
pub use key::{PoolKey, Transport};
pub use pool::{Pool, PooledConnection};

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn key() -> PoolKey {
        PoolKey::new("example.com:443", Transport::Tls)
    }

    #[tokio::test]
    async fn acquire_then_release_returns_connection_to_idle() {
        let pool = Pool::new(10, 10, Duration::from_secs(60), Duration::from_secs(30));
        {
            let mut conn = pool.acquire(key(), false).await.unwrap();
            conn.attach_socket(Box::new(tokio_test::io::Builder::new().build()));
        }
        // give the spawned release task a chance to run
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(pool.idle_count().await, 1);
        assert_eq!(pool.in_use_count().await, 0);
    }

    #[tokio::test]
    async fn closed_connection_is_not_recycled() {
        let pool = Pool::new(10, 10, Duration::from_secs(60), Duration::from_secs(30));
        {
            let _conn = pool.acquire(key(), false).await.unwrap();
            // never attach a socket: still "closed" per is_open()
        }
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(pool.idle_count().await, 0);
    }

    #[tokio::test]
    async fn per_endpoint_cap_is_enforced() {
        let pool = Pool::new(10, 1, Duration::from_secs(60), Duration::from_secs(30));
        let _first = pool.acquire(key(), false).await.unwrap();
        let second = pool.acquire(key(), false).await;
        assert!(matches!(second, Err(restc_errors::RestcError::Constraint(_))));
    }

    #[tokio::test]
    async fn shutdown_rejects_future_acquisitions() {
        let pool = Pool::new(10, 10, Duration::from_secs(60), Duration::from_secs(30));
        pool.shutdown().await;
        let err = pool.acquire(key(), false).await.unwrap_err();
        assert!(matches!(err, restc_errors::RestcError::ObjectExpired(_)));
    }
}
