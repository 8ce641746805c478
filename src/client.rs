//! The client: owns the connection pool, the DNS resolver, the TLS
//! configuration, and the executor requests run on.
//!
//! Grounded on spec.md §5's three scheduling models and `restc-pool`'s
//! `Pool`/`PooledConnection`; a `Client` is the process-wide object a
//! caller builds once and shares across requests.

use std::sync::Arc;

use restc_dns::{DnsResolver, StandardResolver};
use restc_errors::RestcError;
use restc_pool::Pool;
use restc_tls::TlsConfig;
use restc_types::{ClientConfig, Executor, HttpResponse, Request};

use crate::engine;

struct Inner {
    config: ClientConfig,
    pool: Pool,
    resolver: Arc<dyn DnsResolver>,
    tls: TlsConfig,
    runtime: Option<tokio::runtime::Runtime>,
}

/// An HTTP/1.1 client.
///
/// Cheap to clone: everything inside is reference counted, so handing a
/// `Client` to multiple tasks (or storing it in application state) never
/// duplicates the connection pool or DNS cache.
#[derive(Clone)]
pub struct Client {
    inner: Arc<Inner>,
}

impl Client {
    /// Build a client from `config`.
    ///
    /// For [`Executor::Owned`] this starts the owned worker pool
    /// immediately; [`Executor::Shared`] and [`Executor::Inline`] create
    /// no new threads.
    ///
    /// # Errors
    ///
    /// Returns [`RestcError::Communication`] if an owned worker pool
    /// fails to start, or propagates [`StandardResolver::new`]'s error
    /// if the platform's resolver configuration can't be read.
    pub fn new(config: ClientConfig) -> Result<Self, RestcError> {
        let props = config.default_properties();
        let pool = Pool::new(
            props.cache_max_connections,
            props.cache_max_connections_per_endpoint,
            std::time::Duration::from_secs(props.cache_ttl_seconds),
            std::time::Duration::from_secs(props.cache_cleanup_interval_seconds),
        );
        let resolver: Arc<dyn DnsResolver> = Arc::new(StandardResolver::new()?);
        let tls = TlsConfig::new();

        let runtime = match config.executor() {
            Executor::Owned { worker_threads } => Some(
                tokio::runtime::Builder::new_multi_thread()
                    .worker_threads((*worker_threads).max(1))
                    .enable_all()
                    .build()
                    .map_err(|e| {
                        RestcError::Communication(format!("failed to start owned executor: {e}"))
                    })?,
            ),
            Executor::Shared(_) | Executor::Inline => None,
        };

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                pool,
                resolver,
                tls,
                runtime,
            }),
        })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Execute one request to completion.
    ///
    /// Returns once the status line and headers are fully parsed; the
    /// body streams lazily from the returned [`HttpResponse`]. Dispatched
    /// onto this client's configured [`Executor`]: spawned onto the
    /// owned or shared worker pool, or run inline on the caller's task.
    ///
    /// # Errors
    ///
    /// Propagates any [`RestcError`] raised while resolving, connecting,
    /// or exchanging the request/response (see spec.md §7), or
    /// [`RestcError::Communication`] if the request task itself panics.
    pub async fn execute(&self, request: Request) -> Result<HttpResponse, RestcError> {
        match self.inner.config.executor() {
            Executor::Inline => engine::run_request(self, request).await,
            Executor::Shared(handle) => {
                let client = self.clone();
                handle
                    .spawn(async move { engine::run_request(&client, request).await })
                    .await
                    .map_err(|e| RestcError::Communication(format!("request task panicked: {e}")))?
            }
            Executor::Owned { .. } => {
                let handle = self
                    .inner
                    .runtime
                    .as_ref()
                    .expect("Executor::Owned always builds its own runtime in Client::new")
                    .handle()
                    .clone();
                let client = self.clone();
                handle
                    .spawn(async move { engine::run_request(&client, request).await })
                    .await
                    .map_err(|e| RestcError::Communication(format!("request task panicked: {e}")))?
            }
        }
    }

    pub(crate) fn pool(&self) -> &Pool {
        &self.inner.pool
    }

    pub(crate) fn resolver(&self) -> &Arc<dyn DnsResolver> {
        &self.inner.resolver
    }

    pub(crate) fn tls(&self) -> &TlsConfig {
        &self.inner.tls
    }

    /// Shut the connection pool down: idle connections are dropped and
    /// future acquisitions fail; in-flight requests finish naturally.
    pub async fn shutdown(&self) {
        self.inner.pool.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use restc_types::RequestProperties;

    #[test]
    fn new_with_inline_executor_starts_no_owned_runtime() {
        let config = ClientConfig::new(Executor::Inline, RequestProperties::default());
        let client = Client::new(config).expect("client");
        assert!(client.inner.runtime.is_none());
    }

    #[test]
    fn new_with_owned_executor_builds_its_runtime() {
        let config = ClientConfig::new(
            Executor::Owned { worker_threads: 1 },
            RequestProperties::default(),
        );
        let client = Client::new(config).expect("client");
        assert!(client.inner.runtime.is_some());
    }

    #[test]
    fn config_returns_what_the_client_was_built_with() {
        let config = ClientConfig::new(Executor::Inline, RequestProperties::default());
        let client = Client::new(config).expect("client");
        assert!(matches!(client.config().executor(), Executor::Inline));
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let config = ClientConfig::new(Executor::Inline, RequestProperties::default());
        let client = Client::new(config).expect("client");
        client.shutdown().await;
        client.shutdown().await;
    }
}
