//! Client-wide configuration: the executor a client runs requests on and
//! the default [`RequestProperties`] new requests inherit.

use std::sync::Arc;

use crate::RequestProperties;

/// How request tasks are scheduled.
///
/// Mirrors spec.md §5's three scheduling models. `restc` itself only
/// needs a `tokio::runtime::Handle` to spawn onto; which of the three
/// shapes produced that handle is the caller's concern.
#[derive(Clone)]
pub enum Executor {
    /// A worker pool of `worker_threads` threads owned by the client.
    Owned {
        /// Number of worker threads in the owned pool.
        worker_threads: usize,
    },
    /// A caller-owned `tokio::runtime::Handle`, shared with other work.
    Shared(tokio::runtime::Handle),
    /// The caller's own thread drives the executor inline (a
    /// current-thread runtime the caller block_on's themselves).
    Inline,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Executor::Owned { worker_threads } => f
                .debug_struct("Owned")
                .field("worker_threads", worker_threads)
                .finish(),
            Executor::Shared(_) => f.write_str("Shared(..)"),
            Executor::Inline => f.write_str("Inline"),
        }
    }
}

impl Default for Executor {
    fn default() -> Self {
        Executor::Owned { worker_threads: 1 }
    }
}

/// Process-wide (per-client) configuration: the executor requests run on
/// and the default properties new requests inherit.
///
/// Cloning a `ClientConfig` is cheap: `default_properties` is reference
/// counted so request construction never deep-copies the default
/// headers/args.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    executor: Executor,
    default_properties: Arc<RequestProperties>,
}

impl ClientConfig {
    /// Build a config from an executor choice and default properties.
    pub fn new(executor: Executor, default_properties: RequestProperties) -> Self {
        Self {
            executor,
            default_properties: Arc::new(default_properties),
        }
    }

    /// The executor requests on this client run on.
    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// The default properties new requests inherit unless overridden.
    pub fn default_properties(&self) -> &RequestProperties {
        &self.default_properties
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            executor: Executor::default(),
            default_properties: Arc::new(RequestProperties::default()),
        }
    }
}
