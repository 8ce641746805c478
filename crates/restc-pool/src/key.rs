//! The pool's lookup key: an endpoint plus the transport used to reach
//! it. Grounded on `ConnectionPoolImpl::Key`.

/// The two transports a connection can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// Plain TCP.
    Plain,
    /// TCP wrapped in TLS.
    Tls,
}

/// `{endpoint, transport}` — connections for different keys are never
/// shared, even if they happen to resolve to the same IP.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolKey {
    endpoint: String,
    transport: Transport,
}

impl PoolKey {
    /// Build a key from a `host:port` endpoint string and transport.
    pub fn new(endpoint: impl Into<String>, transport: Transport) -> Self {
        Self {
            endpoint: endpoint.into(),
            transport,
        }
    }

    /// The `host:port` endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The transport.
    pub fn transport(&self) -> Transport {
        self.transport
    }
}

impl std::fmt::Display for PoolKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let scheme = match self.transport {
            Transport::Plain => "http",
            Transport::Tls => "https",
        };
        write!(f, "{scheme}://{}", self.endpoint)
    }
}
