//! Per-request configuration, merged from client defaults down to the
//! individual call.

use crate::Headers;

/// How a request should reach the origin server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proxy {
    /// Connect directly.
    None,
    /// Route through an HTTP proxy at `address`.
    Http {
        /// `host:port` of the proxy.
        address: String,
    },
    /// Route through an HTTPS (CONNECT-tunneling) proxy at `address`.
    Https {
        /// `host:port` of the proxy.
        address: String,
    },
}

impl Default for Proxy {
    fn default() -> Self {
        Proxy::None
    }
}

/// The configuration bag consumed by the engine and the connection pool.
///
/// A [`Client`](crate::config::ClientConfig) holds one of these as its
/// defaults; each [`Request`](crate::request::Request) may override any
/// field for a single call.
#[derive(Debug, Clone)]
pub struct RequestProperties {
    /// Upper bound on redirect hops before the request fails with
    /// `ConstraintError`.
    pub max_redirects: u32,
    /// Deadline for establishing the TCP/TLS connection.
    pub connect_timeout_ms: u64,
    /// Deadline for writing the request (headers + body).
    pub send_timeout_ms: u64,
    /// Deadline for reading the response (status line through body end).
    pub reply_timeout_ms: u64,
    /// Global cap on pool-held connections, idle and in-use combined.
    pub cache_max_connections: usize,
    /// Per-endpoint cap on pool-held connections.
    pub cache_max_connections_per_endpoint: usize,
    /// Seconds an idle connection may sit before the sweeper discards it.
    pub cache_ttl_seconds: u64,
    /// Seconds between sweeper passes.
    pub cache_cleanup_interval_seconds: u64,
    /// If `false`, 4xx/5xx responses are returned as data instead of
    /// surfacing `HttpError`.
    pub throw_on_http_error: bool,
    /// Headers merged under (not over) each request's own headers.
    pub default_headers: Headers,
    /// Query arguments merged under each request's own query arguments.
    pub default_args: Vec<(String, String)>,
    /// Proxy configuration.
    pub proxy: Proxy,
    /// Optional local address to bind outgoing sockets to.
    pub bind_to_local_address: Option<String>,
    /// Whether to set `TCP_NODELAY` (disable Nagle's algorithm).
    pub tcp_nodelay: bool,
    /// Byte budget the JSON decoder enforces while buffering a value.
    pub max_memory_consumption: usize,
    /// Credentials to retry with, once, after a `401` challenge.
    ///
    /// `None` means the engine surfaces the `401` as an [`RestcError::Http`](restc_errors::RestcError::Http)
    /// (or returns it as data, per `throw_on_http_error`) without retrying.
    pub basic_auth: Option<(String, String)>,
}

impl Default for RequestProperties {
    fn default() -> Self {
        Self {
            max_redirects: 5,
            connect_timeout_ms: 10_000,
            send_timeout_ms: 10_000,
            reply_timeout_ms: 10_000,
            cache_max_connections: 64,
            cache_max_connections_per_endpoint: 8,
            cache_ttl_seconds: 60,
            cache_cleanup_interval_seconds: 30,
            throw_on_http_error: true,
            default_headers: Headers::new(),
            default_args: Vec::new(),
            proxy: Proxy::default(),
            bind_to_local_address: None,
            tcp_nodelay: true,
            max_memory_consumption: 1024 * 1024,
            basic_auth: None,
        }
    }
}

impl RequestProperties {
    /// Defaults, with `max_redirects` set to 0 (no redirects followed).
    pub fn no_redirects() -> Self {
        Self {
            max_redirects: 0,
            ..Self::default()
        }
    }
}
