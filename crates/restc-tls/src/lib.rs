//! TLS connection setup: platform trust store, SNI set to the target
//! host, TLS 1.2+ only.
//!
//! Grounded on `tls_manager`'s `TlsConfig`, trimmed to what the spec asks
//! for: no certificate pinning, no ALPN negotiation (this client only
//! ever speaks HTTP/1.1, so there's nothing to negotiate), no HSTS
//! store. Certificate verification always uses the platform/webpki
//! trust store; `rustls` itself already refuses anything below TLS 1.2.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

use std::sync::Arc;

use restc_errors::RestcError;
use rustls::pki_types::ServerName;
use rustls::ClientConfig as RustlsClientConfig;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector as RustlsConnector;

/// A reusable TLS client configuration, shared across every TLS
/// connection a `restc` client opens.
///
/// Cheap to clone: the underlying `rustls::ClientConfig` is reference
/// counted.
#[derive(Clone)]
pub struct TlsConfig {
    inner: Arc<RustlsClientConfig>,
}

impl TlsConfig {
    /// Build a configuration trusting the platform/webpki root store.
    pub fn new() -> Self {
        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let config = RustlsClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        Self {
            inner: Arc::new(config),
        }
    }

    /// A connector built from this configuration.
    pub fn connector(&self) -> TlsConnector {
        TlsConnector {
            inner: RustlsConnector::from(self.inner.clone()),
        }
    }
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Performs the TLS handshake over an already-connected transport.
pub struct TlsConnector {
    inner: RustlsConnector,
}

impl TlsConnector {
    /// Handshake as a client, setting SNI to `host`.
    ///
    /// # Errors
    ///
    /// Returns [`RestcError::FailedToConnect`] if `host` isn't a valid
    /// DNS name/IP for SNI, or if the handshake itself fails (expired
    /// certificate, hostname mismatch, protocol downgrade rejected by
    /// `rustls`).
    pub async fn handshake<S>(&self, host: &str, stream: S) -> Result<TlsStream<S>, RestcError>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let server_name = ServerName::try_from(host.to_string()).map_err(|e| {
            RestcError::FailedToConnect {
                host: host.to_string(),
                port: 0,
                message: format!("invalid SNI host name: {e}"),
            }
        })?;

        tracing::debug!(host, "starting TLS handshake");

        self.inner
            .connect(server_name, stream)
            .await
            .map_err(|e| RestcError::FailedToConnect {
                host: host.to_string(),
                port: 0,
                message: format!("TLS handshake failed: {e}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builds_with_platform_roots() {
        let _config = TlsConfig::new();
    }

    #[tokio::test]
    async fn handshake_rejects_invalid_sni_host() {
        let config = TlsConfig::new();
        let connector = config.connector();
        let (client, _server) = tokio::io::duplex(64);
        let err = connector.handshake("not a valid host\0", client).await.unwrap_err();
        assert!(matches!(err, RestcError::FailedToConnect { .. }));
    }
}
