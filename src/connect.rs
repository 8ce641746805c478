//! Establishing the transport for one connection attempt: plain TCP,
//! optionally behind a forward proxy or a `CONNECT`-tunneling proxy,
//! with a TLS handshake layered on top for `https://` targets.
//!
//! Grounded on spec.md §4.1 step 3 ("connect (optional local bind,
//! optional CONNECT-proxy, SNI on HTTPS)") and `restc-tls`'s
//! `TlsConnector::handshake`.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use bytes::BytesMut;
use restc_errors::RestcError;
use restc_io::BoxedSocket;
use restc_tls::TlsConfig;
use restc_types::Proxy;
use restc_url::{Scheme, Url};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpSocket, TcpStream};

/// The host the engine should actually dial: the proxy's address for
/// `Proxy::Http`/`Proxy::Https`, or the request URL's own host
/// otherwise.
pub fn dial_endpoint(url: &Url, proxy: &Proxy) -> Result<(String, u16), RestcError> {
    match proxy {
        Proxy::None => Ok((url.host().to_string(), url.port())),
        Proxy::Http { address } | Proxy::Https { address } => parse_host_port(address),
    }
}

fn parse_host_port(address: &str) -> Result<(String, u16), RestcError> {
    let pos = address
        .rfind(':')
        .ok_or_else(|| RestcError::Parse(format!("proxy address missing port: {address:?}")))?;
    let host = &address[..pos];
    let port: u16 = address[pos + 1..]
        .parse()
        .map_err(|_| RestcError::Parse(format!("invalid proxy port in {address:?}")))?;
    Ok((host.to_string(), port))
}

async fn tcp_connect(
    ip: IpAddr,
    port: u16,
    bind_to_local_address: Option<&str>,
) -> Result<TcpStream, RestcError> {
    let target = SocketAddr::new(ip, port);
    let stream = if let Some(local) = bind_to_local_address {
        let local_addr: SocketAddr = local
            .parse()
            .map_err(|_| RestcError::Parse(format!("invalid bind_to_local_address: {local:?}")))?;
        let socket = if local_addr.is_ipv4() {
            TcpSocket::new_v4()?
        } else {
            TcpSocket::new_v6()?
        };
        socket.bind(local_addr)?;
        socket.connect(target).await?
    } else {
        TcpStream::connect(target).await?
    };
    Ok(stream)
}

/// Dial `ip:port` directly (no proxy) and, for `Scheme::Https`,
/// handshake TLS with `sni_host`.
pub async fn dial_direct(
    ip: IpAddr,
    port: u16,
    scheme: Scheme,
    sni_host: &str,
    bind_to_local_address: Option<&str>,
    tcp_nodelay: bool,
    tls: &TlsConfig,
) -> Result<BoxedSocket, RestcError> {
    let stream = tcp_connect(ip, port, bind_to_local_address).await?;
    stream.set_nodelay(tcp_nodelay)?;

    match scheme {
        Scheme::Http => Ok(Box::new(stream)),
        Scheme::Https => {
            let tls_stream = tls.connector().handshake(sni_host, stream).await?;
            Ok(Box::new(tls_stream))
        }
    }
}

/// Dial `ip:port` (the `Proxy::Https` tunnel's address), issue a
/// `CONNECT origin_host:origin_port HTTP/1.1` and wait for a `200`
/// response, then treat the tunnel as a direct connection to the
/// origin — handshaking TLS over it for an `https://` target.
pub async fn dial_via_connect_tunnel(
    ip: IpAddr,
    proxy_port: u16,
    origin_host: &str,
    origin_port: u16,
    scheme: Scheme,
    bind_to_local_address: Option<&str>,
    tcp_nodelay: bool,
    tls: &TlsConfig,
) -> Result<BoxedSocket, RestcError> {
    let mut stream = tcp_connect(ip, proxy_port, bind_to_local_address).await?;
    stream.set_nodelay(tcp_nodelay)?;

    let request = format!(
        "CONNECT {origin_host}:{origin_port} HTTP/1.1\r\nHost: {origin_host}:{origin_port}\r\n\r\n"
    );
    stream.write_all(request.as_bytes()).await?;
    read_connect_response(&mut stream).await?;

    match scheme {
        Scheme::Http => Ok(Box::new(stream)),
        Scheme::Https => {
            let tls_stream = tls.connector().handshake(origin_host, stream).await?;
            Ok(Box::new(tls_stream))
        }
    }
}

/// Read a `CONNECT` tunnel's status line and headers directly off the
/// not-yet-split stream, without going through the reader/writer chain
/// (there's nothing to hand a `Connection` to yet at this point).
async fn read_connect_response(stream: &mut TcpStream) -> Result<(), RestcError> {
    let mut buf = BytesMut::with_capacity(256);
    loop {
        if let Some(pos) = find_double_crlf(&buf) {
            let head = String::from_utf8_lossy(&buf[..pos]).into_owned();
            let status_line = head
                .lines()
                .next()
                .ok_or_else(|| RestcError::Protocol("empty CONNECT response".into()))?;
            let status = status_line
                .split_whitespace()
                .nth(1)
                .and_then(|s| s.parse::<u16>().ok())
                .ok_or_else(|| RestcError::Protocol("malformed CONNECT status line".into()))?;
            if !(200..300).contains(&status) {
                return Err(RestcError::Protocol(format!(
                    "CONNECT tunnel rejected: {status_line}"
                )));
            }
            return Ok(());
        }
        let mut byte = [0u8; 1];
        let n = stream.read(&mut byte).await?;
        if n == 0 {
            return Err(RestcError::Protocol(
                "connection closed during CONNECT handshake".into(),
            ));
        }
        buf.extend_from_slice(&byte);
        if buf.len() > 8 * 1024 {
            return Err(RestcError::Constraint("CONNECT response too large".into()));
        }
    }
}

fn find_double_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}


/// Reports whether a connect timeout elapsed, mapping to
/// [`RestcError::IoTimeout`].
pub async fn with_connect_timeout<F, T>(timeout: Duration, fut: F) -> Result<T, RestcError>
where
    F: std::future::Future<Output = Result<T, RestcError>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| RestcError::timeout(timeout))?
}
