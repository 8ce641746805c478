//! Shared in-process fixture server for the integration tests in this
//! directory. Each test supplies its own routing closure, so the raw
//! wire bytes a scenario needs (chunked framing, a bare `Connection:
//! close` body, a redirect chain) are fully under the test's control —
//! the same reason `SPEC_FULL.md` gives for not reaching for `wiremock`
//! here.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A per-connection handler: given the request line's method and path,
/// returns the raw bytes to write back before closing the socket.
pub type Handler = Arc<
    dyn Fn(&str, &str) -> Pin<Box<dyn Future<Output = Vec<u8>> + Send>> + Send + Sync,
>;

/// Start a fixture server on an ephemeral port, dispatching every
/// accepted connection's first request line to `handler`.
pub async fn spawn<F, Fut>(handler: F) -> SocketAddr
where
    F: Fn(String, String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Vec<u8>> + Send + 'static,
{
    let handler: Handler = Arc::new(move |method: &str, path: &str| {
        Box::pin(handler(method.to_string(), path.to_string()))
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind fixture listener");
    let addr = listener.local_addr().expect("fixture listener address");

    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                return;
            };
            let handler = handler.clone();
            tokio::spawn(async move { serve_one(socket, handler).await });
        }
    });

    addr
}

async fn serve_one(mut socket: tokio::net::TcpStream, handler: Handler) {
    let mut buf = vec![0u8; 8192];
    let Ok(n) = socket.read(&mut buf).await else {
        return;
    };
    if n == 0 {
        return;
    }
    let request = String::from_utf8_lossy(&buf[..n]);
    let mut parts = request.lines().next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("GET").to_string();
    let path = parts.next().unwrap_or("/").to_string();

    let response = handler(&method, &path).await;
    let _ = socket.write_all(&response).await;
    let _ = socket.shutdown().await;
}

/// Build a plain, fixed-`Content-Length` response.
pub fn fixed_response(status: u16, reason: &str, content_type: &str, body: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    out.extend_from_slice(body);
    out
}

/// Build a `Transfer-Encoding: chunked` response, splitting `body` into
/// chunks of `chunk_size` bytes.
pub fn chunked_response(status: u16, reason: &str, body: &[u8], chunk_size: usize) -> Vec<u8> {
    let mut out = format!(
        "HTTP/1.1 {status} {reason}\r\nTransfer-Encoding: chunked\r\nConnection: close\r\n\r\n"
    )
    .into_bytes();
    for chunk in body.chunks(chunk_size.max(1)) {
        out.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
        out.extend_from_slice(chunk);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"0\r\n\r\n");
    out
}

/// Build a redirect response pointing at `location`.
pub fn redirect_response(status: u16, reason: &str, location: &str) -> Vec<u8> {
    format!("HTTP/1.1 {status} {reason}\r\nLocation: {location}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
        .into_bytes()
}
