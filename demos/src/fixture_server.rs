//! An in-process HTTP/1.1 fixture server, so the demos can exercise the
//! client without reaching the network.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Start a fixture server bound to an ephemeral local port, serving
/// canned responses for `/hello` and `/account`, and return its address.
pub async fn spawn() -> std::io::Result<std::net::SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        loop {
            let Ok((socket, _)) = listener.accept().await else {
                return;
            };
            tokio::spawn(handle(socket));
        }
    });

    Ok(addr)
}

async fn handle(mut socket: tokio::net::TcpStream) {
    let mut buf = vec![0u8; 4096];
    let Ok(n) = socket.read(&mut buf).await else {
        return;
    };
    if n == 0 {
        return;
    }
    let request = String::from_utf8_lossy(&buf[..n]);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/");

    let response = match path {
        "/hello" => canned(200, "OK", "text/plain", b"hello world"),
        "/account" => canned(
            200,
            "OK",
            "application/json",
            br#"{"id":100,"name":"John Doe","balance":123.45}"#,
        ),
        _ => canned(404, "Not Found", "text/plain", b"not found"),
    };
    let _ = socket.write_all(&response).await;
    let _ = socket.shutdown().await;
}

fn canned(status: u16, reason: &str, content_type: &str, body: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    out.extend_from_slice(body);
    out
}
