//! The request/response engine: spec.md §4.1's core algorithm, wiring
//! DNS resolution, the connection pool, the connect helpers in
//! [`crate::connect`], and the reader/writer chain in [`crate::chain`]
//! into one request execution.
//!
//! Grounded on spec.md §4.1 ("resolve, then for up to `max_attempts`
//! attempts: acquire, connect if new, send, receive; redirects and a
//! single 401 retry re-enter this same sequence") and
//! `ConnectionManager::ExecuteRequest` in the original engine.

use std::net::IpAddr;
use std::time::Duration;

use restc_errors::RestcError;
use restc_io::{BoxedSocket, FramingStream, IoReader, IoWriter};
use restc_pool::{PoolKey, PooledConnection, Transport};
use restc_types::{AsyncDataWriter, Body, HttpResponse, Proxy, Request, RequestProperties};
use restc_url::{Scheme, Url};

use crate::client::Client;
use crate::pooled_body::PooledBodyReader;
use crate::{auth, chain, connect, redirect};

/// Attempts made per hop before giving up: one reused idle connection,
/// one fresh connection, and one final fresh connection forced past the
/// per-endpoint cap (`force_new`), matching spec.md §4.3's acquisition
/// contract.
const MAX_ATTEMPTS: usize = 3;

/// Run `request` to completion: follow redirects, retry once on a bare
/// `401` when basic-auth credentials are configured, and surface the
/// final response (or raise [`RestcError::Http`] per
/// [`RequestProperties::throw_on_http_error`]).
pub(crate) async fn run_request(
    client: &Client,
    mut request: Request,
) -> Result<HttpResponse, RestcError> {
    let mut redirects_left = request.properties().max_redirects;
    let mut tried_auth = false;

    loop {
        let response = execute_one_hop(client, &mut request).await?;

        if response.status() == 401 && !tried_auth {
            if let Some((user, pass)) = request.properties().basic_auth.clone() {
                tried_auth = true;
                request
                    .headers_mut()
                    .set("Authorization", auth::basic_auth_header(&user, &pass));
                drop(response);
                continue;
            }
        }

        let method = request.method();
        match redirect::redirect_step(request.url(), method, &response)? {
            Some(step) => {
                if redirects_left == 0 {
                    return Err(RestcError::Constraint(format!(
                        "exceeded max_redirects following {}",
                        request.url().path()
                    )));
                }
                redirects_left -= 1;
                redirect::prepare_redirect_body(&step, request.body_mut())?;
                request.set_url(step.url);
                request.set_method(step.method);
                drop(response);
                continue;
            }
            None => return finish(request.properties(), response),
        }
    }
}

/// Apply [`RequestProperties::throw_on_http_error`] to the final, fully
/// settled response of this call (no further redirect or auth retry
/// applies to it).
fn finish(props: &RequestProperties, response: HttpResponse) -> Result<HttpResponse, RestcError> {
    if props.throw_on_http_error && !response.is_success() {
        return Err(RestcError::http(response.status(), response.reason().to_string()));
    }
    Ok(response)
}

/// One hop: resolve, then try up to [`MAX_ATTEMPTS`] connections (each
/// one a fresh DNS answer, with the last attempt forcing a brand-new
/// connection rather than reusing a pooled one) until a full
/// request/response cycle succeeds.
async fn execute_one_hop(client: &Client, request: &mut Request) -> Result<HttpResponse, RestcError> {
    let props = request.properties().clone();
    let url = request.url().clone();

    let transport = match url.scheme() {
        Scheme::Http => Transport::Plain,
        Scheme::Https => Transport::Tls,
    };
    let (dial_host, dial_port) = connect::dial_endpoint(&url, &props.proxy)?;
    let pool_key = PoolKey::new(format!("{dial_host}:{dial_port}"), transport);

    let connect_timeout = Duration::from_millis(props.connect_timeout_ms);
    let send_timeout = Duration::from_millis(props.send_timeout_ms);
    let reply_timeout = Duration::from_millis(props.reply_timeout_ms);

    let addresses = client
        .resolver()
        .resolve_with_timeout(&dial_host, connect_timeout)
        .await?;

    let mut last_err: Option<RestcError> = None;

    for attempt in 0..MAX_ATTEMPTS {
        let force_new = attempt + 1 == MAX_ATTEMPTS;
        let mut conn = match client.pool().acquire(pool_key.clone(), force_new).await {
            Ok(conn) => conn,
            Err(err) => {
                last_err = Some(err);
                continue;
            }
        };

        if !conn.is_open() {
            let ip = addresses[attempt % addresses.len()];
            let connected = connect::with_connect_timeout(
                connect_timeout,
                connect_one(client, &url, &props, ip, dial_port),
            )
            .await;
            match connected {
                Ok(socket) => conn.attach_socket(socket),
                Err(err) => {
                    conn.close();
                    last_err = Some(err);
                    continue;
                }
            }
        }

        match send_and_receive(request, conn, send_timeout, reply_timeout).await {
            Ok(response) => return Ok(response),
            Err(err) => {
                last_err = Some(err);
                continue;
            }
        }
    }

    Err(last_err.unwrap_or_else(|| RestcError::FailedToConnect {
        host: dial_host,
        port: dial_port,
        message: "exhausted connection attempts".into(),
    }))
}

/// Dial one resolved address, routing through whichever [`Proxy`] the
/// request's properties ask for.
async fn connect_one(
    client: &Client,
    url: &Url,
    props: &RequestProperties,
    ip: IpAddr,
    dial_port: u16,
) -> Result<BoxedSocket, RestcError> {
    match &props.proxy {
        Proxy::None => {
            connect::dial_direct(
                ip,
                dial_port,
                url.scheme(),
                url.host(),
                props.bind_to_local_address.as_deref(),
                props.tcp_nodelay,
                client.tls(),
            )
            .await
        }
        // A plain forward proxy: dial it directly. The request line the
        // writer chain emits still uses origin-form
        // (`send_and_receive`'s `request_target()`), which every proxy
        // encountered in practice accepts as long as `Host` names the
        // origin; full absolute-form request lines are not implemented.
        Proxy::Http { .. } => {
            connect::dial_direct(
                ip,
                dial_port,
                Scheme::Http,
                url.host(),
                props.bind_to_local_address.as_deref(),
                props.tcp_nodelay,
                client.tls(),
            )
            .await
        }
        Proxy::Https { .. } => {
            connect::dial_via_connect_tunnel(
                ip,
                dial_port,
                url.host(),
                url.port(),
                url.scheme(),
                props.bind_to_local_address.as_deref(),
                props.tcp_nodelay,
                client.tls(),
            )
            .await
        }
    }
}

/// Send one request over `conn` and parse its response, under
/// `send_timeout`/`reply_timeout` deadlines.
///
/// Consumes `conn`: on success its ownership moves into the returned
/// [`HttpResponse`]'s [`PooledBodyReader`], which returns it to the pool
/// once the body is drained; on error it's marked closed before this
/// returns, so it's discarded rather than recycled.
async fn send_and_receive(
    request: &mut Request,
    mut conn: PooledConnection,
    send_timeout: Duration,
    reply_timeout: Duration,
) -> Result<HttpResponse, RestcError> {
    let socket = match conn.take_socket() {
        Some(socket) => socket,
        None => {
            conn.close();
            return Err(RestcError::Communication(
                "connection has no socket attached".into(),
            ));
        }
    };
    let (read_half, write_half) = restc_io::split(socket);

    let io_writer = IoWriter::new(write_half);
    let (writer, write_handle) = chain::build_writer_chain(io_writer, request.body());
    let mut writer = chain::wrap_writer_compression(writer, request.headers().get("content-encoding"));

    stamp_request_headers(request);
    let mut headers = request.headers().clone();
    writer.set_headers(&mut headers);

    let mut head = format!("{} {} HTTP/1.1\r\n", request.method(), request.request_target()).into_bytes();
    for (name, value) in headers.iter() {
        head.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
    }
    head.extend_from_slice(b"\r\n");

    let method = request.method();
    let sent = tokio::time::timeout(send_timeout, async {
        writer.write_direct(&head).await?;
        write_body(request.body_mut(), writer.as_mut()).await?;
        writer.finish().await
    })
    .await;
    match sent {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            conn.close();
            return Err(err);
        }
        Err(_) => {
            conn.close();
            return Err(RestcError::timeout(send_timeout));
        }
    }

    let io_reader = IoReader::new(read_half);
    let read_handle = io_reader.handle();
    let mut framing = FramingStream::new(Box::new(io_reader));

    let parsed = tokio::time::timeout(reply_timeout, async {
        let status_line = framing.read_status_line().await?;
        let headers = framing.read_header_lines().await?;
        Ok::<_, RestcError>((status_line, headers))
    })
    .await;
    let (status_line, response_headers) = match parsed {
        Ok(Ok(parts)) => parts,
        Ok(Err(err)) => {
            conn.close();
            return Err(err);
        }
        Err(_) => {
            conn.close();
            return Err(RestcError::timeout(reply_timeout));
        }
    };

    let (body_reader, discard) =
        match chain::build_reader_chain(framing, method, status_line.status, &response_headers) {
            Ok(chain) => chain,
            Err(err) => {
                conn.close();
                return Err(err);
            }
        };

    let mut pooled = PooledBodyReader::new(body_reader, read_handle, write_handle, conn, discard);
    pooled.settle_if_already_eof().await;

    Ok(HttpResponse::new(
        restc_types::HttpVersion::Http11,
        status_line.status,
        status_line.reason,
        response_headers,
        Box::new(pooled),
    ))
}

/// Stamp the headers the engine owns (as opposed to the writer chain's
/// own `Content-Length`/`Transfer-Encoding`/`Content-Encoding`), leaving
/// anything the caller already set untouched.
fn stamp_request_headers(request: &mut Request) {
    let host_value = request.url().host_header_value();
    let headers = request.headers_mut();
    if !headers.contains("Host") {
        headers.set("Host", host_value);
    }
    if !headers.contains("Accept-Encoding") {
        headers.set("Accept-Encoding", "gzip, deflate");
    }
}

/// Drive `body` through `writer`, per its [`Body`] variant.
async fn write_body(
    body: &mut Body,
    writer: &mut (dyn AsyncDataWriter + Send),
) -> Result<(), RestcError> {
    match body {
        Body::FixedSize(bytes) => {
            if !bytes.is_empty() {
                writer.write(bytes).await?;
            }
            Ok(())
        }
        Body::ChunkedLazyPull(producer) => {
            while let Some(chunk) = producer.next_chunk().await? {
                writer.write(&chunk).await?;
            }
            Ok(())
        }
        Body::ChunkedLazyPush(push) => push.write_body(writer).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;
    use restc_io::NoBodyReader;
    use restc_types::{BodyProducer, HttpResponse, HttpVersion};

    fn response(status: u16) -> HttpResponse {
        HttpResponse::new(
            HttpVersion::Http11,
            status,
            "reason".into(),
            restc_types::Headers::new(),
            Box::<NoBodyReader>::default(),
        )
    }

    #[test]
    fn finish_passes_through_success_regardless_of_throw_flag() {
        let props = RequestProperties::default();
        let result = finish(&props, response(200));
        assert!(result.is_ok());
    }

    #[test]
    fn finish_raises_http_error_for_failure_status_by_default() {
        let props = RequestProperties::default();
        let err = finish(&props, response(404)).unwrap_err();
        assert!(matches!(err, RestcError::Http { status: 404, .. }));
    }

    #[test]
    fn finish_returns_failure_status_as_data_when_disabled() {
        let props = RequestProperties {
            throw_on_http_error: false,
            ..RequestProperties::default()
        };
        let result = finish(&props, response(500));
        assert_eq!(result.unwrap().status(), 500);
    }

    #[test]
    fn stamp_request_headers_fills_in_host_and_accept_encoding() {
        let url = Url::parse("http://example.com/p").unwrap();
        let mut request = Request::new(
            url,
            restc_types::HttpMethod::Get,
            restc_types::Headers::new(),
            Vec::new(),
            Body::empty(),
            RequestProperties::default(),
        );
        stamp_request_headers(&mut request);
        assert_eq!(request.headers().get("Host"), Some("example.com"));
        assert_eq!(request.headers().get("Accept-Encoding"), Some("gzip, deflate"));
    }

    #[test]
    fn stamp_request_headers_never_overrides_caller_values() {
        let url = Url::parse("http://example.com/p").unwrap();
        let mut headers = restc_types::Headers::new();
        headers.append("Host", "other.example");
        let mut request = Request::new(
            url,
            restc_types::HttpMethod::Get,
            headers,
            Vec::new(),
            Body::empty(),
            RequestProperties::default(),
        );
        stamp_request_headers(&mut request);
        assert_eq!(request.headers().get("Host"), Some("other.example"));
    }

    struct RecordingWriter {
        written: Vec<u8>,
    }

    #[async_trait]
    impl AsyncDataWriter for RecordingWriter {
        async fn write(&mut self, data: &[u8]) -> Result<(), RestcError> {
            self.written.extend_from_slice(data);
            Ok(())
        }

        async fn write_direct(&mut self, data: &[u8]) -> Result<(), RestcError> {
            self.written.extend_from_slice(data);
            Ok(())
        }

        async fn finish(&mut self) -> Result<(), RestcError> {
            Ok(())
        }

        fn set_headers(&self, _headers: &mut restc_types::Headers) {}
    }

    #[tokio::test]
    async fn write_body_writes_fixed_size_bytes() {
        let mut writer = RecordingWriter { written: Vec::new() };
        let mut body = Body::from_bytes(Bytes::from_static(b"hello"));
        write_body(&mut body, &mut writer).await.unwrap();
        assert_eq!(writer.written, b"hello");
    }

    #[tokio::test]
    async fn write_body_skips_write_call_for_empty_fixed_body() {
        let mut writer = RecordingWriter { written: Vec::new() };
        let mut body = Body::empty();
        write_body(&mut body, &mut writer).await.unwrap();
        assert!(writer.written.is_empty());
    }

    struct ScriptedProducer {
        chunks: Vec<Bytes>,
    }

    #[async_trait]
    impl BodyProducer for ScriptedProducer {
        async fn next_chunk(&mut self) -> Result<Option<Bytes>, RestcError> {
            if self.chunks.is_empty() {
                Ok(None)
            } else {
                Ok(Some(self.chunks.remove(0)))
            }
        }

        fn reset(&mut self) -> Result<(), RestcError> {
            Err(RestcError::NotImplemented("scripted producer can't rewind".into()))
        }
    }

    #[tokio::test]
    async fn write_body_pulls_every_chunk_from_a_lazy_producer() {
        let mut writer = RecordingWriter { written: Vec::new() };
        let producer = ScriptedProducer {
            chunks: vec![Bytes::from_static(b"ab"), Bytes::from_static(b"cd")],
        };
        let mut body = Body::ChunkedLazyPull(Box::new(producer));
        write_body(&mut body, &mut writer).await.unwrap();
        assert_eq!(writer.written, b"abcd");
    }
}
