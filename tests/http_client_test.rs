//! Wire-level scenarios against the in-process fixture server: the six
//! cases named in `SPEC_FULL.md` §8 (pool-cap and JSON round-trip live
//! in their own files alongside this one).

mod support;

use bytes::Bytes;
use restc::Client;
use restc_errors::RestcError;
use restc_types::{Body, ClientConfig, Executor, Headers, HttpMethod, Request, RequestProperties};
use restc_url::Url;

fn get_request(addr: std::net::SocketAddr, path: &str, properties: RequestProperties) -> Request {
    let url = Url::parse(&format!("http://{addr}{path}")).expect("valid fixture URL");
    Request::new(url, HttpMethod::Get, Headers::new(), Vec::new(), Body::empty(), properties)
}

fn inline_config() -> ClientConfig {
    ClientConfig::new(Executor::Inline, RequestProperties::default())
}

#[tokio::test]
async fn simple_get_returns_status_and_body() {
    let addr = support::spawn(|_method, path| async move {
        match path.as_str() {
            "/hello" => support::fixed_response(200, "OK", "text/plain", b"hello world"),
            _ => support::fixed_response(404, "Not Found", "text/plain", b""),
        }
    })
    .await;

    let client = Client::new(inline_config()).expect("client");
    let request = get_request(addr, "/hello", RequestProperties::default());
    let mut response = client.execute(request).await.expect("request succeeds");

    assert_eq!(response.status(), 200);
    let body = response.read_body_to_bytes().await.expect("read body");
    assert_eq!(body, Bytes::from_static(b"hello world"));

    client.shutdown().await;
}

#[tokio::test]
async fn chunked_get_decodes_full_body() {
    let payload = b"the quick brown fox jumps over the lazy dog".to_vec();
    let addr = support::spawn(move |_method, _path| {
        let payload = payload.clone();
        async move { support::chunked_response(200, "OK", &payload, 7) }
    })
    .await;

    let client = Client::new(inline_config()).expect("client");
    let request = get_request(addr, "/stream", RequestProperties::default());
    let mut response = client.execute(request).await.expect("request succeeds");

    assert_eq!(response.status(), 200);
    let body = response.read_body_to_bytes().await.expect("read chunked body");
    assert_eq!(body, Bytes::from_static(b"the quick brown fox jumps over the lazy dog"));

    client.shutdown().await;
}

#[tokio::test]
async fn redirect_is_followed_to_final_resource() {
    let addr = support::spawn(|_method, path| async move {
        match path.as_str() {
            "/start" => support::redirect_response(302, "Found", "/final"),
            "/final" => support::fixed_response(200, "OK", "text/plain", b"arrived"),
            _ => support::fixed_response(404, "Not Found", "text/plain", b""),
        }
    })
    .await;

    let client = Client::new(inline_config()).expect("client");
    let request = get_request(addr, "/start", RequestProperties::default());
    let mut response = client.execute(request).await.expect("redirect is followed");

    assert_eq!(response.status(), 200);
    let body = response.read_body_to_bytes().await.expect("read body");
    assert_eq!(body, Bytes::from_static(b"arrived"));

    client.shutdown().await;
}

#[tokio::test]
async fn redirect_loop_fails_with_constraint_error() {
    let addr = support::spawn(|_method, _path| async move {
        support::redirect_response(302, "Found", "/loop")
    })
    .await;

    let client = Client::new(inline_config()).expect("client");
    let properties = RequestProperties {
        max_redirects: 2,
        ..RequestProperties::default()
    };
    let request = get_request(addr, "/loop", properties);
    let err = client.execute(request).await.expect_err("redirect loop must fail");

    assert!(
        matches!(err, RestcError::Constraint(_)),
        "expected Constraint, got {err:?}"
    );

    client.shutdown().await;
}
