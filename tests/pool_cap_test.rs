//! Pool-cap scenario from `SPEC_FULL.md` §8: a second request against an
//! endpoint that is already at its per-endpoint/global connection cap
//! must fail with `RestcError::Constraint` rather than queue forever.

mod support;

use std::time::Duration;

use restc::Client;
use restc_errors::RestcError;
use restc_types::{Body, ClientConfig, Executor, Headers, HttpMethod, Request, RequestProperties};
use restc_url::Url;

fn get_request(addr: std::net::SocketAddr, path: &str, properties: RequestProperties) -> Request {
    let url = Url::parse(&format!("http://{addr}{path}")).expect("valid fixture URL");
    Request::new(url, HttpMethod::Get, Headers::new(), Vec::new(), Body::empty(), properties)
}

// The pool's caps are fixed at `Client::new` time, from the client's
// default properties, not from any per-request override.
fn capped_config() -> ClientConfig {
    ClientConfig::new(
        Executor::Inline,
        RequestProperties {
            cache_max_connections: 1,
            cache_max_connections_per_endpoint: 1,
            ..RequestProperties::default()
        },
    )
}

#[tokio::test]
async fn pool_cap_rejects_concurrent_request_over_limit() {
    let addr = support::spawn(|_method, _path| async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        support::fixed_response(200, "OK", "text/plain", b"slow")
    })
    .await;

    let client = Client::new(capped_config()).expect("client");

    let slow_client = client.clone();
    let slow_request = get_request(addr, "/slow", RequestProperties::default());
    let slow_handle = tokio::spawn(async move { slow_client.execute(slow_request).await });

    // Give the first request time to acquire its connection and start
    // waiting on the (deliberately slow) response before the second one
    // races it for the single connection slot.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let second_request = get_request(addr, "/slow", RequestProperties::default());
    let second_result = client.execute(second_request).await;

    let err = second_result.expect_err("second request must be rejected by the pool cap");
    assert!(
        matches!(err, RestcError::Constraint(_)),
        "expected Constraint, got {err:?}"
    );

    let first_response = slow_handle
        .await
        .expect("first request task did not panic")
        .expect("first request eventually succeeds");
    assert_eq!(first_response.status(), 200);

    client.shutdown().await;
}
