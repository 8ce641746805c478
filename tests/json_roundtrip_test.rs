//! JSON round-trip scenario from `SPEC_FULL.md` §8: a response body
//! streamed through [`restc_json::deserialize_from_bytes`] into a
//! `#[derive(Record)]` struct.

mod support;

use restc::Client;
use restc_json::{deserialize_from_bytes, DeserializeOptions, Record};
use restc_types::{Body, ClientConfig, Executor, Headers, HttpMethod, Request, RequestProperties};
use restc_url::Url;

#[derive(Record, Debug, PartialEq)]
struct Account {
    id: u64,
    name: String,
    balance: f64,
}

#[tokio::test]
async fn json_round_trip_deserializes_response_body() {
    let addr = support::spawn(|_method, _path| async move {
        support::fixed_response(
            200,
            "OK",
            "application/json",
            br#"{"id":100,"name":"John Doe","balance":123.45}"#,
        )
    })
    .await;

    let client = Client::new(ClientConfig::new(Executor::Inline, RequestProperties::default()))
        .expect("client");
    let url = Url::parse(&format!("http://{addr}/account")).expect("valid fixture URL");
    let request = Request::new(
        url,
        HttpMethod::Get,
        Headers::new(),
        Vec::new(),
        Body::empty(),
        RequestProperties::default(),
    );

    let mut response = client.execute(request).await.expect("request succeeds");
    assert_eq!(response.status(), 200);

    let body = response.read_body_to_bytes().await.expect("read body");
    let account: Account =
        deserialize_from_bytes(&body, &DeserializeOptions::default()).expect("valid JSON");

    assert_eq!(
        account,
        Account {
            id: 100,
            name: "John Doe".to_string(),
            balance: 123.45,
        }
    );

    client.shutdown().await;
}
