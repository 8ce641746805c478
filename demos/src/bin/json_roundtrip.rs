//! Demo: streaming a JSON response body straight into a typed record.

use restc::Client;
use restc_demos::{fixture_server, RequestBuilder};
use restc_json::{deserialize_from_bytes, DeserializeOptions, Record};
use restc_types::ClientConfig;

#[derive(Record, Debug)]
struct Account {
    id: u64,
    name: String,
    balance: f64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = fixture_server::spawn().await?;
    let client = Client::new(ClientConfig::default())?;

    let request = RequestBuilder::get(&format!("http://{addr}/account"))?.build();
    let mut response = client.execute(request).await?;
    let body = response.read_body_to_bytes().await?;

    let account: Account = deserialize_from_bytes(&body, &DeserializeOptions::default())?;
    println!("{account:?}");

    client.shutdown().await;
    Ok(())
}
