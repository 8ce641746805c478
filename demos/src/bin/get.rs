//! Demo: a plain `GET` against an in-process fixture server.

use restc::Client;
use restc_demos::{fixture_server, RequestBuilder};
use restc_types::ClientConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let addr = fixture_server::spawn().await?;
    let client = Client::new(ClientConfig::default())?;

    let request = RequestBuilder::get(&format!("http://{addr}/hello"))?
        .header("X-Demo", "get")
        .build();

    let mut response = client.execute(request).await?;
    let body = response.read_body_to_bytes().await?;

    println!("status: {}", response.status());
    println!("body: {}", String::from_utf8_lossy(&body));

    client.shutdown().await;
    Ok(())
}
