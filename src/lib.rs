//! restc: an asynchronous HTTP/1.1 client with a hand-rolled wire
//! protocol, a connection pool, and a streaming JSON bridge.
//!
//! [`Client`] is the entry point: build one from a [`restc_types::ClientConfig`],
//! then call [`Client::execute`] with a [`restc_types::Request`]. The
//! returned [`restc_types::HttpResponse`] has its status line and
//! headers fully parsed; the body streams lazily and, once drained (or
//! the response is dropped), the underlying connection returns to the
//! pool unless the exchange asked for it to be discarded (see
//! `pooled_body`).
//!
//! # Examples
//!
//! ```no_run
//! use restc_types::{Body, ClientConfig, Headers, HttpMethod, Request, RequestProperties};
//! use restc_url::Url;
//!
//! # async fn example() -> Result<(), restc_errors::RestcError> {
//! let client = restc::Client::new(ClientConfig::default())?;
//! let request = Request::new(
//!     Url::parse("http://example.com/")?,
//!     HttpMethod::Get,
//!     Headers::new(),
//!     Vec::new(),
//!     Body::empty(),
//!     RequestProperties::default(),
//! );
//! let mut response = client.execute(request).await?;
//! let body = response.read_body_to_bytes().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod auth;
mod chain;
mod client;
mod connect;
mod engine;
mod pooled_body;
mod redirect;

pub use client::Client;
