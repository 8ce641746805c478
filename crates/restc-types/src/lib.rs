//! Core data model for the restc HTTP/1.1 client: the request/response
//! types, the reader/writer trait contracts the IO chain implements, and
//! the configuration bags that flow from client to request.
//!
//! Nothing in this crate touches a socket; `restc-io` and `restc-pool`
//! provide the concrete implementations of the traits declared here.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod body;
mod config;
mod headers;
mod method;
mod properties;
mod request;
mod response;

pub use body::{AsyncDataReader, AsyncDataWriter, Body, BodyProducer, PushBody};
pub use config::{ClientConfig, Executor};
pub use headers::Headers;
pub use method::HttpMethod;
pub use properties::{Proxy, RequestProperties};
pub use request::Request;
pub use response::{HttpResponse, HttpVersion};
