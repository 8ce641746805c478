//! Runnable examples exercising the `restc` client end to end.
//!
//! Not part of the published API; both binaries under `src/bin` import
//! this crate purely for its [`RequestBuilder`] and [`fixture_server`].

pub mod builder;
pub mod fixture_server;

pub use builder::RequestBuilder;
