//! A tiny fluent request-building façade, standing in for spec.md §6's
//! excluded "request builder" collaborator: the core engine only ever
//! consumes a fully-built `restc_types::Request`, never this builder.
//!
//! Grounded on the original command-line example's
//! `RequestBuilder(ctx).Get(url).Header(...).Execute()` call shape.

use bytes::Bytes;
use restc_errors::RestcError;
use restc_types::{Body, Headers, HttpMethod, Request, RequestProperties};
use restc_url::Url;

/// Assembles a [`Request`] through chained calls.
pub struct RequestBuilder {
    url: Url,
    method: HttpMethod,
    headers: Headers,
    query: Vec<(String, String)>,
    body: Body,
    properties: RequestProperties,
}

impl RequestBuilder {
    /// Start building a `GET` request for `url`.
    pub fn get(url: &str) -> Result<Self, RestcError> {
        Self::new(url, HttpMethod::Get)
    }

    /// Start building a `POST` request for `url`.
    pub fn post(url: &str) -> Result<Self, RestcError> {
        Self::new(url, HttpMethod::Post)
    }

    fn new(url: &str, method: HttpMethod) -> Result<Self, RestcError> {
        Ok(Self {
            url: Url::parse(url)?,
            method,
            headers: Headers::new(),
            query: Vec::new(),
            body: Body::empty(),
            properties: RequestProperties::default(),
        })
    }

    /// Append a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Append a query argument.
    pub fn arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Set a fixed-size request body.
    pub fn body(mut self, data: impl Into<Bytes>) -> Self {
        self.body = Body::from_bytes(data);
        self
    }

    /// Override the default request properties.
    pub fn properties(mut self, properties: RequestProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Build the immutable [`Request`] the client executes.
    pub fn build(self) -> Request {
        Request::new(
            self.url,
            self.method,
            self.headers,
            self.query,
            self.body,
            self.properties,
        )
    }
}
