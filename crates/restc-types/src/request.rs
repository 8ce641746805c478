//! The immutable request passed to the engine for one execution attempt.

use restc_url::Url;

use crate::{Body, Headers, HttpMethod, RequestProperties};

/// A fully-formed request: URL, verb, merged headers/query, optional
/// body, and the properties in effect for this call.
///
/// Immutable for the lifetime of one execution attempt. A retry (after a
/// redirect, or after a 401 challenge) reuses the same `Request`,
/// resetting its [`Body`] rather than constructing a new one.
pub struct Request {
    url: Url,
    method: HttpMethod,
    headers: Headers,
    query: Vec<(String, String)>,
    body: Body,
    properties: RequestProperties,
}

impl Request {
    /// Build a request, merging `headers`/`query` under the properties'
    /// `default_headers`/`default_args` (request-supplied values win on
    /// collision).
    pub fn new(
        url: Url,
        method: HttpMethod,
        headers: Headers,
        query: Vec<(String, String)>,
        body: Body,
        properties: RequestProperties,
    ) -> Self {
        let merged_headers = headers.merge_under(&properties.default_headers);
        let mut merged_query = query;
        for (k, v) in &properties.default_args {
            if !merged_query.iter().any(|(ek, _)| ek == k) {
                merged_query.push((k.clone(), v.clone()));
            }
        }
        Self {
            url,
            method,
            headers: merged_headers,
            query: merged_query,
            body,
            properties,
        }
    }

    /// The target URL (without query arguments folded in; see
    /// [`Request::query`]).
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The HTTP verb.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// The merged request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Mutable access to the merged request headers, for the engine to
    /// stamp in writer-chain headers (`Content-Length`, `Host`, ...).
    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    /// The merged query arguments, in `(name, value)` form.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// The request body.
    pub fn body(&self) -> &Body {
        &self.body
    }

    /// Mutable access to the request body, so the engine can call
    /// `reset()` on a producer before a retry.
    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Replace the body, used when a redirect changes the method (and so
    /// the body) per RFC 7231 §6.4.
    pub fn set_body(&mut self, body: Body) {
        self.body = body;
    }

    /// Replace the target URL, used when following a redirect.
    pub fn set_url(&mut self, url: Url) {
        self.url = url;
    }

    /// Replace the method, used when a redirect downgrades e.g. a `POST`
    /// to a `GET` (see RFC 7231 §6.4).
    pub fn set_method(&mut self, method: HttpMethod) {
        self.method = method;
    }

    /// The effective properties for this request.
    pub fn properties(&self) -> &RequestProperties {
        &self.properties
    }

    /// The request-line path, including the URL's inline query string
    /// and any merged query arguments, if either is present.
    pub fn request_target(&self) -> String {
        let merged_args = if self.query.is_empty() {
            None
        } else {
            Some(
                self.query
                    .iter()
                    .map(|(k, v)| format!("{}={}", restc_url::encode(k), restc_url::encode(v)))
                    .collect::<Vec<_>>()
                    .join("&"),
            )
        };

        match (self.url.query(), merged_args) {
            (None, None) => self.url.path().to_string(),
            (Some(q), None) => format!("{}?{}", self.url.path(), q),
            (None, Some(args)) => format!("{}?{}", self.url.path(), args),
            (Some(q), Some(args)) => format!("{}?{}&{}", self.url.path(), q, args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_target_includes_merged_query() {
        let url = Url::parse("http://h/p").unwrap();
        let mut props = RequestProperties::default();
        props.default_args.push(("from_default".into(), "1".into()));
        let req = Request::new(
            url,
            HttpMethod::Get,
            Headers::new(),
            vec![("a".into(), "b c".into())],
            Body::empty(),
            props,
        );
        assert_eq!(req.request_target(), "/p?a=b%20c&from_default=1");
    }

    #[test]
    fn request_target_keeps_the_url_inline_query_string() {
        let url = Url::parse("http://h/p?x=1").unwrap();
        let req = Request::new(
            url,
            HttpMethod::Get,
            Headers::new(),
            Vec::new(),
            Body::empty(),
            RequestProperties::default(),
        );
        assert_eq!(req.request_target(), "/p?x=1");
    }

    #[test]
    fn request_target_merges_url_query_with_request_args() {
        let url = Url::parse("http://h/p?x=1").unwrap();
        let req = Request::new(
            url,
            HttpMethod::Get,
            Headers::new(),
            vec![("y".into(), "2".into())],
            Body::empty(),
            RequestProperties::default(),
        );
        assert_eq!(req.request_target(), "/p?x=1&y=2");
    }

    #[test]
    fn request_headers_win_over_defaults() {
        let url = Url::parse("http://h/p").unwrap();
        let mut default_headers = Headers::new();
        default_headers.append("X-Trace", "default");
        let props = RequestProperties {
            default_headers,
            ..RequestProperties::default()
        };
        let mut headers = Headers::new();
        headers.append("X-Trace", "request");
        let req = Request::new(
            url,
            HttpMethod::Get,
            headers,
            Vec::new(),
            Body::empty(),
            props,
        );
        assert_eq!(req.headers().get("X-Trace"), Some("request"));
    }
}
