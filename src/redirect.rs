//! Redirect handling: deciding whether a response should be followed,
//! and rewriting the request for the hop per RFC 7231 §6.4.
//!
//! Grounded on spec.md §4.1's redirect rules and `Request::set_url`/
//! `set_method`/`set_body`.

use restc_errors::RestcError;
use restc_types::{Body, HttpMethod, HttpResponse};
use restc_url::Url;

/// What a redirect response asks the engine to do to the next attempt's
/// request.
pub struct RedirectStep {
    /// The resolved absolute target.
    pub url: Url,
    /// The method to reissue with. `301`/`302`/`303` downgrade
    /// non-`HEAD` methods to `GET`; `307`/`308` preserve the original.
    pub method: HttpMethod,
    /// Whether the body must be dropped (downgraded to `GET`) rather
    /// than replayed.
    pub drop_body: bool,
}

/// Inspect `response` and decide whether it's a redirect the engine
/// should follow, resolving a relative `Location` against `base`.
///
/// Returns `None` for a non-redirect status, or a redirect status this
/// client doesn't auto-follow (`300`, `304`\u{2013}`306`).
///
/// # Errors
///
/// Returns [`RestcError::Protocol`] if the status is one that should be
/// followed but the response carries no `Location` header.
pub fn redirect_step(
    base: &Url,
    method: HttpMethod,
    response: &HttpResponse,
) -> Result<Option<RedirectStep>, RestcError> {
    let status = response.status();
    if !matches!(status, 301 | 302 | 303 | 307 | 308) {
        return Ok(None);
    }

    let location = response.headers().get("location").ok_or_else(|| {
        RestcError::Protocol(format!("{status} redirect response missing Location header"))
    })?;

    let url = resolve_location(base, location)?;

    let (method, drop_body) = match status {
        307 | 308 => (method, false),
        // 303 always switches to GET; 301/302 do too, except HEAD stays
        // HEAD, matching every mainstream client's handling of the
        // technically-ambiguous original RFC 2616 text.
        _ if method == HttpMethod::Head => (HttpMethod::Head, true),
        _ => (HttpMethod::Get, true),
    };

    Ok(Some(RedirectStep {
        url,
        method,
        drop_body,
    }))
}

/// Resolve a `Location` header value against the request URL it was
/// returned for.
fn resolve_location(base: &Url, location: &str) -> Result<Url, RestcError> {
    if location.contains("://") {
        return Url::parse(location);
    }

    let scheme = match base.scheme() {
        restc_url::Scheme::Http => "http",
        restc_url::Scheme::Https => "https",
    };

    if let Some(path_and_query) = location.strip_prefix('/') {
        return Url::parse(&format!(
            "{scheme}://{}/{path_and_query}",
            base.host_header_value()
        ));
    }

    // Relative to the base path's directory, per RFC 3986 §5.
    let dir = match base.path().rfind('/') {
        Some(pos) => &base.path()[..=pos],
        None => "/",
    };
    Url::parse(&format!(
        "{scheme}://{}{dir}{location}",
        base.host_header_value()
    ))
}

/// Apply a [`RedirectStep`] to the body that will be sent on the next
/// attempt: drop it to empty, or rewind a lazily-produced body so it can
/// be replayed.
///
/// # Errors
///
/// Propagates [`restc_types::BodyProducer::reset`]'s error if the body
/// is a [`Body::ChunkedLazyPull`] that can't rewind.
pub fn prepare_redirect_body(step: &RedirectStep, body: &mut Body) -> Result<(), RestcError> {
    if step.drop_body {
        *body = Body::empty();
        return Ok(());
    }
    match body {
        Body::ChunkedLazyPull(producer) => producer.reset(),
        Body::ChunkedLazyPush(_) => Ok(()),
        Body::FixedSize(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("http://example.com/a/b?x=1").unwrap()
    }

    #[test]
    fn resolves_absolute_location() {
        let url = resolve_location(&base(), "https://other.example/p").unwrap();
        assert_eq!(url.host(), "other.example");
    }

    #[test]
    fn resolves_root_relative_location() {
        let url = resolve_location(&base(), "/new/path").unwrap();
        assert_eq!(url.host(), "example.com");
        assert_eq!(url.path(), "/new/path");
    }

    #[test]
    fn resolves_path_relative_location() {
        let url = resolve_location(&base(), "c").unwrap();
        assert_eq!(url.path(), "/a/c");
    }
}
