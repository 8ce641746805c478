//! restc_url component
//!
//! A single-pass URL scanner for the subset of URL syntax the HTTP/1.1
//! engine needs (scheme, host, port, path, query string), plus the
//! percent-encoding used to escape query arguments.
//!
//! This deliberately does not wrap the general-purpose `url` crate: the
//! spec calls for a hand-rolled scanner over `http`/`https` URLs only,
//! and a full RFC 3986 implementation is explicitly a non-goal.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

use restc_errors::RestcError;

/// The two transports this client understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Plain TCP.
    Http,
    /// TCP wrapped in TLS.
    Https,
}

impl Scheme {
    /// The default port for this scheme (80 for HTTP, 443 for HTTPS).
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }
}

/// A parsed HTTP(S) URL.
///
/// Immutable once constructed. `path` always starts with `/`; `query`, if
/// present, is the raw text after `?` with no leading `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Url {
    scheme: Scheme,
    host: String,
    port: u16,
    path: String,
    query: Option<String>,
}

impl Url {
    /// Parse a URL of the form `scheme://host[:port][/path][?query]`.
    ///
    /// # Errors
    ///
    /// Returns [`RestcError::Parse`] if the scheme is missing, unknown, or
    /// the host is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use restc_url::{Url, Scheme};
    ///
    /// let url = Url::parse("http://example.com/a/b?x=1").unwrap();
    /// assert_eq!(url.scheme(), Scheme::Http);
    /// assert_eq!(url.host(), "example.com");
    /// assert_eq!(url.port(), 80);
    /// assert_eq!(url.path(), "/a/b");
    /// assert_eq!(url.query(), Some("x=1"));
    /// ```
    pub fn parse(input: &str) -> Result<Self, RestcError> {
        let (scheme, rest) = split_scheme(input)?;

        let rest = rest
            .strip_prefix("//")
            .ok_or_else(|| RestcError::Parse(format!("missing '//' after scheme in {input:?}")))?;

        // Scan the authority (host[:port]) up to the first '/' or '?'.
        let authority_end = rest
            .find(['/', '?'])
            .unwrap_or(rest.len());
        let authority = &rest[..authority_end];
        let after_authority = &rest[authority_end..];

        if authority.is_empty() {
            return Err(RestcError::Parse(format!("missing host in {input:?}")));
        }

        let (host, port) = split_authority(authority, scheme)?;

        // Split the remainder into path and query.
        let (path_part, query) = match after_authority.find('?') {
            Some(pos) => (
                &after_authority[..pos],
                Some(after_authority[pos + 1..].to_string()),
            ),
            None => (after_authority, None),
        };

        let path = if path_part.is_empty() {
            "/".to_string()
        } else {
            path_part.to_string()
        };

        Ok(Url {
            scheme,
            host,
            port,
            path,
            query,
        })
    }

    /// The URL's transport scheme.
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// The hostname, without port.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The port, defaulted to 80/443 if the URL didn't specify one.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The path, always starting with `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The raw query string, if any, without the leading `?`.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// `host`, or `host:port` if the port is non-default for the scheme.
    pub fn host_header_value(&self) -> String {
        if self.port == self.scheme.default_port() {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

fn split_scheme(input: &str) -> Result<(Scheme, &str), RestcError> {
    let pos = input
        .find("://")
        .ok_or_else(|| RestcError::Parse(format!("missing protocol in {input:?}")))?;
    let scheme_str = &input[..pos];
    let scheme = match scheme_str.to_ascii_lowercase().as_str() {
        "http" => Scheme::Http,
        "https" => Scheme::Https,
        other => {
            return Err(RestcError::Parse(format!(
                "unknown protocol {other:?} in {input:?}"
            )))
        }
    };
    Ok((scheme, &input[pos..]))
}

fn split_authority(authority: &str, scheme: Scheme) -> Result<(String, u16), RestcError> {
    match authority.rfind(':') {
        Some(pos) => {
            let host = &authority[..pos];
            let port_str = &authority[pos + 1..];
            if host.is_empty() {
                return Err(RestcError::Parse("empty host before ':'".to_string()));
            }
            let port: u16 = port_str
                .parse()
                .map_err(|_| RestcError::Parse(format!("invalid port {port_str:?}")))?;
            Ok((host.to_string(), port))
        }
        None => Ok((authority.to_string(), scheme.default_port())),
    }
}

/// Bytes that pass through [`encode`] unescaped.
///
/// Matches spec.md §4.1: `- _ . ! ~ * ' ( ) /` plus ASCII alphanumerics.
fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'_' | b'.' | b'!' | b'~' | b'*' | b'\'' | b'(' | b')' | b'/')
}

/// Percent-encode `src`, leaving the unreserved alphabet untouched.
///
/// # Examples
///
/// ```
/// use restc_url::encode;
///
/// assert_eq!(encode("a b/c"), "a%20b/c");
/// ```
pub fn encode(src: &str) -> String {
    let mut out = String::with_capacity(src.len());
    for &b in src.as_bytes() {
        if is_unreserved(b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

/// Reverse of [`encode`].
///
/// # Errors
///
/// Returns [`RestcError::Parse`] on a truncated or non-hex `%HH` escape.
pub fn decode(src: &str) -> Result<String, RestcError> {
    let bytes = src.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .ok_or_else(|| RestcError::Parse("truncated %HH escape".to_string()))?;
                let hex_str = std::str::from_utf8(hex)
                    .map_err(|_| RestcError::Parse("non-ASCII %HH escape".to_string()))?;
                let value = u8::from_str_radix(hex_str, 16)
                    .map_err(|_| RestcError::Parse(format!("invalid %HH escape: {hex_str}")))?;
                out.push(value);
                i += 3;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).map_err(|e| RestcError::Parse(format!("invalid UTF-8 after decode: {e}")))
}
