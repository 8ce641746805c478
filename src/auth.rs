//! Basic-auth retry: building the `Authorization` header the engine
//! resends once after a bare `401` challenge.
//!
//! Grounded on spec.md §4.1/§7's 401-retry-once rule;
//! `restc_types::RequestProperties::basic_auth` is this module's only
//! source of credentials (there is no userinfo component in
//! `restc_url::Url`).

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Build an `Authorization: Basic <...>` header value for `user`/`pass`.
pub fn basic_auth_header(user: &str, pass: &str) -> String {
    let raw = format!("{user}:{pass}");
    format!("Basic {}", STANDARD.encode(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_user_and_pass() {
        // "Aladdin:open sesame" is RFC 7617's canonical example.
        assert_eq!(
            basic_auth_header("Aladdin", "open sesame"),
            "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="
        );
    }
}
