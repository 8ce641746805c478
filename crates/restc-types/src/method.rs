//! HTTP request methods.

/// The HTTP verbs the engine can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// OPTIONS
    Options,
    /// HEAD
    Head,
    /// PATCH
    Patch,
}

impl HttpMethod {
    /// The wire representation used on the request line.
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// True for methods whose response never carries a body (`HEAD`).
    ///
    /// A `GET` can still get a bodyless `204` reply; that's handled by the
    /// response's status code, not the method, so it's checked separately
    /// (see spec.md §8 boundary behaviors: "HEAD and 204 never read a body
    /// regardless of headers").
    pub fn never_has_response_body(self) -> bool {
        matches!(self, HttpMethod::Head)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_representation() {
        assert_eq!(HttpMethod::Get.as_str(), "GET");
        assert_eq!(HttpMethod::Patch.as_str(), "PATCH");
    }

    #[test]
    fn only_head_never_has_body() {
        assert!(HttpMethod::Head.never_has_response_body());
        assert!(!HttpMethod::Get.never_has_response_body());
    }
}
