//! The parsed response returned by the engine.

use bytes::Bytes;
use restc_errors::RestcError;

use crate::{AsyncDataReader, Headers};

/// HTTP versions the engine will parse.
///
/// The engine only ever produces `Http11`; the variant exists so a
/// malformed status line (`HTTP/1.0`, `HTTP/2.0`, garbage) has somewhere
/// to be rejected in terms of the type rather than a raw string compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVersion {
    /// HTTP/1.1, the only version this client speaks.
    Http11,
}

/// A parsed HTTP response: status line and headers are fully available
/// as soon as this is constructed; the body is read lazily through
/// [`HttpResponse::body_mut`].
///
/// Created when the response line and headers are parsed; stays alive
/// until the caller drops it or explicitly releases it, at which point
/// the owning connection returns to the pool (if reusable) or is
/// discarded.
pub struct HttpResponse {
    version: HttpVersion,
    status: u16,
    reason: String,
    headers: Headers,
    body: Box<dyn AsyncDataReader>,
}

impl HttpResponse {
    /// Construct a response from its already-parsed parts.
    pub fn new(
        version: HttpVersion,
        status: u16,
        reason: String,
        headers: Headers,
        body: Box<dyn AsyncDataReader>,
    ) -> Self {
        Self {
            version,
            status,
            reason,
            headers,
            body,
        }
    }

    /// The HTTP version of the response.
    pub fn version(&self) -> HttpVersion {
        self.version
    }

    /// The numeric status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// The reason phrase from the status line.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// True for a `2xx` status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True for a `3xx` status.
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// The response headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Mutable access to the body reader, for pulling payload bytes.
    pub fn body_mut(&mut self) -> &mut dyn AsyncDataReader {
        self.body.as_mut()
    }

    /// Read and concatenate the entire body.
    ///
    /// # Errors
    ///
    /// Propagates any [`RestcError`] raised while reading (protocol
    /// errors, decompression failures, IO timeouts).
    pub async fn read_body_to_bytes(&mut self) -> Result<Bytes, RestcError> {
        let mut buf = Vec::new();
        while !self.body.is_eof() {
            let chunk = self.body.read_some().await?;
            if chunk.is_empty() {
                break;
            }
            buf.extend_from_slice(&chunk);
        }
        Ok(Bytes::from(buf))
    }
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("version", &self.version)
            .field("status", &self.status)
            .field("reason", &self.reason)
            .field("headers", &self.headers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FixedReader {
        chunks: Vec<Bytes>,
        pos: usize,
    }

    #[async_trait]
    impl AsyncDataReader for FixedReader {
        async fn read_some(&mut self) -> Result<Bytes, RestcError> {
            if self.pos >= self.chunks.len() {
                return Ok(Bytes::new());
            }
            let chunk = self.chunks[self.pos].clone();
            self.pos += 1;
            Ok(chunk)
        }

        fn is_eof(&self) -> bool {
            self.pos >= self.chunks.len()
        }
    }

    #[tokio::test]
    async fn read_body_to_bytes_concatenates_chunks() {
        let reader = FixedReader {
            chunks: vec![Bytes::from_static(b"hello "), Bytes::from_static(b"world")],
            pos: 0,
        };
        let mut resp = HttpResponse::new(
            HttpVersion::Http11,
            200,
            "OK".into(),
            Headers::new(),
            Box::new(reader),
        );
        let body = resp.read_body_to_bytes().await.unwrap();
        assert_eq!(&body[..], b"hello world");
    }

    #[test]
    fn status_classification() {
        let reader = FixedReader { chunks: vec![], pos: 0 };
        let resp = HttpResponse::new(
            HttpVersion::Http11,
            301,
            "Moved".into(),
            Headers::new(),
            Box::new(reader),
        );
        assert!(resp.is_redirect());
        assert!(!resp.is_success());
    }
}
