//! Request/response body contracts and the reader/writer trait seams that
//! the filter chain in `restc-io` plugs into.
//!
//! The chain pattern is the same on both ends: each link reads from (or
//! writes to) the next link, and only the link at the end of the chain
//! touches the socket. That lets chunked framing, gzip/deflate, and
//! plain content-length framing compose freely instead of each needing
//! to know about the others.

use async_trait::async_trait;
use bytes::Bytes;

use crate::Headers;

/// Pull-based source of response bytes.
///
/// Implementors form a chain: a [`AsyncDataReader`] for gzip decompression
/// wraps a chunked-transfer reader, which wraps the raw socket reader, and
/// so on. Each call to `read_some` is expected to return the next
/// available chunk, however large or small; callers loop until
/// `is_eof()`.
#[async_trait]
pub trait AsyncDataReader: Send {
    /// Read the next chunk of body data.
    ///
    /// Returns an empty [`Bytes`] only at or after EOF. Implementations
    /// should avoid returning empty buffers before EOF to keep callers
    /// from spinning.
    async fn read_some(&mut self) -> Result<Bytes, restc_errors::RestcError>;

    /// True once every byte of the body has been delivered.
    fn is_eof(&self) -> bool;
}

/// Push-based sink for request bytes.
///
/// Mirrors [`AsyncDataReader`] on the write side: a chunked-transfer
/// writer sits in front of the raw socket writer, hex-framing whatever is
/// written through it.
#[async_trait]
pub trait AsyncDataWriter: Send {
    /// Write a buffer, letting this link apply its framing (e.g. chunk
    /// size prefixes) before forwarding to the next link.
    async fn write(&mut self, data: &[u8]) -> Result<(), restc_errors::RestcError>;

    /// Write a buffer verbatim, bypassing this link's framing.
    ///
    /// Used to emit the request's header block, which must not be
    /// chunk-encoded even when the body that follows it is.
    async fn write_direct(&mut self, data: &[u8]) -> Result<(), restc_errors::RestcError>;

    /// Flush any buffered state and emit end-of-body framing (the
    /// terminating `0\r\n\r\n` chunk, for example).
    async fn finish(&mut self) -> Result<(), restc_errors::RestcError>;

    /// Let this link add the headers it needs (`Content-Length`,
    /// `Transfer-Encoding: chunked`, `Content-Encoding: gzip`, ...).
    ///
    /// Called bottom-up while the writer chain is being assembled, so
    /// headers end up reflecting the full chain rather than just its
    /// outermost link.
    fn set_headers(&self, headers: &mut Headers);
}

/// A source of request-body data supplied lazily, pulled by the engine.
///
/// Used for [`Body::ChunkedLazyPull`]: the caller is asked for the next
/// buffer each time the writer chain is ready for more, rather than
/// handing over the whole body up front.
#[async_trait]
pub trait BodyProducer: Send + Sync {
    /// Produce the next buffer, or `None` at end of body.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, restc_errors::RestcError>;

    /// Rewind to the start of the body, for a retried request.
    ///
    /// # Errors
    ///
    /// Returns [`restc_errors::RestcError::NotImplemented`] if the
    /// producer has already consumed non-seekable state and can't
    /// restart (for example, a body sourced from a one-shot stream).
    fn reset(&mut self) -> Result<(), restc_errors::RestcError>;
}

/// A sink the caller writes request-body data into directly.
///
/// Used for [`Body::ChunkedLazyPush`]: rather than the engine pulling
/// data, the caller is hand a live [`AsyncDataWriter`] once the
/// connection is ready to send the body.
#[async_trait]
pub trait PushBody: Send + Sync {
    /// Write the whole body through `writer`, then return. The engine
    /// calls `writer.finish()` afterward.
    async fn write_body(
        &mut self,
        writer: &mut (dyn AsyncDataWriter + Send),
    ) -> Result<(), restc_errors::RestcError>;
}

/// The request body, in one of three shapes.
///
/// Mirrors `RequestBody::Type` from the original engine: a body is either
/// known up front (`FixedSize`), produced lazily on request
/// (`ChunkedLazyPull`), or written directly by the caller once the
/// connection is ready (`ChunkedLazyPush`).
pub enum Body {
    /// The full body is already in memory, with a known length.
    FixedSize(Bytes),
    /// The body is produced a chunk at a time via [`BodyProducer`].
    ChunkedLazyPull(Box<dyn BodyProducer>),
    /// The caller writes the body directly via [`PushBody`].
    ChunkedLazyPush(Box<dyn PushBody>),
}

impl Body {
    /// An empty, fixed-size body (the common case for `GET`/`DELETE`).
    pub fn empty() -> Self {
        Body::FixedSize(Bytes::new())
    }

    /// A fixed-size body built from any byte source.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Body::FixedSize(data.into())
    }

    /// The content length, if known without consuming the body.
    ///
    /// Only [`Body::FixedSize`] can answer this; the lazy variants return
    /// `None`, forcing the engine to negotiate `Transfer-Encoding:
    /// chunked` for them (see spec.md §8: known length implies
    /// `Content-Length`, unknown length implies chunked transfer).
    pub fn known_length(&self) -> Option<u64> {
        match self {
            Body::FixedSize(b) => Some(b.len() as u64),
            Body::ChunkedLazyPull(_) | Body::ChunkedLazyPush(_) => None,
        }
    }

    /// True for [`Body::FixedSize`] with zero bytes.
    pub fn is_empty(&self) -> bool {
        matches!(self, Body::FixedSize(b) if b.is_empty())
    }
}

impl std::fmt::Debug for Body {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Body::FixedSize(b) => f.debug_tuple("FixedSize").field(&b.len()).finish(),
            Body::ChunkedLazyPull(_) => f.write_str("ChunkedLazyPull(..)"),
            Body::ChunkedLazyPush(_) => f.write_str("ChunkedLazyPush(..)"),
        }
    }
}
