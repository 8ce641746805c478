//! Assembling the writer chain for a request body and the reader chain
//! for a response body, bottom-up, from the primitives in `restc-io`.
//!
//! Grounded on spec.md §4.2 ("known length implies `Content-Length`,
//! unknown length implies chunked transfer; `Content-Encoding` wraps
//! whichever framing applies") and `restc-io`'s per-filter doc comments.

use async_trait::async_trait;
use bytes::Bytes;
use restc_errors::RestcError;
use restc_io::{
    ChunkedReader, ChunkedWriter, DeflateReader, DeflateWriter, FramingStream, GzipReader,
    GzipWriter, IoWriter, NoBodyReader, NoBodyWriter, PlainReader, PlainWriter, WriteSocketHandle,
};
use restc_types::{AsyncDataReader, AsyncDataWriter, Body, Headers, HttpMethod};

/// Build the writer chain for `body`, returning it boxed together with a
/// handle that can reclaim the underlying socket half once the caller is
/// done writing through it.
pub fn build_writer_chain(
    io_writer: IoWriter,
    body: &Body,
) -> (Box<dyn AsyncDataWriter>, WriteSocketHandle) {
    let handle = io_writer.handle();
    let mut writer: Box<dyn AsyncDataWriter> = Box::new(io_writer);
    writer = match body.known_length() {
        Some(0) => Box::new(NoBodyWriter::new(writer)),
        Some(len) => Box::new(PlainWriter::new(len, writer)),
        None => Box::new(ChunkedWriter::new(writer)),
    };
    (writer, handle)
}

/// Build the reader chain for one response, selecting framing from the
/// method/status/headers and layering decompression on top.
///
/// Returns the boxed chain along with whether the connection this body
/// came from must be discarded rather than returned to the pool once
/// drained (no clean framing boundary, or the peer asked for
/// `Connection: close`).
pub fn build_reader_chain(
    framing: FramingStream,
    method: HttpMethod,
    status: u16,
    headers: &Headers,
) -> Result<(Box<dyn AsyncDataReader>, bool), RestcError> {
    let wants_no_body = method.never_has_response_body() || matches!(status, 204 | 304);

    let (base, discard_framing): (Box<dyn AsyncDataReader>, bool) = if wants_no_body {
        (Box::<NoBodyReader>::default(), false)
    } else if let Some(te) = headers.get("transfer-encoding") {
        if te.to_ascii_lowercase().contains("chunked") {
            (Box::new(ChunkedReader::new(framing)), false)
        } else {
            return Err(RestcError::Protocol(format!(
                "unsupported Transfer-Encoding: {te}"
            )));
        }
    } else if let Some(cl) = headers.get("content-length") {
        let len: u64 = cl
            .trim()
            .parse()
            .map_err(|_| RestcError::Protocol(format!("invalid Content-Length: {cl}")))?;
        (Box::new(PlainReader::new(len, framing)), false)
    } else {
        (Box::new(ReadUntilCloseReader::new(framing)), true)
    };

    let discard_close_header = headers
        .get("connection")
        .map(|v| v.to_ascii_lowercase().contains("close"))
        .unwrap_or(false);

    let body: Box<dyn AsyncDataReader> = match headers.get("content-encoding") {
        Some(encoding) if encoding.eq_ignore_ascii_case("gzip") => Box::new(GzipReader::new(base)),
        Some(encoding) if encoding.eq_ignore_ascii_case("deflate") => {
            Box::new(DeflateReader::new(base))
        }
        _ => base,
    };

    Ok((body, discard_framing || discard_close_header))
}

/// Layer request-body compression onto a writer chain, if `encoding` asks
/// for it. `encoding` is `None` unless the caller explicitly set a
/// `Content-Encoding` request header the engine recognizes.
pub fn wrap_writer_compression(
    writer: Box<dyn AsyncDataWriter>,
    encoding: Option<&str>,
) -> Box<dyn AsyncDataWriter> {
    match encoding {
        Some(e) if e.eq_ignore_ascii_case("gzip") => Box::new(GzipWriter::new(writer)),
        Some(e) if e.eq_ignore_ascii_case("deflate") => Box::new(DeflateWriter::new(writer)),
        _ => writer,
    }
}

/// A response with neither `Transfer-Encoding: chunked` nor
/// `Content-Length`: the body runs until the connection closes. Not
/// documented in `restc-io` because it can never be reused — the
/// connection it reads from is always discarded afterward.
struct ReadUntilCloseReader {
    stream: FramingStream,
    eof: bool,
}

impl ReadUntilCloseReader {
    fn new(stream: FramingStream) -> Self {
        Self { stream, eof: false }
    }
}

#[async_trait]
impl AsyncDataReader for ReadUntilCloseReader {
    async fn read_some(&mut self) -> Result<Bytes, RestcError> {
        if self.eof {
            return Ok(Bytes::new());
        }
        let data = self.stream.read_some_raw().await?;
        if data.is_empty() {
            self.eof = true;
        }
        Ok(data)
    }

    fn is_eof(&self) -> bool {
        self.eof || self.stream.is_eof()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_chain_picks_no_body_for_empty_fixed_size() {
        // known_length() == Some(0) must route to NoBodyWriter; exercised
        // indirectly through build_writer_chain's match arms at the type
        // level (construction here would need a live socket, so this
        // just pins the known_length contract build_writer_chain relies
        // on).
        let body = Body::empty();
        assert_eq!(body.known_length(), Some(0));
    }
}
