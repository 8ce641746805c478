//! `Content-Length`-framed reading and writing.
//!
//! Grounded on `PlainReaderImpl.cpp` / `PlainWriterImpl.cpp`, with one
//! deliberate change: reads are bounded by `get_data(remaining)` against
//! the shared [`FramingStream`] instead of trusting a raw `read_some()`
//! not to cross the body boundary, so a pipelined reply sitting right
//! behind this one in the socket buffer can never leak into the current
//! body (see the pipeline-handling decision in the design notes).

use async_trait::async_trait;
use bytes::Bytes;
use restc_errors::RestcError;
use restc_types::{AsyncDataReader, AsyncDataWriter, Headers};

use crate::framing_stream::FramingStream;

/// Delivers exactly `content_length` bytes, then reports EOF.
pub struct PlainReader {
    stream: FramingStream,
    remaining: u64,
}

impl PlainReader {
    /// Wrap a framing stream, bounding reads to `content_length` bytes.
    pub fn new(content_length: u64, stream: FramingStream) -> Self {
        Self {
            stream,
            remaining: content_length,
        }
    }

    /// Reclaim the underlying framing stream (used when a `NoBodyReader`
    /// or the next response on a pipelined connection needs it).
    pub fn into_inner(self) -> FramingStream {
        self.stream
    }
}

#[async_trait]
impl AsyncDataReader for PlainReader {
    async fn read_some(&mut self) -> Result<Bytes, RestcError> {
        if self.remaining == 0 {
            return Ok(Bytes::new());
        }
        let max = self.remaining.min(usize::MAX as u64) as usize;
        let data = self.stream.get_data(max).await?;
        self.remaining -= data.len() as u64;
        Ok(data)
    }

    fn is_eof(&self) -> bool {
        self.remaining == 0
    }
}

/// Adds a `Content-Length` header and otherwise passes writes straight
/// through to the next writer in the chain.
pub struct PlainWriter {
    next: Box<dyn AsyncDataWriter>,
    content_length: u64,
}

impl PlainWriter {
    /// Wrap the next writer, stamping `content_length` into the header
    /// set when [`AsyncDataWriter::set_headers`] is called.
    pub fn new(content_length: u64, next: Box<dyn AsyncDataWriter>) -> Self {
        Self {
            next,
            content_length,
        }
    }
}

#[async_trait]
impl AsyncDataWriter for PlainWriter {
    async fn write(&mut self, data: &[u8]) -> Result<(), RestcError> {
        self.next.write(data).await
    }

    async fn write_direct(&mut self, data: &[u8]) -> Result<(), RestcError> {
        self.next.write_direct(data).await
    }

    async fn finish(&mut self) -> Result<(), RestcError> {
        self.next.finish().await
    }

    fn set_headers(&self, headers: &mut Headers) {
        headers.set("Content-Length", self.content_length.to_string());
        self.next.set_headers(headers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct ScriptedReader {
        chunks: Vec<Bytes>,
        pos: usize,
    }

    #[async_trait]
    impl AsyncDataReader for ScriptedReader {
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
    async fn stops_exactly_at_content_length() {
        let source = Box::new(ScriptedReader {
            chunks: vec![Bytes::from_static(b"hello-extra-pipelined-data")],
            pos: 0,
        });
        let stream = FramingStream::new(source);
        let mut reader = PlainReader::new(5, stream);

        let body = reader.read_some().await.unwrap();
        assert_eq!(&body[..], b"hello");
        assert!(reader.is_eof());
    }

    #[derive(Default)]
    struct CapturingWriter {
        written: Vec<u8>,
        headers: Headers,
    }

    #[async_trait]
    impl AsyncDataWriter for CapturingWriter {
        async fn write(&mut self, data: &[u8]) -> Result<(), RestcError> {
            self.written.extend_from_slice(data);
            Ok(())
        }
        async fn write_direct(&mut self, data: &[u8]) -> Result<(), RestcError> {
            self.written.extend_from_slice(data);
            Ok(())
        }
        async fn finish(&mut self) -> Result<(), RestcError> {
            Ok(())
        }
        fn set_headers(&self, _headers: &mut Headers) {}
    }

    #[test]
    fn set_headers_stamps_content_length() {
        let writer = PlainWriter::new(42, Box::new(CapturingWriter::default()));
        let mut headers = Headers::new();
        writer.set_headers(&mut headers);
        assert_eq!(headers.get("Content-Length"), Some("42"));
    }
}
