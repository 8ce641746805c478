//! `Transfer-Encoding: chunked` framing.
//!
//! Grounded on `ChunkedReaderImpl.cpp` / `ChunkedWriterImpl.cpp`: hex
//! chunk-size line, chunk body, a padding CRLF, repeat; a zero-length
//! chunk is followed by an optional trailer and the terminating blank
//! line.

use async_trait::async_trait;
use bytes::Bytes;
use restc_errors::RestcError;
use restc_types::{AsyncDataReader, AsyncDataWriter, Headers};

use crate::framing_stream::FramingStream;

/// Substates of the chunked-body state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkedState {
    GetSize,
    InSegment,
    InTrailer,
    Done,
}

/// Reads a chunked body, one chunk at a time, and consumes the trailer.
pub struct ChunkedReader {
    stream: FramingStream,
    state: ChunkedState,
    chunk_remaining: u64,
    eat_padding: bool,
}

impl ChunkedReader {
    /// Wrap the framing stream the chunk-size lines and chunk bodies are
    /// read from.
    pub fn new(stream: FramingStream) -> Self {
        Self {
            stream,
            state: ChunkedState::GetSize,
            chunk_remaining: 0,
            eat_padding: false,
        }
    }

    /// Any trailer header lines seen after the terminating `0` chunk.
    /// Populated only once [`ChunkedReader::is_eof`] is true.
    pub fn into_inner(self) -> FramingStream {
        self.stream
    }

    async fn eat_chunk_padding(&mut self) -> Result<(), RestcError> {
        if !self.eat_padding {
            return Ok(());
        }
        self.eat_padding = false;
        if self.stream.getc().await? != b'\r' {
            return Err(RestcError::Protocol("chunk: missing padding CR".into()));
        }
        if self.stream.getc().await? != b'\n' {
            return Err(RestcError::Protocol("chunk: missing padding LF".into()));
        }
        Ok(())
    }

    async fn next_chunk_len(&mut self) -> Result<u64, RestcError> {
        const MAX_CHUNK_SIZE_DIGITS: usize = 7;

        let mut ch = self.stream.getc().await?;
        if !(ch as char).is_ascii_hexdigit() {
            return Err(RestcError::Parse("missing chunk-length in new chunk".into()));
        }
        let mut len: u64 = 0;
        let mut digits = 0;
        while (ch as char).is_ascii_hexdigit() {
            digits += 1;
            if digits > MAX_CHUNK_SIZE_DIGITS {
                return Err(RestcError::Constraint(
                    "chunk-size line exceeds 7 hex digits".into(),
                ));
            }
            let digit = (ch as char).to_digit(16).expect("checked hexdigit") as u64;
            len = len * 16 + digit;
            ch = self.stream.getc().await?;
        }
        // Skip chunk extensions (`;ext=value`) up to the CR.
        while ch != b'\r' {
            ch = self.stream.getc().await?;
        }
        if self.stream.getc().await? != b'\n' {
            return Err(RestcError::Protocol("chunk: missing LF after chunk-size".into()));
        }
        Ok(len)
    }
}

#[async_trait]
impl AsyncDataReader for ChunkedReader {
    async fn read_some(&mut self) -> Result<Bytes, RestcError> {
        loop {
            match self.state {
                ChunkedState::Done => return Ok(Bytes::new()),
                ChunkedState::GetSize => {
                    self.eat_chunk_padding().await?;
                    let len = self.next_chunk_len().await?;
                    if len == 0 {
                        self.state = ChunkedState::InTrailer;
                    } else {
                        self.chunk_remaining = len;
                        self.state = ChunkedState::InSegment;
                    }
                }
                ChunkedState::InSegment => {
                    let data = self
                        .stream
                        .get_data(self.chunk_remaining as usize)
                        .await?;
                    self.chunk_remaining -= data.len() as u64;
                    if self.chunk_remaining == 0 {
                        self.eat_padding = true;
                        self.state = ChunkedState::GetSize;
                    }
                    if !data.is_empty() {
                        return Ok(data);
                    }
                }
                ChunkedState::InTrailer => {
                    let _trailer = self.stream.read_header_lines().await?;
                    self.state = ChunkedState::Done;
                    return Ok(Bytes::new());
                }
            }
        }
    }

    fn is_eof(&self) -> bool {
        self.state == ChunkedState::Done
    }
}

/// Hex-prefixes every write with its chunk size and appends the
/// terminating `0\r\n\r\n` chunk on [`AsyncDataWriter::finish`].
pub struct ChunkedWriter {
    next: Box<dyn AsyncDataWriter>,
    first: bool,
}

impl ChunkedWriter {
    /// Wrap the next writer in the chain.
    pub fn new(next: Box<dyn AsyncDataWriter>) -> Self {
        Self { next, first: true }
    }

    async fn write_chunk(&mut self, data: &[u8], direct: bool) -> Result<(), RestcError> {
        if data.is_empty() {
            return Ok(());
        }
        let mut header = String::new();
        if self.first {
            self.first = false;
        } else {
            header.push_str("\r\n");
        }
        header.push_str(&format!("{:x}\r\n", data.len()));
        if direct {
            self.next.write_direct(header.as_bytes()).await?;
            self.next.write_direct(data).await
        } else {
            self.next.write(header.as_bytes()).await?;
            self.next.write(data).await
        }
    }
}

#[async_trait]
impl AsyncDataWriter for ChunkedWriter {
    async fn write(&mut self, data: &[u8]) -> Result<(), RestcError> {
        self.write_chunk(data, false).await
    }

    async fn write_direct(&mut self, data: &[u8]) -> Result<(), RestcError> {
        self.next.write_direct(data).await
    }

    async fn finish(&mut self) -> Result<(), RestcError> {
        let trailer = if self.first { "0\r\n\r\n" } else { "\r\n0\r\n\r\n" };
        self.next.write(trailer.as_bytes()).await?;
        self.next.finish().await
    }

    fn set_headers(&self, headers: &mut Headers) {
        headers.set("Transfer-Encoding", "chunked");
        self.next.set_headers(headers);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn scripted(data: &'static [u8]) -> FramingStream {
        FramingStream::new(Box::new(ScriptedReader {
            chunks: vec![Bytes::from_static(data)],
            pos: 0,
        }))
    }

    #[tokio::test]
    async fn reads_two_chunks_then_trailer() {
        let stream = scripted(b"5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n");
        let mut reader = ChunkedReader::new(stream);

        let mut collected = Vec::new();
        while !reader.is_eof() {
            let chunk = reader.read_some().await.unwrap();
            if chunk.is_empty() {
                continue;
            }
            collected.extend_from_slice(&chunk);
        }
        assert_eq!(collected, b"hello world");
    }

    #[tokio::test]
    async fn zero_chunk_with_trailer_headers_ends_cleanly() {
        let stream = scripted(b"0\r\nX-Trailer: done\r\n\r\n");
        let mut reader = ChunkedReader::new(stream);
        let chunk = reader.read_some().await.unwrap();
        assert!(chunk.is_empty());
        assert!(reader.is_eof());
    }

    #[derive(Clone, Default)]
    struct CapturingWriter {
        written: std::sync::Arc<std::sync::Mutex<Vec<u8>>>,
    }

    #[async_trait]
    impl AsyncDataWriter for CapturingWriter {
        async fn write(&mut self, data: &[u8]) -> Result<(), RestcError> {
            self.written.lock().unwrap().extend_from_slice(data);
            Ok(())
        }
        async fn write_direct(&mut self, data: &[u8]) -> Result<(), RestcError> {
            self.written.lock().unwrap().extend_from_slice(data);
            Ok(())
        }
        async fn finish(&mut self) -> Result<(), RestcError> {
            Ok(())
        }
        fn set_headers(&self, _headers: &mut Headers) {}
    }

    #[tokio::test]
    async fn writes_hex_prefixed_chunks_and_terminator() {
        let capturing = CapturingWriter::default();
        let mut writer = ChunkedWriter::new(Box::new(capturing.clone()));
        writer.write(b"hello").await.unwrap();
        writer.write(b"world").await.unwrap();
        writer.finish().await.unwrap();

        let written = capturing.written.lock().unwrap();
        assert_eq!(&written[..], b"5\r\nhello\r\n5\r\nworld\r\n0\r\n\r\n");
    }

    #[tokio::test]
    async fn missing_padding_crlf_is_a_protocol_error() {
        let stream = scripted(b"5\r\nhelloXX6\r\n world\r\n0\r\n\r\n");
        let mut reader = ChunkedReader::new(stream);
        reader.read_some().await.unwrap();
        let err = reader.read_some().await.unwrap_err();
        assert!(matches!(err, RestcError::Protocol(_)), "expected Protocol, got {err:?}");
    }

    #[tokio::test]
    async fn oversized_chunk_size_line_is_a_constraint_error() {
        let stream = scripted(b"11111111\r\nhello\r\n0\r\n\r\n");
        let mut reader = ChunkedReader::new(stream);
        let err = reader.read_some().await.unwrap_err();
        assert!(matches!(err, RestcError::Constraint(_)), "expected Constraint, got {err:?}");
    }
}
