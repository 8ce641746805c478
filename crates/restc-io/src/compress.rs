//! `Content-Encoding: gzip` / `deflate` decompression and compression,
//! inserted into the reader/writer chain above the framing layer.
//!
//! The teacher's `content_encoding` component compresses and decompresses
//! whole buffers through `flate2`'s write-side `GzEncoder`/`GzDecoder`.
//! This keeps that same write-based decoder, but feeds it incrementally
//! as chunks arrive off the wire instead of requiring the whole body in
//! memory first, since a response body here is read through
//! [`restc_types::AsyncDataReader`] rather than handed over as one slice.

use std::io::Write;

use async_trait::async_trait;
use bytes::Bytes;
use flate2::write::{DeflateDecoder, DeflateEncoder, GzDecoder, GzEncoder};
use flate2::Compression;
use restc_errors::RestcError;
use restc_types::{AsyncDataReader, AsyncDataWriter, Headers};

/// Shared plumbing for a reader that decompresses an inner
/// [`AsyncDataReader`] via a `flate2` write-side decoder.
struct DecodingReader<D> {
    source: Box<dyn AsyncDataReader>,
    decoder: D,
    eof: bool,
}

impl<D> DecodingReader<D>
where
    D: Write,
{
    fn new(source: Box<dyn AsyncDataReader>, decoder: D) -> Self {
        Self {
            source,
            decoder,
            eof: false,
        }
    }

    /// Pull one chunk of compressed bytes off `source` and feed it
    /// through the decoder. A single call may not produce new
    /// decompressed output (zlib buffers internally), so callers loop
    /// until the decoder's buffer grows or `eof` is set.
    async fn pull_decoded(&mut self) -> Result<(), RestcError> {
        let chunk = self.source.read_some().await?;
        if chunk.is_empty() {
            self.eof = true;
            return Ok(());
        }
        self.decoder
            .write_all(&chunk)
            .map_err(|e| RestcError::Decompress(e.to_string()))?;
        self.decoder
            .flush()
            .map_err(|e| RestcError::Decompress(e.to_string()))?;
        if self.source.is_eof() {
            self.eof = true;
        }
        Ok(())
    }
}

/// Decompresses a gzip-encoded body.
pub struct GzipReader {
    inner: DecodingReader<GzDecoder<Vec<u8>>>,
    drained: usize,
}

impl GzipReader {
    /// Wrap the reader that yields the gzip-compressed wire bytes.
    pub fn new(source: Box<dyn AsyncDataReader>) -> Self {
        Self {
            inner: DecodingReader::new(source, GzDecoder::new(Vec::new())),
            drained: 0,
        }
    }
}

#[async_trait]
impl AsyncDataReader for GzipReader {
    async fn read_some(&mut self) -> Result<Bytes, RestcError> {
        loop {
            {
                let buf = self.inner.decoder.get_ref();
                if buf.len() > self.drained {
                    let data = Bytes::copy_from_slice(&buf[self.drained..]);
                    self.drained = buf.len();
                    return Ok(data);
                }
            }
            if self.inner.eof {
                return Ok(Bytes::new());
            }
            self.inner.pull_decoded().await?;
        }
    }

    fn is_eof(&self) -> bool {
        self.inner.eof && self.inner.decoder.get_ref().len() <= self.drained
    }
}

/// Decompresses a raw-deflate-encoded body.
pub struct DeflateReader {
    inner: DecodingReader<DeflateDecoder<Vec<u8>>>,
    drained: usize,
}

impl DeflateReader {
    /// Wrap the reader that yields the deflate-compressed wire bytes.
    pub fn new(source: Box<dyn AsyncDataReader>) -> Self {
        Self {
            inner: DecodingReader::new(source, DeflateDecoder::new(Vec::new())),
            drained: 0,
        }
    }
}

#[async_trait]
impl AsyncDataReader for DeflateReader {
    async fn read_some(&mut self) -> Result<Bytes, RestcError> {
        loop {
            {
                let buf = self.inner.decoder.get_ref();
                if buf.len() > self.drained {
                    let data = Bytes::copy_from_slice(&buf[self.drained..]);
                    self.drained = buf.len();
                    return Ok(data);
                }
            }
            if self.inner.eof {
                return Ok(Bytes::new());
            }
            self.inner.pull_decoded().await?;
        }
    }

    fn is_eof(&self) -> bool {
        self.inner.eof && self.inner.decoder.get_ref().len() <= self.drained
    }
}

/// Compresses request-body writes with gzip before forwarding them.
pub struct GzipWriter {
    next: Box<dyn AsyncDataWriter>,
    encoder: GzEncoder<Vec<u8>>,
}

impl GzipWriter {
    /// Wrap the next writer in the chain.
    pub fn new(next: Box<dyn AsyncDataWriter>) -> Self {
        Self {
            next,
            encoder: GzEncoder::new(Vec::new(), Compression::default()),
        }
    }

    async fn flush_encoded(&mut self) -> Result<(), RestcError> {
        self.encoder
            .flush()
            .map_err(|e| RestcError::Decompress(e.to_string()))?;
        let pending = std::mem::take(self.encoder.get_mut());
        if !pending.is_empty() {
            self.next.write(&pending).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl AsyncDataWriter for GzipWriter {
    async fn write(&mut self, data: &[u8]) -> Result<(), RestcError> {
        self.encoder
            .write_all(data)
            .map_err(|e| RestcError::Decompress(e.to_string()))?;
        self.flush_encoded().await
    }

    async fn write_direct(&mut self, data: &[u8]) -> Result<(), RestcError> {
        self.next.write_direct(data).await
    }

    async fn finish(&mut self) -> Result<(), RestcError> {
        let encoder = std::mem::replace(&mut self.encoder, GzEncoder::new(Vec::new(), Compression::default()));
        let tail = encoder
            .finish()
            .map_err(|e| RestcError::Decompress(e.to_string()))?;
        if !tail.is_empty() {
            self.next.write(&tail).await?;
        }
        self.next.finish().await
    }

    fn set_headers(&self, headers: &mut Headers) {
        headers.set("Content-Encoding", "gzip");
        self.next.set_headers(headers);
    }
}

/// Compresses request-body writes with raw deflate before forwarding
/// them.
pub struct DeflateWriter {
    next: Box<dyn AsyncDataWriter>,
    encoder: DeflateEncoder<Vec<u8>>,
}

impl DeflateWriter {
    /// Wrap the next writer in the chain.
    pub fn new(next: Box<dyn AsyncDataWriter>) -> Self {
        Self {
            next,
            encoder: DeflateEncoder::new(Vec::new(), Compression::default()),
        }
    }

    async fn flush_encoded(&mut self) -> Result<(), RestcError> {
        self.encoder
            .flush()
            .map_err(|e| RestcError::Decompress(e.to_string()))?;
        let pending = std::mem::take(self.encoder.get_mut());
        if !pending.is_empty() {
            self.next.write(&pending).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl AsyncDataWriter for DeflateWriter {
    async fn write(&mut self, data: &[u8]) -> Result<(), RestcError> {
        self.encoder
            .write_all(data)
            .map_err(|e| RestcError::Decompress(e.to_string()))?;
        self.flush_encoded().await
    }

    async fn write_direct(&mut self, data: &[u8]) -> Result<(), RestcError> {
        self.next.write_direct(data).await
    }

    async fn finish(&mut self) -> Result<(), RestcError> {
        let encoder = std::mem::replace(
            &mut self.encoder,
            DeflateEncoder::new(Vec::new(), Compression::default()),
        );
        let tail = encoder
            .finish()
            .map_err(|e| RestcError::Decompress(e.to_string()))?;
        if !tail.is_empty() {
            self.next.write(&tail).await?;
        }
        self.next.finish().await
    }

    fn set_headers(&self, headers: &mut Headers) {
        headers.set("Content-Encoding", "deflate");
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

    #[tokio::test]
    async fn gzip_roundtrip_through_reader_and_encoder() {
        let plain = b"the quick brown fox jumps over the lazy dog";
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(plain).unwrap();
        let compressed = encoder.finish().unwrap();

        let source = Box::new(ScriptedReader {
            chunks: vec![Bytes::from(compressed)],
            pos: 0,
        });
        let mut reader = GzipReader::new(source);

        let mut out = Vec::new();
        while !reader.is_eof() {
            let chunk = reader.read_some().await.unwrap();
            if chunk.is_empty() {
                continue;
            }
            out.extend_from_slice(&chunk);
        }
        assert_eq!(out, plain);
    }
}
