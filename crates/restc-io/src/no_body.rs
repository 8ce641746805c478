//! Readers/writers for requests and responses with no body at all:
//! `HEAD` requests, `204 No Content`, and bodyless `GET`/`DELETE`
//! requests.
//!
//! Grounded on `DataReader::CreateNoBodyReader` / `CreateNoBodyWriter`.

use async_trait::async_trait;
use bytes::Bytes;
use restc_errors::RestcError;
use restc_types::{AsyncDataReader, AsyncDataWriter, Headers};

/// Reports EOF immediately, without touching the socket.
#[derive(Default)]
pub struct NoBodyReader;

#[async_trait]
impl AsyncDataReader for NoBodyReader {
    async fn read_some(&mut self) -> Result<Bytes, RestcError> {
        Ok(Bytes::new())
    }

    fn is_eof(&self) -> bool {
        true
    }
}

/// Writes nothing, just stamps `Content-Length: 0` so the server knows
/// not to wait for a body.
pub struct NoBodyWriter {
    next: Box<dyn AsyncDataWriter>,
}

impl NoBodyWriter {
    /// Wrap the next writer in the chain.
    pub fn new(next: Box<dyn AsyncDataWriter>) -> Self {
        Self { next }
    }
}

#[async_trait]
impl AsyncDataWriter for NoBodyWriter {
    async fn write(&mut self, _data: &[u8]) -> Result<(), RestcError> {
        Ok(())
    }

    async fn write_direct(&mut self, data: &[u8]) -> Result<(), RestcError> {
        self.next.write_direct(data).await
    }

    async fn finish(&mut self) -> Result<(), RestcError> {
        self.next.finish().await
    }

    fn set_headers(&self, headers: &mut Headers) {
        headers.set("Content-Length", "0");
        self.next.set_headers(headers);
    }
}
