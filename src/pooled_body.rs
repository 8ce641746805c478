//! The outermost link of every response reader chain: owns the
//! connection the response came from, and decides whether it goes back
//! to the pool or gets discarded once the body is fully drained (or the
//! caller drops the response early).
//!
//! Grounded on spec.md §4.3's acquisition contract ("a connection is
//! released back to the pool once its reply has been fully read and no
//! `Connection: close` was seen; dropping a reply before draining
//! discards the connection") and `restc-io::socket`'s documented
//! split/unsplit pairing.

use async_trait::async_trait;
use bytes::Bytes;
use restc_errors::RestcError;
use restc_io::{ReadSocketHandle, WriteSocketHandle};
use restc_pool::PooledConnection;
use restc_types::AsyncDataReader;

/// Wraps the fully-assembled body reader chain, reclaiming both socket
/// halves and returning the connection to its pool once the body
/// reaches logical EOF.
pub struct PooledBodyReader {
    inner: Box<dyn AsyncDataReader>,
    read_handle: ReadSocketHandle,
    write_handle: WriteSocketHandle,
    connection: Option<PooledConnection>,
    discard: bool,
    settled: bool,
}

impl PooledBodyReader {
    /// Wrap `inner` (the top of the decoded/framed body chain), ready
    /// to reclaim `read_handle`/`write_handle` once `inner` reports
    /// EOF. `discard` forces the connection closed regardless of how
    /// cleanly the body drains (used for `Connection: close` replies).
    pub fn new(
        inner: Box<dyn AsyncDataReader>,
        read_handle: ReadSocketHandle,
        write_handle: WriteSocketHandle,
        connection: PooledConnection,
        discard: bool,
    ) -> Self {
        Self {
            inner,
            read_handle,
            write_handle,
            connection: Some(connection),
            discard,
            settled: false,
        }
    }

    /// Run the chain's own EOF check and settle immediately if it's
    /// already true. Used right after construction for request/response
    /// pairs whose body is empty from the start (`HEAD`, `204`), which
    /// might never see a `read_some()` call at all.
    pub async fn settle_if_already_eof(&mut self) {
        if self.inner.is_eof() {
            self.settle().await;
        }
    }

    async fn settle(&mut self) {
        if self.settled {
            return;
        }
        self.settled = true;
        let Some(mut connection) = self.connection.take() else {
            return;
        };

        if self.discard {
            connection.close();
            return;
        }

        match (self.read_handle.reclaim().await, self.write_handle.reclaim().await) {
            (Some(read_half), Some(write_half)) => {
                let socket = restc_io::unsplit(read_half, write_half);
                connection.return_socket(socket);
                tracing::trace!(id = %connection.id(), "connection drained and returned to pool");
            }
            _ => {
                tracing::trace!(id = %connection.id(), "socket halves unavailable, discarding");
                connection.close();
            }
        }
        // `connection` drops here, releasing back to the pool (or
        // discarding, per `Connection::is_open`).
    }
}

#[async_trait]
impl AsyncDataReader for PooledBodyReader {
    async fn read_some(&mut self) -> Result<Bytes, RestcError> {
        let result = self.inner.read_some().await;
        match &result {
            Ok(data) if data.is_empty() || self.inner.is_eof() => self.settle().await,
            Err(_) => {
                self.discard = true;
                self.settle().await;
            }
            _ => {}
        }
        result
    }

    fn is_eof(&self) -> bool {
        self.inner.is_eof()
    }
}

impl Drop for PooledBodyReader {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        // Dropped before the body was drained: discard rather than
        // risk handing back a connection sitting mid-body.
        if let Some(connection) = self.connection.as_mut() {
            connection.close();
        }
    }
}
