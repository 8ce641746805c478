//! The bottom of every reader chain: pulls bytes directly off the
//! socket.
//!
//! Grounded on `DataReader::CreateIoReader` in `DataReader.h`.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use restc_errors::RestcError;
use restc_types::AsyncDataReader;
use tokio::io::AsyncReadExt;
use tokio::sync::Mutex;

use crate::socket::SocketReadHalf;

/// Default size of the buffer used for each `read()` syscall.
const READ_BUFFER_SIZE: usize = 16 * 1024;

/// A cloneable handle that can reclaim the socket half once the chain
/// built on top of an [`IoReader`] has logically finished with it, even
/// after the `IoReader` itself has been boxed away inside a
/// [`restc_types::AsyncDataReader`] trait object and is no longer
/// directly reachable.
#[derive(Clone)]
pub struct ReadSocketHandle(Arc<Mutex<Option<SocketReadHalf>>>);

impl ReadSocketHandle {
    /// Take the socket half back out, if it isn't mid-read right now.
    /// Callers only do this once the reader chain above has reported
    /// logical end-of-body, at which point nothing else is holding the
    /// lock.
    pub async fn reclaim(&self) -> Option<SocketReadHalf> {
        self.0.lock().await.take()
    }
}

/// Reads directly from the socket. Every other reader in a chain
/// eventually bottoms out here.
pub struct IoReader {
    socket: Arc<Mutex<Option<SocketReadHalf>>>,
    eof: bool,
}

impl IoReader {
    /// Wrap a socket's read half.
    pub fn new(socket: SocketReadHalf) -> Self {
        Self {
            socket: Arc::new(Mutex::new(Some(socket))),
            eof: false,
        }
    }

    /// A handle that can reclaim the socket half later, from outside
    /// the chain this reader ends up boxed into.
    pub fn handle(&self) -> ReadSocketHandle {
        ReadSocketHandle(self.socket.clone())
    }
}

#[async_trait]
impl AsyncDataReader for IoReader {
    async fn read_some(&mut self) -> Result<Bytes, RestcError> {
        if self.eof {
            return Ok(Bytes::new());
        }
        let mut guard = self.socket.lock().await;
        let socket = guard
            .as_mut()
            .ok_or_else(|| RestcError::Communication("socket half already reclaimed".into()))?;
        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        let n = socket.read(&mut buf).await?;
        if n == 0 {
            self.eof = true;
            return Ok(Bytes::new());
        }
        buf.truncate(n);
        Ok(Bytes::from(buf))
    }

    fn is_eof(&self) -> bool {
        self.eof
    }
}
