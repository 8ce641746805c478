//! The bottom of every writer chain: writes bytes directly to the
//! socket.
//!
//! Grounded on `DataWriter::CreateIoWriter` in `DataWriter.h`.

use std::sync::Arc;

use async_trait::async_trait;
use restc_errors::RestcError;
use restc_types::{AsyncDataWriter, Headers};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::socket::SocketWriteHalf;

/// A cloneable handle that can reclaim the socket half once the
/// request has finished sending, even after the [`IoWriter`] has been
/// boxed away inside the writer chain. Mirrors
/// [`crate::io_reader::ReadSocketHandle`].
#[derive(Clone)]
pub struct WriteSocketHandle(Arc<Mutex<Option<SocketWriteHalf>>>);

impl WriteSocketHandle {
    /// Take the socket half back out. Safe to call as soon as the
    /// writer chain's `finish()` has returned; nothing else writes to
    /// it afterwards.
    pub async fn reclaim(&self) -> Option<SocketWriteHalf> {
        self.0.lock().await.take()
    }
}

/// Writes directly to the socket. Every writer chain bottoms out here.
pub struct IoWriter {
    socket: Arc<Mutex<Option<SocketWriteHalf>>>,
}

impl IoWriter {
    /// Wrap a socket's write half.
    pub fn new(socket: SocketWriteHalf) -> Self {
        Self {
            socket: Arc::new(Mutex::new(Some(socket))),
        }
    }

    /// A handle that can reclaim the socket half later, from outside
    /// the chain this writer ends up boxed into.
    pub fn handle(&self) -> WriteSocketHandle {
        WriteSocketHandle(self.socket.clone())
    }
}

#[async_trait]
impl AsyncDataWriter for IoWriter {
    async fn write(&mut self, data: &[u8]) -> Result<(), RestcError> {
        let mut guard = self.socket.lock().await;
        let socket = guard
            .as_mut()
            .ok_or_else(|| RestcError::Communication("socket half already reclaimed".into()))?;
        socket.write_all(data).await?;
        Ok(())
    }

    async fn write_direct(&mut self, data: &[u8]) -> Result<(), RestcError> {
        self.write(data).await
    }

    async fn finish(&mut self) -> Result<(), RestcError> {
        let mut guard = self.socket.lock().await;
        let socket = guard
            .as_mut()
            .ok_or_else(|| RestcError::Communication("socket half already reclaimed".into()))?;
        socket.flush().await?;
        Ok(())
    }

    fn set_headers(&self, _headers: &mut Headers) {
        // The raw socket writer contributes no headers of its own.
    }
}
