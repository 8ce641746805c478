//! The connection itself: a stable identity plus an optional socket.
//!
//! Grounded on `Connection.h`: `GetId()` for the stable identity,
//! `GetSocket()` for the transport. A freshly-acquired slot with no
//! socket yet models "the connection is not yet connected; the engine
//! performs the connect asynchronously" (spec.md §4.3 step 3).

use restc_io::BoxedSocket;
use uuid::Uuid;

/// One pooled connection's identity and (once connected) its socket.
pub struct Connection {
    id: Uuid,
    socket: Option<BoxedSocket>,
}

impl Connection {
    /// A fresh, not-yet-connected slot.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            socket: None,
        }
    }

    /// The connection's stable identity, used in logging.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Attach a socket after the engine completes the connect/handshake.
    pub fn attach_socket(&mut self, socket: BoxedSocket) {
        self.socket = Some(socket);
    }

    /// Take the socket out, typically to split it into reader/writer
    /// halves for one request/response cycle.
    pub fn take_socket(&mut self) -> Option<BoxedSocket> {
        self.socket.take()
    }

    /// Put a (possibly reassembled) socket back after use.
    pub fn return_socket(&mut self, socket: BoxedSocket) {
        self.socket = Some(socket);
    }

    /// True once a socket has been attached and not explicitly closed.
    ///
    /// Doesn't probe the socket for liveness; a connection that is open
    /// here can still fail on its next IO operation, same as the
    /// underlying TCP socket.
    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    /// Mark the connection closed, dropping the socket.
    pub fn close(&mut self) {
        self.socket = None;
    }
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("open", &self.is_open())
            .finish()
    }
}
