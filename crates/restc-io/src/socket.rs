//! The socket abstraction the reader/writer chain is built on.
//!
//! Grounded on `Socket.h`'s pure-virtual interface: the chain never
//! knows whether it's talking to a plain TCP socket or a TLS stream, it
//! just needs something that reads and writes bytes asynchronously.
//! `restc-pool` is the only crate that constructs a concrete socket
//! (plain via `tokio::net::TcpStream`, TLS via `restc-tls`).

use tokio::io::{AsyncRead, AsyncWrite, ReadHalf, WriteHalf};

/// Anything that can serve as the transport for one connection.
pub trait AsyncSocket: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> AsyncSocket for T {}

/// A type-erased transport: a plain `TcpStream` or a TLS stream, boxed so
/// the pool can hold either behind one type.
pub type BoxedSocket = Box<dyn AsyncSocket>;

/// The read half of a split [`BoxedSocket`].
pub type SocketReadHalf = ReadHalf<BoxedSocket>;

/// The write half of a split [`BoxedSocket`].
pub type SocketWriteHalf = WriteHalf<BoxedSocket>;

/// Split a socket into independent read/write halves so the reader and
/// writer chains can be driven without borrow conflicts.
///
/// The two halves are reassembled with [`tokio::io::ReadHalf::unsplit`]
/// once both chains have finished. Because `IoReader`/`IoWriter` give
/// out reclaim handles (see [`crate::IoReader::handle`] and
/// [`crate::IoWriter::handle`]) rather than owning the half outright,
/// the engine can get each half back regardless of how many filters
/// got boxed on top, and return the reunited socket to the pool.
pub fn split(socket: BoxedSocket) -> (SocketReadHalf, SocketWriteHalf) {
    tokio::io::split(socket)
}

/// Reassemble a previously [`split`] socket.
pub fn unsplit(read: SocketReadHalf, write: SocketWriteHalf) -> BoxedSocket {
    read.unsplit(write)
}
