//! The reader/writer filter chain: each link reads from (or writes to)
//! the next, and only the link at either end of the chain touches the
//! socket. Chunked framing, gzip/deflate, plain content-length framing,
//! and the no-body case all compose through this one seam.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod chunked;
mod compress;
mod framing_stream;
mod io_reader;
mod io_writer;
mod no_body;
mod plain;
mod socket;

pub use chunked::{ChunkedReader, ChunkedWriter};
pub use compress::{DeflateReader, DeflateWriter, GzipReader, GzipWriter};
pub use framing_stream::{FramingStream, StatusLine};
pub use io_reader::{IoReader, ReadSocketHandle};
pub use io_writer::{IoWriter, WriteSocketHandle};
pub use no_body::{NoBodyReader, NoBodyWriter};
pub use plain::{PlainReader, PlainWriter};
pub use socket::{split, unsplit, AsyncSocket, BoxedSocket, SocketReadHalf, SocketWriteHalf};
