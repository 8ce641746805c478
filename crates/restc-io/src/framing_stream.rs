//! A byte-at-a-time view over a [`AsyncDataReader`], used to parse
//! status lines, headers, and chunk-size prefixes.
//!
//! Grounded on `DataReaderStream.cpp`: the same source buffer serves
//! both a char-by-char parser (`getc`/`ungetc`) and a zero-copy bulk
//! reader (`get_data`), so header parsing and body streaming share one
//! fetch loop instead of double-buffering.

use bytes::Bytes;
use restc_errors::RestcError;
use restc_types::{AsyncDataReader, Headers, HttpVersion};

/// Maximum length tolerated for a single header name, to bound memory
/// use from a malicious or broken server (mirrors `max_name_len` /
/// `max_header_value_len` in the original header parser).
const MAX_HEADER_NAME_LEN: usize = 256;
const MAX_HEADER_VALUE_LEN: usize = 4 * 1024;
const MAX_HEADERS: usize = 256;
const MAX_REASON_PHRASE_LEN: usize = 256;

/// The parsed first line of an HTTP/1.1 response.
pub struct StatusLine {
    /// Always [`HttpVersion::Http11`]: any other version is rejected.
    pub version: HttpVersion,
    /// The three-digit status code.
    pub status: u16,
    /// The reason phrase, verbatim.
    pub reason: String,
}

/// Wraps a source reader with buffered char-at-a-time access plus a
/// one-byte pushback, used while parsing structured text framing.
pub struct FramingStream {
    source: Box<dyn AsyncDataReader>,
    buf: Bytes,
    pos: usize,
    eof: bool,
}

impl FramingStream {
    /// Wrap the reader that sits below this stream in the chain
    /// (typically an [`crate::IoReader`]).
    pub fn new(source: Box<dyn AsyncDataReader>) -> Self {
        Self {
            source,
            buf: Bytes::new(),
            pos: 0,
            eof: false,
        }
    }

    /// True once the underlying source has signaled end of stream and
    /// the buffered bytes have been fully consumed.
    pub fn is_eof(&self) -> bool {
        self.eof && self.pos >= self.buf.len()
    }

    async fn fetch(&mut self) -> Result<(), RestcError> {
        if self.pos < self.buf.len() {
            return Ok(());
        }
        let chunk = self.source.read_some().await?;
        if chunk.is_empty() {
            self.eof = true;
            return Err(RestcError::Protocol("unexpected end of stream".into()));
        }
        self.buf = chunk;
        self.pos = 0;
        Ok(())
    }

    /// Read one byte, fetching more from the source as needed.
    pub async fn getc(&mut self) -> Result<u8, RestcError> {
        self.fetch().await?;
        let ch = self.buf[self.pos];
        self.pos += 1;
        Ok(ch)
    }

    /// Push the last byte read by [`FramingStream::getc`] back onto the
    /// stream. Only valid to call once between `getc` calls.
    pub fn ungetc(&mut self) {
        assert!(self.pos > 0, "ungetc() with nothing read");
        self.pos -= 1;
    }

    /// Pull up to `max_bytes` from the currently buffered chunk,
    /// fetching a fresh chunk first if the buffer is exhausted.
    ///
    /// Returns a zero-copy slice of whatever is already buffered; it
    /// may be shorter than `max_bytes` if the current chunk doesn't
    /// have enough, matching the original's segment-at-a-time framing.
    pub async fn get_data(&mut self, max_bytes: usize) -> Result<Bytes, RestcError> {
        if max_bytes == 0 {
            return Ok(Bytes::new());
        }
        self.fetch().await?;
        let available = self.buf.len() - self.pos;
        let take = available.min(max_bytes);
        let slice = self.buf.slice(self.pos..self.pos + take);
        self.pos += take;
        Ok(slice)
    }

    /// Read everything the source has left, unstructured, bypassing the
    /// char buffer. Used once a reader above this one has determined
    /// framing has ended and just wants to drain.
    pub async fn read_some_raw(&mut self) -> Result<Bytes, RestcError> {
        if self.pos < self.buf.len() {
            let rest = self.buf.slice(self.pos..);
            self.pos = self.buf.len();
            return Ok(rest);
        }
        if self.eof {
            return Ok(Bytes::new());
        }
        let chunk = self.source.read_some().await?;
        if chunk.is_empty() {
            self.eof = true;
        }
        Ok(chunk)
    }

    /// Parse `HTTP/1.1 <status> <reason>\r\n`.
    pub async fn read_status_line(&mut self) -> Result<StatusLine, RestcError> {
        let mut version = Vec::new();
        loop {
            let ch = self.getc().await?;
            if ch == b' ' {
                break;
            }
            version.push(ch);
            if version.len() > 16 {
                return Err(RestcError::Protocol("HTTP version too long".into()));
            }
        }
        if version != b"HTTP/1.1" {
            return Err(RestcError::Protocol(format!(
                "unsupported HTTP version: {}",
                String::from_utf8_lossy(&version)
            )));
        }

        let mut status = Vec::new();
        loop {
            let ch = self.getc().await?;
            if ch == b' ' {
                break;
            }
            status.push(ch);
            if status.len() > 3 {
                return Err(RestcError::Protocol("status code too long".into()));
            }
        }
        if status.len() != 3 {
            return Err(RestcError::Protocol("status code must be 3 digits".into()));
        }
        let status: u16 = std::str::from_utf8(&status)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| RestcError::Parse("non-numeric status code".into()))?;

        let mut reason = Vec::new();
        loop {
            let ch = self.getc().await?;
            if ch == b'\r' {
                break;
            }
            reason.push(ch);
            if reason.len() > MAX_REASON_PHRASE_LEN {
                return Err(RestcError::Constraint("reason phrase too long".into()));
            }
        }
        if self.getc().await? != b'\n' {
            return Err(RestcError::Protocol("missing LF after status line".into()));
        }

        Ok(StatusLine {
            version: HttpVersion::Http11,
            status,
            reason: String::from_utf8_lossy(&reason).into_owned(),
        })
    }

    /// Read header lines (or a chunked trailer) until a blank line,
    /// folding continuation lines (a value line starting with space or
    /// tab) into the previous header's value.
    pub async fn read_header_lines(&mut self) -> Result<Headers, RestcError> {
        let mut headers = Headers::new();
        let mut count = 0usize;

        loop {
            let mut name = Vec::new();
            let mut saw_header = false;
            let mut ch;
            loop {
                ch = self.getc().await?;
                if ch == b'\r' {
                    break;
                }
                if ch == b' ' || ch == b'\t' {
                    continue;
                }
                if ch == b':' {
                    let value = self.read_header_value().await?;
                    if name.is_empty() {
                        return Err(RestcError::Protocol("header value without name".into()));
                    }
                    count += 1;
                    if count > MAX_HEADERS {
                        return Err(RestcError::Constraint("too many header lines".into()));
                    }
                    headers.append(String::from_utf8_lossy(&name).into_owned(), value);
                    saw_header = true;
                    ch = b'\n';
                    // read_header_value already consumed through the
                    // line's CRLF, so treat this iteration as done with
                    // the next top-level loop.
                    break;
                }
                name.push(ch);
                if name.len() > MAX_HEADER_NAME_LEN {
                    return Err(RestcError::Constraint("header name too long".into()));
                }
            }

            if ch == b'\r' {
                ch = self.getc().await?;
            }
            if ch != b'\n' {
                return Err(RestcError::Protocol("missing LF after header line".into()));
            }
            if !saw_header && name.is_empty() {
                return Ok(headers);
            }
        }
    }

    async fn read_header_value(&mut self) -> Result<String, RestcError> {
        let mut value = Vec::new();
        loop {
            let mut ch = self.getc().await?;
            while ch == b' ' || ch == b'\t' {
                ch = self.getc().await?;
            }
            while ch != b'\r' {
                value.push(ch);
                if value.len() > MAX_HEADER_VALUE_LEN {
                    return Err(RestcError::Constraint("header value too long".into()));
                }
                ch = self.getc().await?;
            }
            if self.getc().await? != b'\n' {
                return Err(RestcError::Protocol("missing LF after header value".into()));
            }

            let next = self.getc().await?;
            if next != b' ' && next != b'\t' {
                self.ungetc();
                break;
            }
            value.push(b' ');
        }
        Ok(String::from_utf8_lossy(&value).into_owned())
    }
}
