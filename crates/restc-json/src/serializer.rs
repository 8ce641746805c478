//! Builds a JSON document in memory, then streams it out through an
//! [`AsyncDataWriter`] chain in fixed-size pieces so the output still
//! goes through chunked/gzip framing rather than bypassing it.

use restc_errors::RestcError;
use restc_types::AsyncDataWriter;

/// Output is flushed to the writer chain in pieces this size, once the
/// document is fully built.
const FLUSH_CHUNK: usize = 8 * 1024;

/// An in-memory JSON output buffer.
///
/// [`crate::value::JsonValue::write_json`] implementations append to this
/// directly; nothing here talks to the network, keeping the trait method
/// synchronous. [`write_record_to`] drives the async handoff afterward.
pub struct Serializer {
    buf: Vec<u8>,
}

impl Serializer {
    /// An empty serializer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Append raw (already-valid-JSON) bytes verbatim.
    pub fn write_raw(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Append a string value, JSON-quoting and escaping it.
    pub fn write_quoted_string(&mut self, s: &str) {
        self.buf.push(b'"');
        for ch in s.chars() {
            match ch {
                '"' => self.buf.extend_from_slice(b"\\\""),
                '\\' => self.buf.extend_from_slice(b"\\\\"),
                '\n' => self.buf.extend_from_slice(b"\\n"),
                '\r' => self.buf.extend_from_slice(b"\\r"),
                '\t' => self.buf.extend_from_slice(b"\\t"),
                c if (c as u32) < 0x20 => {
                    self.buf.extend_from_slice(format!("\\u{:04x}", c as u32).as_bytes());
                }
                c => {
                    let mut tmp = [0u8; 4];
                    self.buf.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
                }
            }
        }
        self.buf.push(b'"');
    }

    /// Consume the serializer, returning the built document.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Stream an already-serialized document out through a writer chain,
/// in [`FLUSH_CHUNK`]-sized pieces, then finish it.
pub async fn flush_to_writer(
    doc: Vec<u8>,
    writer: &mut (dyn AsyncDataWriter + Send),
) -> Result<(), RestcError> {
    for piece in doc.chunks(FLUSH_CHUNK) {
        writer.write(piece).await?;
    }
    writer.finish().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_control_characters_and_quotes() {
        let mut ser = Serializer::new();
        ser.write_quoted_string("a\"b\nc");
        assert_eq!(ser.into_bytes(), br#""a\"b\nc""#);
    }
}
