//! A streaming iterator over a JSON array of records, consuming one
//! element at a time from a live [`AsyncDataReader`] body stream.
//!
//! Grounded on `IteratorFromJsonSerializer.h`'s cursor semantics: wait
//! for `[`, skip whitespace/commas between elements, `]` ends iteration.
//! Unlike [`crate::record::deserialize_from_bytes`] (which needs the
//! whole document up front), the cursor buffers only as much of the
//! body as it takes to find one complete element's closing bracket,
//! letting callers consume an arbitrarily large array without holding
//! the whole response in memory.

use std::marker::PhantomData;

use bytes::{Buf, BytesMut};
use restc_errors::RestcError;
use restc_types::AsyncDataReader;

use crate::options::DeserializeOptions;
use crate::record::Record;
use crate::tokenizer::Tokenizer;
use crate::value::{JsonValue, MemoryBudget};

/// How much to grow the read-ahead buffer by when an element's closing
/// bracket isn't found in what's already buffered.
const REFILL_HINT: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    WaitOpen,
    BetweenElements,
    Done,
}

/// Pulls one `T` at a time out of a JSON array streamed from an
/// [`AsyncDataReader`].
///
/// `next()` buffers only as many bytes as needed to find one complete
/// element, so a response with thousands of array entries never needs
/// its whole body held in memory at once.
pub struct JsonArrayCursor<'a, T> {
    body: &'a mut (dyn AsyncDataReader + Send),
    buf: BytesMut,
    state: CursorState,
    opts: DeserializeOptions,
    _marker: PhantomData<T>,
}

impl<'a, T: Record> JsonArrayCursor<'a, T> {
    /// Build a cursor over `body`, which must yield a JSON document
    /// whose top-level value is an array.
    pub fn new(body: &'a mut (dyn AsyncDataReader + Send), opts: DeserializeOptions) -> Self {
        Self {
            body,
            buf: BytesMut::new(),
            state: CursorState::WaitOpen,
            opts,
            _marker: PhantomData,
        }
    }

    /// Pull the next element, or `None` once the array's closing `]`
    /// has been consumed.
    ///
    /// # Errors
    ///
    /// Returns [`RestcError::Protocol`] if the body ends before the
    /// array does, or any parse/constraint error the element's own
    /// decode raises.
    pub async fn next(&mut self) -> Result<Option<T>, RestcError> {
        if self.state == CursorState::WaitOpen {
            self.consume_open_bracket().await?;
        }
        if self.state == CursorState::Done {
            return Ok(None);
        }

        loop {
            let mut scan_from = 0;
            loop {
                let unconsumed = &self.buf[scan_from..];
                match skip_separator_and_find_end(unconsumed) {
                    SeparatorScan::ArrayEnd(consumed) => {
                        self.buf.advance(scan_from + consumed);
                        self.state = CursorState::Done;
                        return Ok(None);
                    }
                    SeparatorScan::Value { value_start, value_end } => {
                        let abs_start = scan_from + value_start;
                        let abs_end = scan_from + value_end;
                        let element = &self.buf[abs_start..abs_end];
                        let mut tok = Tokenizer::new(element);
                        let mut budget = MemoryBudget::new(self.opts.max_memory_consumption);
                        let value = T::read_json(&mut tok, &mut budget, &self.opts)?;
                        self.buf.advance(abs_end);
                        self.state = CursorState::BetweenElements;
                        return Ok(Some(value));
                    }
                    SeparatorScan::NeedMoreData => {
                        scan_from = 0;
                        if !self.refill().await? {
                            return Err(RestcError::Protocol(
                                "JSON array body ended before closing ']'".into(),
                            ));
                        }
                    }
                }
            }
        }
    }

    async fn consume_open_bracket(&mut self) -> Result<(), RestcError> {
        loop {
            if let Some(pos) = self.buf.iter().position(|b| !b.is_ascii_whitespace()) {
                if self.buf[pos] != b'[' {
                    return Err(RestcError::Parse(format!(
                        "expected '[' to start a JSON array, found '{}'",
                        self.buf[pos] as char
                    )));
                }
                self.buf.advance(pos + 1);
                self.state = CursorState::BetweenElements;
                return Ok(());
            }
            if !self.refill().await? {
                return Err(RestcError::Protocol(
                    "JSON array body ended before '['".into(),
                ));
            }
        }
    }

    /// Read more bytes from the body into `buf`. Returns `false` at EOF.
    async fn refill(&mut self) -> Result<bool, RestcError> {
        let chunk = self.body.read_some().await?;
        if chunk.is_empty() {
            return Ok(false);
        }
        self.buf.extend_from_slice(&chunk);
        let _ = REFILL_HINT;
        Ok(true)
    }
}

enum SeparatorScan {
    ArrayEnd(usize),
    Value { value_start: usize, value_end: usize },
    NeedMoreData,
}

/// Starting right after the previous element (or `[`), skip whitespace
/// and (if present) one comma, then find the span of the next value or
/// the array's closing `]`.
fn skip_separator_and_find_end(buf: &[u8]) -> SeparatorScan {
    let mut i = 0;
    while i < buf.len() && buf[i].is_ascii_whitespace() {
        i += 1;
    }
    if i >= buf.len() {
        return SeparatorScan::NeedMoreData;
    }
    if buf[i] == b']' {
        return SeparatorScan::ArrayEnd(i + 1);
    }
    if buf[i] == b',' {
        i += 1;
        while i < buf.len() && buf[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= buf.len() {
            return SeparatorScan::NeedMoreData;
        }
    }
    match scan_one_value(buf, i) {
        Some(end) => SeparatorScan::Value {
            value_start: i,
            value_end: end,
        },
        None => SeparatorScan::NeedMoreData,
    }
}

/// Find the end (exclusive) of one complete JSON value starting at
/// `buf[start]`, tracking string/escape and bracket-nesting state.
/// Returns `None` if the value isn't fully buffered yet.
fn scan_one_value(buf: &[u8], start: usize) -> Option<usize> {
    let first = *buf.get(start)?;
    match first {
        b'{' | b'[' => {
            let mut depth = 1usize;
            let mut i = start + 1;
            let mut in_string = false;
            let mut escape = false;
            while i < buf.len() {
                let b = buf[i];
                if in_string {
                    if escape {
                        escape = false;
                    } else if b == b'\\' {
                        escape = true;
                    } else if b == b'"' {
                        in_string = false;
                    }
                } else {
                    match b {
                        b'"' => in_string = true,
                        b'{' | b'[' => depth += 1,
                        b'}' | b']' => {
                            depth -= 1;
                            if depth == 0 {
                                return Some(i + 1);
                            }
                        }
                        _ => {}
                    }
                }
                i += 1;
            }
            None
        }
        b'"' => {
            let mut i = start + 1;
            let mut escape = false;
            while i < buf.len() {
                let b = buf[i];
                if escape {
                    escape = false;
                } else if b == b'\\' {
                    escape = true;
                } else if b == b'"' {
                    return Some(i + 1);
                }
                i += 1;
            }
            None
        }
        _ => {
            let mut i = start;
            while i < buf.len() {
                match buf[i] {
                    b',' | b']' | b'}' | b' ' | b'\t' | b'\n' | b'\r' => return Some(i),
                    _ => i += 1,
                }
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bytes::Bytes;

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

    #[derive(Debug, PartialEq, Eq)]
    struct Item {
        id: u64,
    }

    impl Default for Item {
        fn default() -> Self {
            Self { id: 0 }
        }
    }

    struct FieldId;
    impl crate::record::FieldAccess<Item> for FieldId {
        fn json_name(&self) -> &'static str {
            "id"
        }
        fn is_empty(&self, instance: &Item) -> bool {
            instance.id == 0
        }
        fn write(
            &self,
            instance: &Item,
            ser: &mut crate::serializer::Serializer,
            opts: &crate::options::SerializeOptions,
        ) -> Result<(), RestcError> {
            instance.id.write_json(ser, opts)
        }
        fn read(
            &self,
            instance: &mut Item,
            tok: &mut Tokenizer<'_>,
            budget: &mut MemoryBudget,
            opts: &DeserializeOptions,
        ) -> Result<(), RestcError> {
            instance.id = JsonValue::read_json(tok, budget, opts)?;
            Ok(())
        }
    }

    impl Record for Item {
        const FIELDS: &'static [&'static dyn crate::record::FieldAccess<Self>] = &[&FieldId];
    }

    #[tokio::test]
    async fn iterates_every_element_in_one_chunk() {
        let mut reader = ScriptedReader {
            chunks: vec![Bytes::from_static(br#"[{"id":1},{"id":2},{"id":3}]"#)],
            pos: 0,
        };
        let mut cursor = JsonArrayCursor::<Item>::new(&mut reader, DeserializeOptions::default());
        let mut ids = Vec::new();
        while let Some(item) = cursor.next().await.unwrap() {
            ids.push(item.id);
        }
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn handles_empty_array() {
        let mut reader = ScriptedReader {
            chunks: vec![Bytes::from_static(b"[]")],
            pos: 0,
        };
        let mut cursor = JsonArrayCursor::<Item>::new(&mut reader, DeserializeOptions::default());
        assert_eq!(cursor.next().await.unwrap(), None);
    }

    #[tokio::test]
    async fn handles_elements_split_across_chunks() {
        let mut reader = ScriptedReader {
            chunks: vec![
                Bytes::from_static(br#"[{"id":1},{"i"#),
                Bytes::from_static(br#"d":2}]"#),
            ],
            pos: 0,
        };
        let mut cursor = JsonArrayCursor::<Item>::new(&mut reader, DeserializeOptions::default());
        let mut ids = Vec::new();
        while let Some(item) = cursor.next().await.unwrap() {
            ids.push(item.id);
        }
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn unterminated_array_is_protocol_error() {
        let mut reader = ScriptedReader {
            chunks: vec![Bytes::from_static(br#"[{"id":1}"#)],
            pos: 0,
        };
        let mut cursor = JsonArrayCursor::<Item>::new(&mut reader, DeserializeOptions::default());
        assert!(cursor.next().await.unwrap().is_some());
        let err = cursor.next().await.unwrap_err();
        assert!(matches!(err, RestcError::Protocol(_)));
    }
}
