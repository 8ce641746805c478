//! Streaming JSON tokenizer and a record (de)serialization bridge driven
//! by a compile-time field table.
//!
//! No `serde_json` dependency: [`tokenizer::Tokenizer`] is a hand-rolled,
//! pull-based SAX-style scanner, mirroring the original engine's direct
//! use of rapidjson's `Reader`/`Writer` rather than building a DOM.
//! [`record::Record`] (generated by `#[derive(Record)]` in the sibling
//! `restc-record-derive` crate) is the compile-time reflection layer
//! Design Notes §9 calls for; [`cursor::JsonArrayCursor`] streams one
//! array element at a time out of a live response body.

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod cursor;
mod options;
mod record;
mod serializer;
mod tokenizer;
mod value;

pub use cursor::JsonArrayCursor;
pub use options::{DeserializeOptions, JsonFieldMapping, SerializeOptions};
pub use record::{deserialize_from_bytes, serialize_to_bytes, FieldAccess, Record};
pub use serializer::{flush_to_writer, Serializer};
pub use tokenizer::{JsonEvent, Tokenizer};
pub use value::{JsonValue, MemoryBudget};

/// Derive a [`Record`] implementation (the `FIELDS` table plus a
/// `Default` impl) for a named-field struct.
///
/// Also generates `impl Default for Account` (records are
/// default-constructed, then populated field by field as JSON keys
/// arrive), so the struct should not separately derive `Default`.
///
/// ```ignore
/// #[derive(Record)]
/// struct Account {
///     id: u64,
///     #[record(rename = "fullName")]
///     name: String,
///     balance: f64,
/// }
/// ```
pub use restc_record_derive::Record;
