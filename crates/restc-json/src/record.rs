//! The field-table bridge between a typed application record and the
//! JSON tokenizer/serializer.
//!
//! `#[derive(Record)]` (in the sibling `restc-record-derive` crate)
//! generates, per struct, a static table of [`FieldAccess`] trait
//! objects plus a `Default` impl (records are default-constructed, then
//! populated field by field as JSON keys arrive — see spec.md §4.4's
//! "a new element is default-constructed on `start_object`"). This is
//! the Rust stand-in for the original's Boost.Fusion struct adaptation
//! (`for_each_member.hpp`): a compile-time list of `(name, get, set,
//! is_empty)` entries the bridge is generic over, built at derive time
//! instead of at compile-time template instantiation.

use crate::options::{DeserializeOptions, SerializeOptions};
use crate::serializer::Serializer;
use crate::tokenizer::{JsonEvent, Tokenizer};
use crate::value::{JsonValue, MemoryBudget};
use restc_errors::RestcError;

/// One field of a [`Record`]: its JSON name, and type-erased
/// read/write/is-empty operations against a `T` instance.
///
/// Implemented by a generated zero-sized marker type per field; see the
/// module docs for how `#[derive(Record)]` wires these up.
pub trait FieldAccess<T>: Send + Sync {
    /// The JSON object key this field is read from and written to.
    fn json_name(&self) -> &'static str;

    /// True if this field currently holds its type's zero value.
    fn is_empty(&self, instance: &T) -> bool;

    /// Serialize this field's current value as `"name":value` is
    /// assembled by the caller; this writes only the value.
    fn write(&self, instance: &T, ser: &mut Serializer, opts: &SerializeOptions) -> Result<(), RestcError>;

    /// Parse the value at the tokenizer's current position (right after
    /// the `:` following this field's key) and assign it onto `instance`.
    fn read(
        &self,
        instance: &mut T,
        tok: &mut Tokenizer<'_>,
        budget: &mut MemoryBudget,
        opts: &DeserializeOptions,
    ) -> Result<(), RestcError>;
}

/// A type with a compile-time-derived field table, making it eligible
/// for [`JsonValue`] (and so usable as a scalar, a nested record, an
/// array element, or a map value in the JSON bridge).
pub trait Record: Sized + Default + 'static {
    /// One entry per struct field, in declaration order.
    const FIELDS: &'static [&'static dyn FieldAccess<Self>];
}

impl<T: Record> JsonValue for T {
    fn write_json(&self, ser: &mut Serializer, opts: &SerializeOptions) -> Result<(), RestcError> {
        ser.write_raw("{");
        let mut wrote_any = false;
        for field in T::FIELDS {
            if opts.excluded_names.contains(&field.json_name()) {
                continue;
            }
            if opts.ignore_empty_fields && field.is_empty(self) {
                continue;
            }
            if wrote_any {
                ser.write_raw(",");
            }
            ser.write_quoted_string(field.json_name());
            ser.write_raw(":");
            field.write(self, ser, opts)?;
            wrote_any = true;
        }
        ser.write_raw("}");
        Ok(())
    }

    fn read_json(
        tok: &mut Tokenizer<'_>,
        budget: &mut MemoryBudget,
        opts: &DeserializeOptions,
    ) -> Result<Self, RestcError> {
        match tok.next_event()? {
            JsonEvent::StartObject => {}
            other => return Err(RestcError::Parse(format!("expected object, got {other:?}"))),
        }

        let mut instance = Self::default();
        while let Some(raw_key) = tok.next_key()? {
            budget.charge(raw_key.len() as u64)?;
            let key = opts.field_mapping.resolve(&raw_key).to_string();
            match T::FIELDS.iter().find(|f| f.json_name() == key) {
                Some(field) => field.read(&mut instance, tok, budget, opts)?,
                None if opts.ignore_unknown_properties => tok.skip_value()?,
                None => return Err(RestcError::UnknownProperty(raw_key)),
            }
        }
        Ok(instance)
    }

    fn is_empty(&self) -> bool {
        false
    }
}

/// Serialize a [`Record`] to a complete, in-memory JSON document.
pub fn serialize_to_bytes<T: Record>(value: &T, opts: &SerializeOptions) -> Result<Vec<u8>, RestcError> {
    let mut ser = Serializer::new();
    value.write_json(&mut ser, opts)?;
    Ok(ser.into_bytes())
}

/// Deserialize a complete, in-memory JSON document into a [`Record`].
pub fn deserialize_from_bytes<T: Record>(buf: &[u8], opts: &DeserializeOptions) -> Result<T, RestcError> {
    let mut tok = Tokenizer::new(buf);
    let mut budget = MemoryBudget::new(opts.max_memory_consumption);
    let value = T::read_json(&mut tok, &mut budget, opts)?;
    if !tok.is_eof() {
        return Err(RestcError::Parse("trailing data after JSON value".into()));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Person {
        id: u64,
        name: String,
        balance: f64,
    }

    impl Default for Person {
        fn default() -> Self {
            Self {
                id: 0,
                name: String::new(),
                balance: 0.0,
            }
        }
    }

    struct FieldId;
    impl FieldAccess<Person> for FieldId {
        fn json_name(&self) -> &'static str {
            "id"
        }
        fn is_empty(&self, instance: &Person) -> bool {
            instance.id.is_empty()
        }
        fn write(&self, instance: &Person, ser: &mut Serializer, opts: &SerializeOptions) -> Result<(), RestcError> {
            instance.id.write_json(ser, opts)
        }
        fn read(
            &self,
            instance: &mut Person,
            tok: &mut Tokenizer<'_>,
            budget: &mut MemoryBudget,
            opts: &DeserializeOptions,
        ) -> Result<(), RestcError> {
            instance.id = JsonValue::read_json(tok, budget, opts)?;
            Ok(())
        }
    }

    struct FieldName;
    impl FieldAccess<Person> for FieldName {
        fn json_name(&self) -> &'static str {
            "name"
        }
        fn is_empty(&self, instance: &Person) -> bool {
            instance.name.is_empty()
        }
        fn write(&self, instance: &Person, ser: &mut Serializer, opts: &SerializeOptions) -> Result<(), RestcError> {
            instance.name.write_json(ser, opts)
        }
        fn read(
            &self,
            instance: &mut Person,
            tok: &mut Tokenizer<'_>,
            budget: &mut MemoryBudget,
            opts: &DeserializeOptions,
        ) -> Result<(), RestcError> {
            instance.name = JsonValue::read_json(tok, budget, opts)?;
            Ok(())
        }
    }

    struct FieldBalance;
    impl FieldAccess<Person> for FieldBalance {
        fn json_name(&self) -> &'static str {
            "balance"
        }
        fn is_empty(&self, instance: &Person) -> bool {
            instance.balance.is_empty()
        }
        fn write(&self, instance: &Person, ser: &mut Serializer, opts: &SerializeOptions) -> Result<(), RestcError> {
            instance.balance.write_json(ser, opts)
        }
        fn read(
            &self,
            instance: &mut Person,
            tok: &mut Tokenizer<'_>,
            budget: &mut MemoryBudget,
            opts: &DeserializeOptions,
        ) -> Result<(), RestcError> {
            instance.balance = JsonValue::read_json(tok, budget, opts)?;
            Ok(())
        }
    }

    impl Record for Person {
        const FIELDS: &'static [&'static dyn FieldAccess<Self>] = &[&FieldId, &FieldName, &FieldBalance];
    }

    #[test]
    fn round_trips_a_flat_record() {
        let person = Person {
            id: 100,
            name: "John Doe".into(),
            balance: 123.45,
        };
        let bytes = serialize_to_bytes(&person, &SerializeOptions::default()).unwrap();
        let decoded: Person = deserialize_from_bytes(&bytes, &DeserializeOptions::default()).unwrap();
        assert_eq!(decoded.id, 100);
        assert_eq!(decoded.name, "John Doe");
        assert!((decoded.balance - 123.45).abs() < 1e-9);
    }

    #[test]
    fn ignore_empty_fields_omits_zero_values() {
        let person = Person {
            id: 0,
            name: "x".into(),
            balance: 0.0,
        };
        let bytes =
            serialize_to_bytes(&person, &SerializeOptions::new().ignore_empty_fields(true)).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(!text.contains("\"id\""));
        assert!(!text.contains("\"balance\""));
        assert!(text.contains("\"name\":\"x\""));
    }

    #[test]
    fn unknown_property_is_skipped_by_default() {
        let decoded: Person =
            deserialize_from_bytes(br#"{"id":1,"extra":{"a":[1,2]},"name":"a","balance":1.0}"#, &DeserializeOptions::default())
                .unwrap();
        assert_eq!(decoded.id, 1);
    }

    #[test]
    fn unknown_property_errors_when_strict() {
        let opts = DeserializeOptions::new().ignore_unknown_properties(false);
        let err = deserialize_from_bytes::<Person>(br#"{"id":1,"extra":true}"#, &opts).unwrap_err();
        assert!(matches!(err, RestcError::UnknownProperty(_)));
    }

    #[test]
    fn field_mapping_redirects_json_name() {
        let mut mapping = crate::options::JsonFieldMapping::new();
        mapping.add("fullName", "name");
        let opts = DeserializeOptions::new().field_mapping(mapping);
        let decoded: Person =
            deserialize_from_bytes(br#"{"id":1,"fullName":"Jane","balance":0}"#, &opts).unwrap();
        assert_eq!(decoded.name, "Jane");
    }
}
