//! Scalar, container, and map field types the JSON bridge knows how to
//! read and write. Widening/narrowing between integer widths and
//! integer<->bool is explicit; string<->string is the only string
//! coercion (no numeric-to-string or vice versa).

use std::collections::HashMap;
use std::convert::TryFrom;

use restc_errors::RestcError;

use crate::options::{DeserializeOptions, SerializeOptions};
use crate::serializer::Serializer;
use crate::tokenizer::{JsonEvent, Tokenizer};

/// A type that can appear as a [`crate::record::Record`] field (directly,
/// or nested inside `Option`/`Vec`/`HashMap`, or as a nested record).
///
/// Implemented for scalars, `String`, `Option<T>`, `Vec<T>`,
/// `HashMap<String, T>`, and (via `#[derive(Record)]`, see
/// [`crate::record`]) nested record types.
pub trait JsonValue: Sized {
    /// Serialize `self` into `ser`, honoring `opts` (empty-field
    /// omission and name exclusion only matter for [`crate::record::Record`]
    /// types; scalars ignore `opts`).
    fn write_json(&self, ser: &mut Serializer, opts: &SerializeOptions) -> Result<(), RestcError>;

    /// Parse a value of this type at the tokenizer's current position,
    /// honoring `opts` (unknown-property policy and field-name mapping
    /// only matter for nested [`crate::record::Record`] types).
    fn read_json(
        tok: &mut Tokenizer<'_>,
        budget: &mut MemoryBudget,
        opts: &DeserializeOptions,
    ) -> Result<Self, RestcError>;

    /// True for the type's zero value (`0`, `""`, empty container, `None`).
    ///
    /// Drives `ignore_empty_fields` during serialization.
    fn is_empty(&self) -> bool {
        false
    }
}

/// Decrements as values are parsed; reaching zero fails the parse.
///
/// A cap of `0` disables the check (mirrors the original's "a value of
/// zero disables the check").
pub struct MemoryBudget {
    remaining: Option<u64>,
}

impl MemoryBudget {
    /// Build a budget. `max_bytes == 0` means unlimited.
    pub fn new(max_bytes: u64) -> Self {
        Self {
            remaining: if max_bytes == 0 { None } else { Some(max_bytes) },
        }
    }

    /// Charge `bytes` against the budget.
    ///
    /// # Errors
    ///
    /// Returns [`RestcError::Constraint`] once the budget is exhausted.
    pub fn charge(&mut self, bytes: u64) -> Result<(), RestcError> {
        let Some(remaining) = self.remaining.as_mut() else {
            return Ok(());
        };
        if bytes > *remaining {
            *remaining = 0;
            return Err(RestcError::Constraint(
                "JSON decode exceeded max_memory_consumption".into(),
            ));
        }
        *remaining -= bytes;
        Ok(())
    }
}

macro_rules! impl_int {
    ($t:ty) => {
        impl JsonValue for $t {
            fn write_json(&self, ser: &mut Serializer, _opts: &SerializeOptions) -> Result<(), RestcError> {
                ser.write_raw(&self.to_string());
                Ok(())
            }

            fn read_json(
                tok: &mut Tokenizer<'_>,
                budget: &mut MemoryBudget,
                _opts: &DeserializeOptions,
            ) -> Result<Self, RestcError> {
                budget.charge(std::mem::size_of::<$t>() as u64)?;
                match tok.next_event()? {
                    JsonEvent::I64(v) => <$t>::try_from(v)
                        .map_err(|_| RestcError::Parse(format!("integer {v} out of range"))),
                    JsonEvent::U64(v) => <$t>::try_from(v)
                        .map_err(|_| RestcError::Parse(format!("integer {v} out of range"))),
                    JsonEvent::Bool(b) => Ok(if b { 1 } else { 0 }),
                    other => Err(RestcError::Parse(format!("expected integer, got {other:?}"))),
                }
            }

            fn is_empty(&self) -> bool {
                *self == 0
            }
        }
    };
}

impl_int!(i8);
impl_int!(i16);
impl_int!(i32);
impl_int!(i64);
impl_int!(u8);
impl_int!(u16);
impl_int!(u32);
impl_int!(u64);

macro_rules! impl_float {
    ($t:ty) => {
        impl JsonValue for $t {
            fn write_json(&self, ser: &mut Serializer, _opts: &SerializeOptions) -> Result<(), RestcError> {
                ser.write_raw(&self.to_string());
                Ok(())
            }

            fn read_json(
                tok: &mut Tokenizer<'_>,
                budget: &mut MemoryBudget,
                _opts: &DeserializeOptions,
            ) -> Result<Self, RestcError> {
                budget.charge(std::mem::size_of::<$t>() as u64)?;
                match tok.next_event()? {
                    JsonEvent::F64(v) => Ok(v as $t),
                    JsonEvent::I64(v) => Ok(v as $t),
                    JsonEvent::U64(v) => Ok(v as $t),
                    other => Err(RestcError::Parse(format!("expected number, got {other:?}"))),
                }
            }

            fn is_empty(&self) -> bool {
                *self == 0.0
            }
        }
    };
}

impl_float!(f32);
impl_float!(f64);

impl JsonValue for bool {
    fn write_json(&self, ser: &mut Serializer, _opts: &SerializeOptions) -> Result<(), RestcError> {
        ser.write_raw(if *self { "true" } else { "false" });
        Ok(())
    }

    fn read_json(
        tok: &mut Tokenizer<'_>,
        budget: &mut MemoryBudget,
        _opts: &DeserializeOptions,
    ) -> Result<Self, RestcError> {
        budget.charge(1)?;
        match tok.next_event()? {
            JsonEvent::Bool(b) => Ok(b),
            JsonEvent::I64(v) => Ok(v != 0),
            JsonEvent::U64(v) => Ok(v != 0),
            other => Err(RestcError::Parse(format!("expected bool, got {other:?}"))),
        }
    }

    fn is_empty(&self) -> bool {
        !*self
    }
}

impl JsonValue for String {
    fn write_json(&self, ser: &mut Serializer, _opts: &SerializeOptions) -> Result<(), RestcError> {
        ser.write_quoted_string(self);
        Ok(())
    }

    fn read_json(
        tok: &mut Tokenizer<'_>,
        budget: &mut MemoryBudget,
        _opts: &DeserializeOptions,
    ) -> Result<Self, RestcError> {
        match tok.next_event()? {
            JsonEvent::Str(s) => {
                budget.charge(s.len() as u64)?;
                Ok(s)
            }
            other => Err(RestcError::Parse(format!("expected string, got {other:?}"))),
        }
    }

    fn is_empty(&self) -> bool {
        self.is_empty()
    }
}

impl<T: JsonValue> JsonValue for Option<T> {
    fn write_json(&self, ser: &mut Serializer, opts: &SerializeOptions) -> Result<(), RestcError> {
        match self {
            Some(v) => v.write_json(ser, opts),
            None => {
                ser.write_raw("null");
                Ok(())
            }
        }
    }

    fn read_json(
        tok: &mut Tokenizer<'_>,
        budget: &mut MemoryBudget,
        opts: &DeserializeOptions,
    ) -> Result<Self, RestcError> {
        if tok.try_consume_null() {
            Ok(None)
        } else {
            T::read_json(tok, budget, opts).map(Some)
        }
    }

    fn is_empty(&self) -> bool {
        self.is_none()
    }
}

impl<T: JsonValue> JsonValue for Vec<T> {
    fn write_json(&self, ser: &mut Serializer, opts: &SerializeOptions) -> Result<(), RestcError> {
        ser.write_raw("[");
        for (i, item) in self.iter().enumerate() {
            if i > 0 {
                ser.write_raw(",");
            }
            item.write_json(ser, opts)?;
        }
        ser.write_raw("]");
        Ok(())
    }

    fn read_json(
        tok: &mut Tokenizer<'_>,
        budget: &mut MemoryBudget,
        opts: &DeserializeOptions,
    ) -> Result<Self, RestcError> {
        match tok.next_event()? {
            JsonEvent::StartArray => {}
            other => return Err(RestcError::Parse(format!("expected array, got {other:?}"))),
        }
        let mut out = Vec::new();
        if tok.peek_is_array_end() {
            return Ok(out);
        }
        loop {
            budget.charge(std::mem::size_of::<T>() as u64)?;
            out.push(T::read_json(tok, budget, opts)?);
            if tok.array_end_or_continue() {
                break;
            }
        }
        Ok(out)
    }

    fn is_empty(&self) -> bool {
        self.is_empty()
    }
}

impl<T: JsonValue> JsonValue for HashMap<String, T> {
    fn write_json(&self, ser: &mut Serializer, opts: &SerializeOptions) -> Result<(), RestcError> {
        ser.write_raw("{");
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                ser.write_raw(",");
            }
            ser.write_quoted_string(k);
            ser.write_raw(":");
            v.write_json(ser, opts)?;
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
        let mut out = HashMap::new();
        while let Some(key) = tok.next_key()? {
            budget.charge(key.len() as u64)?;
            let value = T::read_json(tok, budget, opts)?;
            out.insert(key, value);
        }
        Ok(out)
    }

    fn is_empty(&self) -> bool {
        self.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_of_zero_disables_check() {
        let mut budget = MemoryBudget::new(0);
        assert!(budget.charge(u64::MAX).is_ok());
    }

    #[test]
    fn budget_exhausts_on_overcharge() {
        let mut budget = MemoryBudget::new(4);
        assert!(budget.charge(4).is_ok());
        assert!(matches!(budget.charge(1), Err(RestcError::Constraint(_))));
    }

    #[test]
    fn option_scalar_roundtrips_through_tokenizer() {
        let opts = DeserializeOptions::default();
        let mut budget = MemoryBudget::new(0);
        let mut tok = Tokenizer::new(b"null");
        let v: Option<u32> = JsonValue::read_json(&mut tok, &mut budget, &opts).unwrap();
        assert_eq!(v, None);

        let mut tok = Tokenizer::new(b"42");
        let v: Option<u32> = JsonValue::read_json(&mut tok, &mut budget, &opts).unwrap();
        assert_eq!(v, Some(42));
    }

    #[test]
    fn vec_of_scalars_roundtrips() {
        let opts = DeserializeOptions::default();
        let mut budget = MemoryBudget::new(0);
        let mut tok = Tokenizer::new(b"[1,2,3]");
        let v: Vec<u32> = JsonValue::read_json(&mut tok, &mut budget, &opts).unwrap();
        assert_eq!(v, vec![1, 2, 3]);

        let mut ser = Serializer::new();
        v.write_json(&mut ser, &SerializeOptions::default()).unwrap();
        assert_eq!(ser.into_bytes(), b"[1,2,3]");
    }

    #[test]
    fn integer_overflow_is_parse_error() {
        let opts = DeserializeOptions::default();
        let mut budget = MemoryBudget::new(0);
        let mut tok = Tokenizer::new(b"99999");
        let err = <u8 as JsonValue>::read_json(&mut tok, &mut budget, &opts).unwrap_err();
        assert!(matches!(err, RestcError::Parse(_)));
    }
}
