//! Per-call knobs for the record (de)serialization bridge: empty-field
//! omission and a name exclusion set on the write side; unknown-property
//! policy and a JSON-name remapping table on the read side.

use std::collections::HashMap;

/// Options governing [`crate::record::Record`] serialization.
#[derive(Debug, Clone, Default)]
pub struct SerializeOptions {
    /// Omit a field whose value is its type's zero value (`0`, `""`, an
    /// empty container, `None`) rather than writing `"name":<zero>`.
    pub ignore_empty_fields: bool,
    /// Field (JSON) names to omit unconditionally, regardless of value.
    pub excluded_names: Vec<&'static str>,
}

impl SerializeOptions {
    /// Defaults: no fields omitted, nothing excluded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for [`SerializeOptions::ignore_empty_fields`].
    pub fn ignore_empty_fields(mut self, value: bool) -> Self {
        self.ignore_empty_fields = value;
        self
    }

    /// Builder-style setter adding a name to [`SerializeOptions::excluded_names`].
    pub fn exclude(mut self, name: &'static str) -> Self {
        self.excluded_names.push(name);
        self
    }
}

/// Maps a JSON property name to the native field name it should be
/// assigned to, for sources whose wire names don't match the Rust
/// struct's own field names.
///
/// Looked up before [`crate::record::Record::FIELDS`] dispatch; a name
/// with no mapping entry is passed through unchanged.
#[derive(Debug, Clone, Default)]
pub struct JsonFieldMapping {
    map: HashMap<String, String>,
}

impl JsonFieldMapping {
    /// An empty mapping (every JSON name passes through unchanged).
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `json_name` to `native_name`.
    pub fn add(&mut self, json_name: impl Into<String>, native_name: impl Into<String>) -> &mut Self {
        self.map.insert(json_name.into(), native_name.into());
        self
    }

    /// Resolve `json_name` to its native field name, or return it
    /// unchanged if no mapping was registered.
    pub fn resolve<'a>(&'a self, json_name: &'a str) -> &'a str {
        self.map.get(json_name).map(String::as_str).unwrap_or(json_name)
    }
}

/// Options governing [`crate::record::Record`] deserialization.
#[derive(Debug, Clone)]
pub struct DeserializeOptions {
    /// If `false`, a JSON property with no matching field fails the
    /// parse with [`restc_errors::RestcError::UnknownProperty`] instead
    /// of being skipped.
    pub ignore_unknown_properties: bool,
    /// JSON-name -> native-name remapping, applied before field lookup.
    pub field_mapping: JsonFieldMapping,
    /// Byte budget charged against as scalars are parsed and containers
    /// grow; `0` disables the check. See [`crate::value::MemoryBudget`].
    pub max_memory_consumption: u64,
}

impl Default for DeserializeOptions {
    fn default() -> Self {
        Self {
            ignore_unknown_properties: true,
            field_mapping: JsonFieldMapping::new(),
            max_memory_consumption: 1024 * 1024,
        }
    }
}

impl DeserializeOptions {
    /// Defaults: unknown properties skipped, no name remapping, a 1 MiB
    /// memory budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter for [`DeserializeOptions::ignore_unknown_properties`].
    pub fn ignore_unknown_properties(mut self, value: bool) -> Self {
        self.ignore_unknown_properties = value;
        self
    }

    /// Builder-style setter for [`DeserializeOptions::max_memory_consumption`].
    pub fn max_memory_consumption(mut self, value: u64) -> Self {
        self.max_memory_consumption = value;
        self
    }

    /// Builder-style setter for [`DeserializeOptions::field_mapping`].
    pub fn field_mapping(mut self, mapping: JsonFieldMapping) -> Self {
        self.field_mapping = mapping;
        self
    }
}
