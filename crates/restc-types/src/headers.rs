//! Case-insensitive, multi-valued HTTP header storage.

/// An ordered, case-insensitive multi-map of HTTP headers.
///
/// Insertion order is preserved so the writer chain emits headers in a
/// stable order; lookups compare names ASCII-case-insensitively, matching
/// spec.md §8's invariant `GetHeader("content-length") ==
/// GetHeader("Content-Length")`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// An empty header set.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append a header, keeping any existing value(s) for the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Replace all existing values for `name` with a single new value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.entries.push((name, value.into()));
    }

    /// The first value stored under `name`, compared case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// True if any header with this name (case-insensitive) is present.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All values stored under `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over every `(name, value)` pair, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Merge `other` into `self`, keeping `self`'s values where names
    /// collide (used to apply per-request headers over client defaults).
    pub fn merge_under(mut self, defaults: &Headers) -> Self {
        for (name, value) in defaults.iter() {
            if !self.contains(name) {
                self.append(name.to_string(), value.to_string());
            }
        }
        self
    }

    /// Number of stored `(name, value)` pairs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no headers are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut h = Headers::new();
        h.append("Content-Length", "10");
        assert_eq!(h.get("content-length"), Some("10"));
        assert_eq!(h.get("CONTENT-LENGTH"), Some("10"));
    }

    #[test]
    fn set_replaces_all_prior_values() {
        let mut h = Headers::new();
        h.append("X-A", "1");
        h.append("X-A", "2");
        h.set("x-a", "3");
        assert_eq!(h.get_all("X-A").collect::<Vec<_>>(), vec!["3"]);
    }

    #[test]
    fn merge_under_keeps_request_values() {
        let mut defaults = Headers::new();
        defaults.append("X-Default", "d");
        defaults.append("X-Both", "default-value");

        let mut request = Headers::new();
        request.append("X-Both", "request-value");

        let merged = request.merge_under(&defaults);
        assert_eq!(merged.get("X-Default"), Some("d"));
        assert_eq!(merged.get("X-Both"), Some("request-value"));
    }
}
