//! vCard parameters (sub-types).

use super::DataType;

/// Parameters whose values are enumerated keywords, stored lower-cased.
const NORMALIZED_PARAMETERS: &[&str] = &["TYPE", "VALUE", "ENCODING", "CALSCALE"];

/// A vCard parameter.
///
/// Parameters can have multiple values (e.g., TYPE=home,work).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VCardParameter {
    /// Parameter name (normalized to uppercase).
    pub name: String,
    /// Parameter values, without duplicates.
    pub values: Vec<String>,
}

impl VCardParameter {
    /// Creates a new parameter with a single value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::multi(name, vec![value.into()])
    }

    /// Creates a parameter with multiple values.
    #[must_use]
    pub fn multi(name: impl Into<String>, values: Vec<String>) -> Self {
        let mut param = Self {
            name: name.into().to_ascii_uppercase(),
            values: Vec::with_capacity(values.len()),
        };
        for value in values {
            param.push(value);
        }
        param
    }

    /// Returns the first value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    /// Returns whether the parameter has the specified value (case-insensitive).
    #[must_use]
    pub fn has_value(&self, value: &str) -> bool {
        self.values.iter().any(|v| v.eq_ignore_ascii_case(value))
    }

    fn push(&mut self, value: String) {
        let value = if NORMALIZED_PARAMETERS.contains(&self.name.as_str()) {
            value.to_ascii_lowercase()
        } else {
            value
        };
        if !self.values.contains(&value) {
            self.values.push(value);
        }
    }
}

/// The ordered parameter set of one property.
///
/// Names are case-insensitive. Adding a value under an existing name
/// accumulates rather than replaces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VCardParameters {
    entries: Vec<VCardParameter>,
}

impl VCardParameters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of distinct parameter names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VCardParameter> {
        self.entries.iter()
    }

    /// Looks up a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&VCardParameter> {
        self.entries
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Returns the first value of a parameter.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(VCardParameter::value)
    }

    /// Returns all values of a parameter.
    #[must_use]
    pub fn values(&self, name: &str) -> &[String] {
        self.get(name).map_or(&[], |p| p.values.as_slice())
    }

    /// Returns whether `name` carries `value` (both case-insensitive).
    #[must_use]
    pub fn contains(&self, name: &str, value: &str) -> bool {
        self.get(name).is_some_and(|p| p.has_value(value))
    }

    /// Adds a value, accumulating with earlier occurrences of the same name.
    pub fn add(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|p| p.name.eq_ignore_ascii_case(name))
        {
            existing.push(value);
        } else {
            self.entries.push(VCardParameter::new(name, value));
        }
    }

    /// Adds several values under one name.
    pub fn add_all(&mut self, name: &str, values: impl IntoIterator<Item = String>) {
        for value in values {
            self.add(name, value);
        }
    }

    /// Replaces every value of `name` with `value`.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.remove(name);
        self.add(name, value);
    }

    /// Removes a parameter, returning it.
    pub fn remove(&mut self, name: &str) -> Option<VCardParameter> {
        let pos = self
            .entries
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))?;
        Some(self.entries.remove(pos))
    }

    /// Removes one value of a parameter, dropping the parameter once empty.
    pub fn remove_value(&mut self, name: &str, value: &str) {
        if let Some(pos) = self
            .entries
            .iter()
            .position(|p| p.name.eq_ignore_ascii_case(name))
        {
            let param = &mut self.entries[pos];
            param.values.retain(|v| !v.eq_ignore_ascii_case(value));
            if param.values.is_empty() {
                self.entries.remove(pos);
            }
        }
    }

    // --- Well-known parameters ---

    /// `VALUE` parameter.
    #[must_use]
    pub fn value_type(&self) -> Option<DataType> {
        self.first("VALUE").map(DataType::parse)
    }

    pub fn set_value_type(&mut self, data_type: Option<&DataType>) {
        match data_type {
            Some(dt) => self.set("VALUE", dt.as_str()),
            None => {
                self.remove("VALUE");
            }
        }
    }

    /// `ENCODING` parameter, lower-cased.
    #[must_use]
    pub fn encoding(&self) -> Option<&str> {
        self.first("ENCODING")
    }

    /// `CHARSET` parameter.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.first("CHARSET")
    }

    /// `TYPE` values, lower-cased.
    #[must_use]
    pub fn types(&self) -> &[String] {
        self.values("TYPE")
    }

    pub fn add_type(&mut self, value: impl Into<String>) {
        self.add("TYPE", value);
    }

    /// `LANGUAGE` parameter.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.first("LANGUAGE")
    }

    /// `LABEL` parameter (4.0 address label).
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.first("LABEL")
    }

    /// `MEDIATYPE` parameter (4.0).
    #[must_use]
    pub fn media_type(&self) -> Option<&str> {
        self.first("MEDIATYPE")
    }
}

impl<'a> IntoIterator for &'a VCardParameters {
    type Item = &'a VCardParameter;
    type IntoIter = std::slice::Iter<'a, VCardParameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_case_insensitive() {
        let mut params = VCardParameters::new();
        params.add("x-size", "big");
        assert_eq!(params.first("X-SIZE"), Some("big"));
        assert_eq!(params.iter().next().map(|p| p.name.as_str()), Some("X-SIZE"));
    }

    #[test]
    fn repeated_names_accumulate() {
        let mut params = VCardParameters::new();
        params.add("type", "dOm");
        params.add("TyPE", "parcel");
        params.add("TYPE", "DOM");

        assert_eq!(params.len(), 1);
        assert_eq!(params.types(), ["dom", "parcel"]);
    }

    #[test]
    fn free_text_values_keep_case() {
        let mut params = VCardParameters::new();
        params.add("LABEL", "123 Main St.");
        assert_eq!(params.label(), Some("123 Main St."));
    }

    #[test]
    fn contains_ignores_case() {
        let mut params = VCardParameters::new();
        params.add_type("HOME");
        assert!(params.contains("type", "Home"));
        assert!(!params.contains("type", "work"));
    }

    #[test]
    fn remove_value_drops_empty_parameter() {
        let mut params = VCardParameters::new();
        params.add_type("home");
        params.add_type("work");
        params.remove_value("TYPE", "home");
        assert_eq!(params.types(), ["work"]);
        params.remove_value("TYPE", "work");
        assert!(params.is_empty());
    }

    #[test]
    fn value_type_round_trip() {
        let mut params = VCardParameters::new();
        params.set_value_type(Some(&DataType::Uri));
        assert_eq!(params.value_type(), Some(DataType::Uri));
        params.set_value_type(None);
        assert!(params.value_type().is_none());
    }
}
