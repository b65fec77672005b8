//! The vCard document.

use std::any::Any;

use super::{FormattedName, KnownProperty, PropertyValue, VCardProperty, VCardVersion};

/// One contact record: a version plus an ordered list of properties.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VCard {
    pub version: VCardVersion,
    properties: Vec<VCardProperty>,
}

impl VCard {
    #[must_use]
    pub fn new(version: VCardVersion) -> Self {
        Self {
            version,
            properties: Vec::new(),
        }
    }

    /// Appends a property.
    pub fn push(&mut self, property: VCardProperty) {
        self.properties.push(property);
    }

    /// Appends a payload under its canonical name.
    pub fn add<T: KnownProperty>(&mut self, value: T) {
        self.push(VCardProperty::of(value));
    }

    /// Builder form of [`VCard::add`].
    #[must_use]
    pub fn with<T: KnownProperty>(mut self, value: T) -> Self {
        self.add(value);
        self
    }

    /// Builder form of [`VCard::push`].
    #[must_use]
    pub fn with_property(mut self, property: VCardProperty) -> Self {
        self.push(property);
        self
    }

    #[must_use]
    pub fn properties(&self) -> &[VCardProperty] {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut Vec<VCardProperty> {
        &mut self.properties
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Properties with the given name (case-insensitive).
    pub fn by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a VCardProperty> {
        self.properties.iter().filter(move |p| p.is_named(name))
    }

    /// Removes every property with the given name, returning how many went.
    pub fn remove_named(&mut self, name: &str) -> usize {
        let before = self.properties.len();
        self.properties.retain(|p| !p.is_named(name));
        before - self.properties.len()
    }

    /// Payloads of one type, in document order.
    pub fn all<T: PropertyValue>(&self) -> impl Iterator<Item = &T> {
        self.properties.iter().filter_map(VCardProperty::value::<T>)
    }

    /// First payload of one type.
    #[must_use]
    pub fn first<T: PropertyValue>(&self) -> Option<&T> {
        self.all::<T>().next()
    }

    /// Returns whether any property carries a payload of type `T`.
    #[must_use]
    pub fn has<T: Any>(&self) -> bool {
        self.properties.iter().any(|p| p.value::<T>().is_some())
    }

    /// Returns the formatted name (FN) if present.
    #[must_use]
    pub fn formatted_name(&self) -> Option<&str> {
        self.first::<FormattedName>().map(FormattedName::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::vcard::core::{Note, RawProperty};

    #[test]
    fn typed_lookup() {
        let card = VCard::new(VCardVersion::V4_0)
            .with(FormattedName::new("John Doe"))
            .with(Note::new("first"))
            .with(Note::new("second"));

        assert_eq!(card.formatted_name(), Some("John Doe"));
        let notes: Vec<_> = card.all::<Note>().map(Note::as_str).collect();
        assert_eq!(notes, ["first", "second"]);
        assert_eq!(card.by_name("note").count(), 2);
    }

    #[test]
    fn remove_named() {
        let mut card = VCard::new(VCardVersion::V3_0)
            .with(Note::new("a"))
            .with_property(VCardProperty::new("X-FOO", RawProperty::new("bar")));

        assert_eq!(card.remove_named("NOTE"), 1);
        assert_eq!(card.len(), 1);
        assert!(card.has::<RawProperty>());
    }
}
