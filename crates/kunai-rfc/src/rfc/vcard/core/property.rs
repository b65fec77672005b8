//! vCard property representation.

use std::any::{Any, TypeId};
use std::fmt;

use super::VCardParameters;

/// The typed payload of a property.
///
/// Implemented for every `Clone + PartialEq + Debug` type, so a payload is any
/// plain struct. Registered scribes know how to marshal their payload type.
pub trait PropertyValue: Any + fmt::Debug + Send + Sync {
    /// Clones the payload behind a box.
    fn clone_value(&self) -> Box<dyn PropertyValue>;
    /// Compares against another payload of possibly different type.
    fn eq_value(&self, other: &dyn PropertyValue) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T> PropertyValue for T
where
    T: Any + Clone + PartialEq + fmt::Debug + Send + Sync,
{
    fn clone_value(&self) -> Box<dyn PropertyValue> {
        Box::new(self.clone())
    }

    fn eq_value(&self, other: &dyn PropertyValue) -> bool {
        other.as_any().downcast_ref::<T>() == Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A payload type with a fixed canonical property name.
pub trait KnownProperty: PropertyValue + Sized {
    const NAME: &'static str;
}

/// A vCard property.
///
/// Represents a single line in a vCard (after unfolding).
pub struct VCardProperty {
    /// Property group (e.g., "item1" in "item1.TEL").
    pub group: Option<String>,
    name: String,
    /// Property parameters.
    pub parameters: VCardParameters,
    value: Box<dyn PropertyValue>,
}

impl VCardProperty {
    /// Creates a property with an explicit name.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl PropertyValue) -> Self {
        Self::from_boxed(name, Box::new(value))
    }

    /// Creates a property named after its payload type.
    #[must_use]
    pub fn of<T: KnownProperty>(value: T) -> Self {
        Self::new(T::NAME, value)
    }

    /// Creates a property from an already boxed payload.
    #[must_use]
    pub fn from_boxed(name: impl Into<String>, value: Box<dyn PropertyValue>) -> Self {
        Self {
            group: None,
            name: name.into(),
            parameters: VCardParameters::new(),
            value,
        }
    }

    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    #[must_use]
    pub fn with_parameters(mut self, parameters: VCardParameters) -> Self {
        self.parameters = parameters;
        self
    }

    #[must_use]
    pub fn with_parameter(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parameters.add(name, value);
        self
    }

    /// Property name. Registered kinds carry their canonical upper-case
    /// name; unrecognized properties keep the name exactly as read.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether the property has the given name (case-insensitive).
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// The payload as a trait object.
    #[must_use]
    pub fn payload(&self) -> &dyn PropertyValue {
        self.value.as_ref()
    }

    /// Type of the payload, used for scribe reverse lookup.
    #[must_use]
    pub fn payload_type(&self) -> TypeId {
        self.value.as_any().type_id()
    }

    /// Downcasts the payload.
    #[must_use]
    pub fn value<T: 'static>(&self) -> Option<&T> {
        self.value.as_any().downcast_ref::<T>()
    }

    /// Downcasts the payload mutably.
    pub fn value_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.value.as_any_mut().downcast_mut::<T>()
    }

    /// Replaces the payload.
    pub fn set_value(&mut self, value: impl PropertyValue) {
        self.value = Box::new(value);
    }
}

impl Clone for VCardProperty {
    fn clone(&self) -> Self {
        Self {
            group: self.group.clone(),
            name: self.name.clone(),
            parameters: self.parameters.clone(),
            value: self.value.clone_value(),
        }
    }
}

impl PartialEq for VCardProperty {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name)
            && self.group == other.group
            && self.parameters == other.parameters
            && self.value.eq_value(other.value.as_ref())
    }
}

impl fmt::Debug for VCardProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VCardProperty")
            .field("group", &self.group)
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("value", &self.value)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Lucky(i32);

    #[test]
    fn downcast_payload() {
        let mut prop = VCardProperty::new("x-lucky-num", Lucky(7));
        assert_eq!(prop.name(), "x-lucky-num");
        assert!(prop.is_named("X-Lucky-Num"));
        assert_eq!(prop.value::<Lucky>(), Some(&Lucky(7)));
        assert!(prop.value::<String>().is_none());

        if let Some(lucky) = prop.value_mut::<Lucky>() {
            lucky.0 = 13;
        }
        assert_eq!(prop.value::<Lucky>(), Some(&Lucky(13)));
        assert_eq!(prop.payload_type(), TypeId::of::<Lucky>());
    }

    #[test]
    fn equality_compares_payloads() {
        let a = VCardProperty::new("X-LUCKY-NUM", Lucky(7)).with_group("item1");
        let b = a.clone();
        assert_eq!(a, b);

        let c = VCardProperty::new("X-LUCKY-NUM", Lucky(8)).with_group("item1");
        assert_ne!(a, c);

        let d = VCardProperty::new("X-LUCKY-NUM", 7_i32).with_group("item1");
        assert_ne!(a, d);
    }
}
