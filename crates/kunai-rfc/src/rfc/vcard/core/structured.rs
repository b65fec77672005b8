//! Payloads made of semicolon-separated components: `N`, `ADR` and `ORG`.
//!
//! Every component is a list, since each may hold several comma-separated
//! values on the wire.

use super::KnownProperty;

/// `N`: family, given, additional, prefixes, suffixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredName {
    pub family: Vec<String>,
    pub given: Vec<String>,
    /// Middle names.
    pub additional: Vec<String>,
    /// `Dr.`, `Mrs.`
    pub prefixes: Vec<String>,
    /// `Jr.`, `M.D.`
    pub suffixes: Vec<String>,
}

impl StructuredName {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// One family and one given name.
    #[must_use]
    pub fn simple(family: impl Into<String>, given: impl Into<String>) -> Self {
        Self {
            family: vec![family.into()],
            given: vec![given.into()],
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components().into_iter().all(Vec::is_empty)
    }

    /// Components in wire order.
    #[must_use]
    pub fn components(&self) -> [&Vec<String>; 5] {
        [
            &self.family,
            &self.given,
            &self.additional,
            &self.prefixes,
            &self.suffixes,
        ]
    }

    /// Given names then family names, space separated.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.given
            .iter()
            .chain(&self.family)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl KnownProperty for StructuredName {
    const NAME: &'static str = "N";
}

/// `ADR`, plus the mailing label that legacy versions carry in a separate
/// `LABEL` property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub po_box: Vec<String>,
    /// Apartment or suite.
    pub extended: Vec<String>,
    pub street: Vec<String>,
    /// City.
    pub locality: Vec<String>,
    /// State or province.
    pub region: Vec<String>,
    pub postal_code: Vec<String>,
    pub country: Vec<String>,
    pub label: Option<String>,
}

impl Address {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Whether every component is empty. The label does not count.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components().into_iter().all(Vec::is_empty)
    }

    /// Components in wire order.
    #[must_use]
    pub fn components(&self) -> [&Vec<String>; 7] {
        [
            &self.po_box,
            &self.extended,
            &self.street,
            &self.locality,
            &self.region,
            &self.postal_code,
            &self.country,
        ]
    }

    pub fn components_mut(&mut self) -> [&mut Vec<String>; 7] {
        [
            &mut self.po_box,
            &mut self.extended,
            &mut self.street,
            &mut self.locality,
            &mut self.region,
            &mut self.postal_code,
            &mut self.country,
        ]
    }

    /// Street through country, comma separated.
    #[must_use]
    pub fn one_line(&self) -> String {
        self.components()[2..]
            .iter()
            .flat_map(|values| values.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl KnownProperty for Address {
    const NAME: &'static str = "ADR";
}

/// `ORG`: a name followed by units, broadest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Organization {
    pub name: String,
    pub units: Vec<String>,
}

impl Organization {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_units(name, Vec::new())
    }

    #[must_use]
    pub fn with_units(name: impl Into<String>, units: Vec<String>) -> Self {
        Self {
            name: name.into(),
            units,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.units.is_empty()
    }

    /// Wire values: name, then units.
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        std::iter::once(self.name.as_str())
            .chain(self.units.iter().map(String::as_str))
            .collect()
    }

    /// Inverse of [`Organization::values`].
    #[must_use]
    pub fn from_values(values: Vec<String>) -> Self {
        let mut values = values.into_iter();
        let name = values.next().unwrap_or_default();
        Self::with_units(name, values.collect())
    }
}

impl KnownProperty for Organization {
    const NAME: &'static str = "ORG";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_puts_given_first() {
        let mut name = StructuredName::simple("Doe", "John");
        assert_eq!(name.display_name(), "John Doe");
        name.given.push("Q.".to_string());
        assert_eq!(name.display_name(), "John Q. Doe");
        assert!(!name.is_empty());
        assert!(StructuredName::new().is_empty());
    }

    #[test]
    fn organization_wire_values() {
        let org = Organization::from_values(vec![
            "Acme".to_string(),
            "Sales".to_string(),
            "East".to_string(),
        ]);
        assert_eq!(org.name, "Acme");
        assert_eq!(org.units, ["Sales", "East"]);
        assert_eq!(org.values(), ["Acme", "Sales", "East"]);
        assert!(Organization::from_values(Vec::new()).is_empty());
    }

    #[test]
    fn address_summary_skips_box_and_extended() {
        let mut adr = Address::new().with_label("ignored");
        adr.po_box.push("PO 1".to_string());
        adr.street.push("123 Main St.".to_string());
        adr.locality.push("Austin".to_string());
        adr.region.push("TX".to_string());
        assert_eq!(adr.one_line(), "123 Main St., Austin, TX");
        assert!(Address::new().with_label("only a label").is_empty());
    }
}
