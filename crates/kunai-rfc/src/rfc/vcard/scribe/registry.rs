//! Scribe lookup tables.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use super::{
    AddressScribe, AgentScribe, BirthdayScribe, GeoScribe, HtmlForm, OrganizationScribe,
    PhotoScribe, RawScribe, RevisionScribe, Scribe, StructuredNameScribe, TextListScribe,
    TextScribe, XmlScribe,
};
use crate::error::{RfcError, RfcResult};
use crate::rfc::vcard::core::{
    Categories, Classification, Email, FormattedName, Kind, Label, Mailer, Nickname, Note,
    ProductId, Profile, RawProperty, Role, SortString, Telephone, Title, Uid, Url, VCardProperty,
    VCardVersion,
};

const V3_0_ONLY: &[VCardVersion] = &[VCardVersion::V3_0];
const V3_0_AND_LATER: &[VCardVersion] = &[VCardVersion::V3_0, VCardVersion::V4_0];
const V4_0_ONLY: &[VCardVersion] = &[VCardVersion::V4_0];

/// The built-in scribes, indexed once.
struct StandardTable {
    scribes: Vec<Arc<dyn Scribe>>,
    by_name: HashMap<String, usize>,
    by_type: HashMap<TypeId, usize>,
}

impl StandardTable {
    fn new(scribes: Vec<Arc<dyn Scribe>>) -> Self {
        let mut by_name = HashMap::with_capacity(scribes.len());
        let mut by_type = HashMap::with_capacity(scribes.len());
        for (index, scribe) in scribes.iter().enumerate() {
            by_name.insert(scribe.name().to_ascii_uppercase(), index);
            by_type.insert(scribe.payload_type(), index);
        }
        Self {
            scribes,
            by_name,
            by_type,
        }
    }
}

static STANDARD: LazyLock<StandardTable> = LazyLock::new(|| {
    let scribes: Vec<Arc<dyn Scribe>> = vec![
        Arc::new(TextScribe::<FormattedName>::new()),
        Arc::new(StructuredNameScribe),
        Arc::new(TextListScribe::<Nickname>::new().versions(V3_0_AND_LATER)),
        Arc::new(PhotoScribe),
        Arc::new(BirthdayScribe),
        Arc::new(AddressScribe),
        Arc::new(TextScribe::<Label>::new().versions(VCardVersion::LEGACY)),
        Arc::new(TextScribe::<Telephone>::new().html(HtmlForm::Link("tel:"))),
        Arc::new(TextScribe::<Email>::new().html(HtmlForm::Link("mailto:"))),
        Arc::new(TextScribe::<Mailer>::new().versions(VCardVersion::LEGACY)),
        Arc::new(GeoScribe),
        Arc::new(TextScribe::<Title>::new()),
        Arc::new(TextScribe::<Role>::new()),
        Arc::new(AgentScribe),
        Arc::new(OrganizationScribe),
        Arc::new(TextListScribe::<Categories>::new().html_class_name("category")),
        Arc::new(TextScribe::<Note>::new()),
        Arc::new(TextScribe::<ProductId>::new()),
        Arc::new(RevisionScribe),
        Arc::new(TextScribe::<SortString>::new().versions(V3_0_ONLY)),
        Arc::new(TextScribe::<Uid>::new()),
        Arc::new(TextScribe::<Url>::new().uri().html(HtmlForm::Link(""))),
        Arc::new(TextScribe::<Classification>::new().versions(V3_0_ONLY)),
        Arc::new(
            TextScribe::<Profile>::new()
                .versions(V3_0_ONLY)
                .expect_value(Profile::VCARD),
        ),
        Arc::new(TextScribe::<Kind>::new().versions(V4_0_ONLY)),
        Arc::new(XmlScribe),
    ];
    StandardTable::new(scribes)
});

/// Maps property names, xCard element names, hCard classes and payload types
/// to scribes.
///
/// Every reader and writer owns one. Extension scribes registered on it are
/// consulted before the built-in table, which is shared and read-only.
#[derive(Clone, Default)]
pub struct ScribeRegistry {
    extended: Vec<Arc<dyn Scribe>>,
}

impl ScribeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds the scribe for a property name (case-insensitive).
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn Scribe>> {
        self.find_extended(|scribe| scribe.name().eq_ignore_ascii_case(name))
            .or_else(|| {
                STANDARD
                    .by_name
                    .get(&name.to_ascii_uppercase())
                    .map(|&index| Arc::clone(&STANDARD.scribes[index]))
            })
    }

    /// Finds the scribe for an xCard element.
    #[must_use]
    pub fn lookup_xml(&self, namespace: &str, local_name: &str) -> Option<Arc<dyn Scribe>> {
        let matches = |scribe: &Arc<dyn Scribe>| {
            scribe.xml_namespace() == namespace && scribe.xml_name().eq_ignore_ascii_case(local_name)
        };
        self.find_extended(matches)
            .or_else(|| STANDARD.scribes.iter().find(|&s| matches(s)).cloned())
    }

    /// Finds the scribe for an hCard class name.
    #[must_use]
    pub fn lookup_html(&self, class: &str) -> Option<Arc<dyn Scribe>> {
        let matches = |scribe: &Arc<dyn Scribe>| scribe.html_class().eq_ignore_ascii_case(class);
        self.find_extended(matches)
            .or_else(|| STANDARD.scribes.iter().find(|&s| matches(s)).cloned())
    }

    /// Finds the scribe that handles a payload type.
    #[must_use]
    pub fn reverse_lookup(&self, payload_type: TypeId) -> Option<Arc<dyn Scribe>> {
        self.find_extended(|scribe| scribe.payload_type() == payload_type)
            .or_else(|| {
                STANDARD
                    .by_type
                    .get(&payload_type)
                    .map(|&index| Arc::clone(&STANDARD.scribes[index]))
            })
    }

    /// Canonical property name for a payload type.
    #[must_use]
    pub fn name_of(&self, payload_type: TypeId) -> Option<String> {
        self.reverse_lookup(payload_type)
            .map(|scribe| scribe.name().to_string())
    }

    /// Scribe for writing `property`.
    ///
    /// The scribe registered under the property's name wins when it handles
    /// the payload type; otherwise the payload type decides. Raw payloads get
    /// a [`RawScribe`] carrying the property's own name.
    #[must_use]
    pub fn scribe_for(&self, property: &VCardProperty) -> Option<Arc<dyn Scribe>> {
        if property.payload_type() == TypeId::of::<RawProperty>() {
            return Some(Arc::new(RawScribe::new(property.name())));
        }
        self.lookup(property.name())
            .filter(|scribe| scribe.payload_type() == property.payload_type())
            .or_else(|| self.reverse_lookup(property.payload_type()))
    }

    /// Whether any scribe, extension or built-in, handles `name`.
    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// ## Summary
    /// Registers an extension scribe, replacing any earlier extension with
    /// the same name. A name shared with a built-in scribe shadows it for
    /// this registry only.
    ///
    /// ## Errors
    /// Returns `RfcError::RegistrationError` if the name is not a valid
    /// property name or the scribe's factory does not produce its declared
    /// payload type.
    pub fn register<S: Scribe + 'static>(&mut self, scribe: S) -> RfcResult<()> {
        let name = scribe.name();
        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(RfcError::RegistrationError(format!(
                "invalid property name: {name:?}"
            )));
        }
        let produced = scribe.new_payload().as_any().type_id();
        if produced != scribe.payload_type() {
            return Err(RfcError::RegistrationError(format!(
                "scribe for {name} builds a payload of a different type than it declares"
            )));
        }

        tracing::debug!(name, "Registering extension scribe");
        let name = name.to_string();
        self.unregister(&name);
        self.extended.push(Arc::new(scribe));
        Ok(())
    }

    /// Removes the extension scribe for `name`. Built-in scribes cannot be
    /// removed.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.extended.len();
        self.extended
            .retain(|scribe| !scribe.name().eq_ignore_ascii_case(name));
        before != self.extended.len()
    }

    fn find_extended(&self, matches: impl Fn(&Arc<dyn Scribe>) -> bool) -> Option<Arc<dyn Scribe>> {
        self.extended.iter().rev().find(|&s| matches(s)).cloned()
    }
}

impl fmt::Debug for ScribeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScribeRegistry")
            .field(
                "extended",
                &self.extended.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
