//! Bookkeeping shared by every reader and writer: scribe resolution,
//! version gating, required properties and synthetic properties.

use std::borrow::Cow;
use std::sync::Arc;

use kunai_core::constants::{EXTENSION_PREFIX, GENERATOR, PRODUCT_ID};

use super::{RawScribe, Scribe, ScribeContext, ScribeRegistry};
use crate::rfc::vcard::core::{
    FormattedName, KnownProperty, ProductId, RawProperty, StructuredName, VCard, VCardParameters,
    VCardProperty, VCardVersion, Warning,
};

const PRODID_LEGACY: &str = "X-PRODID";
const GENERATOR_NAME: &str = "X-GENERATOR";

/// Which synthetic properties a top-level document receives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signature {
    pub prod_id: bool,
    pub generator: bool,
}

impl Signature {
    /// Nested documents get neither.
    pub const NONE: Self = Self {
        prod_id: false,
        generator: false,
    };
}

/// Scribe used to read a property name, and whether it is registered.
///
/// Unregistered names fall back to a [`RawScribe`]; `warning` is set when the
/// name also lacks the `X-` prefix.
pub struct ReadTarget {
    pub scribe: Arc<dyn Scribe>,
    pub known: bool,
    pub warning: Option<String>,
}

impl ReadTarget {
    #[must_use]
    pub fn resolve(registry: &ScribeRegistry, name: &str) -> Self {
        if let Some(scribe) = registry.lookup(name) {
            return Self {
                scribe,
                known: true,
                warning: None,
            };
        }
        let warning = (!is_extension_name(name))
            .then(|| format!("non-standard property \"{name}\" kept as raw text"));
        Self {
            scribe: Arc::new(RawScribe::new(name)),
            known: false,
            warning,
        }
    }

    /// Name the parsed property is stored under: canonical for registered
    /// kinds, as written otherwise.
    #[must_use]
    pub fn property_name<'a>(&'a self, written: &'a str) -> &'a str {
        if self.known {
            self.scribe.name()
        } else {
            written
        }
    }
}

#[must_use]
pub fn is_extension_name(name: &str) -> bool {
    name.get(..EXTENSION_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(EXTENSION_PREFIX))
}

/// Drops a `VALUE` parameter that only restates the scribe's default.
pub fn drop_default_value_type(
    params: &mut VCardParameters,
    scribe: &dyn Scribe,
    version: VCardVersion,
) {
    let current = params.value_type();
    if current.is_some() && current == scribe.default_data_type(version) {
        params.set_value_type(None);
    }
}

/// Moves the context's warnings into `sink`, tagged with the property name
/// and line.
pub fn drain_warnings(
    ctx: &mut ScribeContext,
    property: &str,
    line: Option<usize>,
    sink: &mut Vec<Warning>,
) {
    for message in ctx.take_warnings() {
        let warning = Warning::new(message).with_property(property);
        sink.push(match line {
            Some(line) => warning.with_line(line),
            None => warning,
        });
    }
}

/// One warning per required property the document lacks.
#[must_use]
pub fn missing_required(vcard: &VCard, version: VCardVersion) -> Vec<Warning> {
    let has_name = vcard.has::<StructuredName>();
    let has_formatted = vcard.has::<FormattedName>();
    let required: &[(&str, bool)] = match version {
        VCardVersion::V2_1 => &[("N", has_name)],
        VCardVersion::V3_0 => &[("N", has_name), ("FN", has_formatted)],
        VCardVersion::V4_0 => &[("FN", has_formatted)],
    };
    required
        .iter()
        .filter(|(_, present)| !*present)
        .map(|(name, _)| {
            Warning::new(format!("required in vCard {version} but missing")).with_property(*name)
        })
        .collect()
}

/// A property ready to be marshalled.
pub struct Planned<'a> {
    pub property: Cow<'a, VCardProperty>,
    pub scribe: Arc<dyn Scribe>,
    /// Parameters after [`Scribe::prepare_parameters`].
    pub parameters: VCardParameters,
}

impl Planned<'_> {
    /// Name written on the wire.
    #[must_use]
    pub fn name(&self) -> &str {
        self.scribe.name()
    }
}

fn is_signature_property(property: &VCardProperty, signature: Signature) -> bool {
    (signature.prod_id
        && (property.value::<ProductId>().is_some()
            || property.is_named(ProductId::NAME)
            || property.is_named(PRODID_LEGACY)))
        || (signature.generator && property.is_named(GENERATOR_NAME))
}

/// Resolves, gates and prepares every property of `vcard` for `ctx.version`.
///
/// Properties without a scribe, or not valid in the target version, are
/// omitted with one warning each. Synthetic properties requested by
/// `signature` replace any already in the document and are appended after
/// its own properties.
pub fn plan<'a>(
    vcard: &'a VCard,
    registry: &ScribeRegistry,
    ctx: &mut ScribeContext,
    signature: Signature,
    warnings: &mut Vec<Warning>,
) -> Vec<Planned<'a>> {
    let mut queue: Vec<Cow<'a, VCardProperty>> = vcard
        .properties()
        .iter()
        .filter(|property| !is_signature_property(property, signature))
        .map(Cow::Borrowed)
        .collect();
    if signature.prod_id {
        queue.push(Cow::Owned(if ctx.version == VCardVersion::V2_1 {
            VCardProperty::new(PRODID_LEGACY, RawProperty::new(PRODUCT_ID))
        } else {
            VCardProperty::of(ProductId::new(PRODUCT_ID))
        }));
    }
    if signature.generator {
        queue.push(Cow::Owned(VCardProperty::new(
            GENERATOR_NAME,
            RawProperty::new(GENERATOR),
        )));
    }

    let mut planned = Vec::with_capacity(queue.len());
    for property in queue {
        let Some(scribe) = registry.scribe_for(&property) else {
            tracing::warn!(name = property.name(), "No scribe for property payload");
            warnings.push(
                Warning::new("no scribe handles this payload; omitted")
                    .with_property(property.name()),
            );
            continue;
        };
        if !scribe.supported_versions().contains(&ctx.version) {
            warnings.push(
                Warning::new(format!("not supported in vCard {}; omitted", ctx.version))
                    .with_property(scribe.name()),
            );
            continue;
        }

        let parameters = scribe.prepare_parameters(property.payload(), &property.parameters, ctx);
        let companions = scribe.companion_properties(property.payload(), &parameters, ctx);
        drain_warnings(ctx, scribe.name(), None, warnings);
        planned.push(Planned {
            property,
            scribe,
            parameters,
        });

        for companion in companions {
            let Some(scribe) = registry.scribe_for(&companion) else {
                continue;
            };
            let parameters =
                scribe.prepare_parameters(companion.payload(), &companion.parameters, ctx);
            drain_warnings(ctx, scribe.name(), None, warnings);
            planned.push(Planned {
                property: Cow::Owned(companion),
                scribe,
                parameters,
            });
        }
    }
    planned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::vcard::core::{Address, CompatibilityMode, Label, Mailer, Note};

    fn ctx(version: VCardVersion) -> ScribeContext {
        ScribeContext::new(version, CompatibilityMode::Rfc)
    }

    #[test]
    fn read_target_for_unknown_names() {
        let registry = ScribeRegistry::new();
        let known = ReadTarget::resolve(&registry, "note");
        assert!(known.warning.is_none());
        assert_eq!(known.property_name("note"), "NOTE");

        let extension = ReadTarget::resolve(&registry, "X-Custom");
        assert!(extension.warning.is_none());
        assert_eq!(extension.property_name("X-Custom"), "X-Custom");

        let nonstandard = ReadTarget::resolve(&registry, "Custom");
        assert!(nonstandard.warning.is_some());
        assert_eq!(nonstandard.property_name("Custom"), "Custom");
    }

    #[test]
    fn required_properties_by_version() {
        let empty = VCard::new(VCardVersion::V3_0);
        assert_eq!(missing_required(&empty, VCardVersion::V2_1).len(), 1);
        assert_eq!(missing_required(&empty, VCardVersion::V3_0).len(), 2);
        assert_eq!(missing_required(&empty, VCardVersion::V4_0).len(), 1);

        let named = VCard::new(VCardVersion::V3_0).with(FormattedName::new("Jane"));
        assert!(missing_required(&named, VCardVersion::V4_0).is_empty());
    }

    #[test]
    fn version_gated_property_is_omitted_once() {
        let vcard = VCard::new(VCardVersion::V3_0)
            .with(Mailer::new("Outlook"))
            .with(Note::new("hi"));
        let mut warnings = Vec::new();
        let planned = plan(
            &vcard,
            &ScribeRegistry::new(),
            &mut ctx(VCardVersion::V4_0),
            Signature::NONE,
            &mut warnings,
        );
        assert_eq!(planned.len(), 1);
        assert_eq!(planned[0].name(), "NOTE");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].property.as_deref(), Some("MAILER"));
    }

    #[test]
    fn signature_replaces_existing_prodid() {
        let vcard = VCard::new(VCardVersion::V3_0)
            .with(ProductId::new("-//other//EN"))
            .with_property(VCardProperty::new("X-GENERATOR", RawProperty::new("other")))
            .with(Note::new("kept"));
        let mut warnings = Vec::new();
        let signature = Signature {
            prod_id: true,
            generator: true,
        };

        let planned = plan(
            &vcard,
            &ScribeRegistry::new(),
            &mut ctx(VCardVersion::V2_1),
            signature,
            &mut warnings,
        );
        let names: Vec<_> = planned.iter().map(Planned::name).collect();
        assert_eq!(names, ["NOTE", "X-PRODID", "X-GENERATOR"]);
        assert!(warnings.is_empty());
    }

    #[test]
    fn companions_follow_their_property() {
        let vcard = VCard::new(VCardVersion::V3_0)
            .with(Address::new().with_label("Main St"))
            .with(Note::new("after"));
        let mut warnings = Vec::new();
        let planned = plan(
            &vcard,
            &ScribeRegistry::new(),
            &mut ctx(VCardVersion::V3_0),
            Signature::NONE,
            &mut warnings,
        );
        let names: Vec<_> = planned.iter().map(Planned::name).collect();
        assert_eq!(names, ["ADR", "LABEL", "NOTE"]);
        assert_eq!(
            planned[1].property.value::<Label>(),
            Some(&Label::new("Main St"))
        );
    }
}
