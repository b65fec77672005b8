//! Scribe for `ADR` and the legacy label merge.

use std::any::TypeId;

use super::structured::{
    html_components, html_read_components, read_components, xml_components, xml_read_components,
};
use super::{Marshalled, Scribe, ScribeContext, ScribeResult, Unmarshalled, downcast};
use crate::rfc::vcard::build::join_structured;
use crate::rfc::vcard::core::{
    Address, KnownProperty, Label, PropertyValue, VCard, VCardParameters, VCardProperty,
    VCardVersion,
};
use crate::rfc::vcard::json::JCardValue;
use crate::rfc::vcard::xml::Element;

const ADDRESS_XML: [&str; 7] = [
    "pobox", "ext", "street", "locality", "region", "code", "country",
];

const ADDRESS_HTML: [&str; 7] = [
    "post-office-box",
    "extended-address",
    "street-address",
    "locality",
    "region",
    "postal-code",
    "country-name",
];

fn address_from(components: Vec<Vec<String>>, label: Option<String>) -> Address {
    let mut address = Address {
        label,
        ..Address::default()
    };
    for (slot, values) in address.components_mut().into_iter().zip(components) {
        *slot = values;
    }
    address
}

/// Takes the `LABEL` parameter out of `params`.
fn take_label(params: &mut VCardParameters) -> Option<String> {
    params
        .remove("LABEL")
        .and_then(|param| param.value().map(String::from))
}

/// `ADR`
///
/// The address label travels either as the `LABEL` parameter or as a
/// companion `LABEL` property, as the context's label policy dictates.
#[derive(Debug, Default)]
pub struct AddressScribe;

impl Scribe for AddressScribe {
    fn name(&self) -> &str {
        Address::NAME
    }

    fn payload_type(&self) -> TypeId {
        TypeId::of::<Address>()
    }

    fn new_payload(&self) -> Box<dyn PropertyValue> {
        Box::new(Address::default())
    }

    fn prepare_parameters(
        &self,
        payload: &dyn PropertyValue,
        params: &VCardParameters,
        ctx: &mut ScribeContext,
    ) -> VCardParameters {
        let mut params = params.clone();
        params.remove("LABEL");
        let label = downcast::<Address>(payload)
            .ok()
            .and_then(|address| address.label.as_deref());
        if let Some(label) = label {
            if ctx.label_policy.uses_parameter(ctx.version) {
                params.set("LABEL", label);
            } else if ctx.version == VCardVersion::V4_0 {
                ctx.warn("address label dropped: 4.0 has no LABEL property");
            }
        }
        params
    }

    fn companion_properties(
        &self,
        payload: &dyn PropertyValue,
        params: &VCardParameters,
        ctx: &mut ScribeContext,
    ) -> Vec<VCardProperty> {
        if ctx.label_policy.uses_parameter(ctx.version) || !ctx.version.is_legacy() {
            return Vec::new();
        }
        let Some(label) = downcast::<Address>(payload)
            .ok()
            .and_then(|address| address.label.clone())
        else {
            return Vec::new();
        };
        let mut companion = VCardProperty::of(Label::new(label));
        for kind in params.types() {
            companion.parameters.add_type(kind.as_str());
        }
        vec![companion]
    }

    fn write_text<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, String>> {
        let address = downcast::<Address>(payload)?;
        Ok(Marshalled::Value(join_structured(
            &address.components().map(Vec::as_slice),
        )))
    }

    fn read_text(
        &self,
        params: &mut VCardParameters,
        value: &str,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        let components = read_components(value, ADDRESS_XML.len(), true);
        Ok(Unmarshalled::value(address_from(
            components,
            take_label(params),
        )))
    }

    fn write_xml<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, Vec<Element>>> {
        let address = downcast::<Address>(payload)?;
        Ok(Marshalled::Value(xml_components(
            &ADDRESS_XML,
            &address.components(),
        )))
    }

    fn read_xml(
        &self,
        element: &Element,
        params: &mut VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Ok(Unmarshalled::value(address_from(
            xml_read_components(element, &ADDRESS_XML),
            take_label(params),
        )))
    }

    fn write_json<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, JCardValue>> {
        let address = downcast::<Address>(payload)?;
        Ok(Marshalled::Value(JCardValue::structured(
            &address.components().map(Vec::as_slice),
        )))
    }

    fn read_json(
        &self,
        value: &JCardValue,
        params: &mut VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Ok(Unmarshalled::value(address_from(
            value.as_structured(),
            take_label(params),
        )))
    }

    fn write_html<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, Element>> {
        let address = downcast::<Address>(payload)?;
        Ok(Marshalled::Value(html_components(
            &self.html_class(),
            &ADDRESS_HTML,
            &address.components(),
        )))
    }

    fn read_html(
        &self,
        element: &Element,
        _params: &mut VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Ok(Unmarshalled::value(address_from(
            html_read_components(element, &ADDRESS_HTML),
            None,
        )))
    }
}

fn sorted_types(property: &VCardProperty) -> Vec<&str> {
    let mut types: Vec<&str> = property
        .parameters
        .types()
        .iter()
        .map(String::as_str)
        .collect();
    types.sort_unstable();
    types
}

/// Folds standalone `LABEL` properties into their addresses.
///
/// A label attaches to the first `ADR` that has no label yet and the same set
/// of `TYPE` values. Labels without such an address stay as they are.
pub fn merge_labels(vcard: &mut VCard) {
    let properties = vcard.properties_mut();
    let mut index = 0;
    while index < properties.len() {
        let Some(label) = properties[index].value::<Label>().map(|l| l.value.clone()) else {
            index += 1;
            continue;
        };
        let types = sorted_types(&properties[index]);
        let target = properties.iter().position(|property| {
            property
                .value::<Address>()
                .is_some_and(|address| address.label.is_none())
                && sorted_types(property) == types
        });
        match target {
            Some(target) => {
                if let Some(address) = properties[target].value_mut::<Address>() {
                    address.label = Some(label);
                }
                properties.remove(index);
            }
            None => index += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::vcard::options::LabelPolicy;
    use crate::rfc::vcard::core::CompatibilityMode;

    fn labelled() -> Address {
        let mut address = Address::new().with_label("123 Main St.\nAustin, TX");
        address.street.push("123 Main St.".to_string());
        address.locality.push("Austin".to_string());
        address
    }

    #[test]
    fn reads_label_parameter() {
        let mut params = VCardParameters::new();
        params.add("LABEL", "PO Box 1");
        let mut ctx = ScribeContext::new(VCardVersion::V4_0, CompatibilityMode::Rfc);
        let Unmarshalled::Value(payload) = AddressScribe
            .read_text(&mut params, ";;Main St;Austin;TX;78701;USA", &mut ctx)
            .unwrap()
        else {
            panic!("expected value");
        };
        let address = payload.as_any().downcast_ref::<Address>().unwrap();
        assert_eq!(address.label.as_deref(), Some("PO Box 1"));
        assert_eq!(address.postal_code, ["78701"]);
        assert!(params.get("LABEL").is_none());
    }

    #[test]
    fn auto_policy_uses_parameter_for_v4() {
        let address = labelled();
        let mut ctx = ScribeContext::new(VCardVersion::V4_0, CompatibilityMode::Rfc);
        let params = AddressScribe.prepare_parameters(&address, &VCardParameters::new(), &mut ctx);
        assert_eq!(params.label(), Some("123 Main St.\nAustin, TX"));
        assert!(
            AddressScribe
                .companion_properties(&address, &params, &mut ctx)
                .is_empty()
        );
    }

    #[test]
    fn auto_policy_uses_property_for_v3() {
        let address = labelled();
        let mut params = VCardParameters::new();
        params.add_type("home");
        let mut ctx = ScribeContext::new(VCardVersion::V3_0, CompatibilityMode::Rfc);
        let prepared = AddressScribe.prepare_parameters(&address, &params, &mut ctx);
        assert!(prepared.label().is_none());

        let companions = AddressScribe.companion_properties(&address, &prepared, &mut ctx);
        assert_eq!(companions.len(), 1);
        assert!(companions[0].is_named("LABEL"));
        assert!(companions[0].parameters.contains("TYPE", "HOME"));
    }

    #[test]
    fn property_policy_drops_label_in_v4() {
        let address = labelled();
        let mut ctx = ScribeContext::new(VCardVersion::V4_0, CompatibilityMode::Rfc)
            .with_label_policy(LabelPolicy::Property);
        let params = AddressScribe.prepare_parameters(&address, &VCardParameters::new(), &mut ctx);
        assert!(params.label().is_none());
        assert_eq!(ctx.warnings().len(), 1);
    }

    #[test]
    fn merges_label_with_matching_types() {
        let mut vcard = VCard::new(VCardVersion::V3_0);
        vcard.push(VCardProperty::of(Address::new()).with_parameter("TYPE", "work"));
        vcard.push(VCardProperty::of(Address::new()).with_parameter("TYPE", "home"));
        vcard.push(VCardProperty::of(Label::new("Home label")).with_parameter("TYPE", "HOME"));
        vcard.push(VCardProperty::of(Label::new("Orphan")).with_parameter("TYPE", "dom"));

        merge_labels(&mut vcard);

        let labels: Vec<_> = vcard
            .all::<Address>()
            .map(|a| a.label.as_deref())
            .collect();
        assert_eq!(labels, [None, Some("Home label")]);
        assert_eq!(vcard.all::<Label>().count(), 1);
    }
}
