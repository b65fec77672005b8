//! Scribe for `AGENT`, the one property whose value can be a whole vCard.

use std::any::TypeId;

use super::{
    Marshalled, Scribe, ScribeContext, ScribeResult, Unmarshalled, downcast, html_element,
};
use crate::rfc::vcard::core::{
    Agent, DataType, KnownProperty, PropertyValue, VCardParameters, VCardVersion,
};
use crate::rfc::vcard::html::{link_value, nested_vcard};
use crate::rfc::vcard::xml::Element;

/// `AGENT` (2.1 and 3.0).
///
/// A URL value is written with `VALUE=url` (2.1) or `VALUE=uri` (3.0).
/// An embedded vCard is handed to the engine as [`Marshalled::Embedded`] and
/// read back through an injector.
#[derive(Debug, Default)]
pub struct AgentScribe;

impl AgentScribe {
    fn embedded() -> Unmarshalled {
        Unmarshalled::Embedded(Box::new(|vcard| Box::new(Agent::vcard(vcard))))
    }
}

fn is_link(data_type: Option<&DataType>) -> bool {
    matches!(data_type, Some(DataType::Url | DataType::Uri))
}

impl Scribe for AgentScribe {
    fn name(&self) -> &str {
        Agent::NAME
    }

    fn payload_type(&self) -> TypeId {
        TypeId::of::<Agent>()
    }

    fn new_payload(&self) -> Box<dyn PropertyValue> {
        Box::new(Agent::default())
    }

    fn supported_versions(&self) -> &[VCardVersion] {
        VCardVersion::LEGACY
    }

    fn default_data_type(&self, _version: VCardVersion) -> Option<DataType> {
        None
    }

    fn prepare_parameters(
        &self,
        payload: &dyn PropertyValue,
        params: &VCardParameters,
        ctx: &mut ScribeContext,
    ) -> VCardParameters {
        let mut params = params.clone();
        let data_type = match downcast::<Agent>(payload) {
            Ok(Agent::Url(_)) if ctx.version == VCardVersion::V2_1 => Some(DataType::Url),
            Ok(Agent::Url(_)) => Some(DataType::Uri),
            _ => None,
        };
        params.set_value_type(data_type.as_ref());
        params
    }

    fn write_text<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, String>> {
        Ok(match downcast::<Agent>(payload)? {
            Agent::Url(url) => Marshalled::Value(url.clone()),
            Agent::VCard(vcard) => Marshalled::Embedded(vcard),
            Agent::Empty => Marshalled::Skip("AGENT has neither a URL nor a vCard".to_string()),
        })
    }

    fn read_text(
        &self,
        params: &mut VCardParameters,
        value: &str,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        if is_link(params.value_type().as_ref()) {
            params.set_value_type(None);
            return Ok(Unmarshalled::value(Agent::url(value.trim())));
        }
        let inline_card = value
            .trim_start()
            .get(..11)
            .is_some_and(|head| head.eq_ignore_ascii_case("BEGIN:VCARD"));
        if value.trim().is_empty() || inline_card {
            Ok(Self::embedded())
        } else {
            Ok(Unmarshalled::value(Agent::url(value.trim())))
        }
    }

    fn write_html<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, Element>> {
        Ok(match downcast::<Agent>(payload)? {
            Agent::Url(url) => Marshalled::Value(
                html_element("a", &self.html_class())
                    .with_attribute("href", url.as_str())
                    .with_text(url.as_str()),
            ),
            Agent::VCard(vcard) => Marshalled::Embedded(vcard),
            Agent::Empty => Marshalled::Skip("AGENT has neither a URL nor a vCard".to_string()),
        })
    }

    fn read_html(
        &self,
        element: &Element,
        _params: &mut VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        if nested_vcard(element).is_some() {
            Ok(Self::embedded())
        } else {
            Ok(Unmarshalled::value(Agent::url(link_value(element))))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::vcard::core::{CompatibilityMode, VCard};

    fn read(value: &str, params: &mut VCardParameters) -> Unmarshalled {
        let mut ctx = ScribeContext::new(VCardVersion::V3_0, CompatibilityMode::Rfc);
        AgentScribe.read_text(params, value, &mut ctx).unwrap()
    }

    #[test]
    fn url_value() {
        let mut params = VCardParameters::new();
        params.set("VALUE", "uri");
        let Unmarshalled::Value(payload) = read("http://example.com/agent", &mut params) else {
            panic!("expected value");
        };
        assert_eq!(
            payload.as_any().downcast_ref::<Agent>(),
            Some(&Agent::url("http://example.com/agent"))
        );
        assert!(params.value_type().is_none());
    }

    #[test]
    fn empty_or_inline_value_is_embedded() {
        let Unmarshalled::Embedded(inject) = read("", &mut VCardParameters::new()) else {
            panic!("expected embedded");
        };
        let payload = inject(VCard::new(VCardVersion::V2_1));
        assert!(
            payload
                .as_any()
                .downcast_ref::<Agent>()
                .and_then(Agent::as_vcard)
                .is_some()
        );

        assert!(matches!(
            read("BEGIN:VCARD\\nFN:Jane\\nEND:VCARD", &mut VCardParameters::new()),
            Unmarshalled::Embedded(_)
        ));
    }

    #[test]
    fn url_parameters_follow_version() {
        let agent = Agent::url("http://example.com");
        for (version, expected) in [
            (VCardVersion::V2_1, DataType::Url),
            (VCardVersion::V3_0, DataType::Uri),
        ] {
            let mut ctx = ScribeContext::new(version, CompatibilityMode::Rfc);
            let params = AgentScribe.prepare_parameters(&agent, &VCardParameters::new(), &mut ctx);
            assert_eq!(params.value_type(), Some(expected));
        }
    }

    #[test]
    fn embedded_card_is_handed_to_engine() {
        let agent = Agent::vcard(VCard::new(VCardVersion::V3_0));
        let mut ctx = ScribeContext::new(VCardVersion::V3_0, CompatibilityMode::Rfc);
        assert!(matches!(
            AgentScribe.write_text(&agent, &mut ctx).unwrap(),
            Marshalled::Embedded(_)
        ));
    }
}
