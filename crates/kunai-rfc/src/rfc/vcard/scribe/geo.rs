//! Scribe for `GEO`.

use std::any::TypeId;

use super::{
    Marshalled, Scribe, ScribeContext, ScribeResult, Unmarshalled, downcast, html_element,
    xml_first_value, xml_value,
};
use crate::rfc::vcard::core::{
    DataType, Geo, KnownProperty, PropertyValue, VCardParameters, VCardVersion, format_coordinate,
};
use crate::rfc::vcard::html::{element_value, find_by_class};
use crate::rfc::vcard::json::JCardValue;
use crate::rfc::vcard::xml::Element;

const NO_COORDINATES: &str = "GEO has no coordinates";

/// `GEO`
///
/// `lat;lon` in 2.1 and 3.0, a `geo:` URI in 4.0. Both forms are accepted
/// when reading any version.
#[derive(Debug, Default)]
pub struct GeoScribe;

impl GeoScribe {
    fn parse(value: &str, ctx: &mut ScribeContext) -> Unmarshalled {
        match Geo::parse_uri(value).or_else(|| Geo::parse_legacy(value)) {
            Some(geo) => Unmarshalled::value(geo),
            None => {
                ctx.warn(format!("cannot parse coordinates: \"{value}\""));
                Unmarshalled::value(Geo::default())
            }
        }
    }

    fn uri(payload: &dyn PropertyValue) -> ScribeResult<Option<String>> {
        Ok(downcast::<Geo>(payload)?.to_uri())
    }
}

impl Scribe for GeoScribe {
    fn name(&self) -> &str {
        Geo::NAME
    }

    fn payload_type(&self) -> TypeId {
        TypeId::of::<Geo>()
    }

    fn new_payload(&self) -> Box<dyn PropertyValue> {
        Box::new(Geo::default())
    }

    fn default_data_type(&self, version: VCardVersion) -> Option<DataType> {
        match version {
            VCardVersion::V4_0 => Some(DataType::Uri),
            VCardVersion::V2_1 | VCardVersion::V3_0 => Some(DataType::Float),
        }
    }

    fn prepare_parameters(
        &self,
        _payload: &dyn PropertyValue,
        params: &VCardParameters,
        ctx: &mut ScribeContext,
    ) -> VCardParameters {
        let mut params = params.clone();
        match ctx.version {
            VCardVersion::V4_0 => params.set_value_type(Some(&DataType::Uri)),
            VCardVersion::V2_1 | VCardVersion::V3_0 => params.set_value_type(None),
        }
        params
    }

    fn write_text<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, String>> {
        let geo = downcast::<Geo>(payload)?;
        let text = match ctx.version {
            VCardVersion::V4_0 => geo.to_uri(),
            VCardVersion::V2_1 | VCardVersion::V3_0 => geo.to_legacy(),
        };
        Ok(text.map_or_else(
            || Marshalled::Skip(NO_COORDINATES.to_string()),
            Marshalled::Value,
        ))
    }

    fn read_text(
        &self,
        _params: &mut VCardParameters,
        value: &str,
        ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Ok(Self::parse(value, ctx))
    }

    fn write_xml<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, Vec<Element>>> {
        Ok(match Self::uri(payload)? {
            Some(uri) => Marshalled::Value(vec![xml_value(&DataType::Uri, uri)]),
            None => Marshalled::Skip(NO_COORDINATES.to_string()),
        })
    }

    fn read_xml(
        &self,
        element: &Element,
        _params: &mut VCardParameters,
        ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        let value = xml_first_value(element)
            .map(|(_, text)| text)
            .unwrap_or_default();
        Ok(Self::parse(&value, ctx))
    }

    fn write_json<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, JCardValue>> {
        Ok(match Self::uri(payload)? {
            Some(uri) => Marshalled::Value(JCardValue::single(DataType::Uri, uri)),
            None => Marshalled::Skip(NO_COORDINATES.to_string()),
        })
    }

    fn read_json(
        &self,
        value: &JCardValue,
        _params: &mut VCardParameters,
        ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Ok(Self::parse(&value.as_single(), ctx))
    }

    fn write_html<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, Element>> {
        let geo = downcast::<Geo>(payload)?;
        let (Some(latitude), Some(longitude)) = (geo.latitude, geo.longitude) else {
            return Ok(Marshalled::Skip(NO_COORDINATES.to_string()));
        };
        let coordinate = |class: &str, value: f64| {
            let text = format_coordinate(value);
            html_element("abbr", class)
                .with_attribute("title", text.as_str())
                .with_text(text)
        };
        Ok(Marshalled::Value(
            html_element("span", &self.html_class())
                .with_child(coordinate("latitude", latitude))
                .with_child(coordinate("longitude", longitude)),
        ))
    }

    fn read_html(
        &self,
        element: &Element,
        _params: &mut VCardParameters,
        ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        let part = |class: &str| find_by_class(element, class).first().map(|e| element_value(e));
        let value = match (part("latitude"), part("longitude")) {
            (Some(latitude), Some(longitude)) => format!("{latitude};{longitude}"),
            _ => element_value(element),
        };
        Ok(Self::parse(&value, ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::vcard::core::CompatibilityMode;

    fn write(version: VCardVersion, geo: &Geo) -> Marshalled<'_, String> {
        let mut ctx = ScribeContext::new(version, CompatibilityMode::Rfc);
        GeoScribe.write_text(geo, &mut ctx).unwrap()
    }

    #[test]
    fn writes_per_version() {
        let geo = Geo::new(-12.34, 56.787_77);
        assert!(matches!(
            write(VCardVersion::V3_0, &geo),
            Marshalled::Value(ref text) if text == "-12.34;56.7878"
        ));
        assert!(matches!(
            write(VCardVersion::V4_0, &geo),
            Marshalled::Value(ref text) if text == "geo:-12.34,56.7878"
        ));
    }

    #[test]
    fn incomplete_geo_is_skipped() {
        assert!(matches!(
            write(VCardVersion::V3_0, &Geo::default()),
            Marshalled::Skip(_)
        ));
    }

    #[test]
    fn v4_parameters_declare_uri() {
        let mut ctx = ScribeContext::new(VCardVersion::V4_0, CompatibilityMode::Rfc);
        let params =
            GeoScribe.prepare_parameters(&Geo::new(1.0, 2.0), &VCardParameters::new(), &mut ctx);
        assert_eq!(params.value_type(), Some(DataType::Uri));
    }

    #[test]
    fn bad_coordinates_warn_once() {
        let mut ctx = ScribeContext::new(VCardVersion::V3_0, CompatibilityMode::Rfc);
        let Unmarshalled::Value(payload) = GeoScribe
            .read_text(&mut VCardParameters::new(), "12.34;not-a-number", &mut ctx)
            .unwrap()
        else {
            panic!("expected value");
        };
        assert_eq!(payload.as_any().downcast_ref::<Geo>(), Some(&Geo::default()));
        assert_eq!(ctx.warnings().len(), 1);
    }

    #[test]
    fn reads_either_form() {
        let mut ctx = ScribeContext::new(VCardVersion::V3_0, CompatibilityMode::Rfc);
        for value in ["geo:1.5,2.5", "1.5;2.5"] {
            let Unmarshalled::Value(payload) = GeoScribe
                .read_text(&mut VCardParameters::new(), value, &mut ctx)
                .unwrap()
            else {
                panic!("expected value");
            };
            assert_eq!(payload.as_any().downcast_ref::<Geo>(), Some(&Geo::new(1.5, 2.5)));
        }
        assert!(ctx.warnings().is_empty());
    }
}
