//! Scribe for `PHOTO`.

use std::any::TypeId;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::{
    Marshalled, Scribe, ScribeContext, ScribeError, ScribeResult, Unmarshalled, downcast,
    html_element, xml_first_value, xml_value,
};
use crate::rfc::vcard::core::{
    BinaryContent, DataType, DataUri, KnownProperty, Photo, PropertyValue, VCardParameters,
    VCardVersion, image_media_type,
};
use crate::rfc::vcard::html::element_value;
use crate::rfc::vcard::json::JCardValue;
use crate::rfc::vcard::xml::Element;

const EMPTY_PHOTO: &str = "PHOTO has neither a URL nor data";

/// `PHOTO`
///
/// Inline data is base64 with `ENCODING=BASE64` (2.1) or `ENCODING=b` (3.0)
/// and a bare image type token, or a data URI in 4.0.
#[derive(Debug, Default)]
pub struct PhotoScribe;

impl PhotoScribe {
    /// 4.0 form: a data URI or the URL itself.
    fn uri(photo: &Photo) -> Option<String> {
        match &photo.content {
            BinaryContent::Url(url) => Some(url.clone()),
            BinaryContent::Data(data) => Some(
                DataUri::new(
                    photo.media_type.as_deref().unwrap_or("application/octet-stream"),
                    data.clone(),
                )
                .to_string(),
            ),
            BinaryContent::Empty => None,
        }
    }

    /// Reads a URI value: a data URI becomes inline data.
    fn from_uri(value: &str, media_type: Option<&str>) -> Photo {
        DataUri::parse(value).map_or_else(
            || Photo::from_url(value.trim(), media_type),
            |uri| Photo::from_data(uri.data, uri.media_type),
        )
    }
}

/// Media type from `MEDIATYPE` (4.0) or the first legacy `TYPE` token, which
/// is consumed.
fn take_media_type(params: &mut VCardParameters, version: VCardVersion) -> Option<String> {
    if let Some(media_type) = params.remove("MEDIATYPE").and_then(|p| p.value().map(String::from)) {
        return Some(media_type);
    }
    if !version.is_legacy() {
        return None;
    }
    let token = params.types().first()?.clone();
    params.remove_value("TYPE", &token);
    Some(image_media_type(&token))
}

impl Scribe for PhotoScribe {
    fn name(&self) -> &str {
        Photo::NAME
    }

    fn payload_type(&self) -> TypeId {
        TypeId::of::<Photo>()
    }

    fn new_payload(&self) -> Box<dyn PropertyValue> {
        Box::new(Photo::default())
    }

    fn default_data_type(&self, version: VCardVersion) -> Option<DataType> {
        match version {
            VCardVersion::V4_0 => Some(DataType::Uri),
            VCardVersion::V2_1 | VCardVersion::V3_0 => None,
        }
    }

    fn prepare_parameters(
        &self,
        payload: &dyn PropertyValue,
        params: &VCardParameters,
        ctx: &mut ScribeContext,
    ) -> VCardParameters {
        let mut params = params.clone();
        for name in ["ENCODING", "VALUE", "MEDIATYPE"] {
            params.remove(name);
        }
        let Ok(photo) = downcast::<Photo>(payload) else {
            return params;
        };
        match (&photo.content, ctx.version) {
            (BinaryContent::Data(_), VCardVersion::V2_1) => params.set("ENCODING", "BASE64"),
            (BinaryContent::Data(_), VCardVersion::V3_0) => params.set("ENCODING", "b"),
            (BinaryContent::Url(_), VCardVersion::V2_1) => {
                params.set_value_type(Some(&DataType::Url));
            }
            (BinaryContent::Url(_), VCardVersion::V3_0) => {
                params.set_value_type(Some(&DataType::Uri));
            }
            (BinaryContent::Url(_), VCardVersion::V4_0) => {
                if let Some(media_type) = &photo.media_type {
                    params.set("MEDIATYPE", media_type.as_str());
                }
            }
            (BinaryContent::Data(_) | BinaryContent::Empty, _) => {}
        }
        if let Some(token) = photo.type_token().filter(|_| ctx.version.is_legacy()) {
            params.add_type(token);
        }
        params
    }

    fn write_text<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, String>> {
        let photo = downcast::<Photo>(payload)?;
        let text = match (&photo.content, ctx.version) {
            (BinaryContent::Data(data), VCardVersion::V2_1 | VCardVersion::V3_0) => {
                Some(STANDARD.encode(data))
            }
            _ => Self::uri(photo),
        };
        Ok(text.map_or_else(|| Marshalled::Skip(EMPTY_PHOTO.to_string()), Marshalled::Value))
    }

    fn read_text(
        &self,
        params: &mut VCardParameters,
        value: &str,
        ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        let encoding = params.remove("ENCODING").and_then(|p| p.value().map(String::from));
        params.set_value_type(None);
        let media_type = take_media_type(params, ctx.version);

        if matches!(encoding.as_deref(), Some("b" | "base64")) {
            let compact: String = value.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            let data = STANDARD
                .decode(compact)
                .map_err(|err| ScribeError::CannotParse(format!("invalid base64: {err}")))?;
            let media_type = media_type.unwrap_or_else(|| "application/octet-stream".to_string());
            return Ok(Unmarshalled::value(Photo::from_data(data, media_type)));
        }
        Ok(Unmarshalled::value(Self::from_uri(
            value,
            media_type.as_deref(),
        )))
    }

    fn write_xml<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, Vec<Element>>> {
        let photo = downcast::<Photo>(payload)?;
        Ok(Self::uri(photo).map_or_else(
            || Marshalled::Skip(EMPTY_PHOTO.to_string()),
            |uri| Marshalled::Value(vec![xml_value(&DataType::Uri, uri)]),
        ))
    }

    fn read_xml(
        &self,
        element: &Element,
        params: &mut VCardParameters,
        ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        let value = xml_first_value(element)
            .map(|(_, text)| text)
            .unwrap_or_default();
        let media_type = take_media_type(params, ctx.version);
        Ok(Unmarshalled::value(Self::from_uri(
            &value,
            media_type.as_deref(),
        )))
    }

    fn write_json<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, JCardValue>> {
        let photo = downcast::<Photo>(payload)?;
        Ok(Self::uri(photo).map_or_else(
            || Marshalled::Skip(EMPTY_PHOTO.to_string()),
            |uri| Marshalled::Value(JCardValue::single(DataType::Uri, uri)),
        ))
    }

    fn read_json(
        &self,
        value: &JCardValue,
        params: &mut VCardParameters,
        ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        let media_type = take_media_type(params, ctx.version);
        Ok(Unmarshalled::value(Self::from_uri(
            &value.as_single(),
            media_type.as_deref(),
        )))
    }

    fn write_html<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, Element>> {
        let photo = downcast::<Photo>(payload)?;
        Ok(Self::uri(photo).map_or_else(
            || Marshalled::Skip(EMPTY_PHOTO.to_string()),
            |uri| {
                Marshalled::Value(
                    html_element("img", &self.html_class()).with_attribute("src", uri),
                )
            },
        ))
    }

    fn read_html(
        &self,
        element: &Element,
        _params: &mut VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Ok(Unmarshalled::value(Self::from_uri(
            &element_value(element),
            None,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rfc::vcard::core::CompatibilityMode;

    fn jpeg() -> Photo {
        Photo::from_data(vec![0xff, 0xd8, 0xff], "image/jpeg")
    }

    fn prepared(version: VCardVersion, photo: &Photo) -> VCardParameters {
        let mut ctx = ScribeContext::new(version, CompatibilityMode::Rfc);
        PhotoScribe.prepare_parameters(photo, &VCardParameters::new(), &mut ctx)
    }

    #[test]
    fn inline_parameters_per_version() {
        let v21 = prepared(VCardVersion::V2_1, &jpeg());
        assert_eq!(v21.encoding(), Some("base64"));
        assert_eq!(v21.types(), ["jpeg"]);

        let v30 = prepared(VCardVersion::V3_0, &jpeg());
        assert_eq!(v30.encoding(), Some("b"));
        assert_eq!(v30.types(), ["jpeg"]);

        assert!(prepared(VCardVersion::V4_0, &jpeg()).is_empty());
    }

    #[test]
    fn v4_writes_data_uri() {
        let photo = jpeg();
        let mut ctx = ScribeContext::new(VCardVersion::V4_0, CompatibilityMode::Rfc);
        let Marshalled::Value(text) = PhotoScribe.write_text(&photo, &mut ctx).unwrap() else {
            panic!("expected value");
        };
        assert_eq!(text, "data:image/jpeg;base64,/9j/");
    }

    #[test]
    fn reads_legacy_base64() {
        let mut params = VCardParameters::new();
        params.add("ENCODING", "BASE64");
        params.add_type("JPEG");
        let mut ctx = ScribeContext::new(VCardVersion::V2_1, CompatibilityMode::Rfc);
        let Unmarshalled::Value(payload) = PhotoScribe
            .read_text(&mut params, "/9j/", &mut ctx)
            .unwrap()
        else {
            panic!("expected value");
        };
        assert_eq!(payload.as_any().downcast_ref::<Photo>(), Some(&jpeg()));
        assert!(params.is_empty());
    }

    #[test]
    fn bad_base64_cannot_parse() {
        let mut params = VCardParameters::new();
        params.add("ENCODING", "b");
        let mut ctx = ScribeContext::new(VCardVersion::V3_0, CompatibilityMode::Rfc);
        assert!(matches!(
            PhotoScribe.read_text(&mut params, "!!!", &mut ctx),
            Err(ScribeError::CannotParse(_))
        ));
    }

    #[test]
    fn reads_url_with_media_type() {
        let mut params = VCardParameters::new();
        params.add("MEDIATYPE", "image/png");
        let mut ctx = ScribeContext::new(VCardVersion::V4_0, CompatibilityMode::Rfc);
        let Unmarshalled::Value(payload) = PhotoScribe
            .read_text(&mut params, "http://example.com/me.png", &mut ctx)
            .unwrap()
        else {
            panic!("expected value");
        };
        assert_eq!(
            payload.as_any().downcast_ref::<Photo>(),
            Some(&Photo::from_url("http://example.com/me.png", Some("image/png")))
        );
    }
}
