//! Scribes for `BDAY` and `REV`.

use std::any::TypeId;

use super::{
    Marshalled, Scribe, ScribeContext, ScribeError, ScribeResult, Unmarshalled, downcast,
    html_element, xml_first_value, xml_value,
};
use crate::rfc::vcard::build::escape_text;
use crate::rfc::vcard::core::{
    Birthday, DataType, KnownProperty, PropertyValue, Revision, VCardParameters, VCardVersion,
    format_date, format_timestamp, parse_date, parse_timestamp,
};
use crate::rfc::vcard::html::element_value;
use crate::rfc::vcard::json::JCardValue;
use crate::rfc::vcard::parse::unescape_text;
use crate::rfc::vcard::xml::Element;

fn abbr(class: &str, value: String) -> Element {
    html_element("abbr", class)
        .with_attribute("title", value.as_str())
        .with_text(value)
}

/// `BDAY`
///
/// A date, or free text (4.0 `VALUE=text`). A date that does not parse is
/// kept as text with a warning.
#[derive(Debug, Default)]
pub struct BirthdayScribe;

impl BirthdayScribe {
    fn parse(value: String, ctx: &mut ScribeContext) -> Birthday {
        match parse_date(&value) {
            Some(date) => Birthday::date(date),
            None => {
                ctx.warn(format!("malformed date \"{value}\" kept as text"));
                Birthday::text(value)
            }
        }
    }
}

impl Scribe for BirthdayScribe {
    fn name(&self) -> &str {
        Birthday::NAME
    }

    fn payload_type(&self) -> TypeId {
        TypeId::of::<Birthday>()
    }

    fn new_payload(&self) -> Box<dyn PropertyValue> {
        Box::new(Birthday::default())
    }

    fn default_data_type(&self, version: VCardVersion) -> Option<DataType> {
        match version {
            VCardVersion::V4_0 => Some(DataType::DateAndOrTime),
            VCardVersion::V2_1 | VCardVersion::V3_0 => Some(DataType::Date),
        }
    }

    fn prepare_parameters(
        &self,
        payload: &dyn PropertyValue,
        params: &VCardParameters,
        ctx: &mut ScribeContext,
    ) -> VCardParameters {
        let mut params = params.clone();
        let is_text = downcast::<Birthday>(payload).is_ok_and(|bday| bday.date.is_none());
        if is_text && ctx.version == VCardVersion::V4_0 {
            params.set_value_type(Some(&DataType::Text));
        } else {
            params.set_value_type(None);
        }
        params
    }

    fn write_text<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, String>> {
        let bday = downcast::<Birthday>(payload)?;
        Ok(match (bday.date, bday.text.as_deref()) {
            (Some(date), _) => Marshalled::Value(format_date(date, ctx.version)),
            (None, Some(text)) if ctx.version == VCardVersion::V4_0 => {
                Marshalled::Value(escape_text(text))
            }
            (None, Some(text)) => Marshalled::Value(text.to_string()),
            (None, None) => Marshalled::Skip("BDAY has no value".to_string()),
        })
    }

    fn read_text(
        &self,
        params: &mut VCardParameters,
        value: &str,
        ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        if params.value_type() == Some(DataType::Text) {
            params.set_value_type(None);
            return Ok(Unmarshalled::value(Birthday::text(unescape_text(value))));
        }
        Ok(Unmarshalled::value(Self::parse(value.trim().to_string(), ctx)))
    }

    fn write_xml<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, Vec<Element>>> {
        let bday = downcast::<Birthday>(payload)?;
        Ok(match (bday.date, &bday.text) {
            (Some(date), _) => Marshalled::Value(vec![xml_value(
                &DataType::DateAndOrTime,
                format_date(date, VCardVersion::V4_0),
            )]),
            (None, Some(text)) => Marshalled::Value(vec![xml_value(&DataType::Text, text.as_str())]),
            (None, None) => Marshalled::Skip("BDAY has no value".to_string()),
        })
    }

    fn read_xml(
        &self,
        element: &Element,
        _params: &mut VCardParameters,
        ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Ok(Unmarshalled::value(match xml_first_value(element) {
            Some((DataType::Text, text)) => Birthday::text(text),
            Some((_, value)) => Self::parse(value, ctx),
            None => Self::parse(String::new(), ctx),
        }))
    }

    fn write_json<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, JCardValue>> {
        let bday = downcast::<Birthday>(payload)?;
        Ok(match (bday.date, &bday.text) {
            (Some(date), _) => Marshalled::Value(JCardValue::single(
                DataType::DateAndOrTime,
                format_date(date, VCardVersion::V3_0),
            )),
            (None, Some(text)) => Marshalled::Value(JCardValue::text(text.as_str())),
            (None, None) => Marshalled::Skip("BDAY has no value".to_string()),
        })
    }

    fn read_json(
        &self,
        value: &JCardValue,
        _params: &mut VCardParameters,
        ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Ok(Unmarshalled::value(if value.data_type == DataType::Text {
            Birthday::text(value.as_single())
        } else {
            Self::parse(value.as_single(), ctx)
        }))
    }

    fn write_html<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, Element>> {
        let bday = downcast::<Birthday>(payload)?;
        let class = self.html_class();
        Ok(match (bday.date, &bday.text) {
            (Some(date), _) => Marshalled::Value(abbr(&class, format_date(date, VCardVersion::V3_0))),
            (None, Some(text)) => Marshalled::Value(html_element("span", &class).with_text(text.as_str())),
            (None, None) => Marshalled::Skip("BDAY has no value".to_string()),
        })
    }

    fn read_html(
        &self,
        element: &Element,
        _params: &mut VCardParameters,
        ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Ok(Unmarshalled::value(Self::parse(element_value(element), ctx)))
    }
}

/// `REV`
#[derive(Debug, Default)]
pub struct RevisionScribe;

impl RevisionScribe {
    fn parse(value: &str) -> ScribeResult<Unmarshalled> {
        parse_timestamp(value.trim())
            .map(|timestamp| Unmarshalled::value(Revision::new(timestamp)))
            .ok_or_else(|| ScribeError::CannotParse(format!("malformed timestamp \"{value}\"")))
    }

    fn format(payload: &dyn PropertyValue, version: VCardVersion) -> ScribeResult<Option<String>> {
        Ok(downcast::<Revision>(payload)?
            .timestamp
            .map(|timestamp| format_timestamp(&timestamp, version)))
    }
}

impl Scribe for RevisionScribe {
    fn name(&self) -> &str {
        Revision::NAME
    }

    fn payload_type(&self) -> TypeId {
        TypeId::of::<Revision>()
    }

    fn new_payload(&self) -> Box<dyn PropertyValue> {
        Box::new(Revision::default())
    }

    fn default_data_type(&self, version: VCardVersion) -> Option<DataType> {
        match version {
            VCardVersion::V4_0 => Some(DataType::Timestamp),
            VCardVersion::V2_1 | VCardVersion::V3_0 => Some(DataType::DateTime),
        }
    }

    fn write_text<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, String>> {
        Ok(Self::format(payload, ctx.version)?.map_or_else(
            || Marshalled::Skip("REV has no timestamp".to_string()),
            Marshalled::Value,
        ))
    }

    fn read_text(
        &self,
        _params: &mut VCardParameters,
        value: &str,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Self::parse(value)
    }

    fn write_xml<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, Vec<Element>>> {
        Ok(Self::format(payload, VCardVersion::V4_0)?.map_or_else(
            || Marshalled::Skip("REV has no timestamp".to_string()),
            |text| Marshalled::Value(vec![xml_value(&DataType::Timestamp, text)]),
        ))
    }

    fn read_xml(
        &self,
        element: &Element,
        _params: &mut VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        let value = xml_first_value(element)
            .map(|(_, text)| text)
            .unwrap_or_default();
        Self::parse(&value)
    }

    fn write_json<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, JCardValue>> {
        Ok(Self::format(payload, VCardVersion::V3_0)?.map_or_else(
            || Marshalled::Skip("REV has no timestamp".to_string()),
            |text| Marshalled::Value(JCardValue::single(DataType::Timestamp, text)),
        ))
    }

    fn read_json(
        &self,
        value: &JCardValue,
        _params: &mut VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Self::parse(&value.as_single())
    }

    fn write_html<'a>(
        &self,
        payload: &'a dyn PropertyValue,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Marshalled<'a, Element>> {
        Ok(Self::format(payload, VCardVersion::V3_0)?.map_or_else(
            || Marshalled::Skip("REV has no timestamp".to_string()),
            |text| Marshalled::Value(abbr(&self.html_class(), text)),
        ))
    }

    fn read_html(
        &self,
        element: &Element,
        _params: &mut VCardParameters,
        _ctx: &mut ScribeContext,
    ) -> ScribeResult<Unmarshalled> {
        Self::parse(&element_value(element))
    }
}
