//! Date payloads (BDAY, REV).

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use super::{KnownProperty, VCardVersion};

/// Birthday: a calendar date, or free text (4.0 `VALUE=text`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Birthday {
    pub date: Option<NaiveDate>,
    pub text: Option<String>,
}

impl Birthday {
    #[must_use]
    pub fn date(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            text: None,
        }
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            date: None,
            text: Some(text.into()),
        }
    }
}

impl KnownProperty for Birthday {
    const NAME: &'static str = "BDAY";
}

/// Last revision of the vCard (REV).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Revision {
    pub timestamp: Option<DateTime<Utc>>,
}

impl Revision {
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp: Some(timestamp),
        }
    }
}

impl KnownProperty for Revision {
    const NAME: &'static str = "REV";
}

/// Parses a date in basic (`19800322`) or extended (`1980-03-22`) form.
/// A trailing time component is ignored.
#[must_use]
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    let date_part = value.split_once('T').map_or(value, |(date, _)| date);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%Y%m%d"))
        .ok()
}

/// Formats a date: extended form for 2.1/3.0, basic form for 4.0.
#[must_use]
pub fn format_date(date: NaiveDate, version: VCardVersion) -> String {
    match version {
        VCardVersion::V4_0 => date.format("%Y%m%d").to_string(),
        VCardVersion::V2_1 | VCardVersion::V3_0 => date.format("%Y-%m-%d").to_string(),
    }
}

/// Parses a UTC timestamp, basic or extended, with `Z`, a numeric offset, or
/// no time at all (midnight UTC).
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    for fmt in ["%Y%m%dT%H%M%S%z", "%Y-%m-%dT%H:%M:%S%:z", "%Y-%m-%dT%H:%M:%S%z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    if let Some(naive) = value.strip_suffix(['Z', 'z']) {
        for fmt in ["%Y%m%dT%H%M%S", "%Y-%m-%dT%H:%M:%S"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(naive, fmt) {
                return Some(dt.and_utc());
            }
        }
    }
    if value.contains('T') {
        return None;
    }
    parse_date(value).map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// Formats a timestamp: extended form for 2.1/3.0, basic form for 4.0.
#[must_use]
pub fn format_timestamp(timestamp: &DateTime<Utc>, version: VCardVersion) -> String {
    match version {
        VCardVersion::V4_0 => timestamp.format("%Y%m%dT%H%M%SZ").to_string(),
        VCardVersion::V2_1 | VCardVersion::V3_0 => {
            timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn parse_date_forms() {
        let expected = NaiveDate::from_ymd_opt(1980, 3, 22);
        assert_eq!(parse_date("1980-03-22"), expected);
        assert_eq!(parse_date("19800322"), expected);
        assert_eq!(parse_date("1980-03-22T10:00:00Z"), expected);
        assert_eq!(parse_date("March 22"), None);
    }

    #[test]
    fn parse_timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2013, 1, 2, 3, 4, 5).single();
        assert_eq!(parse_timestamp("20130102T030405Z"), expected);
        assert_eq!(parse_timestamp("2013-01-02T03:04:05Z"), expected);
        assert_eq!(parse_timestamp("2013-01-02T05:04:05+02:00"), expected);
        assert_eq!(parse_timestamp("garbage"), None);
    }

    #[test]
    fn format_by_version() {
        let ts = Utc.with_ymd_and_hms(2013, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_timestamp(&ts, VCardVersion::V4_0), "20130102T030405Z");
        assert_eq!(format_timestamp(&ts, VCardVersion::V3_0), "2013-01-02T03:04:05Z");

        let date = NaiveDate::from_ymd_opt(1980, 3, 22).unwrap();
        assert_eq!(format_date(date, VCardVersion::V4_0), "19800322");
        assert_eq!(format_date(date, VCardVersion::V2_1), "1980-03-22");
    }
}
