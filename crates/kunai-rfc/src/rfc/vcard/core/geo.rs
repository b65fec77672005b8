//! Geographic position (GEO).

use super::KnownProperty;

/// Fixed number of decimals written for a coordinate.
const COORDINATE_DECIMALS: usize = 4;

/// Latitude/longitude pair. Either half is `None` when it could not be read.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Geo {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Geo {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }

    /// Returns whether both coordinates are set.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.latitude.is_some() && self.longitude.is_some()
    }

    /// Parses the legacy `lat;lon` form.
    #[must_use]
    pub fn parse_legacy(value: &str) -> Option<Self> {
        let (lat, lon) = value.split_once(';')?;
        Some(Self::new(
            lat.trim().parse().ok()?,
            lon.trim().parse().ok()?,
        ))
    }

    /// Parses a `geo:lat,lon[,alt][;params]` URI (RFC 5870).
    #[must_use]
    pub fn parse_uri(value: &str) -> Option<Self> {
        let value = value.trim();
        let scheme = value.get(..4)?;
        if !scheme.eq_ignore_ascii_case("geo:") {
            return None;
        }
        let coords = value[4..].split(';').next()?;
        let mut parts = coords.split(',');
        let lat = parts.next()?.trim().parse().ok()?;
        let lon = parts.next()?.trim().parse().ok()?;
        Some(Self::new(lat, lon))
    }

    /// Formats as `lat;lon`, or `None` when a coordinate is missing.
    #[must_use]
    pub fn to_legacy(&self) -> Option<String> {
        let (lat, lon) = (self.latitude?, self.longitude?);
        Some(format!(
            "{};{}",
            format_coordinate(lat),
            format_coordinate(lon)
        ))
    }

    /// Formats as a `geo:` URI, or `None` when a coordinate is missing.
    #[must_use]
    pub fn to_uri(&self) -> Option<String> {
        let (lat, lon) = (self.latitude?, self.longitude?);
        Some(format!(
            "geo:{},{}",
            format_coordinate(lat),
            format_coordinate(lon)
        ))
    }
}

impl KnownProperty for Geo {
    const NAME: &'static str = "GEO";
}

/// Renders a coordinate with at most four decimals, rounding half up.
///
/// Rounding works on the shortest decimal representation of the value, so
/// `56.78775` rounds to `56.7878` even though its binary value is slightly
/// below the midpoint.
#[must_use]
pub fn format_coordinate(value: f64) -> String {
    let repr = format!("{}", value.abs());
    let (int_part, frac_part) = repr.split_once('.').unwrap_or((&repr, ""));

    let mut digits: Vec<u8> = int_part.bytes().collect();
    let kept = frac_part.len().min(COORDINATE_DECIMALS);
    digits.extend(frac_part.bytes().take(kept));
    let mut int_len = int_part.len();

    if frac_part
        .as_bytes()
        .get(COORDINATE_DECIMALS)
        .is_some_and(|d| *d >= b'5')
    {
        let mut carry = true;
        for digit in digits.iter_mut().rev() {
            if *digit == b'9' {
                *digit = b'0';
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, b'1');
            int_len += 1;
        }
    }

    let (int_digits, frac_digits) = digits.split_at(int_len);
    let int_str = String::from_utf8_lossy(int_digits);
    let frac_str = String::from_utf8_lossy(frac_digits);
    let frac_str = frac_str.trim_end_matches('0');

    let mut out = String::with_capacity(int_str.len() + frac_str.len() + 2);
    let is_zero = int_str.bytes().all(|b| b == b'0') && frac_str.is_empty();
    if value.is_sign_negative() && !is_zero {
        out.push('-');
    }
    out.push_str(&int_str);
    if !frac_str.is_empty() {
        out.push('.');
        out.push_str(frac_str);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_half_up_rounding() {
        assert_eq!(format_coordinate(-12.34), "-12.34");
        assert_eq!(format_coordinate(56.787_77), "56.7878");
        assert_eq!(format_coordinate(56.787_75), "56.7878");
        assert_eq!(format_coordinate(56.787_74), "56.7877");
        assert_eq!(format_coordinate(9.999_99), "10");
        assert_eq!(format_coordinate(-0.000_01), "0");
        assert_eq!(format_coordinate(42.0), "42");
    }

    #[test]
    fn legacy_and_uri_forms() {
        let geo = Geo::new(-12.34, 56.787_77);
        assert_eq!(geo.to_legacy().as_deref(), Some("-12.34;56.7878"));
        assert_eq!(geo.to_uri().as_deref(), Some("geo:-12.34,56.7878"));
    }

    #[test]
    fn parse_forms() {
        let geo = Geo::parse_legacy("-12.34;56.7878").unwrap();
        assert_eq!(geo, Geo::new(-12.34, 56.7878));

        let geo = Geo::parse_uri("GEO:-12.34,56.7878;u=10").unwrap();
        assert_eq!(geo, Geo::new(-12.34, 56.7878));

        assert!(Geo::parse_legacy("not a;number").is_none());
        assert!(Geo::parse_uri("bad-value").is_none());
    }

    #[test]
    fn incomplete_geo_has_no_text_form() {
        assert!(Geo::default().to_legacy().is_none());
        assert!(!Geo::default().is_complete());
    }
}
