//! Binary-or-URL payloads (PHOTO) and data URIs.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::KnownProperty;

/// A `data:<media type>;base64,<data>` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub media_type: String,
    pub data: Vec<u8>,
}

impl DataUri {
    #[must_use]
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            data,
        }
    }

    /// Parses a base64 data URI. Returns `None` for anything else.
    #[must_use]
    pub fn parse(uri: &str) -> Option<Self> {
        let rest = uri.trim();
        let scheme = rest.get(..5)?;
        if !scheme.eq_ignore_ascii_case("data:") {
            return None;
        }
        let (header, payload) = rest[5..].split_once(',')?;
        let end = header.len().checked_sub(";base64".len())?;
        let media_type = header
            .get(end..)
            .filter(|suffix| suffix.eq_ignore_ascii_case(";base64"))
            .and_then(|_| header.get(..end))?;
        let data = STANDARD.decode(payload.trim()).ok()?;
        Some(Self::new(media_type, data))
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "data:{};base64,{}",
            self.media_type,
            STANDARD.encode(&self.data)
        )
    }
}

/// Where the binary content of a property lives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BinaryContent {
    #[default]
    Empty,
    Url(String),
    Data(Vec<u8>),
}

/// A photograph or image (PHOTO).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Photo {
    pub content: BinaryContent,
    /// Media type such as `image/jpeg`.
    pub media_type: Option<String>,
}

impl Photo {
    #[must_use]
    pub fn from_url(url: impl Into<String>, media_type: Option<&str>) -> Self {
        Self {
            content: BinaryContent::Url(url.into()),
            media_type: media_type.map(str::to_ascii_lowercase),
        }
    }

    #[must_use]
    pub fn from_data(data: Vec<u8>, media_type: impl Into<String>) -> Self {
        Self {
            content: BinaryContent::Data(data),
            media_type: Some(media_type.into().to_ascii_lowercase()),
        }
    }

    /// Legacy `TYPE` token for the media type (`image/jpeg` -> `jpeg`).
    #[must_use]
    pub fn type_token(&self) -> Option<&str> {
        let media_type = self.media_type.as_deref()?;
        Some(media_type.split_once('/').map_or(media_type, |(_, sub)| sub))
    }
}

impl KnownProperty for Photo {
    const NAME: &'static str = "PHOTO";
}

/// Builds a media type from a legacy `TYPE` token (`JPEG` -> `image/jpeg`).
#[must_use]
pub fn image_media_type(token: &str) -> String {
    let token = token.to_ascii_lowercase();
    if token.contains('/') {
        token
    } else {
        format!("image/{token}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_round_trip() {
        let uri = DataUri::new("image/png", vec![0x89, 0x50, 0x4e, 0x47]);
        let text = uri.to_string();
        assert_eq!(text, "data:image/png;base64,iVBORw==");
        assert_eq!(DataUri::parse(&text), Some(uri));
    }

    #[test]
    fn data_uri_rejects_other_uris() {
        assert!(DataUri::parse("http://example.com/a.png").is_none());
        assert!(DataUri::parse("data:image/png,plain").is_none());
    }

    #[test]
    fn type_token() {
        let photo = Photo::from_data(vec![1, 2, 3], "image/JPEG");
        assert_eq!(photo.type_token(), Some("jpeg"));
        assert_eq!(image_media_type("GIF"), "image/gif");
    }
}
