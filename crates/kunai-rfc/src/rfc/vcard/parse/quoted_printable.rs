//! Quoted-printable values (vCard 2.1 `ENCODING=QUOTED-PRINTABLE`).

use std::fmt::Write as _;

/// Character sets understood by the quoted-printable decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    Utf8,
    /// ISO-8859-1.
    Latin1,
    /// Latin-1 with printable characters in 0x80..=0x9F.
    Windows1252,
}

/// Windows-1252 code points for 0x80..=0x9F. Undefined bytes map to the C1
/// control with the same value.
const WINDOWS_1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{81}', '\u{201A}', '\u{192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{2C6}', '\u{2030}', '\u{160}', '\u{2039}', '\u{152}', '\u{8D}', '\u{17D}', '\u{8F}',
    '\u{90}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{2DC}', '\u{2122}', '\u{161}', '\u{203A}', '\u{153}', '\u{9D}', '\u{17E}', '\u{178}',
];

impl Charset {
    /// Resolves a `CHARSET` parameter value.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" | "us-ascii" | "ascii" => Some(Self::Utf8),
            "iso-8859-1" | "latin1" | "iso8859-1" => Some(Self::Latin1),
            "windows-1252" | "cp1252" => Some(Self::Windows1252),
            _ => None,
        }
    }

    /// Converts decoded bytes to text.
    #[must_use]
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
            Self::Windows1252 => bytes
                .iter()
                .map(|&b| match b {
                    0x80..=0x9F => WINDOWS_1252_HIGH[usize::from(b - 0x80)],
                    _ => char::from(b),
                })
                .collect(),
        }
    }
}

/// Decodes quoted-printable text into raw bytes.
///
/// Soft line breaks (`=` before a newline) are removed. Malformed escapes are
/// kept literally.
#[must_use]
pub fn decode_bytes(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while let Some(&byte) = bytes.get(i) {
        if byte != b'=' {
            result.push(byte);
            i += 1;
            continue;
        }

        match (bytes.get(i + 1), bytes.get(i + 2)) {
            (Some(b'\r'), Some(b'\n')) => i += 3,
            (Some(b'\r' | b'\n'), _) => i += 2,
            (Some(&hi), Some(&lo)) => {
                if let (Some(hi), Some(lo)) = (hex_digit(hi), hex_digit(lo)) {
                    result.push((hi << 4) | lo);
                    i += 3;
                } else {
                    result.push(byte);
                    i += 1;
                }
            }
            _ => {
                result.push(byte);
                i += 1;
            }
        }
    }

    result
}

/// Decodes quoted-printable text in the given character set.
#[must_use]
pub fn decode(text: &str, charset: Charset) -> String {
    charset.decode(&decode_bytes(text))
}

/// Encodes UTF-8 text as quoted-printable without soft line breaks.
///
/// Newlines are encoded as `=0D=0A`. Trailing whitespace is encoded so it
/// survives transport.
#[must_use]
pub fn encode(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut result = String::with_capacity(bytes.len());

    for (i, &byte) in bytes.iter().enumerate() {
        let last = i + 1 == bytes.len();
        match byte {
            b'!'..=b'<' | b'>'..=b'~' => result.push(char::from(byte)),
            b' ' | b'\t' if !last => result.push(char::from(byte)),
            _ => {
                let _ = write!(result, "={byte:02X}");
            }
        }
    }

    result
}

/// Returns whether a value needs quoted-printable encoding to be written
/// as a single 2.1 line.
#[must_use]
pub fn needs_encoding(text: &str) -> bool {
    text.bytes().any(|b| !(b == b'\t' || (b' '..=b'~').contains(&b)))
}

fn hex_digit(byte: u8) -> Option<u8> {
    char::from(byte)
        .to_digit(16)
        .and_then(|d| u8::try_from(d).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_utf8() {
        assert_eq!(decode("H=C3=A9llo", Charset::Utf8), "Héllo");
    }

    #[test]
    fn decode_latin1() {
        assert_eq!(decode("H=E9llo", Charset::Latin1), "Héllo");
    }

    #[test]
    fn decode_windows_1252_punctuation() {
        assert_eq!(decode("=80 5 =93ok=94=85", Charset::Windows1252), "\u{20AC} 5 \u{201C}ok\u{201D}\u{2026}");
        assert_eq!(decode("=80", Charset::Latin1), "\u{80}");
        assert_eq!(decode("Caf=E9", Charset::Windows1252), "Caf\u{E9}");
    }

    #[test]
    fn decode_soft_breaks() {
        assert_eq!(decode("one=\r\ntwo=\nthree", Charset::Utf8), "onetwothree");
    }

    #[test]
    fn decode_keeps_malformed_escapes() {
        assert_eq!(decode("a=ZZb=", Charset::Utf8), "a=ZZb=");
        assert_eq!(decode("=3d", Charset::Utf8), "=");
    }

    #[test]
    fn decode_newlines() {
        assert_eq!(decode("line1=0D=0Aline2", Charset::Utf8), "line1\r\nline2");
    }

    #[test]
    fn encode_specials() {
        assert_eq!(encode("a=b"), "a=3Db");
        assert_eq!(encode("Héllo"), "H=C3=A9llo");
        assert_eq!(encode("one\r\ntwo"), "one=0D=0Atwo");
        assert_eq!(encode("trailing "), "trailing=20");
    }

    #[test]
    fn encode_then_decode() {
        let text = "Ünïcödé = ok\r\nsecond line";
        assert_eq!(decode(&encode(text), Charset::Utf8), text);
    }

    #[test]
    fn charset_labels() {
        assert_eq!(Charset::from_label("UTF-8"), Some(Charset::Utf8));
        assert_eq!(Charset::from_label("Windows-1252"), Some(Charset::Windows1252));
        assert!(Charset::from_label("koi8-r").is_none());
        assert_eq!(Charset::from_label("iso-8859-1").unwrap(), Charset::Latin1);
    }

    #[test]
    fn plain_ascii_needs_no_encoding() {
        assert!(!needs_encoding("Plain text, nothing special"));
        assert!(needs_encoding("multi\nline"));
        assert!(needs_encoding("naïve"));
    }
}
