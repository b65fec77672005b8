#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Folding, escaping and producer quirks of the line format.

use kunai_rfc::rfc::vcard::build::{FoldingScheme, escape_text};
use kunai_rfc::rfc::vcard::parse::{unescape_text, unfold};
use kunai_rfc::rfc::vcard::{
    CompatibilityMode, FormattedName, Note, ReaderOptions, StructuredName, VCard, VCardReader,
    VCardVersion, VCardWriter, WriterOptions,
};

const SAMPLES: &[&str] = &[
    "",
    "short",
    "NOTE:a line that is comfortably longer than seventy-five characters so it must fold",
    "NOTE:ünïcödé characters on every fold boundary ééééééééééééééééééééééééééééééééééé",
    "NOTE:日本語のテキストは三バイトの文字で構成されているので折り返し位置に注意が必要です。日本語のテキスト",
    "X:                                                                                           ",
];

#[test]
fn unfold_reverses_fold() {
    for scheme in [
        FoldingScheme::default(),
        FoldingScheme {
            line_length: 20,
            indent: '\t',
        },
        FoldingScheme {
            line_length: 5,
            indent: ' ',
        },
    ] {
        for sample in SAMPLES {
            let folded = scheme.fold(sample, "\r\n");
            for physical in folded.split("\r\n") {
                assert!(physical.len() <= scheme.line_length.max(5), "{physical:?}");
            }
            assert_eq!(unfold(&folded), *sample, "{scheme:?}");
        }
    }
}

#[test]
fn unescape_reverses_escape() {
    let values = [
        "plain",
        "a,b;c\\d",
        "line one\nline two",
        "\\n is not a newline",
        "trailing backslash \\",
        ";;,,\\\\\n\n",
    ];
    for value in values {
        assert_eq!(unescape_text(&escape_text(value)), value);
    }
}

fn write(vcard: &VCard, options: WriterOptions) -> String {
    let mut writer = VCardWriter::with_options(Vec::new(), options);
    writer.write(vcard).unwrap();
    String::from_utf8(writer.into_inner()).unwrap()
}

#[test_log::test]
fn outlook_mode_round_trips_through_quoted_printable() {
    let vcard = VCard::new(VCardVersion::V2_1)
        .with(StructuredName::simple("Müller", "Jörg"))
        .with(FormattedName::new("Jörg Müller"))
        .with(Note::new(format!("first line\n{}", "ä".repeat(40))));

    let options = WriterOptions {
        compatibility_mode: CompatibilityMode::MsOutlook,
        ..WriterOptions::for_version(VCardVersion::V2_1).without_signature()
    };
    let text = write(&vcard, options);
    assert!(text.contains("NOTE;ENCODING=QUOTED-PRINTABLE;CHARSET=UTF-8:first line=0D=0A"));
    assert!(text.contains("=\r\n"), "soft line breaks expected:\n{text}");
    assert!(!text.contains('ä'));

    let mut reader = VCardReader::new(text.as_bytes());
    let parsed = reader.read_next().unwrap().unwrap();
    assert!(reader.warnings().is_empty(), "{:?}", reader.warnings());
    assert_eq!(parsed, vcard);
}

#[test]
fn rfc_mode_escapes_instead() {
    let vcard = VCard::new(VCardVersion::V2_1)
        .with(StructuredName::simple("Doe", "Jo"))
        .with(Note::new("first\nsecond"));
    let text = write(
        &vcard,
        WriterOptions::for_version(VCardVersion::V2_1).without_signature(),
    );
    assert!(text.contains("\r\nNOTE:first\\nsecond\r\n"), "{text}");
}

#[test]
fn windows_charset_is_decoded() {
    let text = "BEGIN:VCARD\r\nVERSION:2.1\r\nN:Doe;Jo\r\n\
                NOTE;ENCODING=QUOTED-PRINTABLE;CHARSET=windows-1252:Caf=E9 =80 =93x=94\r\nEND:VCARD\r\n";
    let mut reader = VCardReader::new(text.as_bytes());
    let parsed = reader.read_next().unwrap().unwrap();
    assert!(reader.warnings().is_empty(), "{:?}", reader.warnings());
    assert_eq!(parsed.first::<Note>().unwrap().as_str(), "Café € \u{201C}x\u{201D}");
}

#[test]
fn mac_address_book_keeps_commas_in_names() {
    let text = "BEGIN:VCARD\r\nVERSION:3.0\r\nN:Doe;John,Jr.;;;\r\nFN:John Doe\r\nEND:VCARD\r\n";

    let mut reader = VCardReader::new(text.as_bytes());
    let rfc = reader.read_next().unwrap().unwrap();
    assert_eq!(rfc.first::<StructuredName>().unwrap().given, ["John", "Jr."]);

    let options = ReaderOptions {
        compatibility_mode: CompatibilityMode::MacAddressBook,
        ..ReaderOptions::default()
    };
    let mut reader = VCardReader::with_options(text.as_bytes(), options);
    let mac = reader.read_next().unwrap().unwrap();
    assert_eq!(mac.first::<StructuredName>().unwrap().given, ["John,Jr."]);
}
