use super::fixtures::*;
use crate::rfc::vcard::{
    Address, Geo, Note, Organization, VCard, VCardReader, VCardVersion, VCardWriter,
    WriterOptions, parse_str,
};

fn read_one(input: &str) -> Result<VCard, String> {
    let mut reader = VCardReader::new(input.as_bytes());
    let vcard = reader
        .read_next()
        .map_err(|e| format!("read failed: {e}"))?
        .ok_or_else(|| "no vCard in input".to_string())?;
    if !reader.warnings().is_empty() {
        return Err(format!("read warnings: {:?}", reader.warnings()));
    }
    Ok(vcard)
}

fn write_one(vcard: &VCard, version: VCardVersion) -> Result<String, String> {
    let options = WriterOptions::for_version(version).without_signature();
    let mut writer = VCardWriter::with_options(Vec::new(), options);
    writer
        .write(vcard)
        .map_err(|e| format!("write failed: {e}"))?;
    if !writer.warnings().is_empty() {
        return Err(format!("write warnings: {:?}", writer.warnings()));
    }
    String::from_utf8(writer.into_inner()).map_err(|e| format!("output is not UTF-8: {e}"))
}

/// Parse, write in the same version, parse again and compare.
fn round_trip(input: &str) -> Result<(), String> {
    let first = read_one(input)?;
    let written = write_one(&first, first.version)?;
    let second = read_one(&written)?;

    if first.len() != second.len() {
        return Err(format!(
            "property count mismatch: {} vs {}\n{written}",
            first.len(),
            second.len()
        ));
    }
    for (a, b) in first.properties().iter().zip(second.properties()) {
        if a != b {
            return Err(format!("property mismatch:\n{a:?}\n{b:?}\n{written}"));
        }
    }
    Ok(())
}

#[test]
fn round_trip_v21() {
    round_trip(VCARD_21).expect("round trip should succeed");
}

#[test]
fn round_trip_v30() {
    round_trip(VCARD_30).expect("round trip should succeed");
}

#[test]
fn round_trip_v40() {
    round_trip(VCARD_40).expect("round trip should succeed");
}

#[test]
fn round_trip_agent_block() {
    round_trip(AGENT_BLOCK_21).expect("round trip should succeed");
}

#[test]
fn round_trip_agent_inline() {
    round_trip(AGENT_INLINE_30).expect("round trip should succeed");
}

#[test]
fn round_trip_long_line() {
    let note = "word ".repeat(60);
    let input = format!(
        "BEGIN:VCARD\r\nVERSION:4.0\r\nFN:Long\r\nNOTE:{}\r\nEND:VCARD\r\n",
        note.trim_end()
    );
    round_trip(&input).expect("round trip should succeed");

    let vcard = read_one(&input).unwrap();
    let written = write_one(&vcard, VCardVersion::V4_0).unwrap();
    assert!(written.lines().all(|line| line.len() <= 75), "{written}");
}

#[test]
fn round_trip_escaped_characters() {
    let input = "BEGIN:VCARD\r\nVERSION:3.0\r\nN:;;;;\r\nFN:Esc\r\n\
                 NOTE:semi\\; comma\\, slash\\\\ newline\\n end\r\nEND:VCARD\r\n";
    round_trip(input).expect("round trip should succeed");

    let vcard = read_one(input).unwrap();
    assert_eq!(
        vcard.first::<Note>().unwrap().as_str(),
        "semi; comma, slash\\ newline\n end"
    );
}

#[test]
fn legacy_label_merges_into_address() {
    let vcard = read_one(VCARD_30).unwrap();
    assert!(vcard.by_name("LABEL").next().is_none());
    let address = vcard.first::<Address>().unwrap();
    assert_eq!(address.label.as_deref(), Some("1 Main St\nSpringfield"));

    let written = write_one(&vcard, VCardVersion::V4_0).unwrap();
    assert!(written.contains(";LABEL=1 Main St^nSpringfield:"), "{written}");
}

#[test]
fn quoted_printable_values_are_decoded() {
    let vcard = read_one(VCARD_21).unwrap();
    assert_eq!(vcard.first::<Note>().unwrap().as_str(), "Café au lait");
    assert_eq!(
        vcard.first::<Address>().unwrap().label.as_deref(),
        Some("1 Main St\nSpringfield")
    );
    let note = vcard.by_name("NOTE").next().unwrap();
    assert!(note.parameters.encoding().is_none());
    assert!(note.parameters.charset().is_none());
}

#[test]
fn version_conversion_keeps_values() {
    let v3 = read_one(VCARD_30).unwrap();
    let v4 = read_one(&write_one(&v3, VCardVersion::V4_0).unwrap()).unwrap();

    assert_eq!(v4.version, VCardVersion::V4_0);
    assert_eq!(v4.first::<Geo>(), v3.first::<Geo>());
    assert_eq!(v4.first::<Organization>(), v3.first::<Organization>());
    assert_eq!(v4.first::<Address>(), v3.first::<Address>());
    assert_eq!(v4.formatted_name(), Some("John Doe"));
}

#[test]
fn multiple_documents_in_one_stream() {
    let vcards = parse_str(TWO_CARDS).unwrap();
    assert_eq!(vcards.len(), 2);
    assert_eq!(vcards[0].version, VCardVersion::V3_0);
    assert_eq!(vcards[0].formatted_name(), Some("One"));
    assert_eq!(vcards[1].version, VCardVersion::V4_0);
    assert_eq!(vcards[1].formatted_name(), Some("Two"));
}
