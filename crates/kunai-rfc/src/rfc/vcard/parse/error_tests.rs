use super::error::{ParseError, ParseErrorKind};

#[test]
fn display_includes_line_and_kind() {
    let err = ParseError::invalid_name(4, "B@D");
    assert_eq!(
        err.to_string(),
        r#"line 4: invalid property name: "B@D""#
    );
}

#[test]
fn invalid_utf8_is_encoding_error() {
    let utf8 = String::from_utf8(vec![0xff]).unwrap_err();
    let err = ParseError::invalid_utf8(9, &utf8);
    assert_eq!(err.kind, ParseErrorKind::EncodingError);
    assert_eq!(err.line, 9);
}

#[test]
fn kinds_display() {
    assert_eq!(
        ParseErrorKind::MissingSeparator.to_string(),
        "missing separator"
    );
    assert_eq!(
        ParseErrorKind::InvalidParameter.to_string(),
        "invalid parameter"
    );
}
