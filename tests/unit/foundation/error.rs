use super::*;

#[test]
fn display_prefixes_name_the_failure_kind() {
    assert_eq!(
        FlipbookError::corrupt_patch("op 0").to_string(),
        "corrupt patch: op 0"
    );
    assert_eq!(
        FlipbookError::validation("bad").to_string(),
        "validation error: bad"
    );
    assert_eq!(
        FlipbookError::markup("eof").to_string(),
        "markup error: eof"
    );
    assert_eq!(
        FlipbookError::serde("x").to_string(),
        "serialization error: x"
    );
}

#[test]
fn unrecognized_element_names_the_element() {
    let msg = FlipbookError::unrecognized("NodeKey(7)").to_string();
    assert!(msg.starts_with("unrecognized element: NodeKey(7)"));
    assert!(msg.contains("not seen during base capture"));
}

#[test]
fn dependency_errors_convert() {
    let json = serde_json::from_str::<u32>("nope").unwrap_err();
    assert!(matches!(FlipbookError::from(json), FlipbookError::Serde(_)));

    let xml = roxmltree::Document::parse("<a>").unwrap_err();
    assert!(matches!(FlipbookError::from(xml), FlipbookError::Markup(_)));

    let other: FlipbookError = anyhow::anyhow!("io broke").into();
    assert_eq!(other.to_string(), "io broke");
}
