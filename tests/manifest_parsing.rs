// tests/manifest_parsing.rs

use fleetrun::workflow::{parse_manifest, ManifestError};

#[test]
fn bare_string_becomes_one_element_list() {
    let manifest = parse_manifest(r#"{"files": "/tmp/out/frame.png"}"#).unwrap();
    assert_eq!(manifest.files, vec!["/tmp/out/frame.png"]);
}

#[test]
fn list_keeps_order_and_drops_empty_paths() {
    let manifest = parse_manifest(r#"{"files": ["/b.png", "", "/a.png"], "extra": 1}"#).unwrap();
    assert_eq!(manifest.files, vec!["/b.png", "/a.png"]);
}

#[test]
fn missing_or_null_files_means_no_artifacts() {
    assert!(parse_manifest("{}").unwrap().files.is_empty());
    assert!(parse_manifest(r#"{"files": null}"#).unwrap().files.is_empty());
}

#[test]
fn top_level_must_be_an_object() {
    match parse_manifest(r#"["/a.png"]"#) {
        Err(ManifestError::NotAnObject(kind)) => assert_eq!(kind, "an array"),
        other => panic!("expected NotAnObject, got {other:?}"),
    }
}

#[test]
fn files_of_the_wrong_type_is_rejected() {
    let err = parse_manifest(r#"{"files": 42}"#).unwrap_err();
    assert!(matches!(err, ManifestError::BadFiles("a number")));
    assert_eq!(
        err.to_string(),
        "`files` must be a path or a list of paths, got a number"
    );
}

#[test]
fn non_string_entry_is_rejected_with_its_index() {
    let err = parse_manifest(r#"{"files": ["/a.png", {"p": 1}]}"#).unwrap_err();
    assert!(matches!(err, ManifestError::BadEntry(1, "an object")));
}

#[test]
fn malformed_json_is_reported() {
    let err = parse_manifest("{not json").unwrap_err();
    assert!(matches!(err, ManifestError::Json(_)));
}
