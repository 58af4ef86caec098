use super::*;

#[test]
fn code_mapping() {
    assert_eq!(FieldError::not_found("x").code_str(), "key_not_found");
    assert_eq!(FieldError::invalid_recipe("no source").code_str(), "invalid_recipe");
    assert_eq!(FieldError::merge_type("not a container").code_str(), "merge_type");
    assert_eq!(FieldError::type_mismatch("container").code_str(), "type_mismatch");
    assert_eq!(FieldError::dimension("ndim").code_str(), "dimension");
    assert_eq!(FieldError::derived_forbidden("x").code_str(), "derived_forbidden");
    assert_eq!(FieldError::recursive_derivation("x").code_str(), "recursive_derivation");
    assert_eq!(FieldError::config("conflict").code_str(), "config");
    assert_eq!(FieldError::generator("boom").code_str(), "generator");
}

#[test]
fn display_includes_code_and_key() {
    let e = FieldError::not_found("Coordinates");
    assert_eq!(e.to_string(), "key_not_found: unknown field 'Coordinates'");
    assert_eq!(e.message(), "unknown field 'Coordinates'");
    assert!(e.is_not_found());
    assert!(!FieldError::dimension("x").is_not_found());
}

#[test]
fn anyhow_maps_to_generator() {
    let e: FieldError = anyhow::anyhow!("negative mass").into();
    assert_eq!(e, FieldError::generator("negative mass"));
}

#[test]
fn serializes_tagged() {
    let j = serde_json::to_value(FieldError::derived_forbidden("vmag")).unwrap();
    assert_eq!(j["type"], "derived_forbidden");
    assert_eq!(j["key"], "vmag");
}
