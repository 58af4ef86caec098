use super::*;
use serde_json::json;

fn map(v: Value) -> Map<String, Value> {
    match v { Value::Object(m) => m, _ => panic!("expected object") }
}

#[test]
fn merge_nested_and_equal_leaves() {
    let mut a = map(json!({"cosmology": {"h": 0.7}, "units": false}));
    let b = map(json!({"cosmology": {"omega0": 0.3}, "units": false, "extra": 1}));
    merge_recursively(&mut a, b, &mut Vec::new()).unwrap();
    assert_eq!(Value::Object(a), json!({"cosmology": {"h": 0.7, "omega0": 0.3}, "units": false, "extra": 1}));
}

#[test]
fn merge_conflict_names_path() {
    let mut a = map(json!({"cosmology": {"h": 0.7}}));
    let b = map(json!({"cosmology": {"h": 0.6774}}));
    let err = merge_recursively(&mut a, b, &mut Vec::new()).unwrap_err();
    assert_eq!(err, FieldError::config("Conflict at cosmology.h"));
}

#[test]
fn parse_yaml_shapes() {
    let s = parse_yaml("units: true\ncosmology:\n  h: 0.7\n", "inline").unwrap();
    assert_eq!(s.get("units"), Some(&json!(true)));
    assert_eq!(s.get_path("cosmology.h"), Some(&json!(0.7)));
    assert!(s.get_path("cosmology.missing").is_none());
    assert!(parse_yaml("", "empty").unwrap().is_empty());
    assert!(parse_yaml("# only a comment\n", "comment").unwrap().is_empty());
    assert_eq!(parse_yaml("- 1\n- 2\n", "list").unwrap_err().code_str(), "config");
}

#[test]
fn load_absolute_file() {
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("fields.yaml");
    std::fs::write(&p, "little_h: 0.7\n").unwrap();
    let s = load_file(p.to_str().unwrap()).unwrap();
    assert_eq!(s.get("little_h"), Some(&json!(0.7)));
}

#[test]
fn load_missing_absolute_file_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("nope.yaml");
    assert_eq!(load_file(p.to_str().unwrap()).unwrap_err().code_str(), "config");
}

#[test]
fn empty_resource_name_rejected() {
    assert_eq!(load_file("").unwrap_err(), FieldError::config("Config name cannot be empty."));
}

#[test]
fn bundled_default_resource() {
    let s = load_file("default.yaml").unwrap();
    assert_eq!(s.get("units"), Some(&json!(false)));
    assert!(s.get("little_h").is_some());
    assert!(load_file("does-not-exist.yaml").is_err());
}

#[test]
fn load_files_merges_in_order() {
    let tmp = tempfile::tempdir().unwrap();
    let a = tmp.path().join("a.yaml");
    let b = tmp.path().join("b.yaml");
    std::fs::write(&a, "group: {x: 1}\n").unwrap();
    std::fs::write(&b, "group: {y: 2}\n").unwrap();
    let s = load_files(&[a.to_str().unwrap(), b.to_str().unwrap()]).unwrap();
    assert_eq!(s.get("group"), Some(&json!({"x": 1, "y": 2})));

    std::fs::write(&b, "group: {x: 3}\n").unwrap();
    let err = load_files(&[a.to_str().unwrap(), b.to_str().unwrap()]).unwrap_err();
    assert_eq!(err.message(), "Conflict at group.x");
}

#[test]
fn env_prefix_stripped_and_lowercased() {
    let vars = vec![
        ("FIELDSTORE_LITTLE_H".to_string(), "0.7".to_string()),
        ("FIELDSTORE_CONFIG_PATH".to_string(), "/tmp/x.yaml".to_string()),
        ("PATH".to_string(), "/usr/bin".to_string()),
    ];
    let (path, over) = env_overrides(vars);
    assert_eq!(path.as_deref(), Some("/tmp/x.yaml"));
    assert_eq!(over.len(), 1);
    assert_eq!(over.get("little_h"), Some(&json!("0.7")));
}

#[test]
fn resolve_overlays_env_on_file() {
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("main.yaml");
    std::fs::write(&p, "units: false\nlittle_h: 0.6774\n").unwrap();
    let vars = vec![
        (ENV_CONFIG_PATH.to_string(), p.to_str().unwrap().to_string()),
        ("FIELDSTORE_UNITS".to_string(), "true".to_string()),
    ];
    let s = resolve(vars).unwrap();
    assert_eq!(s.get("units"), Some(&json!("true")));
    assert_eq!(s.get("little_h"), Some(&json!(0.6774)));
    let defaults = s.recipe_defaults();
    assert_eq!(defaults.get("little_h"), Some(&json!(0.6774)));
}
