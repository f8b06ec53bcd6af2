use std::path::PathBuf;

use co_reader::{load_config, resolve_config_path};
use tempfile::tempdir;

#[test]
fn explicit_config_path_is_used_verbatim() {
    assert_eq!(resolve_config_path(Some("conf/x.yaml")), Some(PathBuf::from("conf/x.yaml")));
}

#[test]
fn load_config_reads_yaml_overrides() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("portal.yaml");
    std::fs::write(&path, "request_id: \"9\"\nretry:\n  max_attempts: 2\n").unwrap();

    let config = load_config(Some(path.to_str().unwrap())).unwrap();

    assert_eq!(config.request_id, "9");
    assert_eq!(config.retry.max_attempts, Some(2));
    assert_eq!(config.retry.pace_ms, 5_000);
}

#[test]
fn load_config_fails_for_missing_explicit_file() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope.json");
    let err = load_config(Some(missing.to_str().unwrap())).unwrap_err();
    assert!(format!("{err:#}").contains("Failed to read config"));
}

#[test]
fn load_config_rejects_malformed_json() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(load_config(Some(path.to_str().unwrap())).is_err());
}
