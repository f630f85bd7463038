//! Integration tests for Settings loading from a config file.
//!
//! These tests pass an explicit file and an empty environment to
//! `Settings::load_with_env`, so neither the global config nor `PM_*` variables of
//! the test process are involved.

use std::fs;
use std::path::PathBuf;

use config::Map;
use tempfile::TempDir;

use pm::application::ApplicationError;
use pm::config::{DelegationMode, Settings};
use pm::util::testing;

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    testing::init_test_setup();
    let path = dir.path().join("pm.toml");
    fs::write(&path, content).expect("write config");
    path
}

#[test]
fn given_missing_config_file_when_load_then_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let absent = dir.path().join("absent.toml");

    let settings = Settings::load_with_env(Some(absent.as_path()), Map::new()).expect("load");

    assert_eq!(settings, Settings::default());
}

#[test]
fn given_no_config_file_when_load_then_uses_defaults() {
    let settings = Settings::load_with_env(None, Map::new()).expect("load");
    assert_eq!(settings, Settings::default());
}

#[test]
fn given_full_config_file_when_load_then_all_fields_applied() {
    // Arrange
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
prefix = "things"
search_paths = ["/opt/things/libexec", "/usr/lib/things"]
mode = "spawn"
"#,
    );

    // Act
    let settings = Settings::load_with_env(Some(path.as_path()), Map::new()).expect("load settings");

    // Assert
    assert_eq!(settings.prefix.as_deref(), Some("things"));
    assert_eq!(
        settings.search_paths,
        vec![
            PathBuf::from("/opt/things/libexec"),
            PathBuf::from("/usr/lib/things")
        ]
    );
    assert_eq!(settings.mode, DelegationMode::Spawn);
}

#[test]
fn given_partial_config_file_when_load_then_keeps_defaults_for_rest() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "prefix = \"tool\"\n");

    let settings = Settings::load_with_env(Some(path.as_path()), Map::new()).expect("load settings");

    assert_eq!(settings.prefix.as_deref(), Some("tool"));
    assert!(settings.search_paths.is_empty());
    assert_eq!(settings.mode, DelegationMode::default());
}

#[test]
fn given_env_var_in_search_path_when_load_then_expands_it() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "search_paths = [\"$HOME/libexec\"]\n");

    let settings = Settings::load_with_env(Some(path.as_path()), Map::new()).expect("load settings");

    let home = std::env::var("HOME").expect("HOME should be set");
    assert_eq!(
        settings.search_paths,
        vec![PathBuf::from(format!("{home}/libexec"))]
    );
}

#[test]
fn given_malformed_config_file_when_load_then_config_error_names_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "prefix = = \"broken\"\n");

    let err = Settings::load_with_env(Some(path.as_path()), Map::new()).unwrap_err();

    match err {
        ApplicationError::Config { message } => {
            assert!(message.contains("pm.toml"), "message: {message}")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn given_unknown_key_when_load_then_rejects_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "prefx = \"typo\"\n");

    assert!(Settings::load_with_env(Some(path.as_path()), Map::new()).is_err());
}

#[test]
fn given_invalid_mode_when_load_then_rejects_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "mode = \"fork\"\n");

    assert!(Settings::load_with_env(Some(path.as_path()), Map::new()).is_err());
}

#[test]
fn given_file_and_env_vars_when_load_then_env_wins() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "prefix = \"file\"\nmode = \"exec\"\n");
    let env: Map<String, String> = [("PM_MODE".to_string(), "SPAWN".to_string())]
        .into_iter()
        .collect();

    let settings = Settings::load_with_env(Some(path.as_path()), env).expect("load settings");

    assert_eq!(settings.prefix.as_deref(), Some("file"));
    assert_eq!(settings.mode, DelegationMode::Spawn);
}
