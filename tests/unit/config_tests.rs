use std::fs;

use sprintboard::config::Config;
use tempfile::TempDir;

#[test]
fn test_explicit_file_overrides_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("board.toml");
    fs::write(
        &path,
        r#"
[server]
cors_permissive = false

[analytics]
min_training_rows = 25

[contract]
reminder_interval_days = 3
"#,
    )
    .unwrap();

    let config = Config::load(Some(&path), dir.path()).unwrap();
    assert!(!config.server.cors_permissive);
    assert_eq!(config.analytics.min_training_rows, 25);
    assert_eq!(config.contract.reminder_interval_days, 3);
    // untouched sections keep their defaults
    assert!(config.agents.fallback_enabled);
    assert!((config.analytics.default_win_rate - 0.23).abs() < f64::EPSILON);
}

#[test]
fn test_project_file_is_read_from_root() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("sprintboard.toml"),
        "[agents]\nfallback_enabled = false\n",
    )
    .unwrap();

    let config = Config::load(None, dir.path()).unwrap();
    assert!(!config.agents.fallback_enabled);
}

#[test]
fn test_malformed_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[analytics\nseed = ").unwrap();

    let err = Config::load(Some(&path), dir.path()).unwrap_err();
    assert!(err.to_string().starts_with("Config error:"), "{err}");
}
