//! Configuration loading tests for the daemon.
//!
//! Covers loading with and without `--config`, environment overrides, and
//! validation failures.

use std::io::Write;

use floodmail_daemon::daemon::load_config;
use serial_test::serial;
use tempfile::NamedTempFile;

const CONFIG: &str = r#"
[general]
log_level = "debug"
log_format = "pretty"

[notifier]
to = "ops@example.com"
subject = "[billing] errors"
buffer_size = 128
flood_frequency = 10
flood_window_ms = 30000
filter_config = "/etc/floodmail/filter-config.yml"
"#;

#[tokio::test]
#[serial]
async fn test_load_config_from_file() {
    // Given: A config file on disk
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(CONFIG.as_bytes()).unwrap();

    // When: Loading it
    let config = load_config(Some(file.path())).await.expect("config should load");

    // Then: File values are used
    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.notifier.subject, "[billing] errors");
    assert_eq!(config.notifier.buffer_size, 128);
    assert_eq!(config.notifier.flood_frequency, 10);
}

#[tokio::test]
#[serial]
async fn test_load_config_without_path_uses_defaults() {
    // When: No config path is given
    let config = load_config(None).await.expect("defaults should be valid");

    // Then: Built-in defaults apply
    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.notifier.flood_frequency, 5);
    assert_eq!(config.notifier.flood_window_ms, 60_000);
    assert!(!config.metrics.enabled);
}

#[tokio::test]
#[serial]
async fn test_load_config_without_path_applies_env() {
    // Given: Environment overrides
    // SAFETY: serialized by #[serial]; no other thread reads the environment.
    unsafe {
        std::env::set_var("FLOODMAIL_NOTIFIER_TO", "env@example.com");
        std::env::set_var("FLOODMAIL_NOTIFIER_BUFFER_SIZE", "64");
    }

    let config = load_config(None).await;

    unsafe {
        std::env::remove_var("FLOODMAIL_NOTIFIER_TO");
        std::env::remove_var("FLOODMAIL_NOTIFIER_BUFFER_SIZE");
    }

    // Then: Overrides are applied on top of defaults
    let config = config.expect("config should load");
    assert_eq!(config.notifier.to, "env@example.com");
    assert_eq!(config.notifier.buffer_size, 64);
}

#[tokio::test]
#[serial]
async fn test_load_config_missing_file_fails() {
    let result = load_config(Some(std::path::Path::new("/nonexistent/floodmail.toml"))).await;
    let err = result.expect_err("missing file should fail");
    assert!(err.to_string().contains("failed to load config"));
}

#[tokio::test]
#[serial]
async fn test_load_config_rejects_invalid_values() {
    // Given: An unknown evaluator
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"[notifier]\nevaluator = \"by_class_name\"\n")
        .unwrap();

    // When/Then: Loading fails with the field name
    let err = load_config(Some(file.path())).await.unwrap_err();
    assert!(err.to_string().contains("notifier.evaluator"));
}
