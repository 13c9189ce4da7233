//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables should be run with --test-threads=1
//! to avoid interference between tests.

use dicom_deid::config::load_config;
use dicom_deid::deidentification::{load_policy, DeidEngine};
use dicom_deid::domain::{ConfigError, DeidError, Tag};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    std::env::remove_var("DEID_APPLICATION_LOG_LEVEL");
    std::env::remove_var("DEID_APPLICATION_ANONYMOUS");
    std::env::remove_var("DEID_DEIDENTIFICATION_PROFILE");
    std::env::remove_var("DEID_DEIDENTIFICATION_KEEP_TAGS");
    std::env::remove_var("DEID_DEIDENTIFICATION_WORKERS");
    std::env::remove_var("DEID_AUDIT_ENABLED");
    std::env::remove_var("TEST_DEID_SUBJECT_ID");
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    let toml_content = r#"
[application]
log_level = "debug"
anonymous = true

[deidentification]
profile = "data_sharing"
profiles_dir = "profiles"
imaging_only = true
fail_fast = true
workers = 8

[deidentification.forced_values]
"(0010,0020)" = "sub-001"

[audit]
enabled = true
log_path = "/tmp/dicom-deid/audit.tsv"

[logging]
local_enabled = true
local_path = "/tmp/dicom-deid"
local_rotation = "hourly"
"#;

    let temp_file = write_config(toml_content);
    let config = load_config(temp_file.path()).unwrap();

    assert_eq!(config.application.log_level, "debug");
    assert!(config.application.anonymous);
    assert_eq!(
        config.deidentification.profile.as_deref(),
        Some("data_sharing")
    );
    assert!(config.deidentification.imaging_only);
    assert!(config.deidentification.fail_fast);
    assert_eq!(config.deidentification.workers, 8);
    assert_eq!(
        config.deidentification.forced_values.get("(0010,0020)"),
        Some(&"sub-001".to_string())
    );
    assert!(config.audit.enabled);
    assert_eq!(
        config.audit.log_path,
        PathBuf::from("/tmp/dicom-deid/audit.tsv")
    );
    assert!(config.logging.local_enabled);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_load_minimal_config_uses_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    let temp_file = write_config("[deidentification]\n");

    let config = load_config(temp_file.path()).unwrap();

    assert_eq!(config.application.log_level, "info");
    assert!(config.deidentification.profile.is_none());
    assert_eq!(config.deidentification.workers, 4);
    assert!(!config.audit.enabled);
    assert!(!config.logging.local_enabled);
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_DEID_SUBJECT_ID", "sub-042");

    let toml_content = r#"
# Subject: ${NOT_SUBSTITUTED_IN_COMMENTS}
[deidentification.forced_values]
"(0010,0010)" = "${TEST_DEID_SUBJECT_ID}"
"#;
    let temp_file = write_config(toml_content);
    let config = load_config(temp_file.path()).unwrap();

    assert_eq!(
        config.deidentification.forced_values.get("(0010,0010)"),
        Some(&"sub-042".to_string())
    );
    cleanup_env_vars();
}

#[test]
fn test_missing_env_var_is_reported() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let toml_content = r#"
[deidentification.forced_values]
"(0010,0010)" = "${TEST_DEID_SUBJECT_ID}"
"#;
    let temp_file = write_config(toml_content);
    let err = load_config(temp_file.path()).unwrap_err();

    assert!(err.to_string().contains("TEST_DEID_SUBJECT_ID"));
}

#[test]
fn test_env_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("DEID_APPLICATION_LOG_LEVEL", "warn");
    std::env::set_var("DEID_DEIDENTIFICATION_WORKERS", "2");
    std::env::set_var("DEID_AUDIT_ENABLED", "true");
    std::env::set_var(
        "DEID_DEIDENTIFICATION_KEEP_TAGS",
        "(0008,0032); (0010,0040)",
    );

    let temp_file = write_config("[application]\nlog_level = \"info\"\n");
    let config = load_config(temp_file.path()).unwrap();

    assert_eq!(config.application.log_level, "warn");
    assert_eq!(config.deidentification.workers, 2);
    assert!(config.audit.enabled);
    assert_eq!(
        config.deidentification.keep_tags,
        vec!["(0008,0032)".to_string(), "(0010,0040)".to_string()]
    );

    let policy = load_policy(&config.deidentification).unwrap();
    assert!(policy.profile.get(Tag::new(0x0010, 0x0040)).is_some());
    cleanup_env_vars();
}

#[test]
fn test_invalid_override_fails_validation() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("DEID_APPLICATION_LOG_LEVEL", "verbose");

    let temp_file = write_config("[application]\n");
    let err = load_config(temp_file.path()).unwrap_err();

    assert!(err.to_string().contains("Invalid log_level 'verbose'"));
    cleanup_env_vars();
}

#[test]
fn test_profile_and_lists_conflict() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let toml_content = r#"
[deidentification]
profile = "data_sharing"
keep_tags = ["(0008,0032)"]
"#;
    let temp_file = write_config(toml_content);
    let err = load_config(temp_file.path()).unwrap_err();

    assert!(err.to_string().contains("cannot be combined"));
}

#[test]
fn test_invalid_workers() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config("[deidentification]\nworkers = 0\n");
    let err = load_config(temp_file.path()).unwrap_err();

    assert!(err.to_string().contains("workers must be > 0"));
}

#[test]
fn test_invalid_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config("[deidentification\nworkers = 4\n");
    let err = load_config(temp_file.path()).unwrap_err();

    assert!(err.to_string().contains("Failed to parse TOML"));
}

#[test]
fn test_missing_config_file() {
    let err = load_config("/nonexistent/deid.toml").unwrap_err();
    assert!(err.to_string().contains("Configuration file not found"));
}

#[test]
fn test_malformed_keep_tag_is_rejected_by_engine() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config("[deidentification]\nkeep_tags = [\"(0008,00ZZ)\"]\n");
    let config = load_config(temp_file.path()).unwrap();
    let err = DeidEngine::new(&config).err().unwrap();

    assert!(matches!(
        err,
        DeidError::Config(ConfigError::MalformedTag { .. })
    ));
}

#[test]
fn test_unknown_profile_is_rejected_by_engine() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let temp_file = write_config("[deidentification]\nprofile = \"no_such_profile\"\n");
    let config = load_config(temp_file.path()).unwrap();
    let err = DeidEngine::new(&config).err().unwrap();

    assert!(matches!(
        err,
        DeidError::Config(ConfigError::ProfileNotFound { .. })
    ));
}
