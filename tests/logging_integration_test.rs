//! Integration tests for logging functionality

use dicom_deid::config::{load_config, LoggingConfig};
use dicom_deid::deidentification::Disposition;
use dicom_deid::domain::DeidError;
use dicom_deid::logging::init_logging;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(!config.local_enabled);
    assert_eq!(config.local_path, "logs");
    assert_eq!(config.local_rotation, "daily");
}

#[test]
fn test_logging_rotation_types() {
    for rotation in ["daily", "hourly", "never"] {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "[logging]\nlocal_rotation = \"{rotation}\"\n").unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.logging.local_rotation, rotation);
    }
}

#[test]
fn test_size_rotation_is_rejected() {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "[logging]\nlocal_rotation = \"size\"\n").unwrap();
    temp_file.flush().unwrap();

    let err = load_config(temp_file.path()).unwrap_err();
    assert!(err.to_string().contains("Invalid logging.local_rotation 'size'"));
}

// The global subscriber can only be installed once per process, so this is the only
// test in this binary that initializes logging
#[test]
fn test_init_logging_creates_log_directory() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "never".to_string(),
    };
    assert!(!log_path.exists());

    let guard = init_logging("debug", &config).unwrap();
    assert!(log_path.is_dir());

    dicom_deid::log_file_outcome!("scan-001.json", Disposition::Anonymized, 17);
    dicom_deid::log_error_with_context!(
        &DeidError::Other("Invalid table".to_string()),
        "Failed to load policy"
    );
    dicom_deid::log_batch_progress!(3usize, 12usize);

    drop(guard);
    assert!(log_path.join("dicom-deid.log").exists());
}
