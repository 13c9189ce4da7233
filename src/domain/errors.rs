//! Domain error types
//!
//! This module defines the error hierarchy for dicom-deid. Configuration problems are
//! kept in their own [`ConfigError`] enum because they are always surfaced to the caller,
//! while per-file problems ([`DeidError::NotADataFile`], [`DeidError::DirectoryDescriptorFile`])
//! are reported per file and may be skipped by a batch.

use std::path::PathBuf;
use thiserror::Error;

/// Main dicom-deid error type
#[derive(Debug, Error)]
pub enum DeidError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The source is not a recognized attribute-tree file
    #[error("This file is not a DICOM file: {path} ({reason})")]
    NotADataFile { path: PathBuf, reason: String },

    /// The source is a directory-listing (DICOMDIR) placeholder
    #[error("This file is a DICOMDIR: {path}")]
    DirectoryDescriptorFile { path: PathBuf },

    /// Element-level failure while walking a tree; the file is abandoned
    #[error("De-identification failed at {path}: {message}")]
    Traversal { path: String, message: String },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Configuration errors
///
/// Always surfaced to the caller, never silently recovered.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A tag specification that does not decompose into two hex components
    #[error("Input tag '{input}' must contain 2 hexadecimal components: {reason}")]
    MalformedTag { input: String, reason: String },

    /// A wildcard tag range that cannot be parsed
    #[error("Invalid tag range '{input}': {reason}")]
    MalformedRange { input: String, reason: String },

    /// An action code outside the K/X/Z/D/U vocabulary
    #[error("Unknown action code '{code}' (expected one of K, X, Z, D, U)")]
    UnknownActionCode { code: String },

    /// Two mutually exclusive configuration sources were supplied
    #[error("Conflicting configuration sources: {0}")]
    ConflictingSources(String),

    /// Named site profile could not be found
    #[error("Profile {name} does not exist.")]
    ProfileNotFound { name: String },

    /// A rule table could not be read
    #[error("Failed to read table {path}: {message}")]
    TableRead { path: String, message: String },

    /// Any other invalid setting
    #[error("{0}")]
    Invalid(String),
}

impl DeidError {
    /// Creates a `NotADataFile` error
    pub fn not_a_data_file(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DeidError::NotADataFile {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for errors that concern a single file and may be skipped by a batch
    pub fn is_per_file(&self) -> bool {
        matches!(
            self,
            DeidError::NotADataFile { .. }
                | DeidError::DirectoryDescriptorFile { .. }
                | DeidError::Traversal { .. }
        )
    }

    /// Returns a copy of this error with every file-identifying detail removed
    ///
    /// Used in anonymous mode so that shared logs never carry input file names.
    pub fn redacted(&self) -> DeidError {
        match self {
            DeidError::NotADataFile { .. } => {
                DeidError::Other("The input is not a DICOM file".to_string())
            }
            DeidError::DirectoryDescriptorFile { .. } => {
                DeidError::Other("The input is a DICOMDIR".to_string())
            }
            DeidError::Traversal { path, .. } => {
                DeidError::Other(format!("De-identification failed at {path}"))
            }
            DeidError::Config(ConfigError::TableRead { .. }) => {
                DeidError::Other("A configuration table could not be read".to_string())
            }
            DeidError::Config(ConfigError::ProfileNotFound { .. }) => {
                DeidError::Other("The requested profile does not exist".to_string())
            }
            DeidError::Config(_) => DeidError::Other("Invalid configuration".to_string()),
            DeidError::Io(_) => DeidError::Other("An I/O error occurred".to_string()),
            DeidError::Serialization(_) => {
                DeidError::Other("A serialization error occurred".to_string())
            }
            DeidError::Other(_) => DeidError::Other("De-identification failed".to_string()),
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for DeidError {
    fn from(err: std::io::Error) -> Self {
        DeidError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for DeidError {
    fn from(err: serde_json::Error) -> Self {
        DeidError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for DeidError {
    fn from(err: toml::de::Error) -> Self {
        DeidError::Config(ConfigError::Invalid(format!("TOML parse error: {err}")))
    }
}

// Conversion from csv errors raised while writing the audit log
impl From<csv::Error> for DeidError {
    fn from(err: csv::Error) -> Self {
        DeidError::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::UnknownActionCode {
            code: "Q".to_string(),
        };
        assert!(err.to_string().contains("'Q'"));

        let err = ConfigError::ProfileNotFound {
            name: "wrong_profile".to_string(),
        };
        assert_eq!(err.to_string(), "Profile wrong_profile does not exist.");
    }

    #[test]
    fn test_config_error_conversion() {
        let err: DeidError = ConfigError::Invalid("bad".to_string()).into();
        assert!(matches!(err, DeidError::Config(_)));
        assert!(!err.is_per_file());
    }

    #[test]
    fn test_redacted_strips_path() {
        let err = DeidError::not_a_data_file("/data/subject_042/scan.json", "invalid JSON");
        assert!(err.to_string().contains("subject_042"));
        assert!(err.is_per_file());

        let redacted = err.redacted();
        assert!(!redacted.to_string().contains("subject_042"));
        assert!(redacted.to_string().contains("not a DICOM file"));
    }

    #[test]
    fn test_dicomdir_redacted() {
        let err = DeidError::DirectoryDescriptorFile {
            path: PathBuf::from("/incoming/DICOMDIR.json"),
        };
        assert!(err.to_string().contains("DICOMDIR.json"));
        assert!(!err.redacted().to_string().contains("incoming"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: DeidError = io_err.into();
        assert!(matches!(err, DeidError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: DeidError = json_err.into();
        assert!(matches!(err, DeidError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: DeidError = toml_err.into();
        assert!(matches!(err, DeidError::Config(ConfigError::Invalid(_))));
        assert!(err.to_string().contains("TOML parse error"));
    }
}
