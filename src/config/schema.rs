//! Configuration schema types
//!
//! This module defines the configuration structure of `deid.toml`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Main dicom-deid configuration
///
/// This is the root configuration structure that maps to the TOML file. Every section
/// is optional; an empty file yields the basic profile with the embedded tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeidConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Policy and batch settings
    #[serde(default)]
    pub deidentification: DeidentificationConfig,

    /// Per-file audit log
    #[serde(default)]
    pub audit: AuditConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DeidConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.deidentification.validate()?;
        self.audit.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Strip file paths from every error message and log line
    #[serde(default)]
    pub anonymous: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            anonymous: false,
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Policy selection and batch behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeidentificationConfig {
    /// Named site profile, looked up as `<profiles_dir>/<profile>.tsv`
    #[serde(default)]
    pub profile: Option<String>,

    /// Directory holding site profiles
    #[serde(default = "default_profiles_dir")]
    pub profiles_dir: PathBuf,

    /// Override for the embedded confidentiality table
    #[serde(default)]
    pub standard_table: Option<PathBuf>,

    /// Override for the embedded safe-private table
    #[serde(default)]
    pub safe_private_table: Option<PathBuf>,

    /// Tags kept regardless of the standard table (shorthand profile)
    #[serde(default)]
    pub keep_tags: Vec<String>,

    /// Tags deleted regardless of the standard table (shorthand profile)
    #[serde(default)]
    pub delete_tags: Vec<String>,

    /// Literal values written over the listed tags, e.g. `"(0010,0010)" = "sub-001"`
    #[serde(default)]
    pub forced_values: HashMap<String, String>,

    /// Only write acquisition images (CT, MR, NM, PT, ST)
    #[serde(default)]
    pub imaging_only: bool,

    /// Abort a batch on the first failing file
    #[serde(default)]
    pub fail_fast: bool,

    /// Number of files processed concurrently
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for DeidentificationConfig {
    fn default() -> Self {
        Self {
            profile: None,
            profiles_dir: default_profiles_dir(),
            standard_table: None,
            safe_private_table: None,
            keep_tags: Vec::new(),
            delete_tags: Vec::new(),
            forced_values: HashMap::new(),
            imaging_only: false,
            fail_fast: false,
            workers: default_workers(),
        }
    }
}

impl DeidentificationConfig {
    /// Whether keep/delete shorthand lists are in use
    pub fn has_tag_lists(&self) -> bool {
        !self.keep_tags.is_empty() || !self.delete_tags.is_empty()
    }

    fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("deidentification.workers must be > 0".to_string());
        }
        if self.workers > 64 {
            return Err("deidentification.workers must be <= 64".to_string());
        }

        if let Some(profile) = &self.profile {
            if profile.trim().is_empty() {
                return Err("deidentification.profile cannot be empty".to_string());
            }
            if self.has_tag_lists() {
                return Err(format!(
                    "deidentification.profile '{profile}' cannot be combined with keep_tags/delete_tags"
                ));
            }
        }
        Ok(())
    }
}

/// Audit log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Append one row per processed file
    #[serde(default)]
    pub enabled: bool,

    /// Audit log file
    #[serde(default = "default_audit_log_path")]
    pub log_path: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_path: default_audit_log_path(),
        }
    }
}

impl AuditConfig {
    fn validate(&self) -> Result<(), String> {
        if self.enabled && self.log_path.as_os_str().is_empty() {
            return Err("audit.log_path cannot be empty when audit is enabled".to_string());
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty".to_string());
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_profiles_dir() -> PathBuf {
    PathBuf::from("profiles")
}

fn default_workers() -> usize {
    4
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("logs/deid_audit.tsv")
}

fn default_local_path() -> String {
    "logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_valid() {
        let config: DeidConfig = toml::from_str("").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.application.log_level, "info");
        assert_eq!(config.deidentification.workers, 4);
        assert!(config.deidentification.profile.is_none());
        assert!(!config.audit.enabled);
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = DeidConfig::default();
        config.application.log_level = "verbose".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.contains("Invalid log_level"));
    }

    #[test]
    fn test_zero_workers() {
        let mut config = DeidConfig::default();
        config.deidentification.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_profile_with_tag_lists_is_rejected() {
        let mut config = DeidConfig::default();
        config.deidentification.profile = Some("data_sharing".to_string());
        config.deidentification.keep_tags = vec!["(0008,0020)".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.contains("cannot be combined"));
    }

    #[test]
    fn test_invalid_rotation() {
        let mut config = DeidConfig::default();
        config.logging.local_rotation = "weekly".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_forced_values_table() {
        let config: DeidConfig = toml::from_str(
            r#"
[deidentification.forced_values]
"(0010,0010)" = "sub-001"
"(0010,0020)" = "sub-001"
"#,
        )
        .unwrap();
        assert_eq!(config.deidentification.forced_values.len(), 2);
        assert_eq!(
            config.deidentification.forced_values["(0010,0010)"],
            "sub-001"
        );
    }
}
