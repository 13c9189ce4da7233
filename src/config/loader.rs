//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::DeidConfig;
use crate::domain::errors::{ConfigError, DeidError};
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into DeidConfig
/// 4. Applies environment variable overrides (DEID_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`DeidError::Config`] if the file is missing or unreadable, a referenced
/// environment variable is unset, parsing fails or validation fails.
///
/// # Examples
///
/// ```no_run
/// use dicom_deid::config::loader::load_config;
///
/// let config = load_config("deid.toml")?;
/// println!("workers: {}", config.deidentification.workers);
/// # Ok::<(), dicom_deid::domain::DeidError>(())
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<DeidConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(invalid(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        invalid(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: DeidConfig = toml::from_str(&contents)
        .map_err(|e| invalid(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config
        .validate()
        .map_err(|e| invalid(format!("Configuration validation failed: {}", e)))?;

    Ok(config)
}

fn invalid(message: String) -> DeidError {
    DeidError::Config(ConfigError::Invalid(message))
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| DeidError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(invalid(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the DEID_* prefix
///
/// Environment variables follow the pattern `DEID_<SECTION>_<KEY>`, for example
/// `DEID_DEIDENTIFICATION_PROFILE` or `DEID_AUDIT_LOG_PATH`. Tag lists are
/// separated by `;`; unparsable booleans and numbers leave the file value in place.
fn apply_env_overrides(config: &mut DeidConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("DEID_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("DEID_APPLICATION_ANONYMOUS") {
        config.application.anonymous = val.parse().unwrap_or(config.application.anonymous);
    }

    // De-identification overrides
    let deid = &mut config.deidentification;
    if let Ok(val) = std::env::var("DEID_DEIDENTIFICATION_PROFILE") {
        deid.profile = (!val.is_empty()).then_some(val);
    }
    if let Ok(val) = std::env::var("DEID_DEIDENTIFICATION_PROFILES_DIR") {
        deid.profiles_dir = PathBuf::from(val);
    }
    if let Ok(val) = std::env::var("DEID_DEIDENTIFICATION_STANDARD_TABLE") {
        deid.standard_table = Some(PathBuf::from(val));
    }
    if let Ok(val) = std::env::var("DEID_DEIDENTIFICATION_SAFE_PRIVATE_TABLE") {
        deid.safe_private_table = Some(PathBuf::from(val));
    }
    if let Ok(val) = std::env::var("DEID_DEIDENTIFICATION_KEEP_TAGS") {
        deid.keep_tags = split_list(&val);
    }
    if let Ok(val) = std::env::var("DEID_DEIDENTIFICATION_DELETE_TAGS") {
        deid.delete_tags = split_list(&val);
    }
    if let Ok(val) = std::env::var("DEID_DEIDENTIFICATION_IMAGING_ONLY") {
        deid.imaging_only = val.parse().unwrap_or(deid.imaging_only);
    }
    if let Ok(val) = std::env::var("DEID_DEIDENTIFICATION_FAIL_FAST") {
        deid.fail_fast = val.parse().unwrap_or(deid.fail_fast);
    }
    if let Ok(val) = std::env::var("DEID_DEIDENTIFICATION_WORKERS") {
        if let Ok(workers) = val.parse() {
            deid.workers = workers;
        }
    }

    // Audit overrides
    if let Ok(val) = std::env::var("DEID_AUDIT_ENABLED") {
        config.audit.enabled = val.parse().unwrap_or(config.audit.enabled);
    }
    if let Ok(val) = std::env::var("DEID_AUDIT_LOG_PATH") {
        config.audit.log_path = PathBuf::from(val);
    }

    // Logging overrides
    if let Ok(val) = std::env::var("DEID_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(config.logging.local_enabled);
    }
    if let Ok(val) = std::env::var("DEID_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("DEID_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }
}

fn split_list(value: &str) -> Vec<String> {
    // Tags contain commas themselves, so items are separated by ';'
    value
        .split(';')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
