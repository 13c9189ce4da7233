//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use crate::cli::{EXIT_CONFIG, EXIT_FATAL, EXIT_OK};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "deid.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing dicom-deid configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Put site profiles in the profiles directory (<name>.tsv)");
                println!("  3. Validate configuration: dicom-deid validate-config");
                println!("  4. Run: dicom-deid run <input> <output>");
                println!();
                Ok(EXIT_OK)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# dicom-deid Configuration File

[application]
log_level = "info"

[deidentification]
# profile = "data_sharing"
profiles_dir = "profiles"
imaging_only = false
workers = 4

[audit]
enabled = true
log_path = "logs/deid_audit.tsv"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# dicom-deid Configuration File
#
# Every setting has a default; remove what you do not need.
# Values may reference environment variables with ${VAR_NAME}, and any setting can be
# overridden with DEID_<SECTION>_<KEY>, e.g. DEID_DEIDENTIFICATION_WORKERS=8.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# Strip file paths from error messages and logs
anonymous = false

# ============================================================================
# De-identification Policy
# ============================================================================
[deidentification]
# Site profile, read from <profiles_dir>/<profile>.tsv
# Columns: Tag, Name, Action (K, X, Z, D, U), Private Creator
profile = "data_sharing"
profiles_dir = "profiles"

# Override the embedded tables (tab-separated, header row)
# standard_table = "tables/confidentiality_profile.tsv"
# safe_private_table = "tables/safe_private.tsv"

# Shorthand profile; cannot be combined with `profile`
# keep_tags = ["(0008,0032)", "(0008,103E)"]
# delete_tags = ["(0018,1030)"]

# Only write CT, MR, NM, PT and ST images
imaging_only = false

# Abort the batch on the first failing file
fail_fast = false

# Files processed concurrently
workers = 4

# Literal values written over the listed tags
[deidentification.forced_values]
# "(0010,0020)" = "${DEID_SUBJECT_ID}"

# ============================================================================
# Audit Log
# ============================================================================
[audit]
# One tab-separated row per processed file
enabled = true
log_path = "logs/deid_audit.tsv"

# ============================================================================
# Logging
# ============================================================================
[logging]
# JSON log files next to the console output
local_enabled = false
local_path = "logs"
# daily | hourly | never
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeidConfig;

    #[test]
    fn test_init_args_defaults() {
        let args = InitArgs {
            output: "deid.toml".to_string(),
            with_examples: false,
            force: false,
        };

        assert_eq!(args.output, "deid.toml");
        assert!(!args.with_examples);
        assert!(!args.force);
    }

    #[test]
    fn test_generated_configs_parse_and_validate() {
        for content in [
            InitArgs::generate_minimal_config(),
            InitArgs::generate_config_with_examples(),
        ] {
            let config: DeidConfig = toml::from_str(&content).unwrap();
            assert!(config.validate().is_ok());
        }
    }

    #[tokio::test]
    async fn test_existing_file_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("deid.toml");
        fs::write(&output, "# mine").unwrap();

        let args = InitArgs {
            output: output.display().to_string(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), EXIT_CONFIG);
        assert_eq!(fs::read_to_string(&output).unwrap(), "# mine");
    }
}
