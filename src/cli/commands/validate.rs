//! Validate config command implementation
//!
//! This module implements the `validate-config` command, which loads the
//! configuration file and every table it refers to.

use crate::cli::{EXIT_CONFIG, EXIT_OK};
use crate::config::load_config;
use crate::deidentification::load_policy;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration file loaded successfully");
                c
            }
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        // Tables and profiles are only read when the policy is built
        let policy = match load_policy(&config.deidentification) {
            Ok(policy) => policy,
            Err(e) => {
                println!("❌ De-identification policy could not be loaded");
                println!("   Error: {e}");
                println!();
                return Ok(EXIT_CONFIG);
            }
        };

        let deid = &config.deidentification;
        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  Anonymous Mode: {}", config.application.anonymous);
        println!("  Profile: {}", policy.profile_name());
        println!(
            "  Standard Table: {}",
            deid.standard_table
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "embedded".to_string())
        );
        println!("  Standard Rules: {}", policy.table.len());
        println!("  Safe-Private Rules: {}", policy.safe_private.len());
        println!("  Profile Rules: {}", policy.profile.len());
        println!("  Forced Values: {}", policy.forced.len());
        println!("  Imaging Only: {}", deid.imaging_only);
        println!("  Workers: {}", deid.workers);
        println!(
            "  Audit Log: {}",
            if config.audit.enabled {
                config.audit.log_path.display().to_string()
            } else {
                "disabled".to_string()
            }
        );
        println!();
        Ok(EXIT_OK)
    }
}
