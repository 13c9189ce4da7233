//! Check command implementation
//!
//! This module implements the `check` command, which reports whether a file or every
//! data file below a directory is already de-identified.

use crate::cli::{load_config_or_default, EXIT_CONFIG, EXIT_FATAL, EXIT_NOT_DEIDENTIFIED, EXIT_OK};
use crate::deidentification::DeidEngine;
use clap::Args;
use std::path::Path;

/// Arguments for the check command
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Input file or directory
    pub input: String,

    /// Site profile to check against (overrides the configuration file)
    #[arg(short, long)]
    pub profile: Option<String>,
}

impl CheckArgs {
    /// Execute the check command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let mut config = match load_config_or_default(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG);
            }
        };
        if let Some(profile) = &self.profile {
            config.deidentification.profile = Some(profile.clone());
        }

        let engine = match DeidEngine::new(&config) {
            Ok(engine) => engine,
            Err(e) => {
                eprintln!("❌ Failed to load de-identification policy: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        tracing::info!(profile = engine.policy().profile_name(), "Checking de-identification");

        match engine.check_path(Path::new(&self.input)) {
            Ok(true) => {
                println!("✅ Already de-identified");
                Ok(EXIT_OK)
            }
            Ok(false) => {
                println!("❌ Not de-identified");
                Ok(EXIT_NOT_DEIDENTIFIED)
            }
            Err(e) => {
                let e = engine.present_error(e);
                tracing::error!(error = %e, "Check failed");
                eprintln!("Check failed: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }
}
