//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for dicom-deid using clap.
//!
//! # Exit codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success |
//! | 1 | `check`: the input is not de-identified |
//! | 2 | Configuration error |
//! | 3 | Batch finished with failed files |
//! | 5 | Fatal error |

pub mod commands;

use crate::config::{load_config, DeidConfig};
use crate::domain::Result;
use clap::{Parser, Subcommand};
use std::path::Path;

/// Exit code of a successful command
pub const EXIT_OK: i32 = 0;
/// Exit code of `check` when the input still needs de-identification
pub const EXIT_NOT_DEIDENTIFIED: i32 = 1;
/// Exit code for configuration errors
pub const EXIT_CONFIG: i32 = 2;
/// Exit code when some files of a batch failed
pub const EXIT_PARTIAL: i32 = 3;
/// Exit code for fatal errors
pub const EXIT_FATAL: i32 = 5;

/// dicom-deid - DICOM de-identification tool
#[derive(Parser, Debug)]
#[command(name = "dicom-deid")]
#[command(version, about, long_about = None)]
#[command(author = "dicom-deid Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "deid.toml", env = "DEID_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "DEID_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// De-identify a file or a directory
    Run(commands::run::RunArgs),

    /// Check whether a file or directory is already de-identified
    Check(commands::check::CheckArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Compare the tags of two files
    Diff(commands::diff::DiffArgs),

    /// Print the header of a file
    Dump(commands::dump::DumpArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

/// Loads `config_path`, falling back to defaults when the file does not exist
///
/// A file that exists but does not parse or validate is still an error.
pub fn load_config_or_default(config_path: &str) -> Result<DeidConfig> {
    if Path::new(config_path).exists() {
        load_config(config_path)
    } else {
        tracing::debug!(config_path = %config_path, "Configuration file not found, using defaults");
        Ok(DeidConfig::default())
    }
}
