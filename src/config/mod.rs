//! Configuration management for dicom-deid.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! dicom-deid uses a `deid.toml` file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `DEID_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Validation on load
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level and anonymous mode
//! - [`DeidentificationConfig`] - Profile, tables, forced values and batch settings
//! - [`AuditConfig`] - Per-file audit log
//! - [`LoggingConfig`] - Local JSON log files
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [deidentification]
//! profile = "data_sharing"
//! profiles_dir = "profiles"
//! imaging_only = true
//! workers = 4
//!
//! [deidentification.forced_values]
//! "(0010,0020)" = "${DEID_SUBJECT_ID}"
//!
//! [audit]
//! enabled = true
//! log_path = "logs/deid_audit.tsv"
//! ```
//!
//! # Validation
//!
//! ```rust,no_run
//! use dicom_deid::config::load_config;
//!
//! # fn example() {
//! match load_config("deid.toml") {
//!     Ok(_) => println!("Configuration valid"),
//!     Err(e) => eprintln!("Configuration error: {}", e),
//! }
//! # }
//! ```

pub mod loader;
pub mod schema;

pub use loader::load_config;
pub use schema::{
    ApplicationConfig, AuditConfig, DeidConfig, DeidentificationConfig, LoggingConfig,
};
