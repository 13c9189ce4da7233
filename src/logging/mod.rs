//! Logging and observability
//!
//! Structured logging through `tracing`, plus a few macros that keep the field names of
//! recurring events consistent across the crate.
//!
//! # Example
//!
//! ```no_run
//! use dicom_deid::logging::init_logging;
//! use dicom_deid::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(files = 12, "Batch started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the outcome of one processed file
///
/// # Example
///
/// ```no_run
/// use dicom_deid::log_file_outcome;
/// use dicom_deid::deidentification::Disposition;
///
/// log_file_outcome!("scan-001.json", Disposition::Anonymized, 17);
/// ```
#[macro_export]
macro_rules! log_file_outcome {
    ($file:expr, $disposition:expr, $changes:expr) => {
        tracing::info!(
            file = %$file,
            disposition = %$disposition,
            changes = $changes,
            "File processed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use dicom_deid::log_error_with_context;
/// use dicom_deid::domain::DeidError;
///
/// let error = DeidError::Other("Invalid table".to_string());
/// log_error_with_context!(&error, "Failed to load policy");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log batch progress
#[macro_export]
macro_rules! log_batch_progress {
    ($done:expr, $total:expr) => {
        tracing::debug!(
            done = $done,
            total = $total,
            progress_pct = ($done as f64 / $total as f64 * 100.0),
            "Batch progress"
        );
    };
}
