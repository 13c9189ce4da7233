//! Rule tables consulted by the policy resolver
//!
//! All three tables are tab-separated files with a header row:
//!
//! - [`RuleTable`]: the standard confidentiality profile (`Tag`, `Name`, `Action`)
//! - [`SafePrivateRegistry`]: vendor private attributes known to be safe
//!   (`Tag`, `Private Creator`)
//! - [`ConfigProfile`]: site overrides (`Tag`, `Name`, `Action`, `Private Creator`)
//!
//! Tables are loaded once and are read-only afterwards.

pub mod forced;
pub mod profile;
pub mod safe_private;
pub mod table;

pub use forced::ForcedValues;
pub use profile::{ConfigProfile, ProfileEntry};
pub use safe_private::SafePrivateRegistry;
pub use table::{RuleTable, TableMatch};

use crate::domain::errors::ConfigError;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Builds a TSV reader; trailing optional columns may be missing
pub(crate) fn tsv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Opens a table file, mapping failures to [`ConfigError::TableRead`]
pub(crate) fn open_table(path: &Path) -> Result<File, ConfigError> {
    File::open(path).map_err(|e| table_error(&path.display().to_string(), e))
}

pub(crate) fn table_error(source: &str, err: impl std::fmt::Display) -> ConfigError {
    ConfigError::TableRead {
        path: source.to_string(),
        message: err.to_string(),
    }
}
