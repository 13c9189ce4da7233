//! Result type alias for dicom-deid

use super::errors::DeidError;

/// Result of any fallible de-identification step
///
/// Configuration errors convert with `?`:
///
/// ```
/// use dicom_deid::domain::{Result, Tag};
///
/// fn patient_name() -> Result<Tag> {
///     Ok("(0010,0010)".parse()?)
/// }
/// assert_eq!(patient_name().unwrap(), Tag::new(0x0010, 0x0010));
/// ```
pub type Result<T> = std::result::Result<T, DeidError>;
