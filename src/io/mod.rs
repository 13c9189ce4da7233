//! Tree loading and writing
//!
//! The engine only sees [`TreeLoader`] and [`TreeWriter`]; [`JsonModel`] implements both
//! for the DICOM JSON Model.

pub mod json_model;

pub use json_model::JsonModel;

use crate::domain::result::Result;
use crate::domain::tree::AttributeTree;
use std::path::Path;

/// Reads an attribute tree from a file
pub trait TreeLoader: Send + Sync {
    /// # Errors
    ///
    /// [`DeidError::NotADataFile`](crate::domain::DeidError::NotADataFile) when the file
    /// does not hold an attribute tree.
    fn load(&self, path: &Path) -> Result<AttributeTree>;
}

/// Persists an attribute tree
pub trait TreeWriter: Send + Sync {
    fn write(&self, tree: &AttributeTree, path: &Path) -> Result<()>;
}
