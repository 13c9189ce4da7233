//! Domain models and types for dicom-deid.
//!
//! This module contains the core domain types the de-identification engine works on.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Identifiers** ([`Tag`], [`TagRange`], [`ElementPath`])
//! - **Value representations** ([`Vr`], [`VrClass`])
//! - **The attribute tree** ([`AttributeTree`], [`Element`], [`Value`])
//! - **Error types** ([`DeidError`], [`ConfigError`])
//! - **Result type alias** ([`Result`])
//!
//! # Building a tree
//!
//! ```rust
//! use dicom_deid::domain::{AttributeTree, Element, Tag, Vr};
//!
//! let mut tree = AttributeTree::new();
//! let root = tree.root();
//! tree.insert(root, Element::text(Tag::new(0x0010, 0x0010), Vr::PN, "Doe^John"));
//!
//! let item = tree.new_item();
//! tree.insert(item, Element::text(Tag::new(0x0008, 0x1155), Vr::UI, "1.2.3"));
//! tree.insert(root, Element::sequence(Tag::new(0x0008, 0x1140), vec![item]));
//!
//! assert_eq!(tree.element_count(), 3);
//! ```
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, DeidError>`]:
//!
//! ```rust
//! use dicom_deid::domain::{Result, Tag};
//!
//! fn parse() -> Result<Tag> {
//!     // ConfigError converts into DeidError with the ? operator
//!     let tag: Tag = "(0010,0010)".parse()?;
//!     Ok(tag)
//! }
//! # parse().unwrap();
//! ```

pub mod errors;
pub mod result;
pub mod tag;
pub mod tree;
pub mod vr;

// Re-export commonly used types for convenience
pub use errors::{ConfigError, DeidError};
pub use result::Result;
pub use tag::{Tag, TagRange};
pub use tree::{AttributeTree, Dataset, DatasetId, Element, ElementPath, Value};
pub use vr::{Vr, VrClass};
