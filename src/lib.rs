// dicom-deid - DICOM de-identification tool
// Copyright (c) 2025 dicom-deid Contributors
// Licensed under the MIT License

//! # dicom-deid - DICOM de-identification
//!
//! dicom-deid removes or transforms identifying attributes of DICOM objects according to
//! the PS3.15 Annex E basic confidentiality profile, vendor safe-private lists and site
//! profiles, keeping enough of the data for research use.
//!
//! ## Overview
//!
//! For every element of an attribute tree, including nested sequence items, one
//! action is resolved and applied:
//!
//! - **Keep** the value
//! - **Delete** the element
//! - **Blank** it to an empty value
//! - replace it with a **Dummy** value of the same representation
//! - **Pseudonymize** it with a deterministic `2.25.` UID
//!
//! Resolution follows a fixed precedence: forced values, then the site profile, then
//! the standard table, then the private-attribute rules.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`deidentification`] - Policy resolution, tree walking, audit and batch processing
//! - [`io`] - Reading and writing attribute trees (DICOM JSON Model)
//! - [`domain`] - Tags, value representations, the attribute tree and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dicom_deid::config::load_config;
//! use dicom_deid::deidentification::DeidEngine;
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("deid.toml")?;
//!     let engine = DeidEngine::new(&config)?;
//!
//!     let summary = engine
//!         .process_path(Path::new("raw"), Path::new("deidentified"))
//!         .await?;
//!     println!("Anonymized {} files", summary.anonymized);
//!     Ok(())
//! }
//! ```
//!
//! ## Checking a tree
//!
//! ```rust
//! use dicom_deid::deidentification::{is_deidentified, load_policy, WalkMode, Walker};
//! use dicom_deid::config::DeidentificationConfig;
//! use dicom_deid::domain::{AttributeTree, Element, Tag, Vr};
//!
//! # fn example() -> Result<(), dicom_deid::domain::DeidError> {
//! let policy = load_policy(&DeidentificationConfig::default())?;
//!
//! let mut tree = AttributeTree::new();
//! let root = tree.root();
//! tree.insert(root, Element::text(Tag::new(0x0010, 0x0010), Vr::PN, "Doe^John"));
//! assert!(!is_deidentified(&policy, &tree)?);
//!
//! Walker::new(&policy, WalkMode::Run).walk(&mut tree)?;
//! assert!(is_deidentified(&policy, &tree)?);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod cli;
pub mod config;
pub mod deidentification;
pub mod domain;
pub mod io;
pub mod logging;
