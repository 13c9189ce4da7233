//! Audit log of processed files
//!
//! One row per file: name, disposition and a few descriptive attributes of the input.
//! Rows never carry identifying values.

use crate::deidentification::gate::{IMAGE_TYPE, MODALITY, SERIES_DESCRIPTION, SOP_CLASS_UID};
use crate::domain::errors::DeidError;
use crate::domain::result::Result;
use crate::domain::tree::{AttributeTree, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disposition {
    /// De-identified and written
    Anonymized,
    /// Rejected by the imaging gate; nothing written
    Removed,
    /// Already de-identified under the policy; copied as is
    AlreadyAnonymized,
    /// Processing failed; nothing written
    Failed,
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Disposition::Anonymized => "Anonymized",
            Disposition::Removed => "Removed",
            Disposition::AlreadyAnonymized => "AlreadyAnonymized",
            Disposition::Failed => "Failed",
        };
        f.write_str(name)
    }
}

/// One audit log row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRow {
    /// RFC 3339 time the row was produced
    pub processed_at: String,
    pub filename: String,
    pub disposition: Disposition,
    pub modality: String,
    pub sop_class_uid: String,
    pub series_description: String,
    pub image_type: String,
}

impl AuditRow {
    /// Row describing `tree`, read before de-identification
    pub fn from_tree(filename: impl Into<String>, disposition: Disposition, tree: &AttributeTree) -> Self {
        let root = tree.root();
        let text = |tag| {
            tree.get(root, tag)
                .and_then(|element| match &element.value {
                    Value::Strings(_) | Value::Numbers(_) => element.value.text(),
                    _ => None,
                })
                .unwrap_or_default()
        };
        Self {
            processed_at: chrono::Utc::now().to_rfc3339(),
            filename: filename.into(),
            disposition,
            modality: text(MODALITY),
            sop_class_uid: text(SOP_CLASS_UID),
            series_description: text(SERIES_DESCRIPTION),
            image_type: text(IMAGE_TYPE),
        }
    }

    /// Row for a file that could not be loaded
    pub fn failed(filename: impl Into<String>) -> Self {
        Self {
            processed_at: chrono::Utc::now().to_rfc3339(),
            filename: filename.into(),
            disposition: Disposition::Failed,
            modality: String::new(),
            sop_class_uid: String::new(),
            series_description: String::new(),
            image_type: String::new(),
        }
    }
}

/// Append-only destination for audit rows
pub trait AuditSink: Send + Sync {
    /// Appends one row
    fn append(&self, row: &AuditRow) -> Result<()>;
}

/// Tab-separated audit log file
///
/// The header is written when the file is created; later runs append to it.
pub struct TsvAuditLog {
    log_path: PathBuf,
    lock: Mutex<()>,
}

impl TsvAuditLog {
    /// Creates the log, making sure the parent directory exists
    pub fn new(log_path: impl Into<PathBuf>) -> Result<Self> {
        let log_path = log_path.into();
        if let Some(parent) = log_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DeidError::Io(format!(
                        "Failed to create audit log directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }
        Ok(Self {
            log_path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }
}

impl AuditSink for TsvAuditLog {
    fn append(&self, row: &AuditRow) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| DeidError::Other("Audit log lock poisoned".to_string()))?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| {
                DeidError::Io(format!(
                    "Failed to open audit log {}: {e}",
                    self.log_path.display()
                ))
            })?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(row)?;
        writer.flush()?;
        Ok(())
    }
}

/// In-memory sink
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    rows: Mutex<Vec<AuditRow>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows appended so far
    pub fn rows(&self) -> Vec<AuditRow> {
        self.rows.lock().map(|rows| rows.clone()).unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&self, row: &AuditRow) -> Result<()> {
        self.rows
            .lock()
            .map_err(|_| DeidError::Other("Audit sink lock poisoned".to_string()))?
            .push(row.clone());
        Ok(())
    }
}
