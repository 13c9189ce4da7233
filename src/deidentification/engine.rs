//! File-level de-identification engine
//!
//! [`DeidEngine`] loads the policy once and applies it to files and directory trees.
//!
//! # Pipeline per file
//!
//! 1. Load the attribute tree through the [`TreeLoader`]
//! 2. Reject directory descriptors (DICOMDIR)
//! 3. Optionally drop non-imaging objects ([`ImagingGate`])
//! 4. Copy trees that are already de-identified under the policy, adding the
//!    provenance elements when they are missing
//! 5. Walk the tree in [`WalkMode::Run`] and persist it through the [`TreeWriter`]
//! 6. Append one [`AuditRow`] to the audit sink
//!
//! # Examples
//!
//! ```no_run
//! use dicom_deid::config::DeidConfig;
//! use dicom_deid::deidentification::DeidEngine;
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let engine = DeidEngine::new(&DeidConfig::default())?.with_subject("sub-001");
//! let summary = engine
//!     .process_path(Path::new("raw/"), Path::new("deidentified/"))
//!     .await?;
//! summary.log_summary();
//! # Ok(())
//! # }
//! ```

use crate::config::{DeidConfig, DeidentificationConfig};
use crate::deidentification::audit::{AuditRecord, AuditRow, AuditSink, Disposition, TsvAuditLog};
use crate::deidentification::batch::{self, BatchSummary};
use crate::deidentification::check;
use crate::deidentification::gate::{Classification, ImagingGate, SOP_CLASS_UID};
use crate::deidentification::resolver::Policy;
use crate::deidentification::rules::{ConfigProfile, ForcedValues, RuleTable, SafePrivateRegistry};
use crate::deidentification::walker::{WalkMode, Walker, IDENTITY_REMOVED};
use crate::domain::errors::{ConfigError, DeidError};
use crate::domain::result::Result;
use crate::domain::tag::Tag;
use crate::domain::tree::AttributeTree;
use crate::io::{JsonModel, TreeLoader, TreeWriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Media Storage SOP Class UID (file meta information)
pub const MEDIA_STORAGE_SOP_CLASS_UID: Tag = Tag::new(0x0002, 0x0002);
/// SOP class of a DICOMDIR
pub const MEDIA_DIRECTORY_STORAGE: &str = "1.2.840.10008.1.3.10";
/// Profile name used when neither a named profile nor tag lists are configured
pub const BASIC_PROFILE: &str = "basic";
/// Profile name given to the keep/delete shorthand lists
pub const CUSTOM_PROFILE: &str = "custom";

/// Result of processing one file
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub disposition: Disposition,
    /// Per-element record; `None` unless the tree was rewritten
    pub audit: Option<AuditRecord>,
    pub row: AuditRow,
}

/// Builds the immutable policy described by `config`
///
/// # Errors
///
/// - [`ConfigError::ConflictingSources`] when a named profile and keep/delete lists are
///   both configured
/// - [`ConfigError::ProfileNotFound`] for an unknown profile
/// - table parsing errors from the rule tables
pub fn load_policy(config: &DeidentificationConfig) -> Result<Policy> {
    let table = match &config.standard_table {
        Some(path) => RuleTable::from_path(path)?,
        None => RuleTable::embedded()?,
    };
    let safe_private = match &config.safe_private_table {
        Some(path) => SafePrivateRegistry::from_path(path)?,
        None => SafePrivateRegistry::embedded()?,
    };

    let profile = match (&config.profile, config.has_tag_lists()) {
        (Some(name), true) => {
            return Err(ConfigError::ConflictingSources(format!(
                "profile '{name}' and keep/delete tag lists cannot be used together"
            ))
            .into())
        }
        (Some(name), false) => ConfigProfile::load(&config.profiles_dir, name)?,
        (None, true) => {
            let keep = parse_tags(&config.keep_tags)?;
            let delete = parse_tags(&config.delete_tags)?;
            ConfigProfile::from_lists(CUSTOM_PROFILE, &keep, &delete)?
        }
        (None, false) => ConfigProfile::empty(BASIC_PROFILE),
    };

    let forced = ForcedValues::from_config(&config.forced_values)?;

    tracing::info!(
        profile = profile.name(),
        standard_rules = table.len(),
        safe_private_rules = safe_private.len(),
        profile_rules = profile.len(),
        forced_values = forced.len(),
        "Policy loaded"
    );
    Ok(Policy::new(table, safe_private, profile, forced))
}

fn parse_tags(specs: &[String]) -> std::result::Result<Vec<Tag>, ConfigError> {
    specs.iter().map(|spec| spec.parse()).collect()
}

/// Applies one policy to files and directories
///
/// Cheap to clone; the policy and collaborators are shared behind `Arc`s so that batch
/// workers can each own a handle.
#[derive(Clone)]
pub struct DeidEngine {
    policy: Arc<Policy>,
    loader: Arc<dyn TreeLoader>,
    writer: Arc<dyn TreeWriter>,
    audit_sink: Option<Arc<dyn AuditSink>>,
    imaging_only: bool,
    anonymous: bool,
    fail_fast: bool,
    workers: usize,
}

impl DeidEngine {
    /// Creates an engine from the configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the policy cannot be loaded or the audit log
    /// directory cannot be created.
    pub fn new(config: &DeidConfig) -> Result<Self> {
        let policy = load_policy(&config.deidentification)?;

        let audit_sink: Option<Arc<dyn AuditSink>> = if config.audit.enabled {
            Some(Arc::new(TsvAuditLog::new(&config.audit.log_path)?))
        } else {
            None
        };

        let model = Arc::new(JsonModel::new());
        Ok(Self {
            policy: Arc::new(policy),
            loader: model.clone(),
            writer: model,
            audit_sink,
            imaging_only: config.deidentification.imaging_only,
            anonymous: config.application.anonymous,
            fail_fast: config.deidentification.fail_fast,
            workers: config.deidentification.workers.max(1),
        })
    }

    /// Forces Patient's Name to `subject` in every processed file
    pub fn with_subject(mut self, subject: &str) -> Self {
        let policy = Arc::make_mut(&mut self.policy);
        policy.forced = std::mem::take(&mut policy.forced).with_subject(subject);
        self
    }

    /// Replaces the audit sink
    pub fn with_audit_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.audit_sink = Some(sink);
        self
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn fail_fast(&self) -> bool {
        self.fail_fast
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    /// Error as it may be shown to the user in the current mode
    pub fn present_error(&self, error: DeidError) -> DeidError {
        if self.anonymous {
            error.redacted()
        } else {
            error
        }
    }

    /// De-identifies `input` into `output`
    ///
    /// # Errors
    ///
    /// - [`DeidError::NotADataFile`] if `input` is not an attribute-tree file
    /// - [`DeidError::DirectoryDescriptorFile`] for a DICOMDIR
    /// - [`DeidError::Traversal`] if an element cannot be rewritten; nothing is written
    pub fn process_file(&self, input: &Path, output: &Path) -> Result<FileOutcome> {
        let filename = file_label(input);
        let mut tree = self.loader.load(input)?;
        reject_directory_descriptor(&tree, input)?;

        // Row attributes are read before any element is rewritten
        let mut row = AuditRow::from_tree(&filename, Disposition::Anonymized, &tree);

        if self.imaging_only {
            if let Classification::NotImaging { reason } = ImagingGate::classify(&tree) {
                tracing::info!(file = %self.label(&filename), reason = %reason, "File removed");
                row.disposition = Disposition::Removed;
                self.append_row(&row)?;
                return Ok(FileOutcome {
                    disposition: Disposition::Removed,
                    audit: None,
                    row,
                });
            }
        }

        if check::is_deidentified(&self.policy, &tree)? {
            if tree.string(tree.root(), IDENTITY_REMOVED) != Some("YES") {
                Walker::new(&self.policy, WalkMode::Run).stamp_provenance(&mut tree);
            }
            self.writer.write(&tree, output)?;
            row.disposition = Disposition::AlreadyAnonymized;
            self.append_row(&row)?;
            crate::log_file_outcome!(self.label(&filename), row.disposition, 0);
            return Ok(FileOutcome {
                disposition: Disposition::AlreadyAnonymized,
                audit: None,
                row,
            });
        }

        let record = Walker::new(&self.policy, WalkMode::Run).walk(&mut tree)?;
        self.writer.write(&tree, output)?;
        self.append_row(&row)?;
        crate::log_file_outcome!(self.label(&filename), row.disposition, record.changes().len());

        Ok(FileOutcome {
            disposition: Disposition::Anonymized,
            audit: Some(record),
            row,
        })
    }

    /// Whether `input` is already de-identified under the policy
    pub fn check_file(&self, input: &Path) -> Result<bool> {
        let tree = self.loader.load(input)?;
        reject_directory_descriptor(&tree, input)?;
        check::is_deidentified(&self.policy, &tree)
    }

    /// Checks a file, or every data file below a directory
    ///
    /// Directory entries that are not data files are ignored.
    pub fn check_path(&self, input: &Path) -> Result<bool> {
        if input.is_file() {
            return self.check_file(input);
        }
        if !input.is_dir() {
            return Err(missing_input(input));
        }

        for file in collect_files(input)? {
            if !JsonModel::is_data_file(&file) {
                continue;
            }
            if !self.check_file(&file)? {
                tracing::info!(file = %self.label(&file_label(&file)), "File is not de-identified");
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// De-identifies a single file or a whole directory
    ///
    /// A single file may target an existing directory, in which case its name is kept.
    /// A directory is walked recursively and its layout mirrored below `output`.
    ///
    /// # Errors
    ///
    /// - [`DeidError::Io`] if `input` does not exist
    /// - [`ConfigError::Invalid`] if `input` is a directory and `output` a file
    /// - the per-file error for a single file; for directories only under `fail_fast`
    pub async fn process_path(&self, input: &Path, output: &Path) -> Result<BatchSummary> {
        if input.is_file() {
            let target = if output.is_dir() {
                output.join(input.file_name().unwrap_or_default())
            } else {
                output.to_path_buf()
            };
            let start = Instant::now();
            let mut summary = BatchSummary::new();
            match self.process_file(input, &target) {
                Ok(outcome) => summary.record(outcome.disposition),
                Err(e) => {
                    self.append_row(&AuditRow::failed(file_label(input)))?;
                    return Err(self.present_error(e));
                }
            }
            return Ok(summary.with_duration(start.elapsed()));
        }

        if !input.is_dir() {
            return Err(self.present_error(missing_input(input)));
        }
        if output.is_file() {
            return Err(ConfigError::Invalid(
                "Since the input is a directory, an output directory is expected.".to_string(),
            )
            .into());
        }
        std::fs::create_dir_all(output)?;

        let jobs = collect_files(input)?
            .into_iter()
            .map(|file| {
                let relative = file.strip_prefix(input).unwrap_or(&file).to_path_buf();
                let target = output.join(relative);
                (file, target)
            })
            .collect();

        batch::run(self.clone(), jobs).await
    }

    pub(crate) fn append_row(&self, row: &AuditRow) -> Result<()> {
        match &self.audit_sink {
            Some(sink) => sink.append(row),
            None => Ok(()),
        }
    }

    /// File name as it may appear in logs
    pub(crate) fn label(&self, filename: &str) -> String {
        if self.anonymous {
            "<redacted>".to_string()
        } else {
            filename.to_string()
        }
    }
}

/// Last path component, used as the audit-log file name
pub(crate) fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn missing_input(input: &Path) -> DeidError {
    DeidError::Io(format!("The input does not exist: {}", input.display()))
}

fn reject_directory_descriptor(tree: &AttributeTree, path: &Path) -> Result<()> {
    let root = tree.root();
    let is_dicomdir = [MEDIA_STORAGE_SOP_CLASS_UID, SOP_CLASS_UID]
        .into_iter()
        .any(|tag| tree.string(root, tag) == Some(MEDIA_DIRECTORY_STORAGE));
    if is_dicomdir {
        return Err(DeidError::DirectoryDescriptorFile {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Every regular file below `root`, in a stable order
fn collect_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}
