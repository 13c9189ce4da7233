//! Concurrent processing of a directory of files
//!
//! Each file is handled by a blocking task; at most `workers` run at once. Workers
//! share the engine (and its immutable policy) and each owns the tree it is rewriting.

use crate::deidentification::audit::{AuditRow, Disposition};
use crate::deidentification::engine::{file_label, DeidEngine};
use crate::domain::errors::DeidError;
use crate::domain::result::Result;
use crate::io::JsonModel;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// A file that could not be processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub file: String,
    pub message: String,
}

/// Summary of a batch run
#[derive(Debug, Clone)]
pub struct BatchSummary {
    /// Files found below the input
    pub total: usize,
    pub anonymized: usize,
    /// Dropped by the imaging gate
    pub removed: usize,
    pub already_anonymized: usize,
    /// Not data files, or DICOMDIRs
    pub skipped: usize,
    pub failed: usize,
    pub failures: Vec<FileFailure>,
    pub duration: Duration,
}

impl BatchSummary {
    /// Create a new empty summary
    pub fn new() -> Self {
        Self {
            total: 0,
            anonymized: 0,
            removed: 0,
            already_anonymized: 0,
            skipped: 0,
            failed: 0,
            failures: Vec::new(),
            duration: Duration::from_secs(0),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Counts one processed file
    pub fn record(&mut self, disposition: Disposition) {
        self.total = self.total.max(self.processed() + 1);
        match disposition {
            Disposition::Anonymized => self.anonymized += 1,
            Disposition::Removed => self.removed += 1,
            Disposition::AlreadyAnonymized => self.already_anonymized += 1,
            Disposition::Failed => self.failed += 1,
        }
    }

    /// Counts one skipped file
    pub fn skip(&mut self) {
        self.total = self.total.max(self.processed() + 1);
        self.skipped += 1;
    }

    /// Counts one failed file
    pub fn add_failure(&mut self, file: impl Into<String>, message: impl Into<String>) {
        self.total = self.total.max(self.processed() + 1);
        self.failed += 1;
        self.failures.push(FileFailure {
            file: file.into(),
            message: message.into(),
        });
    }

    /// Files accounted for so far
    pub fn processed(&self) -> usize {
        self.anonymized + self.removed + self.already_anonymized + self.skipped + self.failed
    }

    /// No file failed
    pub fn is_successful(&self) -> bool {
        self.failed == 0
    }

    /// Share of data files that did not fail, as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempted = self.processed() - self.skipped;
        if attempted == 0 {
            return 100.0;
        }
        ((attempted - self.failed) as f64 / attempted as f64) * 100.0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            total = self.total,
            anonymized = self.anonymized,
            removed = self.removed,
            already_anonymized = self.already_anonymized,
            skipped = self.skipped,
            failed = self.failed,
            duration_ms = self.duration.as_millis() as u64,
            success_rate = format!("{:.2}%", self.success_rate()),
            "De-identification completed"
        );

        if !self.failures.is_empty() {
            tracing::warn!(
                error_count = self.failures.len(),
                "De-identification completed with errors"
            );
            for failure in &self.failures {
                tracing::warn!(
                    file = %failure.file,
                    message = %failure.message,
                    "De-identification error"
                );
            }
        }
    }
}

impl Default for BatchSummary {
    fn default() -> Self {
        Self::new()
    }
}

fn process_job(engine: &DeidEngine, input: &Path, output: &Path) -> Result<Disposition> {
    if !JsonModel::is_data_file(input) {
        return Err(DeidError::not_a_data_file(input, "not a .json file"));
    }
    engine
        .process_file(input, output)
        .map(|outcome| outcome.disposition)
}

/// Processes `(input, output)` pairs with up to `engine.workers()` concurrent tasks
///
/// # Errors
///
/// With `fail_fast`, the first failing or skipped file ends the batch and its error is
/// returned. Otherwise only audit-log failures are returned; per-file errors are
/// collected in the summary.
pub async fn run(engine: DeidEngine, jobs: Vec<(PathBuf, PathBuf)>) -> Result<BatchSummary> {
    let start = Instant::now();
    let mut summary = BatchSummary::new();
    summary.total = jobs.len();
    let workers = engine.workers();

    tracing::info!(files = jobs.len(), workers = workers, "Batch started");

    let mut results = stream::iter(jobs.into_iter().map(|(input, output)| {
        let engine = engine.clone();
        async move {
            let job_input = input.clone();
            let result =
                tokio::task::spawn_blocking(move || process_job(&engine, &job_input, &output))
                    .await
                    .map_err(|e| DeidError::Other(format!("Worker task failed: {e}")))
                    .and_then(|result| result);
            (input, result)
        }
    }))
    .buffer_unordered(workers);

    while let Some((input, result)) = results.next().await {
        let filename = file_label(&input);
        match result {
            Ok(disposition) => summary.record(disposition),
            Err(e) => {
                let skippable = matches!(
                    e,
                    DeidError::NotADataFile { .. } | DeidError::DirectoryDescriptorFile { .. }
                );
                let presented = engine.present_error(e);

                if engine.fail_fast() {
                    if !skippable {
                        engine.append_row(&AuditRow::failed(&filename))?;
                    }
                    crate::log_error_with_context!(&presented, "Batch aborted");
                    return Err(presented);
                }

                if skippable {
                    tracing::warn!(file = %engine.label(&filename), reason = %presented, "File skipped");
                    summary.skip();
                } else {
                    crate::log_error_with_context!(&presented, "File failed");
                    engine.append_row(&AuditRow::failed(&filename))?;
                    summary.add_failure(engine.label(&filename), presented.to_string());
                }
            }
        }
        crate::log_batch_progress!(summary.processed(), summary.total);
    }

    let summary = summary.with_duration(start.elapsed());
    summary.log_summary();
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts() {
        let mut summary = BatchSummary::new();
        summary.record(Disposition::Anonymized);
        summary.record(Disposition::Removed);
        summary.skip();
        summary.add_failure("b.json", "broken");

        assert_eq!(summary.total, 4);
        assert_eq!(summary.processed(), 4);
        assert!(!summary.is_successful());
        assert_eq!(summary.failures[0].file, "b.json");
        assert!((summary.success_rate() - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_empty_summary_is_successful() {
        let summary = BatchSummary::default();
        assert!(summary.is_successful());
        assert_eq!(summary.success_rate(), 100.0);
    }
}
