//! Multi-subject runs
//!
//! A subject list names one input per subject, one `subject;input;output` line each.
//! Every line is processed with its own forced Patient's Name, and a failing subject
//! never stops the ones after it.

use crate::deidentification::batch::BatchSummary;
use crate::deidentification::engine::DeidEngine;
use crate::deidentification::rules::table_error;
use crate::domain::errors::ConfigError;
use crate::domain::result::Result;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// One line of a subject list
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubjectJob {
    pub subject: String,
    pub input: PathBuf,
    pub output: PathBuf,
}

/// Result of one subject
#[derive(Debug)]
pub struct SubjectOutcome {
    pub subject: String,
    pub result: Result<BatchSummary>,
}

impl SubjectOutcome {
    /// Whether the subject finished without any failed file
    pub fn is_successful(&self) -> bool {
        matches!(&self.result, Ok(summary) if summary.is_successful())
    }
}

/// Reads a subject list file
///
/// # Errors
///
/// Returns [`ConfigError::TableRead`] when the file cannot be read or a line does not
/// have three fields, and [`ConfigError::Invalid`] for an empty subject.
pub fn read_subject_list(path: &Path) -> Result<Vec<SubjectJob>> {
    let source = path.display().to_string();
    let file = File::open(path).map_err(|e| table_error(&source, e))?;
    parse_subject_list(file, &source)
}

/// Parses subject list lines; blank lines and `#` comments are ignored
pub fn parse_subject_list<R: Read>(reader: R, source: &str) -> Result<Vec<SubjectJob>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .comment(Some(b'#'))
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut jobs = Vec::new();
    for result in reader.deserialize::<SubjectJob>() {
        let job = result.map_err(|e| table_error(source, e))?;
        if job.subject.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "Empty subject for input {} in {source}",
                job.input.display()
            ))
            .into());
        }
        jobs.push(job);
    }

    tracing::debug!(source = source, subjects = jobs.len(), "Loaded subject list");
    Ok(jobs)
}

impl DeidEngine {
    /// Processes every subject of `jobs` in turn
    ///
    /// Each subject gets a copy of the engine forcing its identifier into Patient's
    /// Name. Errors are kept in the subject's outcome.
    pub async fn process_subjects(&self, jobs: &[SubjectJob]) -> Vec<SubjectOutcome> {
        let mut outcomes = Vec::with_capacity(jobs.len());

        for job in jobs {
            let engine = self.clone().with_subject(&job.subject);
            let result = engine.process_path(&job.input, &job.output).await;
            match &result {
                Ok(summary) => tracing::info!(
                    subject = %job.subject,
                    anonymized = summary.anonymized,
                    failed = summary.failed,
                    "Subject processed"
                ),
                Err(e) => tracing::error!(
                    subject = %job.subject,
                    error = %e,
                    "Error during de-identification of subject"
                ),
            }
            outcomes.push(SubjectOutcome {
                subject: job.subject.clone(),
                result,
            });
        }
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::DeidError;

    #[test]
    fn test_parse_subject_list() {
        let text = "# subject;input;output\n\
            sub-001; raw/a ;out/a\n\
            \n\
            sub-002;raw/b;out/b\n";
        let jobs = parse_subject_list(text.as_bytes(), "subjects.txt").unwrap();

        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].subject, "sub-001");
        assert_eq!(jobs[0].input, PathBuf::from("raw/a"));
        assert_eq!(jobs[1].output, PathBuf::from("out/b"));
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let err = parse_subject_list("sub-001;raw/a\n".as_bytes(), "subjects.txt").unwrap_err();
        assert!(matches!(
            err,
            DeidError::Config(ConfigError::TableRead { .. })
        ));
    }

    #[test]
    fn test_empty_subject_is_rejected() {
        let err = parse_subject_list(";raw/a;out/a\n".as_bytes(), "subjects.txt").unwrap_err();
        assert!(err.to_string().contains("Empty subject"));
    }
}
