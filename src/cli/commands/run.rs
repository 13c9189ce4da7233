//! Run command implementation
//!
//! This module implements the `run` command, which de-identifies a file or a
//! directory tree, or every entry of a `subject;input;output` list.

use crate::cli::{load_config_or_default, EXIT_CONFIG, EXIT_FATAL, EXIT_OK, EXIT_PARTIAL};
use crate::deidentification::{read_subject_list, BatchSummary, DeidEngine};
use crate::domain::DeidError;
use clap::Args;
use std::path::Path;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Input file or directory
    #[arg(required_unless_present = "subjects")]
    pub input: Option<String>,

    /// Output file or directory
    #[arg(required_unless_present = "subjects")]
    pub output: Option<String>,

    /// File of `subject;input;output` lines, one run per line
    #[arg(long, conflicts_with_all = ["input", "output", "subject"])]
    pub subjects: Option<String>,

    /// Site profile to apply (overrides the configuration file)
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Subject identifier written to Patient's Name
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Only write acquisition images (CT, MR, NM, PT, ST)
    #[arg(long)]
    pub imaging_only: bool,

    /// Keep file paths out of error messages and logs
    #[arg(long)]
    pub anonymous: bool,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting run command");

        let mut config = match load_config_or_default(config_path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("❌ Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        // Apply CLI overrides
        if let Some(profile) = &self.profile {
            tracing::info!(profile = %profile, "Overriding profile from CLI");
            config.deidentification.profile = Some(profile.clone());
        }
        if self.imaging_only {
            config.deidentification.imaging_only = true;
        }
        if self.anonymous {
            config.application.anonymous = true;
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIG);
        }

        let mut engine = match DeidEngine::new(&config) {
            Ok(engine) => engine,
            Err(e) => {
                let e = if config.application.anonymous { e.redacted() } else { e };
                tracing::error!(error = %e, "Failed to load de-identification policy");
                eprintln!("❌ Failed to load de-identification policy: {e}");
                return Ok(EXIT_CONFIG);
            }
        };
        if let Some(subject) = &self.subject {
            engine = engine.with_subject(subject);
        }

        if let Some(list) = &self.subjects {
            return Ok(run_subjects(&engine, list).await);
        }
        let (Some(input), Some(output)) = (&self.input, &self.output) else {
            eprintln!("❌ An input and an output are required");
            return Ok(EXIT_CONFIG);
        };

        println!("🚀 Starting de-identification...");
        println!();

        let summary = match engine
            .process_path(Path::new(input), Path::new(output))
            .await
        {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "De-identification failed");
                eprintln!("De-identification failed: {e}");
                return Ok(match e {
                    DeidError::Config(_) => EXIT_CONFIG,
                    _ => EXIT_FATAL,
                });
            }
        };

        print_summary(&summary);

        let exit_code = if summary.is_successful() {
            println!("✅ De-identification completed successfully!");
            EXIT_OK
        } else {
            println!("⚠️  De-identification completed with failures");
            EXIT_PARTIAL
        };
        Ok(exit_code)
    }
}

/// Runs every line of a subject list; a failed subject does not stop the others
async fn run_subjects(engine: &DeidEngine, list: &str) -> i32 {
    let jobs = match read_subject_list(Path::new(list)) {
        Ok(jobs) => jobs,
        Err(e) => {
            let e = engine.present_error(e);
            tracing::error!(error = %e, "Failed to read subject list");
            eprintln!("❌ Failed to read subject list: {e}");
            return EXIT_CONFIG;
        }
    };

    println!("🚀 Starting de-identification of {} subjects...", jobs.len());
    println!();

    let outcomes = engine.process_subjects(&jobs).await;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(summary) => {
                println!("👤 {}", outcome.subject);
                print_summary(summary);
            }
            Err(e) => {
                println!("❌ Error during de-identification for {}: {e}", outcome.subject);
                println!();
            }
        }
    }

    let failed = outcomes.iter().filter(|o| !o.is_successful()).count();
    if failed == 0 {
        println!("✅ All {} subjects de-identified successfully!", outcomes.len());
        EXIT_OK
    } else {
        println!("⚠️  {failed} of {} subjects had failures", outcomes.len());
        EXIT_PARTIAL
    }
}

fn print_summary(summary: &BatchSummary) {
    println!("📊 De-identification Summary:");
    println!("  Total Files: {}", summary.total);
    println!("  Anonymized: {}", summary.anonymized);
    println!("  Already Anonymized: {}", summary.already_anonymized);
    println!("  Removed (not imaging): {}", summary.removed);
    println!("  Skipped: {}", summary.skipped);
    println!("  Failed: {}", summary.failed);
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!("  Success Rate: {:.2}%", summary.success_rate());
    println!();

    if !summary.failures.is_empty() {
        println!("⚠️  Errors encountered:");
        for failure in summary.failures.iter().take(10) {
            println!("  - {}: {}", failure.file, failure.message);
        }
        if summary.failures.len() > 10 {
            println!("  ... and {} more failures", summary.failures.len() - 10);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn args(input: &Path, output: &Path) -> RunArgs {
        RunArgs {
            input: Some(input.display().to_string()),
            output: Some(output.display().to_string()),
            subjects: None,
            profile: None,
            subject: None,
            imaging_only: false,
            anonymous: false,
        }
    }

    #[tokio::test]
    async fn test_missing_input_is_fatal() {
        let dir = tempdir().unwrap();
        let code = args(&dir.path().join("missing"), &dir.path().join("out"))
            .execute("does-not-exist.toml")
            .await
            .unwrap();
        assert_eq!(code, EXIT_FATAL);
    }

    #[tokio::test]
    async fn test_unknown_profile_is_config_error() {
        let dir = tempdir().unwrap();
        let mut run = args(dir.path(), &dir.path().join("out"));
        run.profile = Some("no_such_profile".to_string());
        let code = run.execute("does-not-exist.toml").await.unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }

    #[tokio::test]
    async fn test_unreadable_subject_list_is_config_error() {
        let dir = tempdir().unwrap();
        let mut run = args(dir.path(), dir.path());
        run.input = None;
        run.output = None;
        run.subjects = Some(dir.path().join("missing.txt").display().to_string());
        let code = run.execute("does-not-exist.toml").await.unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }
}
