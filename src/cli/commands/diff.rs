//! Diff command implementation
//!
//! This module implements the `diff` command, which lists the tag differences
//! between two files, typically an input and its de-identified output.

use crate::cli::{EXIT_FATAL, EXIT_OK};
use crate::deidentification::TagDiff;
use crate::io::{JsonModel, TreeLoader};
use clap::Args;
use std::path::Path;

/// Arguments for the diff command
#[derive(Args, Debug)]
pub struct DiffArgs {
    /// First file (dcm1)
    pub first: String,

    /// Second file (dcm2)
    pub second: String,

    /// Write the report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Emit the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl DiffArgs {
    /// Execute the diff command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        let model = JsonModel::new();
        let first = model.load(Path::new(&self.first))?;
        let second = model.load(Path::new(&self.second))?;

        let diff = TagDiff::between(&first, &second);
        tracing::debug!(
            only_in_first = diff.only_in_first.len(),
            only_in_second = diff.only_in_second.len(),
            modified = diff.modified.len(),
            "Computed tag difference"
        );

        let report = if self.json {
            diff.format_json()?
        } else {
            diff.format_text()
        };

        match &self.output {
            Some(path) => {
                if let Err(e) = std::fs::write(path, report) {
                    eprintln!("❌ Failed to write report: {e}");
                    return Ok(EXIT_FATAL);
                }
                println!("✅ Report written to {path}");
            }
            None => print!("{report}"),
        }
        Ok(EXIT_OK)
    }
}
