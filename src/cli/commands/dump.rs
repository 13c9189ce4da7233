//! Dump command implementation
//!
//! This module implements the `dump` command, which prints the attribute tree of a
//! file, one element per line.

use crate::cli::EXIT_OK;
use crate::io::{JsonModel, TreeLoader};
use clap::Args;
use std::path::Path;

/// Arguments for the dump command
#[derive(Args, Debug)]
pub struct DumpArgs {
    /// File to print
    pub input: String,

    /// Write the header to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}

impl DumpArgs {
    /// Execute the dump command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        let tree = JsonModel::new().load(Path::new(&self.input))?;
        let header = tree.to_string();

        match &self.output {
            Some(path) => {
                std::fs::write(path, header)?;
                tracing::info!(output = %path, elements = tree.element_count(), "Header saved");
            }
            None => print!("{header}"),
        }
        Ok(EXIT_OK)
    }
}
