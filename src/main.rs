// dicom-deid - DICOM de-identification tool
// Copyright (c) 2025 dicom-deid Contributors
// Licensed under the MIT License

use clap::Parser;
use dicom_deid::cli::{load_config_or_default, Cli, Commands, EXIT_FATAL};
use dicom_deid::config::LoggingConfig;
use dicom_deid::logging::init_logging;
use std::process;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Logging settings come from the configuration file when it loads; command
    // execution reports configuration errors itself
    let (config_level, logging_config) = match load_config_or_default(&cli.config) {
        Ok(config) => (config.application.log_level, config.logging),
        Err(_) => ("info".to_string(), LoggingConfig::default()),
    };
    let log_level = cli.log_level.clone().unwrap_or(config_level);

    let guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(EXIT_FATAL);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "dicom-deid - DICOM de-identification tool"
    );

    let exit_code = match execute_command(&cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            EXIT_FATAL
        }
    };

    drop(guard);
    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Run(args) => args.execute(&cli.config).await,
        Commands::Check(args) => args.execute(&cli.config).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Diff(args) => args.execute().await,
        Commands::Dump(args) => args.execute().await,
        Commands::Init(args) => args.execute().await,
    }
}
