//! Structured logging setup using tracing
//!
//! Console output is always on and goes to stderr, so `dump` and `diff` keep stdout
//! for their reports. A JSON file layer with rotation is added when
//! `logging.local_enabled` is set.

use crate::config::LoggingConfig;
use crate::domain::errors::{ConfigError, DeidError};
use crate::domain::Result;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::Registry;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// File name of the JSON log inside `logging.local_path`
pub const LOG_FILE_NAME: &str = "dicom-deid.log";

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps the file writer alive; dropping it flushes pending lines
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Installs the global subscriber
///
/// `RUST_LOG` takes precedence over `level` when set. Can only succeed once per
/// process.
///
/// ```no_run
/// use dicom_deid::logging::init_logging;
/// use dicom_deid::config::LoggingConfig;
///
/// let config = LoggingConfig::default();
/// let _guard = init_logging("info", &config).expect("Failed to initialize logging");
/// ```
pub fn init_logging(level: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    let level = parse_log_level(level)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dicom_deid={level}")));

    let console: BoxedLayer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(filter.clone())
        .boxed();
    let mut layers = vec![console];

    let file_guard = match config.local_enabled {
        true => {
            let (layer, guard) = json_file_layer(config, filter)?;
            layers.push(layer);
            Some(guard)
        }
        false => None,
    };

    tracing_subscriber::registry().with(layers).init();

    tracing::debug!(
        level = %level,
        local_enabled = config.local_enabled,
        local_path = %config.local_path,
        "Logging initialized"
    );
    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn json_file_layer(
    config: &LoggingConfig,
    filter: EnvFilter,
) -> Result<(BoxedLayer, WorkerGuard)> {
    std::fs::create_dir_all(&config.local_path).map_err(|e| {
        DeidError::Config(ConfigError::Invalid(format!(
            "Failed to create log directory {}: {e}",
            config.local_path
        )))
    })?;

    let appender = RollingFileAppender::new(
        rotation(&config.local_rotation),
        &config.local_path,
        LOG_FILE_NAME,
    );
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = tracing_subscriber::fmt::layer()
        .json()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(writer)
        .with_filter(filter)
        .boxed();
    Ok((layer, guard))
}

/// Rotation policy; values other than `hourly` and `never` rotate daily
fn rotation(name: &str) -> Rotation {
    match name {
        "hourly" => Rotation::HOURLY,
        "never" => Rotation::NEVER,
        _ => Rotation::DAILY,
    }
}

fn parse_log_level(name: &str) -> Result<Level> {
    const LEVELS: [(&str, Level); 5] = [
        ("trace", Level::TRACE),
        ("debug", Level::DEBUG),
        ("info", Level::INFO),
        ("warn", Level::WARN),
        ("error", Level::ERROR),
    ];
    LEVELS
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name.trim()))
        .map(|(_, level)| *level)
        .ok_or_else(|| {
            DeidError::Config(ConfigError::Invalid(format!(
                "Invalid log level '{name}'. Must be one of: trace, debug, info, warn, error"
            )))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("trace", Level::TRACE)]
    #[test_case("Debug", Level::DEBUG)]
    #[test_case("INFO", Level::INFO)]
    #[test_case(" warn ", Level::WARN)]
    #[test_case("error", Level::ERROR)]
    fn test_parse_log_level(name: &str, expected: Level) {
        assert_eq!(parse_log_level(name).unwrap(), expected);
    }

    #[test_case("verbose")]
    #[test_case("")]
    fn test_parse_log_level_invalid(name: &str) {
        let err = parse_log_level(name).unwrap_err();
        assert!(err.to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_rotation_names() {
        assert_eq!(rotation("hourly"), Rotation::HOURLY);
        assert_eq!(rotation("never"), Rotation::NEVER);
        assert_eq!(rotation("daily"), Rotation::DAILY);
    }

    #[test]
    fn test_init_logging_rejects_bad_level() {
        let config = LoggingConfig::default();
        assert!(init_logging("loud", &config).is_err());
    }
}
