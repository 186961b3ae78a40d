//! Subscriber setup and job spans
//!
//! Console output is human-readable and goes to stderr so progress lines on
//! stdout stay clean. The optional file log is JSON, one object per event,
//! and carries the fields of the enclosing job span (`job_id`, `job_name`,
//! `job_kind`) on every event emitted while a job runs, including events from
//! batch workers.

use crate::config::LoggingConfig;
use crate::core::dispatch::BatcherConfig;
use crate::domain::{DatamoveError, Result};
use tracing::{Level, Span, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// File name of the rolling job log inside `local_path`
pub const LOG_FILE_NAME: &str = "datamove.log";

/// Keeps the background file writer alive; dropping it flushes pending events
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Span every event of one job is recorded under
///
/// # Example
///
/// ```
/// use datamove::core::dispatch::BatcherConfig;
/// use datamove::logging::job_span;
///
/// let config = BatcherConfig {
///     job_name: Some("nightly".to_string()),
///     ..BatcherConfig::default()
/// };
/// let span = job_span(&config, "export-to-zip");
/// let _entered = span.enter();
/// tracing::info!("inside the job");
/// ```
pub fn job_span(config: &BatcherConfig, job_kind: &str) -> Span {
    tracing::info_span!(
        "job",
        job_id = %config.job_id,
        job_name = config.job_name.as_deref().unwrap_or(""),
        job_kind = job_kind,
    )
}

/// Install the global subscriber
///
/// `log_level` applies to this crate unless `RUST_LOG` is set. The file
/// layer is added when `config.local_enabled` is true.
///
/// # Errors
///
/// Returns a configuration error for an unknown level or rotation, or when
/// the log directory cannot be created.
pub fn init_logging(log_level: &str, config: &LoggingConfig) -> Result<LoggingGuard> {
    let level = parse_log_level(log_level)?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("datamove={level}")));

    let mut layers = vec![tracing_subscriber::fmt::layer()
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(filter.clone())
        .boxed()];

    let file_guard = if config.local_enabled {
        let rotation = parse_rotation(&config.local_rotation)?;
        std::fs::create_dir_all(&config.local_path).map_err(|e| {
            DatamoveError::Configuration(format!(
                "Failed to create log directory {}: {e}",
                config.local_path
            ))
        })?;
        let appender = RollingFileAppender::new(rotation, &config.local_path, LOG_FILE_NAME);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        layers.push(json_layer(writer).with_filter(filter).boxed());
        Some(guard)
    } else {
        None
    };

    tracing_subscriber::registry().with(layers).init();

    tracing::debug!(
        level = %level,
        file_log = config.local_enabled,
        path = %config.local_path,
        "Logging initialized"
    );

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// JSON event layer flattening the current job span into each event
fn json_layer<S, W>(writer: W) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(false)
        .with_thread_names(true)
        .with_writer(writer)
}

fn parse_rotation(rotation: &str) -> Result<Rotation> {
    match rotation {
        "daily" => Ok(Rotation::DAILY),
        "hourly" => Ok(Rotation::HOURLY),
        "never" => Ok(Rotation::NEVER),
        other => Err(DatamoveError::Configuration(format!(
            "Invalid log rotation: {other}. Must be one of: daily, hourly, never"
        ))),
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => Err(DatamoveError::Configuration(format!(
            "Invalid log level: {level}. Must be one of: trace, debug, info, warn, error"
        ))),
    }
}
