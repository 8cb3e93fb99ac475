//! Logging setup for applications embedding the grouping engine
//!
//! The engine itself only emits `tracing` events. Applications choose how
//! they are rendered; terminal UIs typically want no output at all.

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Logging mode for different use cases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// No output
    Silent,
    /// Compact stderr output
    Development,
    /// Verbose diagnostics with source locations
    Debug,
}

/// Logging configuration error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Invalid environment variable: {0}")]
    InvalidEnv(String),
}

/// Initialize logging with the specified mode
///
/// # Environment Variables
///
/// - `GROUPING_LOG_LEVEL`: Override the filter (e.g. `grouping_state=debug`)
/// - `RUST_LOG`: Used when `GROUPING_LOG_LEVEL` is not set
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => {
            let filter = create_env_filter("info")?;

            Registry::default()
                .with(
                    fmt::layer()
                        .with_target(false)
                        .with_thread_ids(false)
                        .with_file(false)
                        .with_line_number(false)
                        .compact(),
                )
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
        LoggingMode::Debug => {
            let filter = create_env_filter("debug")?;

            Registry::default()
                .with(
                    fmt::layer()
                        .pretty()
                        .with_thread_ids(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .with(filter)
                .try_init()
                .map_err(|e| LoggingError::TracingInit(e.to_string()))
        }
    }
}

/// Initialize logging from `GROUPING_LOG_MODE`
///
/// Accepts "silent", "development" or "debug"; anything else is an error,
/// an unset variable means silent.
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    init_logging(mode_from_env(std::env::var("GROUPING_LOG_MODE").ok().as_deref())?)
}

fn mode_from_env(value: Option<&str>) -> Result<LoggingMode, LoggingError> {
    match value {
        None | Some("") | Some("silent") => Ok(LoggingMode::Silent),
        Some("development") => Ok(LoggingMode::Development),
        Some("debug") => Ok(LoggingMode::Debug),
        Some(other) => Err(LoggingError::InvalidEnv(format!("GROUPING_LOG_MODE={}", other))),
    }
}

/// Filter from `GROUPING_LOG_LEVEL`, then `RUST_LOG`, then the default level
fn create_env_filter(default_level: &str) -> Result<EnvFilter, LoggingError> {
    let directives = std::env::var("GROUPING_LOG_LEVEL")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_level.to_string());

    EnvFilter::try_new(&directives)
        .map_err(|e| LoggingError::InvalidEnv(format!("{}: {}", directives, e)))
}

/// Check if a global subscriber has been installed
pub fn is_initialized() -> bool {
    tracing::dispatcher::has_been_set()
}

/// Same as `init_logging(LoggingMode::Silent)`
pub fn init_silent() -> Result<(), LoggingError> {
    init_logging(LoggingMode::Silent)
}
