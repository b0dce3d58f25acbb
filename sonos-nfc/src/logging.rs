//! Logging setup
//!
//! Three output formats for the process-wide tracing subscriber. The filter is
//! taken from `SONOS_NFC_LOG_LEVEL`, then `RUST_LOG`, then the configured
//! level.

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Environment variable that overrides the log filter
pub const LOG_LEVEL_ENV: &str = "SONOS_NFC_LOG_LEVEL";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// One line per event on stderr
    #[default]
    Compact,
    /// Multi-line events with file and line, for debugging
    Pretty,
    /// One JSON object per line, for service managers
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },
}

/// Install the global subscriber; call once, before anything logs
pub fn init_logging(format: LogFormat, default_level: &str) -> Result<(), LoggingError> {
    let filter = create_env_filter(default_level)?;
    let registry = Registry::default().with(filter);

    let result = match format {
        LogFormat::Compact => registry
            .with(fmt::layer().with_target(false).compact())
            .try_init(),
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .pretty()
                    .with_thread_names(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_current_span(false))
            .try_init(),
    };

    result.map_err(|e| LoggingError::TracingInit(e.to_string()))
}

fn create_env_filter(default_level: &str) -> Result<EnvFilter, LoggingError> {
    let directives = std::env::var(LOG_LEVEL_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_level.to_string());
    parse_filter(&directives)
}

fn parse_filter(directives: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(directives).map_err(|e| LoggingError::InvalidFilter {
        filter: directives.to_string(),
        reason: e.to_string(),
    })
}
