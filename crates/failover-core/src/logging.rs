//! Logging setup
//!
//! The core itself only emits `tracing` events. Applications embedding it can
//! install a subscriber with [`setup_logging`], usually from
//! [`FailoverConfig::logging_config`](crate::config::FailoverConfig::logging_config).

use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogSettings;
use crate::error::{FailoverError, Result};

/// Name reported when the subscriber comes up
pub const APP_NAME: &str = "rvoip-failover";

/// Resolved subscriber settings
///
/// Usually built from the `[logging]` section of
/// [`FailoverConfig`](crate::config::FailoverConfig).
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    pub level: Level,
    pub json: bool,
    /// Include source file and line in each event
    pub file_info: bool,
    /// Log span enter/exit
    pub spans: bool,
}

impl LoggingConfig {
    /// Plain text output at `level`
    pub fn new(level: Level) -> Self {
        Self {
            level,
            json: false,
            file_info: false,
            spans: false,
        }
    }

    pub fn from_settings(settings: &LogSettings) -> Result<Self> {
        Ok(Self {
            level: parse_log_level(&settings.level)?,
            json: settings.json,
            file_info: settings.file_info,
            spans: settings.spans,
        })
    }
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` directives are honoured on top of the configured level. Fails if
/// a global subscriber is already installed.
pub fn setup_logging(config: LoggingConfig) -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive(LevelFilter::from_level(config.level).into());

    let span_events = if config.spans {
        FmtSpan::ACTIVE
    } else {
        FmtSpan::NONE
    };

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_span_events(span_events)
        .with_file(config.file_info)
        .with_line_number(config.file_info);

    let installed = if config.json {
        subscriber.with_writer(std::io::stdout).json().try_init()
    } else {
        subscriber.try_init()
    };
    installed.map_err(|e| FailoverError::logging(e.to_string()))?;

    tracing::info!(app = APP_NAME, level = %config.level, "Logging initialised");
    Ok(())
}

/// Parse a log level from a string
pub fn parse_log_level(level: &str) -> Result<Level> {
    Level::from_str(level.trim()).map_err(|_| FailoverError::config(format!("Invalid log level: {}", level)))
}
