//! Logging setup.
//!
//! Everything in the crate logs through `tracing`; binaries and live test
//! harnesses call [`init_logging`] once to install a subscriber. `RUST_LOG`
//! overrides the configured level.

use crate::result::{ProbeError, ProbeResult};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, EnvFilter};

/// Level used when neither config nor `RUST_LOG` set one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Available output formats for the logger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line human output
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
    /// Single-line human output
    Compact,
}

impl LogFormat {
    /// Parse a format name
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `mailprobe=debug`
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Override the level
    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Override the format
    #[must_use]
    pub const fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    fn env_filter(&self) -> ProbeResult<EnvFilter> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.level).map_err(|err| ProbeError::Config {
                message: format!("invalid log level {:?}: {err}", self.level),
            }),
        }
    }
}

/// Install the global tracing subscriber. Logs go to stderr so reports on
/// stdout stay machine-readable.
///
/// # Errors
///
/// Returns a config error when the level directive does not parse. A
/// subscriber that is already installed is left in place.
pub fn init_logging(config: &LoggingConfig) -> ProbeResult<()> {
    let env_filter = config.env_filter()?;
    let builder = fmt::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
    Ok(())
}
