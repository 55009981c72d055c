//! Tracing bootstrap for the evaluation tracker.
//!
//! Filter precedence: `RUST_LOG`, then `EVAL_LOG_LEVEL`, then an
//! environment-specific default. Production emits JSON lines for log
//! shipping; development and test use the compact human formatter.

use crate::config::{AppEnvironment, TelemetryConfig};
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
pub enum TelemetryError {
    EnvFilter { value: String, source: ParseError },
    Subscriber(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::EnvFilter { value, .. } => {
                write!(
                    f,
                    "invalid log level/filter '{}': unable to build EnvFilter",
                    value
                )
            }
            TelemetryError::Subscriber(err) => write!(f, "telemetry error: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::EnvFilter { source, .. } => Some(source),
            TelemetryError::Subscriber(err) => Some(&**err),
        }
    }
}

/// Fallback directives when neither `RUST_LOG` nor `EVAL_LOG_LEVEL` is set.
/// Development keeps generation-run logging from this crate at `debug`;
/// test runs stay quiet so report assertions are not drowned out.
fn default_directives(environment: AppEnvironment) -> &'static str {
    match environment {
        AppEnvironment::Development => "info,vendor_eval=debug",
        AppEnvironment::Test => "warn",
        AppEnvironment::Production => "info",
    }
}

fn build_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directives = config
        .log_level
        .clone()
        .unwrap_or_else(|| default_directives(config.environment).to_string());
    EnvFilter::try_new(&directives).map_err(|source| TelemetryError::EnvFilter {
        value: directives,
        source,
    })
}

pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(config)?)
        .with_ansi(false);

    if config.environment.is_production() {
        builder
            .json()
            .try_init()
            .map_err(TelemetryError::Subscriber)
    } else {
        builder
            .with_target(false)
            .compact()
            .try_init()
            .map_err(TelemetryError::Subscriber)
    }
}
