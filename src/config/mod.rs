use std::env;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Self::Production
    }
}

/// Environment-driven settings for the evaluation tracker.
///
/// Everything is read from `EVAL_*` variables (a `.env` file is honored):
/// `EVAL_ENV`, `EVAL_HOST`, `EVAL_PORT`, `EVAL_LOG_LEVEL`, and
/// `EVAL_DATASET` for a seed dataset to preload at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub dataset: DatasetConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::parse(&env_or("EVAL_ENV", "development"));

        let port_raw = env_or("EVAL_PORT", "3000");
        let port = port_raw
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort { value: port_raw })?;
        let server = ServerConfig {
            host: env_or("EVAL_HOST", "127.0.0.1"),
            port,
        };

        let telemetry = TelemetryConfig {
            environment,
            log_level: env::var("EVAL_LOG_LEVEL").ok(),
        };

        let dataset = DatasetConfig {
            seed_path: env::var("EVAL_DATASET").ok().map(PathBuf::from),
        };

        Ok(Self {
            environment,
            server,
            telemetry,
            dataset,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Resolve the configured host/port pair. Hostnames (including
    /// `localhost`) go through the system resolver; the first address wins.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let mut addrs = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|source| ConfigError::HostResolution {
                host: self.host.clone(),
                source,
            })?;

        addrs.next().ok_or_else(|| ConfigError::HostUnresolvable {
            host: self.host.clone(),
        })
    }
}

/// Tracing controls. When no explicit filter is configured the environment
/// picks the default (see `telemetry::init`): verbose crate-level logging in
/// development, warnings only under test, JSON output in production.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub environment: AppEnvironment,
    pub log_level: Option<String>,
}

/// Seed data applied to the in-memory store at startup.
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    pub seed_path: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("EVAL_PORT value '{value}' is not a valid port number")]
    InvalidPort { value: String },
    #[error("EVAL_HOST '{host}' could not be resolved")]
    HostResolution {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("EVAL_HOST '{host}' resolved to no addresses")]
    HostUnresolvable { host: String },
}
