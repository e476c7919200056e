use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::alerts::{ApproachSelection, GeneratorConfig, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};

pub const DEFAULT_NASA_API_BASE: &str = "https://api.nasa.gov/neo/rest/v1";
pub const DEFAULT_NASA_API_KEY: &str = "DEMO_KEY";
pub const DEFAULT_FEED_TIMEOUT_SECS: u64 = 15;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub feed: FeedConfig,
    pub alerts: GeneratorConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let base_url =
            env::var("NASA_API_BASE").unwrap_or_else(|_| DEFAULT_NASA_API_BASE.to_string());
        let api_key = env::var("NASA_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_NASA_API_KEY.to_string());
        let timeout_secs = match env::var("NASA_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidTimeout)?,
            Err(_) => DEFAULT_FEED_TIMEOUT_SECS,
        };

        let window_days = match env::var("ALERT_WINDOW_DAYS") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|days| (0..=MAX_WINDOW_DAYS).contains(days))
                .ok_or(ConfigError::InvalidWindow)?,
            Err(_) => DEFAULT_WINDOW_DAYS,
        };
        let selection = match env::var("ALERT_APPROACH_SELECTION") {
            Ok(raw) => raw
                .parse::<ApproachSelection>()
                .map_err(|_| ConfigError::InvalidSelection { value: raw })?,
            Err(_) => ApproachSelection::default(),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            feed: FeedConfig {
                base_url,
                api_key,
                timeout_secs,
            },
            alerts: GeneratorConfig {
                window_days,
                selection,
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    /// Colored output, enabled only for local development.
    pub ansi: bool,
}

/// NeoWs endpoint and credentials.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NASA_API_BASE.to_string(),
            api_key: DEFAULT_NASA_API_KEY.to_string(),
            timeout_secs: DEFAULT_FEED_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTimeout,
    InvalidWindow,
    InvalidSelection { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTimeout => {
                write!(f, "NASA_TIMEOUT_SECS must be a positive number of seconds")
            }
            ConfigError::InvalidWindow => {
                write!(
                    f,
                    "ALERT_WINDOW_DAYS must be between 0 and {} days",
                    MAX_WINDOW_DAYS
                )
            }
            ConfigError::InvalidSelection { value } => write!(
                f,
                "ALERT_APPROACH_SELECTION must be 'first' or 'earliest', got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidTimeout
            | ConfigError::InvalidWindow
            | ConfigError::InvalidSelection { .. } => None,
        }
    }
}
