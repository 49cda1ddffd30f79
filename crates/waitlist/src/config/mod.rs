use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::waitlist::{CountScope, PositionReporting, WaitlistConfig, WaitlistConfigError};

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

/// Top-level configuration for the waitlist service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub auth: AuthConfig,
    pub waitlist: WaitlistConfig,
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
        let log_format = match env::var("APP_LOG_FORMAT") {
            Ok(value) => LogFormat::parse(&value).ok_or(ConfigError::InvalidChoice {
                name: "APP_LOG_FORMAT",
                value,
            })?,
            Err(_) => LogFormat::Compact,
        };

        let admin_token = env::var("WAITLIST_ADMIN_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            auth: AuthConfig { admin_token },
            waitlist: load_waitlist()?,
        })
    }
}

fn load_waitlist() -> Result<WaitlistConfig, ConfigError> {
    let defaults = WaitlistConfig::default();

    let config = WaitlistConfig {
        require_admin: flag("WAITLIST_REQUIRE_ADMIN", defaults.require_admin)?,
        max_entries: match env::var("WAITLIST_MAX_ENTRIES") {
            Ok(value) => value
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber {
                    name: "WAITLIST_MAX_ENTRIES",
                    value,
                })?,
            Err(_) => defaults.max_entries,
        },
        enabled: flag("WAITLIST_ENABLED", defaults.enabled)?,
        allow_status_check: flag("WAITLIST_ALLOW_STATUS_CHECK", defaults.allow_status_check)?,
        show_position: flag("WAITLIST_SHOW_POSITION", defaults.show_position)?,
        invite_on_approve: flag("WAITLIST_INVITE_ON_APPROVE", defaults.invite_on_approve)?,
        renumber_positions: flag("WAITLIST_RENUMBER_POSITIONS", defaults.renumber_positions)?,
        position_scope: choice(
            "WAITLIST_POSITION_SCOPE",
            CountScope::parse,
            defaults.position_scope,
        )?,
        capacity_scope: choice(
            "WAITLIST_CAPACITY_SCOPE",
            CountScope::parse,
            defaults.capacity_scope,
        )?,
        position_reporting: choice(
            "WAITLIST_POSITION_REPORTING",
            PositionReporting::parse,
            defaults.position_reporting,
        )?,
    };

    config.validate().map_err(ConfigError::Waitlist)
}

fn flag(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    let Ok(value) = env::var(name) else {
        return Ok(default);
    };

    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag { name, value }),
    }
}

fn choice<T>(
    name: &'static str,
    parse: fn(&str) -> Option<T>,
    default: T,
) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => parse(&value).ok_or(ConfigError::InvalidChoice { name, value }),
        Err(_) => Ok(default),
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Full,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Some(Self::Compact),
            "full" | "pretty" => Some(Self::Full),
            _ => None,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Admin credential accepted by the bundled session middleware. `None` disables it.
#[derive(Clone, Default)]
pub struct AuthConfig {
    pub admin_token: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("admin_token", &self.admin_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidFlag { name: &'static str, value: String },
    InvalidNumber { name: &'static str, value: String },
    InvalidChoice { name: &'static str, value: String },
    Waitlist(WaitlistConfigError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{name} must be true or false, got '{value}'")
            }
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{name} must be a non-negative integer, got '{value}'")
            }
            ConfigError::InvalidChoice { name, value } => {
                write!(f, "{name} has unsupported value '{value}'")
            }
            ConfigError::Waitlist(err) => write!(f, "invalid waitlist settings: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::Waitlist(err) => Some(err),
            ConfigError::InvalidPort
            | ConfigError::InvalidFlag { .. }
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidChoice { .. } => None,
        }
    }
}
