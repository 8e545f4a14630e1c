use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::apply_security_headers;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
const DEFAULT_QR_SERVICE_URL: &str = "https://api.qrserver.com/v1/create-qr-code/?size=200x200";
const DEFAULT_BOOKING_CODE_ATTEMPTS: u32 = 5;
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid value '{value}' for {key}")]
    Invalid { key: &'static str, value: String },
}

/// How admin status overrides are checked against the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusPolicy {
    /// Any status may be written.
    #[default]
    Unrestricted,
    /// Only moves allowed by [`crate::models::BookingStatus::can_transition_to`].
    ForwardOnly,
}

impl FromStr for StatusPolicy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "unrestricted" => Ok(StatusPolicy::Unrestricted),
            "forward_only" => Ok(StatusPolicy::ForwardOnly),
            other => Err(other.to_string()),
        }
    }
}

/// Business settings shared by the booking services.
#[derive(Debug, Clone)]
pub struct BookingRules {
    pub status_policy: StatusPolicy,
    pub booking_code_attempts: u32,
    pub qr_service_url: String,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            status_policy: StatusPolicy::default(),
            booking_code_attempts: DEFAULT_BOOKING_CODE_ATTEMPTS,
            qr_service_url: DEFAULT_QR_SERVICE_URL.to_string(),
        }
    }
}

/// Settings for the HTTP middleware stack.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub allowed_origins: Vec<String>,
    pub include_hsts: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            allowed_origins: split_origins(DEFAULT_ALLOWED_ORIGINS),
            include_hsts: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: IpAddr,
    pub port: u16,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
    pub log_level: String,
    pub http: HttpConfig,
    pub rules: BookingRules,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let is_production = lookup("RUST_ENV")
            .map(|v| v.to_lowercase() == "production")
            .unwrap_or(false);

        let allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|v| split_origins(&v))
            .unwrap_or_else(|| split_origins(DEFAULT_ALLOWED_ORIGINS));

        let acquire_secs: u64 = parse_or(
            &lookup,
            "DATABASE_ACQUIRE_TIMEOUT_SECS",
            DEFAULT_ACQUIRE_TIMEOUT_SECS,
        )?;

        let booking_code_attempts: u32 =
            parse_or(&lookup, "BOOKING_CODE_ATTEMPTS", DEFAULT_BOOKING_CODE_ATTEMPTS)?;
        if booking_code_attempts == 0 {
            return Err(ConfigError::Invalid {
                key: "BOOKING_CODE_ATTEMPTS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            database_url,
            host: parse_or(&lookup, "HOST", IpAddr::from([0, 0, 0, 0]))?,
            port: parse_or(&lookup, "PORT", DEFAULT_PORT)?,
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            acquire_timeout: Duration::from_secs(acquire_secs),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            http: HttpConfig {
                allowed_origins,
                include_hsts: is_production,
            },
            rules: BookingRules {
                status_policy: parse_or(&lookup, "BOOKING_STATUS_POLICY", StatusPolicy::default())?,
                booking_code_attempts,
                qr_service_url: lookup("QR_SERVICE_URL")
                    .unwrap_or_else(|| DEFAULT_QR_SERVICE_URL.to_string()),
            },
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) if value.trim().is_empty() => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn split_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
