use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use chrono::NaiveTime;

use crate::workflows::bookings::config::DEFAULT_SUPPORT_PHONE;
use crate::workflows::bookings::BookingConfig;

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
    pub booking: BookingConfig,
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
        let log_format = LogFormat::from_str(&env::var("APP_LOG_FORMAT").unwrap_or_default());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            booking: load_booking()?,
        })
    }
}

fn load_booking() -> Result<BookingConfig, ConfigError> {
    let defaults = BookingConfig::default();
    Ok(BookingConfig {
        sms_number: env::var("APP_SMS_NUMBER").unwrap_or(defaults.sms_number),
        support_phone: env::var("APP_SUPPORT_PHONE")
            .unwrap_or_else(|_| DEFAULT_SUPPORT_PHONE.to_string()),
        immediate_minutes: number_var("APP_IMMEDIATE_MINUTES", defaults.immediate_minutes)?,
        cancellation_window_hours: number_var(
            "APP_CANCELLATION_WINDOW_HOURS",
            defaults.cancellation_window_hours,
        )?,
        night_start: time_var("APP_NIGHT_START", defaults.night_start)?,
        night_end: time_var("APP_NIGHT_END", defaults.night_end)?,
    })
}

fn number_var(var: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidNumber { var }),
        Err(_) => Ok(default),
    }
}

fn time_var(var: &'static str, default: NaiveTime) -> Result<NaiveTime, ConfigError> {
    match env::var(var) {
        Ok(raw) => NaiveTime::parse_from_str(raw.trim(), "%H:%M")
            .map_err(|_| ConfigError::InvalidTime { var }),
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

/// Output shape of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { var: &'static str },
    InvalidTime { var: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { var } => {
                write!(f, "{var} must be a non-negative whole number")
            }
            ConfigError::InvalidTime { var } => write!(f, "{var} must be a time formatted HH:MM"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidTime { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for var in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_LOG_FORMAT",
            "APP_SMS_NUMBER",
            "APP_SUPPORT_PHONE",
            "APP_IMMEDIATE_MINUTES",
            "APP_CANCELLATION_WINDOW_HOURS",
            "APP_NIGHT_START",
            "APP_NIGHT_END",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.log_format, LogFormat::Compact);
        assert_eq!(config.booking, BookingConfig::default());
        assert_eq!(config.booking.support_phone, DEFAULT_SUPPORT_PHONE);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn booking_overrides_flow_into_time_policy() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_LOG_FORMAT", "JSON");
        env::set_var("APP_SMS_NUMBER", "+46700000000");
        env::set_var("APP_IMMEDIATE_MINUTES", "10");
        env::set_var("APP_CANCELLATION_WINDOW_HOURS", "48");
        env::set_var("APP_NIGHT_START", "21:30");
        env::set_var("APP_NIGHT_END", "06:00");

        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.telemetry.log_format, LogFormat::Json);
        assert_eq!(config.booking.sms_number, "+46700000000");

        let policy = config.booking.time_policy();
        assert_eq!(policy.immediate_offset, Duration::minutes(10));
        assert_eq!(policy.cancellation_window, Duration::hours(48));
        assert_eq!(
            policy.night_start,
            NaiveTime::from_hms_opt(21, 30, 0).expect("valid time")
        );
        assert_eq!(
            policy.night_end,
            NaiveTime::from_hms_opt(6, 0, 0).expect("valid time")
        );
        reset_env();
    }

    #[test]
    fn rejects_malformed_booking_values() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_CANCELLATION_WINDOW_HOURS", "a day");
        let error = AppConfig::load().expect_err("window must be numeric");
        assert!(matches!(
            error,
            ConfigError::InvalidNumber {
                var: "APP_CANCELLATION_WINDOW_HOURS"
            }
        ));

        reset_env();
        env::set_var("APP_NIGHT_START", "10pm");
        let error = AppConfig::load().expect_err("night start must be HH:MM");
        assert_eq!(
            error.to_string(),
            "APP_NIGHT_START must be a time formatted HH:MM"
        );
        reset_env();
    }
}
