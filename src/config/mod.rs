//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::game::chat::DEFAULT_BLOCKLIST;

/// Log line format
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Server binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    pub log_format: LogFormat,
    /// Allowed client origins for CORS, `*` for any
    pub client_origin: String,

    /// Seats per arena room
    pub max_clients: usize,
    /// Phase + physics tick period
    pub sim_tick_ms: u64,
    /// Centrifuge tick period
    pub centrifuge_tick_ms: u64,
    /// Centrifuge angular rate in revolutions per minute
    pub centrifuge_rpm: f32,
    pub quiz_interval_secs: u64,

    /// Chat lines are cut to this many characters before moderation
    pub chat_max_chars: usize,
    pub chat_blocklist: Vec<String>,

    /// Inbound WebSocket messages allowed per connection per second
    pub input_rate_limit: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Build configuration from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Hosting platforms provide PORT, fall back to SERVER_ADDR or default
        let server_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port.trim()),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:2567".to_string()),
        };

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        let chat_blocklist = match lookup("CHAT_BLOCKLIST") {
            Some(list) => list
                .split(',')
                .map(|w| w.trim().to_string())
                .filter(|w| !w.is_empty())
                .collect(),
            None => DEFAULT_BLOCKLIST.iter().map(|w| w.to_string()).collect(),
        };

        let config = Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format,
            client_origin: lookup("CLIENT_ORIGIN").unwrap_or_else(|| "*".to_string()),

            max_clients: parse_or(&lookup, "MAX_CLIENTS", 4)?,
            sim_tick_ms: parse_or(&lookup, "SIM_TICK_MS", 100)?,
            centrifuge_tick_ms: parse_or(&lookup, "CENTRIFUGE_TICK_MS", 16)?,
            centrifuge_rpm: parse_or(&lookup, "CENTRIFUGE_RPM", 3.0)?,
            quiz_interval_secs: parse_or(&lookup, "QUIZ_INTERVAL_SECS", 300)?,

            chat_max_chars: parse_or(&lookup, "CHAT_MAX_CHARS", 18)?,
            chat_blocklist,

            input_rate_limit: parse_or(&lookup, "INPUT_RATE_LIMIT", 60)?,
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        // Zero periods would make tokio intervals panic
        if self.max_clients == 0 {
            return Err(ConfigError::OutOfRange("MAX_CLIENTS"));
        }
        if self.sim_tick_ms == 0 {
            return Err(ConfigError::OutOfRange("SIM_TICK_MS"));
        }
        if self.centrifuge_tick_ms == 0 {
            return Err(ConfigError::OutOfRange("CENTRIFUGE_TICK_MS"));
        }
        if self.quiz_interval_secs == 0 {
            return Err(ConfigError::OutOfRange("QUIZ_INTERVAL_SECS"));
        }
        if !self.centrifuge_rpm.is_finite() {
            return Err(ConfigError::OutOfRange("CENTRIFUGE_RPM"));
        }
        Ok(())
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("Value out of range for {0}")]
    OutOfRange(&'static str),

    #[error("Invalid server address format")]
    InvalidAddress,
}
