//! Hub configuration parsed from environment variables.
//!
//! ERROR HANDLING
//! ==============
//! `DATABASE_URL` is required. The two scheduler periods and the two
//! websocket timeouts must be positive integers when set. Everything else
//! falls back to its default when missing or unparsable.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 5001;
pub const DEFAULT_SEND_DELAY_MS: u64 = 250;
pub const DEFAULT_DECAY_INTERVAL_MS: u64 = 10_000;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_OUTBOUND_BUFFER: usize = 64;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_STATIC_DIR: &str = "static";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{var} must be a positive integer, got {value:?}")]
    NotPositive { var: &'static str, value: String },
}

/// Per-connection limits handed to every websocket session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub idle_timeout: Duration,
    pub write_timeout: Duration,
    pub outbound_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            write_timeout: Duration::from_millis(DEFAULT_WRITE_TIMEOUT_MS),
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub flush_period: Duration,
    pub decay_period: Duration,
    pub db_max_connections: u32,
    pub static_dir: PathBuf,
    pub session: SessionConfig,
}

impl Config {
    /// Build typed config from the process environment.
    ///
    /// Required:
    /// - `DATABASE_URL`
    ///
    /// Optional:
    /// - `PORT`: default 5001
    /// - `WS_SEND_DELAY`: flush period in ms, default 250
    /// - `DECAY_INTERVAL_MS`: default 10000
    /// - `WS_IDLE_TIMEOUT_SECS`: default 300
    /// - `WS_WRITE_TIMEOUT_MS`: default 5000
    /// - `WS_OUTBOUND_BUFFER`: default 64
    /// - `DB_MAX_CONNECTIONS`: default 5
    /// - `STATIC_DIR`: default `static`
    ///
    /// # Errors
    ///
    /// See [`Config::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `Missing` without `DATABASE_URL` and `NotPositive` when a
    /// scheduler period or websocket timeout is zero, negative, or not an
    /// integer.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let session = SessionConfig {
            idle_timeout: Duration::from_secs(parse_positive(&lookup, "WS_IDLE_TIMEOUT_SECS", DEFAULT_IDLE_TIMEOUT_SECS)?),
            write_timeout: Duration::from_millis(parse_positive(&lookup, "WS_WRITE_TIMEOUT_MS", DEFAULT_WRITE_TIMEOUT_MS)?),
            outbound_buffer: parse_or(&lookup, "WS_OUTBOUND_BUFFER", DEFAULT_OUTBOUND_BUFFER).max(1),
        };

        Ok(Self {
            database_url,
            port: parse_or(&lookup, "PORT", DEFAULT_PORT),
            flush_period: Duration::from_millis(parse_positive(&lookup, "WS_SEND_DELAY", DEFAULT_SEND_DELAY_MS)?),
            decay_period: Duration::from_millis(parse_positive(&lookup, "DECAY_INTERVAL_MS", DEFAULT_DECAY_INTERVAL_MS)?),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS),
            static_dir: lookup("STATIC_DIR").map_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR), PathBuf::from),
            session,
        })
    }
}

fn parse_or<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_positive(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(default);
    };
    match raw.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::NotPositive { var, value: raw }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
