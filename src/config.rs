//! Runtime configuration.
//!
//! Resolved once at process startup and passed into the store and the HTTP server, so request
//! handling never reads environment variables.

use std::env;
use std::time::Duration;

use crate::error::{HospitalError, HospitalResult};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_POOL_SIZE: u32 = 8;
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
pub const MEMORY_DATABASE_URL: &str = ":memory:";

/// Connection settings for the SQLite store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    /// How long a write waits for SQLite's lock before the request fails as busy.
    pub busy_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>, pool_size: u32, busy_timeout: Duration) -> HospitalResult<Self> {
        let url = url.into();
        if url.trim().is_empty() {
            return Err(HospitalError::Config("DATABASE_URL cannot be empty".into()));
        }
        if pool_size == 0 {
            return Err(HospitalError::Config("DB_POOL_SIZE must be at least 1".into()));
        }

        // Every connection to :memory: opens its own private database.
        let pool_size = if url == MEMORY_DATABASE_URL { 1 } else { pool_size };

        Ok(Self {
            url,
            pool_size,
            busy_timeout,
        })
    }

    pub fn is_memory(&self) -> bool {
        self.url == MEMORY_DATABASE_URL
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database: DatabaseConfig,
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// # Environment Variables
    /// - `WARDKEEPER_ADDR`: HTTP bind address (default: "127.0.0.1:8080")
    /// - `DATABASE_URL`: SQLite database path (required)
    /// - `DB_POOL_SIZE`: maximum pooled connections (default: 8)
    /// - `DB_BUSY_TIMEOUT_MS`: write lock wait in milliseconds (default: 5000)
    pub fn from_env() -> HospitalResult<Self> {
        Self::from_values(
            env::var("WARDKEEPER_ADDR").ok(),
            env::var("DATABASE_URL").ok(),
            env::var("DB_POOL_SIZE").ok(),
            env::var("DB_BUSY_TIMEOUT_MS").ok(),
        )
    }

    /// Build configuration from optional raw values. Blank values fall back to defaults.
    pub fn from_values(
        bind_addr: Option<String>,
        database_url: Option<String>,
        pool_size: Option<String>,
        busy_timeout_ms: Option<String>,
    ) -> HospitalResult<Self> {
        let bind_addr = non_blank(bind_addr).unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let database_url = non_blank(database_url)
            .ok_or_else(|| HospitalError::Config("DATABASE_URL must be set".into()))?;
        let pool_size = parse_or(pool_size, "DB_POOL_SIZE", DEFAULT_POOL_SIZE)?;
        let busy_timeout_ms = parse_or(busy_timeout_ms, "DB_BUSY_TIMEOUT_MS", DEFAULT_BUSY_TIMEOUT_MS)?;

        Ok(Self {
            bind_addr,
            database: DatabaseConfig::new(
                database_url,
                pool_size,
                Duration::from_millis(busy_timeout_ms),
            )?,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, name: &str, default: T) -> HospitalResult<T> {
    match non_blank(value) {
        Some(raw) => raw
            .parse()
            .map_err(|_| HospitalError::Config(format!("{name} is not a valid number: {raw}"))),
        None => Ok(default),
    }
}
