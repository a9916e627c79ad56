use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::import::store::{StoreSettings, MAX_INSERT_BATCH};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub rust_log: String,
    pub import_batch_size: usize,
    pub store_timeout: Duration,
    pub store_max_retries: u32,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .with_context(|| "Required environment variable 'DATABASE_URL' is not set")?;

        let import_batch_size: usize = parse_or(&lookup, "IMPORT_BATCH_SIZE", 50)?;
        if import_batch_size == 0 {
            bail!("IMPORT_BATCH_SIZE must be greater than zero");
        }
        if import_batch_size > MAX_INSERT_BATCH {
            bail!("IMPORT_BATCH_SIZE must be at most {MAX_INSERT_BATCH}, got {import_batch_size}");
        }

        Ok(Config {
            database_url,
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            import_batch_size,
            store_timeout: Duration::from_secs(parse_or(&lookup, "STORE_TIMEOUT_SECS", 15)?),
            store_max_retries: parse_or(&lookup, "STORE_MAX_RETRIES", 3)?,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
        })
    }

    pub fn store_settings(&self) -> StoreSettings {
        StoreSettings {
            timeout: self.store_timeout,
            max_retries: self.store_max_retries,
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}
