//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing.
//! Sensitive values wrapped in secrecy::SecretString to prevent log leaks.
//! What to search for lives in the targets file, see [`targets`].

pub mod secrets;
pub mod targets;

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::lookup::carfax_checks::{DEFAULT_BASE_URL, LookupConfig};
use secrecy::{ExposeSecret, SecretString};

pub const DEFAULT_BOT_NAME: &str = "rapidapi_carfax-checks";

#[derive(Debug)]
pub struct Config {
    pub database_url: SecretString,
    pub rapidapi_key: SecretString,
    pub lookup_base_url: String,
    pub lookup_timeout: Duration,
    pub bot_name: String,
    pub targets_file: PathBuf,
    pub log_dir: PathBuf,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        let lookup_timeout = match std::env::var("LOOKUP_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(raw.parse().map_err(|_| {
                Error::Config(format!("LOOKUP_TIMEOUT_SECS is not a number: {raw}"))
            })?),
            Err(_) => Duration::from_secs(30),
        };

        Ok(Self {
            database_url: SecretString::from(required_var("DATABASE_URL")?),
            rapidapi_key: SecretString::from(required_var("RAPIDAPI_KEY")?),
            lookup_base_url: std::env::var("LOOKUP_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            lookup_timeout,
            bot_name: std::env::var("BOT_NAME").unwrap_or_else(|_| DEFAULT_BOT_NAME.to_string()),
            targets_file: std::env::var("TARGETS_FILE")
                .unwrap_or_else(|_| "targets.toml".to_string())
                .into(),
            log_dir: std::env::var("LOG_DIR")
                .unwrap_or_else(|_| "logs".to_string())
                .into(),
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Worker identity for one running instance, e.g. `rapidapi_carfax-checks_3`.
    pub fn bot_identity(&self, instance: &str) -> String {
        format!("{}_{instance}", self.bot_name)
    }

    /// Log file for one bot working one table.
    pub fn log_file(&self, table: &str, bot: &str) -> PathBuf {
        self.log_dir.join(format!("{table}-{bot}.log"))
    }

    pub fn lookup(&self) -> LookupConfig {
        LookupConfig {
            base_url: self.lookup_base_url.clone(),
            api_key: SecretString::from(self.rapidapi_key.expose_secret().to_owned()),
            timeout: self.lookup_timeout,
        }
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))
}
