use crate::error::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseSettings,
    pub demo: DemoSettings,
    pub logging: LoggingSettings,
}

/// Connection pool settings for PostgreSQL.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Connection string. Falls back to the `DATABASE_URL` environment variable when empty.
    pub url: String,
    pub max_connections: u32,
    /// How long to wait for a free pooled connection before failing.
    pub acquire_timeout_secs: u64,
    /// Apply the embedded schema migrations at startup.
    pub run_migrations: bool,
}

/// Inputs for the fixed demo scenario.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DemoSettings {
    pub person_name: String,
    pub first_note: String,
    pub second_note: String,
    /// Prepended to every person's first name by the "make reactive" step.
    pub reactive_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive, used when `RUST_LOG` is not set.
    pub level: String,
    pub format: LogFormat,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
}

// --- Default Implementations ---
// These allow a user to omit any section (or the whole file) and still
// get a runnable demo.

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            acquire_timeout_secs: 5,
            run_migrations: true,
        }
    }
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            person_name: "Andrii".to_string(),
            first_note: "Hello everyone!".to_string(),
            second_note: "The second note :)".to_string(),
            reactive_prefix: "Reactive".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
            directory: None,
        }
    }
}

impl Config {
    /// Rejects settings that would only fail later with a less helpful error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.url is empty and DATABASE_URL is not set".to_string(),
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.database.acquire_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "database.acquire_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.demo.reactive_prefix.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "demo.reactive_prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
