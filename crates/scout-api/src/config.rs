use std::collections::HashMap;
use std::env;
use std::fmt;

use scout_core::config::{DEFAULT_EVENT_KEY, ENTRY_LIMIT};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub admin_password: String,
    pub database_path: String,
    pub entry_limit: usize,
    pub default_event_key: String,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("admin_password", &"[REDACTED]")
            .field("database_path", &self.database_path)
            .field("entry_limit", &self.entry_limit)
            .field("default_event_key", &self.default_event_key)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = value_or_default(&lookup, "SCOUT_API_BIND_ADDR", "127.0.0.1:3001");
        let admin_password = required_trimmed(&lookup, "SCOUT_ADMIN_PASSWORD")?;
        let database_path = value_or_default(&lookup, "SCOUT_DATABASE_PATH", "scout.db");

        let entry_limit = value_or_default(&lookup, "SCOUT_ENTRY_LIMIT", &ENTRY_LIMIT.to_string())
            .parse::<usize>()
            .map_err(|_| {
                ConfigError::Invalid(
                    "SCOUT_ENTRY_LIMIT must be an integer in [1, 100000]".to_string(),
                )
            })?;
        if !(1..=100_000).contains(&entry_limit) {
            return Err(ConfigError::Invalid(
                "SCOUT_ENTRY_LIMIT must be in [1, 100000]".to_string(),
            ));
        }

        let default_event_key =
            value_or_default(&lookup, "SCOUT_DEFAULT_EVENT_KEY", DEFAULT_EVENT_KEY);

        Ok(Self {
            bind_addr,
            admin_password,
            database_path,
            entry_limit,
            default_event_key,
        })
    }

    /// Configuration for an in-memory server, used by tests.
    pub fn ephemeral(admin_password: impl Into<String>) -> Self {
        Self {
            bind_addr: "127.0.0.1:0".to_string(),
            admin_password: admin_password.into(),
            database_path: ":memory:".to_string(),
            entry_limit: ENTRY_LIMIT,
            default_event_key: DEFAULT_EVENT_KEY.to_string(),
        }
    }
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn required_trimmed(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    optional_trimmed(lookup, name).ok_or(ConfigError::MissingVar(name))
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
