//! Client configuration.
//!
//! Provides the `ClientConfig` used by every Scout client to reach the backend
//! and to size the offline queue.

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

/// Global cap on stored scouting entries.
pub const ENTRY_LIMIT: usize = 500;
/// Wait after a connectivity-restored signal before draining the queue.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(3);
/// Competition key used until the backend provides one.
pub const DEFAULT_EVENT_KEY: &str = "2026cahal";

/// Runtime configuration for a Scout client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL without a trailing slash, e.g. `https://scout.example.com/api`
    pub api_base_url: String,
    /// Maximum number of entries (confirmed + queued) a client will accept
    pub entry_limit: usize,
    /// Delay between a connectivity-restored signal and the queue drain
    pub settle_delay: Duration,
    /// Optional per-request deadline; `None` keeps the HTTP stack defaults
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Create a configuration for the given backend with default limits.
    pub fn new(api_base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            api_base_url: normalize_base_url(api_base_url.into())?,
            entry_limit: ENTRY_LIMIT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            request_timeout: None,
        })
    }

    /// Override the entry limit
    #[must_use]
    pub const fn with_entry_limit(mut self, entry_limit: usize) -> Self {
        self.entry_limit = entry_limit;
        self
    }

    /// Override the connectivity settle delay
    #[must_use]
    pub const fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Set an explicit per-request deadline
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Read configuration from `SCOUT_*` environment variables.
    pub fn from_env() -> Result<Self> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    /// Read configuration through an arbitrary variable lookup.
    ///
    /// `SCOUT_API_URL` is required; `SCOUT_ENTRY_LIMIT`,
    /// `SCOUT_SETTLE_DELAY_MS` and `SCOUT_REQUEST_TIMEOUT_SECS` are optional.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_base_url = normalize_text_option(lookup("SCOUT_API_URL"))
            .ok_or_else(|| Error::Config("SCOUT_API_URL is required".to_string()))?;
        let mut config = Self::new(api_base_url)?;

        if let Some(raw) = normalize_text_option(lookup("SCOUT_ENTRY_LIMIT")) {
            let limit = raw.parse::<usize>().map_err(|_| {
                Error::Config("SCOUT_ENTRY_LIMIT must be a positive integer".to_string())
            })?;
            if limit == 0 {
                return Err(Error::Config(
                    "SCOUT_ENTRY_LIMIT must be a positive integer".to_string(),
                ));
            }
            config.entry_limit = limit;
        }

        if let Some(raw) = normalize_text_option(lookup("SCOUT_SETTLE_DELAY_MS")) {
            let millis = raw.parse::<u64>().map_err(|_| {
                Error::Config("SCOUT_SETTLE_DELAY_MS must be an integer".to_string())
            })?;
            config.settle_delay = Duration::from_millis(millis);
        }

        if let Some(raw) = normalize_text_option(lookup("SCOUT_REQUEST_TIMEOUT_SECS")) {
            let secs = raw.parse::<u64>().map_err(|_| {
                Error::Config("SCOUT_REQUEST_TIMEOUT_SECS must be an integer".to_string())
            })?;
            if secs > 0 {
                config.request_timeout = Some(Duration::from_secs(secs));
            }
        }

        Ok(config)
    }
}

fn normalize_base_url(raw: String) -> Result<String> {
    let url = normalize_text_option(Some(raw))
        .ok_or_else(|| Error::Config("API base URL must not be empty".to_string()))?;
    if is_http_url(&url) {
        Ok(url.trim_end_matches('/').to_string())
    } else {
        Err(Error::Config(
            "API base URL must include http:// or https://".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn new_trims_trailing_slash() {
        let config = ClientConfig::new(" https://scout.example.com/api/ ").unwrap();
        assert_eq!(config.api_base_url, "https://scout.example.com/api");
        assert_eq!(config.entry_limit, ENTRY_LIMIT);
        assert_eq!(config.settle_delay, DEFAULT_SETTLE_DELAY);
    }

    #[test]
    fn new_rejects_missing_scheme() {
        assert!(ClientConfig::new("scout.example.com").is_err());
        assert!(ClientConfig::new("   ").is_err());
    }

    #[test]
    fn from_lookup_requires_api_url() {
        let err = ClientConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("SCOUT_API_URL"));
    }

    #[test]
    fn from_lookup_reads_overrides() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("SCOUT_API_URL", "http://localhost:3001"),
            ("SCOUT_ENTRY_LIMIT", "20"),
            ("SCOUT_SETTLE_DELAY_MS", "250"),
            ("SCOUT_REQUEST_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.entry_limit, 20);
        assert_eq!(config.settle_delay, Duration::from_millis(250));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn from_lookup_rejects_zero_limit() {
        let result = ClientConfig::from_lookup(lookup_from(&[
            ("SCOUT_API_URL", "http://localhost:3001"),
            ("SCOUT_ENTRY_LIMIT", "0"),
        ]));
        assert!(result.is_err());
    }
}
