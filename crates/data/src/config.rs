//! Configuration for the remote store adapters, loaded from environment
//! variables.

use std::env;

use anyhow::{Context, Result};

/// Connection settings for the hosted record/blob backend.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the backend (e.g. `https://project.example.co`).
    pub api_url: String,

    /// API key sent as both `apikey` and bearer token.
    pub api_key: String,

    /// Request timeout in seconds (default: 30).
    pub timeout_secs: u64,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// Required: `SAMAJ_API_URL`, `SAMAJ_API_KEY`.
    /// Optional: `SAMAJ_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        let api_url = env::var("SAMAJ_API_URL").context("SAMAJ_API_URL must be set")?;
        let api_key = env::var("SAMAJ_API_KEY").context("SAMAJ_API_KEY must be set")?;

        let timeout_secs = match env::var("SAMAJ_TIMEOUT_SECS") {
            Ok(v) => v
                .parse()
                .context("SAMAJ_TIMEOUT_SECS must be a positive integer")?,
            Err(_) => 30,
        };

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
            timeout_secs,
        })
    }

    /// Build a config directly, normalizing the base URL.
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let api_url: String = api_url.into();
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            timeout_secs: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_normalized() {
        let config = Config::new("https://project.example.co/", "key");
        assert_eq!(config.api_url, "https://project.example.co");
        assert_eq!(config.timeout_secs, 30);
    }
}
