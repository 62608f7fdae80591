//! Client configuration
//!
//! Settings come from `SHELFWATCH_*` environment variables, optionally loaded
//! from a `.env` file first. Command-line flags override them in `main`.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Environment variable holding the API base URL
pub const API_URL_VAR: &str = "SHELFWATCH_API_URL";
/// Environment variable holding the cache validity window in seconds
pub const CACHE_TTL_VAR: &str = "SHELFWATCH_CACHE_TTL_SECS";
/// Environment variable holding the default attempt budget
pub const MAX_ATTEMPTS_VAR: &str = "SHELFWATCH_MAX_ATTEMPTS";
/// Environment variable holding the per-request timeout in seconds
pub const REQUEST_TIMEOUT_VAR: &str = "SHELFWATCH_REQUEST_TIMEOUT_SECS";

const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Errors raised while reading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric setting could not be parsed
    #[error("Invalid value for {key}: '{value}' is not a non-negative integer")]
    InvalidNumber { key: &'static str, value: String },

    /// The API URL is not an absolute http(s) URL
    #[error("Invalid API URL '{0}': expected an absolute http:// or https:// URL")]
    InvalidUrl(String),

    /// The .env file exists but could not be read
    #[error("Failed to load env file: {0}")]
    EnvFile(#[from] dotenvy::Error),
}

/// Settings for talking to the book API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the API, without trailing slash (e.g. `http://localhost:5000/api`)
    pub api_url: String,
    /// How long a collection snapshot can be trusted
    pub cache_ttl: Duration,
    /// Default number of attempts per request
    pub max_attempts: u32,
    /// Timeout of each request attempt
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            cache_ttl: Duration::from_secs(30),
            max_attempts: 5,
            request_timeout: Duration::from_secs(5),
        }
    }
}

impl ClientConfig {
    /// Reads configuration from the process environment
    ///
    /// A `.env` file in the working directory is loaded first if present;
    /// variables already set in the environment win over the file.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file loaded: {}", e);
        }
        Self::from_vars(std::env::vars())
    }

    /// Reads configuration from a specific env file, ignoring the process environment
    pub fn from_env_file(path: &Path) -> Result<Self, ConfigError> {
        let vars = dotenvy::from_path_iter(path)?.collect::<Result<Vec<_>, _>>()?;
        Self::from_vars(vars)
    }

    /// Builds a configuration from key/value pairs, using defaults for missing keys
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();
        let defaults = Self::default();

        let api_url = match vars.get(API_URL_VAR) {
            Some(url) => Self::normalize_url(url)?,
            None => defaults.api_url,
        };

        Ok(Self {
            api_url,
            cache_ttl: parse_secs(&vars, CACHE_TTL_VAR)?.unwrap_or(defaults.cache_ttl),
            max_attempts: parse_number(&vars, MAX_ATTEMPTS_VAR)?
                .map(|n| n as u32)
                .unwrap_or(defaults.max_attempts),
            request_timeout: parse_secs(&vars, REQUEST_TIMEOUT_VAR)?
                .unwrap_or(defaults.request_timeout),
        })
    }

    /// Returns a copy with a different API URL
    pub fn with_api_url(mut self, url: &str) -> Result<Self, ConfigError> {
        self.api_url = Self::normalize_url(url)?;
        Ok(self)
    }

    /// Trims trailing slashes and checks the scheme
    fn normalize_url(url: &str) -> Result<String, ConfigError> {
        let trimmed = url.trim().trim_end_matches('/');
        match reqwest::Url::parse(trimmed) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(trimmed.to_string()),
            _ => Err(ConfigError::InvalidUrl(url.to_string())),
        }
    }

    /// Root endpoint used for readiness probes
    pub fn root_url(&self) -> String {
        self.api_url.clone()
    }

    /// Endpoint of the whole book collection
    pub fn collection_url(&self) -> String {
        format!("{}/books", self.api_url)
    }

    /// Endpoint of a single book
    pub fn item_url(&self, id: u64) -> String {
        format!("{}/books/{}", self.api_url, id)
    }
}

fn parse_number(vars: &HashMap<String, String>, key: &'static str) -> Result<Option<u64>, ConfigError> {
    vars.get(key)
        .map(|value| {
            value.trim().parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
                key,
                value: value.clone(),
            })
        })
        .transpose()
}

fn parse_secs(vars: &HashMap<String, String>, key: &'static str) -> Result<Option<Duration>, ConfigError> {
    Ok(parse_number(vars, key)?.map(Duration::from_secs))
}
