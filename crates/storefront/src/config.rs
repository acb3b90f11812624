//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `ALMA_API_BASE_URL` - Base URL of the shop API, including the `/api`
//!   prefix (e.g., `https://shop.almaartesana.gt/api`)
//!
//! ## Optional
//! - `ALMA_DATA_DIR` - Directory for durable local state (default:
//!   `.almaartesana`)
//! - `ALMA_HTTP_TIMEOUT_SECS` - Per-request HTTP timeout (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_DATA_DIR: &str = ".almaartesana";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL of the remote shop API, including the `/api` prefix.
    pub api_base_url: Url,
    /// Directory holding the durable local state slots.
    pub data_dir: PathBuf,
    /// Per-request HTTP timeout.
    pub http_timeout: Duration,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = get_required_env("ALMA_API_BASE_URL")?;
        let api_base_url = Url::parse(&api_base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("ALMA_API_BASE_URL".to_string(), e.to_string())
        })?;

        let data_dir = PathBuf::from(get_env_or_default("ALMA_DATA_DIR", DEFAULT_DATA_DIR));

        let http_timeout_secs = get_env_or_default(
            "ALMA_HTTP_TIMEOUT_SECS",
            &DEFAULT_HTTP_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("ALMA_HTTP_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

        Ok(Self {
            api_base_url,
            data_dir,
            http_timeout: Duration::from_secs(http_timeout_secs),
        })
    }

    /// Build a configuration pointing at an explicit API base URL, with
    /// defaults for everything else. Used by tests and tooling.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `api_base_url` is not a valid URL.
    pub fn for_base_url(api_base_url: &str) -> Result<Self, ConfigError> {
        let api_base_url = Url::parse(api_base_url)
            .map_err(|e| ConfigError::InvalidEnvVar("api_base_url".to_string(), e.to_string()))?;

        Ok(Self {
            api_base_url,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_for_base_url() {
        let config = StorefrontConfig::for_base_url("http://127.0.0.1:8000/api").unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://127.0.0.1:8000/api");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_for_base_url_rejects_garbage() {
        let result = StorefrontConfig::for_base_url("not a url");
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }
}
