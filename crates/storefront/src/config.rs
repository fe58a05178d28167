//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All optional:
//! - `CARDHUB_API_BASE_URL` - Catalog/auth service URL (default: `http://localhost:5000`)
//! - `CARDHUB_STATE_DIR` - Directory for the cart and session (default: platform data dir + `/cardhub`)
//! - `CARDHUB_PAGE_SIZE` - Search results per page (default: 20)
//! - `CARDHUB_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag (default: `development`)
//! - `CARDHUB_LOG_FORMAT` - `text` or `json` (default: `text`)
//! - `SENTRY_SAMPLE_RATE` - Fraction of errors sent to Sentry, 0.0 to 1.0 (default: 1.0)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_PAGE_SIZE: &str = "20";
const DEFAULT_HTTP_TIMEOUT_SECS: &str = "10";
const STATE_DIR_NAME: &str = "cardhub";

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
    /// Remote service settings
    pub api: ApiConfig,
    /// Where the cart and session files live
    pub state_dir: PathBuf,
    /// Error tracking settings
    pub sentry: SentryConfig,
    /// How log lines are written to stderr
    pub log_format: LogFormat,
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line, for log collectors.
    Json,
}

/// Remote service settings.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
    /// Search results per page
    pub page_size: usize,
}

/// Sentry settings. Reporting is off without a DSN.
#[derive(Debug, Clone)]
pub struct SentryConfig {
    pub dsn: Option<String>,
    pub environment: String,
    pub sample_rate: f32,
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            dsn: None,
            environment: "development".to_string(),
            sample_rate: 1.0,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an invalid value, or if
    /// no state directory is configured and the platform has no data dir.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`StorefrontConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&lookup);

        let base_url = vars.parse_or("CARDHUB_API_BASE_URL", DEFAULT_API_BASE_URL, |v| {
            let url = Url::parse(v).map_err(|e| e.to_string())?;
            if matches!(url.scheme(), "http" | "https") {
                Ok(url)
            } else {
                Err(format!("unsupported scheme '{}'", url.scheme()))
            }
        })?;

        let page_size = vars.parse_or("CARDHUB_PAGE_SIZE", DEFAULT_PAGE_SIZE, |v| {
            match v.parse::<usize>() {
                Ok(0) => Err("must be at least 1".to_string()),
                Ok(n) => Ok(n),
                Err(e) => Err(e.to_string()),
            }
        })?;

        let timeout_secs = vars.parse_or("CARDHUB_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS, |v| {
            v.parse::<u64>().map_err(|e| e.to_string())
        })?;

        let state_dir = match vars.optional("CARDHUB_STATE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_dir()
                .map(|d| d.join(STATE_DIR_NAME))
                .ok_or_else(|| ConfigError::MissingEnvVar("CARDHUB_STATE_DIR".to_string()))?,
        };

        let sample_rate = vars.parse_or("SENTRY_SAMPLE_RATE", "1.0", |v| {
            let rate = v.parse::<f32>().map_err(|e| e.to_string())?;
            if (0.0..=1.0).contains(&rate) {
                Ok(rate)
            } else {
                Err("must be between 0.0 and 1.0".to_string())
            }
        })?;

        let log_format = vars.parse_or("CARDHUB_LOG_FORMAT", "text", |v| {
            match v.to_ascii_lowercase().as_str() {
                "text" => Ok(LogFormat::Text),
                "json" => Ok(LogFormat::Json),
                other => Err(format!("expected 'text' or 'json', got '{other}'")),
            }
        })?;

        Ok(Self {
            api: ApiConfig {
                base_url,
                timeout: Duration::from_secs(timeout_secs),
                page_size,
            },
            state_dir,
            sentry: SentryConfig {
                dsn: vars.optional("SENTRY_DSN"),
                environment: vars.or_default("SENTRY_ENVIRONMENT", "development"),
                sample_rate,
            },
            log_format,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable source with the blank-means-unset rule applied.
struct Vars<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    /// Get an optional variable. Blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a variable (or its default), naming the variable on failure.
    fn parse_or<T>(
        &self,
        key: &str,
        default: &str,
        parse: impl FnOnce(&str) -> Result<T, String>,
    ) -> Result<T, ConfigError> {
        parse(&self.or_default(key, default))
            .map_err(|reason| ConfigError::InvalidEnvVar(key.to_string(), reason))
    }
}
