//! CardHub HTTP API client.
//!
//! # Architecture
//!
//! - Plain JSON over `reqwest`; one shared connection pool behind an `Arc`
//! - The catalog service is the source of truth - no local caching
//! - Positional tuples from the service are decoded once, in [`wire`], into
//!   the named types in [`types`]
//!
//! # Endpoints
//!
//! ## Catalog
//! - `GET /cards/search/{name}` - every matching card with inventory totals
//!
//! ## Accounts
//! - `POST /auth/login`, `POST /auth/register`
//! - `GET /auth/user` - the signed-in user (bearer token)
//! - `PUT /auth/user_update_profile` - display name and Telegram handle
//!
//! # Example
//!
//! ```rust,ignore
//! use cardhub_storefront::api::CardhubClient;
//!
//! let client = CardhubClient::new(&config.api)?;
//! let page = client.search_cards("Lightning Bolt", 1).await?;
//! for card in &page.cards {
//!     println!("{} ({})", card.name, card.set_name);
//! }
//! ```

mod auth;
mod catalog;
pub mod types;
mod wire;

pub use types::*;

use std::sync::Arc;

use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error};
use url::Url;

use crate::config::ApiConfig;

/// Errors that can occur when talking to the CardHub API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response not read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// An endpoint URL could not be built.
    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),

    /// The service rejected the credentials or token (HTTP 401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Any other non-success status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The body was not the expected JSON.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The JSON parsed but a record did not have the expected shape.
    #[error("unexpected record shape: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status, when the service answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED.as_u16()),
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether the failure came with a service-provided message that is
    /// safe to show.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
            || matches!(self, Self::Status { status, .. } if *status >= 400 && *status < 500)
    }
}

/// Error payloads use either `message` or `error`, depending on the route.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    error: Option<String>,
}

// =============================================================================
// CardhubClient
// =============================================================================

/// Client for the CardHub catalog and account API.
#[derive(Clone)]
pub struct CardhubClient {
    inner: Arc<CardhubClientInner>,
}

struct CardhubClientInner {
    client: reqwest::Client,
    base_url: Url,
    page_size: usize,
}

impl std::fmt::Debug for CardhubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardhubClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("page_size", &self.inner.page_size)
            .finish_non_exhaustive()
    }
}

impl CardhubClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the HTTP client cannot be constructed.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("cardhub/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(CardhubClientInner {
                client,
                base_url: config.base_url.clone(),
                page_size: config.page_size.max(1),
            }),
        })
    }

    /// Service base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Cards per search page.
    #[must_use]
    pub fn page_size(&self) -> usize {
        self.inner.page_size
    }

    /// Build an endpoint URL, keeping any path prefix of the base URL.
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    fn http(&self) -> &reqwest::Client {
        &self.inner.client
    }

    /// Send a request and decode a JSON success body.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().path().to_owned();

        // Get response body as text first for better error diagnostics
        let body = response.text().await?;

        if !status.is_success() {
            let message = error_message(&body, status);
            debug!(status = %status, path = %url, message = %message, "API returned non-success status");
            return Err(if status == StatusCode::UNAUTHORIZED {
                ApiError::Unauthorized(message)
            } else {
                ApiError::Status {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            error!(
                error = %e,
                path = %url,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Parse(e)
        })
    }
}

/// Pull a human-readable message out of an error body.
fn error_message(body: &str, status: StatusCode) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .message
        .or(parsed.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| {
            let snippet: String = body.chars().take(200).collect();
            if snippet.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_owned()
            } else {
                snippet
            }
        })
}
