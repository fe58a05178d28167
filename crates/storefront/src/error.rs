//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` that front ends turn into a message for the
//! user. Failures the user cannot fix are captured to Sentry first via
//! [`AppError::report`].

use thiserror::Error;

use crate::api::ApiError;
use crate::cart::CartError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::session::AuthError;
use crate::storage::StorageError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Cart change refused or not saved.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// CardHub API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(AuthError),

    /// Local state could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Checkout is not possible.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Configuration is invalid.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The user must sign in (again).
    #[error("Session expired")]
    SessionExpired,

    /// Bad input from the user.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::SessionExpired => Self::SessionExpired,
            AuthError::Api(e) => Self::Api(e),
            AuthError::Storage(e) => Self::Storage(e),
            other => Self::Auth(other),
        }
    }
}

impl AppError {
    /// Whether this is a failure of ours rather than something the user did.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        match self {
            Self::Storage(_) | Self::Config(_) | Self::Cart(CartError::Storage(_)) => true,
            Self::Api(e) => !e.is_client_error(),
            _ => false,
        }
    }

    /// Capture internal failures to Sentry and log them.
    ///
    /// Returns the Sentry event id when something was captured.
    pub fn report(&self) -> Option<sentry::types::Uuid> {
        if !self.is_internal() {
            return None;
        }
        let event_id = sentry::capture_error(self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Storefront error"
        );
        Some(event_id)
    }

    /// Message safe to show the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        // Don't expose internal error details to users
        match self {
            Self::Storage(_) | Self::Cart(CartError::Storage(_)) => {
                "Could not save your data on this device".to_string()
            }
            Self::Config(e) => format!("Configuration problem: {e}"),
            Self::Cart(CartError::Rejected(why)) => capitalize(&why.to_string()),
            Self::Api(e) => match e {
                ApiError::Http(err) if err.is_timeout() => {
                    "The shop did not respond in time, please try again".to_string()
                }
                ApiError::Http(_) => "Could not reach the shop, please try again".to_string(),
                ApiError::Unauthorized(_) => "Please sign in again".to_string(),
                ApiError::Status { message, .. } if e.is_client_error() => message.clone(),
                _ => "The shop returned an unexpected response".to_string(),
            },
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid email or password".to_string(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_string(),
                AuthError::PasswordMismatch => "Passwords do not match".to_string(),
                AuthError::MissingField(field) => format!("Please enter your {field}"),
                AuthError::Rejected(reason) => reason.clone(),
                AuthError::SessionExpired => "Please sign in again".to_string(),
                AuthError::Api(_) | AuthError::Storage(_) => "Authentication error".to_string(),
            },
            Self::Checkout(e) => capitalize(&e.to_string()),
            Self::SessionExpired => "Your session has expired, please sign in again".to_string(),
            Self::BadRequest(msg) => msg.clone(),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added card", Some(&[("card_id", "123"), ("quality", "NM")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Rejection;

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
        assert_eq!(AppError::SessionExpired.to_string(), "Session expired");
    }

    #[test]
    fn test_session_expiry_is_lifted_out_of_auth() {
        assert!(matches!(
            AppError::from(AuthError::SessionExpired),
            AppError::SessionExpired
        ));
        assert!(matches!(
            AppError::from(AuthError::Storage(StorageError::ReadOnly)),
            AppError::Storage(_)
        ));
        assert!(matches!(
            AppError::from(AuthError::InvalidCredentials),
            AppError::Auth(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_user_messages_hide_internals() {
        let err = AppError::Storage(StorageError::ReadOnly);
        assert_eq!(err.user_message(), "Could not save your data on this device");
        assert!(err.is_internal());

        let err = AppError::Api(ApiError::Decode("row 3 is not an array".to_string()));
        assert!(!err.user_message().contains("row 3"));
        assert!(err.is_internal());

        let err = AppError::Api(ApiError::Status {
            status: 400,
            message: "Email already registered".to_string(),
        });
        assert_eq!(err.user_message(), "Email already registered");
        assert!(!err.is_internal());
    }

    #[test]
    fn test_rejections_read_as_notices() {
        let err = AppError::from(CartError::Rejected(Rejection::LineFull {
            max: 4,
            requested: 5,
        }));
        assert_eq!(
            err.user_message(),
            "At most 4 copies of one card per grade (this would make 5)"
        );
        assert!(!err.is_internal());
        assert!(err.report().is_none());
    }
}
