//! Signed-in session.
//!
//! The access token, refresh token, and a snapshot of the signed-in user are
//! kept in [`LocalStorage`] under [`keys::TOKEN`], [`keys::REFRESH_TOKEN`] and
//! [`keys::USER`]. Every call that needs the token goes through
//! [`AuthSession::authorized`], which signs the user out when the service
//! rejects the token.

use std::future::Future;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{info, instrument, warn};

use cardhub_core::{Email, EmailError};

use crate::api::{ApiError, CardhubClient, ProfileUpdate, ProfileUpdated, User};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::storage::{LocalStorage, LocalStorageExt, StorageError, keys};

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// A required form field was left blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Wrong password or unknown email.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The service refused the registration, with its reason.
    #[error("registration refused: {0}")]
    Rejected(String),

    /// No token, or the service no longer accepts it. The session has been
    /// cleared.
    #[error("session expired")]
    SessionExpired,

    /// Any other API failure.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// The session could not be read or written.
    #[error("session storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Sign-up form input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
}

impl Registration {
    /// Check the form before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: a blank field, a malformed email, or
    /// a confirmation that does not match.
    pub fn validate(&self) -> Result<Email, AuthError> {
        if self.username.trim().is_empty() {
            return Err(AuthError::MissingField("username"));
        }
        let email = Email::parse(&self.email)?;
        if self.password.expose_secret().is_empty() {
            return Err(AuthError::MissingField("password"));
        }
        if self.password.expose_secret() != self.confirm_password.expose_secret() {
            return Err(AuthError::PasswordMismatch);
        }
        Ok(email)
    }
}

/// Authentication state over a storage backend.
#[derive(Debug, Clone)]
pub struct AuthSession<S> {
    client: CardhubClient,
    storage: S,
}

impl<S: LocalStorage> AuthSession<S> {
    #[must_use]
    pub const fn new(client: CardhubClient, storage: S) -> Self {
        Self { client, storage }
    }

    #[must_use]
    pub const fn client(&self) -> &CardhubClient {
        &self.client
    }

    /// The stored access token, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn token(&self) -> Result<Option<SecretString>, StorageError> {
        Ok(self
            .storage
            .get_item(keys::TOKEN)?
            .filter(|t| !t.trim().is_empty())
            .map(SecretString::from))
    }

    /// Whether a token is stored. Says nothing about whether it is still valid.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn is_signed_in(&self) -> Result<bool, StorageError> {
        Ok(self.token()?.is_some())
    }

    /// The stored user snapshot. An unreadable snapshot counts as absent.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn user(&self) -> Result<Option<User>, StorageError> {
        match self.storage.get_json(keys::USER) {
            Err(StorageError::Corrupt { key, source }) => {
                warn!(key, error = %source, "Ignoring unreadable user snapshot");
                Ok(None)
            }
            other => other,
        }
    }

    /// Replace the stored user snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    pub fn store_user(&self, user: &User) -> Result<(), StorageError> {
        self.storage.set_json(keys::USER, user)
    }

    /// Sign in and remember the session.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for a wrong password or
    /// unknown email. Nothing is stored unless the whole flow succeeds.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        let tokens = self
            .client
            .login(email.as_str(), password)
            .await
            .map_err(|e| match e {
                ApiError::Unauthorized(_) | ApiError::Status { status: 404, .. } => {
                    AuthError::InvalidCredentials
                }
                other => AuthError::Api(other),
            })?;

        let user = self.client.current_user(&tokens.access_token).await?;

        let stored = self
            .storage
            .set_item(keys::TOKEN, tokens.access_token.expose_secret())
            .and_then(|()| {
                self.storage
                    .set_item(keys::REFRESH_TOKEN, tokens.refresh_token.expose_secret())
            })
            .and_then(|()| self.store_user(&user));
        if let Err(e) = stored {
            self.clear_keys();
            return Err(e.into());
        }

        set_sentry_user(&user.id, Some(&user.email));
        info!(user_id = %user.id, "Signed in");
        Ok(user)
    }

    /// Create an account, then sign in with it.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any request is made, or
    /// [`AuthError::Rejected`] with the service's reason.
    #[instrument(skip_all, fields(username = %form.username))]
    pub async fn register(&self, form: &Registration) -> Result<User, AuthError> {
        let email = form.validate()?;

        self.client
            .register(form.username.trim(), email.as_str(), &form.password)
            .await
            .map_err(|e| match e {
                ApiError::Status { status, message } if (400..500).contains(&status) => {
                    AuthError::Rejected(message)
                }
                other => AuthError::Api(other),
            })?;
        info!("Account created");

        self.login(email.as_str(), &form.password).await
    }

    /// Forget the session.
    ///
    /// # Errors
    ///
    /// Returns an error if a key cannot be removed.
    pub fn logout(&self) -> Result<(), StorageError> {
        self.storage.remove_item(keys::TOKEN)?;
        self.storage.remove_item(keys::REFRESH_TOKEN)?;
        self.storage.remove_item(keys::USER)?;
        clear_sentry_user();
        info!("Signed out");
        Ok(())
    }

    /// Run an API call with the stored token.
    ///
    /// A missing token, or a 401 from the call, clears the session and
    /// returns [`AuthError::SessionExpired`].
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::SessionExpired`] as above, or the call's own
    /// error.
    pub async fn authorized<T, F, Fut>(&self, call: F) -> Result<T, AuthError>
    where
        F: FnOnce(CardhubClient, SecretString) -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let Some(token) = self.token()? else {
            self.clear_keys();
            return Err(AuthError::SessionExpired);
        };

        match call(self.client.clone(), token).await {
            Err(ApiError::Unauthorized(reason)) => {
                warn!(reason = %reason, "Token rejected, signing out");
                self.clear_keys();
                Err(AuthError::SessionExpired)
            }
            other => other.map_err(AuthError::from),
        }
    }

    /// Fetch the signed-in user again and refresh the snapshot.
    ///
    /// # Errors
    ///
    /// See [`AuthSession::authorized`].
    #[instrument(skip(self))]
    pub async fn refresh_user(&self) -> Result<User, AuthError> {
        let user = self
            .authorized(|client, token| async move { client.current_user(&token).await })
            .await?;
        self.store_user(&user)?;
        Ok(user)
    }

    /// Send a profile change and update the snapshot.
    ///
    /// # Errors
    ///
    /// See [`AuthSession::authorized`].
    #[instrument(skip(self))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<ProfileUpdated, AuthError> {
        let body = update.clone();
        let reply = self
            .authorized(|client, token| async move { client.update_profile(&token, &body).await })
            .await?;

        let refreshed = match (&reply.user, self.user()?) {
            (Some(user), _) => Some(user.clone()),
            (None, Some(mut user)) => {
                apply_update(&mut user, update);
                Some(user)
            }
            (None, None) => None,
        };
        if let Some(user) = &refreshed {
            self.store_user(user)?;
        }

        Ok(ProfileUpdated {
            message: reply.message,
            user: refreshed,
        })
    }

    /// Best-effort removal used on forced sign-out.
    fn clear_keys(&self) {
        if let Err(e) = self.logout() {
            warn!(error = %e, "Failed to clear session");
        }
    }
}

/// Apply a change the service accepted but did not echo back.
fn apply_update(user: &mut User, update: &ProfileUpdate) {
    if let Some(username) = &update.username {
        user.username = Some(username.clone());
    }
    if let Some(handle) = &update.telegram_username {
        if user.telegram_username.as_deref() != Some(handle.as_str()) {
            user.telegram_verified = false;
            user.telegram_chat_id = None;
        }
        user.telegram_username = Some(handle.clone());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use url::Url;

    use super::*;
    use crate::config::ApiConfig;
    use crate::storage::MemoryStorage;
    use cardhub_core::UserId;

    fn session() -> AuthSession<MemoryStorage> {
        // Nothing listens here; tests below never reach the network.
        let client = CardhubClient::new(&ApiConfig {
            base_url: Url::parse("http://127.0.0.1:9").unwrap(),
            timeout: Duration::from_millis(200),
            page_size: 20,
        })
        .unwrap();
        AuthSession::new(client, MemoryStorage::new())
    }

    fn form(password: &str, confirm: &str) -> Registration {
        Registration {
            username: "nissa".to_owned(),
            email: "nissa@zendikar.example".to_owned(),
            password: SecretString::from(password),
            confirm_password: SecretString::from(confirm),
        }
    }

    fn user() -> User {
        User {
            id: UserId::new(9),
            email: "nissa@zendikar.example".to_owned(),
            username: Some("nissa".to_owned()),
            role: "user".to_owned(),
            email_confirmed: true,
            telegram_chat_id: Some(42),
            telegram_username: Some("nissa_tg".to_owned()),
            telegram_verified: true,
            shipping_address: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_registration_validation() {
        assert!(form("hunter22", "hunter22").validate().is_ok());
        assert!(matches!(
            form("hunter22", "hunter23").validate(),
            Err(AuthError::PasswordMismatch)
        ));
        assert!(matches!(
            form("", "").validate(),
            Err(AuthError::MissingField("password"))
        ));

        let mut bad = form("a", "a");
        bad.email = "not-an-email".to_owned();
        assert!(matches!(bad.validate(), Err(AuthError::InvalidEmail(_))));

        let mut blank = form("a", "a");
        blank.username = "  ".to_owned();
        assert!(matches!(blank.validate(), Err(AuthError::MissingField("username"))));
    }

    #[tokio::test]
    async fn test_register_validates_before_sending() {
        let session = session();
        let err = session.register(&form("a", "b")).await.unwrap_err();
        assert!(matches!(err, AuthError::PasswordMismatch));
        assert!(!session.is_signed_in().unwrap());
    }

    #[tokio::test]
    async fn test_authorized_without_token_expires_session() {
        let session = session();
        session.store_user(&user()).unwrap();

        let err = session
            .authorized(|client, token| async move { client.current_user(&token).await })
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::SessionExpired));
        assert!(session.user().unwrap().is_none());
    }

    #[test]
    fn test_logout_clears_every_key() {
        let session = session();
        session.storage.set_item(keys::TOKEN, "abc").unwrap();
        session.storage.set_item(keys::REFRESH_TOKEN, "def").unwrap();
        session.store_user(&user()).unwrap();
        assert!(session.is_signed_in().unwrap());

        session.logout().unwrap();
        assert!(!session.is_signed_in().unwrap());
        assert!(session.user().unwrap().is_none());
        assert!(session.storage.is_empty());
    }

    #[test]
    fn test_corrupt_user_snapshot_reads_as_absent() {
        let session = session();
        session.storage.set_item(keys::USER, "{oops").unwrap();
        assert!(session.user().unwrap().is_none());
    }

    #[test]
    fn test_apply_update_resets_telegram_verification_on_new_handle() {
        let mut u = user();
        apply_update(
            &mut u,
            &ProfileUpdate {
                username: None,
                telegram_username: Some("nissa_tg".to_owned()),
            },
        );
        assert!(u.telegram_verified);

        apply_update(
            &mut u,
            &ProfileUpdate {
                username: Some("Nissa".to_owned()),
                telegram_username: Some("other".to_owned()),
            },
        );
        assert_eq!(u.username.as_deref(), Some("Nissa"));
        assert_eq!(u.telegram_username.as_deref(), Some("other"));
        assert!(!u.telegram_verified);
        assert_eq!(u.telegram_chat_id, None);
    }
}
