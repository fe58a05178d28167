//! Account endpoints.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::types::{
    LoginRequest, ProfileUpdate, ProfileUpdated, RegisterRequest, TokenPair, User,
};
use super::{ApiError, CardhubClient, wire};

#[derive(Deserialize)]
struct TokenBody {
    access_token: String,
    refresh_token: String,
}

#[derive(Deserialize)]
struct MessageBody {
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct UserBody {
    user: Value,
}

#[derive(Deserialize)]
struct ProfileUpdatedBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    user: Option<Value>,
}

impl CardhubClient {
    /// Exchange credentials for a token pair.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] for a wrong password,
    /// [`ApiError::Status`] (404) for an unknown email, and other errors for
    /// transport failures.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<TokenPair, ApiError> {
        let url = self.endpoint("/auth/login")?;
        let body = LoginRequest {
            email,
            password: password.expose_secret(),
        };
        let tokens: TokenBody = self.execute(self.http().post(url).json(&body)).await?;

        debug!("Login accepted");
        Ok(TokenPair {
            access_token: SecretString::from(tokens.access_token),
            refresh_token: SecretString::from(tokens.refresh_token),
        })
    }

    /// Create an account. Returns the service's confirmation message.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with the service's reason (for example
    /// an email already in use) when registration is refused.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<String, ApiError> {
        let url = self.endpoint("/auth/register")?;
        let body = RegisterRequest {
            username,
            email,
            password: password.expose_secret(),
        };
        let reply: MessageBody = self.execute(self.http().post(url).json(&body)).await?;
        Ok(reply.message)
    }

    /// Fetch the account the token belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] if the token is missing, expired,
    /// or revoked, and [`ApiError::Decode`] if the user record is malformed.
    #[instrument(skip_all)]
    pub async fn current_user(&self, token: &SecretString) -> Result<User, ApiError> {
        let url = self.endpoint("/auth/user")?;
        let reply: UserBody = self
            .execute(self.http().get(url).bearer_auth(token.expose_secret()))
            .await?;
        wire::user(&reply.user)
    }

    /// Change the display name and/or Telegram handle.
    ///
    /// Only fields set in `update` are sent.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] if the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn update_profile(
        &self,
        token: &SecretString,
        update: &ProfileUpdate,
    ) -> Result<ProfileUpdated, ApiError> {
        let url = self.endpoint("/auth/user_update_profile")?;
        let reply: ProfileUpdatedBody = self
            .execute(
                self.http()
                    .put(url)
                    .bearer_auth(token.expose_secret())
                    .json(update),
            )
            .await?;

        // The account is echoed back either as a row or not at all.
        let user = reply
            .user
            .filter(Value::is_array)
            .map(|row| wire::user(&row))
            .transpose()?;

        Ok(ProfileUpdated {
            message: reply.message,
            user,
        })
    }
}
