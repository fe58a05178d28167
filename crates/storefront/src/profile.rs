//! Profile page: display name and Telegram linkage.

use std::fmt;

use crate::api::{ProfileUpdate, User};
use crate::session::{AuthError, AuthSession};
use crate::storage::LocalStorage;

/// Where the user stands with the order-notification bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelegramStatus {
    /// No handle entered.
    NotLinked,
    /// Handle saved, but the user has not messaged the bot yet.
    PendingVerification { handle: String },
    /// The bot knows the chat.
    Verified { handle: String },
}

impl TelegramStatus {
    #[must_use]
    pub fn of(user: &User) -> Self {
        match user.telegram_username.as_deref().map(normalize_handle) {
            None => Self::NotLinked,
            Some(handle) if handle.is_empty() => Self::NotLinked,
            Some(handle) if user.telegram_verified => Self::Verified { handle },
            Some(handle) => Self::PendingVerification { handle },
        }
    }

    #[must_use]
    pub const fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }
}

impl fmt::Display for TelegramStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotLinked => write!(f, "not linked"),
            Self::PendingVerification { handle } => {
                write!(f, "@{handle} (waiting for you to message the bot)")
            }
            Self::Verified { handle } => write!(f, "@{handle} (verified)"),
        }
    }
}

/// Strip whitespace and any leading `@`.
#[must_use]
pub fn normalize_handle(handle: &str) -> String {
    handle.trim().trim_start_matches('@').trim().to_owned()
}

/// Editable copy of the profile fields.
#[derive(Debug, Clone)]
pub struct ProfileForm {
    user: User,
    username: String,
    telegram_username: String,
    editing: bool,
}

impl ProfileForm {
    #[must_use]
    pub fn new(user: User) -> Self {
        let (username, telegram_username) = initial_fields(&user);
        Self {
            user,
            username,
            telegram_username,
            editing: false,
        }
    }

    /// The account as last saved.
    #[must_use]
    pub const fn user(&self) -> &User {
        &self.user
    }

    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.editing
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn telegram_username(&self) -> &str {
        &self.telegram_username
    }

    #[must_use]
    pub fn telegram_status(&self) -> TelegramStatus {
        TelegramStatus::of(&self.user)
    }

    pub fn edit(&mut self) {
        self.editing = true;
    }

    /// Leave edit mode and restore the saved values.
    pub fn cancel(&mut self) {
        (self.username, self.telegram_username) = initial_fields(&self.user);
        self.editing = false;
    }

    pub fn set_username(&mut self, username: &str) {
        self.username = username.trim().to_owned();
    }

    pub fn set_telegram_username(&mut self, handle: &str) {
        self.telegram_username = normalize_handle(handle);
    }

    /// Fields that differ from the saved account. Blank fields are left
    /// untouched.
    #[must_use]
    pub fn changes(&self) -> ProfileUpdate {
        let (saved_username, saved_handle) = initial_fields(&self.user);
        let changed = |edited: &str, saved: String| {
            (!edited.is_empty() && edited != saved).then(|| edited.to_owned())
        };
        ProfileUpdate {
            username: changed(&self.username, saved_username),
            telegram_username: changed(&self.telegram_username, saved_handle),
        }
    }

    /// Send the changes and leave edit mode.
    ///
    /// Returns the service's confirmation, or `None` when there was nothing
    /// to send.
    ///
    /// # Errors
    ///
    /// Returns the session's error; the form stays in edit mode with the
    /// user's input intact.
    pub async fn save<S: LocalStorage>(
        &mut self,
        session: &AuthSession<S>,
    ) -> Result<Option<String>, AuthError> {
        let update = self.changes();
        if update.is_empty() {
            self.editing = false;
            return Ok(None);
        }

        let reply = session.update_profile(&update).await?;
        if let Some(user) = reply.user {
            self.user = user;
        }
        (self.username, self.telegram_username) = initial_fields(&self.user);
        self.editing = false;
        Ok(Some(reply.message))
    }
}

fn initial_fields(user: &User) -> (String, String) {
    (
        user.username.clone().unwrap_or_default(),
        user.telegram_username
            .as_deref()
            .map(normalize_handle)
            .unwrap_or_default(),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cardhub_core::UserId;

    use super::*;

    fn user(handle: Option<&str>, verified: bool) -> User {
        User {
            id: UserId::new(1),
            email: "teferi@dominaria.example".to_owned(),
            username: Some("teferi".to_owned()),
            role: "user".to_owned(),
            email_confirmed: true,
            telegram_chat_id: None,
            telegram_username: handle.map(str::to_owned),
            telegram_verified: verified,
            shipping_address: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_telegram_status() {
        assert_eq!(TelegramStatus::of(&user(None, false)), TelegramStatus::NotLinked);
        assert_eq!(TelegramStatus::of(&user(Some("@"), false)), TelegramStatus::NotLinked);
        assert_eq!(
            TelegramStatus::of(&user(Some("@teferi_tg"), false)),
            TelegramStatus::PendingVerification {
                handle: "teferi_tg".to_owned()
            }
        );
        let verified = TelegramStatus::of(&user(Some("teferi_tg"), true));
        assert!(verified.is_verified());
        assert_eq!(verified.to_string(), "@teferi_tg (verified)");
    }

    #[test]
    fn test_handle_loses_leading_at() {
        assert_eq!(normalize_handle("  @@jace "), "jace");
        assert_eq!(normalize_handle("jace"), "jace");
    }

    #[test]
    fn test_changes_only_include_edited_fields() {
        let mut form = ProfileForm::new(user(Some("teferi_tg"), true));
        form.edit();
        assert!(form.changes().is_empty());

        form.set_telegram_username("@teferi_tg");
        assert!(form.changes().is_empty());

        form.set_username("Teferi");
        form.set_telegram_username("@time_mage");
        let changes = form.changes();
        assert_eq!(changes.username.as_deref(), Some("Teferi"));
        assert_eq!(changes.telegram_username.as_deref(), Some("time_mage"));

        form.set_username("   ");
        assert!(form.changes().username.is_none());
    }

    #[test]
    fn test_cancel_restores_saved_values() {
        let mut form = ProfileForm::new(user(None, false));
        form.edit();
        form.set_username("someone else");
        form.set_telegram_username("handle");
        form.cancel();

        assert!(!form.is_editing());
        assert_eq!(form.username(), "teferi");
        assert_eq!(form.telegram_username(), "");
    }
}
