//! Sign-in, registration and profile flows against the mock service.

#![allow(clippy::unwrap_used)]

use secrecy::{ExposeSecret, SecretString};

use cardhub_integration_tests::MockCardhub;
use cardhub_storefront::profile::{ProfileForm, TelegramStatus};
use cardhub_storefront::session::{AuthError, AuthSession, Registration};
use cardhub_storefront::storage::{LocalStorage, MemoryStorage, keys};

const EMAIL: &str = "chandra@kaladesh.example";
const PASSWORD: &str = "pyromancy-101";

fn password(value: &str) -> SecretString {
    SecretString::from(value.to_owned())
}

async fn with_account() -> (MockCardhub, AuthSession<MemoryStorage>) {
    let mock = MockCardhub::start().await;
    mock.add_account(EMAIL, PASSWORD, "chandra");
    let session = AuthSession::new(mock.client(20), MemoryStorage::new());
    (mock, session)
}

#[tokio::test]
async fn test_login_stores_session_and_user() {
    let (mock, session) = with_account().await;

    let user = session.login(EMAIL, &password(PASSWORD)).await.unwrap();
    assert_eq!(user.email, EMAIL);
    assert_eq!(user.display_name(), "chandra");
    assert!(user.created_at.is_some());

    assert!(session.is_signed_in().unwrap());
    assert!(session.token().unwrap().unwrap().expose_secret().starts_with("access-"));
    assert_eq!(session.user().unwrap().unwrap(), user);
    assert_eq!(
        mock.requests(),
        vec!["POST /auth/login".to_owned(), "GET /auth/user".to_owned()]
    );
}

#[tokio::test]
async fn test_wrong_password_is_invalid_credentials() {
    let (_mock, session) = with_account().await;

    let err = session.login(EMAIL, &password("wrong")).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
    assert!(!session.is_signed_in().unwrap());
    assert!(session.user().unwrap().is_none());
}

#[tokio::test]
async fn test_unknown_email_is_invalid_credentials() {
    let (_mock, session) = with_account().await;

    let err = session
        .login("nobody@kaladesh.example", &password(PASSWORD))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials));
}

#[tokio::test]
async fn test_malformed_email_is_refused_before_any_request() {
    let (mock, session) = with_account().await;

    let err = session.login("chandra", &password(PASSWORD)).await.unwrap_err();
    assert!(matches!(err, AuthError::InvalidEmail(_)));
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_rejected_token_ends_the_session() {
    let (mock, session) = with_account().await;
    session.login(EMAIL, &password(PASSWORD)).await.unwrap();

    mock.revoke_tokens();
    let err = session.refresh_user().await.unwrap_err();
    assert!(matches!(err, AuthError::SessionExpired));

    assert!(!session.is_signed_in().unwrap());
    assert!(session.user().unwrap().is_none());
}

#[tokio::test]
async fn test_authorized_call_without_token_expires_without_request() {
    let (mock, session) = with_account().await;

    let err = session.refresh_user().await.unwrap_err();
    assert!(matches!(err, AuthError::SessionExpired));
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_logout_forgets_everything() {
    let storage = MemoryStorage::new();
    let mock = MockCardhub::start().await;
    mock.add_account(EMAIL, PASSWORD, "chandra");
    let session = AuthSession::new(mock.client(20), &storage);
    session.login(EMAIL, &password(PASSWORD)).await.unwrap();

    session.logout().unwrap();
    for key in [keys::TOKEN, keys::REFRESH_TOKEN, keys::USER] {
        assert!(storage.get_item(key).unwrap().is_none(), "{key} left behind");
    }
}

#[tokio::test]
async fn test_register_signs_in() {
    let mock = MockCardhub::start().await;
    let session = AuthSession::new(mock.client(20), MemoryStorage::new());

    let form = Registration {
        username: "nissa".to_owned(),
        email: "nissa@zendikar.example".to_owned(),
        password: password("leylines"),
        confirm_password: password("leylines"),
    };
    let user = session.register(&form).await.unwrap();

    assert_eq!(user.username.as_deref(), Some("nissa"));
    assert!(session.is_signed_in().unwrap());
    assert_eq!(
        mock.requests(),
        vec![
            "POST /auth/register".to_owned(),
            "POST /auth/login".to_owned(),
            "GET /auth/user".to_owned(),
        ]
    );
}

#[tokio::test]
async fn test_register_duplicate_email_reports_reason() {
    let (_mock, session) = with_account().await;

    let form = Registration {
        username: "chandra2".to_owned(),
        email: EMAIL.to_owned(),
        password: password("another"),
        confirm_password: password("another"),
    };
    let err = session.register(&form).await.unwrap_err();
    let AuthError::Rejected(reason) = &err else {
        panic!("expected a rejection, got {err:?}");
    };
    assert_eq!(reason, "User with this email already exists");
    assert!(!session.is_signed_in().unwrap());
}

#[tokio::test]
async fn test_register_mismatched_passwords_sends_nothing() {
    let mock = MockCardhub::start().await;
    let session = AuthSession::new(mock.client(20), MemoryStorage::new());

    let form = Registration {
        username: "nissa".to_owned(),
        email: "nissa@zendikar.example".to_owned(),
        password: password("leylines"),
        confirm_password: password("ley-lines"),
    };
    let err = session.register(&form).await.unwrap_err();
    assert!(matches!(err, AuthError::PasswordMismatch));
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_profile_form_links_telegram() {
    let (mock, session) = with_account().await;
    let user = session.login(EMAIL, &password(PASSWORD)).await.unwrap();

    let mut form = ProfileForm::new(user);
    assert_eq!(form.telegram_status(), TelegramStatus::NotLinked);

    form.edit();
    form.set_telegram_username("@chandra_tg");
    let message = form.save(&session).await.unwrap();

    assert_eq!(message.as_deref(), Some("Profile updated successfully"));
    assert!(!form.is_editing());
    assert_eq!(
        form.telegram_status(),
        TelegramStatus::PendingVerification {
            handle: "chandra_tg".to_owned()
        }
    );

    let stored = session.user().unwrap().unwrap();
    assert_eq!(stored.telegram_username.as_deref(), Some("chandra_tg"));
    assert_eq!(stored.username.as_deref(), Some("chandra"));

    let row = mock.account_row(EMAIL).unwrap();
    assert_eq!(row.get(7).and_then(serde_json::Value::as_str), Some("chandra_tg"));
    assert!(mock.requests().contains(&"PUT /auth/user_update_profile".to_owned()));
}

#[tokio::test]
async fn test_profile_save_without_changes_sends_nothing() {
    let (mock, session) = with_account().await;
    let user = session.login(EMAIL, &password(PASSWORD)).await.unwrap();
    let before = mock.requests().len();

    let mut form = ProfileForm::new(user);
    form.edit();
    form.set_username("  ");
    assert_eq!(form.save(&session).await.unwrap(), None);
    assert_eq!(mock.requests().len(), before);
}
