//! Integration tests for CardHub.
//!
//! The tests drive the storefront library against [`MockCardhub`], an
//! in-process axum server that speaks the CardHub wire format: positional
//! card and user rows, bearer tokens, and the `message`/`error` bodies the
//! real service uses.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cardhub-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

use cardhub_storefront::api::CardhubClient;
use cardhub_storefront::config::ApiConfig;

// =============================================================================
// Rows
// =============================================================================

/// A card row as `GET /cards/search/{name}` returns it.
#[must_use]
pub fn card_row(
    id: i64,
    name: &str,
    in_stock: u32,
    min_price: Option<&str>,
    qualities: &[&str],
) -> Value {
    json!([
        id,
        "Red",
        "m10",
        "Magic 2010",
        id.to_string(),
        name,
        "Instant",
        format!("https://cards.example/{id}/small.jpg"),
        format!("https://cards.example/{id}/normal.jpg"),
        null,
        "2024-05-01T10:00:00Z",
        "Wed, 01 May 2024 10:00:00 GMT",
        in_stock,
        min_price,
        qualities,
    ])
}

/// A user row as `GET /auth/user` returns it.
#[must_use]
pub fn user_row(id: i64, email: &str, username: &str) -> Value {
    json!([
        id,
        email,
        username,
        "user",
        true,
        "email-verification-token",
        null,
        null,
        false,
        null,
        "2024-01-15T09:30:00Z",
        "2024-02-01T12:00:00Z",
    ])
}

// =============================================================================
// Mock Service
// =============================================================================

struct Account {
    password: String,
    row: Value,
    token: Option<String>,
}

#[derive(Default)]
struct MockState {
    cards: Mutex<Vec<Value>>,
    accounts: Mutex<HashMap<String, Account>>,
    requests: Mutex<Vec<String>>,
    search_delays: Mutex<HashMap<String, Duration>>,
    tokens_revoked: AtomicBool,
    next_id: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl MockState {
    fn record(&self, line: String) {
        lock(&self.requests).push(line);
    }

    fn account_for_token(&self, headers: &HeaderMap) -> Option<String> {
        if self.tokens_revoked.load(Ordering::SeqCst) {
            return None;
        }
        let token = headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        lock(&self.accounts)
            .iter()
            .find(|(_, account)| account.token.as_deref() == Some(token))
            .map(|(email, _)| email.clone())
    }
}

/// In-process stand-in for the CardHub service.
pub struct MockCardhub {
    addr: SocketAddr,
    state: Arc<MockState>,
    server: JoinHandle<()>,
}

impl MockCardhub {
    /// Bind to an ephemeral port and start serving.
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/cards/search/{name}", get(search))
            .route("/auth/login", post(login))
            .route("/auth/register", post(register))
            .route("/auth/user", get(current_user))
            .route("/auth/user_update_profile", put(update_profile))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("mock server address");
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            addr,
            state,
            server,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).expect("mock server url")
    }

    #[must_use]
    pub fn api_config(&self, page_size: usize) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url(),
            timeout: Duration::from_secs(5),
            page_size,
        }
    }

    #[must_use]
    pub fn client(&self, page_size: usize) -> CardhubClient {
        CardhubClient::new(&self.api_config(page_size)).expect("client")
    }

    pub fn add_card(&self, row: Value) {
        lock(&self.state.cards).push(row);
    }

    /// Register an account directly, bypassing `/auth/register`.
    pub fn add_account(&self, email: &str, password: &str, username: &str) {
        let id = self.state.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let row = user_row(i64::try_from(id).unwrap_or(i64::MAX), email, username);
        lock(&self.state.accounts).insert(
            email.to_owned(),
            Account {
                password: password.to_owned(),
                row,
                token: None,
            },
        );
    }

    /// Hold searches for `query` for `delay` before answering.
    pub fn delay_search(&self, query: &str, delay: Duration) {
        lock(&self.state.search_delays).insert(query.to_lowercase(), delay);
    }

    /// Make every issued token invalid from now on.
    pub fn revoke_tokens(&self) {
        self.state.tokens_revoked.store(true, Ordering::SeqCst);
    }

    /// Requests served so far, as `METHOD /path`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        lock(&self.state.requests).clone()
    }

    /// The stored row for `email`.
    #[must_use]
    pub fn account_row(&self, email: &str) -> Option<Value> {
        lock(&self.state.accounts).get(email).map(|a| a.row.clone())
    }
}

impl Drop for MockCardhub {
    fn drop(&mut self) {
        self.server.abort();
    }
}

// =============================================================================
// Handlers
// =============================================================================

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

async fn search(State(state): State<Arc<MockState>>, Path(name): Path<String>) -> Response {
    state.record(format!("GET /cards/search/{name}"));

    let delay = lock(&state.search_delays).get(&name.to_lowercase()).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let needle = name.to_lowercase();
    let matches: Vec<Value> = lock(&state.cards)
        .iter()
        .filter(|row| {
            row.get(5)
                .and_then(Value::as_str)
                .is_some_and(|n| n.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect();

    reply(StatusCode::OK, json!([matches.len(), matches]))
}

#[derive(Deserialize)]
struct Credentials {
    email: String,
    password: String,
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Credentials>) -> Response {
    state.record("POST /auth/login".to_owned());

    let mut accounts = lock(&state.accounts);
    let Some(account) = accounts.get_mut(&body.email) else {
        return reply(StatusCode::NOT_FOUND, json!({ "message": "User not found" }));
    };
    if account.password != body.password {
        return reply(StatusCode::UNAUTHORIZED, json!({ "message": "Invalid password" }));
    }

    let serial = state.next_id.fetch_add(1, Ordering::SeqCst);
    let token = format!("access-{serial}");
    account.token = Some(token.clone());
    reply(
        StatusCode::OK,
        json!({ "access_token": token, "refresh_token": format!("refresh-{serial}") }),
    )
}

#[derive(Deserialize)]
struct NewAccount {
    username: String,
    email: String,
    password: String,
}

async fn register(State(state): State<Arc<MockState>>, Json(body): Json<NewAccount>) -> Response {
    state.record("POST /auth/register".to_owned());

    if lock(&state.accounts).contains_key(&body.email) {
        return reply(
            StatusCode::CONFLICT,
            json!({ "error": "User with this email already exists" }),
        );
    }

    let id = state.next_id.fetch_add(1, Ordering::SeqCst) + 1;
    let row = user_row(i64::try_from(id).unwrap_or(i64::MAX), &body.email, &body.username);
    lock(&state.accounts).insert(
        body.email,
        Account {
            password: body.password,
            row,
            token: None,
        },
    );
    reply(
        StatusCode::CREATED,
        json!({ "message": "User registered successfully" }),
    )
}

async fn current_user(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.record("GET /auth/user".to_owned());

    let Some(email) = state.account_for_token(&headers) else {
        return reply(StatusCode::UNAUTHORIZED, json!({ "message": "Invalid token" }));
    };
    let row = lock(&state.accounts).get(&email).map(|a| a.row.clone());
    reply(StatusCode::OK, json!({ "user": row }))
}

async fn update_profile(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record("PUT /auth/user_update_profile".to_owned());

    let Some(email) = state.account_for_token(&headers) else {
        return reply(StatusCode::UNAUTHORIZED, json!({ "message": "Invalid token" }));
    };

    let mut accounts = lock(&state.accounts);
    let Some(fields) = accounts
        .get_mut(&email)
        .and_then(|account| account.row.as_array_mut())
    else {
        return reply(StatusCode::NOT_FOUND, json!({ "message": "User not found" }));
    };

    if let (Some(username), Some(slot)) = (body.get("username"), fields.get_mut(2)) {
        *slot = username.clone();
    }
    if let Some(handle) = body.get("telegram_username") {
        if let Some(slot) = fields.get_mut(7) {
            *slot = handle.clone();
        }
        if let Some(slot) = fields.get_mut(8) {
            *slot = Value::Bool(false);
        }
    }

    let row = Value::Array(fields.clone());
    reply(
        StatusCode::OK,
        json!({ "message": "Profile updated successfully", "user": row }),
    )
}
