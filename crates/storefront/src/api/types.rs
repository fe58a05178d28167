//! Named types for CardHub API data.
//!
//! The service returns rows as positional arrays; [`super::wire`] turns them
//! into these structs so nothing else in the crate indexes into a tuple.

use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use cardhub_core::{Availability, CardId, Price, Quality, UserId};

use crate::cart::CatalogItem;

// =============================================================================
// Catalog
// =============================================================================

/// A catalog card joined with its inventory totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: CardId,
    /// Colour identity: `White`, `Blue`, ..., `Multicolor` or `Colorless`.
    pub color: Option<String>,
    pub set_code: String,
    pub set_name: String,
    pub collector_number: String,
    pub name: String,
    pub type_line: String,
    pub image_url_small: Option<String>,
    pub image_url_normal: Option<String>,
    pub image_url_large: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Copies in stock across all grades.
    pub in_stock: u32,
    /// Cheapest copy in stock.
    pub min_price: Option<Price>,
    /// Grades that have stock.
    pub available_qualities: Vec<Quality>,
    pub availability: Availability,
}

impl Card {
    #[must_use]
    pub const fn is_preorder(&self) -> bool {
        self.availability.is_preorder()
    }

    /// Snapshot for a cart line.
    #[must_use]
    pub fn to_catalog_item(&self) -> CatalogItem {
        CatalogItem {
            id: self.id,
            name: self.name.clone(),
            set_code: self.set_code.clone(),
            set_name: self.set_name.clone(),
            image_url_small: self.image_url_small.clone(),
            price: self.min_price,
            is_preorder: self.is_preorder(),
        }
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage {
    /// Matches reported by the service, across all pages.
    pub total: usize,
    pub cards: Vec<Card>,
    /// 1-based page number.
    pub page: usize,
    pub limit: usize,
    pub has_more: bool,
}

impl SearchPage {
    /// A page with no results.
    #[must_use]
    pub const fn empty(page: usize, limit: usize) -> Self {
        Self {
            total: 0,
            cards: Vec::new(),
            page,
            limit,
            has_more: false,
        }
    }

    /// Number of pages needed for `total` results.
    #[must_use]
    pub const fn page_count(&self) -> usize {
        if self.limit == 0 {
            0
        } else {
            self.total.div_ceil(self.limit)
        }
    }
}

// =============================================================================
// Accounts
// =============================================================================

/// Login payload.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Registration payload.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// Tokens issued by a successful login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
}

/// A storefront account.
///
/// Also stored locally as the signed-in user's snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: Option<String>,
    pub role: String,
    pub email_confirmed: bool,
    pub telegram_chat_id: Option<i64>,
    pub telegram_username: Option<String>,
    pub telegram_verified: bool,
    pub shipping_address: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    /// Name to greet the user with: the username, or the email local part.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| self.email.split('@').next().unwrap_or(&self.email))
    }
}

/// Fields a user may change. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram_username: Option<String>,
}

impl ProfileUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.username.is_none() && self.telegram_username.is_none()
    }
}

/// What the service says after a profile update.
#[derive(Debug, Clone)]
pub struct ProfileUpdated {
    pub message: String,
    /// The refreshed account, when the service echoes it back.
    pub user: Option<User>,
}
