//! Positional record decoding.
//!
//! The service serializes database rows as JSON arrays. Each row is decoded
//! here exactly once into a named type; field order lives only in the index
//! constants below.
//!
//! Values are read leniently: numbers may arrive as strings, timestamps as
//! RFC 3339 or HTTP dates, and missing trailing fields read as null.

use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;

use cardhub_core::{Availability, CardId, CurrencyCode, Price, Quality, UserId};

use super::ApiError;
use super::types::{Card, User};

// =============================================================================
// Field Order
// =============================================================================

mod card_field {
    pub const ID: usize = 0;
    pub const COLOR: usize = 1;
    pub const SET_CODE: usize = 2;
    pub const SET_NAME: usize = 3;
    pub const COLLECTOR_NUMBER: usize = 4;
    pub const NAME: usize = 5;
    pub const TYPE_LINE: usize = 6;
    pub const IMAGE_SMALL: usize = 7;
    pub const IMAGE_NORMAL: usize = 8;
    pub const IMAGE_LARGE: usize = 9;
    pub const CREATED_AT: usize = 10;
    pub const UPDATED_AT: usize = 11;
    pub const IN_STOCK: usize = 12;
    pub const MIN_PRICE: usize = 13;
    pub const AVAILABLE_QUALITIES: usize = 14;
}

mod user_field {
    pub const ID: usize = 0;
    pub const EMAIL: usize = 1;
    pub const USERNAME: usize = 2;
    pub const ROLE: usize = 3;
    pub const EMAIL_CONFIRMED: usize = 4;
    // 5 is the e-mail verification token, which is never read.
    pub const TELEGRAM_CHAT_ID: usize = 6;
    pub const TELEGRAM_USERNAME: usize = 7;
    pub const TELEGRAM_VERIFIED: usize = 8;
    pub const SHIPPING_ADDRESS: usize = 9;
    pub const CREATED_AT: usize = 10;
    pub const UPDATED_AT: usize = 11;
}

// =============================================================================
// Records
// =============================================================================

/// Decode one card row from the search endpoint.
pub(super) fn card(value: &Value) -> Result<Card, ApiError> {
    use card_field as f;

    let row = Row::new(value, "card")?;
    let id = row.required(f::ID, "id", as_i64)?;
    let in_stock = as_u32(row.get(f::IN_STOCK));

    Ok(Card {
        id: CardId::new(id),
        color: as_opt_string(row.get(f::COLOR)),
        set_code: as_string(row.get(f::SET_CODE)),
        set_name: as_string(row.get(f::SET_NAME)),
        collector_number: as_string(row.get(f::COLLECTOR_NUMBER)),
        name: as_string(row.get(f::NAME)),
        type_line: as_string(row.get(f::TYPE_LINE)),
        image_url_small: as_opt_string(row.get(f::IMAGE_SMALL)),
        image_url_normal: as_opt_string(row.get(f::IMAGE_NORMAL)),
        image_url_large: as_opt_string(row.get(f::IMAGE_LARGE)),
        created_at: as_timestamp(row.get(f::CREATED_AT)),
        updated_at: as_timestamp(row.get(f::UPDATED_AT)),
        in_stock,
        min_price: as_decimal(row.get(f::MIN_PRICE))
            .map(|amount| Price::new(amount, CurrencyCode::default())),
        available_qualities: as_qualities(row.get(f::AVAILABLE_QUALITIES)),
        availability: Availability::from_stock(in_stock),
    })
}

/// Decode the user row from `GET /auth/user`.
pub(super) fn user(value: &Value) -> Result<User, ApiError> {
    use user_field as f;

    let row = Row::new(value, "user")?;
    let id = row.required(f::ID, "id", as_i64)?;
    let email = row.required(f::EMAIL, "email", as_opt_string)?;

    Ok(User {
        id: UserId::new(id),
        email,
        username: as_opt_string(row.get(f::USERNAME)),
        role: as_opt_string(row.get(f::ROLE)).unwrap_or_else(|| "user".to_owned()),
        email_confirmed: as_bool(row.get(f::EMAIL_CONFIRMED)),
        telegram_chat_id: as_i64(row.get(f::TELEGRAM_CHAT_ID)),
        telegram_username: as_opt_string(row.get(f::TELEGRAM_USERNAME)),
        telegram_verified: as_bool(row.get(f::TELEGRAM_VERIFIED)),
        shipping_address: as_opt_string(row.get(f::SHIPPING_ADDRESS)),
        created_at: as_timestamp(row.get(f::CREATED_AT)),
        updated_at: as_timestamp(row.get(f::UPDATED_AT)),
    })
}

/// A JSON array viewed as a positional record.
struct Row<'a> {
    fields: &'a [Value],
    kind: &'static str,
}

impl<'a> Row<'a> {
    fn new(value: &'a Value, kind: &'static str) -> Result<Self, ApiError> {
        value
            .as_array()
            .map(|fields| Self {
                fields: fields.as_slice(),
                kind,
            })
            .ok_or_else(|| ApiError::Decode(format!("{kind} record is not an array")))
    }

    /// Field at `index`, or null past the end.
    fn get(&self, index: usize) -> &'a Value {
        self.fields.get(index).unwrap_or(&Value::Null)
    }

    fn required<T>(
        &self,
        index: usize,
        name: &str,
        read: impl Fn(&Value) -> Option<T>,
    ) -> Result<T, ApiError> {
        read(self.get(index)).ok_or_else(|| {
            ApiError::Decode(format!("{} record has no usable {name}", self.kind))
        })
    }
}

// =============================================================================
// Lenient Scalars
// =============================================================================

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Stock counts: null, negative, or unreadable all mean nothing in stock.
fn as_u32(value: &Value) -> u32 {
    as_i64(value)
        .or_else(|| as_decimal(value).and_then(|d| d.trunc().to_i64()))
        .map_or(0, |n| u32::try_from(n.max(0)).unwrap_or(u32::MAX))
}

/// Non-empty text. Numbers are rendered, so collector number `42` reads
/// as `"42"`.
fn as_opt_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_string(value: &Value) -> String {
    as_opt_string(value).unwrap_or_default()
}

fn as_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "t" | "1"),
        _ => false,
    }
}

fn as_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
        }
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// Timestamps come as HTTP dates (`Tue, 15 Oct 2024 12:00:00 GMT`), RFC 3339,
/// or a bare `YYYY-MM-DD HH:MM:SS` taken as UTC.
fn as_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let text = value.as_str()?.trim();
    DateTime::parse_from_rfc2822(text)
        .or_else(|_| DateTime::parse_from_rfc3339(text))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

/// Grade codes in display order, unknown codes dropped.
fn as_qualities(value: &Value) -> Vec<Quality> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };
    let mut grades: Vec<Quality> = items
        .iter()
        .filter_map(Value::as_str)
        .filter_map(|code| code.parse().ok())
        .collect();
    grades.sort_unstable();
    grades.dedup();
    grades
}
