//! Cart line and catalog snapshot types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cardhub_core::{CardId, Price, Quality};

/// What the cart remembers about a card.
///
/// Captured once when the card is first added and never refreshed, so the
/// cart keeps showing the price and availability the shopper saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: CardId,
    pub name: String,
    pub set_code: String,
    pub set_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url_small: Option<String>,
    /// Lowest inventory price. Pre-order cards usually have none.
    #[serde(default)]
    pub price: Option<Price>,
    pub is_preorder: bool,
}

/// Identity of a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub card_id: CardId,
    pub quality: Quality,
}

/// One (card, grade, quantity) entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(rename = "card")]
    pub item: CatalogItem,
    pub quality: Quality,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    #[must_use]
    pub const fn key(&self) -> LineKey {
        LineKey {
            card_id: self.item.id,
            quality: self.quality,
        }
    }

    #[must_use]
    pub fn matches(&self, card_id: CardId, quality: Quality) -> bool {
        self.item.id == card_id && self.quality == quality
    }

    #[must_use]
    pub const fn is_preorder(&self) -> bool {
        self.item.is_preorder
    }

    /// Quantity times unit price; unpriced items count as zero.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.item
            .price
            .map_or(Decimal::ZERO, |p| p.times(self.quantity).amount)
    }
}
