//! Stock availability of a catalog card.

use serde::{Deserialize, Serialize};

/// Whether a card can be bought now or only pre-ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// At least one copy is in stock.
    InStock,
    /// No stock; orderable through the unpriced pre-order flow.
    Preorder,
}

impl Availability {
    /// Derive availability from the stock count the inventory reports.
    #[must_use]
    pub const fn from_stock(in_stock: u32) -> Self {
        if in_stock > 0 {
            Self::InStock
        } else {
            Self::Preorder
        }
    }

    /// Whether this is a pre-order.
    #[must_use]
    pub const fn is_preorder(self) -> bool {
        matches!(self, Self::Preorder)
    }
}
