//! Checkout entry points.
//!
//! Orders are not submitted from the storefront yet: each action validates
//! what would be sent, logs it, and reports that checkout is unavailable.
//! Pre-orders will go to a manager who agrees the price, purchases to
//! payment.

use thiserror::Error;
use tracing::info;

use crate::cart::{CartSection, CartSummary};

/// Which part of the cart a checkout covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutKind {
    Purchase,
    Preorder,
    All,
}

impl std::fmt::Display for CheckoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Purchase => "purchase",
            Self::Preorder => "pre-order",
            Self::All => "combined",
        })
    }
}

/// Errors from checkout actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CheckoutError {
    /// Nothing in the part of the cart being checked out.
    #[error("there is nothing to check out for {0}")]
    Empty(CheckoutKind),

    /// Combined checkout needs both purchases and pre-orders.
    #[error("combined checkout needs both in-stock cards and pre-orders")]
    NotCombinable,

    /// Checkout exists in the interface but does not submit orders yet.
    #[error("{0} checkout is not available yet")]
    NotAvailable(CheckoutKind),
}

/// Check out the in-stock cards.
///
/// # Errors
///
/// Returns [`CheckoutError::Empty`] for an empty section, otherwise
/// [`CheckoutError::NotAvailable`].
pub fn checkout_purchase(summary: &CartSummary<'_>) -> Result<(), CheckoutError> {
    submit(CheckoutKind::Purchase, &[&summary.purchase])
}

/// Send the pre-order lines to a manager.
///
/// # Errors
///
/// Returns [`CheckoutError::Empty`] for an empty section, otherwise
/// [`CheckoutError::NotAvailable`].
pub fn checkout_preorder(summary: &CartSummary<'_>) -> Result<(), CheckoutError> {
    submit(CheckoutKind::Preorder, &[&summary.preorder])
}

/// Check out both sections at once.
///
/// # Errors
///
/// Returns [`CheckoutError::Empty`] for an empty cart,
/// [`CheckoutError::NotCombinable`] when only one section has lines, and
/// [`CheckoutError::NotAvailable`] otherwise.
pub fn checkout_all(summary: &CartSummary<'_>) -> Result<(), CheckoutError> {
    if summary.is_empty() {
        return Err(CheckoutError::Empty(CheckoutKind::All));
    }
    if !summary.offers_combined_checkout() {
        return Err(CheckoutError::NotCombinable);
    }
    submit(CheckoutKind::All, &[&summary.purchase, &summary.preorder])
}

fn submit(kind: CheckoutKind, sections: &[&CartSection<'_>]) -> Result<(), CheckoutError> {
    if sections.iter().all(|s| s.is_empty()) {
        return Err(CheckoutError::Empty(kind));
    }

    for line in sections.iter().flat_map(|s| s.lines.iter()) {
        info!(
            %kind,
            card_id = %line.item.id,
            name = %line.item.name,
            quality = %line.quality,
            quantity = line.quantity,
            "Checkout line"
        );
    }

    Err(CheckoutError::NotAvailable(kind))
}
