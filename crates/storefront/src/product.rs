//! Card detail view.

use cardhub_core::{Price, Quality};

use crate::api::Card;
use crate::cart::{Cart, CartError, CartPersistence, MAX_ITEM_QUANTITY, Rejection};

/// Image shown when a card has no scan.
pub const CARD_BACK_IMAGE: &str = "assets/magic-card-back.webp";

/// Detail model for one card, with the grade and quantity the user is about
/// to add.
#[derive(Debug, Clone)]
pub struct ProductPopup {
    card: Card,
    quality: Quality,
    quantity: u32,
    /// Copies of this card already in the cart, per grade.
    held: Vec<(Quality, u32)>,
}

impl ProductPopup {
    #[must_use]
    pub fn new(card: Card) -> Self {
        let mut popup = Self {
            card,
            quality: Quality::default(),
            quantity: 1,
            held: Vec::new(),
        };
        let choices = popup.quality_choices();
        if !choices.contains(&popup.quality) {
            popup.quality = choices.first().copied().unwrap_or_default();
        }
        popup
    }

    #[must_use]
    pub const fn card(&self) -> &Card {
        &self.card
    }

    /// "Pre-order" or "In stock".
    #[must_use]
    pub const fn heading(&self) -> &'static str {
        if self.card.is_preorder() {
            "Pre-order"
        } else {
            "In stock"
        }
    }

    /// Normal-size scan, or the card back when there is none.
    #[must_use]
    pub fn image_url(&self) -> &str {
        self.card
            .image_url_normal
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(CARD_BACK_IMAGE)
    }

    /// Starting price for in-stock cards. Pre-orders are priced later.
    #[must_use]
    pub const fn price_from(&self) -> Option<Price> {
        if self.card.is_preorder() {
            None
        } else {
            self.card.min_price
        }
    }

    /// Grades the user can pick.
    ///
    /// Any grade can be pre-ordered. In-stock cards offer the grades they
    /// have, or every grade when the service did not say.
    #[must_use]
    pub fn quality_choices(&self) -> Vec<Quality> {
        if self.card.is_preorder() || self.card.available_qualities.is_empty() {
            Quality::ALL.to_vec()
        } else {
            self.card.available_qualities.clone()
        }
    }

    #[must_use]
    pub const fn quality(&self) -> Quality {
        self.quality
    }

    /// Pick a grade. Returns `false` if it is not on offer.
    pub fn select_quality(&mut self, quality: Quality) -> bool {
        let offered = self.quality_choices().contains(&quality);
        if offered {
            self.quality = quality;
            self.set_quantity(self.quantity);
        }
        offered
    }

    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Record what `cart` already holds of this card.
    ///
    /// Until this is called the popup assumes none.
    pub fn sync_with_cart<P>(&mut self, cart: &Cart<P>) {
        self.held = cart
            .lines()
            .iter()
            .filter(|l| l.item.id == self.card.id)
            .map(|l| (l.quality, l.quantity))
            .collect();
        self.set_quantity(self.quantity);
    }

    /// Copies of this card in the selected grade already in the cart.
    #[must_use]
    pub fn in_cart(&self) -> u32 {
        self.held
            .iter()
            .filter(|(quality, _)| *quality == self.quality)
            .map(|(_, quantity)| quantity)
            .sum()
    }

    /// Upper bound of the quantity stepper.
    ///
    /// What is left of the per-line cap for the selected grade, and for
    /// in-stock cards also of the stock, after the copies already in the
    /// cart. Stock is shared by every grade of the card. Zero means nothing
    /// more can be added.
    #[must_use]
    pub fn max_quantity(&self) -> u32 {
        let line_left = MAX_ITEM_QUANTITY.saturating_sub(self.in_cart());
        if self.card.is_preorder() {
            return line_left;
        }
        let held: u32 = self.held.iter().map(|(_, quantity)| quantity).sum();
        line_left.min(self.card.in_stock.saturating_sub(held))
    }

    /// Set the quantity, clamped to `1..=max_quantity()` (or to 1 when
    /// nothing more fits).
    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity.clamp(1, self.max_quantity().max(1));
    }

    pub fn increment(&mut self) {
        self.set_quantity(self.quantity.saturating_add(1));
    }

    pub fn decrement(&mut self) {
        self.set_quantity(self.quantity.saturating_sub(1));
    }

    /// Add the selection to `cart`. The quantity resets to 1 on success.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::OutOfStock`] when the cart would hold more copies
    /// of an in-stock card than are in stock, otherwise the cart's rejection
    /// or storage error. The selection is kept so the user can adjust it.
    pub fn add_to_cart<P: CartPersistence>(&mut self, cart: &mut Cart<P>) -> Result<(), CartError> {
        if !self.card.is_preorder() {
            let held: u32 = cart
                .lines()
                .iter()
                .filter(|l| l.item.id == self.card.id)
                .map(|l| l.quantity)
                .sum();
            let requested = held.saturating_add(self.quantity);
            if requested > self.card.in_stock {
                return Err(Rejection::OutOfStock {
                    in_stock: self.card.in_stock,
                    requested,
                }
                .into());
            }
        }

        cart.add(self.card.to_catalog_item(), self.quality, self.quantity)?;
        self.quantity = 1;
        self.sync_with_cart(cart);
        Ok(())
    }
}
