//! Shopping cart aggregate.
//!
//! The cart is a small ordered list of [`CartLine`]s kept under two caps: at
//! most [`MAX_CART_ITEMS`] cards in total and at most [`MAX_ITEM_QUANTITY`]
//! copies per (card, grade) line. Lines are split for display and checkout
//! into purchasable cards (in stock) and pre-orders.
//!
//! # Persistence
//!
//! The full line list is written through a [`CartPersistence`] port on every
//! successful change. Each change builds the next state, saves it, and only
//! then swaps it in, so neither a rejection nor a failed write leaves the
//! cart half-updated.
//!
//! # Example
//!
//! ```rust,ignore
//! let storage = FileStorage::open(&config.state_dir)?;
//! let mut cart = Cart::load(&storage)?;
//!
//! match cart.add(item, Quality::NM, 2) {
//!     Ok(()) => {}
//!     Err(CartError::Rejected(why)) => notify(why.to_string()),
//!     Err(e) => return Err(e.into()),
//! }
//! ```

mod limits;
mod line;
mod summary;

#[cfg(test)]
mod properties;

pub use limits::{CartLimits, MAX_CART_ITEMS, MAX_ITEM_QUANTITY, Rejection};
pub use line::{CartLine, CatalogItem, LineKey};
pub use summary::{CartSection, CartSummary};

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, warn};

use cardhub_core::{CardId, CurrencyCode, Price, Quality};

use crate::storage::{LocalStorage, LocalStorageExt, StorageError, keys};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The change breaks a capacity rule. The cart is unchanged.
    #[error("{0}")]
    Rejected(#[from] Rejection),

    /// The new state could not be saved. The cart is unchanged.
    #[error("failed to save cart: {0}")]
    Storage(#[from] StorageError),
}

/// Where a cart is loaded from and saved to.
pub trait CartPersistence {
    /// Load previously saved lines, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored record cannot be read or decoded.
    fn load(&self) -> Result<Option<Vec<CartLine>>, StorageError>;

    /// Replace the saved lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn save(&self, lines: &[CartLine]) -> Result<(), StorageError>;
}

/// Any [`LocalStorage`] keeps the cart as one JSON array under [`keys::CART`].
impl<S: LocalStorage> CartPersistence for S {
    fn load(&self) -> Result<Option<Vec<CartLine>>, StorageError> {
        self.get_json(keys::CART)
    }

    fn save(&self, lines: &[CartLine]) -> Result<(), StorageError> {
        self.set_json(keys::CART, lines)
    }
}

/// The shopping cart.
#[derive(Debug)]
pub struct Cart<P> {
    lines: Vec<CartLine>,
    limits: CartLimits,
    store: P,
}

impl<P: CartPersistence> Cart<P> {
    /// Hydrate a cart from `store` with the default limits.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store cannot be read at all. A corrupt
    /// record is logged and replaced by an empty cart.
    pub fn load(store: P) -> Result<Self, StorageError> {
        Self::load_with_limits(store, CartLimits::default())
    }

    /// Hydrate a cart from `store` with custom limits.
    ///
    /// Saved lines that break the limits (for example after the limits were
    /// lowered) are dropped with a warning; the rest keep their order.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn load_with_limits(store: P, limits: CartLimits) -> Result<Self, StorageError> {
        let saved = match store.load() {
            Ok(saved) => saved.unwrap_or_default(),
            Err(StorageError::Corrupt { key, source }) => {
                warn!(key, error = %source, "Discarding unreadable saved cart");
                Vec::new()
            }
            Err(e) => return Err(e),
        };

        let lines = sanitize(saved, limits);
        debug!(lines = lines.len(), "Cart loaded");
        Ok(Self {
            lines,
            limits,
            store,
        })
    }

    /// Add `quantity` copies of `item` in the given grade.
    ///
    /// Merges into an existing line for the same card and grade.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Rejected`] if `quantity` is zero or either cap
    /// would be exceeded, and [`CartError::Storage`] if saving fails. In both
    /// cases the cart is unchanged.
    pub fn add(
        &mut self,
        item: CatalogItem,
        quality: Quality,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(Rejection::EmptyQuantity.into());
        }

        let total = self.count().saturating_add(quantity);
        let mut next = self.lines.clone();

        if let Some(line) = next.iter_mut().find(|l| l.matches(item.id, quality)) {
            let merged = line.quantity.saturating_add(quantity);
            self.limits.check(merged, total)?;
            line.quantity = merged;
        } else {
            self.limits.check(quantity, total)?;
            next.push(CartLine {
                item,
                quality,
                quantity,
                added_at: Utc::now(),
            });
        }

        self.commit(next)
    }

    /// Add one near-mint copy.
    ///
    /// # Errors
    ///
    /// See [`Cart::add`].
    pub fn add_one(&mut self, item: CatalogItem) -> Result<(), CartError> {
        self.add(item, Quality::default(), 1)
    }

    /// Remove the line for `card_id` in `quality`.
    ///
    /// Returns `false` (and writes nothing) when there is no such line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if saving fails.
    pub fn remove(&mut self, card_id: CardId, quality: Quality) -> Result<bool, CartError> {
        if !self.lines.iter().any(|l| l.matches(card_id, quality)) {
            return Ok(false);
        }

        let next = self
            .lines
            .iter()
            .filter(|l| !l.matches(card_id, quality))
            .cloned()
            .collect();
        self.commit(next)?;
        Ok(true)
    }

    /// Replace the quantity of an existing line.
    ///
    /// A quantity below 1 is ignored: callers that want the line gone call
    /// [`Cart::remove`]. Returns `false` when nothing changed because of that
    /// or because the line does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Rejected`] if a cap would be exceeded and
    /// [`CartError::Storage`] if saving fails.
    pub fn set_quantity(
        &mut self,
        card_id: CardId,
        quality: Quality,
        quantity: u32,
    ) -> Result<bool, CartError> {
        if quantity < 1 || self.line(card_id, quality).is_none() {
            return Ok(false);
        }

        let others: u32 = self
            .lines
            .iter()
            .filter(|l| !l.matches(card_id, quality))
            .map(|l| l.quantity)
            .sum();
        self.limits.check(quantity, others.saturating_add(quantity))?;

        let mut next = self.lines.clone();
        for line in next.iter_mut().filter(|l| l.matches(card_id, quality)) {
            line.quantity = quantity;
        }

        self.commit(next)?;
        Ok(true)
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Storage`] if saving fails.
    pub fn clear(&mut self) -> Result<(), CartError> {
        self.commit(Vec::new())
    }

    fn commit(&mut self, next: Vec<CartLine>) -> Result<(), CartError> {
        self.store.save(&next)?;
        self.lines = next;
        debug!(lines = self.lines.len(), cards = self.count(), "Cart saved");
        Ok(())
    }
}

impl<P> Cart<P> {
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub const fn limits(&self) -> CartLimits {
        self.limits
    }

    /// Find the line for `card_id` in `quality`.
    #[must_use]
    pub fn line(&self, card_id: CardId, quality: Quality) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.matches(card_id, quality))
    }

    /// Lines for cards that can be bought now.
    pub fn purchasable(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.iter().filter(|l| !l.is_preorder())
    }

    /// Lines for cards that can only be pre-ordered.
    pub fn preorderable(&self) -> impl Iterator<Item = &CartLine> {
        self.lines.iter().filter(|l| l.is_preorder())
    }

    /// Total number of cards.
    #[must_use]
    pub fn count(&self) -> u32 {
        count(&self.lines)
    }

    /// Total price of every line.
    #[must_use]
    pub fn total(&self) -> Price {
        total(&self.lines)
    }

    /// Purchase and pre-order sections with their totals.
    #[must_use]
    pub fn summary(&self) -> CartSummary<'_> {
        CartSummary::new(&self.lines, self.limits)
    }
}

/// Sum of quantities over `lines`.
pub fn count<'a>(lines: impl IntoIterator<Item = &'a CartLine>) -> u32 {
    lines.into_iter().map(|l| l.quantity).sum()
}

/// Sum of quantity times price over `lines`, in the shop currency.
pub fn total<'a>(lines: impl IntoIterator<Item = &'a CartLine>) -> Price {
    let amount: Decimal = lines.into_iter().map(CartLine::subtotal).sum();
    Price::new(amount, CurrencyCode::default())
}

/// Re-apply the cart invariants to lines read back from storage.
fn sanitize(saved: Vec<CartLine>, limits: CartLimits) -> Vec<CartLine> {
    let mut lines: Vec<CartLine> = Vec::with_capacity(saved.len());
    let mut running = 0u32;

    for line in saved {
        let key = line.key();
        let existing = lines.iter().position(|l| l.key() == key);
        let merged = existing
            .and_then(|i| lines.get(i))
            .map_or(line.quantity, |l| l.quantity.saturating_add(line.quantity));
        let proposed_total = running.saturating_add(line.quantity);

        if line.quantity == 0 || limits.check(merged, proposed_total).is_err() {
            warn!(
                card_id = %key.card_id,
                quality = %key.quality,
                quantity = line.quantity,
                "Dropping saved cart line that breaks cart limits"
            );
            continue;
        }

        running = proposed_total;
        match existing.and_then(|i| lines.get_mut(i)) {
            Some(l) => l.quantity = merged,
            None => lines.push(line),
        }
    }

    lines
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn card(id: i64, price: Option<&str>) -> CatalogItem {
        CatalogItem {
            id: CardId::new(id),
            name: format!("Card {id}"),
            set_code: "dmu".to_owned(),
            set_name: "Dominaria United".to_owned(),
            image_url_small: None,
            price: price.map(|p| Price::new(p.parse().unwrap(), CurrencyCode::RUB)),
            is_preorder: price.is_none(),
        }
    }

    fn empty_cart(storage: &MemoryStorage) -> Cart<&MemoryStorage> {
        Cart::load(storage).unwrap()
    }

    fn quantities<P>(cart: &Cart<P>) -> Vec<(i64, Quality, u32)> {
        cart.lines()
            .iter()
            .map(|l| (l.item.id.get(), l.quality, l.quantity))
            .collect()
    }

    #[test]
    fn test_add_to_empty_cart_creates_one_line() {
        for q in 1..=4 {
            let storage = MemoryStorage::new();
            let mut cart = empty_cart(&storage);
            cart.add(card(1, Some("10")), Quality::NM, q).unwrap();
            assert_eq!(quantities(&cart), vec![(1, Quality::NM, q)]);
        }
    }

    #[test]
    fn test_add_zero_is_rejected() {
        let storage = MemoryStorage::new();
        let mut cart = empty_cart(&storage);
        let err = cart.add(card(1, None), Quality::NM, 0).unwrap_err();
        assert!(matches!(err, CartError::Rejected(Rejection::EmptyQuantity)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_same_card_and_grade_merges() {
        let storage = MemoryStorage::new();
        let mut cart = empty_cart(&storage);
        cart.add(card(1, Some("10")), Quality::NM, 1).unwrap();
        cart.add(card(1, Some("10")), Quality::NM, 3).unwrap();
        assert_eq!(quantities(&cart), vec![(1, Quality::NM, 4)]);
    }

    #[test]
    fn test_merge_over_line_cap_is_fully_rejected() {
        let storage = MemoryStorage::new();
        let mut cart = empty_cart(&storage);
        cart.add(card(1, Some("10")), Quality::NM, 3).unwrap();
        let err = cart.add(card(1, Some("10")), Quality::NM, 2).unwrap_err();
        assert!(matches!(
            err,
            CartError::Rejected(Rejection::LineFull {
                max: 4,
                requested: 5
            })
        ));
        assert_eq!(quantities(&cart), vec![(1, Quality::NM, 3)]);
    }

    #[test]
    fn test_new_line_over_line_cap_is_rejected() {
        let storage = MemoryStorage::new();
        let mut cart = empty_cart(&storage);
        let err = cart.add(card(1, None), Quality::SP, 5).unwrap_err();
        assert!(matches!(err, CartError::Rejected(Rejection::LineFull { .. })));
        assert!(cart.is_empty());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_different_grades_are_separate_lines() {
        let storage = MemoryStorage::new();
        let mut cart = empty_cart(&storage);
        cart.add(card(1, Some("10")), Quality::NM, 4).unwrap();
        cart.add(card(1, Some("10")), Quality::HP, 4).unwrap();
        assert_eq!(
            quantities(&cart),
            vec![(1, Quality::NM, 4), (1, Quality::HP, 4)]
        );
    }

    #[test]
    fn test_cart_cap_holds_across_any_add_sequence() {
        let storage = MemoryStorage::new();
        let mut cart = empty_cart(&storage);
        let mut grades = Quality::ALL.into_iter().cycle();
        let mut outcomes = Vec::new();

        for step in 0..60u32 {
            let id = i64::from(step % 9);
            let quality = grades.next().unwrap();
            let quantity = step % 5 + 1;
            outcomes.push(cart.add(card(id, Some("1")), quality, quantity).is_ok());

            assert!(cart.count() <= MAX_CART_ITEMS);
            assert!(
                cart.lines()
                    .iter()
                    .all(|l| (1..=MAX_ITEM_QUANTITY).contains(&l.quantity))
            );
        }

        assert!(outcomes.iter().any(|ok| *ok));
        assert!(outcomes.iter().any(|ok| !ok));
    }

    #[test]
    fn test_worked_example() {
        let storage = MemoryStorage::new();
        let mut cart = empty_cart(&storage);
        let a = card(1, Some("100"));
        let b = card(2, Some("50"));

        cart.add(a.clone(), Quality::NM, 3).unwrap();
        assert_eq!(quantities(&cart), vec![(1, Quality::NM, 3)]);

        assert!(cart.add(a, Quality::NM, 2).is_err());
        assert_eq!(quantities(&cart), vec![(1, Quality::NM, 3)]);

        assert!(cart.set_quantity(CardId::new(1), Quality::NM, 4).unwrap());
        assert_eq!(quantities(&cart), vec![(1, Quality::NM, 4)]);

        let err = cart.add(b, Quality::SP, 18).unwrap_err();
        assert!(matches!(
            err,
            CartError::Rejected(Rejection::CartFull {
                max: 20,
                requested: 22
            })
        ));
        assert_eq!(quantities(&cart), vec![(1, Quality::NM, 4)]);
    }

    #[test]
    fn test_set_quantity_zero_is_noop() {
        let storage = MemoryStorage::new();
        let mut cart = empty_cart(&storage);
        cart.add(card(1, Some("10")), Quality::NM, 2).unwrap();
        let before = cart.lines().to_vec();

        assert!(!cart.set_quantity(CardId::new(1), Quality::NM, 0).unwrap());
        assert_eq!(cart.lines(), before.as_slice());
    }

    #[test]
    fn test_set_quantity_missing_line_is_noop() {
        let storage = MemoryStorage::new();
        let mut cart = empty_cart(&storage);
        assert!(!cart.set_quantity(CardId::new(9), Quality::NM, 2).unwrap());
        assert!(!cart.set_quantity(CardId::new(9), Quality::NM, 50).unwrap());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_checks_against_other_lines() {
        let storage = MemoryStorage::new();
        let mut cart = empty_cart(&storage);
        for id in 1..=4 {
            cart.add(card(id, Some("1")), Quality::NM, 4).unwrap();
        }
        cart.add(card(5, Some("1")), Quality::NM, 2).unwrap();
        assert_eq!(cart.count(), 18);

        assert!(cart.set_quantity(CardId::new(5), Quality::NM, 4).unwrap());
        assert_eq!(cart.count(), 20);

        assert!(cart.set_quantity(CardId::new(5), Quality::NM, 1).unwrap());
        let err = cart.set_quantity(CardId::new(5), Quality::NM, 5).unwrap_err();
        assert!(matches!(
            err,
            CartError::Rejected(Rejection::CartFull {
                max: 20,
                requested: 21
            })
        ));
        assert_eq!(cart.line(CardId::new(5), Quality::NM).unwrap().quantity, 1);

        assert!(cart.remove(CardId::new(4), Quality::NM).unwrap());
        let err = cart.set_quantity(CardId::new(5), Quality::NM, 5).unwrap_err();
        assert!(matches!(err, CartError::Rejected(Rejection::LineFull { .. })));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let storage = MemoryStorage::new();
        let mut cart = empty_cart(&storage);
        cart.add(card(1, Some("10")), Quality::NM, 1).unwrap();
        cart.add(card(2, Some("10")), Quality::NM, 1).unwrap();

        assert!(cart.remove(CardId::new(1), Quality::NM).unwrap());
        let after_first = cart.lines().to_vec();
        assert!(!cart.remove(CardId::new(1), Quality::NM).unwrap());
        assert_eq!(cart.lines(), after_first.as_slice());
        assert_eq!(quantities(&cart), vec![(2, Quality::NM, 1)]);
    }

    #[test]
    fn test_clear_empties_and_persists() {
        let storage = MemoryStorage::new();
        let mut cart = empty_cart(&storage);
        cart.add(card(1, Some("10")), Quality::NM, 2).unwrap();
        cart.clear().unwrap();
        assert!(cart.is_empty());

        let reloaded = Cart::load(&storage).unwrap();
        assert!(reloaded.is_empty());
    }

    #[test]
    fn test_views_partition_the_cart() {
        let storage = MemoryStorage::new();
        let mut cart = empty_cart(&storage);
        cart.add(card(1, Some("10")), Quality::NM, 2).unwrap();
        cart.add(card(2, None), Quality::NM, 1).unwrap();
        cart.add(card(3, Some("2.5")), Quality::MP, 4).unwrap();
        cart.add(card(4, None), Quality::DM, 3).unwrap();

        let purchase: Vec<_> = cart.purchasable().map(CartLine::key).collect();
        let preorder: Vec<_> = cart.preorderable().map(CartLine::key).collect();

        assert_eq!(purchase.len() + preorder.len(), cart.lines().len());
        assert!(purchase.iter().all(|k| !preorder.contains(k)));
        assert!(cart.lines().iter().all(|l| {
            purchase.contains(&l.key()) || preorder.contains(&l.key())
        }));

        assert_eq!(count(cart.purchasable()), 6);
        assert_eq!(count(cart.preorderable()), 4);
        assert_eq!(total(cart.purchasable()).amount, Decimal::from(30));
        assert!(total(cart.preorderable()).is_zero());
        assert_eq!(cart.total().amount, Decimal::from(30));
    }

    #[test]
    fn test_changes_survive_reload() {
        let storage = MemoryStorage::new();
        {
            let mut cart = empty_cart(&storage);
            cart.add(card(1, Some("10")), Quality::SP, 2).unwrap();
            cart.add(card(2, None), Quality::NM, 1).unwrap();
        }
        let cart = Cart::load(&storage).unwrap();
        assert_eq!(
            quantities(&cart),
            vec![(1, Quality::SP, 2), (2, Quality::NM, 1)]
        );
    }

    #[test]
    fn test_failed_save_leaves_cart_unchanged() {
        let storage = MemoryStorage::new();
        let mut cart = empty_cart(&storage);
        cart.add(card(1, Some("10")), Quality::NM, 1).unwrap();
        storage.set_read_only(true);

        let err = cart.add(card(1, Some("10")), Quality::NM, 1).unwrap_err();
        assert!(matches!(err, CartError::Storage(StorageError::ReadOnly)));
        assert!(cart.remove(CardId::new(1), Quality::NM).is_err());
        assert!(cart.clear().is_err());
        assert_eq!(quantities(&cart), vec![(1, Quality::NM, 1)]);
    }

    #[test]
    fn test_corrupt_record_loads_as_empty() {
        let storage = MemoryStorage::new();
        storage.set_item(keys::CART, "[{\"broken\":").unwrap();
        let cart = Cart::load(&storage).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_load_drops_lines_that_break_limits() {
        let storage = MemoryStorage::new();
        let line = |id: i64, quality, quantity| CartLine {
            item: card(id, Some("1")),
            quality,
            quantity,
            added_at: Utc::now(),
        };
        let saved = vec![
            line(1, Quality::NM, 0),
            line(2, Quality::NM, 6),
            line(3, Quality::NM, 3),
            line(3, Quality::NM, 1),
            line(3, Quality::NM, 1),
            line(4, Quality::NM, 4),
            line(5, Quality::NM, 4),
            line(6, Quality::NM, 4),
            line(7, Quality::NM, 4),
            line(8, Quality::NM, 1),
        ];
        storage.set_json(keys::CART, &saved).unwrap();

        let cart = Cart::load(&storage).unwrap();
        assert_eq!(
            quantities(&cart),
            vec![
                (3, Quality::NM, 4),
                (4, Quality::NM, 4),
                (5, Quality::NM, 4),
                (6, Quality::NM, 4),
                (7, Quality::NM, 4),
            ]
        );
        assert_eq!(cart.count(), 20);
    }

    #[test]
    fn test_custom_limits() {
        let storage = MemoryStorage::new();
        let limits = CartLimits {
            max_total: 3,
            max_per_line: 2,
        };
        let mut cart = Cart::load_with_limits(&storage, limits).unwrap();
        cart.add(card(1, Some("1")), Quality::NM, 2).unwrap();
        assert!(cart.add(card(2, Some("1")), Quality::NM, 2).is_err());
        cart.add(card(2, Some("1")), Quality::NM, 1).unwrap();
        assert_eq!(cart.count(), 3);
        assert_eq!(cart.limits(), limits);
    }
}
