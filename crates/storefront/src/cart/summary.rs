//! Read-only cart views for display and checkout.

use cardhub_core::Price;

use super::{CartLimits, CartLine, count, total};

/// One half of the cart: either purchases or pre-orders.
#[derive(Debug, Clone)]
pub struct CartSection<'a> {
    pub lines: Vec<&'a CartLine>,
    pub count: u32,
    pub total: Price,
}

impl<'a> CartSection<'a> {
    fn new(lines: Vec<&'a CartLine>) -> Self {
        Self {
            count: count(lines.iter().copied()),
            total: total(lines.iter().copied()),
            lines,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Everything the cart page shows.
#[derive(Debug, Clone)]
pub struct CartSummary<'a> {
    pub purchase: CartSection<'a>,
    /// Pre-order prices are agreed with a manager later, so callers usually
    /// hide this section's total.
    pub preorder: CartSection<'a>,
    pub total: Price,
    pub count: u32,
    /// Number of distinct lines.
    pub positions: usize,
    pub limits: CartLimits,
}

impl<'a> CartSummary<'a> {
    pub(super) fn new(lines: &'a [CartLine], limits: CartLimits) -> Self {
        let (preorder, purchase): (Vec<&CartLine>, Vec<&CartLine>) =
            lines.iter().partition(|l| l.is_preorder());

        Self {
            purchase: CartSection::new(purchase),
            preorder: CartSection::new(preorder),
            total: total(lines),
            count: count(lines),
            positions: lines.len(),
            limits,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.positions == 0
    }

    /// A single "order everything" action only makes sense when both
    /// sections have something in them.
    #[must_use]
    pub fn offers_combined_checkout(&self) -> bool {
        !self.purchase.is_empty() && !self.preorder.is_empty()
    }

    /// How many more cards fit.
    #[must_use]
    pub const fn remaining_capacity(&self) -> u32 {
        self.limits.max_total.saturating_sub(self.count)
    }
}
