//! Cart capacity rules.

use thiserror::Error;

/// Maximum number of cards across the whole cart.
pub const MAX_CART_ITEMS: u32 = 20;

/// Maximum copies of one card in one grade.
pub const MAX_ITEM_QUANTITY: u32 = 4;

/// Why a cart change was refused.
///
/// A rejection is an expected outcome, not a failure: the caller shows the
/// message and the cart stays exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Adding zero copies.
    #[error("quantity must be at least 1")]
    EmptyQuantity,

    /// The change would push the whole cart over its limit.
    #[error("the cart holds at most {max} cards (this would make {requested})")]
    CartFull { max: u32, requested: u32 },

    /// The change would push one line over its limit.
    #[error("at most {max} copies of one card per grade (this would make {requested})")]
    LineFull { max: u32, requested: u32 },

    /// The cart would hold more copies of an in-stock card than the shop has.
    #[error("only {in_stock} in stock (this would make {requested} in the cart)")]
    OutOfStock { in_stock: u32, requested: u32 },
}

/// The two independent caps a cart enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLimits {
    pub max_total: u32,
    pub max_per_line: u32,
}

impl Default for CartLimits {
    fn default() -> Self {
        Self {
            max_total: MAX_CART_ITEMS,
            max_per_line: MAX_ITEM_QUANTITY,
        }
    }
}

impl CartLimits {
    /// Validate a proposed cart state.
    ///
    /// `line_quantity` is what the affected line would hold afterwards and
    /// `total` is what the whole cart would hold. The cart-wide cap is checked
    /// first, so a change that breaks both reports [`Rejection::CartFull`].
    ///
    /// # Errors
    ///
    /// Returns the first cap the proposal breaks.
    pub const fn check(&self, line_quantity: u32, total: u32) -> Result<(), Rejection> {
        if total > self.max_total {
            return Err(Rejection::CartFull {
                max: self.max_total,
                requested: total,
            });
        }
        if line_quantity > self.max_per_line {
            return Err(Rejection::LineFull {
                max: self.max_per_line,
                requested: line_quantity,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_shop_policy() {
        let limits = CartLimits::default();
        assert_eq!(limits.max_total, 20);
        assert_eq!(limits.max_per_line, 4);
    }

    #[test]
    fn test_check_accepts_boundaries() {
        let limits = CartLimits::default();
        assert_eq!(limits.check(4, 20), Ok(()));
        assert_eq!(limits.check(1, 1), Ok(()));
    }

    #[test]
    fn test_check_reports_cart_cap_before_line_cap() {
        let limits = CartLimits::default();
        assert_eq!(
            limits.check(18, 22),
            Err(Rejection::CartFull {
                max: 20,
                requested: 22
            })
        );
        assert_eq!(
            limits.check(5, 5),
            Err(Rejection::LineFull {
                max: 4,
                requested: 5
            })
        );
    }

    #[test]
    fn test_rejection_messages() {
        let msg = Rejection::CartFull {
            max: 20,
            requested: 22,
        }
        .to_string();
        assert_eq!(msg, "the cart holds at most 20 cards (this would make 22)");
    }

    #[test]
    fn test_check_follows_raised_limits() {
        let limits = CartLimits {
            max_total: 40,
            max_per_line: 8,
        };
        assert_eq!(limits.check(6, 6), Ok(()));
        assert_eq!(
            limits.check(9, 9),
            Err(Rejection::LineFull {
                max: 8,
                requested: 9
            })
        );
    }

    #[test]
    fn test_out_of_stock_message() {
        let msg = Rejection::OutOfStock {
            in_stock: 2,
            requested: 3,
        }
        .to_string();
        assert_eq!(msg, "only 2 in stock (this would make 3 in the cart)");
    }
}
