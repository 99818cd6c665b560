//! # Pricing Rules
//!
//! The money math shared by the cart view and the order engine.
//!
//! ## The One Rule That Matters
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Order Pricing                                      │
//! │                                                                         │
//! │  line subtotal   = effective unit price × quantity                     │
//! │  order subtotal  = Σ line subtotals                                    │
//! │  delivery charge = 0        when subtotal >= Rs 1000                   │
//! │                  = Rs 100   otherwise                                  │
//! │  discount        = 0        (reserved for future promotions)           │
//! │  total           = subtotal + delivery charge - discount               │
//! │                                                                         │
//! │  "Effective unit price" is the discount price when one is set,         │
//! │  otherwise the list price.                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Carts compute these numbers against live catalog prices on every view;
//! the order engine computes them once at checkout and freezes the result.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::Product;
use crate::{DELIVERY_CHARGE_CENTS, FREE_DELIVERY_THRESHOLD_CENTS};

// =============================================================================
// Helpers
// =============================================================================

/// The effective unit price rule: discount price when set, else list price.
///
/// Takes raw cents so callers working from joined database rows can apply
/// the same rule as callers holding a full [`Product`].
#[inline]
pub const fn effective_unit_price_cents(price_cents: i64, discount_price_cents: Option<i64>) -> i64 {
    match discount_price_cents {
        Some(discounted) => discounted,
        None => price_cents,
    }
}

/// Subtotal for one line: effective unit price × quantity.
#[inline]
pub fn line_subtotal(product: &Product, quantity: i64) -> Money {
    product.effective_price().multiply_quantity(quantity)
}

/// Delivery charge for a given order subtotal.
///
/// Free delivery kicks in at exactly [`FREE_DELIVERY_THRESHOLD_CENTS`];
/// below it a flat [`DELIVERY_CHARGE_CENTS`] applies.
#[inline]
pub fn delivery_charge(subtotal: Money) -> Money {
    if subtotal.cents() >= FREE_DELIVERY_THRESHOLD_CENTS {
        Money::zero()
    } else {
        Money::from_cents(DELIVERY_CHARGE_CENTS)
    }
}

// =============================================================================
// Order Totals
// =============================================================================

/// The money fields frozen onto an order at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub delivery_charge: Money,
    pub discount: Money,
    pub total: Money,
}

/// Computes the full set of order totals from a subtotal.
///
/// Discount is fixed at zero until a promotion path exists.
pub fn order_totals(subtotal: Money) -> OrderTotals {
    let delivery_charge = delivery_charge(subtotal);
    let discount = Money::zero();
    OrderTotals {
        subtotal,
        delivery_charge,
        discount,
        total: subtotal + delivery_charge - discount,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
