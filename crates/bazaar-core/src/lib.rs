//! # bazaar-core: Pure Business Logic for the Bazaar Backend
//!
//! This crate is the **heart** of the Bazaar storefront backend. It contains
//! all business logic as pure functions and types with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Bazaar Architecture                               │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            External Transport (HTTP controllers, admin)         │   │
//! │  │    cart add/view ──► place order ──► drive order status         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bazaar-db (Repositories)                     │   │
//! │  │    CartRepository, OrderRepository, ProductRepository           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bazaar-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │  status   │  │   │
//! │  │   │  Product  │  │   Money   │  │ subtotals │  │ statuses, │  │   │
//! │  │   │ Cart/Order│  │  (cents)  │  │ delivery  │  │ tracking  │  │   │
//! │  │   │ Tracking  │  │           │  │  charge   │  │  table    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Cart, Order, DeliveryTracking, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`pricing`] - Effective prices, delivery charge, order totals
//! - [`status`] - Order/payment/delivery statuses and the tracking table
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use bazaar_core::money::Money;
//! use bazaar_core::pricing;
//!
//! // A Rs 999.99 basket pays the flat delivery charge
//! let totals = pricing::order_totals(Money::from_cents(99_999));
//! assert_eq!(totals.delivery_charge.cents(), 10_000);
//!
//! // A Rs 1000.00 basket ships free
//! let totals = pricing::order_totals(Money::from_cents(100_000));
//! assert_eq!(totals.total.cents(), 100_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod status;
pub mod types;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use bazaar_core::Money` instead of
// `use bazaar_core::money::Money`

pub use error::{CoreError, CoreResult};
pub use money::Money;
pub use status::{DeliveryStatus, OrderStatus, PaymentStatus};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Order subtotal (in cents) at and above which delivery is free.
///
/// ## Business Reason
/// Free delivery from Rs 1000 nudges customers toward larger baskets and
/// matches what the storefront advertises.
pub const FREE_DELIVERY_THRESHOLD_CENTS: i64 = 100_000;

/// Flat delivery charge (in cents) for orders below the free threshold.
pub const DELIVERY_CHARGE_CENTS: i64 = 10_000;
