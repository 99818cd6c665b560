//! # Domain Types
//!
//! Core domain types for the Bazaar storefront backend.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌──────────────────┐      │
//! │  │    Product      │   │      Cart       │   │      Order       │      │
//! │  │  ─────────────  │   │  ─────────────  │   │  ──────────────  │      │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)       │      │
//! │  │  price_cents    │   │  session_id     │   │  order_number    │      │
//! │  │  discount price │   │  CartLine[]     │   │  OrderLine[]     │      │
//! │  │  stock          │   │  (live prices)  │   │  (frozen prices) │      │
//! │  └─────────────────┘   └─────────────────┘   └────────┬─────────┘      │
//! │                                                       │ 1:0..1         │
//! │                                              ┌────────▼─────────┐      │
//! │                                              │ DeliveryTracking │      │
//! │                                              └──────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//! A cart owns its lines and an order owns its line snapshots by plain
//! foreign-key ids; there are no back-references. DeliveryTracking is
//! lifecycle-bound to its order.
//!
//! ## Dual-Key Identity Pattern
//! Orders have both `id` (UUID v4, for relations) and `order_number`
//! (human-readable, time-derived, what customers quote on the phone).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::status::{DeliveryStatus, OrderStatus, PaymentStatus};

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
///
/// This core reads products (price, stock, availability, category) and
/// decrements stock at checkout; catalog management itself lives elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown in carts and captured into order lines.
    pub name: String,

    /// Optional long description.
    pub description: Option<String>,

    /// Primary image URL, captured into order lines at checkout.
    pub image_url: Option<String>,

    /// Category slug (lowercase), e.g. "shoes", "clothes", "food".
    pub category_slug: String,

    /// List price in cents.
    pub price_cents: i64,

    /// Discounted price in cents, when a promotion is running.
    pub discount_price_cents: Option<i64>,

    /// Units in stock. Never negative.
    pub stock: i64,

    /// Whether the product can currently be purchased.
    pub is_available: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the list price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// The effective unit price: discount price when present, else price.
    ///
    /// This is the price carts display and orders freeze at checkout.
    #[inline]
    pub fn effective_price(&self) -> Money {
        Money::from_cents(crate::pricing::effective_unit_price_cents(
            self.price_cents,
            self.discount_price_cents,
        ))
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A session-scoped shopping cart.
///
/// Keyed by an opaque, caller-supplied session token; created lazily on
/// first use and cleared (not deleted) when converted into an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Cart {
    pub id: String,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line in a cart.
///
/// Stores only the product reference and the shopper's choices; prices are
/// read live from the catalog at view time and frozen only at checkout.
/// At most one line exists per product per cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartLine {
    pub id: String,
    pub cart_id: String,
    pub product_id: String,
    /// Quantity in cart, always >= 1.
    pub quantity: i64,
    pub selected_size: Option<String>,
    pub selected_color: Option<String>,
    pub special_instructions: Option<String>,
    pub added_at: DateTime<Utc>,
}

// =============================================================================
// Cart Views
// =============================================================================

/// A cart line joined with live catalog data, for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    /// Cart line id (what update/remove operations address).
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub product_image: Option<String>,
    /// Current list price in cents.
    pub price_cents: i64,
    /// Current discount price in cents, if any.
    pub discount_price_cents: Option<i64>,
    pub quantity: i64,
    pub selected_size: Option<String>,
    pub selected_color: Option<String>,
    pub special_instructions: Option<String>,
    /// Effective unit price × quantity, in cents.
    pub line_subtotal_cents: i64,
    /// Current stock, so the client can cap quantity steppers.
    pub available_stock: i64,
}

/// The computed view of a cart: lines plus totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub session_id: String,
    /// Lines in insertion order.
    pub lines: Vec<CartLineView>,
    /// Sum of line subtotals, in cents.
    pub subtotal_cents: i64,
    /// Sum of line quantities.
    pub total_items: i64,
}

impl CartView {
    /// An empty view for a session with no cart yet.
    pub fn empty(session_id: impl Into<String>) -> Self {
        CartView {
            session_id: session_id.into(),
            lines: Vec::new(),
            subtotal_cents: 0,
            total_items: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Customer Details
// =============================================================================

/// Contact and delivery fields supplied at checkout, snapshotted onto the
/// order verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    pub name: String,
    pub email: Option<String>,
    pub phone: String,
    pub address: String,
    pub city: Option<String>,
    pub notes: Option<String>,
    /// Payment method label, e.g. "COD" or a gateway name. Opaque here.
    pub payment_method: Option<String>,
}

// =============================================================================
// Order
// =============================================================================

/// An immutable, priced order.
///
/// Created once, atomically, from a cart. Afterwards only the two status
/// fields (plus `payment_ref` and `updated_at`) ever change; line items and
/// captured prices are frozen, which keeps the order an audit-safe record
/// independent of later catalog edits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    /// Human-readable, globally unique, time-derived.
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: String,
    pub delivery_address: String,
    pub delivery_city: Option<String>,
    pub delivery_notes: Option<String>,
    pub subtotal_cents: i64,
    pub delivery_charge_cents: i64,
    /// Reserved for future promotions; always 0 today.
    pub discount_cents: i64,
    /// subtotal + delivery charge - discount.
    pub total_cents: i64,
    pub payment_method: Option<String>,
    /// Gateway transaction reference, set by `set_payment_status`.
    pub payment_ref: Option<String>,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    /// Uppercased category slug of the first cart line, e.g. "FOOD".
    pub order_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Returns the order total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// A line item in an order.
/// Uses the snapshot pattern to freeze product data at order time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Product name at order time (frozen).
    pub product_name: String,
    /// Product image at order time (frozen).
    pub product_image: Option<String>,
    /// Effective unit price in cents at order time (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub selected_size: Option<String>,
    pub selected_color: Option<String>,
    pub special_instructions: Option<String>,
    /// unit price × quantity, in cents.
    pub line_subtotal_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// An order with its line snapshots and optional tracking record, as
/// returned by every order-level operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    pub order: Order,
    pub lines: Vec<OrderLine>,
    pub tracking: Option<DeliveryTracking>,
}

// =============================================================================
// Delivery Tracking
// =============================================================================

/// Customer-facing fulfillment tracking, one-to-one with a tracked order.
///
/// Created at order time for tracked order types, then mutated only by the
/// order state machine. Courier and timestamp fields are populated by ops
/// tooling when available.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DeliveryTracking {
    pub id: String,
    pub order_id: String,
    pub status: DeliveryStatus,
    pub status_message: String,
    pub courier_name: Option<String>,
    pub courier_phone: Option<String>,
    pub estimated_delivery_at: Option<DateTime<Utc>>,
    pub actual_delivery_at: Option<DateTime<Utc>>,
    pub last_updated: DateTime<Utc>,
}

// =============================================================================
// Pagination
// =============================================================================

/// A page of results for admin listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Total matching rows across all pages.
    pub total: i64,
    /// Zero-based page index.
    pub page: u32,
    pub size: u32,
}

impl<T> Page<T> {
    /// Number of pages needed for `total` rows at this page size.
    pub fn total_pages(&self) -> i64 {
        if self.size == 0 {
            0
        } else {
            (self.total + self.size as i64 - 1) / self.size as i64
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
