//! # Order State Machine Tables
//!
//! Status enums for orders, payments and delivery tracking, plus the
//! transition table that keeps delivery tracking synchronized with order
//! status changes.
//!
//! ## Fulfillment Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Status Flow                                 │
//! │                                                                         │
//! │  PENDING ─► CONFIRMED ─► PREPARING ─► READY ─► OUT_FOR_DELIVERY        │
//! │     │           │            │          │             │                 │
//! │     │           │            │          │             ▼                 │
//! │     └───────────┴────────────┴──────────┴──────► DELIVERED (terminal)  │
//! │                        │                                                │
//! │                        └───────► CANCELLED (terminal, from any         │
//! │                                  non-terminal state)                   │
//! │                                                                         │
//! │  Each transition with a row in ORDER_TRACKING_TABLE also rewrites      │
//! │  the order's DeliveryTracking record (status + customer message).     │
//! │  PENDING has no row: it never touches tracking.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine applies whatever target status the caller requests; sequencing
//! is the admin tooling's responsibility. Only unrecognized status strings
//! are rejected, at parse time, with [`CoreError::InvalidStatus`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// =============================================================================
// Order Status
// =============================================================================

/// Fulfillment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Order placed, not yet acknowledged.
    Pending,
    /// Order acknowledged (manually or by payment completion).
    Confirmed,
    /// Order is being prepared.
    Preparing,
    /// Order ready for pickup / dispatch.
    Ready,
    /// Courier is on the way.
    OutForDelivery,
    /// Order reached the customer. Terminal.
    Delivered,
    /// Order cancelled. Terminal.
    Cancelled,
}

impl OrderStatus {
    /// Canonical wire name, as stored in the database and exposed over JSON.
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Whether the status admits no further transitions.
    pub const fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// The tracking-domain equivalent of this order status, if any.
    ///
    /// Looked up in [`ORDER_TRACKING_TABLE`]. `PENDING` returns `None`:
    /// a pending order leaves its tracking record untouched.
    pub fn tracking_update(self) -> Option<(DeliveryStatus, &'static str)> {
        ORDER_TRACKING_TABLE
            .iter()
            .find(|(status, _, _)| *status == self)
            .map(|(_, tracking, message)| (*tracking, *message))
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(OrderStatus::Pending),
            "CONFIRMED" => Ok(OrderStatus::Confirmed),
            "PREPARING" => Ok(OrderStatus::Preparing),
            "READY" => Ok(OrderStatus::Ready),
            "OUT_FOR_DELIVERY" => Ok(OrderStatus::OutForDelivery),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" => Ok(OrderStatus::Cancelled),
            other => Err(CoreError::InvalidStatus(other.to_string())),
        }
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Payment status of an order.
///
/// Updated by an external actor (payment gateway callback or admin); this
/// core treats it as an opaque status field with one cross-field rule: a
/// completed payment may not leave the order in `PENDING` fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Canonical wire name.
    pub const fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Completed => "COMPLETED",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Refunded => "REFUNDED",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PaymentStatus::Pending),
            "COMPLETED" => Ok(PaymentStatus::Completed),
            "FAILED" => Ok(PaymentStatus::Failed),
            "REFUNDED" => Ok(PaymentStatus::Refunded),
            other => Err(CoreError::InvalidStatus(other.to_string())),
        }
    }
}

// =============================================================================
// Delivery Status
// =============================================================================

/// Status of a delivery-tracking record.
///
/// Mirrors a subset of [`OrderStatus`] plus the initial `ORDER_PLACED`
/// state that only order creation produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    OrderPlaced,
    Confirmed,
    Preparing,
    Ready,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl DeliveryStatus {
    /// Short label shown in tracking UIs.
    pub const fn display_name(self) -> &'static str {
        match self {
            DeliveryStatus::OrderPlaced => "Order Placed",
            DeliveryStatus::Confirmed => "Order Confirmed",
            DeliveryStatus::Preparing => "Preparing your order",
            DeliveryStatus::Ready => "Ready for pickup",
            DeliveryStatus::OutForDelivery => "Out for delivery",
            DeliveryStatus::Delivered => "Delivered",
            DeliveryStatus::Cancelled => "Cancelled",
        }
    }
}

/// Message attached to a freshly created tracking record.
pub const TRACKING_PLACED_MESSAGE: &str = "Your order has been placed";

// =============================================================================
// Order Status → Tracking Transition Table
// =============================================================================

/// The full order-status → tracking mapping, as data.
///
/// One row per order status that cascades into delivery tracking. Kept as
/// an explicit table rather than inline branching so the whole state
/// machine can be audited and tested in one place. `PENDING` deliberately
/// has no row.
pub const ORDER_TRACKING_TABLE: &[(OrderStatus, DeliveryStatus, &str)] = &[
    (
        OrderStatus::Confirmed,
        DeliveryStatus::Confirmed,
        "Your order has been confirmed",
    ),
    (
        OrderStatus::Preparing,
        DeliveryStatus::Preparing,
        "Your order is being prepared",
    ),
    (
        OrderStatus::Ready,
        DeliveryStatus::Ready,
        "Your order is ready for pickup",
    ),
    (
        OrderStatus::OutForDelivery,
        DeliveryStatus::OutForDelivery,
        "Your order is out for delivery",
    ),
    (
        OrderStatus::Delivered,
        DeliveryStatus::Delivered,
        "Your order has been delivered",
    ),
    (
        OrderStatus::Cancelled,
        DeliveryStatus::Cancelled,
        "Your order has been cancelled",
    ),
];

// =============================================================================
// Order Types & Tracking Policy
// =============================================================================

/// Order types (uppercased category slugs) that get a delivery-tracking
/// record created alongside the order.
///
/// Food orders are perishable and customers expect live tracking; shoe and
/// clothing orders are fulfilled without it.
pub const TRACKED_ORDER_TYPES: &[&str] = &["FOOD"];

/// Whether orders of the given type carry a delivery-tracking record.
pub fn requires_tracking(order_type: &str) -> bool {
    TRACKED_ORDER_TYPES.contains(&order_type)
}

// =============================================================================
// Unit Tests
// =============================================================================
