//! # Error Types
//!
//! Domain-specific error types for bazaar-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bazaar-core errors (this file)                                        │
//! │  └── CoreError        - Recoverable business rule violations           │
//! │                                                                         │
//! │  bazaar-db errors (separate crate)                                     │
//! │  ├── DbError          - Database/infrastructure failures               │
//! │  └── StoreError       - CoreError + DbError, what callers see          │
//! │                                                                         │
//! │  Flow: CoreError ─┬─► StoreError ─► transport layer ─► client          │
//! │        DbError  ──┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, id, counts)
//! 3. Errors are enum variants, never String
//! 4. Every variant here is an expected, caller-recoverable condition

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. None of them is fatal:
/// the operation that raised one has applied no partial effects, and the
/// caller can correct the request and retry.
#[derive(Debug, Error)]
pub enum CoreError {
    /// An entity (cart, cart line, product, order, tracking) is absent.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Product exists but is not currently purchasable.
    #[error("Product is not available: {name}")]
    Unavailable { name: String },

    /// Requested quantity exceeds what is in stock.
    ///
    /// Carries the product identity and the available quantity so the
    /// client can show "Only 3 left" style messaging.
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// Checkout attempted on a cart with zero lines.
    #[error("Cart is empty for session: {session_id}")]
    EmptyCart { session_id: String },

    /// A status string from external tooling is not a recognized value.
    #[error("Unrecognized status: {0}")]
    InvalidStatus(String),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and id.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
