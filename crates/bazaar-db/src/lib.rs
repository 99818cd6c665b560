//! # bazaar-db: Database Layer for the Bazaar Backend
//!
//! This crate provides SQLite persistence for the Bazaar storefront
//! backend: session carts, the cart→order checkout transaction, order
//! lifecycle updates and delivery tracking.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bazaar Data Flow                                 │
//! │                                                                         │
//! │  Transport layer (place_order request)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     bazaar-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  product.rs   │    │  (embedded)  │  │   │
//! │  │   │               │    │  cart.rs      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│  order.rs     │    │ 001_init.sql │  │   │
//! │  │   │ Clock + ids   │    │               │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL mode, foreign keys on)                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and the `Database` handle
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - `DbError` (infrastructure) and `StoreError` (operations)
//! - [`ids`] - Clock and order-number seams, row id generation
//! - [`repository`] - Repository implementations (product, cart, order)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bazaar_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./bazaar.db")).await?;
//!
//! db.carts().add_item("session-token", &product_id, 2, None, None, None).await?;
//! let placed = db.orders().place_order("session-token", &customer).await?;
//! println!("placed {}", placed.order.order_number);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ids;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, StoreError, StoreResult};
pub use ids::{Clock, OrderNumberGenerator, SystemClock, TimestampOrderNumbers};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::cart::CartRepository;
pub use repository::order::OrderRepository;
pub use repository::product::ProductRepository;
