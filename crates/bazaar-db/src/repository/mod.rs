//! # Repository Module
//!
//! Database repository implementations for the Bazaar backend.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Layout                                    │
//! │                                                                         │
//! │  Transport layer (external)                                            │
//! │       │                                                                 │
//! │       │  db.carts().add_item(session, product, qty, ...)               │
//! │       │  db.orders().place_order(session, customer)                    │
//! │       ▼                                                                 │
//! │  ProductRepository   - catalog reads + guarded stock decrement         │
//! │  CartRepository      - session carts and their lines                   │
//! │  OrderRepository     - the cart→order transaction, status machine,     │
//! │                        listings, tracking reads                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Stock is read by CartRepository but mutated ONLY inside               │
//! │  OrderRepository's checkout transaction (via the shared guarded        │
//! │  decrement in product.rs). That split is what prevents add-to-cart     │
//! │  from double-booking inventory before checkout.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cart;
pub mod order;
pub mod product;

// =============================================================================
// Shared Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod fixtures {
    use std::sync::Arc;

    use chrono::Utc;

    use bazaar_core::{CustomerDetails, Product};

    use crate::ids::new_row_id;
    use crate::ids::test_support::SequenceOrderNumbers;
    use crate::pool::{Database, DbConfig};

    /// Fresh in-memory database with deterministic order numbers.
    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory())
            .await
            .expect("in-memory database")
            .with_order_numbers(Arc::new(SequenceOrderNumbers::default()))
    }

    pub fn product(
        name: &str,
        category: &str,
        price_cents: i64,
        discount_price_cents: Option<i64>,
        stock: i64,
    ) -> Product {
        let now = Utc::now();
        Product {
            id: new_row_id(),
            name: name.to_string(),
            description: None,
            image_url: Some(format!("https://img.example/{}.jpg", name.replace(' ', "-"))),
            category_slug: category.to_string(),
            price_cents,
            discount_price_cents,
            stock,
            is_available: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn customer() -> CustomerDetails {
        CustomerDetails {
            name: "Asha Gurung".to_string(),
            email: Some("asha@example.com".to_string()),
            phone: "9800000001".to_string(),
            address: "Lakeside, Pokhara".to_string(),
            city: Some("Pokhara".to_string()),
            notes: None,
            payment_method: Some("COD".to_string()),
        }
    }
}
