//! # Product Repository
//!
//! Catalog reads and the one catalog write this core owns: the guarded
//! stock decrement.
//!
//! ## Guarded Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Why the decrement is one conditional UPDATE                │
//! │                                                                         │
//! │  ❌ WRONG: read stock, check in Rust, then write the new value         │
//! │     SELECT stock ... ; if ok { UPDATE products SET stock = 2 }          │
//! │     Two concurrent checkouts both read stock=5 and both "succeed".     │
//! │                                                                         │
//! │  ✅ CORRECT: check and decrement in a single statement                 │
//! │     UPDATE products SET stock = stock - ?                               │
//! │     WHERE id = ? AND stock >= ?                                         │
//! │                                                                         │
//! │  rows_affected = 0 means the guard failed: either the product is       │
//! │  gone or there is not enough stock. SQLite applies the statement       │
//! │  atomically, so stock can never go below zero under any schedule.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use bazaar_core::{CoreError, Product};

use crate::error::StoreResult;
use crate::ids::Clock;

/// Repository for catalog reads and stock updates.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        ProductRepository { pool, clock }
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    /// Lists purchasable products, sorted by name.
    pub async fn list_available(&self, limit: u32) -> StoreResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, name, description, image_url, category_slug,
                price_cents, discount_price_cents, stock, is_available,
                created_at, updated_at
            FROM products
            WHERE is_available = 1
            ORDER BY name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product (seeding and tests; catalog management is
    /// otherwise external).
    pub async fn insert(&self, product: &Product) -> StoreResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, image_url, category_slug,
                price_cents, discount_price_cents, stock, is_available,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.image_url)
        .bind(&product.category_slug)
        .bind(product.price_cents)
        .bind(product.discount_price_cents)
        .bind(product.stock)
        .bind(product.is_available)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Decrements stock by `quantity`, failing if that would oversell.
    ///
    /// Returns the new stock level. Fails with `InsufficientStock` (carrying
    /// the available quantity) when `quantity` exceeds stock, or `NotFound`
    /// when the product does not exist.
    pub async fn decrement_stock(&self, id: &str, quantity: i64) -> StoreResult<i64> {
        debug!(id = %id, quantity = %quantity, "Decrementing stock");

        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;
        let remaining = apply_stock_decrement(&mut tx, id, quantity, now).await?;
        tx.commit().await?;

        Ok(remaining)
    }

    /// Counts products (for seeding diagnostics).
    pub async fn count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Shared Helpers (also used inside the checkout transaction)
// =============================================================================

/// Fetches a product on an existing connection/transaction.
pub(crate) async fn fetch_product(
    conn: &mut SqliteConnection,
    product_id: &str,
) -> StoreResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT
            id, name, description, image_url, category_slug,
            price_cents, discount_price_cents, stock, is_available,
            created_at, updated_at
        FROM products
        WHERE id = ?1
        "#,
    )
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

/// The guarded decrement: `stock = stock - ?` only while `stock >= ?`.
///
/// Runs on the caller's connection so the checkout transaction gets the
/// same statement (and the same rollback behavior) as the standalone
/// [`ProductRepository::decrement_stock`]. Returns the new stock level.
pub(crate) async fn apply_stock_decrement(
    conn: &mut SqliteConnection,
    product_id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> StoreResult<i64> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock = stock - ?2, updated_at = ?3
        WHERE id = ?1 AND stock >= ?2
        "#,
    )
    .bind(product_id)
    .bind(quantity)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        // Guard failed: distinguish a missing product from an oversell.
        return match fetch_product(conn, product_id).await? {
            None => Err(CoreError::not_found("Product", product_id).into()),
            Some(product) => Err(CoreError::InsufficientStock {
                product_id: product.id,
                name: product.name,
                available: product.stock,
                requested: quantity,
            }
            .into()),
        };
    }

    let remaining: i64 = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
        .bind(product_id)
        .fetch_one(&mut *conn)
        .await?;

    Ok(remaining)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use bazaar_core::CoreError;

    use crate::error::StoreError;
    use crate::repository::fixtures;

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = fixtures::test_db().await;
        let p = fixtures::product("Trail Runner", "shoes", 250_000, Some(199_900), 8);
        db.products().insert(&p).await.unwrap();

        let loaded = db.products().get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Trail Runner");
        assert_eq!(loaded.effective_price().cents(), 199_900);
        assert_eq!(loaded.stock, 8);
        assert!(loaded.is_available);

        assert!(db.products().get_by_id("missing").await.unwrap().is_none());
        assert_eq!(db.products().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_decrement_stock_happy_path() {
        let db = fixtures::test_db().await;
        let p = fixtures::product("Chicken Momo", "food", 30_000, None, 5);
        db.products().insert(&p).await.unwrap();

        let remaining = db.products().decrement_stock(&p.id, 3).await.unwrap();
        assert_eq!(remaining, 2);

        let remaining = db.products().decrement_stock(&p.id, 2).await.unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_decrement_stock_never_goes_negative() {
        let db = fixtures::test_db().await;
        let p = fixtures::product("Veg Thukpa", "food", 25_000, None, 2);
        db.products().insert(&p).await.unwrap();

        let err = db.products().decrement_stock(&p.id, 3).await.unwrap_err();
        match err {
            StoreError::Domain(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // The failed decrement changed nothing.
        let stock = db.products().get_by_id(&p.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 2);
    }

    #[tokio::test]
    async fn test_decrement_missing_product() {
        let db = fixtures::test_db().await;
        let err = db.products().decrement_stock("ghost", 1).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(CoreError::NotFound { entity: "Product", .. })
        ));
    }
}
