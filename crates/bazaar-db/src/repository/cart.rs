//! # Cart Repository
//!
//! Session carts and their lines.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Store Operations                                │
//! │                                                                         │
//! │  Client Action            Operation                Effect               │
//! │  ─────────────            ─────────                ──────               │
//! │                                                                         │
//! │  Open shop ──────────────► get_or_create() ──────► lazy cart row       │
//! │                                                                         │
//! │  Add product ────────────► add_item() ───────────► merge or new line   │
//! │                                                                         │
//! │  Change quantity ────────► set_item_quantity() ──► update / remove     │
//! │                                                                         │
//! │  Remove line ────────────► remove_item() ────────► delete line         │
//! │                                                                         │
//! │  Checkout done ──────────► clear() ──────────────► delete all lines    │
//! │                                                                         │
//! │  View cart ──────────────► view() ───────────────► (pure read)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - At most one line per product per cart: adding an already-present
//!   product merges quantities (and takes the latest size/color/notes)
//!   instead of duplicating the line. `UNIQUE(cart_id, product_id)`
//!   backstops this at the schema level.
//! - Lines store no prices. The view reads live catalog prices; prices are
//!   frozen only when the order engine converts the cart.
//! - Stock is *read* to validate quantities but never mutated here. Only
//!   checkout reserves inventory, so items sitting in carts never block
//!   other shoppers.

use std::sync::Arc;

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use bazaar_core::pricing;
use bazaar_core::{Cart, CartLine, CartLineView, CartView, CoreError, Money};

use crate::error::StoreResult;
use crate::ids::{new_row_id, Clock};
use crate::repository::product::fetch_product;

/// Repository for cart operations, keyed by session id.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>) -> Self {
        CartRepository { pool, clock }
    }

    /// Returns the session's cart, creating an empty one on first access.
    ///
    /// Never fails for a well-formed session id: the insert is
    /// conflict-safe, so concurrent first requests for one session all
    /// land on the same row.
    pub async fn get_or_create(&self, session_id: &str) -> StoreResult<Cart> {
        let mut conn = self.pool.acquire().await?;

        if let Some(cart) = fetch_cart_by_session(&mut conn, session_id).await? {
            return Ok(cart);
        }

        let now = self.clock.now();
        debug!(session_id = %session_id, "Creating cart");

        sqlx::query(
            r#"
            INSERT INTO carts (id, session_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (session_id) DO NOTHING
            "#,
        )
        .bind(new_row_id())
        .bind(session_id)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        // Re-read: either our insert or a concurrent one for this session.
        fetch_cart_by_session(&mut conn, session_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Cart", session_id).into())
    }

    /// Adds a product to the session's cart.
    ///
    /// Merges into an existing line for the same product (summing the
    /// quantity, overwriting size/color/instructions with the latest
    /// values) or appends a new line. Validates availability and that the
    /// resulting quantity fits current stock.
    pub async fn add_item(
        &self,
        session_id: &str,
        product_id: &str,
        quantity: i64,
        selected_size: Option<&str>,
        selected_color: Option<&str>,
        special_instructions: Option<&str>,
    ) -> StoreResult<CartView> {
        debug!(session_id = %session_id, product_id = %product_id, quantity = %quantity, "add_item");

        let cart = self.get_or_create(session_id).await?;
        let now = self.clock.now();

        let mut tx = self.pool.begin().await?;

        let product = fetch_product(&mut tx, product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", product_id))?;

        if !product.is_available {
            return Err(CoreError::Unavailable { name: product.name }.into());
        }

        let existing = fetch_line_by_product(&mut tx, &cart.id, product_id).await?;
        let merged_quantity = existing.as_ref().map_or(0, |line| line.quantity) + quantity;

        if merged_quantity > product.stock {
            return Err(CoreError::InsufficientStock {
                product_id: product.id,
                name: product.name,
                available: product.stock,
                requested: merged_quantity,
            }
            .into());
        }

        match existing {
            Some(line) => {
                sqlx::query(
                    r#"
                    UPDATE cart_items
                    SET quantity = ?2,
                        selected_size = ?3,
                        selected_color = ?4,
                        special_instructions = ?5
                    WHERE id = ?1
                    "#,
                )
                .bind(&line.id)
                .bind(merged_quantity)
                .bind(selected_size)
                .bind(selected_color)
                .bind(special_instructions)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO cart_items (
                        id, cart_id, product_id, quantity,
                        selected_size, selected_color, special_instructions, added_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    "#,
                )
                .bind(new_row_id())
                .bind(&cart.id)
                .bind(product_id)
                .bind(quantity)
                .bind(selected_size)
                .bind(selected_color)
                .bind(special_instructions)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            }
        }

        touch_cart(&mut tx, &cart.id, &self.clock).await?;
        tx.commit().await?;

        self.view(session_id).await
    }

    /// Sets a line's quantity; `quantity <= 0` removes the line.
    pub async fn set_item_quantity(
        &self,
        session_id: &str,
        line_id: &str,
        quantity: i64,
    ) -> StoreResult<CartView> {
        debug!(session_id = %session_id, line_id = %line_id, quantity = %quantity, "set_item_quantity");

        let mut tx = self.pool.begin().await?;

        let cart = fetch_cart_by_session(&mut tx, session_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Cart", session_id))?;

        let line = fetch_line(&mut tx, &cart.id, line_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Cart line", line_id))?;

        if quantity <= 0 {
            sqlx::query("DELETE FROM cart_items WHERE id = ?1")
                .bind(&line.id)
                .execute(&mut *tx)
                .await?;
        } else {
            let product = fetch_product(&mut tx, &line.product_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Product", &line.product_id))?;

            if quantity > product.stock {
                return Err(CoreError::InsufficientStock {
                    product_id: product.id,
                    name: product.name,
                    available: product.stock,
                    requested: quantity,
                }
                .into());
            }

            sqlx::query("UPDATE cart_items SET quantity = ?2 WHERE id = ?1")
                .bind(&line.id)
                .bind(quantity)
                .execute(&mut *tx)
                .await?;
        }

        touch_cart(&mut tx, &cart.id, &self.clock).await?;
        tx.commit().await?;

        self.view(session_id).await
    }

    /// Removes a line from the session's cart.
    pub async fn remove_item(&self, session_id: &str, line_id: &str) -> StoreResult<CartView> {
        debug!(session_id = %session_id, line_id = %line_id, "remove_item");

        let mut tx = self.pool.begin().await?;

        let cart = fetch_cart_by_session(&mut tx, session_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Cart", session_id))?;

        let result = sqlx::query("DELETE FROM cart_items WHERE id = ?1 AND cart_id = ?2")
            .bind(line_id)
            .bind(&cart.id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("Cart line", line_id).into());
        }

        touch_cart(&mut tx, &cart.id, &self.clock).await?;
        tx.commit().await?;

        self.view(session_id).await
    }

    /// Removes every line; the cart row itself persists for the session.
    pub async fn clear(&self, session_id: &str) -> StoreResult<()> {
        debug!(session_id = %session_id, "clear cart");

        let mut tx = self.pool.begin().await?;

        let cart = fetch_cart_by_session(&mut tx, session_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Cart", session_id))?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(&cart.id)
            .execute(&mut *tx)
            .await?;

        touch_cart(&mut tx, &cart.id, &self.clock).await?;
        tx.commit().await?;

        Ok(())
    }

    /// Computes the cart view: lines in insertion order with live catalog
    /// prices, per-line subtotals, the cart subtotal and total item count.
    ///
    /// Pure read. A session with no cart yet gets an empty view; no cart
    /// row is created.
    pub async fn view(&self, session_id: &str) -> StoreResult<CartView> {
        let mut conn = self.pool.acquire().await?;

        let Some(cart) = fetch_cart_by_session(&mut conn, session_id).await? else {
            return Ok(CartView::empty(session_id));
        };

        let rows = sqlx::query_as::<_, CartLineJoinRow>(
            r#"
            SELECT
                ci.id,
                ci.product_id,
                p.name AS product_name,
                p.image_url AS product_image,
                p.price_cents,
                p.discount_price_cents,
                ci.quantity,
                ci.selected_size,
                ci.selected_color,
                ci.special_instructions,
                p.stock AS available_stock
            FROM cart_items ci
            INNER JOIN products p ON p.id = ci.product_id
            WHERE ci.cart_id = ?1
            ORDER BY ci.added_at, ci.rowid
            "#,
        )
        .bind(&cart.id)
        .fetch_all(&mut *conn)
        .await?;

        let lines: Vec<CartLineView> = rows.into_iter().map(CartLineJoinRow::into_view).collect();
        let subtotal_cents: i64 = lines.iter().map(|line| line.line_subtotal_cents).sum();
        let total_items: i64 = lines.iter().map(|line| line.quantity).sum();

        Ok(CartView {
            session_id: session_id.to_string(),
            lines,
            subtotal_cents,
            total_items,
        })
    }
}

// =============================================================================
// Row Types
// =============================================================================

/// A cart line joined with its product, straight from SQLite.
#[derive(Debug, sqlx::FromRow)]
struct CartLineJoinRow {
    id: String,
    product_id: String,
    product_name: String,
    product_image: Option<String>,
    price_cents: i64,
    discount_price_cents: Option<i64>,
    quantity: i64,
    selected_size: Option<String>,
    selected_color: Option<String>,
    special_instructions: Option<String>,
    available_stock: i64,
}

impl CartLineJoinRow {
    fn into_view(self) -> CartLineView {
        let unit_price = Money::from_cents(pricing::effective_unit_price_cents(
            self.price_cents,
            self.discount_price_cents,
        ));
        let line_subtotal_cents = unit_price.multiply_quantity(self.quantity).cents();

        CartLineView {
            id: self.id,
            product_id: self.product_id,
            product_name: self.product_name,
            product_image: self.product_image,
            price_cents: self.price_cents,
            discount_price_cents: self.discount_price_cents,
            quantity: self.quantity,
            selected_size: self.selected_size,
            selected_color: self.selected_color,
            special_instructions: self.special_instructions,
            line_subtotal_cents,
            available_stock: self.available_stock,
        }
    }
}

// =============================================================================
// Shared Helpers (also used inside the checkout transaction)
// =============================================================================

/// Fetches a cart by session id on an existing connection/transaction.
pub(crate) async fn fetch_cart_by_session(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> StoreResult<Option<Cart>> {
    let cart = sqlx::query_as::<_, Cart>(
        "SELECT id, session_id, created_at, updated_at FROM carts WHERE session_id = ?1",
    )
    .bind(session_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(cart)
}

/// Fetches a cart's lines in insertion order.
pub(crate) async fn fetch_cart_lines(
    conn: &mut SqliteConnection,
    cart_id: &str,
) -> StoreResult<Vec<CartLine>> {
    let lines = sqlx::query_as::<_, CartLine>(
        r#"
        SELECT
            id, cart_id, product_id, quantity,
            selected_size, selected_color, special_instructions, added_at
        FROM cart_items
        WHERE cart_id = ?1
        ORDER BY added_at, rowid
        "#,
    )
    .bind(cart_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(lines)
}

async fn fetch_line(
    conn: &mut SqliteConnection,
    cart_id: &str,
    line_id: &str,
) -> StoreResult<Option<CartLine>> {
    let line = sqlx::query_as::<_, CartLine>(
        r#"
        SELECT
            id, cart_id, product_id, quantity,
            selected_size, selected_color, special_instructions, added_at
        FROM cart_items
        WHERE id = ?1 AND cart_id = ?2
        "#,
    )
    .bind(line_id)
    .bind(cart_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(line)
}

async fn fetch_line_by_product(
    conn: &mut SqliteConnection,
    cart_id: &str,
    product_id: &str,
) -> StoreResult<Option<CartLine>> {
    let line = sqlx::query_as::<_, CartLine>(
        r#"
        SELECT
            id, cart_id, product_id, quantity,
            selected_size, selected_color, special_instructions, added_at
        FROM cart_items
        WHERE cart_id = ?1 AND product_id = ?2
        "#,
    )
    .bind(cart_id)
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(line)
}

async fn touch_cart(
    conn: &mut SqliteConnection,
    cart_id: &str,
    clock: &Arc<dyn Clock>,
) -> StoreResult<()> {
    sqlx::query("UPDATE carts SET updated_at = ?2 WHERE id = ?1")
        .bind(cart_id)
        .bind(clock.now())
        .execute(&mut *conn)
        .await?;

    Ok(())
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
    async fn test_get_or_create_is_lazy_and_stable() {
        let db = fixtures::test_db().await;

        let first = db.carts().get_or_create("sess-1").await.unwrap();
        let second = db.carts().get_or_create("sess-1").await.unwrap();
        assert_eq!(first.id, second.id);

        let other = db.carts().get_or_create("sess-2").await.unwrap();
        assert_ne!(first.id, other.id);
    }

    #[tokio::test]
    async fn test_add_merges_instead_of_duplicating() {
        let db = fixtures::test_db().await;
        let p = fixtures::product("Chicken Momo", "food", 30_000, None, 10);
        db.products().insert(&p).await.unwrap();

        let view = db
            .carts()
            .add_item("sess-1", &p.id, 2, Some("Regular"), None, Some("less spicy"))
            .await
            .unwrap();
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].quantity, 2);

        // Same product again: one line, summed quantity, latest options win.
        let view = db
            .carts()
            .add_item("sess-1", &p.id, 3, Some("Large"), None, None)
            .await
            .unwrap();
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].quantity, 5);
        assert_eq!(view.lines[0].selected_size.as_deref(), Some("Large"));
        assert_eq!(view.lines[0].special_instructions, None);
        assert_eq!(view.total_items, 5);
    }

    #[tokio::test]
    async fn test_add_validations() {
        let db = fixtures::test_db().await;
        let mut unavailable = fixtures::product("Winter Jacket", "clothes", 450_000, None, 5);
        unavailable.is_available = false;
        db.products().insert(&unavailable).await.unwrap();

        let scarce = fixtures::product("Canvas Sneakers", "shoes", 180_000, None, 5);
        db.products().insert(&scarce).await.unwrap();

        let err = db
            .carts()
            .add_item("sess-1", "ghost", 1, None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(CoreError::NotFound { entity: "Product", .. })
        ));

        let err = db
            .carts()
            .add_item("sess-1", &unavailable.id, 1, None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Domain(CoreError::Unavailable { .. })));

        let err = db
            .carts()
            .add_item("sess-1", &scarce.id, 6, None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(CoreError::InsufficientStock { available: 5, .. })
        ));

        // Merged quantity is validated too: 3 + 3 > 5.
        db.carts()
            .add_item("sess-1", &scarce.id, 3, None, None, None)
            .await
            .unwrap();
        let err = db
            .carts()
            .add_item("sess-1", &scarce.id, 3, None, None, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(CoreError::InsufficientStock { requested: 6, .. })
        ));

        // The failed merge left the original line untouched.
        let view = db.carts().view("sess-1").await.unwrap();
        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.lines[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_view_totals_match_effective_prices() {
        let db = fixtures::test_db().await;
        let full = fixtures::product("Leather Loafers", "shoes", 320_000, None, 10);
        let discounted = fixtures::product("Cotton Kurta", "clothes", 150_000, Some(120_000), 10);
        db.products().insert(&full).await.unwrap();
        db.products().insert(&discounted).await.unwrap();

        db.carts()
            .add_item("sess-1", &full.id, 2, None, None, None)
            .await
            .unwrap();
        let view = db
            .carts()
            .add_item("sess-1", &discounted.id, 3, None, Some("Blue"), None)
            .await
            .unwrap();

        // Per-line subtotal uses the effective price (discount when set).
        assert_eq!(view.lines[0].line_subtotal_cents, 640_000);
        assert_eq!(view.lines[1].line_subtotal_cents, 360_000);

        // Cart subtotal is the sum of line subtotals; item count sums quantities.
        let summed: i64 = view.lines.iter().map(|l| l.line_subtotal_cents).sum();
        assert_eq!(view.subtotal_cents, summed);
        assert_eq!(view.subtotal_cents, 1_000_000);
        assert_eq!(view.total_items, 5);

        // Insertion order is preserved.
        assert_eq!(view.lines[0].product_id, full.id);
        assert_eq!(view.lines[1].available_stock, 10);
    }

    #[tokio::test]
    async fn test_view_unknown_session_is_pure() {
        let db = fixtures::test_db().await;

        let view = db.carts().view("nobody").await.unwrap();
        assert!(view.is_empty());
        assert_eq!(view.subtotal_cents, 0);

        // The read created no cart row.
        let carts: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM carts")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(carts, 0);
    }

    #[tokio::test]
    async fn test_set_item_quantity() {
        let db = fixtures::test_db().await;
        let p = fixtures::product("Veg Thukpa", "food", 25_000, None, 4);
        db.products().insert(&p).await.unwrap();

        let view = db
            .carts()
            .add_item("sess-1", &p.id, 2, None, None, None)
            .await
            .unwrap();
        let line_id = view.lines[0].id.clone();

        let view = db
            .carts()
            .set_item_quantity("sess-1", &line_id, 4)
            .await
            .unwrap();
        assert_eq!(view.lines[0].quantity, 4);

        let err = db
            .carts()
            .set_item_quantity("sess-1", &line_id, 5)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(CoreError::InsufficientStock { available: 4, .. })
        ));

        // Zero (or below) removes the line.
        let view = db
            .carts()
            .set_item_quantity("sess-1", &line_id, 0)
            .await
            .unwrap();
        assert!(view.is_empty());

        let err = db
            .carts()
            .set_item_quantity("sess-1", &line_id, 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(CoreError::NotFound { entity: "Cart line", .. })
        ));

        let err = db
            .carts()
            .set_item_quantity("no-cart", &line_id, 1)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(CoreError::NotFound { entity: "Cart", .. })
        ));
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let db = fixtures::test_db().await;
        let p = fixtures::product("Sel Roti", "food", 8_000, None, 20);
        db.products().insert(&p).await.unwrap();

        let err = db.carts().clear("no-cart").await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(CoreError::NotFound { entity: "Cart", .. })
        ));

        let view = db
            .carts()
            .add_item("sess-1", &p.id, 2, None, None, None)
            .await
            .unwrap();
        let line_id = view.lines[0].id.clone();

        let err = db
            .carts()
            .remove_item("sess-1", "ghost-line")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(CoreError::NotFound { entity: "Cart line", .. })
        ));

        let view = db.carts().remove_item("sess-1", &line_id).await.unwrap();
        assert!(view.is_empty());

        // Clearing empties lines but keeps the cart row for the session.
        let cart = db.carts().get_or_create("sess-1").await.unwrap();
        db.carts()
            .add_item("sess-1", &p.id, 1, None, None, None)
            .await
            .unwrap();
        db.carts().clear("sess-1").await.unwrap();
        assert!(db.carts().view("sess-1").await.unwrap().is_empty());
        assert_eq!(db.carts().get_or_create("sess-1").await.unwrap().id, cart.id);
    }
}
