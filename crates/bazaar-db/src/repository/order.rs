//! # Order Repository
//!
//! The order engine (cart → order conversion) and the order state machine.
//!
//! ## Checkout Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                place_order: one transaction                             │
//! │                                                                         │
//! │  1. Load cart + lines          (NotFound / EmptyCart)                  │
//! │  2. Per line: re-read product, validate qty <= stock, capture the      │
//! │     effective unit price       (InsufficientStock names the product)   │
//! │  3. Compute subtotal, delivery charge, total                           │
//! │  4. Insert order               (unique order number; collision=fatal)  │
//! │  5. Insert frozen line snapshots                                       │
//! │  6. Guarded stock decrement per line (re-validates under concurrency)  │
//! │  7. Insert ORDER_PLACED tracking for tracked order types               │
//! │  8. Delete the cart's lines    (cart row survives, empty)              │
//! │                                                                         │
//! │  COMMIT ── or any failure rolls back every step: no order row, no      │
//! │  stock change, no cleared cart is ever observable from a failed call.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Status updates
//! `set_order_status` and `set_payment_status` write the order row and its
//! delivery-tracking row (when one exists) in the same transaction, so a
//! reader can never observe an order status without its matching tracking
//! state. The status → tracking mapping itself lives in
//! [`bazaar_core::status::ORDER_TRACKING_TABLE`].

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{debug, error, info};

use bazaar_core::pricing;
use bazaar_core::status::{requires_tracking, TRACKING_PLACED_MESSAGE};
use bazaar_core::{
    CoreError, CustomerDetails, DeliveryStatus, DeliveryTracking, Money, Order, OrderDetails,
    OrderLine, OrderStatus, Page, PaymentStatus,
};

use crate::error::{DbError, StoreError, StoreResult};
use crate::ids::{new_row_id, Clock, OrderNumberGenerator};
use crate::repository::cart::{fetch_cart_by_session, fetch_cart_lines};
use crate::repository::product::{apply_stock_decrement, fetch_product};

const SELECT_ORDER: &str = r#"
    SELECT
        id, order_number, customer_name, customer_email, customer_phone,
        delivery_address, delivery_city, delivery_notes,
        subtotal_cents, delivery_charge_cents, discount_cents, total_cents,
        payment_method, payment_ref, payment_status, order_status, order_type,
        created_at, updated_at
    FROM orders
"#;

const SELECT_TRACKING: &str = r#"
    SELECT
        id, order_id, status, status_message, courier_name, courier_phone,
        estimated_delivery_at, actual_delivery_at, last_updated
    FROM delivery_tracking
"#;

/// Repository for order creation, lookup and lifecycle transitions.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
    clock: Arc<dyn Clock>,
    order_numbers: Arc<dyn OrderNumberGenerator>,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(
        pool: SqlitePool,
        clock: Arc<dyn Clock>,
        order_numbers: Arc<dyn OrderNumberGenerator>,
    ) -> Self {
        OrderRepository {
            pool,
            clock,
            order_numbers,
        }
    }

    // =========================================================================
    // Order Engine
    // =========================================================================

    /// Converts the session's cart into an order, atomically.
    ///
    /// See the module docs for the step list. Either every effect (order +
    /// snapshots + stock decrements + tracking + cleared cart) becomes
    /// visible at commit, or none of them do.
    pub async fn place_order(
        &self,
        session_id: &str,
        customer: &CustomerDetails,
    ) -> StoreResult<OrderDetails> {
        debug!(session_id = %session_id, "place_order");

        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;

        let cart = fetch_cart_by_session(&mut tx, session_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Cart", session_id))?;

        let lines = fetch_cart_lines(&mut tx, &cart.id).await?;
        if lines.is_empty() {
            return Err(CoreError::EmptyCart {
                session_id: session_id.to_string(),
            }
            .into());
        }

        // Validate stock against the live catalog and freeze prices as of
        // this instant. Later catalog edits will not touch this order.
        let mut priced = Vec::with_capacity(lines.len());
        let mut subtotal = Money::zero();
        let mut order_type: Option<String> = None;

        for line in &lines {
            let product = fetch_product(&mut tx, &line.product_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Product", line.product_id.clone()))?;

            if line.quantity > product.stock {
                return Err(CoreError::InsufficientStock {
                    product_id: product.id,
                    name: product.name,
                    available: product.stock,
                    requested: line.quantity,
                }
                .into());
            }

            let unit_price = product.effective_price();
            let line_subtotal = pricing::line_subtotal(&product, line.quantity);
            subtotal += line_subtotal;

            // The first line's category labels the whole order, mixed carts
            // included.
            if order_type.is_none() {
                order_type = Some(product.category_slug.to_uppercase());
            }

            priced.push((line, product, unit_price, line_subtotal));
        }

        let order_type = order_type.unwrap_or_default();
        let totals = pricing::order_totals(subtotal);
        let order_id = new_row_id();
        let order_number = self.order_numbers.next(now);

        let inserted = sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, customer_name, customer_email, customer_phone,
                delivery_address, delivery_city, delivery_notes,
                subtotal_cents, delivery_charge_cents, discount_cents, total_cents,
                payment_method, payment_ref, payment_status, order_status, order_type,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5,
                ?6, ?7, ?8,
                ?9, ?10, ?11, ?12,
                ?13, ?14, ?15, ?16, ?17,
                ?18, ?19
            )
            "#,
        )
        .bind(&order_id)
        .bind(&order_number)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(&customer.city)
        .bind(&customer.notes)
        .bind(totals.subtotal.cents())
        .bind(totals.delivery_charge.cents())
        .bind(totals.discount.cents())
        .bind(totals.total.cents())
        .bind(&customer.payment_method)
        .bind(Option::<String>::None)
        .bind(PaymentStatus::Pending)
        .bind(OrderStatus::Pending)
        .bind(&order_type)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await;

        if let Err(err) = inserted {
            let db_err = DbError::from(err);
            if matches!(&db_err, DbError::UniqueViolation { field } if field.contains("order_number"))
            {
                // Order numbers are time-derived; a duplicate means the
                // generator is misconfigured. Abort, do not retry.
                error!(order_number = %order_number, "Generated order number already exists; aborting order");
                return Err(StoreError::OrderNumberCollision { order_number });
            }
            return Err(db_err.into());
        }

        for (line, product, unit_price, line_subtotal) in &priced {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, product_id, product_name, product_image,
                    unit_price_cents, quantity,
                    selected_size, selected_color, special_instructions,
                    line_subtotal_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
            )
            .bind(new_row_id())
            .bind(&order_id)
            .bind(&product.id)
            .bind(&product.name)
            .bind(&product.image_url)
            .bind(unit_price.cents())
            .bind(line.quantity)
            .bind(&line.selected_size)
            .bind(&line.selected_color)
            .bind(&line.special_instructions)
            .bind(line_subtotal.cents())
            .bind(now)
            .execute(&mut *tx)
            .await?;

            // Guarded decrement: re-validates stock under concurrency. A
            // failure here rolls back the whole order.
            apply_stock_decrement(&mut tx, &product.id, line.quantity, now).await?;
        }

        if requires_tracking(&order_type) {
            sqlx::query(
                r#"
                INSERT INTO delivery_tracking (id, order_id, status, status_message, last_updated)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(new_row_id())
            .bind(&order_id)
            .bind(DeliveryStatus::OrderPlaced)
            .bind(TRACKING_PLACED_MESSAGE)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(&cart.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE carts SET updated_at = ?2 WHERE id = ?1")
            .bind(&cart.id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            order_number = %order_number,
            order_type = %order_type,
            total = %totals.total,
            items = priced.len(),
            "Order placed"
        );

        self.get_by_id(&order_id).await
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Gets an order with its lines and tracking by internal id.
    pub async fn get_by_id(&self, order_id: &str) -> StoreResult<OrderDetails> {
        let order = sqlx::query_as::<_, Order>(&format!("{SELECT_ORDER} WHERE id = ?1"))
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", order_id))?;

        self.load_details(order).await
    }

    /// Gets an order with its lines and tracking by order number.
    pub async fn get_by_number(&self, order_number: &str) -> StoreResult<OrderDetails> {
        let order = sqlx::query_as::<_, Order>(&format!("{SELECT_ORDER} WHERE order_number = ?1"))
            .bind(order_number)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", order_number))?;

        self.load_details(order).await
    }

    /// Lists orders, newest first.
    pub async fn list(&self, page: u32, size: u32) -> StoreResult<Page<Order>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, Order>(&format!(
            "{SELECT_ORDER} ORDER BY created_at DESC, rowid DESC LIMIT ?1 OFFSET ?2"
        ))
        .bind(size as i64)
        .bind(page as i64 * size as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page {
            items,
            total,
            page,
            size,
        })
    }

    /// Lists orders in one fulfillment status, newest first.
    pub async fn list_by_status(
        &self,
        status: OrderStatus,
        page: u32,
        size: u32,
    ) -> StoreResult<Page<Order>> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE order_status = ?1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        let items = sqlx::query_as::<_, Order>(&format!(
            "{SELECT_ORDER} WHERE order_status = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2 OFFSET ?3"
        ))
        .bind(status)
        .bind(size as i64)
        .bind(page as i64 * size as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(Page {
            items,
            total,
            page,
            size,
        })
    }

    /// Gets the delivery tracking record for an order number.
    ///
    /// Fails with `NotFound` when the order doesn't exist or is an
    /// untracked order type.
    pub async fn get_tracking_by_order_number(
        &self,
        order_number: &str,
    ) -> StoreResult<DeliveryTracking> {
        let tracking = sqlx::query_as::<_, DeliveryTracking>(
            r#"
            SELECT
                dt.id, dt.order_id, dt.status, dt.status_message,
                dt.courier_name, dt.courier_phone,
                dt.estimated_delivery_at, dt.actual_delivery_at, dt.last_updated
            FROM delivery_tracking dt
            INNER JOIN orders o ON o.id = dt.order_id
            WHERE o.order_number = ?1
            "#,
        )
        .bind(order_number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| CoreError::not_found("Tracking", order_number))?;

        Ok(tracking)
    }

    // =========================================================================
    // State Machine
    // =========================================================================

    /// Sets the order's fulfillment status.
    ///
    /// When the order has a tracking record and the target status has a
    /// tracking equivalent, the tracking row is rewritten in the same
    /// transaction. Tracking is never created here; orders without one
    /// (untracked types) simply skip that write.
    pub async fn set_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> StoreResult<OrderDetails> {
        debug!(order_id = %order_id, status = %status, "set_order_status");

        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE orders SET order_status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(order_id)
            .bind(status)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("Order", order_id).into());
        }

        if let Some((tracking_status, message)) = status.tracking_update() {
            // A no-op for orders without a tracking row.
            sqlx::query(
                r#"
                UPDATE delivery_tracking
                SET status = ?2, status_message = ?3, last_updated = ?4
                WHERE order_id = ?1
                "#,
            )
            .bind(order_id)
            .bind(tracking_status)
            .bind(message)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(order_id = %order_id, status = %status, "Order status updated");

        self.get_by_id(order_id).await
    }

    /// Sets the order's payment status, recording the gateway transaction
    /// reference when one is supplied.
    ///
    /// A completed payment on a still-PENDING order auto-advances the
    /// fulfillment status to CONFIRMED (a paid order may not sit in
    /// PENDING), with the tracking row synchronized in the same
    /// transaction.
    pub async fn set_payment_status(
        &self,
        order_id: &str,
        status: PaymentStatus,
        payment_ref: Option<&str>,
    ) -> StoreResult<OrderDetails> {
        debug!(order_id = %order_id, status = %status, "set_payment_status");

        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(&format!("{SELECT_ORDER} WHERE id = ?1"))
            .bind(order_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", order_id))?;

        sqlx::query(
            r#"
            UPDATE orders
            SET payment_status = ?2,
                payment_ref = COALESCE(?3, payment_ref),
                updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(order_id)
        .bind(status)
        .bind(payment_ref)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if status == PaymentStatus::Completed && order.order_status == OrderStatus::Pending {
            sqlx::query("UPDATE orders SET order_status = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(order_id)
                .bind(OrderStatus::Confirmed)
                .bind(now)
                .execute(&mut *tx)
                .await?;

            if let Some((tracking_status, message)) = OrderStatus::Confirmed.tracking_update() {
                sqlx::query(
                    r#"
                    UPDATE delivery_tracking
                    SET status = ?2, status_message = ?3, last_updated = ?4
                    WHERE order_id = ?1
                    "#,
                )
                .bind(order_id)
                .bind(tracking_status)
                .bind(message)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            }

            info!(order_id = %order_id, "Payment completed; order auto-confirmed");
        }

        tx.commit().await?;

        self.get_by_id(order_id).await
    }

    // =========================================================================
    // Internals
    // =========================================================================

    async fn load_details(&self, order: Order) -> StoreResult<OrderDetails> {
        let lines = sqlx::query_as::<_, OrderLine>(
            r#"
            SELECT
                id, order_id, product_id, product_name, product_image,
                unit_price_cents, quantity,
                selected_size, selected_color, special_instructions,
                line_subtotal_cents, created_at
            FROM order_items
            WHERE order_id = ?1
            ORDER BY created_at, rowid
            "#,
        )
        .bind(&order.id)
        .fetch_all(&self.pool)
        .await?;

        let tracking =
            sqlx::query_as::<_, DeliveryTracking>(&format!("{SELECT_TRACKING} WHERE order_id = ?1"))
                .bind(&order.id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(OrderDetails {
            order,
            lines,
            tracking,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use bazaar_core::{CoreError, DeliveryStatus, OrderStatus, PaymentStatus};

    use crate::error::StoreError;
    use crate::ids::test_support::{FixedClock, FixedOrderNumbers};
    use crate::pool::{Database, DbConfig};
    use crate::repository::fixtures;

    /// The end-to-end scenario: stock 5, price Rs 500, quantity 3.
    #[tokio::test]
    async fn test_place_order_end_to_end() {
        let db = fixtures::test_db().await;
        let p = fixtures::product("Leather Loafers", "shoes", 50_000, None, 5);
        db.products().insert(&p).await.unwrap();

        db.carts()
            .add_item("sess-1", &p.id, 3, Some("42"), Some("Brown"), None)
            .await
            .unwrap();

        let placed = db
            .orders()
            .place_order("sess-1", &fixtures::customer())
            .await
            .unwrap();

        // Money: subtotal Rs 1500 clears the free-delivery threshold.
        assert_eq!(placed.order.subtotal_cents, 150_000);
        assert_eq!(placed.order.delivery_charge_cents, 0);
        assert_eq!(placed.order.discount_cents, 0);
        assert_eq!(placed.order.total_cents, 150_000);
        assert_eq!(placed.order.payment_status, PaymentStatus::Pending);
        assert_eq!(placed.order.order_status, OrderStatus::Pending);
        assert_eq!(placed.order.order_type, "SHOES");
        assert_eq!(placed.order.order_number, "ORD-T-0001");
        assert_eq!(placed.order.customer_name, "Asha Gurung");

        // Frozen line snapshot.
        assert_eq!(placed.lines.len(), 1);
        let line = &placed.lines[0];
        assert_eq!(line.product_name, "Leather Loafers");
        assert_eq!(line.unit_price_cents, 50_000);
        assert_eq!(line.quantity, 3);
        assert_eq!(line.line_subtotal_cents, 150_000);
        assert_eq!(line.selected_size.as_deref(), Some("42"));

        // Shoes are untracked.
        assert!(placed.tracking.is_none());

        // Stock was reserved and the cart emptied (but kept).
        let stock = db.products().get_by_id(&p.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 2);
        assert!(db.carts().view("sess-1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prices_frozen_against_catalog_edits() {
        let db = fixtures::test_db().await;
        let p = fixtures::product("Cotton Kurta", "clothes", 150_000, Some(120_000), 10);
        db.products().insert(&p).await.unwrap();

        db.carts()
            .add_item("sess-1", &p.id, 1, None, None, None)
            .await
            .unwrap();
        let placed = db
            .orders()
            .place_order("sess-1", &fixtures::customer())
            .await
            .unwrap();
        assert_eq!(placed.order.subtotal_cents, 120_000);

        // A later price change must not leak into the stored order.
        sqlx::query("UPDATE products SET price_cents = 999, discount_price_cents = NULL WHERE id = ?1")
            .bind(&p.id)
            .execute(db.pool())
            .await
            .unwrap();

        let reread = db.orders().get_by_id(&placed.order.id).await.unwrap();
        assert_eq!(reread.lines[0].unit_price_cents, 120_000);
        assert_eq!(reread.order.subtotal_cents, 120_000);
    }

    #[tokio::test]
    async fn test_place_order_requires_cart_with_lines() {
        let db = fixtures::test_db().await;

        let err = db
            .orders()
            .place_order("never-seen", &fixtures::customer())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(CoreError::NotFound { entity: "Cart", .. })
        ));

        db.carts().get_or_create("sess-1").await.unwrap();
        let err = db
            .orders()
            .place_order("sess-1", &fixtures::customer())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Domain(CoreError::EmptyCart { .. })));
    }

    /// Forcing a failure at the last line must leave every earlier line's
    /// stock, the cart, and the order tables untouched.
    #[tokio::test]
    async fn test_place_order_rolls_back_completely() {
        let db = fixtures::test_db().await;
        let first = fixtures::product("Leather Loafers", "shoes", 50_000, None, 5);
        let scarce = fixtures::product("Wool Socks", "clothes", 9_000, None, 1);
        db.products().insert(&first).await.unwrap();
        db.products().insert(&scarce).await.unwrap();

        db.carts()
            .add_item("sess-1", &first.id, 2, None, None, None)
            .await
            .unwrap();
        db.carts()
            .add_item("sess-1", &scarce.id, 1, None, None, None)
            .await
            .unwrap();

        // Someone else takes the last unit before checkout.
        db.products().decrement_stock(&scarce.id, 1).await.unwrap();

        let err = db
            .orders()
            .place_order("sess-1", &fixtures::customer())
            .await
            .unwrap_err();
        match err {
            StoreError::Domain(CoreError::InsufficientStock { name, available, .. }) => {
                assert_eq!(name, "Wool Socks");
                assert_eq!(available, 0);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // Full rollback: first line's stock unchanged, no order rows, cart intact.
        let stock = db.products().get_by_id(&first.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 5);
        assert_eq!(db.orders().list(0, 10).await.unwrap().total, 0);
        let view = db.carts().view("sess-1").await.unwrap();
        assert_eq!(view.lines.len(), 2);
        assert_eq!(view.total_items, 3);
    }

    #[tokio::test]
    async fn test_delivery_charge_below_threshold() {
        let db = fixtures::test_db().await;
        let p = fixtures::product("Sel Roti Pack", "food", 99_999, None, 3);
        db.products().insert(&p).await.unwrap();

        db.carts()
            .add_item("sess-1", &p.id, 1, None, None, None)
            .await
            .unwrap();
        let placed = db
            .orders()
            .place_order("sess-1", &fixtures::customer())
            .await
            .unwrap();

        assert_eq!(placed.order.subtotal_cents, 99_999);
        assert_eq!(placed.order.delivery_charge_cents, 10_000);
        assert_eq!(placed.order.total_cents, 109_999);
    }

    #[tokio::test]
    async fn test_food_orders_get_tracking() {
        let db = fixtures::test_db().await;
        let momo = fixtures::product("Chicken Momo", "food", 30_000, None, 10);
        let shoes = fixtures::product("Canvas Sneakers", "shoes", 180_000, None, 10);
        db.products().insert(&momo).await.unwrap();
        db.products().insert(&shoes).await.unwrap();

        // First line is food: the order is FOOD and tracked, even though a
        // second category is mixed in.
        db.carts()
            .add_item("sess-1", &momo.id, 2, None, None, None)
            .await
            .unwrap();
        db.carts()
            .add_item("sess-1", &shoes.id, 1, None, None, None)
            .await
            .unwrap();
        let placed = db
            .orders()
            .place_order("sess-1", &fixtures::customer())
            .await
            .unwrap();

        assert_eq!(placed.order.order_type, "FOOD");
        let tracking = placed.tracking.unwrap();
        assert_eq!(tracking.status, DeliveryStatus::OrderPlaced);
        assert_eq!(tracking.status_message, "Your order has been placed");
        assert_eq!(tracking.order_id, placed.order.id);

        let fetched = db
            .orders()
            .get_tracking_by_order_number(&placed.order.order_number)
            .await
            .unwrap();
        assert_eq!(fetched.id, tracking.id);
    }

    #[tokio::test]
    async fn test_status_updates_cascade_into_tracking() {
        let db = fixtures::test_db().await;
        let momo = fixtures::product("Chicken Momo", "food", 30_000, None, 10);
        db.products().insert(&momo).await.unwrap();

        db.carts()
            .add_item("sess-1", &momo.id, 1, None, None, None)
            .await
            .unwrap();
        let placed = db
            .orders()
            .place_order("sess-1", &fixtures::customer())
            .await
            .unwrap();

        // Drive the status through a later, pinned clock so the tracking
        // timestamp observably moves. Whole seconds survive the TEXT
        // round-trip exactly.
        let later = Utc.with_ymd_and_hms(2099, 1, 1, 12, 30, 0).unwrap();
        let admin_db = db.clone().with_clock(Arc::new(FixedClock(later)));

        let updated = admin_db
            .orders()
            .set_order_status(&placed.order.id, OrderStatus::OutForDelivery)
            .await
            .unwrap();
        assert_eq!(updated.order.order_status, OrderStatus::OutForDelivery);
        let tracking = updated.tracking.unwrap();
        assert_eq!(tracking.status, DeliveryStatus::OutForDelivery);
        assert_eq!(tracking.status_message, "Your order is out for delivery");
        assert_eq!(tracking.last_updated, later);

        let updated = admin_db
            .orders()
            .set_order_status(&placed.order.id, OrderStatus::Delivered)
            .await
            .unwrap();
        assert_eq!(
            updated.tracking.unwrap().status_message,
            "Your order has been delivered"
        );
    }

    #[tokio::test]
    async fn test_status_update_never_creates_tracking() {
        let db = fixtures::test_db().await;
        let shoes = fixtures::product("Canvas Sneakers", "shoes", 180_000, None, 10);
        db.products().insert(&shoes).await.unwrap();

        db.carts()
            .add_item("sess-1", &shoes.id, 1, None, None, None)
            .await
            .unwrap();
        let placed = db
            .orders()
            .place_order("sess-1", &fixtures::customer())
            .await
            .unwrap();
        assert!(placed.tracking.is_none());

        let updated = db
            .orders()
            .set_order_status(&placed.order.id, OrderStatus::Delivered)
            .await
            .unwrap();
        assert_eq!(updated.order.order_status, OrderStatus::Delivered);
        assert!(updated.tracking.is_none());

        let err = db
            .orders()
            .get_tracking_by_order_number(&placed.order.order_number)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(CoreError::NotFound { entity: "Tracking", .. })
        ));
    }

    #[tokio::test]
    async fn test_set_order_status_missing_order() {
        let db = fixtures::test_db().await;
        let err = db
            .orders()
            .set_order_status("ghost", OrderStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(CoreError::NotFound { entity: "Order", .. })
        ));
    }

    #[tokio::test]
    async fn test_payment_completion_auto_confirms() {
        let db = fixtures::test_db().await;
        let momo = fixtures::product("Chicken Momo", "food", 30_000, None, 10);
        db.products().insert(&momo).await.unwrap();

        db.carts()
            .add_item("sess-1", &momo.id, 1, None, None, None)
            .await
            .unwrap();
        let placed = db
            .orders()
            .place_order("sess-1", &fixtures::customer())
            .await
            .unwrap();
        assert_eq!(placed.order.order_status, OrderStatus::Pending);

        let updated = db
            .orders()
            .set_payment_status(&placed.order.id, PaymentStatus::Completed, Some("TXN1"))
            .await
            .unwrap();

        // The cross-field invariant: a paid order may not stay PENDING.
        assert_eq!(updated.order.payment_status, PaymentStatus::Completed);
        assert_eq!(updated.order.order_status, OrderStatus::Confirmed);
        assert_eq!(updated.order.payment_ref.as_deref(), Some("TXN1"));
        assert_eq!(updated.tracking.unwrap().status, DeliveryStatus::Confirmed);

        // A later update without a reference keeps the stored one, and a
        // non-PENDING order is not advanced again.
        let updated = db
            .orders()
            .set_payment_status(&placed.order.id, PaymentStatus::Refunded, None)
            .await
            .unwrap();
        assert_eq!(updated.order.payment_status, PaymentStatus::Refunded);
        assert_eq!(updated.order.payment_ref.as_deref(), Some("TXN1"));
        assert_eq!(updated.order.order_status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_order_number_collision_is_fatal_and_clean() {
        let db = Database::new(DbConfig::in_memory())
            .await
            .unwrap()
            .with_order_numbers(Arc::new(FixedOrderNumbers("ORD-DUP")));

        let p = fixtures::product("Leather Loafers", "shoes", 50_000, None, 10);
        db.products().insert(&p).await.unwrap();

        db.carts()
            .add_item("sess-a", &p.id, 1, None, None, None)
            .await
            .unwrap();
        db.orders()
            .place_order("sess-a", &fixtures::customer())
            .await
            .unwrap();

        db.carts()
            .add_item("sess-b", &p.id, 2, None, None, None)
            .await
            .unwrap();
        let err = db
            .orders()
            .place_order("sess-b", &fixtures::customer())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::OrderNumberCollision { ref order_number } if order_number == "ORD-DUP"
        ));

        // The aborted order left nothing behind: stock reflects only the
        // first order and the second cart is intact.
        let stock = db.products().get_by_id(&p.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 9);
        assert_eq!(db.orders().list(0, 10).await.unwrap().total, 1);
        assert_eq!(db.carts().view("sess-b").await.unwrap().total_items, 2);
    }

    #[tokio::test]
    async fn test_concurrent_orders_never_oversell() {
        let db = fixtures::test_db().await;
        let p = fixtures::product("Chicken Momo", "food", 30_000, None, 5);
        db.products().insert(&p).await.unwrap();

        db.carts()
            .add_item("sess-a", &p.id, 3, None, None, None)
            .await
            .unwrap();
        db.carts()
            .add_item("sess-b", &p.id, 3, None, None, None)
            .await
            .unwrap();

        let orders_a = db.orders();
        let orders_b = db.orders();
        let cust_a = fixtures::customer();
        let cust_b = fixtures::customer();
        let (a, b) = tokio::join!(
            orders_a.place_order("sess-a", &cust_a),
            orders_b.place_order("sess-b", &cust_b),
        );

        // Combined quantity (6) exceeds stock (5): exactly one may win.
        let successes = usize::from(a.is_ok()) + usize::from(b.is_ok());
        assert_eq!(successes, 1);

        let loser = if a.is_ok() { b } else { a };
        assert!(matches!(
            loser.unwrap_err(),
            StoreError::Domain(CoreError::InsufficientStock { .. })
        ));

        // Stock never went negative and reflects exactly one order.
        let stock = db.products().get_by_id(&p.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 2);
    }

    #[tokio::test]
    async fn test_listing_and_lookup() {
        let db = fixtures::test_db().await;
        let p = fixtures::product("Leather Loafers", "shoes", 50_000, None, 50);
        db.products().insert(&p).await.unwrap();

        let mut numbers = Vec::new();
        for session in ["s-1", "s-2", "s-3"] {
            db.carts()
                .add_item(session, &p.id, 1, None, None, None)
                .await
                .unwrap();
            let placed = db
                .orders()
                .place_order(session, &fixtures::customer())
                .await
                .unwrap();
            numbers.push(placed.order.order_number);
        }

        // Newest first, sized pages, stable total.
        let page = db.orders().list(0, 2).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].order_number, numbers[2]);
        assert_eq!(page.total_pages(), 2);

        let page = db.orders().list(1, 2).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].order_number, numbers[0]);

        // Lookup by number matches lookup by id.
        let by_number = db.orders().get_by_number(&numbers[1]).await.unwrap();
        let by_id = db.orders().get_by_id(&by_number.order.id).await.unwrap();
        assert_eq!(by_id.order.order_number, numbers[1]);

        let err = db.orders().get_by_number("ORD-NOPE").await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Domain(CoreError::NotFound { entity: "Order", .. })
        ));

        // Status filter sees only matching orders.
        db.orders()
            .set_order_status(&by_id.order.id, OrderStatus::Confirmed)
            .await
            .unwrap();
        let confirmed = db
            .orders()
            .list_by_status(OrderStatus::Confirmed, 0, 10)
            .await
            .unwrap();
        assert_eq!(confirmed.total, 1);
        assert_eq!(confirmed.items[0].order_number, numbers[1]);
        let pending = db
            .orders()
            .list_by_status(OrderStatus::Pending, 0, 10)
            .await
            .unwrap();
        assert_eq!(pending.total, 2);
    }
}
