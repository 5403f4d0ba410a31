//! # Order Repository
//!
//! Database operations for orders, their items, and their itemized
//! payments.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  COUNTER FLOW (paid immediately)                                        │
//! │     └── insert_order(order, items, payments) → status: Completed       │
//! │                                                                         │
//! │  TABLE SERVICE (tab stays open)                                         │
//! │     └── insert_order(order, items, [])       → status: Open            │
//! │     └── append_items()                       → more rounds             │
//! │     └── settle_order(summary, payments)      → status: Completed       │
//! │                                                                         │
//! │  EITHER FLOW                                                           │
//! │     └── cancel via set_status(Canceled)      → only while Open         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every write that depends on the order still being open is a guarded
//! UPDATE (`WHERE status = 'open'`); zero affected rows means the guard
//! failed and the caller gets a typed error instead of a silent no-op.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use comanda_core::{CheckoutSummary, Order, OrderItem, OrderPayment, OrderStatus};

/// Filter for listing orders.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Restrict to orders sold under this till.
    pub cash_register_id: Option<String>,
    /// Restrict to orders in this status.
    pub status: Option<OrderStatus>,
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

const ORDER_COLUMNS: &str = "id, order_number, status, subtotal_cents, discount_cents, \
     service_charge_cents, tip_cents, couvert_cents, total_cents, payment_method, \
     cash_register_id, operator, customer, created_at, updated_at, completed_at";

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts an order with its items and payments in one transaction.
    ///
    /// ## Atomicity
    /// Either the order, every item, and every payment land together, or
    /// nothing does. Emission relies on this: stock is only deducted after
    /// this call returns Ok, so a failed write can never cost stock.
    pub async fn insert_order(
        &self,
        order: &Order,
        items: &[OrderItem],
        payments: &[OrderPayment],
    ) -> DbResult<()> {
        debug!(id = %order.id, order_number = %order.order_number, "Inserting order");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, status,
                subtotal_cents, discount_cents, service_charge_cents,
                tip_cents, couvert_cents, total_cents,
                payment_method, cash_register_id, operator, customer,
                created_at, updated_at, completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(order.status)
        .bind(order.subtotal_cents)
        .bind(order.discount_cents)
        .bind(order.service_charge_cents)
        .bind(order.tip_cents)
        .bind(order.couvert_cents)
        .bind(order.total_cents)
        .bind(&order.payment_method)
        .bind(&order.cash_register_id)
        .bind(&order.operator)
        .bind(&order.customer)
        .bind(order.created_at)
        .bind(order.updated_at)
        .bind(order.completed_at)
        .execute(&mut *tx)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, product_id, name_snapshot,
                    unit_price_cents, quantity, line_total_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.product_id)
            .bind(&item.name_snapshot)
            .bind(item.unit_price_cents)
            .bind(item.quantity)
            .bind(item.line_total_cents)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        for payment in payments {
            insert_payment(&mut tx, payment).await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Gets an order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {} FROM orders WHERE id = ?1", ORDER_COLUMNS);
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Lists orders matching the filter, oldest first.
    pub async fn list(&self, filter: &OrderFilter) -> DbResult<Vec<Order>> {
        let mut sql = format!("SELECT {} FROM orders WHERE 1 = 1", ORDER_COLUMNS);
        if filter.cash_register_id.is_some() {
            sql.push_str(" AND cash_register_id = ?");
        }
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        sql.push_str(" ORDER BY created_at");

        let mut query = sqlx::query_as::<_, Order>(&sql);
        if let Some(register_id) = &filter.cash_register_id {
            query = query.bind(register_id);
        }
        if let Some(status) = filter.status {
            query = query.bind(status);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    /// Gets all items for an order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, name_snapshot,
                   unit_price_cents, quantity, line_total_cents, created_at
            FROM order_items
            WHERE order_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets the itemized payment breakdown for an order.
    pub async fn get_payments(&self, order_id: &str) -> DbResult<Vec<OrderPayment>> {
        let payments = sqlx::query_as::<_, OrderPayment>(
            r#"
            SELECT id, order_id, method, amount_cents,
                   tendered_cents, change_cents, created_at
            FROM order_payments
            WHERE order_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Appends table-service items to an order that is still open.
    ///
    /// Adds the new line totals onto the stored subtotal and total in the
    /// same transaction; fails if the order is not open.
    pub async fn append_items(&self, order_id: &str, items: &[OrderItem]) -> DbResult<()> {
        debug!(order_id = %order_id, count = items.len(), "Appending order items");

        let added: i64 = items.iter().map(|i| i.line_total_cents).sum();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                subtotal_cents = subtotal_cents + ?2,
                total_cents = total_cents + ?2,
                updated_at = ?3
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(order_id)
        .bind(added)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order (open)", order_id));
        }

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, product_id, name_snapshot,
                    unit_price_cents, quantity, line_total_cents, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
            )
            .bind(&item.id)
            .bind(order_id)
            .bind(&item.product_id)
            .bind(&item.name_snapshot)
            .bind(item.unit_price_cents)
            .bind(item.quantity)
            .bind(item.line_total_cents)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Settles an open order: rewrites its totals from the confirmed
    /// checkout, records the payment breakdown, and completes it.
    pub async fn settle_order(
        &self,
        order_id: &str,
        summary: &CheckoutSummary,
        payments: &[OrderPayment],
    ) -> DbResult<()> {
        debug!(order_id = %order_id, total = summary.total_cents, "Settling order");

        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                subtotal_cents = ?2,
                discount_cents = ?3,
                service_charge_cents = ?4,
                tip_cents = ?5,
                couvert_cents = ?6,
                total_cents = ?7,
                payment_method = ?8,
                status = 'completed',
                completed_at = ?9,
                updated_at = ?9
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(order_id)
        .bind(summary.subtotal_cents)
        .bind(summary.discount_cents)
        .bind(summary.service_charge_cents)
        .bind(summary.tip_cents)
        .bind(summary.couvert_cents)
        .bind(summary.total_cents)
        .bind(&summary.payment_method)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order (open)", order_id));
        }

        for payment in payments {
            insert_payment(&mut tx, payment).await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Cancels an order that is still open.
    pub async fn cancel_order(&self, order_id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = 'canceled',
                updated_at = ?2
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(order_id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order (open)", order_id));
        }

        Ok(())
    }

    /// Total cash taken for a till, from the itemized payment breakdown.
    ///
    /// A split order contributes only its cash-tagged rows; the flat
    /// `payment_method` column on orders is display-only and never read
    /// here. Only completed orders count.
    pub async fn cash_sales_total(&self, register_id: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(p.amount_cents), 0)
            FROM order_payments p
            JOIN orders o ON o.id = p.order_id
            WHERE o.cash_register_id = ?1
              AND o.status = 'completed'
              AND p.method = 'cash'
            "#,
        )
        .bind(register_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total)
    }
}

async fn insert_payment(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    payment: &OrderPayment,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO order_payments (
            id, order_id, method, amount_cents,
            tendered_cents, change_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.order_id)
    .bind(payment.method)
    .bind(payment.amount_cents)
    .bind(payment.tendered_cents)
    .bind(payment.change_cents)
    .bind(payment.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
