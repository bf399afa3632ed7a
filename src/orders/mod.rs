//! Order Workflow
//!
//! Transactional order placement and lifecycle. All writes go through
//! [`OrderService`]; reads live in [`crate::db::repository::OrderRepository`].
//!
//! # Placement
//!
//! Each requested line runs a conditional decrement as the first
//! statement of the transaction:
//!
//! ```sql
//! UPDATE products SET stock = stock - ?
//! WHERE id = ? AND is_active = 1 AND stock >= ?
//! ```
//!
//! A zero-row update means the line cannot be fulfilled; the product
//! row is then inspected to tell "missing" from "inactive" from
//! "insufficient stock", and the whole transaction rolls back. Because
//! the decrement is a write, concurrent placements serialize on the
//! database's write lock and two orders can never both consume the
//! same last unit.

use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::db::models::{Order, OrderCreate, OrderStatus};
use crate::utils::{AppError, AppResult};

#[derive(Clone)]
pub struct OrderService {
    pool: SqlitePool,
}

impl OrderService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Place an order: decrement stock per line, snapshot prices,
    /// insert the order and its items. Atomic; any failing line rolls
    /// back everything.
    pub async fn place_order(&self, user_id: i64, data: &OrderCreate) -> AppResult<Order> {
        let mut tx = self.pool.begin().await?;

        let now = Utc::now();
        let mut total_price = 0.0_f64;
        let mut lines: Vec<(i64, i64, f64)> = Vec::with_capacity(data.items.len());

        for item in &data.items {
            let updated = sqlx::query(
                "UPDATE products SET stock = stock - ?, updated_at = ? \
                 WHERE id = ? AND is_active = 1 AND stock >= ?",
            )
            .bind(item.quantity)
            .bind(now)
            .bind(item.product_id)
            .bind(item.quantity)
            .execute(&mut *tx)
            .await?
            .rows_affected();

            if updated == 0 {
                // Rollback is implicit when the transaction drops
                return Err(diagnose_line_failure(&mut tx, item.product_id).await?);
            }

            let unit_price: f64 = sqlx::query_scalar("SELECT price FROM products WHERE id = ?")
                .bind(item.product_id)
                .fetch_one(&mut *tx)
                .await?;

            total_price += unit_price * item.quantity as f64;
            lines.push((item.product_id, item.quantity, unit_price));
        }

        let order_id = sqlx::query(
            "INSERT INTO orders (user_id, total_price, status, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(total_price)
        .bind(OrderStatus::Pending)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        for &(product_id, quantity, unit_price) in &lines {
            sqlx::query(
                "INSERT INTO order_items (order_id, product_id, quantity, unit_price) \
                 VALUES (?, ?, ?, ?)",
            )
            .bind(order_id)
            .bind(product_id)
            .bind(quantity)
            .bind(unit_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(order_id, user_id, total_price, "Order placed");

        self.fetch(order_id).await
    }

    /// Admin status change. Terminal orders admit no further mutation;
    /// otherwise any target status is accepted.
    ///
    /// The terminal guard rides in the UPDATE itself, so a concurrent
    /// cancel committing first cannot be overwritten. This path never
    /// touches stock; stock restoration belongs to
    /// [`Self::cancel_order`].
    pub async fn update_status(&self, order_id: i64, status: OrderStatus) -> AppResult<Order> {
        let updated = sqlx::query("UPDATE orders SET status = ? WHERE id = ? AND status NOT IN (?, ?)")
            .bind(status)
            .bind(order_id)
            .bind(OrderStatus::Canceled)
            .bind(OrderStatus::Delivered)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if updated == 0 {
            // Missing order, or one already in a terminal state
            let order = self
                .find(order_id, None)
                .await?
                .ok_or_else(|| AppError::not_found(format!("Order {} not found", order_id)))?;
            return Err(AppError::invalid_state(format!(
                "Order {} is {} and can no longer change status",
                order_id, order.status
            )));
        }

        tracing::info!(order_id, to = %status, "Order status updated");

        self.fetch(order_id).await
    }

    /// Cancel an order and restore its stock, atomically.
    ///
    /// `owner_id` scopes the lookup for non-admin callers; an order
    /// that exists but belongs to someone else reads as not found.
    /// Only Pending and Paid orders are cancelable.
    pub async fn cancel_order(&self, order_id: i64, owner_id: Option<i64>) -> AppResult<Order> {
        let mut tx = self.pool.begin().await?;

        let order = match owner_id {
            Some(uid) => {
                sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ? AND user_id = ?")
                    .bind(order_id)
                    .bind(uid)
                    .fetch_optional(&mut *tx)
                    .await?
            }
            None => {
                sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
                    .bind(order_id)
                    .fetch_optional(&mut *tx)
                    .await?
            }
        };

        let order =
            order.ok_or_else(|| AppError::not_found(format!("Order {} not found", order_id)))?;

        if order.status == OrderStatus::Canceled {
            return Err(AppError::invalid_state(format!(
                "Order {} is already canceled",
                order_id
            )));
        }
        if !order.status.is_cancelable() {
            return Err(AppError::invalid_state(format!(
                "Order {} is {} and can no longer be canceled",
                order_id, order.status
            )));
        }

        sqlx::query(
            "UPDATE products SET stock = stock + ( \
                 SELECT SUM(oi.quantity) FROM order_items oi \
                 WHERE oi.order_id = ? AND oi.product_id = products.id \
             ), updated_at = ? \
             WHERE id IN (SELECT product_id FROM order_items WHERE order_id = ?)",
        )
        .bind(order_id)
        .bind(Utc::now())
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE orders SET status = ? WHERE id = ?")
            .bind(OrderStatus::Canceled)
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(order_id, "Order canceled, stock restored");

        self.fetch(order_id).await
    }

    async fn find(&self, order_id: i64, owner_id: Option<i64>) -> AppResult<Option<Order>> {
        let order = match owner_id {
            Some(uid) => {
                sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ? AND user_id = ?")
                    .bind(order_id)
                    .bind(uid)
                    .fetch_optional(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
                    .bind(order_id)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };
        Ok(order)
    }

    async fn fetch(&self, order_id: i64) -> AppResult<Order> {
        self.find(order_id, None)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order {} not found", order_id)))
    }
}

/// Map a zero-row conditional decrement to the precise rejection.
async fn diagnose_line_failure(
    tx: &mut Transaction<'_, Sqlite>,
    product_id: i64,
) -> Result<AppError, sqlx::Error> {
    let row: Option<(bool, i64, String)> =
        sqlx::query_as("SELECT is_active, stock, name FROM products WHERE id = ?")
            .bind(product_id)
            .fetch_optional(&mut **tx)
            .await?;

    Ok(match row {
        None => AppError::not_found(format!("Product {} not found", product_id)),
        Some((false, _, name)) => {
            AppError::invalid_state(format!("Product '{}' is not available", name))
        }
        Some((true, stock, name)) => AppError::insufficient_stock(format!(
            "Product '{}' has only {} unit(s) in stock",
            name, stock
        )),
    })
}
