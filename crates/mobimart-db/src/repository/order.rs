//! # Order Repository
//!
//! Reads and the single permitted mutation for online orders.
//!
//! Orders are created exclusively inside the checkout transaction
//! ([`crate::checkout`]); this repository covers lookups (by id, by
//! pending pickup code, recency) and the pending→completed status flip.
//! The flip is deliberately non-transactional with respect to stock:
//! inventory was already committed at order-creation time, completion
//! is purely a status flag.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use mobimart_core::{
    FulfillmentType, LineItem, Order, OrderStatus, PaymentMethod, PaymentStatus, PickupCode,
};

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

const ORDER_COLUMNS: &str = "id, total_minor, fulfillment, customer_name, customer_phone, \
     address, payment_method, payment_status, pickup_code, status, client_token, created_at";

/// Maps an `orders` row. Items are loaded separately.
fn order_from_row(row: &SqliteRow) -> Result<Order, sqlx::Error> {
    let pickup_code: Option<String> = row.try_get("pickup_code")?;

    Ok(Order {
        id: row.try_get("id")?,
        items: Vec::new(),
        total_minor: row.try_get("total_minor")?,
        fulfillment: row.try_get::<FulfillmentType, _>("fulfillment")?,
        customer_name: row.try_get("customer_name")?,
        customer_phone: row.try_get("customer_phone")?,
        address: row.try_get("address")?,
        payment_method: row.try_get::<PaymentMethod, _>("payment_method")?,
        payment_status: row.try_get::<PaymentStatus, _>("payment_status")?,
        pickup_code: pickup_code
            .map(|c| {
                PickupCode::parse(&c).map_err(|e| sqlx::Error::ColumnDecode {
                    index: "pickup_code".to_string(),
                    source: Box::new(e),
                })
            })
            .transpose()?,
        status: row.try_get::<OrderStatus, _>("status")?,
        client_token: row.try_get("client_token")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

/// Maps an `order_items` / `sale_items` row to a snapshot line item.
pub(crate) fn line_item_from_row(row: &SqliteRow) -> Result<LineItem, sqlx::Error> {
    Ok(LineItem {
        product_id: row.try_get("product_id")?,
        name: row.try_get("name_snapshot")?,
        unit_price_minor: row.try_get("unit_price_minor")?,
        quantity: row.try_get("quantity")?,
    })
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Gets an order with its line items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query(&format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"))
            .bind(id)
            .try_map(|row| order_from_row(&row))
            .fetch_optional(&self.pool)
            .await?;

        match order {
            Some(mut order) => {
                order.items = self.items_for(&order.id).await?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    /// Finds the pending order carrying this pickup code, if any.
    ///
    /// Exact match over `status = 'pending'` only; completed orders'
    /// codes are dead.
    pub async fn find_pending_by_code(&self, code: &PickupCode) -> DbResult<Option<Order>> {
        debug!(code = %code, "Looking up pending order by pickup code");

        let order = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE pickup_code = ?1 AND status = 'pending'"
        ))
        .bind(code.as_str())
        .try_map(|row| order_from_row(&row))
        .fetch_optional(&self.pool)
        .await?;

        match order {
            Some(mut order) => {
                order.items = self.items_for(&order.id).await?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    /// Flips a pending pickup order to completed.
    ///
    /// Guarded on `status = 'pending'`: zero rows affected means the
    /// code never existed or the order was already handed over.
    pub async fn complete_pending(&self, code: &PickupCode) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE orders SET status = 'completed' \
             WHERE pickup_code = ?1 AND status = 'pending'",
        )
        .bind(code.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Pending order", code.as_str()));
        }

        info!(code = %code, "Pickup order completed");
        Ok(())
    }

    /// Lists the most recent orders (dashboard view), items included.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Order>> {
        let mut orders = sqlx::query(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders ORDER BY created_at DESC, id LIMIT ?1"
        ))
        .bind(limit)
        .try_map(|row| order_from_row(&row))
        .fetch_all(&self.pool)
        .await?;

        for order in &mut orders {
            order.items = self.items_for(&order.id).await?;
        }

        Ok(orders)
    }

    /// Sums revenue and counts orders committed at or after `since`.
    pub async fn revenue_since(&self, since: DateTime<Utc>) -> DbResult<(i64, i64)> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(total_minor), 0) AS revenue, COUNT(*) AS n \
             FROM orders WHERE created_at >= ?1",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok((row.try_get("revenue")?, row.try_get("n")?))
    }

    async fn items_for(&self, order_id: &str) -> DbResult<Vec<LineItem>> {
        let items = sqlx::query(
            "SELECT product_id, name_snapshot, unit_price_minor, quantity \
             FROM order_items WHERE order_id = ?1 ORDER BY seq",
        )
        .bind(order_id)
        .try_map(|row| line_item_from_row(&row))
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}
