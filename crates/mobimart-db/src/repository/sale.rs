//! # Sale Repository
//!
//! Reads for in-store sale records.
//!
//! Sales are immutable facts: inserted exclusively inside the checkout
//! transaction ([`crate::checkout`]), never updated or deleted. This
//! repository only reads them back for receipts and the dashboard.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::error::DbResult;
use crate::repository::order::line_item_from_row;
use mobimart_core::{LineItem, Sale, SaleChannel};

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

const SALE_COLUMNS: &str = "id, total_minor, sold_by, channel, client_token, created_at";

fn sale_from_row(row: &SqliteRow) -> Result<Sale, sqlx::Error> {
    Ok(Sale {
        id: row.try_get("id")?,
        items: Vec::new(),
        total_minor: row.try_get("total_minor")?,
        sold_by: row.try_get("sold_by")?,
        channel: row.try_get::<SaleChannel, _>("channel")?,
        client_token: row.try_get("client_token")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale with its line items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query(&format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"))
            .bind(id)
            .try_map(|row| sale_from_row(&row))
            .fetch_optional(&self.pool)
            .await?;

        match sale {
            Some(mut sale) => {
                sale.items = self.items_for(&sale.id).await?;
                Ok(Some(sale))
            }
            None => Ok(None),
        }
    }

    /// Lists the most recent sales (dashboard view), items included.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let mut sales = sqlx::query(&format!(
            "SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC, id LIMIT ?1"
        ))
        .bind(limit)
        .try_map(|row| sale_from_row(&row))
        .fetch_all(&self.pool)
        .await?;

        for sale in &mut sales {
            sale.items = self.items_for(&sale.id).await?;
        }

        Ok(sales)
    }

    /// Sums revenue and counts sales committed at or after `since`.
    pub async fn revenue_since(&self, since: DateTime<Utc>) -> DbResult<(i64, i64)> {
        let row = sqlx::query(
            "SELECT COALESCE(SUM(total_minor), 0) AS revenue, COUNT(*) AS n \
             FROM sales WHERE created_at >= ?1",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok((row.try_get("revenue")?, row.try_get("n")?))
    }

    /// Counts all sale records (for diagnostics and tests).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn items_for(&self, sale_id: &str) -> DbResult<Vec<LineItem>> {
        let items = sqlx::query(
            "SELECT product_id, name_snapshot, unit_price_minor, quantity \
             FROM sale_items WHERE sale_id = ?1 ORDER BY seq",
        )
        .bind(sale_id)
        .try_map(|row| line_item_from_row(&row))
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }
}
