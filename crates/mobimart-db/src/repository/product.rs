//! # Product Repository
//!
//! Catalog operations for products.
//!
//! Covers the admin lifecycle: create, list, edit, delete. Stock is a
//! column here but is NEVER decremented through this repository - the
//! only non-admin writer of `products.stock` is the checkout
//! transaction in [`crate::checkout`]. Bypassing it voids the no-oversell
//! guarantee.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use mobimart_core::{Product, ProductSpecs};

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

/// Maps a `products` row, decoding the dual-shape JSON specs column.
pub(crate) fn product_from_row(row: &SqliteRow) -> Result<Product, sqlx::Error> {
    let specs_json: String = row.try_get("specs")?;
    let specs: ProductSpecs =
        serde_json::from_str(&specs_json).map_err(|e| sqlx::Error::ColumnDecode {
            index: "specs".to_string(),
            source: Box::new(e),
        })?;

    Ok(Product {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        brand: row.try_get("brand")?,
        price_minor: row.try_get("price_minor")?,
        discount_pct: row.try_get("discount_pct")?,
        stock: row.try_get("stock")?,
        specs,
        image_url: row.try_get("image_url")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

const PRODUCT_COLUMNS: &str =
    "id, name, brand, price_minor, discount_pct, stock, specs, image_url, created_at, updated_at";

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists the full catalog in stable name order.
    ///
    /// Plain read with no invariant beyond "return all matching rows";
    /// calling it twice with no intervening writes returns identical
    /// results.
    pub async fn list_all(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name, id"
        ))
        .try_map(|row| product_from_row(&row))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets a product by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .try_map(|row| product_from_row(&row))
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        let specs_json = serde_json::to_string(&product.specs)
            .map_err(|e| DbError::Internal(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, brand, price_minor, discount_pct, stock,
                specs, image_url, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.brand)
        .bind(product.price_minor)
        .bind(product.discount_pct)
        .bind(product.stock)
        .bind(specs_json)
        .bind(&product.image_url)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing product (admin edit, stock included).
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let specs_json = serde_json::to_string(&product.specs)
            .map_err(|e| DbError::Internal(e.to_string()))?;
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                brand = ?3,
                price_minor = ?4,
                discount_pct = ?5,
                stock = ?6,
                specs = ?7,
                image_url = ?8,
                updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.brand)
        .bind(product.price_minor)
        .bind(product.discount_pct)
        .bind(product.stock)
        .bind(specs_json)
        .bind(&product.image_url)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Deletes a product from the catalog.
    ///
    /// Sale/order history is unaffected: line items hold snapshot
    /// copies, not references.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts catalog entries (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use mobimart_core::SpecEntry;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn sample_product(name: &str, price: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: generate_product_id(),
            name: name.to_string(),
            brand: None,
            price_minor: price,
            discount_pct: 0,
            stock,
            specs: ProductSpecs::default(),
            image_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.products();

        let mut p = sample_product("iPhone 15", 79_999, 10);
        p.brand = Some("Apple".to_string());
        p.specs = ProductSpecs::Pairs(vec![SpecEntry {
            key: "Storage".to_string(),
            value: "128GB".to_string(),
        }]);
        repo.insert(&p).await.unwrap();

        let fetched = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "iPhone 15");
        assert_eq!(fetched.brand.as_deref(), Some("Apple"));
        assert_eq!(fetched.stock, 10);
        assert_eq!(fetched.specs, p.specs);
    }

    #[tokio::test]
    async fn test_legacy_text_specs_roundtrip() {
        let db = test_db().await;
        let repo = db.products();

        let mut p = sample_product("OnePlus 12 5G", 64_999, 3);
        p.specs = ProductSpecs::Text("16GB RAM, Flowy Emerald".to_string());
        repo.insert(&p).await.unwrap();

        let fetched = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(
            fetched.specs,
            ProductSpecs::Text("16GB RAM, Flowy Emerald".to_string())
        );
    }

    #[tokio::test]
    async fn test_listing_is_idempotent() {
        let db = test_db().await;
        let repo = db.products();

        for (name, price) in [("Vivo V30 Pro", 41_999), ("Redmi Note 13 Pro+", 31_999)] {
            repo.insert(&sample_product(name, price, 5)).await.unwrap();
        }

        let first = repo.list_all().await.unwrap();
        let second = repo.list_all().await.unwrap();

        assert_eq!(first.len(), 2);
        let ids = |ps: &[Product]| ps.iter().map(|p| p.id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = test_db().await;
        let repo = db.products();

        let mut p = sample_product("Galaxy S24 Ultra", 129_999, 4);
        repo.insert(&p).await.unwrap();

        p.discount_pct = 15;
        p.stock = 9;
        repo.update(&p).await.unwrap();

        let fetched = repo.get_by_id(&p.id).await.unwrap().unwrap();
        assert_eq!(fetched.discount_pct, 15);
        assert_eq!(fetched.stock, 9);

        repo.delete(&p.id).await.unwrap();
        assert!(repo.get_by_id(&p.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&p.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_negative_stock_rejected_by_schema() {
        let db = test_db().await;
        let repo = db.products();

        let p = sample_product("Broken", 100, -1);
        assert!(repo.insert(&p).await.is_err());
    }
}
