//! # Product Repository
//!
//! Database operations for menu items, including the stock deductions
//! that follow a durable order write.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use comanda_core::{OrderItem, Product};

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

const PRODUCT_COLUMNS: &str = "id, name, description, price_cents, category, \
     track_stock, current_stock, is_active, created_at, updated_at";

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a product.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, price_cents, category,
                track_stock, current_stock, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(&product.category)
        .bind(product.track_stock)
        .bind(product.current_stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE id = ?1", PRODUCT_COLUMNS);
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Lists active products, by name.
    pub async fn list_active(&self) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {} FROM products WHERE is_active = 1 ORDER BY name",
            PRODUCT_COLUMNS
        );
        let products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Deducts stock for each line of an emitted order.
    ///
    /// Only products with `track_stock` are touched. Runs in one
    /// transaction so a multi-line ticket deducts all-or-nothing.
    ///
    /// Callers sequence this strictly AFTER the order write: stock must
    /// never be deducted for an order that failed to save.
    pub async fn deduct_stock(&self, items: &[OrderItem]) -> DbResult<()> {
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        for item in items {
            let result = sqlx::query(
                r#"
                UPDATE products SET
                    current_stock = current_stock - ?2,
                    updated_at = ?3
                WHERE id = ?1 AND track_stock = 1
                "#,
            )
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() > 0 {
                debug!(product_id = %item.product_id, quantity = item.quantity, "Stock deducted");
            }
        }

        tx.commit().await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn product(id: &str, track_stock: bool, stock: Option<i64>) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            description: None,
            price_cents: 2500,
            category: Some("burgers".to_string()),
            track_stock,
            current_stock: stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn line(product_id: &str, quantity: i64) -> OrderItem {
        OrderItem {
            id: uuid::Uuid::new_v4().to_string(),
            order_id: "o1".to_string(),
            product_id: product_id.to_string(),
            name_snapshot: "Burger".to_string(),
            unit_price_cents: 2500,
            quantity,
            line_total_cents: 2500 * quantity,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_active() {
        let db = test_db().await;

        db.products()
            .insert(&product("p1", false, None))
            .await
            .unwrap();

        let mut inactive = product("p2", false, None);
        inactive.is_active = false;
        db.products().insert(&inactive).await.unwrap();

        let active = db.products().list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "p1");
    }

    #[tokio::test]
    async fn test_deduct_stock_only_for_tracked_products() {
        let db = test_db().await;

        db.products()
            .insert(&product("tracked", true, Some(10)))
            .await
            .unwrap();
        db.products()
            .insert(&product("untracked", false, None))
            .await
            .unwrap();

        db.products()
            .deduct_stock(&[line("tracked", 3), line("untracked", 5)])
            .await
            .unwrap();

        let tracked = db.products().get_by_id("tracked").await.unwrap().unwrap();
        assert_eq!(tracked.current_stock, Some(7));

        let untracked = db.products().get_by_id("untracked").await.unwrap().unwrap();
        assert_eq!(untracked.current_stock, None);
    }
}
