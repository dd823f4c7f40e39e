//! # Product Repository
//!
//! Database operations for the product catalog.
//!
//! ## Key Operations
//! - Search by SKU or name
//! - CRUD with soft delete
//! - Stock deltas (manual adjustments, orders, credit notes)
//!
//! ## Stock Updates Are Deltas
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  ❌ UPDATE products SET current_stock = 7                           │
//! │  ✅ UPDATE products SET current_stock = current_stock - 3           │
//! │                                                                     │
//! │  Two order transactions selling 3 and 2 units leave stock - 5,      │
//! │  and a credit note adds back exactly the quantities it reverses.   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::{begin_write, like_pattern, new_id};
use crate::error::{DbError, DbResult};
use gestor_core::validation::{validate_name, validate_price_cents, validate_sku, validate_tax_rate_bps};
use gestor_core::Product;

const PRODUCT_COLUMNS: &str = "id, sku, name, description, price_cents, cost_cents, \
     tax_rate_bps, track_inventory, allow_negative_stock, current_stock, is_active, \
     created_at, updated_at";

/// Fields for a new product.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub cost_cents: Option<i64>,
    #[serde(default = "default_tax_rate")]
    pub tax_rate_bps: u32,
    #[serde(default = "default_true")]
    pub track_inventory: bool,
    #[serde(default)]
    pub allow_negative_stock: bool,
    #[serde(default)]
    pub current_stock: i64,
}

fn default_tax_rate() -> u32 {
    2100
}

fn default_true() -> bool {
    true
}

/// Partial update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub cost_cents: Option<i64>,
    pub tax_rate_bps: Option<u32>,
    pub track_inventory: Option<bool>,
    pub allow_negative_stock: Option<bool>,
    pub is_active: Option<bool>,
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists active products, optionally filtered by SKU/name substring.
    pub async fn list(&self, query: Option<&str>, limit: u32) -> DbResult<Vec<Product>> {
        debug!(query = ?query, limit = %limit, "Listing products");

        let products = match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => {
                let sql = format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products \
                     WHERE is_active = 1 AND (sku LIKE ?1 ESCAPE '\\' OR name LIKE ?1 ESCAPE '\\') \
                     ORDER BY name LIMIT ?2"
                );
                sqlx::query_as::<_, Product>(&sql)
                    .bind(like_pattern(q))
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY name LIMIT ?1"
                );
                sqlx::query_as::<_, Product>(&sql)
                    .bind(limit)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        debug!(count = products.len(), "Products listed");
        Ok(products)
    }

    /// Gets a product by its ID (active or not).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_product(&mut conn, id).await
    }

    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(sku.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, new: NewProduct) -> DbResult<Product> {
        validate_sku(&new.sku)?;
        validate_name("name", &new.name)?;
        validate_price_cents(new.price_cents)?;
        validate_tax_rate_bps(new.tax_rate_bps)?;

        debug!(sku = %new.sku, "Inserting product");

        let now = Utc::now();
        let product = Product {
            id: new_id(),
            sku: new.sku.trim().to_string(),
            name: new.name.trim().to_string(),
            description: new.description,
            price_cents: new.price_cents,
            cost_cents: new.cost_cents,
            tax_rate_bps: new.tax_rate_bps,
            track_inventory: new.track_inventory,
            allow_negative_stock: new.allow_negative_stock,
            current_stock: new.current_stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let sql = format!(
            "INSERT INTO products ({PRODUCT_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
        );
        sqlx::query(&sql)
            .bind(&product.id)
            .bind(&product.sku)
            .bind(&product.name)
            .bind(&product.description)
            .bind(product.price_cents)
            .bind(product.cost_cents)
            .bind(product.tax_rate_bps)
            .bind(product.track_inventory)
            .bind(product.allow_negative_stock)
            .bind(product.current_stock)
            .bind(product.is_active)
            .bind(product.created_at)
            .bind(product.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::UniqueViolation { .. } => DbError::duplicate("sku", &product.sku),
                other => other,
            })?;

        Ok(product)
    }

    /// Applies a partial update. Stock is not editable here; use
    /// [`ProductRepository::adjust_stock`].
    pub async fn update(&self, id: &str, update: ProductUpdate) -> DbResult<Product> {
        if let Some(sku) = &update.sku {
            validate_sku(sku)?;
        }
        if let Some(name) = &update.name {
            validate_name("name", name)?;
        }
        if let Some(price) = update.price_cents {
            validate_price_cents(price)?;
        }
        if let Some(bps) = update.tax_rate_bps {
            validate_tax_rate_bps(bps)?;
        }

        debug!(id = %id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                sku = COALESCE(?2, sku),
                name = COALESCE(?3, name),
                description = COALESCE(?4, description),
                price_cents = COALESCE(?5, price_cents),
                cost_cents = COALESCE(?6, cost_cents),
                tax_rate_bps = COALESCE(?7, tax_rate_bps),
                track_inventory = COALESCE(?8, track_inventory),
                allow_negative_stock = COALESCE(?9, allow_negative_stock),
                is_active = COALESCE(?10, is_active),
                updated_at = ?11
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(update.sku.as_deref().map(str::trim))
        .bind(update.name.as_deref().map(str::trim))
        .bind(update.description)
        .bind(update.price_cents)
        .bind(update.cost_cents)
        .bind(update.tax_rate_bps)
        .bind(update.track_inventory)
        .bind(update.allow_negative_stock)
        .bind(update.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Soft-deletes a product. Invoice lines keep referencing it.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deactivating product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }
        Ok(())
    }

    /// Manually adjusts stock by `delta` (positive to restock, negative for
    /// shrinkage) and returns the updated product.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<Product> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        let mut tx = begin_write(&self.pool).await?;
        let affected = apply_stock_delta(&mut tx, id, delta).await?;
        if affected == 0 {
            return Err(DbError::not_found("Product", id));
        }
        let product = fetch_product(&mut tx, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;
        tx.commit().await?;

        Ok(product)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Loads a product on an existing connection or transaction.
pub(crate) async fn fetch_product(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(product)
}

/// Adds `delta` to a product's stock. Returns the number of rows touched.
pub(crate) async fn apply_stock_delta(conn: &mut SqliteConnection, id: &str, delta: i64) -> DbResult<u64> {
    let result = sqlx::query(
        "UPDATE products SET current_stock = current_stock + ?2, updated_at = ?3 WHERE id = ?1",
    )
    .bind(id)
    .bind(delta)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{db, product};

    #[tokio::test]
    async fn test_insert_and_search() {
        let db = db().await;
        product(&db, "YERBA-1KG", 350_000, 10).await;
        product(&db, "AZUCAR-1KG", 120_000, 5).await;

        let all = db.products().list(None, 50).await.unwrap();
        assert_eq!(all.len(), 2);

        let found = db.products().list(Some("yerba"), 50).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].sku, "YERBA-1KG");
    }

    #[tokio::test]
    async fn test_duplicate_sku() {
        let db = db().await;
        product(&db, "YERBA-1KG", 350_000, 10).await;

        let err = db
            .products()
            .insert(NewProduct {
                sku: "YERBA-1KG".into(),
                name: "Otra".into(),
                description: None,
                price_cents: 1,
                cost_cents: None,
                tax_rate_bps: 2100,
                track_inventory: true,
                allow_negative_stock: false,
                current_stock: 0,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_and_deactivate() {
        let db = db().await;
        let p = product(&db, "FIDEOS-500", 90_000, 3).await;

        let updated = db
            .products()
            .update(
                &p.id,
                ProductUpdate {
                    price_cents: Some(95_000),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.price_cents, 95_000);
        assert_eq!(updated.name, p.name);

        db.products().deactivate(&p.id).await.unwrap();
        assert!(db.products().list(None, 50).await.unwrap().is_empty());
        assert!(!db.products().get_by_id(&p.id).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_adjust_stock() {
        let db = db().await;
        let p = product(&db, "ARROZ-1KG", 110_000, 3).await;

        let p = db.products().adjust_stock(&p.id, 7).await.unwrap();
        assert_eq!(p.current_stock, 10);
        let p = db.products().adjust_stock(&p.id, -4).await.unwrap();
        assert_eq!(p.current_stock, 6);

        assert!(matches!(
            db.products().adjust_stock("missing", 1).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
