//! # Product Repository (Inventory Ledger)
//!
//! Single source of truth for `current_stock` and its audit trail.
//!
//! ## The Ledger Rule
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  current_stock is NEVER written directly.                         │
//! │                                                                   │
//! │  Every change goes through apply_stock_change():                  │
//! │                                                                   │
//! │    read current_stock (inside the write transaction)              │
//! │         │                                                         │
//! │         ▼                                                         │
//! │    new_stock = previous_stock + delta                             │
//! │         │                                                         │
//! │         ▼                                                         │
//! │    UPDATE products ──► INSERT stock_movements (append-only)       │
//! │                                                                   │
//! │  The movement row satisfies new = previous + quantity exactly,    │
//! │  and previous equals the stock immediately before the append:     │
//! │  writers hold the SQLite write lock, so movements are totally     │
//! │  ordered per product.                                             │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No floor at zero is enforced here - callers that require non-negative
//! stock (the billing engine) check `Product::can_sell` before calling.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult, EngineResult};
use crate::txn;
use vesta_core::{AdjustStockInput, MovementType, NewProduct, Product, StockMovement};

const PRODUCT_COLUMNS: &str = "\
    id, sku, barcode, name, selling_price_cents, cost_price_cents, \
    current_stock, reorder_level, allow_negative_stock, is_active, \
    created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1"
        ))
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its barcode.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1"
        ))
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = 1 ORDER BY name LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Inserted product with its generated id
    /// * `Err(DbError::UniqueViolation)` - SKU or barcode already exists
    pub async fn insert(&self, new: &NewProduct) -> EngineResult<Product> {
        new.validate()?;

        debug!(sku = %new.sku, "Inserting product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO products (
                sku, barcode, name, selling_price_cents, cost_price_cents,
                current_stock, reorder_level, allow_negative_stock,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?9)
            "#,
        )
        .bind(&new.sku)
        .bind(&new.barcode)
        .bind(&new.name)
        .bind(new.selling_price_cents)
        .bind(new.cost_price_cents)
        .bind(new.current_stock)
        .bind(new.reorder_level)
        .bind(new.allow_negative_stock)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(Product {
            id: result.last_insert_rowid(),
            sku: new.sku.clone(),
            barcode: new.barcode.clone(),
            name: new.name.clone(),
            selling_price_cents: new.selling_price_cents,
            cost_price_cents: new.cost_price_cents,
            current_stock: new.current_stock,
            reorder_level: new.reorder_level,
            allow_negative_stock: new.allow_negative_stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Updates a product's catalog fields.
    ///
    /// `current_stock` is deliberately absent: stock changes only through
    /// the ledger (`adjust_stock`), never through a catalog edit.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                sku = ?2,
                barcode = ?3,
                name = ?4,
                selling_price_cents = ?5,
                cost_price_cents = ?6,
                reorder_level = ?7,
                allow_negative_stock = ?8,
                is_active = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(product.id)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(&product.name)
        .bind(product.selling_price_cents)
        .bind(product.cost_price_cents)
        .bind(product.reorder_level)
        .bind(product.allow_negative_stock)
        .bind(product.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", product.id));
        }

        Ok(())
    }

    /// Soft-deletes a product by setting is_active = false.
    ///
    /// Historical bills still reference the row, so products referenced by
    /// a sale are never hard-deleted.
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Adjusts stock as its own unit of work and returns the appended
    /// movement.
    ///
    /// Used for purchase receiving, manual corrections, and transfers.
    /// Sales go through the billing engine, which calls the same
    /// [`apply_stock_change`] primitive inside its own transaction.
    pub async fn adjust_stock(&self, input: &AdjustStockInput) -> EngineResult<StockMovement> {
        input.validate()?;

        let mut conn = txn::begin_immediate(&self.pool).await?;
        let result = apply_stock_change(
            &mut conn,
            input.product_id,
            input.delta,
            input.movement_type,
            input.user_id,
            input.reference_id,
            input.reason.as_deref(),
        )
        .await;

        match result {
            Ok(movement) => {
                txn::commit(&mut conn).await?;
                info!(
                    product_id = %movement.product_id,
                    delta = %movement.quantity,
                    new_stock = %movement.new_stock,
                    "Stock adjusted"
                );
                Ok(movement)
            }
            Err(e) => {
                txn::rollback(&mut conn).await;
                Err(e.into())
            }
        }
    }

    /// Lists stock movements for a product, newest first.
    pub async fn movements(&self, product_id: i64, limit: u32) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT id, product_id, movement_type, quantity, previous_stock,
                   new_stock, user_id, reference_id, reason, created_at
            FROM stock_movements
            WHERE product_id = ?1
            ORDER BY id DESC
            LIMIT ?2
            "#,
        )
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Products at or below their reorder level.
    pub async fn get_low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE is_active = 1 AND current_stock <= reorder_level \
             ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// In-Transaction Primitives
// =============================================================================

/// Fetches an active product on the caller's transaction connection.
///
/// Soft-deleted products cannot be sold, so they read as NotFound here.
pub(crate) async fn fetch_product(
    conn: &mut SqliteConnection,
    product_id: i64,
) -> DbResult<Product> {
    sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND is_active = 1"
    ))
    .bind(product_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("Product", product_id))
}

/// Applies a stock delta and appends the movement row, inside an
/// already-started write transaction.
///
/// The stock is re-read on the caller's connection, so `previous_stock`
/// reflects committed state under the write lock - never a stale snapshot.
pub(crate) async fn apply_stock_change(
    conn: &mut SqliteConnection,
    product_id: i64,
    delta: f64,
    movement_type: MovementType,
    user_id: i64,
    reference_id: Option<i64>,
    reason: Option<&str>,
) -> DbResult<StockMovement> {
    let previous_stock: f64 =
        sqlx::query_scalar("SELECT current_stock FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found("Product", product_id))?;

    let new_stock = previous_stock + delta;
    let now = Utc::now();

    sqlx::query("UPDATE products SET current_stock = ?2, updated_at = ?3 WHERE id = ?1")
        .bind(product_id)
        .bind(new_stock)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    let result = sqlx::query(
        r#"
        INSERT INTO stock_movements (
            product_id, movement_type, quantity, previous_stock, new_stock,
            user_id, reference_id, reason, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(product_id)
    .bind(movement_type)
    .bind(delta)
    .bind(previous_stock)
    .bind(new_stock)
    .bind(user_id)
    .bind(reference_id)
    .bind(reason)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    debug!(
        product_id = %product_id,
        delta = %delta,
        previous = %previous_stock,
        new = %new_stock,
        "Stock movement appended"
    );

    Ok(StockMovement {
        id: result.last_insert_rowid(),
        product_id,
        movement_type,
        quantity: delta,
        previous_stock,
        new_stock,
        user_id,
        reference_id,
        reason: reason.map(str::to_string),
        created_at: now,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
