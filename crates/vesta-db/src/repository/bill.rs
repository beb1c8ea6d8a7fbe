//! # Bill Repository
//!
//! Read projections over bills and their line items, plus the in-transaction
//! write primitives the billing engine composes into its units of work.
//!
//! ## Ownership
//! A bill exclusively owns its items: items are inserted in the same
//! transaction as the bill and deleted (items first, then the parent) in
//! the same transaction when a held bill is discarded. Nothing else ever
//! mutates a bill item.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use vesta_core::{Bill, BillFilter, BillItem, BillWithItems};

const BILL_COLUMNS: &str = "\
    id, bill_number, customer_id, user_id, subtotal_cents, discount_cents, \
    discount_type, tax_cents, total_cents, payment_method, paid_cents, \
    change_cents, credit_cents, status, is_held, notes, created_at";

const ITEM_COLUMNS: &str = "\
    id, bill_id, product_id, product_name, quantity, unit_price_cents, \
    discount_cents, subtotal_cents, created_at";

/// Repository for bill database operations.
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: SqlitePool,
}

impl BillRepository {
    /// Creates a new BillRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BillRepository { pool }
    }

    /// Gets a bill by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Bill>> {
        let bill = sqlx::query_as::<_, Bill>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bill)
    }

    /// Gets a bill by its business number.
    pub async fn get_by_number(&self, bill_number: &str) -> DbResult<Option<Bill>> {
        let bill = sqlx::query_as::<_, Bill>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE bill_number = ?1"
        ))
        .bind(bill_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bill)
    }

    /// Gets all items for a bill, in insertion order.
    pub async fn get_items(&self, bill_id: i64) -> DbResult<Vec<BillItem>> {
        let items = sqlx::query_as::<_, BillItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM bill_items WHERE bill_id = ?1 ORDER BY id"
        ))
        .bind(bill_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Attaches items to a bill.
    pub async fn with_items(&self, bill: Bill) -> DbResult<BillWithItems> {
        let items = self.get_items(bill.id).await?;
        Ok(BillWithItems { bill, items })
    }

    /// Lists bills, optionally filtered by an inclusive creation-time
    /// range, newest first.
    pub async fn list(&self, filter: &BillFilter) -> DbResult<Vec<Bill>> {
        let bills = sqlx::query_as::<_, Bill>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills \
             WHERE (?1 IS NULL OR created_at >= ?1) \
               AND (?2 IS NULL OR created_at <= ?2) \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(bills)
    }

    /// The 5 most recent bills for a customer, items attached.
    pub async fn for_customer(&self, customer_id: i64) -> DbResult<Vec<BillWithItems>> {
        let bills = sqlx::query_as::<_, Bill>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills \
             WHERE customer_id = ?1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT 5"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        let mut enriched = Vec::with_capacity(bills.len());
        for bill in bills {
            enriched.push(self.with_items(bill).await?);
        }

        Ok(enriched)
    }

    /// All held bills, newest first, items attached.
    pub async fn list_held(&self) -> DbResult<Vec<BillWithItems>> {
        let bills = sqlx::query_as::<_, Bill>(&format!(
            "SELECT {BILL_COLUMNS} FROM bills \
             WHERE is_held = 1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut enriched = Vec::with_capacity(bills.len());
        for bill in bills {
            enriched.push(self.with_items(bill).await?);
        }

        Ok(enriched)
    }
}

// =============================================================================
// In-Transaction Primitives
// =============================================================================

/// Inserts a bill row inside the caller's transaction; `bill.id` is
/// ignored and the generated id returned.
pub(crate) async fn insert_bill(conn: &mut SqliteConnection, bill: &Bill) -> DbResult<i64> {
    debug!(bill_number = %bill.bill_number, "Inserting bill");

    let result = sqlx::query(
        r#"
        INSERT INTO bills (
            bill_number, customer_id, user_id, subtotal_cents, discount_cents,
            discount_type, tax_cents, total_cents, payment_method, paid_cents,
            change_cents, credit_cents, status, is_held, notes, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
        "#,
    )
    .bind(&bill.bill_number)
    .bind(bill.customer_id)
    .bind(bill.user_id)
    .bind(bill.subtotal_cents)
    .bind(bill.discount_cents)
    .bind(bill.discount_type)
    .bind(bill.tax_cents)
    .bind(bill.total_cents)
    .bind(bill.payment_method)
    .bind(bill.paid_cents)
    .bind(bill.change_cents)
    .bind(bill.credit_cents)
    .bind(bill.status)
    .bind(bill.is_held)
    .bind(&bill.notes)
    .bind(bill.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Inserts a line item inside the caller's transaction; `item.id` is
/// ignored and the generated id returned.
pub(crate) async fn insert_item(conn: &mut SqliteConnection, item: &BillItem) -> DbResult<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO bill_items (
            bill_id, product_id, product_name, quantity, unit_price_cents,
            discount_cents, subtotal_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(item.bill_id)
    .bind(item.product_id)
    .bind(&item.product_name)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.discount_cents)
    .bind(item.subtotal_cents)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Fetches a bill on the caller's transaction connection.
pub(crate) async fn fetch_bill(conn: &mut SqliteConnection, id: i64) -> DbResult<Option<Bill>> {
    let bill = sqlx::query_as::<_, Bill>(&format!(
        "SELECT {BILL_COLUMNS} FROM bills WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(bill)
}

/// Fetches a bill's items on the caller's transaction connection.
pub(crate) async fn fetch_items(
    conn: &mut SqliteConnection,
    bill_id: i64,
) -> DbResult<Vec<BillItem>> {
    let items = sqlx::query_as::<_, BillItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM bill_items WHERE bill_id = ?1 ORDER BY id"
    ))
    .bind(bill_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(items)
}

/// Deletes a held bill and its items inside the caller's transaction:
/// items before parent, both conditioned on the held state.
///
/// Returns NotFound when the bill is missing or not held - the caller can
/// distinguish "already gone" from "deleted" instead of a silent no-op.
pub(crate) async fn delete_held_bill(conn: &mut SqliteConnection, bill_id: i64) -> DbResult<()> {
    sqlx::query(
        r#"
        DELETE FROM bill_items
        WHERE bill_id = ?1
          AND EXISTS (SELECT 1 FROM bills WHERE id = ?1 AND is_held = 1)
        "#,
    )
    .bind(bill_id)
    .execute(&mut *conn)
    .await?;

    let result = sqlx::query("DELETE FROM bills WHERE id = ?1 AND is_held = 1")
        .bind(bill_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Held bill", bill_id));
    }

    debug!(bill_id = %bill_id, "Held bill deleted");
    Ok(())
}

/// Marks a bill with a new status inside the caller's transaction.
pub(crate) async fn update_status(
    conn: &mut SqliteConnection,
    bill_id: i64,
    status: vesta_core::BillStatus,
) -> DbResult<()> {
    let result = sqlx::query("UPDATE bills SET status = ?2 WHERE id = ?1")
        .bind(bill_id)
        .bind(status)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Bill", bill_id));
    }

    Ok(())
}
