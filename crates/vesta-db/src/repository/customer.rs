//! # Customer Repository (Credit Ledger)
//!
//! Owns customer credit balances and loyalty point balances.
//!
//! ## Atomicity Contract
//! `extend_credit` and `add_loyalty_points` take an already-started write
//! transaction: they run as part of the billing engine's unit of work and
//! share its commit-or-rollback fate. Only the read projections and
//! catalog operations own their connections.
//!
//! ## Reconciliation
//! `credit_summary` returns the raw material for the invariant
//! `current_credit == Σ bill.credit − Σ payment.amount`; the test suite
//! checks it, the ledger does not re-derive it defensively.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult, EngineResult};
use vesta_core::{Bill, CreditPayment, CreditSummary, Customer, NewCustomer};

const CUSTOMER_COLUMNS: &str = "\
    id, name, phone, credit_limit_cents, current_credit_cents, \
    loyalty_points, is_active, created_at, updated_at";

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Gets a customer by id.
    pub async fn get_by_id(&self, id: i64) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Lists active customers sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers \
             WHERE is_active = 1 ORDER BY name LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Inserts a new customer with zero balances.
    pub async fn insert(&self, new: &NewCustomer) -> EngineResult<Customer> {
        new.validate()?;

        debug!(name = %new.name, "Inserting customer");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO customers (
                name, phone, credit_limit_cents, current_credit_cents,
                loyalty_points, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, 0, 0, 1, ?4, ?4)
            "#,
        )
        .bind(&new.name)
        .bind(&new.phone)
        .bind(new.credit_limit_cents)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        Ok(Customer {
            id: result.last_insert_rowid(),
            name: new.name.clone(),
            phone: new.phone.clone(),
            credit_limit_cents: new.credit_limit_cents,
            current_credit_cents: 0,
            loyalty_points: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Soft-deletes a customer.
    pub async fn soft_delete(&self, id: i64) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE customers SET is_active = 0, updated_at = ?2 WHERE id = ?1",
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(())
    }

    /// Read-only aggregate of a customer's credit position: the customer
    /// row, every bill referencing them, and every credit payment.
    pub async fn credit_summary(&self, customer_id: i64) -> DbResult<CreditSummary> {
        let customer = self
            .get_by_id(customer_id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", customer_id))?;

        let bills = sqlx::query_as::<_, Bill>(
            r#"
            SELECT id, bill_number, customer_id, user_id, subtotal_cents,
                   discount_cents, discount_type, tax_cents, total_cents,
                   payment_method, paid_cents, change_cents, credit_cents,
                   status, is_held, notes, created_at
            FROM bills
            WHERE customer_id = ?1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        let payments = sqlx::query_as::<_, CreditPayment>(
            r#"
            SELECT id, customer_id, bill_id, amount_cents, payment_method,
                   user_id, notes, created_at
            FROM credit_payments
            WHERE customer_id = ?1
            ORDER BY id
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(CreditSummary {
            customer,
            bills,
            payments,
        })
    }
}

// =============================================================================
// In-Transaction Primitives
// =============================================================================

/// Fetches a customer on the caller's transaction connection.
pub(crate) async fn fetch_customer(
    conn: &mut SqliteConnection,
    customer_id: i64,
) -> DbResult<Customer> {
    sqlx::query_as::<_, Customer>(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1 AND is_active = 1"
    ))
    .bind(customer_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DbError::not_found("Customer", customer_id))
}

/// Increments the customer's outstanding credit, inside the enclosing
/// unit of work. Negative amounts decrement (payments).
pub(crate) async fn extend_credit(
    conn: &mut SqliteConnection,
    customer_id: i64,
    amount_cents: i64,
) -> DbResult<()> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE customers
        SET current_credit_cents = current_credit_cents + ?2, updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(customer_id)
    .bind(amount_cents)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Customer", customer_id));
    }

    debug!(customer_id = %customer_id, amount = %amount_cents, "Credit extended");
    Ok(())
}

/// Adds loyalty points, inside the enclosing unit of work.
pub(crate) async fn add_loyalty_points(
    conn: &mut SqliteConnection,
    customer_id: i64,
    points: i64,
) -> DbResult<()> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE customers
        SET loyalty_points = loyalty_points + ?2, updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(customer_id)
    .bind(points)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Customer", customer_id));
    }

    debug!(customer_id = %customer_id, points = %points, "Loyalty points added");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::txn;

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn walk_up() -> NewCustomer {
        NewCustomer {
            name: "Amina Khan".to_string(),
            phone: Some("0300-1234567".to_string()),
            credit_limit_cents: 500_000,
        }
    }

    #[tokio::test]
    async fn test_insert_starts_with_zero_balances() {
        let db = setup().await;
        let customer = db.customers().insert(&walk_up()).await.unwrap();

        assert!(customer.id > 0);
        assert_eq!(customer.current_credit_cents, 0);
        assert_eq!(customer.loyalty_points, 0);
    }

    #[tokio::test]
    async fn test_extend_credit_and_points_in_txn() {
        let db = setup().await;
        let customer = db.customers().insert(&walk_up()).await.unwrap();

        let mut conn = txn::begin_immediate(db.pool()).await.unwrap();
        extend_credit(&mut conn, customer.id, 100_000).await.unwrap();
        add_loyalty_points(&mut conn, customer.id, 3).await.unwrap();
        txn::commit(&mut conn).await.unwrap();
        drop(conn);

        let fresh = db.customers().get_by_id(customer.id).await.unwrap().unwrap();
        assert_eq!(fresh.current_credit_cents, 100_000);
        assert_eq!(fresh.loyalty_points, 3);
        assert_eq!(fresh.available_credit_cents(), 400_000);
    }

    #[tokio::test]
    async fn test_rollback_leaves_balances_untouched() {
        let db = setup().await;
        let customer = db.customers().insert(&walk_up()).await.unwrap();

        let mut conn = txn::begin_immediate(db.pool()).await.unwrap();
        extend_credit(&mut conn, customer.id, 77_000).await.unwrap();
        txn::rollback(&mut conn).await;
        drop(conn);

        let fresh = db.customers().get_by_id(customer.id).await.unwrap().unwrap();
        assert_eq!(fresh.current_credit_cents, 0);
    }

    #[tokio::test]
    async fn test_credit_summary_missing_customer() {
        let db = setup().await;
        let err = db.customers().credit_summary(42).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
