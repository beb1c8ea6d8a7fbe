//! # Credit Payment Processor
//!
//! Records payments against a customer's outstanding credit.
//!
//! ## Unit of Work
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  record_payment(customer, amount)                                 │
//! │                                                                   │
//! │  BEGIN IMMEDIATE                                                  │
//! │    1. fetch customer (NotFound if missing)                        │
//! │    2. reject amount > outstanding credit                          │
//! │    3. INSERT credit_payments row                                  │
//! │    4. UPDATE customers: current_credit −= amount                  │
//! │  COMMIT  (or ROLLBACK on any failure - no partial effects)        │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Payments are immutable once recorded; reconciliation compares them
//! against bills' credit amounts (see `CustomerRepository::credit_summary`).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbResult, EngineResult};
use crate::repository::customer;
use crate::txn;
use vesta_core::{CoreError, CreditPayment, RecordPaymentInput};

/// Processor for credit payment operations.
#[derive(Debug, Clone)]
pub struct CreditPaymentProcessor {
    pool: SqlitePool,
}

impl CreditPaymentProcessor {
    /// Creates a new CreditPaymentProcessor.
    pub fn new(pool: SqlitePool) -> Self {
        CreditPaymentProcessor { pool }
    }

    /// Records a payment and decrements the customer's credit balance as
    /// one atomic step.
    ///
    /// ## Errors
    /// - `NotFound` - unknown customer
    /// - `InvalidPaymentAmount` - amount would drive the balance negative
    pub async fn record_payment(&self, input: &RecordPaymentInput) -> EngineResult<CreditPayment> {
        input.validate()?;

        let mut conn = txn::begin_immediate(&self.pool).await?;
        let result = self.record_in_txn(&mut conn, input).await;

        match result {
            Ok(payment) => {
                txn::commit(&mut conn).await?;
                info!(
                    payment_id = %payment.id,
                    customer_id = %payment.customer_id,
                    amount = %payment.amount_cents,
                    "Credit payment recorded"
                );
                Ok(payment)
            }
            Err(e) => {
                txn::rollback(&mut conn).await;
                Err(e)
            }
        }
    }

    async fn record_in_txn(
        &self,
        conn: &mut sqlx::SqliteConnection,
        input: &RecordPaymentInput,
    ) -> EngineResult<CreditPayment> {
        let existing = customer::fetch_customer(conn, input.customer_id).await?;

        if input.amount_cents > existing.current_credit_cents {
            return Err(CoreError::InvalidPaymentAmount {
                reason: format!(
                    "payment {} exceeds outstanding credit {}",
                    input.amount_cents, existing.current_credit_cents
                ),
            }
            .into());
        }

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO credit_payments (
                customer_id, bill_id, amount_cents, payment_method,
                user_id, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(input.customer_id)
        .bind(input.bill_id)
        .bind(input.amount_cents)
        .bind(input.payment_method)
        .bind(input.user_id)
        .bind(&input.notes)
        .bind(now)
        .execute(&mut *conn)
        .await
        .map_err(crate::error::DbError::from)?;

        customer::extend_credit(conn, input.customer_id, -input.amount_cents).await?;

        debug!(customer_id = %input.customer_id, amount = %input.amount_cents, "Payment applied");

        Ok(CreditPayment {
            id: result.last_insert_rowid(),
            customer_id: input.customer_id,
            bill_id: input.bill_id,
            amount_cents: input.amount_cents,
            payment_method: input.payment_method,
            user_id: input.user_id,
            notes: input.notes.clone(),
            created_at: now,
        })
    }

    /// All payments for a customer, in insertion order.
    pub async fn payments_for_customer(&self, customer_id: i64) -> DbResult<Vec<CreditPayment>> {
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

        Ok(payments)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DbError, EngineError};
    use crate::pool::{Database, DbConfig};
    use vesta_core::{NewCustomer, PaymentMethod};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn customer_with_credit(db: &Database, credit_cents: i64) -> i64 {
        let customer = db
            .customers()
            .insert(&NewCustomer {
                name: "Bilal Ahmed".to_string(),
                phone: None,
                credit_limit_cents: 1_000_000,
            })
            .await
            .unwrap();

        if credit_cents > 0 {
            let mut conn = crate::txn::begin_immediate(db.pool()).await.unwrap();
            customer::extend_credit(&mut conn, customer.id, credit_cents)
                .await
                .unwrap();
            crate::txn::commit(&mut conn).await.unwrap();
        }

        customer.id
    }

    fn payment(customer_id: i64, amount_cents: i64) -> RecordPaymentInput {
        RecordPaymentInput {
            customer_id,
            bill_id: None,
            amount_cents,
            payment_method: PaymentMethod::Cash,
            user_id: 1,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_payment_decrements_balance() {
        let db = setup().await;
        let customer_id = customer_with_credit(&db, 100_000).await;

        let recorded = db
            .credit_payments()
            .record_payment(&payment(customer_id, 40_000))
            .await
            .unwrap();
        assert_eq!(recorded.amount_cents, 40_000);

        let fresh = db.customers().get_by_id(customer_id).await.unwrap().unwrap();
        assert_eq!(fresh.current_credit_cents, 60_000);

        let payments = db
            .credit_payments()
            .payments_for_customer(customer_id)
            .await
            .unwrap();
        assert_eq!(payments.len(), 1);
    }

    #[tokio::test]
    async fn test_overpayment_rejected_without_effects() {
        let db = setup().await;
        let customer_id = customer_with_credit(&db, 30_000).await;

        let err = db
            .credit_payments()
            .record_payment(&payment(customer_id, 50_000))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::InvalidPaymentAmount { .. })
        ));

        // Balance untouched, no payment row written.
        let fresh = db.customers().get_by_id(customer_id).await.unwrap().unwrap();
        assert_eq!(fresh.current_credit_cents, 30_000);
        assert!(db
            .credit_payments()
            .payments_for_customer(customer_id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_unknown_customer_rejected() {
        let db = setup().await;
        let err = db
            .credit_payments()
            .record_payment(&payment(404, 1_000))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Db(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_zero_amount_rejected_before_persistence() {
        let db = setup().await;
        let customer_id = customer_with_credit(&db, 10_000).await;

        let err = db
            .credit_payments()
            .record_payment(&payment(customer_id, 0))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::Validation(_))
        ));
    }
}
