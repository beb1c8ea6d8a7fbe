//! # vesta-api: Request/Response Bridge for Vesta POS
//!
//! One typed operation per bridge method. Whatever transport fronts the
//! store (local IPC, a desktop shell, an in-process call), the contract is
//! the same: an operation takes a validated payload and returns either its
//! data or an [`ApiError`] envelope with a machine code and human-readable
//! message. There is no partial-success shape.
//!
//! ## Operations
//! ```text
//! ┌──────────────────────────┬────────────────────────────────────────┐
//! │ create_sale              │ CreateSaleInput        → Bill          │
//! │ hold_bill                │ HoldBillInput          → Bill          │
//! │ list_held                │ -                      → BillWithItems[]│
//! │ resume_held              │ bill_id                → BillWithItems │
//! │ delete_held              │ bill_id                → ()            │
//! │ get_bill / _by_number    │ bill_id | bill_number  → BillWithItems │
//! │ bills_for_customer       │ customer_id            → BillWithItems[]│
//! │ list_bills               │ BillFilter             → Bill[]        │
//! │ refund_sale              │ bill_id, user_id       → Bill          │
//! │ record_credit_payment    │ RecordPaymentInput     → CreditPayment │
//! │ list_credit_payments     │ customer_id            → CreditPayment[]│
//! │ get_credit_summary       │ customer_id            → CreditSummary │
//! │ adjust_stock             │ AdjustStockInput       → StockMovement │
//! │ get_low_stock            │ -                      → Product[]     │
//! └──────────────────────────┴────────────────────────────────────────┘
//! ```
//!
//! Identity is caller-supplied: every mutating payload carries the
//! `user_id` of the cashier, there is no process-wide "current user".

pub mod error;

pub use error::{ApiError, ErrorCode};

use vesta_core::{
    AdjustStockInput, Bill, BillFilter, BillWithItems, CreateSaleInput, CreditPayment,
    CreditSummary, HoldBillInput, Product, RecordPaymentInput, StockMovement,
};
use vesta_db::Database;

/// Result type for bridge operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// The bridge facade: every operation the UI layer may invoke.
#[derive(Debug, Clone)]
pub struct PosApi {
    db: Database,
}

impl PosApi {
    /// Creates the facade over an initialized database.
    pub fn new(db: Database) -> Self {
        PosApi { db }
    }

    // =========================================================================
    // Billing
    // =========================================================================

    /// Creates a completed sale as one atomic unit of work.
    pub async fn create_sale(&self, input: &CreateSaleInput) -> ApiResult<Bill> {
        Ok(self.db.billing().create_sale(input).await?)
    }

    /// Suspends a draft sale without payment or stock impact.
    pub async fn hold_bill(&self, input: &HoldBillInput) -> ApiResult<Bill> {
        Ok(self.db.billing().hold_bill(input).await?)
    }

    /// All held bills, newest first, items attached.
    pub async fn list_held(&self) -> ApiResult<Vec<BillWithItems>> {
        Ok(self.db.billing().list_held().await?)
    }

    /// Fetches a held bill for the caller to resume (read-only).
    pub async fn resume_held(&self, bill_id: i64) -> ApiResult<BillWithItems> {
        Ok(self.db.billing().resume_held(bill_id).await?)
    }

    /// Deletes a held bill; NotFound when it is missing or not held.
    pub async fn delete_held(&self, bill_id: i64) -> ApiResult<()> {
        Ok(self.db.billing().delete_held(bill_id).await?)
    }

    /// Gets a bill by id, items attached.
    pub async fn get_bill(&self, bill_id: i64) -> ApiResult<BillWithItems> {
        Ok(self.db.billing().get_bill(bill_id).await?)
    }

    /// Gets a bill by its business number, items attached.
    pub async fn get_bill_by_number(&self, bill_number: &str) -> ApiResult<BillWithItems> {
        Ok(self.db.billing().get_bill_by_number(bill_number).await?)
    }

    /// The 5 most recent bills for a customer, items attached.
    pub async fn bills_for_customer(&self, customer_id: i64) -> ApiResult<Vec<BillWithItems>> {
        Ok(self.db.billing().bills_for_customer(customer_id).await?)
    }

    /// Lists bills with an optional inclusive creation-time range.
    pub async fn list_bills(&self, filter: &BillFilter) -> ApiResult<Vec<Bill>> {
        Ok(self.db.billing().list_bills(filter).await?)
    }

    /// Reverses a completed sale, restoring stock through 'return'
    /// movements.
    pub async fn refund_sale(&self, bill_id: i64, user_id: i64) -> ApiResult<Bill> {
        Ok(self.db.billing().refund_sale(bill_id, user_id).await?)
    }

    // =========================================================================
    // Credit
    // =========================================================================

    /// Records a payment against a customer's outstanding credit.
    pub async fn record_credit_payment(
        &self,
        input: &RecordPaymentInput,
    ) -> ApiResult<CreditPayment> {
        Ok(self.db.credit_payments().record_payment(input).await?)
    }

    /// All payments for a customer, in insertion order.
    pub async fn list_credit_payments(&self, customer_id: i64) -> ApiResult<Vec<CreditPayment>> {
        Ok(self
            .db
            .credit_payments()
            .payments_for_customer(customer_id)
            .await?)
    }

    /// The customer's credit position: customer, bills, payments.
    pub async fn get_credit_summary(&self, customer_id: i64) -> ApiResult<CreditSummary> {
        Ok(self.db.customers().credit_summary(customer_id).await?)
    }

    // =========================================================================
    // Inventory
    // =========================================================================

    /// Applies a stock delta and returns the appended movement.
    pub async fn adjust_stock(&self, input: &AdjustStockInput) -> ApiResult<StockMovement> {
        Ok(self.db.products().adjust_stock(input).await?)
    }

    /// Active products at or below their reorder level.
    pub async fn get_low_stock(&self) -> ApiResult<Vec<Product>> {
        Ok(self.db.products().get_low_stock().await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
