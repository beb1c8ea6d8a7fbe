//! # Billing Engine
//!
//! Turns a cart of line items into a persisted sale, and manages the
//! held-bill lifecycle and refunds.
//!
//! ## Sale Unit of Work
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  create_sale(input)                                               │
//! │                                                                   │
//! │  validate input ── compute totals ── check payment coverage       │
//! │       │                                                           │
//! │       ▼                                                           │
//! │  BEGIN IMMEDIATE                                                  │
//! │    1. fetch customer, check credit limit                          │
//! │    2. generate bill number (per-day sequence, same txn)           │
//! │    3. INSERT bill                                                 │
//! │    4. per line: fetch product ── stock check ── INSERT item       │
//! │                 ── stock −= qty ── append 'sale' movement         │
//! │    5. customer credit += credit amount                            │
//! │    6. loyalty += total / 100 units                                │
//! │  COMMIT   (any failure → ROLLBACK, zero partial effects)          │
//! │       │                                                           │
//! │       └── UNIQUE(bill_number) collision → regenerate and retry    │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Held Bills
//! A held bill is a reservation-free draft: items are persisted for later
//! resume but stock, credit, and loyalty are untouched. Two held bills may
//! reference the same stock; the caller re-validates against live stock at
//! resume time. Resume is a read-only projection - the caller re-submits
//! through `create_sale` (new bill number) and then deletes the held bill
//! explicitly.
//!
//! ## Bill State Machine
//! ```text
//!   held ──── delete_held ───► (gone)
//!   held ──── create_sale ───► completed   (new bill, caller-driven)
//!   completed ── refund_sale ─► refunded   (stock reversed via 'return')
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

use crate::error::{DbError, EngineError, EngineResult};
use crate::repository::bill::{self, BillRepository};
use crate::repository::customer;
use crate::repository::product;
use crate::txn;
use vesta_core::totals::{self, compute_bill_totals, BillTotals};
use vesta_core::validation::validate_user_id;
use vesta_core::{
    Bill, BillFilter, BillItem, BillStatus, BillWithItems, CoreError, CreateSaleInput,
    HoldBillInput, MovementType, ValidationError,
};

/// How many times create/hold retry with a regenerated bill number when the
/// UNIQUE constraint trips. Under the write lock the per-day sequence is
/// already race-free, so one retry is belt-and-braces.
const MAX_BILL_NUMBER_ATTEMPTS: u32 = 3;

/// Engine for sale creation, held-bill lifecycle, and refunds.
#[derive(Debug, Clone)]
pub struct BillingEngine {
    pool: SqlitePool,
}

impl BillingEngine {
    /// Creates a new BillingEngine.
    pub fn new(pool: SqlitePool) -> Self {
        BillingEngine { pool }
    }

    fn repo(&self) -> BillRepository {
        BillRepository::new(self.pool.clone())
    }

    // =========================================================================
    // Sale Creation
    // =========================================================================

    /// Creates a completed sale as one atomic unit of work.
    ///
    /// On success the bill row, its items, every stock decrement and
    /// movement, and the customer's credit/loyalty updates are all
    /// committed together; on any failure none of them are observable.
    pub async fn create_sale(&self, input: &CreateSaleInput) -> EngineResult<Bill> {
        input.validate()?;

        if input.credit_cents > 0 && input.customer_id.is_none() {
            return Err(CoreError::CreditRequiresCustomer.into());
        }

        let totals = compute_bill_totals(
            &input.items,
            input.discount,
            input.discount_type,
            input.tax_cents,
        );
        check_discount_bounds(&totals)?;

        if input.paid_cents + input.credit_cents < totals.total_cents {
            return Err(CoreError::InvalidPaymentAmount {
                reason: format!(
                    "paid {} plus credit {} does not cover total {}",
                    input.paid_cents, input.credit_cents, totals.total_cents
                ),
            }
            .into());
        }

        let change_cents =
            totals::change_cents(totals.total_cents, input.paid_cents, input.credit_cents);

        let mut attempt = 0;
        loop {
            attempt += 1;

            let mut conn = txn::begin_immediate(&self.pool).await?;
            let result = self
                .create_sale_in_txn(&mut conn, input, &totals, change_cents)
                .await;

            match result {
                Ok(sale) => {
                    txn::commit(&mut conn).await?;
                    info!(
                        bill_id = %sale.id,
                        bill_number = %sale.bill_number,
                        total = %sale.total_cents,
                        items = input.items.len(),
                        "Sale created"
                    );
                    return Ok(sale);
                }
                Err(e) => {
                    txn::rollback(&mut conn).await;
                    if is_bill_number_collision(&e) && attempt < MAX_BILL_NUMBER_ATTEMPTS {
                        warn!(attempt, "Bill number collision, regenerating");
                        continue;
                    }
                    return Err(e);
                }
            }
        }
    }

    async fn create_sale_in_txn(
        &self,
        conn: &mut SqliteConnection,
        input: &CreateSaleInput,
        totals: &BillTotals,
        change_cents: i64,
    ) -> EngineResult<Bill> {
        let now = Utc::now();

        // Customer checks happen first so a rejected sale does not burn a
        // bill number.
        if let Some(customer_id) = input.customer_id {
            let existing = customer::fetch_customer(conn, customer_id).await?;

            if input.credit_cents > 0
                && existing.current_credit_cents + input.credit_cents
                    > existing.credit_limit_cents
            {
                return Err(CoreError::CreditLimitExceeded {
                    customer_id,
                    limit_cents: existing.credit_limit_cents,
                    outstanding_cents: existing.current_credit_cents,
                    requested_cents: input.credit_cents,
                }
                .into());
            }
        }

        let bill_number = next_bill_number(conn, now).await?;

        let mut sale = Bill {
            id: 0,
            bill_number,
            customer_id: input.customer_id,
            user_id: input.user_id,
            subtotal_cents: totals.subtotal_cents,
            discount_cents: totals.discount_cents,
            discount_type: input.discount_type,
            tax_cents: totals.tax_cents,
            total_cents: totals.total_cents,
            payment_method: Some(input.payment_method),
            paid_cents: input.paid_cents,
            change_cents,
            credit_cents: input.credit_cents,
            status: BillStatus::Completed,
            is_held: false,
            notes: input.notes.clone(),
            created_at: now,
        };
        sale.id = bill::insert_bill(conn, &sale).await?;

        for line in &input.items {
            let item_product = product::fetch_product(conn, line.product_id).await?;

            if !item_product.can_sell(line.quantity) {
                return Err(CoreError::InsufficientStock {
                    sku: item_product.sku,
                    available: item_product.current_stock,
                    requested: line.quantity,
                }
                .into());
            }

            let item = BillItem {
                id: 0,
                bill_id: sale.id,
                product_id: item_product.id,
                product_name: item_product.name.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                discount_cents: line.discount_cents,
                subtotal_cents: totals::line_subtotal_cents(line),
                created_at: now,
            };
            bill::insert_item(conn, &item).await?;

            product::apply_stock_change(
                conn,
                item_product.id,
                -line.quantity,
                MovementType::Sale,
                input.user_id,
                Some(sale.id),
                None,
            )
            .await?;
        }

        if let Some(customer_id) = input.customer_id {
            if input.credit_cents > 0 {
                customer::extend_credit(conn, customer_id, input.credit_cents).await?;
            }

            let points = totals::loyalty_points_for_total(totals.total_cents);
            if points > 0 {
                customer::add_loyalty_points(conn, customer_id, points).await?;
            }
        }

        Ok(sale)
    }

    // =========================================================================
    // Held Bills
    // =========================================================================

    /// Suspends a draft sale: the bill and its items are persisted, stock
    /// and balances are untouched, payment fields are forced to zero.
    pub async fn hold_bill(&self, input: &HoldBillInput) -> EngineResult<Bill> {
        input.validate()?;

        let totals = compute_bill_totals(
            &input.items,
            input.discount,
            input.discount_type,
            input.tax_cents,
        );
        check_discount_bounds(&totals)?;

        let mut attempt = 0;
        loop {
            attempt += 1;

            let mut conn = txn::begin_immediate(&self.pool).await?;
            let result = self.hold_bill_in_txn(&mut conn, input, &totals).await;

            match result {
                Ok(held) => {
                    txn::commit(&mut conn).await?;
                    info!(
                        bill_id = %held.id,
                        bill_number = %held.bill_number,
                        total = %held.total_cents,
                        "Bill held"
                    );
                    return Ok(held);
                }
                Err(e) => {
                    txn::rollback(&mut conn).await;
                    if is_bill_number_collision(&e) && attempt < MAX_BILL_NUMBER_ATTEMPTS {
                        warn!(attempt, "Bill number collision, regenerating");
                        continue;
                    }
                    return Err(e);
                }
            }
        }
    }

    async fn hold_bill_in_txn(
        &self,
        conn: &mut SqliteConnection,
        input: &HoldBillInput,
        totals: &BillTotals,
    ) -> EngineResult<Bill> {
        let now = Utc::now();

        if let Some(customer_id) = input.customer_id {
            customer::fetch_customer(conn, customer_id).await?;
        }

        let bill_number = next_bill_number(conn, now).await?;

        let mut held = Bill {
            id: 0,
            bill_number,
            customer_id: input.customer_id,
            user_id: input.user_id,
            subtotal_cents: totals.subtotal_cents,
            discount_cents: totals.discount_cents,
            discount_type: input.discount_type,
            tax_cents: totals.tax_cents,
            total_cents: totals.total_cents,
            payment_method: None,
            paid_cents: 0,
            change_cents: 0,
            credit_cents: 0,
            status: BillStatus::Held,
            is_held: true,
            notes: input.notes.clone(),
            created_at: now,
        };
        held.id = bill::insert_bill(conn, &held).await?;

        // Items are snapshotted for resume, but stock is NOT touched: a
        // held bill reserves nothing.
        for line in &input.items {
            let item_product = product::fetch_product(conn, line.product_id).await?;

            let item = BillItem {
                id: 0,
                bill_id: held.id,
                product_id: item_product.id,
                product_name: item_product.name.clone(),
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                discount_cents: line.discount_cents,
                subtotal_cents: totals::line_subtotal_cents(line),
                created_at: now,
            };
            bill::insert_item(conn, &item).await?;
        }

        Ok(held)
    }

    /// All held bills, newest first, items attached.
    pub async fn list_held(&self) -> EngineResult<Vec<BillWithItems>> {
        Ok(self.repo().list_held().await?)
    }

    /// Fetches a held bill with its items for the caller to resume.
    ///
    /// Read-only: the caller re-validates stock against live levels and
    /// either re-submits through [`create_sale`](Self::create_sale) or
    /// cancels. The held row is deleted separately via
    /// [`delete_held`](Self::delete_held).
    pub async fn resume_held(&self, bill_id: i64) -> EngineResult<BillWithItems> {
        let repo = self.repo();
        let held = repo
            .get_by_id(bill_id)
            .await?
            .filter(|b| b.is_held)
            .ok_or_else(|| DbError::not_found("Held bill", bill_id))?;

        Ok(repo.with_items(held).await?)
    }

    /// Deletes a held bill and its items as one unit of work.
    ///
    /// Fails with NotFound when the bill is missing or not held, so the
    /// caller can tell "already gone" from "deleted".
    pub async fn delete_held(&self, bill_id: i64) -> EngineResult<()> {
        let mut conn = txn::begin_immediate(&self.pool).await?;
        let result = bill::delete_held_bill(&mut conn, bill_id).await;

        match result {
            Ok(()) => {
                txn::commit(&mut conn).await?;
                info!(bill_id = %bill_id, "Held bill deleted");
                Ok(())
            }
            Err(e) => {
                txn::rollback(&mut conn).await;
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // Refunds
    // =========================================================================

    /// Reverses a completed sale: every item's stock comes back through a
    /// 'return' movement and the bill becomes refunded, atomically.
    pub async fn refund_sale(&self, bill_id: i64, user_id: i64) -> EngineResult<Bill> {
        validate_user_id(user_id).map_err(CoreError::Validation)?;

        let mut conn = txn::begin_immediate(&self.pool).await?;
        let result = self.refund_in_txn(&mut conn, bill_id, user_id).await;

        match result {
            Ok(refunded) => {
                txn::commit(&mut conn).await?;
                info!(
                    bill_id = %bill_id,
                    bill_number = %refunded.bill_number,
                    "Sale refunded"
                );
                Ok(refunded)
            }
            Err(e) => {
                txn::rollback(&mut conn).await;
                Err(e)
            }
        }
    }

    async fn refund_in_txn(
        &self,
        conn: &mut SqliteConnection,
        bill_id: i64,
        user_id: i64,
    ) -> EngineResult<Bill> {
        let existing = bill::fetch_bill(conn, bill_id)
            .await?
            .ok_or_else(|| DbError::not_found("Bill", bill_id))?;

        if existing.status != BillStatus::Completed {
            return Err(CoreError::InvalidBillStatus {
                bill_id,
                current_status: format!("{:?}", existing.status),
            }
            .into());
        }

        let items = bill::fetch_items(conn, bill_id).await?;
        for item in &items {
            product::apply_stock_change(
                conn,
                item.product_id,
                item.quantity,
                MovementType::Return,
                user_id,
                Some(bill_id),
                Some("refund"),
            )
            .await?;
        }

        bill::update_status(conn, bill_id, BillStatus::Refunded).await?;

        Ok(Bill {
            status: BillStatus::Refunded,
            ..existing
        })
    }

    // =========================================================================
    // Read Projections
    // =========================================================================

    /// Gets a bill by id, items attached.
    pub async fn get_bill(&self, bill_id: i64) -> EngineResult<BillWithItems> {
        let repo = self.repo();
        let found = repo
            .get_by_id(bill_id)
            .await?
            .ok_or_else(|| DbError::not_found("Bill", bill_id))?;

        Ok(repo.with_items(found).await?)
    }

    /// Gets a bill by its business number, items attached.
    pub async fn get_bill_by_number(&self, bill_number: &str) -> EngineResult<BillWithItems> {
        let repo = self.repo();
        let found = repo
            .get_by_number(bill_number)
            .await?
            .ok_or_else(|| DbError::not_found("Bill", bill_number))?;

        Ok(repo.with_items(found).await?)
    }

    /// The 5 most recent bills for a customer, items attached.
    pub async fn bills_for_customer(&self, customer_id: i64) -> EngineResult<Vec<BillWithItems>> {
        Ok(self.repo().for_customer(customer_id).await?)
    }

    /// Lists bills with an optional inclusive creation-time range.
    pub async fn list_bills(&self, filter: &BillFilter) -> EngineResult<Vec<Bill>> {
        Ok(self.repo().list(filter).await?)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// A resolved discount larger than the subtotal would drive the total
/// negative; rejected before anything is persisted.
fn check_discount_bounds(totals: &BillTotals) -> EngineResult<()> {
    if totals.discount_cents > totals.subtotal_cents {
        return Err(EngineError::Domain(CoreError::Validation(
            ValidationError::OutOfRange {
                field: "discount".to_string(),
                min: 0,
                max: totals.subtotal_cents,
            },
        )));
    }
    Ok(())
}

fn is_bill_number_collision(err: &EngineError) -> bool {
    matches!(
        err,
        EngineError::Db(DbError::UniqueViolation { field, .. }) if field.contains("bill_number")
    )
}

/// Generates the next bill number for the day: `INV-YYYYMMDD-NNNN`.
///
/// The per-day sequence is read inside the inserting transaction, so two
/// writers can never observe the same maximum; the UNIQUE constraint plus
/// the caller's retry loop covers the day boundary.
async fn next_bill_number(conn: &mut SqliteConnection, now: DateTime<Utc>) -> Result<String, DbError> {
    let prefix = format!("INV-{}-", now.format("%Y%m%d"));
    let pattern = format!("{}%", prefix);

    // CAST tolerates sequences that outgrow the 4-digit padding.
    let max_seq: Option<i64> = sqlx::query_scalar(
        "SELECT MAX(CAST(SUBSTR(bill_number, ?2) AS INTEGER)) \
         FROM bills WHERE bill_number LIKE ?1",
    )
    .bind(&pattern)
    .bind((prefix.len() + 1) as i64)
    .fetch_one(&mut *conn)
    .await?;

    Ok(format!("{}{:04}", prefix, max_seq.unwrap_or(0) + 1))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use vesta_core::{
        Customer, DiscountType, NewCustomer, NewProduct, PaymentMethod, Product, SaleLine,
    };

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// File-backed database for tests that need real concurrency
    /// (multiple pooled connections).
    async fn setup_file() -> Database {
        let path = std::env::temp_dir().join(format!("vesta-billing-{}.db", uuid::Uuid::new_v4()));
        Database::new(DbConfig::new(path).max_connections(8))
            .await
            .unwrap()
    }

    async fn seed_product(db: &Database, sku: &str, price_cents: i64, stock: f64) -> Product {
        db.products()
            .insert(&NewProduct {
                sku: sku.to_string(),
                barcode: None,
                name: format!("{sku} Product"),
                selling_price_cents: price_cents,
                cost_price_cents: None,
                current_stock: stock,
                reorder_level: 0.0,
                allow_negative_stock: false,
            })
            .await
            .unwrap()
    }

    async fn seed_customer(db: &Database, credit_limit_cents: i64) -> Customer {
        db.customers()
            .insert(&NewCustomer {
                name: "Sara Malik".to_string(),
                phone: None,
                credit_limit_cents,
            })
            .await
            .unwrap()
    }

    fn line(product_id: i64, qty: f64, unit_price_cents: i64) -> SaleLine {
        SaleLine {
            product_id,
            quantity: qty,
            unit_price_cents,
            discount_cents: 0,
        }
    }

    fn cash_sale(items: Vec<SaleLine>, paid_cents: i64) -> CreateSaleInput {
        CreateSaleInput {
            customer_id: None,
            user_id: 1,
            items,
            discount: 0,
            discount_type: DiscountType::Amount,
            tax_cents: 0,
            payment_method: PaymentMethod::Cash,
            paid_cents,
            credit_cents: 0,
            notes: None,
        }
    }

    // -------------------------------------------------------------------------
    // Totals and stock effects
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_sale_totals_and_stock() {
        let db = setup().await;
        let product = seed_product(&db, "COKE-330", 299, 10.0).await;

        let mut input = cash_sale(vec![line(product.id, 3.0, 299)], 1000);
        input.tax_cents = 50;
        input.discount = 47;

        let sale = db.billing().create_sale(&input).await.unwrap();

        // total = subtotal - discount + tax
        assert_eq!(sale.subtotal_cents, 897);
        assert_eq!(sale.discount_cents, 47);
        assert_eq!(sale.tax_cents, 50);
        assert_eq!(sale.total_cents, 900);
        assert_eq!(
            sale.total_cents,
            sale.subtotal_cents - sale.discount_cents + sale.tax_cents
        );
        assert_eq!(sale.change_cents, 100);
        assert_eq!(sale.status, BillStatus::Completed);

        // stock decremented and movement appended with exact snapshots
        let fresh = db.products().get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(fresh.current_stock, 7.0);

        let movements = db.products().movements(product.id, 10).await.unwrap();
        assert_eq!(movements.len(), 1);
        let movement = &movements[0];
        assert_eq!(movement.movement_type, MovementType::Sale);
        assert_eq!(movement.quantity, -3.0);
        assert_eq!(movement.previous_stock, 10.0);
        assert_eq!(movement.new_stock, 7.0);
        assert_eq!(movement.new_stock, movement.previous_stock + movement.quantity);
        assert_eq!(movement.reference_id, Some(sale.id));
    }

    #[tokio::test]
    async fn test_item_subtotals_and_name_snapshot() {
        let db = setup().await;
        let product = seed_product(&db, "RICE-KG", 399, 50.0).await;

        let mut sale_line = line(product.id, 1.25, 399);
        sale_line.discount_cents = 9;
        let sale = db
            .billing()
            .create_sale(&cash_sale(vec![sale_line], 490))
            .await
            .unwrap();

        let fetched = db.billing().get_bill(sale.id).await.unwrap();
        assert_eq!(fetched.items.len(), 1);
        let item = &fetched.items[0];
        // round(1.25 × 399) − 9 = 499 − 9
        assert_eq!(item.subtotal_cents, 490);
        assert_eq!(item.product_name, "RICE-KG Product");

        // later rename must not rewrite history
        let mut renamed = db.products().get_by_id(product.id).await.unwrap().unwrap();
        renamed.name = "Premium Rice".to_string();
        db.products().update(&renamed).await.unwrap();

        let again = db.billing().get_bill(sale.id).await.unwrap();
        assert_eq!(again.items[0].product_name, "RICE-KG Product");
    }

    #[tokio::test]
    async fn test_get_bill_by_number_round_trip() {
        let db = setup().await;
        let product = seed_product(&db, "MILK-1L", 250, 20.0).await;

        let sale = db
            .billing()
            .create_sale(&cash_sale(vec![line(product.id, 4.0, 250)], 1000))
            .await
            .unwrap();

        let fetched = db
            .billing()
            .get_bill_by_number(&sale.bill_number)
            .await
            .unwrap();

        assert_eq!(fetched.bill.id, sale.id);
        let items_sum: i64 = fetched.items.iter().map(|i| i.subtotal_cents).sum();
        assert_eq!(items_sum, fetched.bill.subtotal_cents);
        assert_eq!(fetched.bill.total_cents, sale.total_cents);
    }

    #[tokio::test]
    async fn test_percentage_discount_resolved_before_storage() {
        let db = setup().await;
        let product = seed_product(&db, "TV-42", 10_000, 5.0).await;

        let mut input = cash_sale(vec![line(product.id, 1.0, 10_000)], 9_000);
        input.discount = 1_000; // 10% in basis points
        input.discount_type = DiscountType::Percentage;

        let sale = db.billing().create_sale(&input).await.unwrap();
        assert_eq!(sale.discount_cents, 1_000);
        assert_eq!(sale.total_cents, 9_000);
    }

    // -------------------------------------------------------------------------
    // Failure paths and atomicity
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_failed_sale_leaves_no_partial_effects() {
        let db = setup().await;
        let product = seed_product(&db, "SODA-500", 150, 10.0).await;

        // Second line references a product that does not exist: the whole
        // unit of work must roll back, including line 1's stock change.
        let input = cash_sale(
            vec![line(product.id, 2.0, 150), line(9_999, 1.0, 100)],
            1000,
        );
        let err = db.billing().create_sale(&input).await.unwrap_err();
        assert!(matches!(err, EngineError::Db(DbError::NotFound { .. })));

        let fresh = db.products().get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(fresh.current_stock, 10.0);
        assert!(db
            .products()
            .movements(product.id, 10)
            .await
            .unwrap()
            .is_empty());
        assert!(db
            .billing()
            .list_bills(&BillFilter::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_insufficient_stock_rejected() {
        let db = setup().await;
        let product = seed_product(&db, "EGGS-12", 450, 1.0).await;

        let err = db
            .billing()
            .create_sale(&cash_sale(vec![line(product.id, 2.0, 450)], 1000))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::InsufficientStock { .. })
        ));

        let fresh = db.products().get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(fresh.current_stock, 1.0);
    }

    #[tokio::test]
    async fn test_oversell_allowed_when_flagged() {
        let db = setup().await;
        let product = db
            .products()
            .insert(&NewProduct {
                sku: "BACKORDER-1".to_string(),
                barcode: None,
                name: "Backorderable".to_string(),
                selling_price_cents: 100,
                cost_price_cents: None,
                current_stock: 1.0,
                reorder_level: 0.0,
                allow_negative_stock: true,
            })
            .await
            .unwrap();

        db.billing()
            .create_sale(&cash_sale(vec![line(product.id, 3.0, 100)], 300))
            .await
            .unwrap();

        let fresh = db.products().get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(fresh.current_stock, -2.0);
    }

    #[tokio::test]
    async fn test_underpayment_rejected() {
        let db = setup().await;
        let product = seed_product(&db, "OIL-1L", 1_000, 10.0).await;

        let err = db
            .billing()
            .create_sale(&cash_sale(vec![line(product.id, 1.0, 1_000)], 500))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::InvalidPaymentAmount { .. })
        ));
    }

    #[tokio::test]
    async fn test_walk_in_credit_rejected() {
        let db = setup().await;
        let product = seed_product(&db, "TEA-250", 500, 10.0).await;

        let mut input = cash_sale(vec![line(product.id, 1.0, 500)], 0);
        input.payment_method = PaymentMethod::Credit;
        input.credit_cents = 500;

        let err = db.billing().create_sale(&input).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::CreditRequiresCustomer)
        ));
    }

    #[tokio::test]
    async fn test_credit_limit_enforced() {
        let db = setup().await;
        let product = seed_product(&db, "FRIDGE-XL", 600_000, 2.0).await;
        let customer = seed_customer(&db, 500_000).await;

        let mut input = cash_sale(vec![line(product.id, 1.0, 600_000)], 0);
        input.customer_id = Some(customer.id);
        input.payment_method = PaymentMethod::Credit;
        input.credit_cents = 600_000;

        let err = db.billing().create_sale(&input).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::CreditLimitExceeded { .. })
        ));

        // nothing persisted
        let fresh = db.customers().get_by_id(customer.id).await.unwrap().unwrap();
        assert_eq!(fresh.current_credit_cents, 0);
    }

    // -------------------------------------------------------------------------
    // Credit and loyalty
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_credit_sale_then_payment_reconciles() {
        let db = setup().await;
        let product = seed_product(&db, "GEN-SET", 100_000, 5.0).await;
        let customer = seed_customer(&db, 500_000).await;

        // Sale of 1000.00 entirely on credit.
        let mut input = cash_sale(vec![line(product.id, 1.0, 100_000)], 0);
        input.customer_id = Some(customer.id);
        input.payment_method = PaymentMethod::Credit;
        input.credit_cents = 100_000;

        let sale = db.billing().create_sale(&input).await.unwrap();
        assert_eq!(sale.credit_cents, 100_000);

        let after_sale = db.customers().get_by_id(customer.id).await.unwrap().unwrap();
        assert_eq!(after_sale.current_credit_cents, 100_000);

        // Payment of 400.00.
        db.credit_payments()
            .record_payment(&vesta_core::RecordPaymentInput {
                customer_id: customer.id,
                bill_id: Some(sale.id),
                amount_cents: 40_000,
                payment_method: PaymentMethod::Cash,
                user_id: 1,
                notes: None,
            })
            .await
            .unwrap();

        let summary = db.customers().credit_summary(customer.id).await.unwrap();
        assert_eq!(summary.customer.current_credit_cents, 60_000);
        assert_eq!(summary.bills.len(), 1);
        assert_eq!(summary.bills[0].credit_cents, 100_000);
        assert_eq!(summary.payments.len(), 1);
        assert_eq!(summary.payments[0].amount_cents, 40_000);

        // current_credit == Σ bill.credit − Σ payment.amount
        let credit_sum: i64 = summary.bills.iter().map(|b| b.credit_cents).sum();
        let paid_sum: i64 = summary.payments.iter().map(|p| p.amount_cents).sum();
        assert_eq!(summary.customer.current_credit_cents, credit_sum - paid_sum);
    }

    #[tokio::test]
    async fn test_loyalty_points_identified_vs_walk_in() {
        let db = setup().await;
        let product = seed_product(&db, "BULK-BAG", 25_000, 10.0).await;
        let customer = seed_customer(&db, 0).await;

        // Identified sale of 250.00 → floor(250 / 100) = 2 points.
        let mut input = cash_sale(vec![line(product.id, 1.0, 25_000)], 25_000);
        input.customer_id = Some(customer.id);
        db.billing().create_sale(&input).await.unwrap();

        let fresh = db.customers().get_by_id(customer.id).await.unwrap().unwrap();
        assert_eq!(fresh.loyalty_points, 2);

        // Walk-in sale of the same total awards nothing to anyone.
        db.billing()
            .create_sale(&cash_sale(vec![line(product.id, 1.0, 25_000)], 25_000))
            .await
            .unwrap();
        let unchanged = db.customers().get_by_id(customer.id).await.unwrap().unwrap();
        assert_eq!(unchanged.loyalty_points, 2);
    }

    // -------------------------------------------------------------------------
    // Held bills
    // -------------------------------------------------------------------------

    fn hold_input(customer_id: Option<i64>, items: Vec<SaleLine>) -> HoldBillInput {
        HoldBillInput {
            customer_id,
            user_id: 1,
            items,
            discount: 0,
            discount_type: DiscountType::Amount,
            tax_cents: 0,
            notes: Some("lunch rush".to_string()),
        }
    }

    #[tokio::test]
    async fn test_hold_bill_round_trip_without_stock_impact() {
        let db = setup().await;
        let product = seed_product(&db, "BREAD-LG", 180, 12.0).await;

        let held = db
            .billing()
            .hold_bill(&hold_input(None, vec![line(product.id, 2.0, 180)]))
            .await
            .unwrap();

        assert!(held.is_held);
        assert_eq!(held.status, BillStatus::Held);
        assert_eq!(held.paid_cents, 0);
        assert_eq!(held.change_cents, 0);
        assert_eq!(held.credit_cents, 0);
        assert!(held.payment_method.is_none());

        // stock untouched - a held bill reserves nothing
        let fresh = db.products().get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(fresh.current_stock, 12.0);
        assert!(db
            .products()
            .movements(product.id, 10)
            .await
            .unwrap()
            .is_empty());

        let listed = db.billing().list_held().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].bill.id, held.id);
        assert_eq!(listed[0].bill.total_cents, 360);
        assert_eq!(listed[0].items.len(), 1);
        assert_eq!(listed[0].items[0].quantity, 2.0);
    }

    #[tokio::test]
    async fn test_resume_held_projection() {
        let db = setup().await;
        let product = seed_product(&db, "SUGAR-KG", 220, 30.0).await;

        let held = db
            .billing()
            .hold_bill(&hold_input(None, vec![line(product.id, 5.0, 220)]))
            .await
            .unwrap();

        let resumed = db.billing().resume_held(held.id).await.unwrap();
        assert_eq!(resumed.bill.id, held.id);
        assert_eq!(resumed.items.len(), 1);

        // resume is read-only: the held bill is still there
        assert_eq!(db.billing().list_held().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resume_rejects_completed_bill() {
        let db = setup().await;
        let product = seed_product(&db, "SALT-KG", 80, 10.0).await;

        let sale = db
            .billing()
            .create_sale(&cash_sale(vec![line(product.id, 1.0, 80)], 80))
            .await
            .unwrap();

        let err = db.billing().resume_held(sale.id).await.unwrap_err();
        assert!(matches!(err, EngineError::Db(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete_held_is_explicit_about_missing_targets() {
        let db = setup().await;
        let product = seed_product(&db, "GHEE-1KG", 900, 10.0).await;

        let held = db
            .billing()
            .hold_bill(&hold_input(None, vec![line(product.id, 1.0, 900)]))
            .await
            .unwrap();

        db.billing().delete_held(held.id).await.unwrap();
        assert!(db.billing().list_held().await.unwrap().is_empty());

        // deleting again reports NotFound instead of silently no-opping
        let err = db.billing().delete_held(held.id).await.unwrap_err();
        assert!(matches!(err, EngineError::Db(DbError::NotFound { .. })));

        // a completed bill is not a valid target either
        let sale = db
            .billing()
            .create_sale(&cash_sale(vec![line(product.id, 1.0, 900)], 900))
            .await
            .unwrap();
        let err = db.billing().delete_held(sale.id).await.unwrap_err();
        assert!(matches!(err, EngineError::Db(DbError::NotFound { .. })));
    }

    // -------------------------------------------------------------------------
    // Refunds
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_refund_restores_stock_with_return_movements() {
        let db = setup().await;
        let product = seed_product(&db, "FAN-12", 3_500, 6.0).await;

        let sale = db
            .billing()
            .create_sale(&cash_sale(vec![line(product.id, 2.0, 3_500)], 7_000))
            .await
            .unwrap();
        assert_eq!(
            db.products().get_by_id(product.id).await.unwrap().unwrap().current_stock,
            4.0
        );

        let refunded = db.billing().refund_sale(sale.id, 1).await.unwrap();
        assert_eq!(refunded.status, BillStatus::Refunded);

        let fresh = db.products().get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(fresh.current_stock, 6.0);

        let movements = db.products().movements(product.id, 10).await.unwrap();
        assert_eq!(movements.len(), 2);
        assert_eq!(movements[0].movement_type, MovementType::Return);
        assert_eq!(movements[0].quantity, 2.0);

        // a refunded bill cannot be refunded twice
        let err = db.billing().refund_sale(sale.id, 1).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Domain(CoreError::InvalidBillStatus { .. })
        ));
    }

    // -------------------------------------------------------------------------
    // Read projections
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_bills_for_customer_caps_at_five() {
        let db = setup().await;
        let product = seed_product(&db, "PEN-BLUE", 50, 100.0).await;
        let customer = seed_customer(&db, 0).await;

        for _ in 0..7 {
            let mut input = cash_sale(vec![line(product.id, 1.0, 50)], 50);
            input.customer_id = Some(customer.id);
            db.billing().create_sale(&input).await.unwrap();
        }

        let recent = db.billing().bills_for_customer(customer.id).await.unwrap();
        assert_eq!(recent.len(), 5);
        for bill in &recent {
            assert_eq!(bill.items.len(), 1);
        }
        // newest first
        assert!(recent[0].bill.id > recent[4].bill.id);
    }

    #[tokio::test]
    async fn test_list_bills_date_range_inclusive() {
        let db = setup().await;
        let product = seed_product(&db, "NOTE-A5", 120, 50.0).await;

        let sale = db
            .billing()
            .create_sale(&cash_sale(vec![line(product.id, 1.0, 120)], 120))
            .await
            .unwrap();

        let all = db.billing().list_bills(&BillFilter::default()).await.unwrap();
        assert_eq!(all.len(), 1);

        let inclusive = BillFilter {
            start_date: Some(sale.created_at),
            end_date: Some(sale.created_at),
        };
        assert_eq!(db.billing().list_bills(&inclusive).await.unwrap().len(), 1);

        let future = BillFilter {
            start_date: Some(sale.created_at + chrono::Duration::days(1)),
            end_date: None,
        };
        assert!(db.billing().list_bills(&future).await.unwrap().is_empty());
    }

    // -------------------------------------------------------------------------
    // Concurrency
    // -------------------------------------------------------------------------

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_sales_cannot_double_sell_last_unit() {
        let db = setup_file().await;
        let product = seed_product(&db, "LAST-ONE", 5_000, 1.0).await;

        let input = cash_sale(vec![line(product.id, 1.0, 5_000)], 5_000);
        let engine_a = db.billing();
        let engine_b = db.billing();

        let (first, second) = tokio::join!(
            engine_a.create_sale(&input),
            engine_b.create_sale(&input)
        );

        let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1, "exactly one sale of the last unit may succeed");

        let fresh = db.products().get_by_id(product.id).await.unwrap().unwrap();
        assert_eq!(fresh.current_stock, 0.0);

        // the audit trail shows exactly one sale movement
        let movements = db.products().movements(product.id, 10).await.unwrap();
        assert_eq!(movements.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_bill_numbers_are_unique() {
        let db = setup_file().await;
        let product = seed_product(&db, "BUSY-SKU", 100, 1_000.0).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let engine = db.billing();
            let input = cash_sale(vec![line(product.id, 1.0, 100)], 100);
            handles.push(tokio::spawn(async move {
                engine.create_sale(&input).await
            }));
        }

        let mut numbers = std::collections::HashSet::new();
        for handle in handles {
            let sale = handle.await.unwrap().unwrap();
            assert!(sale.bill_number.starts_with("INV-"));
            assert!(
                numbers.insert(sale.bill_number.clone()),
                "duplicate bill number {}",
                sale.bill_number
            );
        }
        assert_eq!(numbers.len(), 8);
    }
}
