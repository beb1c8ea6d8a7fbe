//! # Domain Types
//!
//! Core domain types used throughout Vesta POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                              │
//! │                                                                   │
//! │  ┌───────────────┐   ┌───────────────┐   ┌────────────────────┐  │
//! │  │    Product    │   │     Bill      │   │   StockMovement    │  │
//! │  │  ───────────  │   │  ───────────  │   │  ────────────────  │  │
//! │  │  sku (unique) │   │  bill_number  │   │  previous_stock    │  │
//! │  │  current_stock│   │  status       │   │  quantity (delta)  │  │
//! │  │  reorder_level│   │  total_cents  │   │  new_stock         │  │
//! │  └───────────────┘   └───────────────┘   └────────────────────┘  │
//! │                                                                   │
//! │  ┌───────────────┐   ┌───────────────┐   ┌────────────────────┐  │
//! │  │   Customer    │   │   BillItem    │   │   CreditPayment    │  │
//! │  │  ───────────  │   │  ───────────  │   │  ────────────────  │  │
//! │  │  credit_limit │   │  product_name │   │  amount_cents      │  │
//! │  │  credit owed  │   │   (snapshot)  │   │  payment_method    │  │
//! │  │  loyalty pts  │   │  subtotal     │   │  bill_id (opt)     │  │
//! │  └───────────────┘   └───────────────┘   └────────────────────┘  │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are keyed by auto-incrementing `i64` ids; business identifiers
//! (sku, bill_number) carry their own UNIQUE constraints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Enums
// =============================================================================

/// The status of a bill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    /// Sale has been paid and finalized.
    Completed,
    /// Draft sale suspended without payment or stock impact.
    Held,
    /// Completed sale fully reversed.
    Refunded,
    /// Completed sale partially reversed.
    PartialRefund,
}

impl Default for BillStatus {
    fn default() -> Self {
        BillStatus::Completed
    }
}

/// How a bill was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    Card,
    /// Sale booked against the customer's store credit.
    Credit,
    /// Mixed tender (e.g. part cash, part credit).
    Split,
}

/// How the bill-level discount input is expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// Fixed amount in cents.
    Amount,
    /// Percentage of the subtotal, given in basis points (1000 = 10%).
    ///
    /// Resolved to a cent amount before the bill is stored; the stored
    /// `discount_cents` is always an amount.
    Percentage,
}

impl Default for DiscountType {
    fn default() -> Self {
        DiscountType::Amount
    }
}

/// The cause of a stock level change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Stock left the store through a sale.
    Sale,
    /// Stock came back through a refund.
    Return,
    /// Manual correction (stocktake, shrinkage).
    Adjustment,
    /// Stock received from a supplier.
    Purchase,
    /// Stock moved between locations.
    Transfer,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Row id.
    pub id: i64,

    /// Stock Keeping Unit - business identifier, unique.
    pub sku: String,

    /// Barcode (EAN-13, UPC-A, etc.), unique when present.
    pub barcode: Option<String>,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Selling price in cents.
    pub selling_price_cents: i64,

    /// Cost in cents (for margin calculations).
    pub cost_price_cents: Option<i64>,

    /// Current stock level. Fractional for weighed goods (kg), signed
    /// because oversell can be permitted per product.
    pub current_stock: f64,

    /// Stock level at or below which the product is considered low.
    pub reorder_level: f64,

    /// Allow selling when stock is zero or would go negative.
    pub allow_negative_stock: bool,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the selling price as a Money type.
    #[inline]
    pub fn selling_price(&self) -> Money {
        Money::from_cents(self.selling_price_cents)
    }

    /// Checks if the requested quantity can be sold.
    ///
    /// A product with `allow_negative_stock` can always be sold; otherwise
    /// the current stock must cover the quantity.
    pub fn can_sell(&self, quantity: f64) -> bool {
        if self.allow_negative_stock {
            return true;
        }
        self.current_stock >= quantity
    }

    /// Checks if the product is at or below its reorder level.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.reorder_level
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// An immutable audit record of a change to a product's stock quantity.
///
/// Append-only: created once, never mutated or deleted. The invariant
/// `new_stock = previous_stock + quantity` holds exactly, and
/// `previous_stock` equals the product's stock immediately before the
/// append (movements are totally ordered per product).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: i64,
    pub product_id: i64,
    pub movement_type: MovementType,
    /// Signed delta: negative for sales, positive for purchases/returns.
    pub quantity: f64,
    pub previous_stock: f64,
    pub new_stock: f64,
    /// The cashier or manager who caused the change (caller-supplied).
    pub user_id: i64,
    /// The bill or purchase that caused the movement, when there is one.
    pub reference_id: Option<i64>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Bill
// =============================================================================

/// The record of one sale transaction, completed or held.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Bill {
    pub id: i64,
    /// Unique business identifier, `INV-YYYYMMDD-NNNN`.
    pub bill_number: String,
    /// None for walk-in customers.
    pub customer_id: Option<i64>,
    /// The cashier (caller-supplied identity).
    pub user_id: i64,
    pub subtotal_cents: i64,
    /// Discount resolved to an amount before storage.
    pub discount_cents: i64,
    pub discount_type: DiscountType,
    pub tax_cents: i64,
    /// `subtotal - discount + tax`.
    pub total_cents: i64,
    /// None while the bill is held; settled bills always carry one.
    pub payment_method: Option<PaymentMethod>,
    pub paid_cents: i64,
    pub change_cents: i64,
    /// Portion of the total booked against the customer's store credit.
    pub credit_cents: i64,
    pub status: BillStatus,
    pub is_held: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Bill {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Bill Item
// =============================================================================

/// A line item in a bill.
/// Uses the snapshot pattern to freeze the product name at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BillItem {
    pub id: i64,
    pub bill_id: i64,
    pub product_id: i64,
    /// Product name at time of sale (immune to later renames).
    pub product_name: String,
    /// Quantity sold. Fractional for weighed goods.
    pub quantity: f64,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Discount applied to this line.
    pub discount_cents: i64,
    /// `round(quantity × unit_price) − discount`.
    pub subtotal_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl BillItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Returns the line subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// A bill together with its line items, for projections that need both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillWithItems {
    #[serde(flatten)]
    pub bill: Bill,
    pub items: Vec<BillItem>,
}

// =============================================================================
// Customer
// =============================================================================

/// A known customer with store credit and loyalty balances.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    /// Maximum credit the store will extend.
    pub credit_limit_cents: i64,
    /// Amount currently owed by the customer.
    pub current_credit_cents: i64,
    /// 1 point per 100 currency units of sale total, identified sales only.
    pub loyalty_points: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Returns the outstanding credit as Money.
    #[inline]
    pub fn current_credit(&self) -> Money {
        Money::from_cents(self.current_credit_cents)
    }

    /// Credit still available under the limit.
    #[inline]
    pub fn available_credit_cents(&self) -> i64 {
        self.credit_limit_cents - self.current_credit_cents
    }
}

// =============================================================================
// Credit Payment
// =============================================================================

/// A payment made against a customer's outstanding credit.
/// Immutable; its creation decrements the customer's balance atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CreditPayment {
    pub id: i64,
    pub customer_id: i64,
    /// The bill being paid down, or None for a general payment.
    pub bill_id: Option<i64>,
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub user_id: i64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Read-only aggregate used to reconcile a customer's credit position.
///
/// The invariant a healthy store satisfies:
/// `customer.current_credit == Σ bill.credit − Σ payment.amount`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditSummary {
    pub customer: Customer,
    pub bills: Vec<Bill>,
    pub payments: Vec<CreditPayment>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: f64, allow_negative: bool) -> Product {
        Product {
            id: 1,
            sku: "RICE-1KG".to_string(),
            barcode: None,
            name: "Basmati Rice".to_string(),
            selling_price_cents: 399,
            cost_price_cents: Some(250),
            current_stock: stock,
            reorder_level: 5.0,
            allow_negative_stock: allow_negative,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_can_sell_respects_stock() {
        let p = product(3.0, false);
        assert!(p.can_sell(3.0));
        assert!(!p.can_sell(3.5));
    }

    #[test]
    fn test_can_sell_with_oversell_flag() {
        let p = product(0.0, true);
        assert!(p.can_sell(10.0));
    }

    #[test]
    fn test_low_stock() {
        assert!(product(5.0, false).is_low_stock());
        assert!(product(2.0, false).is_low_stock());
        assert!(!product(5.5, false).is_low_stock());
    }

    #[test]
    fn test_status_serde_names() {
        let s = serde_json::to_string(&BillStatus::PartialRefund).unwrap();
        assert_eq!(s, "\"partial_refund\"");
        let m = serde_json::to_string(&MovementType::Sale).unwrap();
        assert_eq!(m, "\"sale\"");
    }
}
