//! # Operation Input Payloads
//!
//! Typed request payloads for every mutating operation the engines expose.
//! One struct per operation with a validated field set - no open-ended
//! property bags. Each payload carries a `validate()` that runs before any
//! persistence attempt.
//!
//! Serialized with camelCase names, matching what a frontend sends over the
//! IPC bridge.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{DiscountType, MovementType, PaymentMethod};
use crate::validation::{
    validate_cents_non_negative, validate_cents_positive, validate_discount_bps,
    validate_line_count, validate_notes, validate_quantity, validate_stock_delta,
    validate_user_id,
};

// =============================================================================
// Sale Lines
// =============================================================================

/// One line of a sale or held bill.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLine {
    pub product_id: i64,
    /// Units sold; fractional for weighed goods.
    pub quantity: f64,
    /// Unit price the cashier charged (may differ from catalog price).
    pub unit_price_cents: i64,
    /// Line-level discount amount.
    #[serde(default)]
    pub discount_cents: i64,
}

impl SaleLine {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_quantity(self.quantity)?;
        validate_cents_non_negative("unitPrice", self.unit_price_cents)?;
        validate_cents_non_negative("discount", self.discount_cents)?;
        Ok(())
    }
}

// =============================================================================
// Create Sale
// =============================================================================

/// Payload for creating a completed sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSaleInput {
    /// None for walk-in customers.
    pub customer_id: Option<i64>,
    /// The cashier performing the sale (caller-supplied identity).
    pub user_id: i64,
    pub items: Vec<SaleLine>,
    /// Bill-level discount: cents when `discount_type` is Amount, basis
    /// points when Percentage.
    #[serde(default)]
    pub discount: i64,
    #[serde(default)]
    pub discount_type: DiscountType,
    /// Tax amount in cents.
    #[serde(default)]
    pub tax_cents: i64,
    pub payment_method: PaymentMethod,
    /// Amount tendered by the customer.
    pub paid_cents: i64,
    /// Portion of the total booked against store credit.
    #[serde(default)]
    pub credit_cents: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateSaleInput {
    /// Structural validation; rejected before any persistence attempt.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_user_id(self.user_id)?;
        validate_line_count(self.items.len())?;
        for item in &self.items {
            item.validate()?;
        }
        match self.discount_type {
            DiscountType::Amount => validate_cents_non_negative("discount", self.discount)?,
            DiscountType::Percentage => validate_discount_bps(self.discount)?,
        }
        validate_cents_non_negative("tax", self.tax_cents)?;
        validate_cents_non_negative("paidAmount", self.paid_cents)?;
        validate_cents_non_negative("creditAmount", self.credit_cents)?;
        validate_notes(self.notes.as_deref())?;
        Ok(())
    }
}

// =============================================================================
// Hold Bill
// =============================================================================

/// Payload for suspending a draft sale.
///
/// Same shape as [`CreateSaleInput`] minus the payment fields: a held bill
/// has no payment and touches no stock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldBillInput {
    pub customer_id: Option<i64>,
    pub user_id: i64,
    pub items: Vec<SaleLine>,
    #[serde(default)]
    pub discount: i64,
    #[serde(default)]
    pub discount_type: DiscountType,
    #[serde(default)]
    pub tax_cents: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl HoldBillInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_user_id(self.user_id)?;
        validate_line_count(self.items.len())?;
        for item in &self.items {
            item.validate()?;
        }
        match self.discount_type {
            DiscountType::Amount => validate_cents_non_negative("discount", self.discount)?,
            DiscountType::Percentage => validate_discount_bps(self.discount)?,
        }
        validate_cents_non_negative("tax", self.tax_cents)?;
        validate_notes(self.notes.as_deref())?;
        Ok(())
    }
}

// =============================================================================
// Credit Payment
// =============================================================================

/// Payload for recording a payment against a customer's credit balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentInput {
    pub customer_id: i64,
    /// The bill being paid down, or None for a general payment.
    #[serde(default)]
    pub bill_id: Option<i64>,
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub user_id: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl RecordPaymentInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_user_id(self.user_id)?;
        validate_cents_positive("amount", self.amount_cents)?;
        validate_notes(self.notes.as_deref())?;
        Ok(())
    }
}

// =============================================================================
// Stock Adjustment
// =============================================================================

/// Payload for a manual or purchase-driven stock adjustment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockInput {
    pub product_id: i64,
    /// Signed delta: positive for purchase/return, negative for shrinkage.
    pub delta: f64,
    pub movement_type: MovementType,
    pub user_id: i64,
    /// The purchase or bill that caused the change, when there is one.
    #[serde(default)]
    pub reference_id: Option<i64>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl AdjustStockInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_user_id(self.user_id)?;
        validate_stock_delta(self.delta)?;
        validate_notes(self.reason.as_deref())?;
        Ok(())
    }
}

// =============================================================================
// Catalog Management
// =============================================================================

/// Payload for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub sku: String,
    #[serde(default)]
    pub barcode: Option<String>,
    pub name: String,
    pub selling_price_cents: i64,
    #[serde(default)]
    pub cost_price_cents: Option<i64>,
    /// Opening stock level; subsequent changes go through the ledger.
    #[serde(default)]
    pub current_stock: f64,
    #[serde(default)]
    pub reorder_level: f64,
    #[serde(default)]
    pub allow_negative_stock: bool,
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.sku.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "sku".to_string(),
            });
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "name".to_string(),
            });
        }
        validate_cents_non_negative("sellingPrice", self.selling_price_cents)?;
        if let Some(cost) = self.cost_price_cents {
            validate_cents_non_negative("costPrice", cost)?;
        }
        Ok(())
    }
}

/// Payload for creating a customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub credit_limit_cents: i64,
}

impl NewCustomer {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "name".to_string(),
            });
        }
        validate_cents_non_negative("creditLimit", self.credit_limit_cents)?;
        Ok(())
    }
}

// =============================================================================
// Bill Queries
// =============================================================================

/// Optional inclusive date range filter for listing bills.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillFilter {
    #[serde(default)]
    pub start_date: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub end_date: Option<chrono::DateTime<chrono::Utc>>,
}

// =============================================================================
// Unit Tests
// =============================================================================
