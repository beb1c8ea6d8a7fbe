//! # Validation Module
//!
//! Input validation utilities for Vesta POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                            │
//! │                                                                   │
//! │  Layer 1: Caller (UI / bridge)                                    │
//! │  ├── Basic format checks (empty, length)                          │
//! │  └── Immediate user feedback                                      │
//! │           │                                                       │
//! │           ▼                                                       │
//! │  Layer 2: THIS MODULE via the input payloads' validate()          │
//! │  └── Structural rules, before any persistence attempt             │
//! │           │                                                       │
//! │           ▼                                                       │
//! │  Layer 3: Database (SQLite)                                       │
//! │  ├── NOT NULL constraints                                         │
//! │  ├── UNIQUE constraints (sku, barcode, bill_number)               │
//! │  └── Foreign key constraints                                      │
//! │                                                                   │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Business rules that need live data (stock floors, credit limits) are
//! the billing engine's job, not this module's.

use crate::error::ValidationError;
use crate::{MAX_BILL_ITEMS, MAX_ITEM_QUANTITY, MAX_NOTES_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be finite and positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
///
/// Fractional quantities are legal: weighed goods sell as 0.75 kg.
pub fn validate_quantity(qty: f64) -> ValidationResult<()> {
    if !qty.is_finite() || qty <= 0.0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 0,
            max: MAX_ITEM_QUANTITY as i64,
        });
    }

    Ok(())
}

/// Validates a stock adjustment delta.
///
/// Unlike sale quantities a delta may be negative (shrinkage, corrections),
/// but zero is meaningless and rejected.
pub fn validate_stock_delta(delta: f64) -> ValidationResult<()> {
    if !delta.is_finite() || delta == 0.0 {
        return Err(ValidationError::InvalidFormat {
            field: "delta".to_string(),
            reason: "must be a non-zero finite number".to_string(),
        });
    }

    Ok(())
}

/// Validates a cent amount that must not be negative (prices, tax,
/// discounts, tendered amounts). Zero is allowed.
pub fn validate_cents_non_negative(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a cent amount that must be strictly positive (credit
/// payments).
pub fn validate_cents_positive(field: &str, cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a percentage discount expressed in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_discount_bps(bps: i64) -> ValidationResult<()> {
    if !(0..=10_000).contains(&bps) {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

/// Validates a caller-supplied user identity.
pub fn validate_user_id(user_id: i64) -> ValidationResult<()> {
    if user_id <= 0 {
        return Err(ValidationError::Required {
            field: "user_id".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection / String Validators
// =============================================================================

/// Validates the line items of a sale or held bill.
///
/// ## Rules
/// - At least one line
/// - At most MAX_BILL_ITEMS lines
pub fn validate_line_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if count > MAX_BILL_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_BILL_ITEMS as i64,
        });
    }

    Ok(())
}

/// Validates free-text notes.
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<()> {
    if let Some(notes) = notes {
        if notes.len() > MAX_NOTES_LEN {
            return Err(ValidationError::TooLong {
                field: "notes".to_string(),
                max: MAX_NOTES_LEN,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
