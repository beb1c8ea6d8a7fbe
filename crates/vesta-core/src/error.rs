//! # Error Types
//!
//! Domain-specific error types for vesta-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                         Error Types                               │
//! │                                                                   │
//! │  vesta-core errors (this file)                                    │
//! │  ├── CoreError        - Business rule violations                  │
//! │  └── ValidationError  - Input validation failures                 │
//! │                                                                   │
//! │  vesta-db errors (separate crate)                                 │
//! │  ├── DbError          - Database operation failures               │
//! │  └── EngineError      - CoreError | DbError from the engines      │
//! │                                                                   │
//! │  vesta-api errors                                                 │
//! │  └── ApiError         - What the caller sees (serialized)         │
//! │                                                                   │
//! │  Flow: ValidationError → CoreError → EngineError → ApiError       │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, id, amounts)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. They are raised before
/// or during a unit of work; either way the caller observes no partial
/// effects.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Insufficient stock to complete a sale.
    ///
    /// Raised when a product tracks stock strictly
    /// (`allow_negative_stock = false`) and the requested quantity exceeds
    /// what is on hand.
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: f64,
        requested: f64,
    },

    /// Extending credit would push the customer past their limit.
    #[error(
        "Credit limit exceeded for customer {customer_id}: \
         limit {limit_cents}, outstanding {outstanding_cents}, requested {requested_cents}"
    )]
    CreditLimitExceeded {
        customer_id: i64,
        limit_cents: i64,
        outstanding_cents: i64,
        requested_cents: i64,
    },

    /// A credit amount was supplied without an identified customer.
    /// Walk-in sales cannot be booked against store credit.
    #[error("Credit sales require an identified customer")]
    CreditRequiresCustomer,

    /// Payment amount is invalid (underpaid sale, overpaid credit balance).
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// Bill is not in a state that allows the requested operation.
    ///
    /// ## When This Occurs
    /// - Refunding a held or already refunded bill
    /// - Resuming a bill that is not held
    #[error("Bill {bill_id} is {current_status}, cannot perform operation")]
    InvalidBillStatus {
        bill_id: i64,
        current_status: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when a request payload doesn't meet requirements. Raised
/// before any persistence attempt.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g. bad discount basis points).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
