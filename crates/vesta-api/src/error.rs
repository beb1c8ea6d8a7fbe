//! # API Error Type
//!
//! Unified error type for bridge operations.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Vesta POS                        │
//! │                                                                   │
//! │  Frontend                    Rust Backend                         │
//! │  ────────                    ────────────                         │
//! │                                                                   │
//! │  invoke('create_sale')                                            │
//! │         │                                                         │
//! │         ▼                                                         │
//! │  ┌─────────────────────────────────────────────────────────────┐  │
//! │  │  Operation                                                  │  │
//! │  │  Result<T, ApiError>                                        │  │
//! │  │         │                                                   │  │
//! │  │         ▼                                                   │  │
//! │  │  EngineError? ── Domain | Db ──────────► ApiError ─────────►│  │
//! │  │         │                                                   │  │
//! │  │         ▼                                                   │  │
//! │  │  Success ──────────────────────────────────────────────────►│  │
//! │  └─────────────────────────────────────────────────────────────┘  │
//! │                                                                   │
//! │  try {                                                            │
//! │    await invoke('create_sale')                                    │
//! │  } catch (e) {                                                    │
//! │    // e.message = "Insufficient stock for COKE-330: ..."          │
//! │    // e.code = "INSUFFICIENT_STOCK"                               │
//! │  }                                                                │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There is no partial-success shape: an operation either returns its data
//! or this envelope with a human-readable message.

use serde::Serialize;
use vesta_core::CoreError;
use vesta_db::{DbError, EngineError};

/// API error returned from bridge operations.
///
/// ## Serialization
/// This is what the frontend receives when an operation fails:
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Product not found: 42"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Unique-constraint conflict (duplicate SKU, barcode, bill number)
    Conflict,

    /// A multi-step unit of work failed and was rolled back
    TransactionError,

    /// Database operation failed
    DatabaseError,

    /// Business rule violation
    BusinessLogic,

    /// Insufficient stock for a sale
    InsufficientStock,

    /// Payment amount/coverage error
    PaymentError,

    /// Internal error
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id.to_string()),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(
                    ErrorCode::TransactionError,
                    "Transaction failed and was rolled back",
                )
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match &err {
            CoreError::InsufficientStock { .. } => {
                ApiError::new(ErrorCode::InsufficientStock, err.to_string())
            }
            CoreError::CreditLimitExceeded { .. } | CoreError::CreditRequiresCustomer => {
                ApiError::new(ErrorCode::BusinessLogic, err.to_string())
            }
            CoreError::InvalidPaymentAmount { .. } => {
                ApiError::new(ErrorCode::PaymentError, err.to_string())
            }
            CoreError::InvalidBillStatus { .. } => {
                ApiError::new(ErrorCode::BusinessLogic, err.to_string())
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

/// Converts engine errors to API errors.
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Domain(e) => e.into(),
            EngineError::Db(e) => e.into(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Unit Tests
// =============================================================================
