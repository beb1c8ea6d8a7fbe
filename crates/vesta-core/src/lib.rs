//! # vesta-core: Pure Business Logic for Vesta POS
//!
//! This crate is the **heart** of Vesta POS. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                      Vesta POS Architecture                       │
//! │                                                                   │
//! │  ┌─────────────────────────────────────────────────────────────┐  │
//! │  │                    UI / IPC bridge (external)               │  │
//! │  └──────────────────────────────┬──────────────────────────────┘  │
//! │                                 │                                 │
//! │  ┌──────────────────────────────▼──────────────────────────────┐  │
//! │  │                    vesta-api (contract)                     │  │
//! │  │   create_sale, hold_bill, record_credit_payment, ...        │  │
//! │  └──────────────────────────────┬──────────────────────────────┘  │
//! │                                 │                                 │
//! │  ┌──────────────────────────────▼──────────────────────────────┐  │
//! │  │              ★ vesta-core (THIS CRATE) ★                    │  │
//! │  │                                                             │  │
//! │  │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌───────┐ │  │
//! │  │  │  types  │ │  money  │ │ totals  │ │ inputs  │ │ valid │ │  │
//! │  │  │  Bill   │ │  Money  │ │ bill    │ │ payload │ │ ation │ │  │
//! │  │  │ Product │ │  cents  │ │ math    │ │ structs │ │ rules │ │  │
//! │  │  └─────────┘ └─────────┘ └─────────┘ └─────────┘ └───────┘ │  │
//! │  │                                                             │  │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS        │  │
//! │  └──────────────────────────────┬──────────────────────────────┘  │
//! │                                 │                                 │
//! │  ┌──────────────────────────────▼──────────────────────────────┐  │
//! │  │                  vesta-db (Database Layer)                  │  │
//! │  │        SQLite ledgers, billing engine, migrations           │  │
//! │  └─────────────────────────────────────────────────────────────┘  │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Bill, Customer, StockMovement, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`totals`] - Bill totals, change, and loyalty math
//! - [`inputs`] - Typed operation payloads with validation
//! - [`error`] - Domain error types
//! - [`validation`] - Structural input validation rules
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod inputs;
pub mod money;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use vesta_core::Money` instead of
// `use vesta_core::money::Money`

pub use error::{CoreError, CoreResult, ValidationError};
pub use inputs::*;
pub use money::Money;
pub use totals::{compute_bill_totals, BillTotals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Cents of sale total per loyalty point: 1 point per 100 currency units.
pub const LOYALTY_CENTS_PER_POINT: i64 = 10_000;

/// Maximum lines allowed on a single bill.
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable transaction sizes.
pub const MAX_BILL_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g. typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: f64 = 9_999.0;

/// Maximum length of free-text notes on bills, payments, and adjustments.
pub const MAX_NOTES_LEN: usize = 500;
