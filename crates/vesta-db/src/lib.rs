//! # vesta-db: Database Layer for Vesta POS
//!
//! This crate provides database access for the Vesta POS system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Vesta POS Data Flow                        │
//! │                                                                   │
//! │  Bridge operation (create_sale, adjust_stock, ...)                │
//! │       │                                                           │
//! │       ▼                                                           │
//! │  ┌─────────────────────────────────────────────────────────────┐  │
//! │  │                     vesta-db (THIS CRATE)                   │  │
//! │  │                                                             │  │
//! │  │   ┌─────────────┐  ┌──────────────┐  ┌──────────────────┐  │  │
//! │  │   │  Database   │  │ Repositories │  │  BillingEngine   │  │  │
//! │  │   │  (pool.rs)  │  │  product     │  │  create_sale     │  │  │
//! │  │   │             │  │  customer    │  │  hold/resume     │  │  │
//! │  │   │ SqlitePool  │◄─│  bill        │  │  refund          │  │  │
//! │  │   │ WAL + FK    │  │  payments    │  │  (txn.rs UoW)    │  │  │
//! │  │   └─────────────┘  └──────────────┘  └──────────────────┘  │  │
//! │  │                                                             │  │
//! │  └─────────────────────────────────────────────────────────────┘  │
//! │       │                                                           │
//! │       ▼                                                           │
//! │  SQLite database file (WAL mode)                                  │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and engine error types
//! - [`txn`] - BEGIN IMMEDIATE unit-of-work helpers
//! - [`repository`] - Ledger repositories (product, customer, bill, payments)
//! - [`billing`] - The billing engine (sales, held bills, refunds)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use vesta_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/vesta.db")).await?;
//!
//! let sale = db.billing().create_sale(&input).await?;
//! let low = db.products().get_low_stock().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod billing;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
mod txn;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, EngineError};
pub use pool::{Database, DbConfig};

// Repository/engine re-exports for convenience
pub use billing::BillingEngine;
pub use repository::bill::BillRepository;
pub use repository::credit_payment::CreditPaymentProcessor;
pub use repository::customer::CustomerRepository;
pub use repository::product::ProductRepository;
