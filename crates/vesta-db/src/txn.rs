//! # Write Transactions
//!
//! Helpers for the unit-of-work pattern every multi-row mutation uses.
//!
//! ## Why BEGIN IMMEDIATE
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Two sales of the same product, DEFERRED transactions:            │
//! │                                                                   │
//! │   T1: BEGIN ── read stock=1 ── write stock=0 ── COMMIT            │
//! │   T2: BEGIN ── read stock=1 ──── write ✗ (stale snapshot)         │
//! │                                                                   │
//! │  With IMMEDIATE, the write lock is taken up front, so units of    │
//! │  work serialize instead of racing a deferred lock upgrade:        │
//! │                                                                   │
//! │   T1: BEGIN IMMEDIATE ── read ── write ── COMMIT                  │
//! │   T2:        (waits) ── BEGIN IMMEDIATE ── read stock=0 ── ...    │
//! │                                                                   │
//! │  T2 now reads committed state: previous/new stock snapshots are   │
//! │  never computed from stale reads, and the last unit of a product  │
//! │  cannot be double-sold.                                           │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage Discipline
//! Between `begin_immediate` and `commit`/`rollback` there must be no
//! early return: run the body as a fallible inner call and match on its
//! result so every failure path rolls back.
//!
//! ```rust,ignore
//! let mut conn = txn::begin_immediate(self.pool()).await?;
//! let result = self.do_work(&mut conn, input).await;
//! match result {
//!     Ok(value) => {
//!         txn::commit(&mut conn).await?;
//!         Ok(value)
//!     }
//!     Err(e) => {
//!         txn::rollback(&mut conn).await;
//!         Err(e)
//!     }
//! }
//! ```

use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use tracing::warn;

use crate::error::DbResult;

/// Acquires a connection and opens a write transaction.
///
/// BEGIN IMMEDIATE acquires the write lock upfront, preventing deadlocks
/// when concurrent DEFERRED transactions race to upgrade from shared to
/// exclusive. Lock waits are bounded by the connection's busy timeout.
pub(crate) async fn begin_immediate(pool: &SqlitePool) -> DbResult<PoolConnection<Sqlite>> {
    let mut conn = pool.acquire().await?;
    sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
    Ok(conn)
}

/// Commits the open transaction.
pub(crate) async fn commit(conn: &mut SqliteConnection) -> DbResult<()> {
    sqlx::query("COMMIT").execute(&mut *conn).await?;
    Ok(())
}

/// Rolls back the open transaction, best effort.
///
/// The original error is what the caller surfaces; a rollback failure on
/// an already-broken connection is only worth a warning.
pub(crate) async fn rollback(conn: &mut SqliteConnection) {
    if let Err(e) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
        warn!(error = %e, "rollback failed");
    }
}
