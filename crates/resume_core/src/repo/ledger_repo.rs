//! Ledger unit-of-work contracts and SQLite implementation.
//!
//! # Responsibility
//! - Begin/commit/rollback a unit of work against the store.
//! - Fetch the owning user and bulk-insert a transaction batch.
//!
//! # Invariants
//! - `insert_batch` issues one statement and verifies the affected-row
//!   count against the batch length.
//! - Dropping an unfinished `SqliteUnitOfWork` rolls it back.
//! - Context-taking calls observe cancellation before touching the store and
//!   again once the statement returns.

use crate::context::{Cancelled, RequestContext};
use crate::db::{DbError, DbResult};
use crate::model::transaction::{TransactionBatch, UserId};
use crate::model::user::User;
use log::{info, warn};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Transaction, TransactionBehavior};
use thiserror::Error;

const USER_SELECT_SQL: &str = "SELECT id, name, email FROM users WHERE id = ?1;";
const TRANSACTION_INSERT_SQL: &str =
    "INSERT INTO transactions (user_id, amount, date_created) VALUES";
const TRANSACTION_ROW_SQL: &str = "(?, ?, ?)";

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of one gateway operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("error starting store transaction: {0}")]
    TransactionStart(#[source] DbError),
    #[error("error scanning user by id {user_id} due to: {source}")]
    UserLookup {
        user_id: UserId,
        #[source]
        source: DbError,
    },
    #[error("error inserting transactions due to: {0}")]
    Insert(#[source] DbError),
    #[error("total affected rows ({actual}) mismatch with total transactions ({expected})")]
    RowCountMismatch { expected: usize, actual: usize },
    #[error("error committing store transaction: {0}")]
    Commit(#[source] DbError),
    #[error("error rolling back store transaction: {0}")]
    Rollback(#[source] DbError),
    #[error("store call aborted due to: {0}")]
    Cancelled(#[from] Cancelled),
}

/// Opens units of work against a transactional store.
pub trait LedgerStore {
    type Unit: UnitOfWork;

    /// Opens a new transactional context.
    fn begin(&self, ctx: &RequestContext) -> StoreResult<Self::Unit>;
}

/// One open transactional context, exclusively owned by its caller.
pub trait UnitOfWork {
    /// Loads exactly one user row.
    fn fetch_user(&mut self, ctx: &RequestContext, user_id: UserId) -> StoreResult<User>;
    /// Inserts every record of `batch` for `batch.user_id()`; no-op when empty.
    fn insert_batch(&mut self, ctx: &RequestContext, batch: &TransactionBatch)
        -> StoreResult<()>;
    fn commit(self) -> StoreResult<()>;
    fn rollback(self) -> StoreResult<()>;
}

/// Terminates `unit` according to `outcome`.
///
/// - `Err(cause)`: rolls back and returns `cause` unchanged. A failing
///   rollback is logged and dropped.
/// - `Ok(())`: commits and returns the commit outcome.
pub fn finish<U, E>(unit: U, outcome: Result<(), E>) -> Result<(), E>
where
    U: UnitOfWork,
    E: From<StoreError>,
{
    match outcome {
        Ok(()) => {
            unit.commit().map_err(E::from)?;
            info!("event=uow_commit module=repo status=ok");
            Ok(())
        }
        Err(cause) => {
            match unit.rollback() {
                Ok(()) => info!("event=uow_rollback module=repo status=ok"),
                Err(rollback_err) => {
                    warn!("event=uow_rollback module=repo status=error error={rollback_err}")
                }
            }
            Err(cause)
        }
    }
}

/// SQLite-backed ledger store.
pub struct SqliteLedgerStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteLedgerStore<'conn> {
    /// Wraps a migrated connection (see `db::open_db`).
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl<'conn> LedgerStore for SqliteLedgerStore<'conn> {
    type Unit = SqliteUnitOfWork<'conn>;

    fn begin(&self, ctx: &RequestContext) -> StoreResult<Self::Unit> {
        ctx.check()?;
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(|err| StoreError::TransactionStart(err.into()))?;
        // a late cancellation drops `tx`, which rolls it back
        ctx.check()?;
        Ok(SqliteUnitOfWork { tx })
    }
}

/// Open SQLite transaction.
pub struct SqliteUnitOfWork<'conn> {
    tx: Transaction<'conn>,
}

impl UnitOfWork for SqliteUnitOfWork<'_> {
    fn fetch_user(&mut self, ctx: &RequestContext, user_id: UserId) -> StoreResult<User> {
        ctx.check()?;
        let user = self
            .tx
            .query_row(USER_SELECT_SQL, [user_id], |row| {
                Ok(User {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    email: row.get(2)?,
                })
            })
            .map_err(|err| StoreError::UserLookup {
                user_id,
                source: err.into(),
            })?;
        ctx.check()?;
        Ok(user)
    }

    fn insert_batch(&mut self, ctx: &RequestContext, batch: &TransactionBatch) -> StoreResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        ctx.check()?;

        let rows = vec![TRANSACTION_ROW_SQL; batch.len()].join(",");
        let sql = format!("{TRANSACTION_INSERT_SQL} {rows};");

        let mut bind_values: Vec<Value> = Vec::with_capacity(batch.len() * 3);
        for record in batch.items() {
            bind_values.push(Value::Integer(batch.user_id()));
            bind_values.push(Value::Text(record.amount().to_string()));
            bind_values.push(Value::Text(record.occurred_at().to_rfc3339()));
        }

        let affected = self
            .tx
            .execute(&sql, params_from_iter(bind_values))
            .map_err(|err| StoreError::Insert(err.into()))?;
        ctx.check()?;

        if affected != batch.len() {
            return Err(StoreError::RowCountMismatch {
                expected: batch.len(),
                actual: affected,
            });
        }
        Ok(())
    }

    fn commit(self) -> StoreResult<()> {
        self.tx
            .commit()
            .map_err(|err| StoreError::Commit(err.into()))
    }

    fn rollback(self) -> StoreResult<()> {
        self.tx
            .rollback()
            .map_err(|err| StoreError::Rollback(err.into()))
    }
}

/// Creates or replaces a user row.
///
/// Users belong to the account system; this exists for seeding local
/// databases and tests.
pub fn upsert_user(conn: &Connection, user: &User) -> DbResult<()> {
    conn.execute(
        "INSERT INTO users (id, name, email) VALUES (?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET name = excluded.name, email = excluded.email;",
        params![user.id, user.name.as_str(), user.email.as_str()],
    )?;
    Ok(())
}

/// Persisted `(amount, date_created)` text pairs for a user, in insert order.
pub fn list_transaction_rows(conn: &Connection, user_id: UserId) -> DbResult<Vec<(String, String)>> {
    let mut stmt = conn.prepare(
        "SELECT amount, date_created
         FROM transactions
         WHERE user_id = ?1
         ORDER BY id ASC;",
    )?;
    let rows = stmt.query_map([user_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
}
