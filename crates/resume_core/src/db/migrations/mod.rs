//! Ledger schema steps and the executor that brings a database up to date.
//!
//! # Invariants
//! - Step versions start at 1 and increase by one.
//! - Pending steps run in one transaction; `PRAGMA user_version` records the
//!   last applied step.
//! - A database stamped with a newer version than this binary knows is never
//!   touched.

use crate::db::{DbError, DbResult};
use log::{debug, info, warn};
use rusqlite::Connection;

struct SchemaStep {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    name: "users_and_transactions",
    sql: include_str!("0001_init.sql"),
}];

/// Schema versions before and after one `migrate` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationOutcome {
    pub from: u32,
    pub to: u32,
}

impl MigrationOutcome {
    pub fn applied(&self) -> u32 {
        self.to - self.from
    }
}

/// Highest schema version this binary can create.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.last().map_or(0, |step| step.version)
}

/// Version currently stamped on `conn`.
pub fn schema_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?)
}

/// Runs every step newer than the stamped version.
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the file was written by a newer binary.
/// - `Sqlite` when a step fails; the schema is left as it was.
pub fn migrate(conn: &mut Connection) -> DbResult<MigrationOutcome> {
    let from = schema_version(conn)?;
    let latest = latest_version();

    if from > latest {
        warn!("event=db_migrate module=db status=rejected db_version={from} latest={latest}");
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: from,
            latest_supported: latest,
        });
    }

    let pending: Vec<&SchemaStep> = SCHEMA_STEPS
        .iter()
        .filter(|step| step.version > from)
        .collect();
    if pending.is_empty() {
        return Ok(MigrationOutcome { from, to: from });
    }

    let tx = conn.transaction()?;
    for step in &pending {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        debug!(
            "event=db_migrate module=db status=applied version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from={from} to={latest}");
    Ok(MigrationOutcome { from, to: latest })
}
