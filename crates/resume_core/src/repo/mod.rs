//! Persistence gateway contracts and SQLite implementation.
//!
//! # Responsibility
//! - Own the transactional unit of work used by the resume workflow.
//! - Isolate SQL details from service orchestration.
//!
//! # Invariants
//! - A unit of work is terminated exactly once, by `finish`.
//! - Rollback failures never replace the error that caused the rollback.

pub mod ledger_repo;
