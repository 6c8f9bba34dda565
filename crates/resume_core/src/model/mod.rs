//! Domain model for transaction ledgers and their owners.
//!
//! # Responsibility
//! - Define the typed records produced by ingest and consumed by the
//!   resume workflow.
//!
//! # Invariants
//! - Records are immutable once a batch has been parsed.
//! - Batch item order is the submission row order.

pub mod transaction;
pub mod user;
