//! Inbound ledger rows: payload decoding and row validation.
//!
//! # Responsibility
//! - Decode the raw CSV payload into text rows.
//! - Validate rows into a typed `TransactionBatch`.
//!
//! # Invariants
//! - Validation is fail-fast; no partial batch ever leaves this module.
//! - Row numbers in errors are 1-based.

mod payload;
mod rows;

pub use payload::{read_rows, PayloadError};
pub use rows::{parse_rows, ParseError, EXPECTED_FIELDS};
