//! Ledger summarization and resume rendering.
//!
//! # Responsibility
//! - Derive balance, credit/debit averages and the per-month breakdown.
//! - Render a `Resume` through an explicit `ResumeTemplate` value.
//!
//! # Invariants
//! - Everything here is pure; no I/O, no globals.
//! - Aggregates keep full precision; rounding happens only when a `Resume`
//!   is built.
//! - Month breakdown ignores the year component and is sorted by month.

mod render;
mod stats;

pub use render::{render, RenderError, ResumeTemplate, DEFAULT_BODY, DEFAULT_MONTH_ROW};
pub use stats::{
    balance, credit_average, debit_average, format_two_decimals, month_breakdown, MonthBucket,
    Resume, Summary, SummaryError,
};
