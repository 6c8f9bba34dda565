//! Row-level validation of `[amount, RFC-3339 timestamp]` pairs.

use crate::model::transaction::{TransactionBatch, TransactionRecord, UserId};
use chrono::DateTime;
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

/// Number of fields every row must carry.
pub const EXPECTED_FIELDS: usize = 2;

/// First invalid row found in a submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("for row number {row} is expected {expected} elements, however got {got}")]
    RowShape {
        row: usize,
        expected: usize,
        got: usize,
    },
    #[error("error parsing amount ({raw}) from row number {row}")]
    AmountFormat { row: usize, raw: String },
    #[error("for row number {row}, transaction amount is zero")]
    ZeroAmount { row: usize },
    #[error(
        "error parsing date '{raw}' because of no compliance with RFC3339 layout for row number {row}"
    )]
    DateFormat { row: usize, raw: String },
}

impl ParseError {
    /// 1-based number of the offending row.
    pub fn row(&self) -> usize {
        match self {
            Self::RowShape { row, .. }
            | Self::AmountFormat { row, .. }
            | Self::ZeroAmount { row }
            | Self::DateFormat { row, .. } => *row,
        }
    }
}

/// Validates raw rows into a batch owned by `user_id`.
///
/// An empty row slice yields an empty batch; rejecting empty submissions is
/// the caller's decision.
///
/// # Errors
/// - Returns the error for the first invalid row, in input order.
pub fn parse_rows<S: AsRef<str>>(
    rows: &[Vec<S>],
    user_id: UserId,
) -> Result<TransactionBatch, ParseError> {
    let mut items = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let row_number = index + 1;
        if row.len() != EXPECTED_FIELDS {
            return Err(ParseError::RowShape {
                row: row_number,
                expected: EXPECTED_FIELDS,
                got: row.len(),
            });
        }

        let raw_amount = row[0].as_ref();
        let amount = parse_amount(raw_amount).ok_or_else(|| ParseError::AmountFormat {
            row: row_number,
            raw: raw_amount.to_string(),
        })?;
        if amount.is_zero() {
            return Err(ParseError::ZeroAmount { row: row_number });
        }

        let raw_date = row[1].as_ref();
        let occurred_at =
            DateTime::parse_from_rfc3339(raw_date).map_err(|_| ParseError::DateFormat {
                row: row_number,
                raw: raw_date.to_string(),
            })?;

        items.push(TransactionRecord::from_checked(amount, occurred_at));
    }

    Ok(TransactionBatch::new(user_id, items))
}

// Accepts plain and scientific notation. `Decimal` has no NaN or infinity,
// so anything it can hold is finite. Magnitudes past `Decimal::MAX` are
// rejected like any other malformed amount.
fn parse_amount(raw: &str) -> Option<Decimal> {
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::{parse_amount, parse_rows, ParseError};
    use rust_decimal::Decimal;

    #[test]
    fn parse_amount_accepts_plain_and_scientific_forms() {
        assert_eq!(parse_amount("-10"), Some(Decimal::new(-10, 0)));
        assert_eq!(parse_amount("30.5"), Some(Decimal::new(305, 1)));
        assert_eq!(parse_amount("1e3"), Some(Decimal::new(1000, 0)));
    }

    #[test]
    fn parse_amount_rejects_non_finite_and_garbage() {
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("inf"), None);
        assert_eq!(parse_amount("ten"), None);
    }

    #[test]
    fn zero_amount_is_reported_before_date_format() {
        let rows = vec![vec!["0", "not-a-date"]];
        let err = parse_rows(&rows, 1).unwrap_err();
        assert_eq!(err, ParseError::ZeroAmount { row: 1 });
    }

    #[test]
    fn row_accessor_reports_offending_row() {
        let rows = vec![
            vec!["5", "2021-10-01T00:00:00Z"],
            vec!["x", "2021-10-01T00:00:00Z"],
        ];
        assert_eq!(parse_rows(&rows, 1).unwrap_err().row(), 2);
    }
}
