//! Aggregate statistics over a transaction batch.

use crate::model::transaction::{TransactionBatch, TransactionRecord};
use crate::model::user::User;
use chrono::Datelike;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::BTreeMap;
use thiserror::Error;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Number of transactions in one calendar month, any year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthBucket {
    /// Calendar month, `1..=12`.
    pub month: u32,
    pub count: usize,
}

impl MonthBucket {
    /// English month name, e.g. `October`.
    pub fn name(&self) -> &'static str {
        self.month
            .checked_sub(1)
            .and_then(|index| MONTH_NAMES.get(index as usize))
            .copied()
            .unwrap_or("Unknown")
    }
}

/// An aggregate left the `Decimal` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SummaryError {
    #[error("{aggregate} exceeds the supported amount range")]
    Overflow { aggregate: &'static str },
}

/// Sum of all amounts.
pub fn balance(records: &[TransactionRecord]) -> Result<Decimal, SummaryError> {
    checked_sum(records.iter(), "balance")
}

/// Mean of positive amounts, `0` when there are none.
pub fn credit_average(records: &[TransactionRecord]) -> Result<Decimal, SummaryError> {
    mean(records.iter().filter(|record| record.is_credit()), "credit average")
}

/// Mean of negative amounts, `0` when there are none.
pub fn debit_average(records: &[TransactionRecord]) -> Result<Decimal, SummaryError> {
    mean(records.iter().filter(|record| record.is_debit()), "debit average")
}

/// Transaction counts grouped by calendar month, ascending, empty months
/// omitted.
///
/// Months are taken in each record's own offset. The year is ignored, so
/// December 2021 and December 2022 share one bucket.
pub fn month_breakdown(records: &[TransactionRecord]) -> Vec<MonthBucket> {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for record in records {
        *counts.entry(record.occurred_at().month()).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(month, count)| MonthBucket { month, count })
        .collect()
}

/// Renders a value with exactly two decimals, midpoint away from zero.
pub fn format_two_decimals(value: Decimal) -> String {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        // drops a negative sign left over from rounding
        rounded = Decimal::ZERO;
    }
    rounded.rescale(2);
    rounded.to_string()
}

fn checked_sum<'a>(
    mut records: impl Iterator<Item = &'a TransactionRecord>,
    aggregate: &'static str,
) -> Result<Decimal, SummaryError> {
    records.try_fold(Decimal::ZERO, |sum, record| {
        sum.checked_add(record.amount())
            .ok_or(SummaryError::Overflow { aggregate })
    })
}

fn mean<'a>(
    records: impl Iterator<Item = &'a TransactionRecord> + Clone,
    aggregate: &'static str,
) -> Result<Decimal, SummaryError> {
    let count = records.clone().count();
    if count == 0 {
        return Ok(Decimal::ZERO);
    }
    checked_sum(records, aggregate)?
        .checked_div(Decimal::from(count))
        .ok_or(SummaryError::Overflow { aggregate })
}

/// Full-precision aggregates for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub balance: Decimal,
    pub credit_average: Decimal,
    pub debit_average: Decimal,
    pub months: Vec<MonthBucket>,
}

impl Summary {
    pub fn of(batch: &TransactionBatch) -> Result<Self, SummaryError> {
        let records = batch.items();
        Ok(Self {
            balance: balance(records)?,
            credit_average: credit_average(records)?,
            debit_average: debit_average(records)?,
            months: month_breakdown(records),
        })
    }
}

/// Display-ready summary addressed to one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resume {
    pub user: User,
    pub balance: String,
    pub credit_avg: String,
    pub debit_avg: String,
    pub month_breakdown: Vec<MonthBucket>,
}

impl Resume {
    pub fn new(user: User, summary: &Summary) -> Self {
        Self {
            user,
            balance: format_two_decimals(summary.balance),
            credit_avg: format_two_decimals(summary.credit_average),
            debit_avg: format_two_decimals(summary.debit_average),
            month_breakdown: summary.months.clone(),
        }
    }

    /// Computes the resume of `batch` for `user`.
    pub fn of(user: User, batch: &TransactionBatch) -> Result<Self, SummaryError> {
        Ok(Self::new(user, &Summary::of(batch)?))
    }
}

#[cfg(test)]
mod tests {
    use super::{format_two_decimals, MonthBucket};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(value: &str) -> Decimal {
        Decimal::from_str(value).unwrap()
    }

    #[test]
    fn format_pads_and_rounds_half_away_from_zero() {
        assert_eq!(format_two_decimals(dec("5")), "5.00");
        assert_eq!(format_two_decimals(dec("2.345")), "2.35");
        assert_eq!(format_two_decimals(dec("-2.345")), "-2.35");
        assert_eq!(format_two_decimals(dec("10.004")), "10.00");
    }

    #[test]
    fn format_never_renders_negative_zero() {
        assert_eq!(format_two_decimals(dec("-0.001")), "0.00");
        assert_eq!(format_two_decimals(Decimal::ZERO), "0.00");
    }

    #[test]
    fn month_names_cover_the_calendar() {
        assert_eq!(MonthBucket { month: 1, count: 1 }.name(), "January");
        assert_eq!(MonthBucket { month: 12, count: 1 }.name(), "December");
        assert_eq!(MonthBucket { month: 0, count: 1 }.name(), "Unknown");
    }
}
