//! Transaction record and batch model.
//!
//! # Invariants
//! - `TransactionRecord::amount` is never zero; ingest rejects such rows.
//! - `TransactionBatch::items` preserves input row order.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;

/// Owning user identifier, as stored in `users.id`.
pub type UserId = i64;

/// One validated ledger movement.
///
/// Positive amounts are credits, negative amounts are debits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    amount: Decimal,
    occurred_at: DateTime<FixedOffset>,
}

impl TransactionRecord {
    /// Builds a record from already-validated parts.
    ///
    /// Returns `None` for a zero amount.
    pub fn new(amount: Decimal, occurred_at: DateTime<FixedOffset>) -> Option<Self> {
        if amount.is_zero() {
            return None;
        }
        Some(Self::from_checked(amount, occurred_at))
    }

    /// Builds a record whose amount the caller already proved non-zero.
    pub(crate) fn from_checked(amount: Decimal, occurred_at: DateTime<FixedOffset>) -> Self {
        debug_assert!(!amount.is_zero());
        Self {
            amount,
            occurred_at,
        }
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    /// Timestamp with the offset it was submitted in.
    pub fn occurred_at(&self) -> DateTime<FixedOffset> {
        self.occurred_at
    }

    pub fn is_credit(&self) -> bool {
        self.amount.is_sign_positive()
    }

    pub fn is_debit(&self) -> bool {
        self.amount.is_sign_negative()
    }
}

/// Ordered set of records submitted in one request for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionBatch {
    user_id: UserId,
    items: Vec<TransactionRecord>,
}

impl TransactionBatch {
    pub fn new(user_id: UserId, items: Vec<TransactionRecord>) -> Self {
        Self { user_id, items }
    }

    pub fn empty(user_id: UserId) -> Self {
        Self::new(user_id, Vec::new())
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn items(&self) -> &[TransactionRecord] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{TransactionBatch, TransactionRecord};
    use chrono::DateTime;
    use rust_decimal::Decimal;

    #[test]
    fn zero_amount_is_not_a_record() {
        let at = DateTime::parse_from_rfc3339("2021-10-01T00:00:00Z").unwrap();
        assert!(TransactionRecord::new(Decimal::ZERO, at).is_none());
        assert!(TransactionRecord::new(Decimal::new(-1, 2), at).is_some());
    }

    #[test]
    fn credit_and_debit_follow_sign() {
        let at = DateTime::parse_from_rfc3339("2021-10-01T00:00:00Z").unwrap();
        let credit = TransactionRecord::new(Decimal::new(15, 0), at).unwrap();
        let debit = TransactionRecord::new(Decimal::new(-10, 0), at).unwrap();
        assert!(credit.is_credit() && !credit.is_debit());
        assert!(debit.is_debit() && !debit.is_credit());
    }

    #[test]
    fn empty_batch_keeps_user() {
        let batch = TransactionBatch::empty(7);
        assert_eq!(batch.user_id(), 7);
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
    }
}
