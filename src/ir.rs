use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A value read from the source file. Values that could not be parsed keep their raw text so
/// that the resolver can report them together with every other problem of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldValue<T> {
    Valid(T),
    Malformed(String),
}

/// Canonical ledger line produced by every decoder.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PivotRow {
    /// 1-based line (or sheet row) number in the raw input, headers included.
    pub line: usize,
    pub journal: Option<String>,
    pub account: Option<String>,
    pub date: Option<FieldValue<NaiveDate>>,
    pub name: Option<String>,
    pub debit: Option<FieldValue<Decimal>>,
    pub credit: Option<FieldValue<Decimal>>,
    pub reference: Option<String>,
    pub reconcile_ref: Option<String>,
    pub partner: Option<String>,
    pub analytic: Option<String>,
}

impl PivotRow {
    pub fn new(line: usize) -> Self {
        Self {
            line,
            ..Self::default()
        }
    }

    /// True if the row moves no money. Rows with an unparseable amount are never
    /// considered empty, they are reported later.
    pub fn has_no_movement(&self) -> bool {
        let is_zero = |amount: &Option<FieldValue<Decimal>>| match amount {
            None => true,
            Some(FieldValue::Valid(amount)) => amount.is_zero(),
            Some(FieldValue::Malformed(_)) => false,
        };
        is_zero(&self.debit) && is_zero(&self.credit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JournalId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartnerId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalyticAccountId(pub u64);

/// A pivot row whose codes were all matched against the master data and whose
/// required fields were all present and well-formed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRow {
    pub line: usize,
    pub journal_id: JournalId,
    pub account_id: AccountId,
    pub partner_id: Option<PartnerId>,
    pub analytic_account_id: Option<AnalyticAccountId>,
    pub date: NaiveDate,
    pub name: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub reference: Option<String>,
    pub reconcile_ref: Option<String>,
}

impl ResolvedRow {
    /// Contribution of this row to the running balance.
    pub fn balance_delta(&self) -> Decimal {
        self.credit - self.debit
    }
}

/// A balanced group of at least two rows, sealed by the grouper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    pub journal_id: JournalId,
    pub date: NaiveDate,
    pub reference: Option<String>,
    pub lines: Vec<ResolvedRow>,
}

impl Move {
    pub fn balance(&self) -> Decimal {
        self.lines.iter().map(ResolvedRow::balance_delta).sum()
    }
}

/// Currency-aware zero test: the amount rounds to zero at the given number of decimals.
pub fn is_zero_at(amount: Decimal, decimals: u32) -> bool {
    amount
        .round_dp_with_strategy(
            decimals,
            rust_decimal::RoundingStrategy::MidpointAwayFromZero,
        )
        .is_zero()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Decimal::ZERO, true)]
    #[case(Decimal::new(4, 3), true)]
    #[case(Decimal::new(-4, 3), true)]
    #[case(Decimal::new(5, 3), false)]
    #[case(Decimal::new(1, 2), false)]
    #[case(Decimal::new(-1000, 2), false)]
    fn test_is_zero_at_two_decimals(#[case] amount: Decimal, #[case] expected: bool) {
        assert_eq!(expected, is_zero_at(amount, 2));
    }

    #[test]
    fn no_movement() {
        let mut row = PivotRow::new(1);
        assert!(row.has_no_movement());
        row.debit = Some(FieldValue::Valid(Decimal::ZERO));
        row.credit = Some(FieldValue::Valid(Decimal::new(0, 2)));
        assert!(row.has_no_movement());
        row.credit = Some(FieldValue::Valid(Decimal::new(1, 2)));
        assert!(!row.has_no_movement());
    }

    #[test]
    fn malformed_amount_is_not_empty() {
        let mut row = PivotRow::new(1);
        row.debit = Some(FieldValue::Malformed("abc".to_string()));
        assert!(!row.has_no_movement());
    }
}
