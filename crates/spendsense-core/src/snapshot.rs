//! In-memory transaction snapshot
//!
//! The engine operates on a read-only slice of one user's history. The
//! snapshot owns the ordering invariant (ascending by date) and the windowed
//! views every analyzer starts from; persistence stays on the caller's side
//! of the seam.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{MonthKey, Transaction};

/// One user's transaction history, ordered ascending by date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionSnapshot {
    transactions: Vec<Transaction>,
}

impl TransactionSnapshot {
    /// Build a snapshot, sorting by date so downstream interval scans can
    /// assume chronological order.
    pub fn new(mut transactions: Vec<Transaction>) -> Self {
        transactions.sort_by_key(|t| t.date);
        Self { transactions }
    }

    /// Load a snapshot from a JSON file (an array of transactions).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let transactions: Vec<Transaction> = serde_json::from_str(&raw)?;
        Ok(Self::new(transactions))
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// All transactions, ascending by date.
    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }

    /// Transactions strictly after `cutoff`.
    pub fn since(&self, cutoff: NaiveDate) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().filter(move |t| t.date > cutoff)
    }

    /// Transactions within `[from, to]` inclusive.
    pub fn between(&self, from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .filter(move |t| t.date >= from && t.date <= to)
    }

    /// Expense transactions (amount < 0) strictly after `cutoff`.
    pub fn expenses_since(&self, cutoff: NaiveDate) -> impl Iterator<Item = &Transaction> {
        self.since(cutoff).filter(|t| t.is_expense())
    }

    /// Expense transactions within `[from, to]` inclusive.
    pub fn expenses_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Iterator<Item = &Transaction> {
        self.between(from, to).filter(|t| t.is_expense())
    }
}

/// Sum transaction magnitudes per calendar month. BTreeMap keeps months in
/// chronological order for the regression/outlier passes.
pub fn monthly_totals<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> BTreeMap<MonthKey, f64> {
    let mut totals: BTreeMap<MonthKey, f64> = BTreeMap::new();
    for tx in transactions {
        *totals.entry(MonthKey::from_date(tx.date)).or_insert(0.0) += tx.magnitude();
    }
    totals
}

/// Group transactions per calendar month.
pub fn by_month<'a>(
    transactions: impl IntoIterator<Item = &'a Transaction>,
) -> BTreeMap<MonthKey, Vec<&'a Transaction>> {
    let mut groups: BTreeMap<MonthKey, Vec<&Transaction>> = BTreeMap::new();
    for tx in transactions {
        groups.entry(MonthKey::from_date(tx.date)).or_default().push(tx);
    }
    groups
}

/// Complete calendar months between two dates, partial months rounded down.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    use chrono::Datelike;
    if to < from {
        return 0;
    }
    let mut months = MonthKey::from_date(to).index() - MonthKey::from_date(from).index();
    if to.day() < from.day() {
        months -= 1;
    }
    months.max(0)
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation around a known mean.
pub fn population_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum_squared_diff: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (sum_squared_diff / values.len() as f64).sqrt()
}

/// Population variance around a known mean.
pub fn population_variance(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(date: &str, amount: f64) -> Transaction {
        Transaction {
            date: date.parse().unwrap(),
            amount,
            narration: "TEST".to_string(),
            category: Some("Dining & Food".to_string()),
            subcategory: None,
            transaction_type: None,
        }
    }

    #[test]
    fn test_snapshot_sorts_by_date() {
        let snapshot = TransactionSnapshot::new(vec![
            tx("2026-03-10", -50.0),
            tx("2026-01-05", -20.0),
            tx("2026-02-20", -30.0),
        ]);
        let dates: Vec<NaiveDate> = snapshot.iter().map(|t| t.date).collect();
        assert!(dates.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_window_filters() {
        let snapshot = TransactionSnapshot::new(vec![
            tx("2026-01-05", -20.0),
            tx("2026-02-20", 100.0),
            tx("2026-03-10", -50.0),
        ]);
        let cutoff = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        assert_eq!(snapshot.since(cutoff).count(), 2);
        assert_eq!(snapshot.expenses_since(cutoff).count(), 1);

        let from = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2026, 2, 28).unwrap();
        assert_eq!(snapshot.between(from, to).count(), 1);
    }

    #[test]
    fn test_monthly_totals_uses_magnitudes() {
        let totals = monthly_totals(&[
            tx("2026-01-05", -20.0),
            tx("2026-01-15", -30.0),
            tx("2026-02-20", -10.0),
        ]);
        assert_eq!(totals.len(), 2);
        assert!((totals[&MonthKey { year: 2026, month: 1 }] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_months_between_rounds_down_partial() {
        let a = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        assert_eq!(months_between(a, NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()), 1);
        assert_eq!(months_between(a, NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()), 2);
        assert_eq!(months_between(a, a), 0);
    }

    #[test]
    fn test_population_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let m = mean(&values);
        assert!((population_std_dev(&values, m) - 2.0).abs() < 1e-9);
    }
}
