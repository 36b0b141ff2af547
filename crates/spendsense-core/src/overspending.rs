//! Category overspending alerts
//!
//! Compares current-month spend-to-date per category against the trailing
//! monthly mean and deviation, and classifies how far ahead of itself the
//! category is running. Only MEDIUM and above survive as alerts.

use std::collections::BTreeMap;

use chrono::Datelike;
use tracing::debug;

use crate::engine::AnalysisContext;
use crate::models::{AlertLevel, CategoryOverspendingAlert, MonthKey, Transaction};
use crate::snapshot::{mean, monthly_totals, population_std_dev};

/// Detect category-level overspending for the current month.
pub fn detect_overspending(ctx: &AnalysisContext) -> Vec<CategoryOverspendingAlert> {
    let config = &ctx.config;
    let month = MonthKey::from_date(ctx.today);
    let month_start = month.first_day();
    let days_elapsed = ctx.today.day();
    let total_days = month.days_in_month();

    let mut current_by_category: BTreeMap<String, Vec<&Transaction>> = BTreeMap::new();
    for tx in ctx.snapshot.expenses_between(month_start, month.last_day()) {
        if let Some(category) = tx.category.clone() {
            current_by_category.entry(category).or_default().push(tx);
        }
    }

    let mut historical_by_category: BTreeMap<String, Vec<&Transaction>> = BTreeMap::new();
    for tx in ctx.snapshot.expenses_since(ctx.history_start()) {
        if tx.date >= month_start {
            continue;
        }
        if let Some(category) = tx.category.clone() {
            historical_by_category.entry(category).or_default().push(tx);
        }
    }

    let mut alerts = Vec::new();

    for (category, current_txs) in current_by_category {
        let current_amount: f64 = current_txs.iter().map(|t| t.magnitude()).sum();

        let historical_txs = match historical_by_category.get(&category) {
            Some(txs) => txs,
            None => continue,
        };

        let monthly = monthly_totals(historical_txs.iter().copied());
        if monthly.len() < config.alert_min_history_months {
            continue;
        }

        let amounts: Vec<f64> = monthly.values().copied().collect();
        let historical_avg = mean(&amounts);
        let std_dev = population_std_dev(&amounts, historical_avg);

        let percent_increase = if historical_avg > 0.0 {
            (current_amount - historical_avg) / historical_avg * 100.0
        } else {
            0.0
        };

        let projected_monthly = current_amount / days_elapsed as f64 * total_days as f64;

        let alert_level = classify(ctx, percent_increase, current_amount, historical_avg, std_dev);
        if alert_level < AlertLevel::Medium {
            continue;
        }

        alerts.push(CategoryOverspendingAlert {
            category,
            alert_level,
            current_amount,
            historical_avg,
            std_dev,
            percent_increase,
            projected_monthly,
            month,
            days_elapsed,
        });
    }

    debug!(count = alerts.len(), "overspending detection complete");
    alerts
}

/// Alert severity from percent increase and deviation from the mean. The
/// lower band of each class is exclusive.
fn classify(
    ctx: &AnalysisContext,
    percent_increase: f64,
    current_amount: f64,
    historical_avg: f64,
    std_dev: f64,
) -> AlertLevel {
    let config = &ctx.config;
    if percent_increase > config.alert_critical_pct
        || current_amount > historical_avg + config.alert_sigma * std_dev
    {
        AlertLevel::Critical
    } else if percent_increase > config.alert_high_pct {
        AlertLevel::High
    } else if percent_increase > config.alert_medium_pct {
        AlertLevel::Medium
    } else {
        AlertLevel::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::TransactionSnapshot;
    use crate::test_utils::expense;
    use chrono::NaiveDate;

    /// Two historical months (600, 1400) plus a current-month spend.
    /// Mean 1000, population stddev 400, so the 2-sigma gate sits at 1800.
    fn snapshot_with_current(current: f64) -> TransactionSnapshot {
        TransactionSnapshot::new(vec![
            expense("2026-04-12", 600.0, "BIG BAZAAR", "Groceries"),
            expense("2026-05-12", 1400.0, "BIG BAZAAR", "Groceries"),
            expense("2026-06-10", current, "BIG BAZAAR", "Groceries"),
        ])
    }

    fn today() -> NaiveDate {
        "2026-06-15".parse().unwrap()
    }

    #[test]
    fn test_exactly_fifty_percent_is_high_not_critical() {
        let snapshot = snapshot_with_current(1500.0);
        let ctx = AnalysisContext::new(&snapshot, today());
        let alerts = detect_overspending(&ctx);
        assert_eq!(alerts.len(), 1);
        assert!((alerts[0].percent_increase - 50.0).abs() < 1e-9);
        assert_eq!(alerts[0].alert_level, AlertLevel::High);
    }

    #[test]
    fn test_just_over_fifty_percent_is_critical() {
        let snapshot = snapshot_with_current(1500.1);
        let ctx = AnalysisContext::new(&snapshot, today());
        let alerts = detect_overspending(&ctx);
        assert_eq!(alerts[0].alert_level, AlertLevel::Critical);
    }

    #[test]
    fn test_two_sigma_breach_is_critical() {
        let snapshot = snapshot_with_current(1850.0);
        let ctx = AnalysisContext::new(&snapshot, today());
        let alerts = detect_overspending(&ctx);
        assert_eq!(alerts[0].alert_level, AlertLevel::Critical);
    }

    #[test]
    fn test_small_increase_is_not_persisted() {
        // 5% over the mean stays below the MEDIUM band
        let snapshot = snapshot_with_current(1050.0);
        let ctx = AnalysisContext::new(&snapshot, today());
        assert!(detect_overspending(&ctx).is_empty());
    }

    #[test]
    fn test_single_history_month_is_skipped() {
        let snapshot = TransactionSnapshot::new(vec![
            expense("2026-05-12", 1000.0, "BIG BAZAAR", "Groceries"),
            expense("2026-06-10", 5000.0, "BIG BAZAAR", "Groceries"),
        ]);
        let ctx = AnalysisContext::new(&snapshot, today());
        assert!(detect_overspending(&ctx).is_empty());
    }

    #[test]
    fn test_projection_scales_to_month_length() {
        let snapshot = snapshot_with_current(1500.0);
        let ctx = AnalysisContext::new(&snapshot, today());
        let alerts = detect_overspending(&ctx);
        // 1500 over 15 elapsed days projected across 30 days of June
        assert!((alerts[0].projected_monthly - 3000.0).abs() < 1e-9);
        assert_eq!(alerts[0].days_elapsed, 15);
    }
}
