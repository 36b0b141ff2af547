//! Trend analysis
//!
//! Aggregates monthly category totals over the history window and derives a
//! direction/strength per category via an ordinary least-squares slope, plus
//! spike and dip months relative to the category's own mean.

use std::collections::BTreeMap;

use tracing::debug;

use crate::engine::AnalysisContext;
use crate::models::{MonthKey, SpendingDip, SpendingSpike, Transaction, Trend, TrendDirection};
use crate::snapshot::{mean, monthly_totals, population_std_dev};

/// Everything the trend pass produces for one run.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TrendReport {
    pub trends: Vec<Trend>,
    pub spikes: Vec<SpendingSpike>,
    pub dips: Vec<SpendingDip>,
}

/// Analyze per-category monthly spending trends over the history window.
///
/// Categories with fewer than three distinct months of data are skipped;
/// absence of a trend means "not enough signal", not "stable".
pub fn analyze_trends(ctx: &AnalysisContext) -> TrendReport {
    let mut by_category: BTreeMap<String, Vec<&Transaction>> = BTreeMap::new();
    for tx in ctx.snapshot.expenses_since(ctx.history_start()) {
        if let Some(category) = tx.category.clone() {
            by_category.entry(category).or_default().push(tx);
        }
    }

    let mut report = TrendReport::default();

    for (category, txs) in by_category {
        let monthly = monthly_totals(txs);
        if monthly.len() < 3 {
            continue;
        }

        let months: Vec<MonthKey> = monthly.keys().copied().collect();
        let amounts: Vec<f64> = monthly.values().copied().collect();

        if let Some(trend) = calculate_trend(ctx, &category, &amounts) {
            report.trends.push(trend);
        }

        let avg = mean(&amounts);
        let std_dev = population_std_dev(&amounts, avg);
        if avg <= 0.0 {
            continue;
        }

        for (month, amount) in months.iter().zip(&amounts) {
            if *amount > avg + ctx.config.outlier_sigma * std_dev
                && *amount > avg * ctx.config.spike_mean_ratio
            {
                let delta = amount - avg;
                report.spikes.push(SpendingSpike {
                    category: category.clone(),
                    month: *month,
                    amount: *amount,
                    delta,
                    percent_delta: delta / avg * 100.0,
                });
            }

            if *amount < avg - ctx.config.outlier_sigma * std_dev
                && *amount < avg * ctx.config.dip_mean_ratio
            {
                let delta = avg - amount;
                report.dips.push(SpendingDip {
                    category: category.clone(),
                    month: *month,
                    amount: *amount,
                    delta,
                    percent_delta: delta / avg * 100.0,
                });
            }
        }
    }

    debug!(
        trends = report.trends.len(),
        spikes = report.spikes.len(),
        dips = report.dips.len(),
        "trend analysis complete"
    );
    report
}

/// Least-squares slope of monthly totals against month index, classified
/// against a band of the mean.
fn calculate_trend(ctx: &AnalysisContext, category: &str, amounts: &[f64]) -> Option<Trend> {
    let n = amounts.len();
    if n < 3 {
        return None;
    }

    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_x2 = 0.0;
    for (i, amount) in amounts.iter().enumerate() {
        let x = i as f64;
        sum_x += x;
        sum_y += amount;
        sum_xy += x * amount;
        sum_x2 += x * x;
    }

    let nf = n as f64;
    let denominator = nf * sum_x2 - sum_x * sum_x;
    if denominator == 0.0 {
        return None;
    }
    let slope = (nf * sum_xy - sum_x * sum_y) / denominator;
    let avg = sum_y / nf;

    let direction = if slope > avg * ctx.config.trend_slope_band {
        TrendDirection::Increasing
    } else if slope < -avg * ctx.config.trend_slope_band {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    };

    let strength = (slope.abs() / avg.max(1.0)).min(1.0);

    Some(Trend {
        category: category.to_string(),
        direction,
        strength,
        start_amount: amounts[0],
        end_amount: amounts[n - 1],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::TransactionSnapshot;
    use crate::test_utils::expense;
    use chrono::NaiveDate;

    /// One expense per month carrying that month's whole total.
    fn monthly_series(amounts: &[f64]) -> TransactionSnapshot {
        let txs = amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| {
                expense(
                    &format!("2026-{:02}-15", i + 1),
                    *amount,
                    "BIG BAZAAR",
                    "Groceries",
                )
            })
            .collect();
        TransactionSnapshot::new(txs)
    }

    fn today() -> NaiveDate {
        "2026-06-20".parse().unwrap()
    }

    #[test]
    fn test_flat_series_is_stable() {
        let snapshot = monthly_series(&[100.0, 100.0, 100.0]);
        let ctx = AnalysisContext::new(&snapshot, today());
        let report = analyze_trends(&ctx);
        assert_eq!(report.trends.len(), 1);
        assert_eq!(report.trends[0].direction, TrendDirection::Stable);
    }

    #[test]
    fn test_growing_series_is_increasing() {
        let snapshot = monthly_series(&[100.0, 150.0, 225.0]);
        let ctx = AnalysisContext::new(&snapshot, today());
        let report = analyze_trends(&ctx);
        assert_eq!(report.trends[0].direction, TrendDirection::Increasing);
        assert!(report.trends[0].strength > 0.0);
        assert!((report.trends[0].start_amount - 100.0).abs() < 1e-9);
        assert!((report.trends[0].end_amount - 225.0).abs() < 1e-9);
    }

    #[test]
    fn test_shrinking_series_is_decreasing() {
        let snapshot = monthly_series(&[225.0, 150.0, 100.0]);
        let ctx = AnalysisContext::new(&snapshot, today());
        let report = analyze_trends(&ctx);
        assert_eq!(report.trends[0].direction, TrendDirection::Decreasing);
    }

    #[test]
    fn test_two_months_is_not_enough() {
        let snapshot = monthly_series(&[100.0, 200.0]);
        let ctx = AnalysisContext::new(&snapshot, today());
        assert!(analyze_trends(&ctx).trends.is_empty());
    }

    #[test]
    fn test_spike_month_detected() {
        // Five quiet months then one wild one
        let snapshot = monthly_series(&[100.0, 100.0, 100.0, 100.0, 100.0, 400.0]);
        let ctx = AnalysisContext::new(&snapshot, "2026-06-30".parse().unwrap());
        let report = analyze_trends(&ctx);
        assert_eq!(report.spikes.len(), 1);
        let spike = &report.spikes[0];
        assert_eq!(spike.month, MonthKey { year: 2026, month: 6 });
        assert!((spike.amount - 400.0).abs() < 1e-9);
        assert!(spike.percent_delta > 100.0);
    }

    #[test]
    fn test_dip_month_detected() {
        let snapshot = monthly_series(&[500.0, 500.0, 500.0, 500.0, 500.0, 50.0]);
        let ctx = AnalysisContext::new(&snapshot, "2026-06-30".parse().unwrap());
        let report = analyze_trends(&ctx);
        assert_eq!(report.dips.len(), 1);
        assert!((report.dips[0].amount - 50.0).abs() < 1e-9);
    }
}
