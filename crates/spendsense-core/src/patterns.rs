//! Spending pattern detection
//!
//! Scans a user's expense history for recurring routines at three
//! granularities. The scans are independent by design: a merchant group can
//! surface as a daily habit and a monthly anchor at the same time.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Duration, NaiveDate};
use tracing::debug;

use crate::engine::AnalysisContext;
use crate::models::{PatternType, SpendingPattern, Transaction};
use crate::narration::merchant_pattern;
use crate::snapshot::{mean, months_between};

/// Grouping key: category, subcategory, and merchant pattern. BTreeMap keyed
/// on this keeps detection output deterministic across runs.
type GroupKey = (String, String, String);

fn group_key(tx: &Transaction) -> Option<GroupKey> {
    let category = tx.category.clone()?;
    let subcategory = tx.subcategory.clone().unwrap_or_default();
    Some((category, subcategory, merchant_pattern(&tx.narration)))
}

/// Detect daily, weekly, and monthly spending routines over the trailing
/// history window.
pub fn detect_patterns(ctx: &AnalysisContext) -> Vec<SpendingPattern> {
    let transactions: Vec<&Transaction> = ctx
        .snapshot
        .expenses_since(ctx.history_start())
        .filter(|t| t.category.is_some())
        .collect();

    if transactions.is_empty() {
        debug!("no expense history, skipping pattern detection");
        return Vec::new();
    }

    let mut patterns = detect_daily(ctx, &transactions);
    patterns.extend(detect_weekly(ctx, &transactions));
    patterns.extend(detect_monthly(ctx, &transactions));

    debug!(count = patterns.len(), "pattern detection complete");
    patterns
}

/// Daily routines: groups active on a large share of days since first seen.
fn detect_daily(ctx: &AnalysisContext, transactions: &[&Transaction]) -> Vec<SpendingPattern> {
    let config = &ctx.config;
    let mut groups: BTreeMap<GroupKey, Vec<&Transaction>> = BTreeMap::new();
    for tx in transactions {
        if let Some(key) = group_key(tx) {
            groups.entry(key).or_default().push(tx);
        }
    }

    let mut patterns = Vec::new();
    for ((category, subcategory, merchant), txs) in groups {
        if txs.len() < config.daily_min_occurrences {
            continue;
        }

        let unique_days = txs.iter().map(|t| t.date).collect::<BTreeSet<_>>().len() as i64;
        let first = txs.iter().map(|t| t.date).min().unwrap_or(ctx.today);
        let last = txs.iter().map(|t| t.date).max().unwrap_or(ctx.today);
        let total_days = (ctx.today - first).num_days();
        if total_days <= 0 {
            continue;
        }

        if unique_days as f64 / total_days as f64 <= config.daily_coverage {
            continue;
        }

        let amounts: Vec<f64> = txs.iter().map(|t| t.magnitude()).collect();
        // Complete 30-day months since first occurrence, at least one
        let month_span = (total_days / 30).max(1) as f64;

        patterns.push(SpendingPattern {
            pattern_type: PatternType::Daily,
            category,
            subcategory: if subcategory.is_empty() { None } else { Some(subcategory) },
            merchant_pattern: Some(merchant),
            day_of_week: None,
            day_of_month: None,
            average_amount: mean(&amounts),
            frequency_per_month: unique_days as f64 * 30.0 / total_days as f64,
            confidence: (unique_days as f64 / month_span).min(1.0),
            first_observed: first,
            last_observed: last,
            detected_on: ctx.today,
            active: true,
        });
    }

    patterns
}

/// Weekly routines: groups that land on the same day of week, week after
/// week.
fn detect_weekly(ctx: &AnalysisContext, transactions: &[&Transaction]) -> Vec<SpendingPattern> {
    let config = &ctx.config;
    let mut groups: BTreeMap<(u32, GroupKey), Vec<&Transaction>> = BTreeMap::new();
    for tx in transactions {
        if let Some(key) = group_key(tx) {
            groups
                .entry((tx.date.weekday().num_days_from_monday(), key))
                .or_default()
                .push(tx);
        }
    }

    let mut patterns = Vec::new();
    for ((_, (category, subcategory, merchant)), txs) in groups {
        if txs.len() < config.weekly_min_occurrences {
            continue;
        }

        let weeks_with_tx = txs
            .iter()
            .map(|t| week_start(t.date))
            .collect::<BTreeSet<_>>()
            .len() as i64;
        let first = txs.iter().map(|t| t.date).min().unwrap_or(ctx.today);
        let last = txs.iter().map(|t| t.date).max().unwrap_or(ctx.today);
        let total_weeks = (ctx.today - first).num_days() / 7;
        if total_weeks <= 0 {
            continue;
        }

        if weeks_with_tx as f64 / total_weeks as f64 <= config.weekly_coverage {
            continue;
        }

        let amounts: Vec<f64> = txs.iter().map(|t| t.magnitude()).collect();

        patterns.push(SpendingPattern {
            pattern_type: PatternType::Weekly,
            category,
            subcategory: if subcategory.is_empty() { None } else { Some(subcategory) },
            merchant_pattern: Some(merchant),
            day_of_week: Some(txs[0].date.weekday()),
            day_of_month: None,
            average_amount: mean(&amounts),
            frequency_per_month: weeks_with_tx as f64,
            confidence: (weeks_with_tx as f64 / total_weeks.max(1) as f64).min(1.0),
            first_observed: first,
            last_observed: last,
            detected_on: ctx.today,
            active: true,
        });
    }

    patterns
}

/// Monthly routines: groups anchored to the same day of the month (rent on
/// the 1st, a subscription on the 5th).
fn detect_monthly(ctx: &AnalysisContext, transactions: &[&Transaction]) -> Vec<SpendingPattern> {
    let config = &ctx.config;
    let mut groups: BTreeMap<(u32, GroupKey), Vec<&Transaction>> = BTreeMap::new();
    for tx in transactions {
        if let Some(key) = group_key(tx) {
            groups.entry((tx.date.day(), key)).or_default().push(tx);
        }
    }

    let mut patterns = Vec::new();
    for ((day_of_month, (category, subcategory, merchant)), txs) in groups {
        if txs.len() < config.monthly_min_occurrences {
            continue;
        }

        let months_with_tx = txs
            .iter()
            .map(|t| crate::models::MonthKey::from_date(t.date))
            .collect::<BTreeSet<_>>()
            .len() as i64;
        let first = txs.iter().map(|t| t.date).min().unwrap_or(ctx.today);
        let last = txs.iter().map(|t| t.date).max().unwrap_or(ctx.today);
        let total_months = months_between(first, ctx.today);
        if total_months <= 0 {
            continue;
        }

        if months_with_tx as f64 / total_months as f64 <= config.monthly_coverage {
            continue;
        }

        let amounts: Vec<f64> = txs.iter().map(|t| t.magnitude()).collect();

        patterns.push(SpendingPattern {
            pattern_type: PatternType::Monthly,
            category,
            subcategory: if subcategory.is_empty() { None } else { Some(subcategory) },
            merchant_pattern: Some(merchant),
            day_of_week: None,
            day_of_month: Some(day_of_month),
            average_amount: mean(&amounts),
            frequency_per_month: months_with_tx as f64,
            confidence: (months_with_tx as f64 / total_months.max(1) as f64).min(1.0),
            first_observed: first,
            last_observed: last,
            detected_on: ctx.today,
            active: true,
        });
    }

    patterns
}

/// Monday of the week containing `date`.
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::TransactionSnapshot;
    use crate::test_utils::expense;

    fn context(transactions: Vec<Transaction>, today: &str) -> (TransactionSnapshot, NaiveDate) {
        (TransactionSnapshot::new(transactions), today.parse().unwrap())
    }

    #[test]
    fn test_daily_pattern_threshold() {
        // 10 purchases on 10 distinct days across the 30 days before today
        let mut txs = Vec::new();
        for i in 0..10 {
            txs.push(expense(
                &format!("2026-06-{:02}", 1 + i * 3),
                120.0,
                "UPI-CHAI POINT-99@ybl",
                "Dining & Food",
            ));
        }
        let (snapshot, today) = context(txs, "2026-07-01");
        let ctx = AnalysisContext::new(&snapshot, today);

        let patterns = detect_patterns(&ctx);
        let daily: Vec<_> = patterns
            .iter()
            .filter(|p| p.pattern_type == PatternType::Daily)
            .collect();
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].merchant_pattern.as_deref(), Some("CHAI POINT"));
        assert!((daily[0].average_amount - 120.0).abs() < 1e-9);
        assert!(daily[0].confidence > 0.9);
    }

    #[test]
    fn test_daily_pattern_needs_ten_occurrences() {
        let mut txs = Vec::new();
        for i in 0..9 {
            txs.push(expense(
                &format!("2026-06-{:02}", 1 + i * 3),
                120.0,
                "UPI-CHAI POINT-99@ybl",
                "Dining & Food",
            ));
        }
        let (snapshot, today) = context(txs, "2026-07-01");
        let ctx = AnalysisContext::new(&snapshot, today);

        let daily = detect_patterns(&ctx)
            .into_iter()
            .filter(|p| p.pattern_type == PatternType::Daily)
            .count();
        assert_eq!(daily, 0);
    }

    #[test]
    fn test_monthly_pattern_on_fixed_day() {
        // Four charges on the 5th of consecutive months
        let txs = vec![
            expense("2026-03-05", 499.0, "NETFLIX", "Entertainment"),
            expense("2026-04-05", 499.0, "NETFLIX", "Entertainment"),
            expense("2026-05-05", 499.0, "NETFLIX", "Entertainment"),
            expense("2026-06-05", 499.0, "NETFLIX", "Entertainment"),
        ];
        let (snapshot, today) = context(txs, "2026-06-20");
        let ctx = AnalysisContext::new(&snapshot, today);

        let patterns = detect_patterns(&ctx);
        let monthly: Vec<_> = patterns
            .iter()
            .filter(|p| p.pattern_type == PatternType::Monthly)
            .collect();
        assert_eq!(monthly.len(), 1);
        assert_eq!(monthly[0].day_of_month, Some(5));
        assert!((monthly[0].average_amount - 499.0).abs() < 1e-9);
        assert_eq!(monthly[0].first_observed, "2026-03-05".parse().unwrap());
        assert_eq!(monthly[0].last_observed, "2026-06-05".parse().unwrap());
    }

    #[test]
    fn test_weekly_pattern_same_weekday() {
        // Every Saturday for eight weeks (2026-05-02 is a Saturday)
        let mut txs = Vec::new();
        let start: NaiveDate = "2026-05-02".parse().unwrap();
        for week in 0..8 {
            let date = start + Duration::days(7 * week);
            txs.push(expense(
                &date.to_string(),
                640.0,
                "SWIGGY ORDER",
                "Dining & Food",
            ));
        }
        let (snapshot, today) = context(txs, "2026-06-25");
        let ctx = AnalysisContext::new(&snapshot, today);

        let patterns = detect_patterns(&ctx);
        let weekly: Vec<_> = patterns
            .iter()
            .filter(|p| p.pattern_type == PatternType::Weekly)
            .collect();
        assert_eq!(weekly.len(), 1);
        assert_eq!(weekly[0].day_of_week, Some(chrono::Weekday::Sat));
    }

    #[test]
    fn test_uncategorized_expenses_are_ignored() {
        let mut txs = Vec::new();
        for i in 0..12 {
            let mut tx = expense(
                &format!("2026-06-{:02}", 1 + i * 2),
                90.0,
                "CORNER STORE",
                "Shopping",
            );
            tx.category = None;
            txs.push(tx);
        }
        let (snapshot, today) = context(txs, "2026-07-01");
        let ctx = AnalysisContext::new(&snapshot, today);
        assert!(detect_patterns(&ctx).is_empty());
    }
}
