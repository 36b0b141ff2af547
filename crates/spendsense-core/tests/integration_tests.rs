//! Integration tests for spendsense-core
//!
//! These tests exercise the full snapshot → analyze → report workflow.

use chrono::NaiveDate;

use spendsense_core::{
    AnalyticsEngine, LeakType, PatternType, PredictionMethod, TransactionSnapshot,
};

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn tx(
    on: &str,
    amount: f64,
    narration: &str,
    category: Option<&str>,
) -> spendsense_core::Transaction {
    spendsense_core::Transaction {
        date: date(on),
        amount,
        narration: narration.to_string(),
        category: category.map(|c| c.to_string()),
        subcategory: None,
        transaction_type: None,
    }
}

/// Four ₹499 NETFLIX debits on the 5th of consecutive months, plus enough
/// other activity that ranking has something to rank.
fn netflix_history() -> Vec<spendsense_core::Transaction> {
    let mut txs = vec![
        tx("2026-03-05", -499.0, "UPI-NETFLIX-500111811826@ybl", Some("Entertainment")),
        tx("2026-04-05", -499.0, "UPI-NETFLIX-500111811827@ybl", Some("Entertainment")),
        tx("2026-05-05", -499.0, "UPI-NETFLIX-500111811828@ybl", Some("Entertainment")),
        tx("2026-06-05", -499.0, "UPI-NETFLIX-500111811829@ybl", Some("Entertainment")),
    ];
    // Salary so the savings projector has income to work with
    for month in 1..=6 {
        txs.push(tx(
            &format!("2026-{:02}-01", month),
            55_000.0,
            "SALARY CREDIT ACME",
            None,
        ));
    }
    txs
}

// =============================================================================
// End-to-End Scenario (NETFLIX)
// =============================================================================

#[test]
fn test_netflix_monthly_pattern_and_subscription_leak() {
    let snapshot = TransactionSnapshot::new(netflix_history());
    let engine = AnalyticsEngine::new();
    let report = engine.run_all(&snapshot, date("2026-06-20"));

    // PatternDetector: one MONTHLY pattern anchored to the 5th at ₹499
    let monthly: Vec<_> = report
        .patterns
        .iter()
        .filter(|p| p.pattern_type == PatternType::Monthly)
        .collect();
    assert_eq!(monthly.len(), 1);
    assert_eq!(monthly[0].day_of_month, Some(5));
    assert!((monthly[0].average_amount - 499.0).abs() < 1e-9);
    assert_eq!(monthly[0].merchant_pattern.as_deref(), Some("NETFLIX"));
    assert!(monthly[0].active);

    // MoneyLeakDetector: the same recurring charge shows up independently,
    // annualized at 499 x 12
    let subscription = report
        .leaks
        .iter()
        .find(|l| l.leak_type == LeakType::RepeatingSubscription)
        .expect("subscription leak should be ranked");
    assert_eq!(subscription.merchant_pattern, "NETFLIX");
    assert!((subscription.annual_amount - 5988.0).abs() < 1e-9);
    assert!(subscription.rank.is_some());
}

// =============================================================================
// Full Pipeline
// =============================================================================

#[test]
fn test_full_pipeline_on_busy_history() {
    let mut txs = netflix_history();

    // A dozen small chai purchases this month (coffee effect)
    for day in 1..=12 {
        txs.push(tx(
            &format!("2026-06-{:02}", day),
            -80.0,
            "UPI-CHAI POINT-11@ybl",
            Some("Dining & Food"),
        ));
    }
    // Steady groceries for trend/alert baselines
    for month in 1..=5 {
        txs.push(tx(
            &format!("2026-{:02}-12", month),
            -3_000.0,
            "BIG BAZAAR SUPERMARKET",
            Some("Groceries"),
        ));
    }
    // Current month groceries running far ahead of baseline
    txs.push(tx("2026-06-08", -6_500.0, "BIG BAZAAR SUPERMARKET", Some("Groceries")));

    let snapshot = TransactionSnapshot::new(txs);
    let engine = AnalyticsEngine::new();
    let report = engine.run_all(&snapshot, date("2026-06-20"));

    // Ranks are 1..=3, descending by annualized amount
    assert!(!report.leaks.is_empty());
    assert!(report.leaks.len() <= 3);
    for (i, leak) in report.leaks.iter().enumerate() {
        assert_eq!(leak.rank, Some(i as u8 + 1));
    }
    let annuals: Vec<f64> = report.leaks.iter().map(|l| l.annual_amount).collect();
    assert!(annuals.windows(2).all(|w| w[0] >= w[1]));

    // The grocery blowout raises an alert at MEDIUM or above
    let grocery_alert = report
        .alerts
        .iter()
        .find(|a| a.category == "Groceries")
        .expect("grocery overspending should alert");
    assert!(grocery_alert.percent_increase > 10.0);

    // Salary in, expenses out: a projection exists and has income
    let projection = report.projection.expect("projection should exist");
    assert!(projection.monthly_income_avg > 0.0);
    assert_eq!(projection.remaining_months, 6);

    // Predictions cover categories with history before July
    assert!(report
        .predictions
        .iter()
        .any(|p| p.category == "Groceries"));

    // Every nudge references an artifact from this run
    for nudge in &report.nudges {
        assert!(!nudge.read);
        assert!(!nudge.dismissed);
        assert_eq!((nudge.expires_at - nudge.created_at).num_days(), 7);
    }
}

// =============================================================================
// Replace-on-Run Semantics
// =============================================================================

#[test]
fn test_rerun_replaces_rather_than_accumulates() {
    let snapshot = TransactionSnapshot::new(netflix_history());
    let engine = AnalyticsEngine::new();
    let today = date("2026-06-20");

    let first = engine.run_all(&snapshot, today);
    let second = engine.run_all(&snapshot, today);

    // A rerun on the same snapshot is a full fresh set, not an accumulation
    assert_eq!(first.patterns.len(), second.patterns.len());
    assert_eq!(first.leaks.len(), second.leaks.len());
    assert_eq!(first.nudges.len(), second.nudges.len());

    let first_json = serde_json::to_string(&first).unwrap();
    let second_json = serde_json::to_string(&second).unwrap();
    assert_eq!(first_json, second_json);
}

// =============================================================================
// Trend Method Propagation
// =============================================================================

#[test]
fn test_growing_category_produces_trend_based_prediction() {
    // Sharply growing shopping spend on irregular dates, so no routine
    // pattern can claim the category and the trend drives the forecast
    let txs = vec![
        tx("2026-02-10", -1_000.0, "MYNTRA ORDER", Some("Shopping")),
        tx("2026-03-14", -2_000.0, "MYNTRA ORDER", Some("Shopping")),
        tx("2026-04-09", -4_000.0, "MYNTRA ORDER", Some("Shopping")),
        tx("2026-05-22", -8_000.0, "MYNTRA ORDER", Some("Shopping")),
    ];
    let snapshot = TransactionSnapshot::new(txs);
    let engine = AnalyticsEngine::new();
    let report = engine.run_all(&snapshot, date("2026-06-20"));

    let shopping = report
        .predictions
        .iter()
        .find(|p| p.category == "Shopping")
        .expect("shopping prediction should exist");
    assert_eq!(shopping.method, PredictionMethod::TrendBased);
    assert!(shopping.is_overspending_risk);

    // And a trend warning nudge follows from it
    assert!(report
        .nudges
        .iter()
        .any(|n| n.nudge_type == spendsense_core::NudgeType::TrendWarning));
}
