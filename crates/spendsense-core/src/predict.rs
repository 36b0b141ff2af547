//! Spending prediction
//!
//! Forecasts next-period spend per category by layering three signals:
//! the historical monthly average, a matching active routine, and the
//! category's trend. Interpretability over precision: the method that last
//! touched the number is recorded on the prediction.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::debug;

use crate::engine::AnalysisContext;
use crate::models::{
    PatternType, PredictionMethod, RiskLevel, SpendingPattern, SpendingPrediction, Transaction,
    Trend, TrendDirection,
};
use crate::patterns::detect_patterns;
use crate::snapshot::{mean, monthly_totals};
use crate::trends::{analyze_trends, TrendReport};

/// Forecast spending per category for `[start, end]`, deriving patterns and
/// trends from the snapshot first.
pub fn predict_spending(
    ctx: &AnalysisContext,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<SpendingPrediction> {
    let patterns = detect_patterns(ctx);
    let trends = analyze_trends(ctx);
    predict_with(ctx, start, end, &patterns, &trends)
}

/// Forecast spending per category for `[start, end]` using precomputed
/// patterns and trends.
///
/// Categories with no expense history before `start` (or a zero historical
/// average) yield no prediction at all rather than a degenerate record.
pub fn predict_with(
    ctx: &AnalysisContext,
    start: NaiveDate,
    end: NaiveDate,
    patterns: &[SpendingPattern],
    trends: &TrendReport,
) -> Vec<SpendingPrediction> {
    let history_cutoff = ctx.months_back(ctx.config.prediction_history_months);

    let mut by_category: BTreeMap<String, Vec<&Transaction>> = BTreeMap::new();
    for tx in ctx.snapshot.expenses_since(history_cutoff) {
        if tx.date >= start {
            continue;
        }
        if let Some(category) = tx.category.clone() {
            by_category.entry(category).or_default().push(tx);
        }
    }

    let forecast_days = (end - start).num_days() + 1;
    if forecast_days <= 0 {
        debug!("empty forecast window, skipping prediction");
        return Vec::new();
    }

    let mut predictions = Vec::new();

    for (category, txs) in by_category {
        let monthly = monthly_totals(txs);
        if monthly.is_empty() {
            continue;
        }
        let monthly_amounts: Vec<f64> = monthly.values().copied().collect();
        let historical_avg = mean(&monthly_amounts) * forecast_days as f64 / 30.0;
        if historical_avg <= 0.0 {
            continue;
        }

        let mut predicted = historical_avg;
        let mut method = PredictionMethod::HistoricalAverage;
        let mut confidence: f64 = 0.5;
        let mut subcategory = None;

        if let Some(pattern) = patterns.iter().find(|p| p.active && p.category == category) {
            predicted = project_pattern(pattern, forecast_days);
            method = PredictionMethod::PatternBased;
            confidence = confidence.max(pattern.confidence);
            subcategory = pattern.subcategory.clone();
        }

        if let Some(trend) = trends.trends.iter().find(|t| t.category == category) {
            predicted = adjust_for_trend(predicted, trend);
            if method != PredictionMethod::PatternBased {
                method = PredictionMethod::TrendBased;
            }
            confidence = confidence.max(trend.strength);
        }

        let risk_level = risk_level(ctx, predicted, historical_avg);
        let is_overspending_risk = predicted > historical_avg * ctx.config.overspend_risk_ratio;

        predictions.push(SpendingPrediction {
            category,
            subcategory,
            forecast_start: start,
            forecast_end: end,
            predicted_amount: predicted,
            confidence,
            method,
            risk_level,
            is_overspending_risk,
        });
    }

    debug!(count = predictions.len(), "spending prediction complete");
    predictions
}

/// Scale a routine's average amount to the forecast window.
fn project_pattern(pattern: &SpendingPattern, forecast_days: i64) -> f64 {
    let days = forecast_days as f64;
    match pattern.pattern_type {
        PatternType::Daily => pattern.average_amount * days * pattern.frequency_per_month / 30.0,
        PatternType::Weekly => pattern.average_amount * days / 7.0,
        PatternType::Monthly => pattern.average_amount * days / 30.0,
    }
}

/// Project a trend forward onto the estimate. Stable trends leave the amount
/// untouched.
fn adjust_for_trend(amount: f64, trend: &Trend) -> f64 {
    match trend.direction {
        TrendDirection::Increasing => {
            let growth_rate =
                (trend.end_amount - trend.start_amount) / trend.start_amount.max(1.0);
            amount * (1.0 + growth_rate * trend.strength)
        }
        TrendDirection::Decreasing => {
            let decline_rate =
                (trend.start_amount - trend.end_amount) / trend.start_amount.max(1.0);
            amount * (1.0 - decline_rate * trend.strength)
        }
        TrendDirection::Stable => amount,
    }
}

fn risk_level(ctx: &AnalysisContext, predicted: f64, historical_avg: f64) -> RiskLevel {
    if historical_avg == 0.0 {
        return RiskLevel::Medium;
    }
    let ratio = predicted / historical_avg;
    if ratio > ctx.config.risk_high_ratio {
        RiskLevel::High
    } else if ratio > ctx.config.risk_medium_ratio {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}
