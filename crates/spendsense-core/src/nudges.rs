//! Financial nudges
//!
//! Turns the run's derived artifacts into short, prioritized, user-facing
//! messages. Generation is deterministic and append-only per run; expiry
//! (7 days) is what keeps the feed fresh, not deduplication.

use chrono::{Duration, Weekday};
use tracing::debug;

use crate::engine::AnalysisContext;
use crate::models::{
    FinancialNudge, MonthKey, NudgePriority, NudgeType, PatternType, PredictionMethod, RiskLevel,
    SpendingPattern, SpendingPrediction,
};
use crate::patterns::detect_patterns;
use crate::predict::predict_spending;
use crate::snapshot::{mean, monthly_totals};

/// Generate nudges from scratch: detects patterns and predicts next month's
/// spending, then synthesizes messages.
pub fn generate_nudges(ctx: &AnalysisContext) -> Vec<FinancialNudge> {
    let patterns = detect_patterns(ctx);
    let (start, end) = next_month_window(ctx);
    let predictions = predict_spending(ctx, start, end);
    generate_nudges_with(ctx, &predictions, &patterns)
}

/// Generate nudges from precomputed predictions and patterns.
pub fn generate_nudges_with(
    ctx: &AnalysisContext,
    predictions: &[SpendingPrediction],
    patterns: &[SpendingPattern],
) -> Vec<FinancialNudge> {
    let mut nudges = Vec::new();

    nudges.extend(overspending_nudges(ctx, predictions));
    nudges.extend(pattern_nudges(ctx, patterns));
    nudges.extend(trend_nudges(ctx, predictions));
    nudges.extend(savings_opportunity_nudges(ctx, patterns));

    debug!(count = nudges.len(), "nudge generation complete");
    nudges
}

/// First and last day of the month after `ctx.today`.
pub fn next_month_window(ctx: &AnalysisContext) -> (chrono::NaiveDate, chrono::NaiveDate) {
    let current = MonthKey::from_date(ctx.today);
    let next = if current.month == 12 {
        MonthKey { year: current.year + 1, month: 1 }
    } else {
        MonthKey { year: current.year, month: current.month + 1 }
    };
    (next.first_day(), next.last_day())
}

fn base_nudge(ctx: &AnalysisContext, nudge_type: NudgeType, priority: NudgePriority) -> FinancialNudge {
    let created_at = ctx.timestamp();
    FinancialNudge {
        nudge_type,
        title: String::new(),
        message: String::new(),
        suggestion: String::new(),
        category: None,
        subcategory: None,
        related_amount: 0.0,
        priority,
        read: false,
        dismissed: false,
        created_at,
        expires_at: created_at + Duration::days(ctx.config.nudge_ttl_days),
    }
}

fn overspending_nudges(
    ctx: &AnalysisContext,
    predictions: &[SpendingPrediction],
) -> Vec<FinancialNudge> {
    let mut nudges = Vec::new();

    for prediction in predictions.iter().filter(|p| p.is_overspending_risk) {
        let priority = if prediction.risk_level == RiskLevel::High {
            NudgePriority::High
        } else {
            NudgePriority::Medium
        };

        let recent_avg = recent_monthly_average(ctx, &prediction.category);
        let message = if recent_avg > 0.0 {
            format!(
                "Your {} spending is on track to hit ₹{:.0} next period, about {:.0}% above your recent average.",
                prediction.category,
                prediction.predicted_amount,
                (prediction.predicted_amount / recent_avg - 1.0) * 100.0
            )
        } else {
            format!(
                "Your {} spending is predicted at ₹{:.0} for the next period.",
                prediction.category, prediction.predicted_amount
            )
        };

        let mut nudge = base_nudge(ctx, NudgeType::OverspendingRisk, priority);
        nudge.title = format!("Overspending Alert: {}", prediction.category);
        nudge.message = message;
        nudge.suggestion = overspending_suggestion(&prediction.category).to_string();
        nudge.category = Some(prediction.category.clone());
        nudge.subcategory = prediction.subcategory.clone();
        nudge.related_amount = prediction.predicted_amount;
        nudges.push(nudge);
    }

    nudges
}

fn pattern_nudges(ctx: &AnalysisContext, patterns: &[SpendingPattern]) -> Vec<FinancialNudge> {
    let recency_cutoff = ctx.today - Duration::days(7);
    let mut nudges = Vec::new();

    for pattern in patterns
        .iter()
        .filter(|p| p.active && p.detected_on > recency_cutoff)
    {
        let subcategory_suffix = pattern
            .subcategory
            .as_deref()
            .map(|s| format!(" - {}", s))
            .unwrap_or_default();

        let mut nudge = base_nudge(ctx, NudgeType::PatternDetected, NudgePriority::Low);
        nudge.title = "New Spending Pattern Detected".to_string();
        nudge.message = format!(
            "We noticed you regularly spend ₹{:.0} on {}{}. This happens {}.",
            pattern.average_amount,
            pattern.category,
            subcategory_suffix,
            frequency_phrase(pattern)
        );
        nudge.suggestion =
            "This pattern helps us predict your future spending. Keep an eye on it!".to_string();
        nudge.category = Some(pattern.category.clone());
        nudge.subcategory = pattern.subcategory.clone();
        nudge.related_amount = pattern.average_amount;
        nudges.push(nudge);
    }

    nudges
}

fn trend_nudges(ctx: &AnalysisContext, predictions: &[SpendingPrediction]) -> Vec<FinancialNudge> {
    let mut nudges = Vec::new();

    for prediction in predictions
        .iter()
        .filter(|p| p.method == PredictionMethod::TrendBased && p.risk_level == RiskLevel::High)
    {
        let mut nudge = base_nudge(ctx, NudgeType::TrendWarning, NudgePriority::Medium);
        nudge.title = format!("Unusual Spending Trend: {}", prediction.category);
        nudge.message = format!(
            "We've detected an unusual trend in your {} spending. It is increasing faster than usual.",
            prediction.category
        );
        nudge.suggestion =
            "Review your recent transactions in this category to understand the increase."
                .to_string();
        nudge.category = Some(prediction.category.clone());
        nudge.related_amount = prediction.predicted_amount;
        nudges.push(nudge);
    }

    nudges
}

fn savings_opportunity_nudges(
    ctx: &AnalysisContext,
    patterns: &[SpendingPattern],
) -> Vec<FinancialNudge> {
    let config = &ctx.config;
    let mut nudges = Vec::new();

    for pattern in patterns.iter().filter(|p| {
        p.active
            && p.frequency_per_month > config.savings_nudge_min_frequency
            && p.average_amount > config.savings_nudge_min_amount
    }) {
        let monthly_spend = pattern.average_amount * pattern.frequency_per_month;
        if monthly_spend <= config.savings_nudge_min_monthly {
            continue;
        }

        let mut nudge = base_nudge(ctx, NudgeType::SavingsOpportunity, NudgePriority::Low);
        nudge.title = format!("Savings Opportunity: {}", pattern.category);
        nudge.message = format!(
            "You spend about ₹{:.0} per month on {}. Small changes here could add up to significant savings.",
            monthly_spend, pattern.category
        );
        nudge.suggestion =
            "Consider setting a monthly budget for this category or looking for alternatives."
                .to_string();
        nudge.category = Some(pattern.category.clone());
        nudge.subcategory = pattern.subcategory.clone();
        nudge.related_amount = monthly_spend;
        nudges.push(nudge);
    }

    nudges
}

/// Average monthly spend in a category over the trailing three months.
fn recent_monthly_average(ctx: &AnalysisContext, category: &str) -> f64 {
    let cutoff = ctx.months_back(3);
    let totals = monthly_totals(
        ctx.snapshot
            .expenses_since(cutoff)
            .filter(|t| t.category.as_deref() == Some(category)),
    );
    let amounts: Vec<f64> = totals.values().copied().collect();
    mean(&amounts)
}

fn overspending_suggestion(category: &str) -> &'static str {
    if category.contains("Dining") || category.contains("Food") {
        "Try meal planning or cooking at home more often to reduce dining expenses."
    } else if category.contains("Transport") {
        "Consider carpooling or using public transport to save on transportation costs."
    } else if category.contains("Shopping") {
        "Wait 24 hours before making non-essential purchases to avoid impulse buying."
    } else {
        "Review your recent transactions in this category and identify areas where you can cut back."
    }
}

fn frequency_phrase(pattern: &SpendingPattern) -> String {
    match pattern.pattern_type {
        PatternType::Daily => "almost daily".to_string(),
        PatternType::Weekly => match pattern.day_of_week {
            Some(day) => format!("every {}", weekday_name(day)),
            None => "weekly".to_string(),
        },
        PatternType::Monthly => match pattern.day_of_month {
            Some(day) => format!("on day {} of each month", day),
            None => "monthly".to_string(),
        },
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}
