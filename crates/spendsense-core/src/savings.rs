//! Year-end savings projection
//!
//! Projects net savings at year end from trailing monthly income, expense,
//! and investment averages. Investment debits count toward savings, not
//! consumption. The projection is adjusted by how the current month is
//! tracking against the historical expense average.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use crate::engine::AnalysisContext;
use crate::models::{MonthKey, SavingsProjection, Transaction};
use crate::narration::{is_income_transaction, is_investment_transaction};
use crate::snapshot::{mean, population_variance};

/// Monthly sums of the three money classes the projector cares about.
#[derive(Debug, Default, Clone, Copy)]
struct MonthlyFlows {
    income: f64,
    expense: f64,
    investment: f64,
}

impl MonthlyFlows {
    fn net(&self) -> f64 {
        self.income - self.expense + self.investment
    }
}

fn classify_flows<'a>(
    transactions: impl Iterator<Item = &'a Transaction>,
) -> BTreeMap<MonthKey, MonthlyFlows> {
    let mut flows: BTreeMap<MonthKey, MonthlyFlows> = BTreeMap::new();
    for tx in transactions {
        let entry = flows.entry(MonthKey::from_date(tx.date)).or_default();
        if tx.amount > 0.0 {
            entry.income += tx.amount;
        } else if is_investment_transaction(tx) {
            entry.investment += tx.magnitude();
        } else if !is_income_transaction(tx) {
            entry.expense += tx.magnitude();
        }
        // Debits that look like mislabeled income fall into no bucket
    }
    flows
}

/// Project savings through the end of the current year.
///
/// Returns `None` when the trailing window holds no transactions at all;
/// a projection from nothing would be noise, not signal.
pub fn project_year_end_savings(ctx: &AnalysisContext) -> Option<SavingsProjection> {
    let window: Vec<&Transaction> = ctx.snapshot.since(ctx.history_start()).collect();
    if window.is_empty() {
        debug!("no transactions in window, skipping savings projection");
        return None;
    }

    let flows = classify_flows(window.iter().copied());

    let income_months: Vec<f64> = flows.values().map(|f| f.income).filter(|v| *v > 0.0).collect();
    let expense_months: Vec<f64> = flows.values().map(|f| f.expense).filter(|v| *v > 0.0).collect();
    let investment_months: Vec<f64> =
        flows.values().map(|f| f.investment).filter(|v| *v > 0.0).collect();

    let monthly_income_avg = mean(&income_months);
    let monthly_expense_avg = mean(&expense_months);
    let monthly_investment_avg = mean(&investment_months);
    let monthly_savings_rate = monthly_income_avg - monthly_expense_avg + monthly_investment_avg;

    let current_savings = current_year_savings(ctx);

    let remaining_months = 12 - ctx.today.month();
    let trend_adjustment_factor = trend_adjustment(ctx, monthly_expense_avg);
    let projected_additional_savings =
        monthly_savings_rate * remaining_months as f64 * trend_adjustment_factor;
    let projected_year_end = current_savings + projected_additional_savings;

    let confidence = confidence_score(ctx, &flows);

    debug!(
        projected_year_end,
        confidence, trend_adjustment_factor, "savings projection complete"
    );

    Some(SavingsProjection {
        month: ctx.today.month(),
        year: ctx.today.year(),
        current_savings,
        monthly_income_avg,
        monthly_expense_avg,
        monthly_investment_avg,
        monthly_savings_rate,
        remaining_months,
        projected_additional_savings,
        projected_year_end,
        confidence,
        trend_adjustment_factor,
    })
}

/// Sum of positive monthly nets since January 1st.
fn current_year_savings(ctx: &AnalysisContext) -> f64 {
    let year_start = NaiveDate::from_ymd_opt(ctx.today.year(), 1, 1)
        .expect("January 1st always exists");
    let flows = classify_flows(ctx.snapshot.between(year_start, ctx.today));
    flows.values().map(MonthlyFlows::net).filter(|net| *net > 0.0).sum()
}

/// Shrinks the projection toward the floor as current-month spend runs over
/// the historical average, and stretches it toward the ceiling when under.
fn trend_adjustment(ctx: &AnalysisContext, monthly_expense_avg: f64) -> f64 {
    if monthly_expense_avg <= 0.0 {
        return 1.0;
    }

    let month = MonthKey::from_date(ctx.today);
    let spent_so_far: f64 = ctx
        .snapshot
        .expenses_between(month.first_day(), ctx.today)
        .filter(|t| !is_investment_transaction(t) && !is_income_transaction(t))
        .map(|t| t.magnitude())
        .sum();

    let days_elapsed = ctx.today.day() as f64;
    let projected_current = spent_so_far / days_elapsed * month.days_in_month() as f64;

    let ratio = projected_current / monthly_expense_avg;
    if ratio > 1.0 {
        (1.0 - (ratio - 1.0) * 0.1).max(ctx.config.projection_floor)
    } else {
        (1.0 + (1.0 - ratio) * 0.05).min(ctx.config.projection_ceiling)
    }
}

/// Blend of a months-of-data score and a month-to-month consistency score.
fn confidence_score(ctx: &AnalysisContext, flows: &BTreeMap<MonthKey, MonthlyFlows>) -> f64 {
    let months_score = (flows.len() as f64 / ctx.config.history_months as f64).min(1.0);

    if flows.len() < 2 {
        return months_score * 0.5;
    }

    let nets: Vec<f64> = flows.values().map(MonthlyFlows::net).collect();
    let net_mean = mean(&nets);
    let variance = population_variance(&nets, net_mean);
    let consistency = (1.0 - variance / (net_mean.abs() + 1.0)).max(0.0);

    (months_score * 0.6 + consistency * 0.4).clamp(0.0, 1.0)
}
