//! Behavioral habit analyzers
//!
//! Three smaller lenses on the current month's behavior: weekend vs weekday
//! imbalance per category, post-salary splurging, and end-of-month scarcity.
//! Like everything else they are pure functions of the snapshot; the
//! month-end analyzer additionally takes prior analyses so pattern strength
//! stays a function of inputs, not of hidden storage.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use tracing::debug;

use crate::engine::AnalysisContext;
use crate::models::{
    AlertLevel, MonthEndBehavior, MonthEndScarcity, MonthKey, SalaryWeekAnalysis, Transaction,
    TrendDirection, WeekendOverspending,
};
use crate::narration::is_investment_transaction;
use crate::snapshot::mean;

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Flag categories whose weekend purchases run well above their weekday
/// ones in the current month.
pub fn analyze_weekend_overspending(ctx: &AnalysisContext) -> Vec<WeekendOverspending> {
    let config = &ctx.config;
    let month = MonthKey::from_date(ctx.today);

    let mut by_category: BTreeMap<String, Vec<&Transaction>> = BTreeMap::new();
    for tx in ctx
        .snapshot
        .expenses_between(month.first_day(), month.last_day())
        .filter(|t| !is_investment_transaction(t))
    {
        if let Some(category) = tx.category.clone() {
            by_category.entry(category).or_default().push(tx);
        }
    }

    let mut results = Vec::new();

    for (category, txs) in by_category {
        let weekend: Vec<f64> = txs
            .iter()
            .filter(|t| is_weekend(t.date))
            .map(|t| t.magnitude())
            .collect();
        let weekday: Vec<f64> = txs
            .iter()
            .filter(|t| !is_weekend(t.date))
            .map(|t| t.magnitude())
            .collect();

        if weekend.is_empty() || weekday.is_empty() {
            continue;
        }

        let weekend_avg = mean(&weekend);
        let weekday_avg = mean(&weekday);
        if weekday_avg == 0.0 {
            continue;
        }

        let ratio = weekend_avg / weekday_avg;
        if ratio <= config.weekend_ratio_cutoff {
            continue;
        }

        let alert_level = if ratio > config.weekend_high_ratio {
            AlertLevel::High
        } else {
            AlertLevel::Medium
        };

        results.push(WeekendOverspending {
            trend: weekend_trend(ctx, &category),
            category,
            weekend_spending: weekend.iter().sum(),
            weekend_avg,
            weekday_spending: weekday.iter().sum(),
            weekday_avg,
            ratio,
            percent_increase: (ratio - 1.0) * 100.0,
            month,
            alert_level,
        });
    }

    debug!(count = results.len(), "weekend overspending analysis complete");
    results
}

/// Direction of the category's weekend spend over the last three months,
/// comparing the last monthly total against the first with a ±10% band.
fn weekend_trend(ctx: &AnalysisContext, category: &str) -> TrendDirection {
    let cutoff = ctx.months_back(3);
    let mut monthly: BTreeMap<MonthKey, f64> = BTreeMap::new();
    for tx in ctx
        .snapshot
        .expenses_since(cutoff)
        .filter(|t| t.category.as_deref() == Some(category))
        .filter(|t| !is_investment_transaction(t))
        .filter(|t| is_weekend(t.date))
    {
        *monthly.entry(MonthKey::from_date(tx.date)).or_insert(0.0) += tx.magnitude();
    }

    if monthly.len() < 2 {
        return TrendDirection::Stable;
    }

    let amounts: Vec<f64> = monthly.values().copied().collect();
    let first = amounts[0];
    let last = amounts[amounts.len() - 1];

    if last > first * 1.1 {
        TrendDirection::Increasing
    } else if last < first * 0.9 {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Stable
    }
}

struct SalaryDetection {
    date: NaiveDate,
    amount: f64,
    confidence: f64,
}

/// Compare spending in the week after the latest salary credit against the
/// non-salary-week baseline. `None` when no salary can be identified or no
/// baseline exists.
pub fn analyze_salary_week(ctx: &AnalysisContext) -> Option<SalaryWeekAnalysis> {
    let salary = detect_salary(ctx)?;

    let week_start = salary.date;
    let week_end = salary.date + Duration::days(6);

    let salary_week_spending: f64 = ctx
        .snapshot
        .expenses_between(week_start, week_end)
        .map(|t| t.magnitude())
        .sum();

    let non_salary_week_avg = non_salary_week_average(ctx, salary.date);
    if non_salary_week_avg == 0.0 {
        debug!("no non-salary-week baseline, skipping salary week analysis");
        return None;
    }

    let ratio = salary_week_spending / non_salary_week_avg;

    Some(SalaryWeekAnalysis {
        salary_date: salary.date,
        salary_amount: salary.amount,
        week_start,
        week_end,
        salary_week_spending,
        non_salary_week_avg,
        ratio,
        extra_spending: salary_week_spending - non_salary_week_avg,
        month: MonthKey::from_date(salary.date),
        is_anomaly: ratio > ctx.config.salary_week_ratio,
        confidence: salary.confidence,
    })
}

/// Find the salary: a deposit amount recurring roughly monthly. Falls back
/// to the most recent large deposit at low confidence.
fn detect_salary(ctx: &AnalysisContext) -> Option<SalaryDetection> {
    let deposits: Vec<&Transaction> = ctx
        .snapshot
        .since(ctx.history_start())
        .filter(|t| t.amount > 0.0)
        .collect();

    if deposits.is_empty() {
        return None;
    }

    let mut by_amount: BTreeMap<String, Vec<&Transaction>> = BTreeMap::new();
    for tx in &deposits {
        by_amount.entry(format!("{:.0}", tx.amount)).or_default().push(tx);
    }

    // Highest recurring amount wins; salary is normally the largest
    // recurring credit
    let mut best: Option<SalaryDetection> = None;
    for txs in by_amount.values() {
        if txs.len() < 3 || !recurs_monthly_loosely(txs) {
            continue;
        }
        let latest = txs.iter().max_by_key(|t| t.date)?;
        let candidate = SalaryDetection {
            date: latest.date,
            amount: latest.amount,
            confidence: salary_confidence(txs),
        };
        if best.as_ref().map(|b| candidate.amount > b.amount).unwrap_or(true) {
            best = Some(candidate);
        }
    }
    if best.is_some() {
        return best;
    }

    // Fallback: the most recent deposit, if it is big enough to plausibly
    // be a paycheck
    let most_recent = deposits.iter().max_by_key(|t| t.date)?;
    if most_recent.amount > ctx.config.salary_min_deposit {
        return Some(SalaryDetection {
            date: most_recent.date,
            amount: most_recent.amount,
            confidence: 0.5,
        });
    }

    None
}

/// Looser gap window than subscription detection: salaries drift with
/// weekends and holidays.
fn recurs_monthly_loosely(transactions: &[&Transaction]) -> bool {
    let mut dates: Vec<NaiveDate> = transactions.iter().map(|t| t.date).collect();
    dates.sort();
    dates.windows(2).all(|w| {
        let gap = (w[1] - w[0]).num_days();
        (25..=35).contains(&gap)
    })
}

/// Blend of occurrence count and amount consistency.
fn salary_confidence(transactions: &[&Transaction]) -> f64 {
    let occurrence_score = (transactions.len() as f64 / 6.0).min(1.0);

    let amounts: Vec<f64> = transactions.iter().map(|t| t.amount).collect();
    let avg = mean(&amounts);
    let variance = crate::snapshot::population_variance(&amounts, avg);
    let consistency_score = (1.0 - variance / (avg * avg + 1.0)).max(0.0);

    occurrence_score * 0.6 + consistency_score * 0.4
}

/// Average weekly spend over the trailing three months, excluding the week
/// of the salary credit.
fn non_salary_week_average(ctx: &AnalysisContext, salary_date: NaiveDate) -> f64 {
    let cutoff = ctx.months_back(3);
    let mut by_week: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for tx in ctx.snapshot.expenses_since(cutoff) {
        let week = tx.date - Duration::days(tx.date.weekday().num_days_from_monday() as i64);
        *by_week.entry(week).or_insert(0.0) += tx.magnitude();
    }

    let salary_week_end = salary_date + Duration::days(6);
    let totals: Vec<f64> = by_week
        .iter()
        .filter(|(week_start, _)| **week_start < salary_date || **week_start > salary_week_end)
        .map(|(_, total)| *total)
        .collect();

    mean(&totals)
}

/// Classify how the current month's last days compare to the rest of it.
/// Prior analyses feed the pattern-strength figures.
pub fn analyze_month_end(
    ctx: &AnalysisContext,
    past: &[MonthEndScarcity],
) -> Option<MonthEndScarcity> {
    let config = &ctx.config;
    let month = MonthKey::from_date(ctx.today);
    let month_start = month.first_day();
    let month_end = month.last_day();
    let window_start = month_end - Duration::days(config.month_end_days - 1);

    let txs: Vec<&Transaction> = ctx
        .snapshot
        .expenses_between(month_start, month_end)
        .collect();
    if txs.is_empty() {
        return None;
    }

    let month_end_spending: f64 = txs
        .iter()
        .filter(|t| t.date >= window_start)
        .map(|t| t.magnitude())
        .sum();
    let rest_spending: f64 = txs
        .iter()
        .filter(|t| t.date < window_start)
        .map(|t| t.magnitude())
        .sum();

    let rest_days = (window_start - month_start).num_days();
    if rest_days <= 0 || rest_spending == 0.0 {
        return None;
    }

    let month_end_daily = month_end_spending / config.month_end_days as f64;
    let rest_daily = rest_spending / rest_days as f64;
    let ratio = month_end_daily / rest_daily;

    let behavior = if ratio < config.scarcity_ratio {
        MonthEndBehavior::Scarcity
    } else if ratio > config.month_end_overspend_ratio {
        MonthEndBehavior::Overspend
    } else {
        MonthEndBehavior::Normal
    };

    let matching = past.iter().filter(|a| a.behavior == behavior).count();
    let pattern_strength = if past.is_empty() {
        0.5
    } else {
        (matching as f64 / past.len().min(6) as f64).min(1.0)
    };

    let past_reductions: Vec<f64> = past
        .iter()
        .filter(|a| a.behavior == MonthEndBehavior::Scarcity && a.ratio < 1.0)
        .map(|a| (1.0 - a.ratio) * 100.0)
        .collect();

    let analysis = MonthEndScarcity {
        month,
        month_end_spending,
        rest_of_month_daily_avg: rest_daily,
        ratio,
        average_reduction_pct: mean(&past_reductions),
        behavior,
        reduced_spending: ratio < config.scarcity_ratio,
        credit_spike: detect_credit_spike(ctx, window_start, month_end),
        savings_withdrawal: detect_savings_withdrawal(ctx, window_start, month_end),
        borrowing_increase: detect_borrowing(ctx, window_start, month_end),
        pattern_strength,
        months_detected: matching,
    };

    debug!(behavior = %analysis.behavior, ratio = analysis.ratio, "month-end analysis complete");
    Some(analysis)
}

/// Credit-card usage clustering at month end: the window's count of
/// "CREDIT"-marked transactions exceeds twice the daily average of the 20
/// preceding days.
fn detect_credit_spike(ctx: &AnalysisContext, start: NaiveDate, end: NaiveDate) -> bool {
    let window_count = ctx
        .snapshot
        .between(start, end)
        .filter(|t| t.narration.to_uppercase().contains("CREDIT"))
        .count();

    let before_count = ctx
        .snapshot
        .between(start - Duration::days(20), start - Duration::days(1))
        .filter(|t| t.narration.to_uppercase().contains("CREDIT"))
        .count();

    if before_count == 0 {
        return window_count > 0;
    }

    window_count as f64 > before_count as f64 / 20.0 * 2.0
}

fn detect_savings_withdrawal(ctx: &AnalysisContext, start: NaiveDate, end: NaiveDate) -> bool {
    ctx.snapshot.between(start, end).any(|t| {
        let narration = t.narration.to_uppercase();
        t.is_expense()
            && (narration.contains("SAVINGS")
                || narration.contains("FD")
                || narration.contains("DEPOSIT"))
    })
}

fn detect_borrowing(ctx: &AnalysisContext, start: NaiveDate, end: NaiveDate) -> bool {
    ctx.snapshot.between(start, end).any(|t| {
        let narration = t.narration.to_uppercase();
        narration.contains("LOAN")
            || narration.contains("BORROW")
            || narration.contains("CREDIT LIMIT")
    })
}
