//! Command implementations

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use spendsense_core::{
    AnalysisContext, AnalyticsEngine, CategoryOverspendingAlert, FinancialNudge, MoneyLeak,
    SavingsProjection, SpendingPattern, SpendingPrediction, TransactionSnapshot, TrendReport,
};

/// Load and sort the snapshot file.
pub fn load_snapshot(path: &Path) -> Result<TransactionSnapshot> {
    let snapshot = TransactionSnapshot::load(path)
        .with_context(|| format!("Failed to load snapshot from {}", path.display()))?;
    tracing::debug!(
        transactions = snapshot.len(),
        path = %path.display(),
        "snapshot loaded"
    );
    Ok(snapshot)
}

/// Resolve the analysis date: --as-of if given, otherwise today (UTC).
pub fn resolve_as_of(as_of: Option<&str>) -> Result<NaiveDate> {
    match as_of {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .context("Invalid --as-of date format (use YYYY-MM-DD)"),
        None => Ok(chrono::Utc::now().date_naive()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

// =============================================================================
// Full report
// =============================================================================

pub fn cmd_report(snapshot: &TransactionSnapshot, today: NaiveDate, json: bool) -> Result<()> {
    let engine = AnalyticsEngine::new();
    let report = engine.run_all(snapshot, today);

    if json {
        return print_json(&report);
    }

    println!();
    println!("🧾 spendsense report (as of {})", today);

    print_patterns(&report.patterns);
    print_trends(&report.trends);
    print_predictions(&report.predictions);
    print_leaks("Top Money Leaks", &report.leaks);
    print_alerts(&report.alerts);
    print_projection(report.projection.as_ref());

    if !report.weekend_overspending.is_empty() {
        println!();
        println!("📅 Weekend Overspending");
        for w in &report.weekend_overspending {
            println!(
                "   {:25} weekend avg ₹{:>8.0} vs weekday ₹{:>8.0} ({:+.0}%) [{}]",
                truncate(&w.category, 25),
                w.weekend_avg,
                w.weekday_avg,
                w.percent_increase,
                w.alert_level
            );
        }
    }

    if let Some(sw) = &report.salary_week {
        println!();
        println!("💸 Salary Week");
        println!(
            "   Salary ₹{:.0} on {}. Week spend ₹{:.0} vs usual ₹{:.0} ({}{:.1}x)",
            sw.salary_amount,
            sw.salary_date,
            sw.salary_week_spending,
            sw.non_salary_week_avg,
            if sw.is_anomaly { "⚠ " } else { "" },
            sw.ratio
        );
    }

    if let Some(me) = &report.month_end {
        println!();
        println!("🌙 Month End");
        println!(
            "   {}: last-week daily ₹{:.0} vs rest ₹{:.0} ({:.2}x)",
            me.behavior, me.month_end_spending / 7.0, me.rest_of_month_daily_avg, me.ratio
        );
    }

    print_nudges(&report.nudges);
    Ok(())
}

// =============================================================================
// Single-analyzer commands
// =============================================================================

pub fn cmd_patterns(snapshot: &TransactionSnapshot, today: NaiveDate, json: bool) -> Result<()> {
    let ctx = AnalysisContext::new(snapshot, today);
    let patterns = spendsense_core::detect_patterns(&ctx);
    if json {
        return print_json(&patterns);
    }
    print_patterns(&patterns);
    Ok(())
}

pub fn cmd_trends(snapshot: &TransactionSnapshot, today: NaiveDate, json: bool) -> Result<()> {
    let ctx = AnalysisContext::new(snapshot, today);
    let report = spendsense_core::analyze_trends(&ctx);
    if json {
        return print_json(&report);
    }
    print_trends(&report);
    Ok(())
}

pub fn cmd_predict(snapshot: &TransactionSnapshot, today: NaiveDate, json: bool) -> Result<()> {
    let ctx = AnalysisContext::new(snapshot, today);
    let (start, end) = spendsense_core::nudges::next_month_window(&ctx);
    let predictions = spendsense_core::predict_spending(&ctx, start, end);
    if json {
        return print_json(&predictions);
    }
    print_predictions(&predictions);
    Ok(())
}

pub fn cmd_leaks(snapshot: &TransactionSnapshot, today: NaiveDate, json: bool) -> Result<()> {
    let ctx = AnalysisContext::new(snapshot, today);
    let leaks = spendsense_core::detect_money_leaks(&ctx);
    if json {
        return print_json(&leaks);
    }
    print_leaks("Top Money Leaks", &leaks);
    Ok(())
}

pub fn cmd_recurring(snapshot: &TransactionSnapshot, today: NaiveDate, json: bool) -> Result<()> {
    let ctx = AnalysisContext::new(snapshot, today);
    let recurring = spendsense_core::detect_regular_monthly_spending(&ctx);
    if json {
        return print_json(&recurring);
    }
    print_leaks("Regular Monthly Spending", &recurring);
    Ok(())
}

pub fn cmd_overspending(
    snapshot: &TransactionSnapshot,
    today: NaiveDate,
    json: bool,
) -> Result<()> {
    let ctx = AnalysisContext::new(snapshot, today);
    let alerts = spendsense_core::detect_overspending(&ctx);
    if json {
        return print_json(&alerts);
    }
    print_alerts(&alerts);
    Ok(())
}

pub fn cmd_savings(snapshot: &TransactionSnapshot, today: NaiveDate, json: bool) -> Result<()> {
    let ctx = AnalysisContext::new(snapshot, today);
    let projection = spendsense_core::project_year_end_savings(&ctx);
    if json {
        return print_json(&projection);
    }
    print_projection(projection.as_ref());
    Ok(())
}

pub fn cmd_nudges(snapshot: &TransactionSnapshot, today: NaiveDate, json: bool) -> Result<()> {
    let ctx = AnalysisContext::new(snapshot, today);
    let nudges = spendsense_core::generate_nudges(&ctx);
    if json {
        return print_json(&nudges);
    }
    print_nudges(&nudges);
    Ok(())
}

// =============================================================================
// Printers
// =============================================================================

fn print_patterns(patterns: &[SpendingPattern]) {
    println!();
    println!("🔁 Spending Patterns");
    if patterns.is_empty() {
        println!("   No recurring routines detected.");
        return;
    }
    println!(
        "   {:8} │ {:22} │ {:16} │ {:>9} │ {:>5}",
        "Type", "Category", "Merchant", "Avg ₹", "Conf"
    );
    println!("   ─────────┼────────────────────────┼──────────────────┼───────────┼──────");
    for p in patterns {
        println!(
            "   {:8} │ {:22} │ {:16} │ {:>9.0} │ {:>4.0}%",
            p.pattern_type.to_string(),
            truncate(&p.category, 22),
            truncate(p.merchant_pattern.as_deref().unwrap_or("-"), 16),
            p.average_amount,
            p.confidence * 100.0
        );
    }
}

fn print_trends(report: &TrendReport) {
    println!();
    println!("📈 Trends");
    if report.trends.is_empty() {
        println!("   Not enough monthly history for any category.");
    }
    for t in &report.trends {
        println!(
            "   {:25} {:10} strength {:.2}  (₹{:.0} → ₹{:.0})",
            truncate(&t.category, 25),
            t.direction.to_string(),
            t.strength,
            t.start_amount,
            t.end_amount
        );
    }
    for s in &report.spikes {
        println!(
            "   ⚡ spike  {} {}: ₹{:.0} (+{:.0}%)",
            s.category, s.month, s.amount, s.percent_delta
        );
    }
    for d in &report.dips {
        println!(
            "   🕳 dip    {} {}: ₹{:.0} (-{:.0}%)",
            d.category, d.month, d.amount, d.percent_delta
        );
    }
}

fn print_predictions(predictions: &[SpendingPrediction]) {
    println!();
    println!("🔮 Spending Predictions");
    if predictions.is_empty() {
        println!("   No categories with usable history.");
        return;
    }
    println!(
        "   {:22} │ {:>10} │ {:18} │ {:6} │ {}",
        "Category", "Predicted", "Method", "Risk", "Overspend?"
    );
    println!("   ───────────────────────┼────────────┼────────────────────┼────────┼───────────");
    for p in predictions {
        println!(
            "   {:22} │ {:>10.0} │ {:18} │ {:6} │ {}",
            truncate(&p.category, 22),
            p.predicted_amount,
            p.method.to_string(),
            p.risk_level.to_string(),
            if p.is_overspending_risk { "⚠ yes" } else { "no" }
        );
    }
}

fn print_leaks(heading: &str, leaks: &[MoneyLeak]) {
    println!();
    println!("💧 {}", heading);
    if leaks.is_empty() {
        println!("   Nothing found.");
        return;
    }
    for leak in leaks {
        match leak.rank {
            Some(rank) => println!("   #{} {}", rank, leak.title),
            None => println!("   •  {}", leak.title),
        }
        println!(
            "      ₹{:.0}/month · ₹{:.0}/year · {} transactions",
            leak.monthly_amount, leak.annual_amount, leak.transaction_count
        );
        println!("      {}", leak.suggestion);
    }
}

fn print_alerts(alerts: &[CategoryOverspendingAlert]) {
    println!();
    println!("🚨 Overspending Alerts");
    if alerts.is_empty() {
        println!("   All categories within their usual range.");
        return;
    }
    for a in alerts {
        println!(
            "   [{}] {}: ₹{:.0} so far ({:+.0}% vs avg ₹{:.0}), projected ₹{:.0}",
            a.alert_level.to_string().to_uppercase(),
            a.category,
            a.current_amount,
            a.percent_increase,
            a.historical_avg,
            a.projected_monthly
        );
    }
}

fn print_projection(projection: Option<&SavingsProjection>) {
    println!();
    println!("🏦 Savings Projection");
    match projection {
        None => println!("   Not enough transaction history."),
        Some(p) => {
            println!(
                "   Income ₹{:.0}/mo − expenses ₹{:.0}/mo + investments ₹{:.0}/mo = ₹{:.0}/mo",
                p.monthly_income_avg,
                p.monthly_expense_avg,
                p.monthly_investment_avg,
                p.monthly_savings_rate
            );
            println!(
                "   Saved so far: ₹{:.0}. Projected year-end: ₹{:.0} ({} months left, adj {:.2}, confidence {:.0}%)",
                p.current_savings,
                p.projected_year_end,
                p.remaining_months,
                p.trend_adjustment_factor,
                p.confidence * 100.0
            );
        }
    }
}

fn print_nudges(nudges: &[FinancialNudge]) {
    println!();
    println!("💡 Nudges");
    if nudges.is_empty() {
        println!("   Nothing to flag right now.");
        return;
    }
    for n in nudges {
        println!("   [{}] {}", n.priority.to_string().to_uppercase(), n.title);
        println!("      {}", n.message);
        println!("      → {}", n.suggestion);
    }
}
