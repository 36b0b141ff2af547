//! Analytics engine
//!
//! `AnalysisContext` carries everything an analyzer may read: the snapshot,
//! the analysis date, and the thresholds. No analyzer touches a clock or any
//! storage, which is what makes a run reproducible and lets per-user runs
//! parallelize trivially on the caller's side.
//!
//! `AnalyticsEngine::run_all` executes the full dependency order:
//! patterns/trends first, then predictions, then leaks/alerts/projection and
//! the habit analyzers, and nudges last. The report it returns is the unit a
//! persistence layer would swap in atomically (deactivate the previous run's
//! artifacts, insert these).

use chrono::{DateTime, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::AnalyticsConfig;
use crate::habits::{analyze_month_end, analyze_salary_week, analyze_weekend_overspending};
use crate::leaks::{detect_money_leaks, detect_regular_monthly_spending};
use crate::models::{
    CategoryOverspendingAlert, FinancialNudge, MoneyLeak, MonthEndScarcity, SalaryWeekAnalysis,
    SavingsProjection, SpendingPattern, SpendingPrediction, WeekendOverspending,
};
use crate::nudges::{generate_nudges_with, next_month_window};
use crate::overspending::detect_overspending;
use crate::patterns::detect_patterns;
use crate::predict::predict_with;
use crate::savings::project_year_end_savings;
use crate::snapshot::TransactionSnapshot;
use crate::trends::{analyze_trends, TrendReport};

/// Context provided to every analyzer
pub struct AnalysisContext<'a> {
    /// The user's transaction history
    pub snapshot: &'a TransactionSnapshot,
    /// The analysis date; windows and "current month" derive from this
    pub today: NaiveDate,
    /// Heuristic thresholds
    pub config: AnalyticsConfig,
}

impl<'a> AnalysisContext<'a> {
    /// Context with default thresholds.
    pub fn new(snapshot: &'a TransactionSnapshot, today: NaiveDate) -> Self {
        Self::with_config(snapshot, today, AnalyticsConfig::default())
    }

    pub fn with_config(
        snapshot: &'a TransactionSnapshot,
        today: NaiveDate,
        config: AnalyticsConfig,
    ) -> Self {
        Self {
            snapshot,
            today,
            config,
        }
    }

    /// Start of the standard trailing history window.
    pub fn history_start(&self) -> NaiveDate {
        self.months_back(self.config.history_months)
    }

    /// The date `months` calendar months before the analysis date.
    pub fn months_back(&self, months: u32) -> NaiveDate {
        self.today
            .checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Timestamp for artifacts created by this run: midnight UTC of the
    /// analysis date, so identical inputs give identical output.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.today
            .and_hms_opt(0, 0, 0)
            .expect("midnight always valid")
            .and_utc()
    }
}

/// Complete output of one analysis run for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub generated_on: NaiveDate,
    pub forecast_start: NaiveDate,
    pub forecast_end: NaiveDate,
    pub patterns: Vec<SpendingPattern>,
    pub trends: TrendReport,
    pub predictions: Vec<SpendingPrediction>,
    pub leaks: Vec<MoneyLeak>,
    pub recurring: Vec<MoneyLeak>,
    pub alerts: Vec<CategoryOverspendingAlert>,
    pub projection: Option<SavingsProjection>,
    pub weekend_overspending: Vec<WeekendOverspending>,
    pub salary_week: Option<SalaryWeekAnalysis>,
    pub month_end: Option<MonthEndScarcity>,
    pub nudges: Vec<FinancialNudge>,
}

/// Runs the whole pipeline in dependency order.
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self {
            config: AnalyticsConfig::default(),
        }
    }

    pub fn with_config(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    /// Run every analyzer against the snapshot as of `today`.
    pub fn run_all(&self, snapshot: &TransactionSnapshot, today: NaiveDate) -> AnalysisReport {
        self.run_with_prior(snapshot, today, &[])
    }

    /// Same as [`run_all`](Self::run_all), with prior month-end analyses so
    /// the scarcity pattern-strength figures can accumulate across months.
    pub fn run_with_prior(
        &self,
        snapshot: &TransactionSnapshot,
        today: NaiveDate,
        prior_month_end: &[MonthEndScarcity],
    ) -> AnalysisReport {
        let ctx = AnalysisContext::with_config(snapshot, today, self.config.clone());

        let patterns = detect_patterns(&ctx);
        let trends = analyze_trends(&ctx);

        let (forecast_start, forecast_end) = next_month_window(&ctx);
        let predictions = predict_with(&ctx, forecast_start, forecast_end, &patterns, &trends);

        let leaks = detect_money_leaks(&ctx);
        let recurring = detect_regular_monthly_spending(&ctx);
        let alerts = detect_overspending(&ctx);
        let projection = project_year_end_savings(&ctx);

        let weekend_overspending = analyze_weekend_overspending(&ctx);
        let salary_week = analyze_salary_week(&ctx);
        let month_end = analyze_month_end(&ctx, prior_month_end);

        let nudges = generate_nudges_with(&ctx, &predictions, &patterns);

        info!(
            transactions = snapshot.len(),
            patterns = patterns.len(),
            trends = trends.trends.len(),
            predictions = predictions.len(),
            leaks = leaks.len(),
            alerts = alerts.len(),
            nudges = nudges.len(),
            "analysis run complete"
        );

        AnalysisReport {
            generated_on: today,
            forecast_start,
            forecast_end,
            patterns,
            trends,
            predictions,
            leaks,
            recurring,
            alerts,
            projection,
            weekend_overspending,
            salary_week,
            month_end,
            nudges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot_yields_empty_report() {
        let snapshot = TransactionSnapshot::new(vec![]);
        let engine = AnalyticsEngine::new();
        let report = engine.run_all(&snapshot, "2026-06-20".parse().unwrap());

        assert!(report.patterns.is_empty());
        assert!(report.trends.trends.is_empty());
        assert!(report.predictions.is_empty());
        assert!(report.leaks.is_empty());
        assert!(report.alerts.is_empty());
        assert!(report.projection.is_none());
        assert!(report.salary_week.is_none());
        assert!(report.month_end.is_none());
        assert!(report.nudges.is_empty());
    }

    #[test]
    fn test_forecast_window_is_next_month() {
        let snapshot = TransactionSnapshot::new(vec![]);
        let engine = AnalyticsEngine::new();
        let report = engine.run_all(&snapshot, "2026-12-15".parse().unwrap());
        assert_eq!(report.forecast_start, "2027-01-01".parse().unwrap());
        assert_eq!(report.forecast_end, "2027-01-31".parse().unwrap());
    }

    #[test]
    fn test_run_is_deterministic() {
        let snapshot = TransactionSnapshot::new(crate::test_utils::sample_history());
        let engine = AnalyticsEngine::new();
        let today: NaiveDate = "2026-06-20".parse().unwrap();

        let first = serde_json::to_string(&engine.run_all(&snapshot, today)).unwrap();
        let second = serde_json::to_string(&engine.run_all(&snapshot, today)).unwrap();
        assert_eq!(first, second);
    }
}
