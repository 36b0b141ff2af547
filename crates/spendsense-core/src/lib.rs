//! spendsense Core Library
//!
//! Rule-based financial analytics over a user's transaction history:
//! - Recurring spending pattern detection (daily/weekly/monthly routines)
//! - Per-category trend analysis with spike/dip months
//! - Next-period spending prediction with risk classification
//! - Money leak detection (subscriptions, small-frequent purchases, ATM
//!   spikes, friend-covering, one-time hits, impulse clusters)
//! - Category overspending alerts against the trailing baseline
//! - Year-end savings projection
//! - Behavioral habit analysis (weekend, salary week, month-end)
//! - Prioritized user-facing nudges
//!
//! The engine is deliberately explainable and threshold-driven rather than
//! statistically rigorous; every output can be traced to a rule. It is also
//! pure: callers supply the transaction snapshot and the analysis date, and
//! the engine returns derived collections without touching storage or a
//! clock. Category labels on transactions come from an upstream classifier
//! and are never recomputed here.

pub mod config;
pub mod engine;
pub mod error;
pub mod habits;
pub mod leaks;
pub mod models;
pub mod narration;
pub mod nudges;
pub mod overspending;
pub mod patterns;
pub mod predict;
pub mod savings;
pub mod snapshot;
pub mod trends;

/// Test utilities including transaction builders
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::AnalyticsConfig;
pub use engine::{AnalysisContext, AnalysisReport, AnalyticsEngine};
pub use error::{Error, Result};
pub use habits::{analyze_month_end, analyze_salary_week, analyze_weekend_overspending};
pub use leaks::{detect_money_leaks, detect_regular_monthly_spending};
pub use models::{
    AlertLevel, CategoryOverspendingAlert, FinancialNudge, LeakType, MoneyLeak, MonthEndBehavior,
    MonthEndScarcity, MonthKey, NudgePriority, NudgeType, PatternType, PredictionMethod,
    RiskLevel, SalaryWeekAnalysis, SavingsProjection, SpendingDip, SpendingPattern,
    SpendingPrediction, SpendingSpike, Transaction, Trend, TrendDirection, WeekendOverspending,
};
pub use nudges::generate_nudges;
pub use overspending::detect_overspending;
pub use patterns::detect_patterns;
pub use predict::predict_spending;
pub use savings::project_year_end_savings;
pub use snapshot::TransactionSnapshot;
pub use trends::{analyze_trends, TrendReport};
