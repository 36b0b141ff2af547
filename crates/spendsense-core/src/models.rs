//! Domain models for spendsense
//!
//! `Transaction` is the input shape owned by the external feed; everything
//! else is a derived entity produced by one analysis run. Derived entities
//! carry no identifiers: each run yields a complete fresh set and the caller
//! decides how to persist or swap it in.

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// A single bank transaction as supplied by the external feed.
///
/// Amounts are signed: negative is an expense, positive a credit. The
/// category labels come from the upstream ML classifier and are never
/// recomputed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub amount: f64,
    pub narration: String,
    /// Classifier-assigned category (e.g. "Dining & Food")
    pub category: Option<String>,
    /// Classifier-assigned subcategory
    pub subcategory: Option<String>,
    /// Classifier-assigned transaction type label (e.g. "P2P")
    pub transaction_type: Option<String>,
}

impl Transaction {
    /// True when the signed amount records money leaving the account.
    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }

    /// Absolute transaction value.
    pub fn magnitude(&self) -> f64 {
        self.amount.abs()
    }
}

/// A calendar month, the bucketing unit for all monthly rollups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Months since year zero; differences give calendar-month distances.
    pub fn index(&self) -> i64 {
        self.year as i64 * 12 + (self.month as i64 - 1)
    }

    /// First day of the month.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("month 1..=12 always has day 1")
    }

    /// Last day of the month.
    pub fn last_day(&self) -> NaiveDate {
        let next = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
        };
        next.expect("month 1..=12 always valid")
            .pred_opt()
            .expect("first of month always has a predecessor")
    }

    /// Number of days in the month.
    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Granularity of a detected spending routine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternType {
    Daily,
    Weekly,
    Monthly,
}

impl PatternType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl std::str::FromStr for PatternType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(format!("Unknown pattern type: {}", s)),
        }
    }
}

impl std::fmt::Display for PatternType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recurring spending routine at daily, weekly, or monthly granularity.
///
/// Scans at the three granularities run independently, so one merchant group
/// can legitimately surface as both a daily routine and a monthly anchor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendingPattern {
    pub pattern_type: PatternType,
    pub category: String,
    pub subcategory: Option<String>,
    pub merchant_pattern: Option<String>,
    /// Set for weekly patterns: the ISO day of week the routine lands on
    pub day_of_week: Option<Weekday>,
    /// Set for monthly patterns: the day of month the routine lands on
    pub day_of_month: Option<u32>,
    pub average_amount: f64,
    /// Occurrences per month for daily patterns; observed period count for
    /// weekly/monthly ones
    pub frequency_per_month: f64,
    pub confidence: f64,
    pub first_observed: NaiveDate,
    pub last_observed: NaiveDate,
    /// Date of the detection run that produced this pattern
    pub detected_on: NaiveDate,
    pub active: bool,
}

/// Direction of month-over-month change in a category's spend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
            Self::Stable => "stable",
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-category trend over the analysis window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trend {
    pub category: String,
    pub direction: TrendDirection,
    /// Normalized slope magnitude in [0, 1]
    pub strength: f64,
    pub start_amount: f64,
    pub end_amount: f64,
}

/// A month whose total sits far above the category's own mean
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendingSpike {
    pub category: String,
    pub month: MonthKey,
    pub amount: f64,
    pub delta: f64,
    pub percent_delta: f64,
}

/// A month whose total sits far below the category's own mean
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendingDip {
    pub category: String,
    pub month: MonthKey,
    pub amount: f64,
    pub delta: f64,
    pub percent_delta: f64,
}

/// How a spending prediction was derived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionMethod {
    HistoricalAverage,
    PatternBased,
    TrendBased,
}

impl PredictionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HistoricalAverage => "historical_average",
            Self::PatternBased => "pattern_based",
            Self::TrendBased => "trend_based",
        }
    }
}

impl std::fmt::Display for PredictionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Risk classification of a forecast relative to the historical baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Forecast of one category's spend over a future window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendingPrediction {
    pub category: String,
    pub subcategory: Option<String>,
    pub forecast_start: NaiveDate,
    pub forecast_end: NaiveDate,
    pub predicted_amount: f64,
    pub confidence: f64,
    pub method: PredictionMethod,
    pub risk_level: RiskLevel,
    pub is_overspending_risk: bool,
}

/// The kind of avoidable-spending pattern a leak scan looks for.
///
/// Each scan owns a variant so exhaustiveness checking catches a missing arm
/// when a new scan is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeakType {
    /// Same merchant and amount recurring on a ~30 day cycle
    RepeatingSubscription,
    /// Many small purchases at the same merchant in a month
    CoffeeEffect,
    /// Cash withdrawals well above the historical monthly norm
    AtmWithdrawalSpike,
    /// Repeatedly covering group expenses out of one pocket
    FriendCovering,
    /// Large non-recurring payments that dent cash flow
    HighImpactOneTime,
    /// Days with clustered food/dining purchases
    ImpulseCluster,
}

impl LeakType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RepeatingSubscription => "repeating_subscription",
            Self::CoffeeEffect => "coffee_effect",
            Self::AtmWithdrawalSpike => "atm_withdrawal_spike",
            Self::FriendCovering => "friend_covering",
            Self::HighImpactOneTime => "high_impact_one_time",
            Self::ImpulseCluster => "impulse_cluster",
        }
    }
}

impl std::fmt::Display for LeakType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recurring or clustered expense pattern representing reducible spending
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoneyLeak {
    pub leak_type: LeakType,
    pub title: String,
    pub description: String,
    pub merchant_pattern: String,
    pub monthly_amount: f64,
    pub annual_amount: f64,
    pub transaction_count: usize,
    pub avg_transaction_amount: f64,
    pub suggestion: String,
    /// 1..=3 for the top leaks of a run; None for everything else
    pub rank: Option<u8>,
}

/// Severity of an overspending alert
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Numeric priority for sorting (higher = more urgent)
    pub fn priority(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }
}

impl std::fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Current-month spend in a category running ahead of its own history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryOverspendingAlert {
    pub category: String,
    pub alert_level: AlertLevel,
    pub current_amount: f64,
    pub historical_avg: f64,
    pub std_dev: f64,
    pub percent_increase: f64,
    pub projected_monthly: f64,
    pub month: MonthKey,
    pub days_elapsed: u32,
}

/// Year-end savings outlook derived from trailing income/expense averages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavingsProjection {
    /// Month the projection was computed in (1..=12)
    pub month: u32,
    pub year: i32,
    pub current_savings: f64,
    pub monthly_income_avg: f64,
    pub monthly_expense_avg: f64,
    /// Investment debits counted toward savings, not consumption
    pub monthly_investment_avg: f64,
    pub monthly_savings_rate: f64,
    pub remaining_months: u32,
    pub projected_additional_savings: f64,
    pub projected_year_end: f64,
    pub confidence: f64,
    pub trend_adjustment_factor: f64,
}

/// What prompted a nudge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NudgeType {
    OverspendingRisk,
    PatternDetected,
    TrendWarning,
    SavingsOpportunity,
}

impl NudgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OverspendingRisk => "overspending_risk",
            Self::PatternDetected => "pattern_detected",
            Self::TrendWarning => "trend_warning",
            Self::SavingsOpportunity => "savings_opportunity",
        }
    }
}

impl std::fmt::Display for NudgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Display order of a nudge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NudgePriority {
    Low,
    Medium,
    High,
}

impl NudgePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Numeric priority for sorting (higher = more urgent)
    pub fn priority(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Medium => 2,
            Self::High => 3,
        }
    }
}

impl std::fmt::Display for NudgePriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A short, prioritized advisory message for the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialNudge {
    pub nudge_type: NudgeType,
    pub title: String,
    pub message: String,
    pub suggestion: String,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub related_amount: f64,
    pub priority: NudgePriority,
    pub read: bool,
    pub dismissed: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Weekend vs weekday spending imbalance for one category
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekendOverspending {
    pub category: String,
    pub weekend_spending: f64,
    pub weekend_avg: f64,
    pub weekday_spending: f64,
    pub weekday_avg: f64,
    pub ratio: f64,
    pub percent_increase: f64,
    pub month: MonthKey,
    pub trend: TrendDirection,
    pub alert_level: AlertLevel,
}

/// Spending behavior in the week following a salary credit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalaryWeekAnalysis {
    pub salary_date: NaiveDate,
    pub salary_amount: f64,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub salary_week_spending: f64,
    pub non_salary_week_avg: f64,
    pub ratio: f64,
    pub extra_spending: f64,
    pub month: MonthKey,
    pub is_anomaly: bool,
    pub confidence: f64,
}

/// How spending behaves in the last days of the month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthEndBehavior {
    /// Spending dries up before the next paycheck
    Scarcity,
    /// Spending accelerates toward month end
    Overspend,
    Normal,
}

impl MonthEndBehavior {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scarcity => "scarcity",
            Self::Overspend => "overspend",
            Self::Normal => "normal",
        }
    }
}

impl std::fmt::Display for MonthEndBehavior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Month-end scarcity/overspend classification for the current month
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthEndScarcity {
    pub month: MonthKey,
    pub month_end_spending: f64,
    pub rest_of_month_daily_avg: f64,
    pub ratio: f64,
    pub average_reduction_pct: f64,
    pub behavior: MonthEndBehavior,
    pub reduced_spending: bool,
    pub credit_spike: bool,
    pub savings_withdrawal: bool,
    pub borrowing_increase: bool,
    pub pattern_strength: f64,
    pub months_detected: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_key_arithmetic() {
        let jan = MonthKey { year: 2026, month: 1 };
        let mar = MonthKey { year: 2026, month: 3 };
        assert_eq!(mar.index() - jan.index(), 2);
        assert_eq!(jan.first_day(), NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(jan.last_day(), NaiveDate::from_ymd_opt(2026, 1, 31).unwrap());
        assert_eq!(MonthKey { year: 2024, month: 2 }.days_in_month(), 29);
        assert_eq!(jan.to_string(), "2026-01");
    }

    #[test]
    fn test_month_key_ordering() {
        let dec = MonthKey { year: 2025, month: 12 };
        let jan = MonthKey { year: 2026, month: 1 };
        assert!(dec < jan);
    }

    #[test]
    fn test_alert_level_priority() {
        assert!(AlertLevel::Critical.priority() > AlertLevel::High.priority());
        assert!(AlertLevel::High.priority() > AlertLevel::Medium.priority());
        assert!(AlertLevel::Medium.priority() > AlertLevel::Low.priority());
    }

    #[test]
    fn test_enum_round_trips() {
        assert_eq!("weekly".parse::<PatternType>().unwrap(), PatternType::Weekly);
        assert_eq!(PatternType::Monthly.as_str(), "monthly");
        assert_eq!(LeakType::CoffeeEffect.to_string(), "coffee_effect");
        assert_eq!(PredictionMethod::TrendBased.to_string(), "trend_based");
    }
}
