//! Analytics configuration
//!
//! Every heuristic constant the engine relies on lives here rather than
//! inline in the algorithms, so deployments can retune thresholds without
//! touching detection code.

use serde::{Deserialize, Serialize};

/// Tunable thresholds for all analyzers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    // Windows
    /// Trailing window (months) for pattern/trend/leak/savings history
    pub history_months: u32,
    /// Trailing window (months) of history feeding a spending prediction
    pub prediction_history_months: u32,
    /// Window (months) for the high-impact one-time payment scan
    pub one_time_window_months: u32,

    // Pattern detection
    /// Minimum occurrences before the daily scan considers a group
    pub daily_min_occurrences: usize,
    /// Fraction of days since first occurrence that must have activity
    pub daily_coverage: f64,
    /// Minimum same-weekday occurrences for the weekly scan
    pub weekly_min_occurrences: usize,
    /// Fraction of weeks since first occurrence that must have activity
    pub weekly_coverage: f64,
    /// Minimum same-day-of-month occurrences for the monthly scan
    pub monthly_min_occurrences: usize,
    /// Fraction of months since first occurrence that must have activity
    pub monthly_coverage: f64,

    // Trend analysis
    /// Slope band (fraction of mean) inside which a trend counts as stable
    pub trend_slope_band: f64,
    /// Standard deviations above/below the mean for spike/dip candidates
    pub outlier_sigma: f64,
    /// A spike month must also exceed this multiple of the mean
    pub spike_mean_ratio: f64,
    /// A dip month must also fall below this multiple of the mean
    pub dip_mean_ratio: f64,

    // Prediction risk
    /// Predicted/historical ratio above which risk is HIGH
    pub risk_high_ratio: f64,
    /// Predicted/historical ratio above which risk is MEDIUM
    pub risk_medium_ratio: f64,
    /// Predicted/historical ratio above which the overspending flag is set
    pub overspend_risk_ratio: f64,

    // Money leaks
    /// Upper bound (exclusive) for a "small" purchase in the coffee scan
    pub small_transaction_cutoff: f64,
    /// Minimum small purchases per merchant per month for the coffee scan
    pub coffee_min_transactions: usize,
    /// Minimum occurrences for a recurring subscription
    pub subscription_min_occurrences: usize,
    /// Inclusive gap window (days) between consecutive subscription charges
    pub subscription_min_gap_days: i64,
    pub subscription_max_gap_days: i64,
    /// Current-month cash total vs historical average ratio for an ATM spike
    pub atm_spike_ratio: f64,
    /// Current-month cash withdrawal count vs average frequency ratio
    pub atm_frequency_ratio: f64,
    /// Single-day friend-sharing total that counts as a covering incident
    pub group_day_cutoff: f64,
    /// Lower bound (exclusive) for a high-impact one-time payment
    pub high_impact_cutoff: f64,
    /// Food/dining transactions in one day that mark an impulse cluster
    pub impulse_min_daily_transactions: usize,
    /// How many leaks receive a rank per run
    pub leak_rank_count: usize,

    // Overspending alerts
    /// Percent increase above which an alert is CRITICAL
    pub alert_critical_pct: f64,
    /// Percent increase above which an alert is HIGH
    pub alert_high_pct: f64,
    /// Percent increase above which an alert is MEDIUM
    pub alert_medium_pct: f64,
    /// Standard deviations above the mean that also make an alert CRITICAL
    pub alert_sigma: f64,
    /// Minimum historical months before a category can alert
    pub alert_min_history_months: usize,

    // Savings projection
    /// Floor of the trend adjustment factor when overspending
    pub projection_floor: f64,
    /// Ceiling of the trend adjustment factor when underspending
    pub projection_ceiling: f64,

    // Habit analyzers
    /// Weekend/weekday average ratio above which a category is flagged
    pub weekend_ratio_cutoff: f64,
    /// Ratio above which the weekend flag escalates to HIGH
    pub weekend_high_ratio: f64,
    /// Salary-week/non-salary-week spend ratio that marks an anomaly
    pub salary_week_ratio: f64,
    /// Fallback: a lone deposit above this counts as a low-confidence salary
    pub salary_min_deposit: f64,
    /// Days at the end of the month examined for scarcity behavior
    pub month_end_days: i64,
    /// Daily-average ratio below which month-end behavior is SCARCITY
    pub scarcity_ratio: f64,
    /// Daily-average ratio above which month-end behavior is OVERSPEND
    pub month_end_overspend_ratio: f64,

    // Nudges
    /// Days until a nudge expires
    pub nudge_ttl_days: i64,
    /// Pattern frequency floor for a savings-opportunity nudge
    pub savings_nudge_min_frequency: f64,
    /// Pattern average-amount floor for a savings-opportunity nudge
    pub savings_nudge_min_amount: f64,
    /// Implied monthly spend floor for a savings-opportunity nudge
    pub savings_nudge_min_monthly: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            history_months: 6,
            prediction_history_months: 12,
            one_time_window_months: 3,

            daily_min_occurrences: 10,
            daily_coverage: 0.30,
            weekly_min_occurrences: 4,
            weekly_coverage: 0.40,
            monthly_min_occurrences: 3,
            monthly_coverage: 0.50,

            trend_slope_band: 0.05,
            outlier_sigma: 2.0,
            spike_mean_ratio: 1.5,
            dip_mean_ratio: 0.5,

            risk_high_ratio: 1.3,
            risk_medium_ratio: 1.1,
            overspend_risk_ratio: 1.2,

            small_transaction_cutoff: 200.0,
            coffee_min_transactions: 10,
            subscription_min_occurrences: 3,
            subscription_min_gap_days: 27,
            subscription_max_gap_days: 33,
            atm_spike_ratio: 1.5,
            atm_frequency_ratio: 2.0,
            group_day_cutoff: 500.0,
            high_impact_cutoff: 5000.0,
            impulse_min_daily_transactions: 3,
            leak_rank_count: 3,

            alert_critical_pct: 50.0,
            alert_high_pct: 25.0,
            alert_medium_pct: 10.0,
            alert_sigma: 2.0,
            alert_min_history_months: 2,

            projection_floor: 0.5,
            projection_ceiling: 1.2,

            weekend_ratio_cutoff: 1.3,
            weekend_high_ratio: 1.5,
            salary_week_ratio: 1.5,
            salary_min_deposit: 10_000.0,
            month_end_days: 7,
            scarcity_ratio: 0.7,
            month_end_overspend_ratio: 1.3,

            nudge_ttl_days: 7,
            savings_nudge_min_frequency: 10.0,
            savings_nudge_min_amount: 100.0,
            savings_nudge_min_monthly: 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = AnalyticsConfig::default();
        assert_eq!(config.daily_min_occurrences, 10);
        assert_eq!(config.weekly_min_occurrences, 4);
        assert_eq!(config.monthly_min_occurrences, 3);
        assert!((config.daily_coverage - 0.30).abs() < 1e-9);
        assert!((config.weekly_coverage - 0.40).abs() < 1e-9);
        assert!((config.monthly_coverage - 0.50).abs() < 1e-9);
        assert_eq!(config.subscription_min_gap_days, 27);
        assert_eq!(config.subscription_max_gap_days, 33);
        assert!((config.small_transaction_cutoff - 200.0).abs() < 1e-9);
        assert!((config.group_day_cutoff - 500.0).abs() < 1e-9);
        assert!((config.high_impact_cutoff - 5000.0).abs() < 1e-9);
        assert!((config.risk_medium_ratio - 1.1).abs() < 1e-9);
        assert!((config.overspend_risk_ratio - 1.2).abs() < 1e-9);
        assert!((config.risk_high_ratio - 1.3).abs() < 1e-9);
        assert!((config.alert_medium_pct - 10.0).abs() < 1e-9);
        assert!((config.alert_high_pct - 25.0).abs() < 1e-9);
        assert!((config.alert_critical_pct - 50.0).abs() < 1e-9);
        assert!((config.projection_floor - 0.5).abs() < 1e-9);
        assert!((config.projection_ceiling - 1.2).abs() < 1e-9);
    }
}
