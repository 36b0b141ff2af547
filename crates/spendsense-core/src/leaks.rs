//! Money leak detection
//!
//! Six independent scans over the non-investment expense set, each hunting a
//! different shape of avoidable spending. Findings are merged by
//! (leak type, merchant pattern), ranked by annualized cost, and only the
//! top few carry a rank.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use tracing::debug;

use crate::engine::AnalysisContext;
use crate::models::{LeakType, MoneyLeak, MonthKey, Transaction};
use crate::narration::{
    is_cash_withdrawal, is_food_related, is_friend_sharing, is_income_transaction,
    is_investment_category, is_investment_transaction, merchant_pattern,
};
use crate::snapshot::{by_month, mean};

/// Run all six leak scans, merge, and return the top-ranked leaks.
pub fn detect_money_leaks(ctx: &AnalysisContext) -> Vec<MoneyLeak> {
    let mut leaks = scan_subscriptions(ctx);
    leaks.extend(scan_coffee_effect(ctx));
    leaks.extend(scan_atm_spikes(ctx));
    leaks.extend(scan_friend_covering(ctx));
    leaks.extend(scan_high_impact_one_time(ctx));
    leaks.extend(scan_impulse_clusters(ctx));

    let merged = aggregate(leaks);
    let ranked = rank_leaks(merged, ctx.config.leak_rank_count);

    debug!(count = ranked.len(), "money leak detection complete");
    ranked
}

/// All recurring monthly charges, investments included, unranked. This is
/// the "what do I pay every month" view rather than a leak judgment.
pub fn detect_regular_monthly_spending(ctx: &AnalysisContext) -> Vec<MoneyLeak> {
    let config = &ctx.config;
    let mut groups: BTreeMap<(String, String, String), Vec<&Transaction>> = BTreeMap::new();
    for tx in ctx.snapshot.expenses_since(ctx.history_start()) {
        if is_income_transaction(tx) {
            continue;
        }
        let category = tx.category.clone().unwrap_or_else(|| "Unknown".to_string());
        let merchant = merchant_pattern(&tx.narration);
        let amount_key = format!("{:.2}", tx.magnitude());
        groups.entry((category, merchant, amount_key)).or_default().push(tx);
    }

    let mut spending = Vec::new();
    for ((category, merchant, _), txs) in groups {
        if txs.len() < config.subscription_min_occurrences || !is_recurring_monthly(ctx, &txs) {
            continue;
        }

        let amount = txs[0].magnitude();
        let annual = amount * 12.0;
        let investment = is_investment_category(Some(&category));

        spending.push(MoneyLeak {
            leak_type: LeakType::RepeatingSubscription,
            title: if investment {
                format!("Monthly Investment: {}", merchant)
            } else {
                format!("Monthly Expense: {}", merchant)
            },
            description: format!(
                "You spend ₹{:.0} monthly on {} ({}). This adds up to ₹{:.0} per year.",
                amount, merchant, category, annual
            ),
            merchant_pattern: merchant,
            monthly_amount: amount,
            annual_amount: annual,
            transaction_count: txs.len(),
            avg_transaction_amount: amount,
            suggestion: if investment {
                "This is a regular investment. Review whether it still matches your goals."
                    .to_string()
            } else {
                "This is a recurring expense. Review whether the service is still needed."
                    .to_string()
            },
            rank: None,
        });
    }

    spending.sort_by(|a, b| {
        b.monthly_amount
            .partial_cmp(&a.monthly_amount)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    debug!(count = spending.len(), "regular monthly spending scan complete");
    spending
}

/// Expenses in the leak universe: debits that are neither investments nor
/// income mislabeled as a debit.
fn leak_expenses<'a>(
    ctx: &'a AnalysisContext,
    cutoff: NaiveDate,
) -> impl Iterator<Item = &'a Transaction> {
    ctx.snapshot
        .expenses_since(cutoff)
        .filter(|t| !is_investment_transaction(t) && !is_income_transaction(t))
}

/// Same merchant and amount recurring on a ~30 day cycle.
fn scan_subscriptions(ctx: &AnalysisContext) -> Vec<MoneyLeak> {
    let config = &ctx.config;
    let mut groups: BTreeMap<(String, String), Vec<&Transaction>> = BTreeMap::new();
    for tx in leak_expenses(ctx, ctx.history_start()) {
        let merchant = merchant_pattern(&tx.narration);
        let amount_key = format!("{:.2}", tx.magnitude());
        groups.entry((merchant, amount_key)).or_default().push(tx);
    }

    let mut leaks = Vec::new();
    for ((merchant, _), txs) in groups {
        if txs.len() < config.subscription_min_occurrences || !is_recurring_monthly(ctx, &txs) {
            continue;
        }

        let amount = txs[0].magnitude();
        let annual = amount * 12.0;

        leaks.push(MoneyLeak {
            leak_type: LeakType::RepeatingSubscription,
            title: format!("Recurring Subscription: {}", merchant),
            description: format!(
                "You pay ₹{:.0} monthly to {}. This adds up to ₹{:.0} per year.",
                amount, merchant, annual
            ),
            merchant_pattern: merchant,
            monthly_amount: amount,
            annual_amount: annual,
            transaction_count: txs.len(),
            avg_transaction_amount: amount,
            suggestion: "Review if this subscription is still needed. Consider canceling unused services.".to_string(),
            rank: None,
        });
    }

    leaks
}

/// Many small purchases at the same merchant over the last month.
fn scan_coffee_effect(ctx: &AnalysisContext) -> Vec<MoneyLeak> {
    let config = &ctx.config;
    let mut groups: BTreeMap<String, Vec<&Transaction>> = BTreeMap::new();
    for tx in leak_expenses(ctx, ctx.months_back(1)) {
        if tx.magnitude() >= config.small_transaction_cutoff {
            continue;
        }
        groups.entry(merchant_pattern(&tx.narration)).or_default().push(tx);
    }

    let mut leaks = Vec::new();
    for (merchant, txs) in groups {
        if txs.len() < config.coffee_min_transactions {
            continue;
        }

        let monthly_total: f64 = txs.iter().map(|t| t.magnitude()).sum();
        let annual = monthly_total * 12.0;
        let avg = monthly_total / txs.len() as f64;

        leaks.push(MoneyLeak {
            leak_type: LeakType::CoffeeEffect,
            title: format!("Small Frequent Purchases: {}", merchant),
            description: format!(
                "You made {} small purchases (avg ₹{:.0}) at {} this month. That's ₹{:.0} per month (₹{:.0} per year).",
                txs.len(), avg, merchant, monthly_total, annual
            ),
            merchant_pattern: merchant,
            monthly_amount: monthly_total,
            annual_amount: annual,
            transaction_count: txs.len(),
            avg_transaction_amount: avg,
            suggestion: "Consider reducing frequency or finding cheaper alternatives. Small amounts add up quickly!".to_string(),
            rank: None,
        });
    }

    leaks
}

/// Cash withdrawals well above the historical monthly norm.
fn scan_atm_spikes(ctx: &AnalysisContext) -> Vec<MoneyLeak> {
    let config = &ctx.config;
    let withdrawals: Vec<&Transaction> = ctx
        .snapshot
        .expenses_since(ctx.history_start())
        .filter(|t| is_cash_withdrawal(t))
        .filter(|t| !is_investment_transaction(t) && !is_income_transaction(t))
        .collect();

    if withdrawals.is_empty() {
        return Vec::new();
    }

    let by_month = by_month(withdrawals.iter().copied());

    if by_month.len() < 3 {
        return Vec::new();
    }

    let monthly_totals: Vec<f64> = by_month
        .values()
        .map(|txs| txs.iter().map(|t| t.magnitude()).sum())
        .collect();
    let historical_avg = mean(&monthly_totals);

    let monthly_counts: Vec<f64> = by_month.values().map(|txs| txs.len() as f64).collect();
    let avg_frequency = mean(&monthly_counts);

    let current_month = MonthKey::from_date(ctx.today);
    let current: &[&Transaction] = by_month
        .get(&current_month)
        .map(|v| v.as_slice())
        .unwrap_or(&[]);
    let current_total: f64 = current.iter().map(|t| t.magnitude()).sum();
    let current_count = current.len();

    if current_total <= historical_avg * config.atm_spike_ratio
        && (current_count as f64) <= avg_frequency * config.atm_frequency_ratio
    {
        return Vec::new();
    }

    let extra = current_total - historical_avg;
    let annual = current_total * 12.0;

    vec![MoneyLeak {
        leak_type: LeakType::AtmWithdrawalSpike,
        title: "Unusually High ATM Withdrawals".to_string(),
        description: format!(
            "You withdrew ₹{:.0} this month (avg: ₹{:.0}). That's ₹{:.0} extra. Annual projection: ₹{:.0}",
            current_total, historical_avg, extra, annual
        ),
        merchant_pattern: "ATM".to_string(),
        monthly_amount: current_total,
        annual_amount: annual,
        transaction_count: current_count,
        avg_transaction_amount: current_total / current_count.max(1) as f64,
        suggestion: "Track where cash is being spent. Consider using digital payments for better tracking.".to_string(),
        rank: None,
    }]
}

/// Days where friend/group-marked spending piles onto one account.
fn scan_friend_covering(ctx: &AnalysisContext) -> Vec<MoneyLeak> {
    let config = &ctx.config;
    let mut by_date: BTreeMap<NaiveDate, Vec<&Transaction>> = BTreeMap::new();
    for tx in leak_expenses(ctx, ctx.history_start()) {
        if is_friend_sharing(tx) {
            by_date.entry(tx.date).or_default().push(tx);
        }
    }

    let mut total_covered = 0.0;
    let mut incidents = 0usize;
    let mut tx_count = 0usize;

    for txs in by_date.values() {
        let day_total: f64 = txs.iter().map(|t| t.magnitude()).sum();
        if day_total > config.group_day_cutoff {
            total_covered += day_total;
            incidents += 1;
            tx_count += txs.len();
        }
    }

    if incidents == 0 {
        return Vec::new();
    }

    let avg_per_incident = total_covered / incidents as f64;
    let monthly = total_covered / ctx.config.history_months as f64;
    let annual = monthly * 12.0;

    vec![MoneyLeak {
        leak_type: LeakType::FriendCovering,
        title: "Friend-Covering / One-Sided Sharing".to_string(),
        description: format!(
            "You covered ₹{:.0} in group expenses ({} incidents, avg ₹{:.0} per incident). You may be paying more than your share.",
            total_covered, incidents, avg_per_incident
        ),
        merchant_pattern: "FRIENDS & SOCIAL".to_string(),
        monthly_amount: monthly,
        annual_amount: annual,
        transaction_count: tx_count,
        avg_transaction_amount: avg_per_incident,
        suggestion: "Consider using split-bill apps or asking friends to pay their share upfront.".to_string(),
        rank: None,
    }]
}

/// Large payments that are not part of any recurring cycle.
fn scan_high_impact_one_time(ctx: &AnalysisContext) -> Vec<MoneyLeak> {
    let config = &ctx.config;
    let cutoff = ctx.months_back(config.one_time_window_months);
    let mut groups: BTreeMap<(String, String), Vec<&Transaction>> = BTreeMap::new();
    for tx in leak_expenses(ctx, cutoff) {
        if tx.magnitude() <= config.high_impact_cutoff {
            continue;
        }
        let merchant = merchant_pattern(&tx.narration);
        let amount_key = format!("{:.0}", tx.magnitude());
        groups.entry((merchant, amount_key)).or_default().push(tx);
    }

    let mut leaks = Vec::new();
    for ((merchant, _), txs) in groups {
        // Three or more identical charges look recurring, not one-time
        if txs.len() > 2 {
            continue;
        }

        let total: f64 = txs.iter().map(|t| t.magnitude()).sum();

        leaks.push(MoneyLeak {
            leak_type: LeakType::HighImpactOneTime,
            title: format!("High-Impact One-Time: {}", merchant),
            description: format!(
                "One-time payment of ₹{:.0} to {}. Large payments can affect cash flow.",
                total, merchant
            ),
            merchant_pattern: merchant,
            monthly_amount: total,
            annual_amount: total,
            transaction_count: txs.len(),
            avg_transaction_amount: total,
            suggestion: "Plan for large one-time expenses in advance. Consider breaking into installments if possible.".to_string(),
            rank: None,
        });
    }

    leaks
}

/// Days in the last month with clustered food/dining purchases.
fn scan_impulse_clusters(ctx: &AnalysisContext) -> Vec<MoneyLeak> {
    let config = &ctx.config;
    let mut by_date: BTreeMap<NaiveDate, Vec<&Transaction>> = BTreeMap::new();
    for tx in leak_expenses(ctx, ctx.months_back(1)) {
        if is_food_related(tx) {
            by_date.entry(tx.date).or_default().push(tx);
        }
    }

    let mut total = 0.0;
    let mut cluster_days = 0usize;
    let mut tx_count = 0usize;

    for txs in by_date.values() {
        if txs.len() >= config.impulse_min_daily_transactions {
            total += txs.iter().map(|t| t.magnitude()).sum::<f64>();
            cluster_days += 1;
            tx_count += txs.len();
        }
    }

    if cluster_days == 0 {
        return Vec::new();
    }

    vec![MoneyLeak {
        leak_type: LeakType::ImpulseCluster,
        title: "Emotional / Impulse Spending".to_string(),
        description: format!(
            "Detected {} days with {}+ food/dining transactions. Total: ₹{:.0} in the last month.",
            cluster_days, config.impulse_min_daily_transactions, total
        ),
        merchant_pattern: "DINING & FOOD".to_string(),
        monthly_amount: total,
        annual_amount: total * 12.0,
        transaction_count: tx_count,
        avg_transaction_amount: total / tx_count.max(1) as f64,
        suggestion: "Try meal planning and a daily food budget to reduce impulse food purchases.".to_string(),
        rank: None,
    }]
}

/// True when consecutive charges are spaced a month apart (within the
/// configured gap window). Transactions must be in chronological order.
fn is_recurring_monthly(ctx: &AnalysisContext, transactions: &[&Transaction]) -> bool {
    if transactions.len() < ctx.config.subscription_min_occurrences {
        return false;
    }

    let mut dates: Vec<NaiveDate> = transactions.iter().map(|t| t.date).collect();
    dates.sort();

    dates.windows(2).all(|w| {
        let gap = (w[1] - w[0]).num_days();
        gap >= ctx.config.subscription_min_gap_days && gap <= ctx.config.subscription_max_gap_days
    })
}

/// Merge leaks by (type, merchant pattern), summing amounts and counts.
/// First occurrence keeps its title/description/suggestion.
fn aggregate(leaks: Vec<MoneyLeak>) -> Vec<MoneyLeak> {
    let mut index: HashMap<(LeakType, String), usize> = HashMap::new();
    let mut merged: Vec<MoneyLeak> = Vec::new();

    for leak in leaks {
        let key = (leak.leak_type, leak.merchant_pattern.clone());
        match index.get(&key) {
            Some(&i) => {
                merged[i].monthly_amount += leak.monthly_amount;
                merged[i].annual_amount += leak.annual_amount;
                merged[i].transaction_count += leak.transaction_count;
            }
            None => {
                index.insert(key, merged.len());
                merged.push(leak);
            }
        }
    }

    merged
}

/// Sort descending by annualized amount (stable, so ties keep aggregation
/// order) and hand out ranks 1..=n to the top leaks. Only ranked leaks are
/// returned.
pub(crate) fn rank_leaks(mut leaks: Vec<MoneyLeak>, rank_count: usize) -> Vec<MoneyLeak> {
    leaks.sort_by(|a, b| {
        b.annual_amount
            .partial_cmp(&a.annual_amount)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    leaks.truncate(rank_count);
    for (i, leak) in leaks.iter_mut().enumerate() {
        leak.rank = Some(i as u8 + 1);
    }
    leaks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AnalysisContext;
    use crate::snapshot::TransactionSnapshot;
    use crate::test_utils::{expense, expense_with_narration};

    fn leak(leak_type: LeakType, merchant: &str, annual: f64) -> MoneyLeak {
        MoneyLeak {
            leak_type,
            title: merchant.to_string(),
            description: String::new(),
            merchant_pattern: merchant.to_string(),
            monthly_amount: annual / 12.0,
            annual_amount: annual,
            transaction_count: 1,
            avg_transaction_amount: annual / 12.0,
            suggestion: String::new(),
            rank: None,
        }
    }

    #[test]
    fn test_rank_keeps_top_three_descending() {
        let leaks = vec![
            leak(LeakType::RepeatingSubscription, "A", 1200.0),
            leak(LeakType::CoffeeEffect, "B", 5000.0),
            leak(LeakType::FriendCovering, "C", 300.0),
            leak(LeakType::HighImpactOneTime, "D", 8000.0),
        ];
        let ranked = rank_leaks(leaks, 3);
        assert_eq!(ranked.len(), 3);
        let annuals: Vec<f64> = ranked.iter().map(|l| l.annual_amount).collect();
        assert_eq!(annuals, vec![8000.0, 5000.0, 1200.0]);
        let ranks: Vec<Option<u8>> = ranked.iter().map(|l| l.rank).collect();
        assert_eq!(ranks, vec![Some(1), Some(2), Some(3)]);
        assert!(ranked.iter().all(|l| l.merchant_pattern != "C"));
    }

    #[test]
    fn test_aggregate_merges_same_type_and_merchant() {
        let merged = aggregate(vec![
            leak(LeakType::CoffeeEffect, "CHAI POINT", 1200.0),
            leak(LeakType::CoffeeEffect, "CHAI POINT", 600.0),
            leak(LeakType::RepeatingSubscription, "CHAI POINT", 600.0),
        ]);
        assert_eq!(merged.len(), 2);
        assert!((merged[0].annual_amount - 1800.0).abs() < 1e-9);
        assert_eq!(merged[0].transaction_count, 2);
    }

    #[test]
    fn test_subscription_scan_finds_monthly_charge() {
        let txs = vec![
            expense("2026-03-05", 499.0, "NETFLIX", "Entertainment"),
            expense("2026-04-05", 499.0, "NETFLIX", "Entertainment"),
            expense("2026-05-05", 499.0, "NETFLIX", "Entertainment"),
            expense("2026-06-05", 499.0, "NETFLIX", "Entertainment"),
        ];
        let snapshot = TransactionSnapshot::new(txs);
        let ctx = AnalysisContext::new(&snapshot, "2026-06-20".parse().unwrap());

        let leaks = scan_subscriptions(&ctx);
        assert_eq!(leaks.len(), 1);
        assert_eq!(leaks[0].merchant_pattern, "NETFLIX");
        assert!((leaks[0].monthly_amount - 499.0).abs() < 1e-9);
        assert!((leaks[0].annual_amount - 5988.0).abs() < 1e-9);
    }

    #[test]
    fn test_subscription_scan_rejects_irregular_gaps() {
        // Second gap is 50 days, outside the 27-33 window
        let txs = vec![
            expense("2026-02-05", 499.0, "NETFLIX", "Entertainment"),
            expense("2026-03-07", 499.0, "NETFLIX", "Entertainment"),
            expense("2026-04-26", 499.0, "NETFLIX", "Entertainment"),
        ];
        let snapshot = TransactionSnapshot::new(txs);
        let ctx = AnalysisContext::new(&snapshot, "2026-06-20".parse().unwrap());
        assert!(scan_subscriptions(&ctx).is_empty());
    }

    #[test]
    fn test_coffee_effect_needs_ten_small_purchases() {
        let mut txs = Vec::new();
        for day in 1..=12 {
            txs.push(expense(
                &format!("2026-06-{:02}", day),
                80.0,
                "UPI-CHAI POINT-11@ybl",
                "Dining & Food",
            ));
        }
        let snapshot = TransactionSnapshot::new(txs);
        let ctx = AnalysisContext::new(&snapshot, "2026-06-20".parse().unwrap());

        let leaks = scan_coffee_effect(&ctx);
        assert_eq!(leaks.len(), 1);
        assert_eq!(leaks[0].transaction_count, 12);
        assert!((leaks[0].monthly_amount - 960.0).abs() < 1e-9);
    }

    #[test]
    fn test_atm_spike_flags_heavy_month() {
        let mut txs = vec![
            expense_with_narration("2026-03-10", 2000.0, "ATM WDL MG ROAD"),
            expense_with_narration("2026-04-12", 2000.0, "ATM WDL MG ROAD"),
            expense_with_narration("2026-05-09", 2000.0, "ATM WDL MG ROAD"),
        ];
        // Current month triples the usual cash draw
        txs.push(expense_with_narration("2026-06-03", 4000.0, "ATM WDL MG ROAD"));
        txs.push(expense_with_narration("2026-06-15", 4000.0, "ATM WDL MG ROAD"));
        let snapshot = TransactionSnapshot::new(txs);
        let ctx = AnalysisContext::new(&snapshot, "2026-06-20".parse().unwrap());

        let leaks = scan_atm_spikes(&ctx);
        assert_eq!(leaks.len(), 1);
        assert_eq!(leaks[0].leak_type, LeakType::AtmWithdrawalSpike);
        assert!((leaks[0].monthly_amount - 8000.0).abs() < 1e-9);
    }

    #[test]
    fn test_high_impact_one_time() {
        let txs = vec![
            expense("2026-05-20", 18000.0, "CROMA ELECTRONICS", "Shopping"),
            expense("2026-06-01", 300.0, "BIG BAZAAR", "Groceries"),
        ];
        let snapshot = TransactionSnapshot::new(txs);
        let ctx = AnalysisContext::new(&snapshot, "2026-06-20".parse().unwrap());

        let leaks = scan_high_impact_one_time(&ctx);
        assert_eq!(leaks.len(), 1);
        assert_eq!(leaks[0].leak_type, LeakType::HighImpactOneTime);
        assert!((leaks[0].annual_amount - 18000.0).abs() < 1e-9);
    }

    #[test]
    fn test_friend_covering_counts_heavy_days() {
        let txs = vec![
            expense_with_narration("2026-05-10", 900.0, "dinner with friends split"),
            expense_with_narration("2026-06-07", 700.0, "group outing cab"),
            // Below the incident cutoff
            expense_with_narration("2026-06-14", 200.0, "lunch split"),
        ];
        let snapshot = TransactionSnapshot::new(txs);
        let ctx = AnalysisContext::new(&snapshot, "2026-06-20".parse().unwrap());

        let leaks = scan_friend_covering(&ctx);
        assert_eq!(leaks.len(), 1);
        assert_eq!(leaks[0].transaction_count, 2);
        assert!((leaks[0].avg_transaction_amount - 800.0).abs() < 1e-9);
    }

    #[test]
    fn test_impulse_cluster_needs_three_same_day() {
        let txs = vec![
            expense("2026-06-10", 250.0, "SWIGGY ORDER", "Dining & Food"),
            expense("2026-06-10", 180.0, "ZOMATO ORDER", "Dining & Food"),
            expense("2026-06-10", 320.0, "CAFE COFFEE DAY", "Dining & Food"),
            expense("2026-06-12", 250.0, "SWIGGY ORDER", "Dining & Food"),
        ];
        let snapshot = TransactionSnapshot::new(txs);
        let ctx = AnalysisContext::new(&snapshot, "2026-06-20".parse().unwrap());

        let leaks = scan_impulse_clusters(&ctx);
        assert_eq!(leaks.len(), 1);
        assert_eq!(leaks[0].transaction_count, 3);
        assert!((leaks[0].monthly_amount - 750.0).abs() < 1e-9);
    }

    #[test]
    fn test_regular_monthly_includes_investments() {
        let txs = vec![
            expense("2026-03-01", 5000.0, "SIP AXIS BLUECHIP", "Investments"),
            expense("2026-04-01", 5000.0, "SIP AXIS BLUECHIP", "Investments"),
            expense("2026-05-01", 5000.0, "SIP AXIS BLUECHIP", "Investments"),
            expense("2026-06-01", 5000.0, "SIP AXIS BLUECHIP", "Investments"),
        ];
        let snapshot = TransactionSnapshot::new(txs);
        let ctx = AnalysisContext::new(&snapshot, "2026-06-20".parse().unwrap());

        // The ranked leak scan excludes investments entirely
        assert!(detect_money_leaks(&ctx).is_empty());

        let recurring = detect_regular_monthly_spending(&ctx);
        assert_eq!(recurring.len(), 1);
        assert!(recurring[0].title.starts_with("Monthly Investment"));
        assert_eq!(recurring[0].rank, None);
    }
}
