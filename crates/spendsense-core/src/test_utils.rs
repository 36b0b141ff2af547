//! Test utilities for spendsense-core
//!
//! Builders for transactions and a canned multi-month history, so unit and
//! integration tests (and the CLI crate's tests) can assemble snapshots
//! without hand-writing every field.

use chrono::NaiveDate;

use crate::models::Transaction;

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap_or_else(|_| panic!("bad test date: {}", s))
}

/// A categorized expense; `amount` is the magnitude and is stored negated.
pub fn expense(on: &str, amount: f64, narration: &str, category: &str) -> Transaction {
    Transaction {
        date: date(on),
        amount: -amount,
        narration: narration.to_string(),
        category: Some(category.to_string()),
        subcategory: None,
        transaction_type: None,
    }
}

/// An uncategorized expense, the shape narration-driven scans see.
pub fn expense_with_narration(on: &str, amount: f64, narration: &str) -> Transaction {
    Transaction {
        date: date(on),
        amount: -amount,
        narration: narration.to_string(),
        category: None,
        subcategory: None,
        transaction_type: None,
    }
}

/// A credit (income) transaction.
pub fn credit(on: &str, amount: f64, narration: &str) -> Transaction {
    Transaction {
        date: date(on),
        amount,
        narration: narration.to_string(),
        category: None,
        subcategory: None,
        transaction_type: None,
    }
}

/// An investment debit (SIP, mutual fund, etc).
pub fn investment(on: &str, amount: f64, narration: &str) -> Transaction {
    Transaction {
        date: date(on),
        amount: -amount,
        narration: narration.to_string(),
        category: Some("Investments".to_string()),
        subcategory: None,
        transaction_type: None,
    }
}

/// Half a year of plausible activity ending mid-June 2026: monthly salary,
/// a streaming subscription on the 5th, a SIP, weekday chai, groceries,
/// friend dinners, cash withdrawals, and one fat one-off purchase.
pub fn sample_history() -> Vec<Transaction> {
    let mut txs = Vec::new();

    for month in 1..=6 {
        txs.push(credit(&format!("2026-{:02}-01", month), 55_000.0, "SALARY CREDIT ACME"));
        txs.push(expense(
            &format!("2026-{:02}-05", month),
            499.0,
            "UPI-NETFLIX-500111811826@ybl",
            "Entertainment",
        ));
        txs.push(investment(&format!("2026-{:02}-03", month), 5_000.0, "SIP AXIS BLUECHIP"));
        txs.push(expense(
            &format!("2026-{:02}-12", month),
            2_600.0,
            "BIG BAZAAR SUPERMARKET",
            "Groceries",
        ));
        txs.push(expense(
            &format!("2026-{:02}-26", month),
            2_400.0,
            "BIG BAZAAR SUPERMARKET",
            "Groceries",
        ));
        txs.push(expense_with_narration(
            &format!("2026-{:02}-18", month),
            2_000.0,
            "ATM WDL MG ROAD",
        ));
    }

    // Weekday chai through May and the first half of June
    for month in 4..=6 {
        let last_day = if month == 6 { 18 } else { 28 };
        for day in (1..=last_day).step_by(2) {
            txs.push(expense(
                &format!("2026-{:02}-{:02}", month, day),
                60.0,
                "UPI-CHAI POINT-11@ybl",
                "Dining & Food",
            ));
        }
    }

    // Covering dinners with the group every few weeks
    for (on, amount) in [
        ("2026-04-11", 1_450.0),
        ("2026-05-09", 1_700.0),
        ("2026-06-06", 1_900.0),
    ] {
        txs.push(expense(on, amount, "dinner with friends split", "Dining & Food"));
    }

    // One-off electronics purchase
    txs.push(expense("2026-05-23", 42_000.0, "CROMA ELECTRONICS BTM", "Shopping"));

    txs
}
