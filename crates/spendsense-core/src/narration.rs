//! Narration preprocessing
//!
//! Bank narrations arrive full of UPI handles, reference numbers, and QR
//! codes. Everything that groups transactions by merchant goes through
//! [`merchant_pattern`] so the daily-routine scan and the leak scans agree on
//! what "the same merchant" means.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Transaction;

static UPI_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^UPI[-/]").unwrap());
static BANK_HANDLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)@[A-Z0-9]+").unwrap());
static DASHED_TXN_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-/]\d{9,}").unwrap());
static TRAILING_TXN_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+\d{9,}").unwrap());
static PREFIXED_TXN_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)[A-Z]+\.\d{12,}").unwrap());
static PAYTM_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)PAYTM\.[A-Z0-9]+").unwrap());
static PAYTM_QR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bPAYTMQR[A-Z0-9]+\b").unwrap());
static NOISE_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(PAYMENT FOR|PAYMENT|TXN|REF|NO|ID)\b").unwrap());
static SEPARATOR_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[-/]+").unwrap());
static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static NON_ALPHA: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Z\s]").unwrap());

/// Strip UPI ids, reference numbers, and bank tags from a narration,
/// leaving the merchant-ish part.
pub fn clean_narration(narration: &str) -> String {
    let mut cleaned = narration.trim().to_string();

    cleaned = UPI_PREFIX.replace_all(&cleaned, "").into_owned();
    cleaned = BANK_HANDLE.replace_all(&cleaned, "").into_owned();
    cleaned = DASHED_TXN_ID.replace_all(&cleaned, "").into_owned();
    cleaned = TRAILING_TXN_ID.replace_all(&cleaned, "").into_owned();
    cleaned = PREFIXED_TXN_ID.replace_all(&cleaned, "").into_owned();
    cleaned = PAYTM_CODE.replace_all(&cleaned, "").into_owned();
    cleaned = PAYTM_QR.replace_all(&cleaned, "").into_owned();
    cleaned = NOISE_WORDS.replace_all(&cleaned, "").into_owned();
    cleaned = SEPARATOR_RUNS.replace_all(&cleaned, " ").into_owned();
    cleaned = WHITESPACE_RUNS.replace_all(&cleaned, " ").into_owned();

    cleaned.trim().to_string()
}

/// Extract a merchant grouping key from a narration: the first one or two
/// alphabetic tokens after cleanup, uppercased. "UNKNOWN" when nothing
/// survives.
pub fn merchant_pattern(narration: &str) -> String {
    if narration.trim().is_empty() {
        return "UNKNOWN".to_string();
    }

    let cleaned = clean_narration(narration).to_uppercase();
    let cleaned = NON_ALPHA.replace_all(&cleaned, " ");

    let mut words = cleaned.split_whitespace();
    let first = match words.next() {
        Some(w) => w,
        None => return "UNKNOWN".to_string(),
    };

    match words.next() {
        Some(second) => format!("{} {}", first, second),
        None => first.to_string(),
    }
}

/// True when a category label marks an investment ("Investments" or any
/// "Investments / ..." subcategory). Investments are asset allocation, not
/// consumption, and stay out of expense aggregation.
pub fn is_investment_category(category: Option<&str>) -> bool {
    match category {
        Some(c) => {
            let normalized = c.trim().to_lowercase();
            normalized == "investments" || normalized.starts_with("investments /")
        }
        None => false,
    }
}

/// True when a category label marks salary/income.
pub fn is_salary_category(category: Option<&str>) -> bool {
    match category {
        Some(c) => {
            let normalized = c.trim().to_lowercase();
            normalized == "salary" || normalized.starts_with("salary /")
        }
        None => false,
    }
}

/// True when the transaction is an investment per its classifier category.
pub fn is_investment_transaction(tx: &Transaction) -> bool {
    is_investment_category(tx.category.as_deref())
}

/// True when the transaction represents money coming in rather than spending.
///
/// Credits are income by the sign convention; beyond that, salary sometimes
/// lands as a debit in malformed feeds, so the narration and category are
/// checked for income markers too.
pub fn is_income_transaction(tx: &Transaction) -> bool {
    if tx.amount > 0.0 {
        return true;
    }

    let narration = tx.narration.to_uppercase();
    if narration.contains("SALARY")
        && (narration.contains("CREDIT")
            || narration.contains("DEPOSIT")
            || narration.contains("INCOME"))
    {
        return true;
    }
    if narration.contains("INCOME") {
        return true;
    }

    if is_salary_category(tx.category.as_deref()) {
        return true;
    }
    if let Some(category) = tx.category.as_deref() {
        let upper = category.to_uppercase();
        if upper.contains("INCOME") && !upper.contains("EXPENSE") {
            return true;
        }
    }

    false
}

/// True for ATM/cash withdrawals.
pub fn is_cash_withdrawal(tx: &Transaction) -> bool {
    let narration = tx.narration.to_uppercase();
    narration.contains("ATM") || narration.contains("CASH")
}

/// True for transactions that look like covering a group expense: P2P-flagged
/// by the classifier, or friend/outing keywords in the narration.
pub fn is_friend_sharing(tx: &Transaction) -> bool {
    if tx.transaction_type.as_deref() == Some("P2P") {
        return true;
    }

    const KEYWORDS: [&str; 8] = [
        "friend", "group", "shared", "split", "dinner", "lunch", "outing", "hangout",
    ];
    let narration = tx.narration.to_lowercase();
    KEYWORDS.iter().any(|k| narration.contains(k))
}

/// True for food/dining transactions, the usual vehicle for impulse spending.
pub fn is_food_related(tx: &Transaction) -> bool {
    if let Some(category) = tx.category.as_deref() {
        let lower = category.to_lowercase();
        if lower.contains("dining") || lower.contains("food") {
            return true;
        }
    }

    let narration = tx.narration.to_lowercase();
    narration.contains("food")
        || narration.contains("restaurant")
        || narration.contains("cafe")
        || narration.contains("coffee")
}
