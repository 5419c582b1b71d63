//! Dollar-amount extraction from notification subjects.

use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

static AMOUNT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\s*([0-9][0-9,]*\.[0-9]{2})(?:[^0-9]|$)").expect("amount pattern compiles")
});

/// Finds the first `$12.34` / `$1,234.56` style amount in `subject`.
///
/// A third decimal digit disqualifies the amount; letters right after it do
/// not. Returns `None` when no amount with exactly two decimals is present, or
/// when the amount is zero.
pub fn extract_amount(subject: &str) -> Option<Decimal> {
    let captures = AMOUNT_PATTERN.captures(subject)?;
    let digits: String = captures[1].chars().filter(|c| *c != ',').collect();
    Decimal::from_str(&digits)
        .ok()
        .filter(|amount| !amount.is_zero())
}
