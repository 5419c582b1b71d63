//! Persisted budget ledger for the current monthly period.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Spending limits and running totals for one budget period.
///
/// Field names on disk follow the long-standing `budget-log.json` layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroceryBudget {
    #[serde(rename = "monthly_budget", with = "rust_decimal::serde::float")]
    pub monthly_limit: Decimal,
    #[serde(rename = "weekly_budget", with = "rust_decimal::serde::float")]
    pub weekly_limit: Decimal,
    #[serde(rename = "daily_budget", with = "rust_decimal::serde::float")]
    pub daily_limit: Decimal,
    #[serde(rename = "amount_spent_today", with = "rust_decimal::serde::float")]
    pub spent_today: Decimal,
    #[serde(rename = "amount_spent_week", with = "rust_decimal::serde::float")]
    pub spent_this_week: Decimal,
    #[serde(rename = "amount_spent_month", with = "rust_decimal::serde::float")]
    pub spent_this_month: Decimal,
    #[serde(
        rename = "allotted_budget_remaining",
        with = "rust_decimal::serde::float"
    )]
    pub remaining_this_month: Decimal,
}

impl GroceryBudget {
    /// Limits derived from `monthly_limit` with every accumulator at zero.
    pub fn new(monthly_limit: Decimal, days_in_month: u32) -> Self {
        Self {
            monthly_limit,
            weekly_limit: round_cents(monthly_limit / Decimal::from(4)),
            daily_limit: round_cents(monthly_limit / Decimal::from(days_in_month.max(1))),
            spent_today: Decimal::ZERO,
            spent_this_week: Decimal::ZERO,
            spent_this_month: Decimal::ZERO,
            remaining_this_month: monthly_limit,
        }
    }

    /// Weekly allowance left after this week's spending. May be negative.
    pub fn remaining_this_week(&self) -> Decimal {
        self.weekly_limit - self.spent_this_week
    }
}

/// The single persisted ledger instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ledger {
    #[serde(rename = "today_date", alias = "as_of_date")]
    pub as_of_date: NaiveDate,
    pub month: u32,
    pub days_remaining_in_month: u32,
    #[serde(rename = "grocery_budget")]
    pub budget: GroceryBudget,
    #[serde(default)]
    pub processed_ids: Vec<String>,
}

impl Ledger {
    /// Fresh ledger for the period containing `today`.
    pub fn new(today: NaiveDate, monthly_limit: Decimal) -> Self {
        let days = days_in_month(today.year(), today.month());
        Self {
            as_of_date: today,
            month: today.month(),
            days_remaining_in_month: days - today.day(),
            budget: GroceryBudget::new(monthly_limit, days),
            processed_ids: Vec::new(),
        }
    }

    /// True when the ledger tracks the calendar month containing `date`.
    pub fn tracks_period_of(&self, date: NaiveDate) -> bool {
        self.month == date.month()
    }

    pub fn has_processed(&self, id: &str) -> bool {
        self.processed_ids.iter().any(|seen| seen == id)
    }
}

/// Number of days in the given month, falling back to 30 for invalid input.
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(start), Some(end)) => (end - start).num_days() as u32,
        _ => 30,
    }
}

/// Rounds a currency amount to whole cents.
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp(2)
}
