use grocery_domain::{round_cents, Decimal, Ledger};

pub const DEFAULT_SUMMARY_SUBJECT: &str = "Grocery Budget Update";

/// Human-readable snapshot of a ledger, ready to be mailed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BudgetSummary {
    pub subject: String,
    pub body: String,
}

pub struct SummaryService;

impl SummaryService {
    pub fn compose(ledger: &Ledger) -> BudgetSummary {
        Self::compose_with_subject(ledger, DEFAULT_SUMMARY_SUBJECT)
    }

    pub fn compose_with_subject(ledger: &Ledger, subject: &str) -> BudgetSummary {
        let budget = &ledger.budget;
        let body = format!(
            "Today's date is {date}.\n\n\
             You spent {today} today on groceries.\n\n\
             So far, you have spent {week} this week and {month} this month.\n\n\
             You now have {remaining} remaining for the month, {week_remaining} remaining for the week.\n",
            date = ledger.as_of_date.format("%Y-%m-%d"),
            today = dollars(budget.spent_today),
            week = dollars(budget.spent_this_week),
            month = dollars(budget.spent_this_month),
            remaining = dollars(budget.remaining_this_month),
            week_remaining = dollars(budget.remaining_this_week()),
        );
        BudgetSummary {
            subject: subject.to_string(),
            body,
        }
    }
}

/// Fixed two-decimal dollar format, e.g. `$15.89` or `$-4.10`. Rounds to the
/// cent first.
pub fn dollars(amount: Decimal) -> String {
    format!("${:.2}", round_cents(amount))
}
