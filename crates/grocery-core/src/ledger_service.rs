use std::collections::HashSet;

use chrono::NaiveDate;
use grocery_domain::{round_cents, Decimal, FeedMessage, Ledger};
use tracing::{debug, info, warn};

use crate::{
    amount::extract_amount,
    calendar::{days_remaining_in_month, parse_message_date, same_week},
    storage::{ledger_warnings, LedgerRepository, TransactionFeed},
    CoreError,
};

/// Fixed inputs of the updater: the monthly allowance for a new period and the
/// merchant marker that identifies grocery purchases.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetPolicy {
    pub monthly_limit: Decimal,
    pub merchant_marker: String,
}

impl BudgetPolicy {
    pub fn new(monthly_limit: Decimal, merchant_marker: impl Into<String>) -> Self {
        Self {
            monthly_limit,
            merchant_marker: merchant_marker.into(),
        }
    }

    /// Case-insensitive substring test against the merchant marker.
    pub fn matches(&self, subject: &str) -> bool {
        subject
            .to_uppercase()
            .contains(&self.merchant_marker.to_uppercase())
    }
}

/// What happened to a single feed message during an update.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionOutcome {
    Counted {
        amount: Decimal,
        this_week: bool,
        today: bool,
    },
    SkippedDuplicate,
    SkippedUnparseable,
    SkippedNonMatching,
}

impl TransactionOutcome {
    pub fn is_counted(&self) -> bool {
        matches!(self, TransactionOutcome::Counted { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedMessage {
    pub id: String,
    pub outcome: TransactionOutcome,
}

/// Result of folding a feed into a ledger.
#[derive(Debug, Clone)]
pub struct LedgerUpdate {
    pub ledger: Ledger,
    /// True when a new period was opened, either from scratch or by rollover.
    pub started_new_period: bool,
    pub outcomes: Vec<ProcessedMessage>,
}

impl LedgerUpdate {
    pub fn counted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|entry| entry.outcome.is_counted())
            .count()
    }

    pub fn count_of(&self, outcome: &TransactionOutcome) -> usize {
        self.outcomes
            .iter()
            .filter(|entry| std::mem::discriminant(&entry.outcome) == std::mem::discriminant(outcome))
            .count()
    }
}

/// Outcome of [`LedgerService::update_stored`].
#[derive(Debug, Clone)]
pub enum StoredUpdate {
    Updated(LedgerUpdate),
    /// The feed was absent; the stored ledger was left untouched.
    FeedMissing,
}

pub struct LedgerService;

impl LedgerService {
    /// Returns the ledger to fold into for `today`, opening a fresh period when
    /// there is no ledger or it tracks another month.
    pub fn open_period(
        existing: Option<Ledger>,
        today: NaiveDate,
        policy: &BudgetPolicy,
    ) -> (Ledger, bool) {
        match existing {
            Some(ledger) if ledger.tracks_period_of(today) => (ledger, false),
            Some(ledger) => {
                info!(
                    previous_month = ledger.month,
                    "budget period ended; starting a new ledger for {}",
                    today.format("%Y-%m")
                );
                (Ledger::new(today, policy.monthly_limit), true)
            }
            None => (Ledger::new(today, policy.monthly_limit), true),
        }
    }

    /// Folds `messages` into `existing` as of `today`.
    ///
    /// Never fails on bad message data: each message gets a tagged outcome.
    pub fn update(
        existing: Option<Ledger>,
        today: NaiveDate,
        messages: &[FeedMessage],
        policy: &BudgetPolicy,
    ) -> LedgerUpdate {
        let (mut ledger, started_new_period) = Self::open_period(existing, today, policy);
        let mut seen: HashSet<String> = ledger.processed_ids.iter().cloned().collect();
        let mut outcomes = Vec::with_capacity(messages.len());

        for message in messages {
            let outcome = Self::apply_message(&mut ledger, &mut seen, message, today, policy);
            debug!(id = %message.id, ?outcome, "feed message processed");
            outcomes.push(ProcessedMessage {
                id: message.id.clone(),
                outcome,
            });
        }

        let budget = &mut ledger.budget;
        budget.remaining_this_month = round_cents(budget.monthly_limit - budget.spent_this_month);
        ledger.as_of_date = today;
        ledger.days_remaining_in_month = days_remaining_in_month(today);

        LedgerUpdate {
            ledger,
            started_new_period,
            outcomes,
        }
    }

    fn apply_message(
        ledger: &mut Ledger,
        seen: &mut HashSet<String>,
        message: &FeedMessage,
        today: NaiveDate,
        policy: &BudgetPolicy,
    ) -> TransactionOutcome {
        if message.id.is_empty() {
            return TransactionOutcome::SkippedUnparseable;
        }
        let Some(subject) = message.subject_text() else {
            return TransactionOutcome::SkippedUnparseable;
        };
        if !policy.matches(subject) {
            return TransactionOutcome::SkippedNonMatching;
        }
        if seen.contains(&message.id) {
            return TransactionOutcome::SkippedDuplicate;
        }
        let Some(amount) = extract_amount(subject) else {
            return TransactionOutcome::SkippedUnparseable;
        };
        let Some(date) = message.date_text().and_then(parse_message_date) else {
            return TransactionOutcome::SkippedUnparseable;
        };

        let this_week = same_week(date, today);
        let is_today = date == today;
        let budget = &mut ledger.budget;
        budget.spent_this_month += amount;
        if this_week {
            budget.spent_this_week += amount;
        }
        if is_today {
            budget.spent_today += amount;
        }
        seen.insert(message.id.clone());
        ledger.processed_ids.push(message.id.clone());

        TransactionOutcome::Counted {
            amount,
            this_week,
            today: is_today,
        }
    }

    /// Loads the ledger and feed, folds, and saves.
    ///
    /// A missing feed is reported as [`StoredUpdate::FeedMissing`] without
    /// touching the repository.
    pub fn update_stored(
        repository: &dyn LedgerRepository,
        feed: &dyn TransactionFeed,
        today: NaiveDate,
        policy: &BudgetPolicy,
    ) -> Result<StoredUpdate, CoreError> {
        let Some(messages) = feed.load_feed()? else {
            warn!("transaction feed not found; ledger left unchanged");
            return Ok(StoredUpdate::FeedMissing);
        };

        let existing = repository.load_ledger()?;
        if let Some(ledger) = existing.as_ref() {
            for warning in ledger_warnings(ledger) {
                warn!("{warning}");
            }
        }

        let update = Self::update(existing, today, messages.as_slice(), policy);
        repository.save_ledger(&update.ledger)?;
        info!(
            messages = messages.len(),
            counted = update.counted(),
            "budget updated for {}",
            today
        );
        Ok(StoredUpdate::Updated(update))
    }
}
