use std::{collections::HashSet, sync::Mutex};

use chrono::Datelike;
use grocery_domain::{FeedMessage, Ledger};

use crate::CoreError;

/// Persistence for the single budget ledger.
pub trait LedgerRepository: Send + Sync {
    /// Returns `None` when no ledger has been written yet.
    fn load_ledger(&self) -> Result<Option<Ledger>, CoreError>;
    /// Replaces the stored ledger as a whole.
    fn save_ledger(&self, ledger: &Ledger) -> Result<(), CoreError>;
}

/// The transaction feed handed from the message source to the updater.
pub trait TransactionFeed: Send + Sync {
    /// Returns `None` when the feed has not been produced.
    fn load_feed(&self) -> Result<Option<Vec<FeedMessage>>, CoreError>;
    fn store_feed(&self, messages: &[FeedMessage]) -> Result<(), CoreError>;
}

/// Detects inconsistent totals and other anomalies within a ledger snapshot.
pub fn ledger_warnings(ledger: &Ledger) -> Vec<String> {
    let mut warnings = Vec::new();
    let budget = &ledger.budget;

    if ledger.month != ledger.as_of_date.month() {
        warnings.push(format!(
            "ledger month {} does not match its date {}",
            ledger.month, ledger.as_of_date
        ));
    }
    if budget.spent_today > budget.spent_this_week {
        warnings.push(format!(
            "spent today ({}) exceeds spent this week ({})",
            budget.spent_today, budget.spent_this_week
        ));
    }
    if budget.spent_this_week > budget.spent_this_month {
        warnings.push(format!(
            "spent this week ({}) exceeds spent this month ({})",
            budget.spent_this_week, budget.spent_this_month
        ));
    }
    let mut seen = HashSet::new();
    for id in &ledger.processed_ids {
        if !seen.insert(id.as_str()) {
            warnings.push(format!("processed id {id} is recorded more than once"));
        }
    }
    warnings
}

/// Ledger repository held in memory, for tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryLedgerRepository {
    ledger: Mutex<Option<Ledger>>,
    saves: Mutex<usize>,
}

impl InMemoryLedgerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ledger(ledger: Ledger) -> Self {
        Self {
            ledger: Mutex::new(Some(ledger)),
            saves: Mutex::new(0),
        }
    }

    /// Snapshot of the currently stored ledger.
    pub fn current(&self) -> Option<Ledger> {
        self.ledger.lock().ok().and_then(|guard| guard.clone())
    }

    /// How many times `save_ledger` has been called.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|guard| *guard).unwrap_or(0)
    }
}

impl LedgerRepository for InMemoryLedgerRepository {
    fn load_ledger(&self) -> Result<Option<Ledger>, CoreError> {
        let guard = self
            .ledger
            .lock()
            .map_err(|_| CoreError::Storage("ledger lock poisoned".into()))?;
        Ok(guard.clone())
    }

    fn save_ledger(&self, ledger: &Ledger) -> Result<(), CoreError> {
        let mut guard = self
            .ledger
            .lock()
            .map_err(|_| CoreError::Storage("ledger lock poisoned".into()))?;
        *guard = Some(ledger.clone());
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }
}

/// Transaction feed held in memory.
#[derive(Debug, Default)]
pub struct InMemoryFeed {
    messages: Mutex<Option<Vec<FeedMessage>>>,
}

impl InMemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_messages(messages: Vec<FeedMessage>) -> Self {
        Self {
            messages: Mutex::new(Some(messages)),
        }
    }
}

impl TransactionFeed for InMemoryFeed {
    fn load_feed(&self) -> Result<Option<Vec<FeedMessage>>, CoreError> {
        let guard = self
            .messages
            .lock()
            .map_err(|_| CoreError::Storage("feed lock poisoned".into()))?;
        Ok(guard.clone())
    }

    fn store_feed(&self, messages: &[FeedMessage]) -> Result<(), CoreError> {
        let mut guard = self
            .messages
            .lock()
            .map_err(|_| CoreError::Storage("feed lock poisoned".into()))?;
        *guard = Some(messages.to_vec());
        Ok(())
    }
}
