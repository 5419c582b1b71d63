//! The fetch → update → notify run, wired through traits so every stage can be
//! swapped for an in-memory fake.

use chrono::NaiveDate;
use grocery_config::Config;
use grocery_core::{
    BudgetPolicy, BudgetSummary, Clock, LedgerRepository, LedgerService, StoredUpdate,
    SummaryService, TransactionFeed,
};
use grocery_domain::FeedMessage;
use tracing::{info, warn};

use crate::errors::AppError;

/// Produces transaction messages received since a start date.
pub trait MessageSource {
    fn fetch_since(&self, start: NaiveDate) -> Result<Vec<FeedMessage>, AppError>;
}

/// Delivers a composed summary.
pub trait Notifier {
    fn deliver(&self, summary: &BudgetSummary) -> Result<(), AppError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub fetch_start_date: NaiveDate,
    pub policy: BudgetPolicy,
    pub summary_subject: String,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            fetch_start_date: config.fetch_start_date,
            policy: BudgetPolicy::new(config.monthly_budget, config.merchant_marker.clone()),
            summary_subject: config.summary_subject.clone(),
        }
    }
}

/// Outcome of the notify stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyStatus {
    Sent(BudgetSummary),
    /// No ledger has ever been written, so there is nothing to report.
    NoLedger,
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub fetched: usize,
    pub update: StoredUpdate,
    pub notify: NotifyStatus,
}

pub struct Pipeline<'a> {
    settings: PipelineSettings,
    source: &'a dyn MessageSource,
    feed: &'a dyn TransactionFeed,
    ledgers: &'a dyn LedgerRepository,
    notifier: &'a dyn Notifier,
    clock: &'a dyn Clock,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        settings: PipelineSettings,
        source: &'a dyn MessageSource,
        feed: &'a dyn TransactionFeed,
        ledgers: &'a dyn LedgerRepository,
        notifier: &'a dyn Notifier,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            settings,
            source,
            feed,
            ledgers,
            notifier,
            clock,
        }
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Pulls messages from the source and replaces the feed with them.
    pub fn fetch(&self) -> Result<usize, AppError> {
        let start = self.settings.fetch_start_date;
        let messages = self.source.fetch_since(start)?;
        self.feed.store_feed(&messages)?;
        info!(count = messages.len(), since = %start, "saved messages to the feed");
        Ok(messages.len())
    }

    /// Folds the feed into the stored ledger as of today.
    pub fn update(&self) -> Result<StoredUpdate, AppError> {
        let today = self.clock.today();
        Ok(LedgerService::update_stored(
            self.ledgers,
            self.feed,
            today,
            &self.settings.policy,
        )?)
    }

    /// Mails the stored ledger's summary.
    pub fn notify(&self) -> Result<NotifyStatus, AppError> {
        let Some(ledger) = self.ledgers.load_ledger()? else {
            warn!("no budget ledger found; nothing to send");
            return Ok(NotifyStatus::NoLedger);
        };
        let summary = SummaryService::compose_with_subject(&ledger, &self.settings.summary_subject);
        self.notifier.deliver(&summary)?;
        Ok(NotifyStatus::Sent(summary))
    }

    pub fn run(&self) -> Result<PipelineReport, AppError> {
        let fetched = self.fetch()?;
        let update = self.update()?;
        let notify = self.notify()?;
        Ok(PipelineReport {
            fetched,
            update,
            notify,
        })
    }
}
