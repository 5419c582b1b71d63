#![allow(dead_code)]

use std::cell::RefCell;

use chrono::NaiveDate;
use grocery_budget::{
    errors::AppError,
    mail::MailError,
    pipeline::{MessageSource, Notifier, PipelineSettings},
};
use grocery_core::{BudgetPolicy, BudgetSummary};
use grocery_domain::{Decimal, FeedMessage};

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn purchase(id: &str, amount: &str, when: &str) -> FeedMessage {
    FeedMessage::new(
        id,
        format!("You made a ${amount} transaction at GIANT-EAGLE #123"),
        when,
    )
}

pub fn settings() -> PipelineSettings {
    PipelineSettings {
        fetch_start_date: date(2025, 8, 23),
        policy: BudgetPolicy::new(Decimal::new(50000, 2), "GIANT-EAGLE"),
        summary_subject: "Grocery Budget Update".into(),
    }
}

/// Message source that replays a fixed inbox and records requested start dates.
#[derive(Default)]
pub struct FakeInbox {
    pub messages: Vec<FeedMessage>,
    pub requests: RefCell<Vec<NaiveDate>>,
}

impl FakeInbox {
    pub fn with(messages: Vec<FeedMessage>) -> Self {
        Self {
            messages,
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl MessageSource for FakeInbox {
    fn fetch_since(&self, start: NaiveDate) -> Result<Vec<FeedMessage>, AppError> {
        self.requests.borrow_mut().push(start);
        Ok(self.messages.clone())
    }
}

/// Source whose provider is unreachable.
pub struct BrokenInbox;

impl MessageSource for BrokenInbox {
    fn fetch_since(&self, _start: NaiveDate) -> Result<Vec<FeedMessage>, AppError> {
        Err(MailError::Auth("token revoked".into()).into())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: RefCell<Vec<BudgetSummary>>,
}

impl Notifier for RecordingNotifier {
    fn deliver(&self, summary: &BudgetSummary) -> Result<(), AppError> {
        self.sent.borrow_mut().push(summary.clone());
        Ok(())
    }
}
