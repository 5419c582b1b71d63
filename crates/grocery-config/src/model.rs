use std::path::PathBuf;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Settings that stay fixed between runs. Every field has a default, so a
/// partial `config.json` only overrides what it names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Allowance applied when a new monthly period opens.
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_budget: Decimal,
    /// Case-insensitive substring identifying grocery purchases in subjects.
    pub merchant_marker: String,
    /// Address that receives the summary.
    pub recipient: String,
    pub sender: String,
    pub summary_subject: String,
    /// Messages received after this date are fetched on every run.
    pub fetch_start_date: NaiveDate,
    pub ledger_file: PathBuf,
    pub feed_file: PathBuf,
    pub credentials_file: PathBuf,
    pub token_file: PathBuf,
    pub gmail_api_base: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            monthly_budget: Decimal::new(50000, 2),
            merchant_marker: "GIANT-EAGLE".into(),
            recipient: String::new(),
            sender: "me".into(),
            summary_subject: "Grocery Budget Update".into(),
            fetch_start_date: NaiveDate::from_ymd_opt(2025, 8, 23).unwrap_or_default(),
            ledger_file: PathBuf::from("budget-log.json"),
            feed_file: PathBuf::from("email-dump.json"),
            credentials_file: PathBuf::from("credentials.json"),
            token_file: PathBuf::from("token.json"),
            gmail_api_base: "https://gmail.googleapis.com/gmail/v1/".into(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monthly_budget <= Decimal::ZERO {
            return Err(ConfigError::Invalid(format!(
                "monthly_budget must be positive, got {}",
                self.monthly_budget
            )));
        }
        if self.merchant_marker.trim().is_empty() {
            return Err(ConfigError::Invalid("merchant_marker is empty".into()));
        }
        if self.recipient.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "recipient is not set; add it to config.json".into(),
            ));
        }
        Ok(())
    }
}
