//! The no-argument pipeline command.

use colored::Colorize;
use grocery_config::ConfigManager;
use grocery_core::{StoredUpdate, SystemClock};
use grocery_storage_json::{JsonFeedStore, JsonLedgerStore};
use tracing::info;

use crate::{
    errors::AppError,
    mail::{GmailClient, GmailNotifier, GmailSource, GoogleAuth},
    pipeline::{NotifyStatus, Pipeline, PipelineSettings},
};

/// Fetches, updates and notifies using the configuration under the data
/// directory.
pub fn run_cli() -> Result<(), AppError> {
    let manager = ConfigManager::default_manager()?;
    let config = manager.load()?;
    config.validate()?;
    info!(base = %manager.base_dir().display(), "configuration loaded");

    let ledgers = JsonLedgerStore::new(manager.resolve(&config.ledger_file));
    let feed = JsonFeedStore::new(manager.resolve(&config.feed_file));
    let auth = GoogleAuth::new(
        manager.resolve(&config.credentials_file),
        manager.resolve(&config.token_file),
    )?;
    let client = GmailClient::new(&config.gmail_api_base, auth.access_token()?)?;
    let source = GmailSource::new(&client);
    let notifier = GmailNotifier::new(&client, &config.sender, &config.recipient);
    let clock = SystemClock;

    let pipeline = Pipeline::new(
        PipelineSettings::from_config(&config),
        &source,
        &feed,
        &ledgers,
        &notifier,
        &clock,
    );

    let start = pipeline.settings().fetch_start_date;
    step(&format!("Fetching emails since {}...", start.format("%b %d, %Y")));
    let fetched = pipeline.fetch()?;
    println!("Saved {fetched} emails since {start} to {}", feed.path().display());

    step("Updating grocery budget log...");
    match pipeline.update()? {
        StoredUpdate::Updated(update) => {
            println!("Budget updated for {}", update.ledger.as_of_date.format("%Y-%m-%d"));
        }
        StoredUpdate::FeedMissing => {
            println!(
                "{}",
                format!("{} not found, fetch emails first.", feed.path().display()).yellow()
            );
        }
    }

    step("Sending budget update email...");
    match pipeline.notify()? {
        NotifyStatus::Sent(_) => println!("Summary sent to {}", config.recipient),
        NotifyStatus::NoLedger => println!(
            "{}",
            format!(
                "No {} found. Run the budget update first.",
                ledgers.path().display()
            )
            .yellow()
        ),
    }

    println!("{}", "Pipeline completed successfully.".green());
    Ok(())
}

fn step(message: &str) {
    println!("{}", message.bold());
}
