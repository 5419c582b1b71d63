//! Filesystem-backed JSON persistence for the budget ledger and the
//! transaction feed.

use std::{
    cmp::Reverse,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use grocery_core::{CoreError, LedgerRepository, TransactionFeed};
use grocery_domain::{FeedMessage, Ledger};
use serde_json::Value;
use tracing::{debug, warn};

const JSON_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S_%6f";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

/// Stores the ledger as a single JSON document, keeping a few copies of the
/// previous version next to it.
#[derive(Debug, Clone)]
pub struct JsonLedgerStore {
    path: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonLedgerStore {
    /// Store at `path` with backups in a `backups` directory beside it.
    pub fn new(path: PathBuf) -> Self {
        let backups_dir = path
            .parent()
            .map(|parent| parent.join("backups"))
            .unwrap_or_else(|| PathBuf::from("backups"));
        Self::with_retention(path, backups_dir, DEFAULT_RETENTION)
    }

    pub fn with_retention(path: PathBuf, backups_dir: PathBuf, retention: usize) -> Self {
        Self {
            path,
            backups_dir,
            retention,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backups_dir(&self) -> &Path {
        &self.backups_dir
    }

    /// Backup file names, newest first.
    pub fn list_backups(&self) -> Result<Vec<String>, CoreError> {
        if !self.backups_dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.backups_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(JSON_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort_by_key(|name| Reverse(parse_backup_timestamp(name)));
        Ok(names)
    }

    fn backup_existing_file(&self) -> Result<(), CoreError> {
        if self.retention == 0 || !self.path.exists() {
            return Ok(());
        }
        fs::create_dir_all(&self.backups_dir)?;
        let stem = self
            .path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("ledger");
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT);
        let backup = self
            .backups_dir
            .join(format!("{stem}_{timestamp}.{JSON_EXTENSION}"));
        fs::copy(&self.path, &backup)?;
        self.prune_backups()
    }

    fn prune_backups(&self) -> Result<(), CoreError> {
        for name in self.list_backups()?.into_iter().skip(self.retention) {
            let stale = self.backups_dir.join(&name);
            if let Err(err) = fs::remove_file(&stale) {
                warn!(path = %stale.display(), %err, "could not prune ledger backup");
            }
        }
        Ok(())
    }
}

impl LedgerRepository for JsonLedgerStore {
    fn load_ledger(&self) -> Result<Option<Ledger>, CoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        load_ledger_from_path(&self.path).map(Some)
    }

    fn save_ledger(&self, ledger: &Ledger) -> Result<(), CoreError> {
        self.backup_existing_file()?;
        save_ledger_to_path(ledger, &self.path)?;
        debug!(path = %self.path.display(), "ledger written");
        Ok(())
    }
}

/// The feed file written by the message source and read by the updater.
#[derive(Debug, Clone)]
pub struct JsonFeedStore {
    path: PathBuf,
}

impl JsonFeedStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TransactionFeed for JsonFeedStore {
    fn load_feed(&self) -> Result<Option<Vec<FeedMessage>>, CoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read_to_string(&self.path)?;
        let entries: Vec<Value> = serde_json::from_str(&data).map_err(|err| {
            CoreError::Serde(format!("{}: {err}", self.path.display()))
        })?;
        Ok(Some(entries.into_iter().map(feed_entry).collect()))
    }

    fn store_feed(&self, messages: &[FeedMessage]) -> Result<(), CoreError> {
        let json = serde_json::to_string_pretty(messages)
            .map_err(|err| CoreError::Serde(err.to_string()))?;
        replace_file(&self.path, &json)?;
        debug!(path = %self.path.display(), count = messages.len(), "feed written");
        Ok(())
    }
}

/// Saves a ledger to an arbitrary path, replacing the file in one rename.
pub fn save_ledger_to_path(ledger: &Ledger, path: &Path) -> Result<(), CoreError> {
    let json = serde_json::to_string_pretty(ledger).map_err(|err| CoreError::Serde(err.to_string()))?;
    replace_file(path, &json)
}

/// Loads a ledger from the provided filesystem path.
pub fn load_ledger_from_path(path: &Path) -> Result<Ledger, CoreError> {
    let data = fs::read_to_string(path)?;
    serde_json::from_str(&data)
        .map_err(|err| CoreError::Serde(format!("{}: {err}", path.display())))
}

/// Writes `data` next to `path` and renames it over the original. Readers see
/// either the old document or the new one.
pub fn replace_file(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let staging = staging_path(path);
    let mut file = File::create(&staging)?;
    file.write_all(data.as_bytes())?;
    file.sync_all()?;
    drop(file);
    fs::rename(&staging, path)?;
    Ok(())
}

/// Converts one feed element on its own. An element that does not fit the
/// feed layout keeps whichever of `id`, `subject` and `date` are strings and
/// drops the rest, leaving the updater to tag it.
fn feed_entry(entry: Value) -> FeedMessage {
    match serde_json::from_value::<FeedMessage>(entry.clone()) {
        Ok(message) => message,
        Err(err) => {
            let text = |key: &str| entry.get(key).and_then(Value::as_str).map(str::to_string);
            warn!(%err, id = ?text("id"), "malformed feed entry");
            FeedMessage {
                id: text("id").unwrap_or_default(),
                subject: text("subject"),
                date: text("date"),
                ..FeedMessage::default()
            }
        }
    }
}

/// Reads `<stem>_<date>_<time>_<micros>.json`; names without the microsecond
/// segment are accepted too.
fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let trimmed = name.strip_suffix(&format!(".{}", JSON_EXTENSION))?;
    let segments: Vec<&str> = trimmed.rsplit('_').take(3).collect();
    let (date, time, micros) = match segments.as_slice() {
        [micros, time, date] if is_digits(date, 8) && is_digits(time, 6) && is_digits(micros, 6) => {
            (*date, *time, micros.parse::<i64>().ok()?)
        }
        [time, date, ..] if is_digits(date, 8) && is_digits(time, 6) => (*date, *time, 0),
        _ => return None,
    };
    NaiveDateTime::parse_from_str(&format!("{date}{time}"), "%Y%m%d%H%M%S")
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc) + Duration::microseconds(micros))
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(TMP_SUFFIX);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_names_sort_by_embedded_timestamp() {
        assert!(
            parse_backup_timestamp("budget-log_20250901_101500.json")
                > parse_backup_timestamp("budget-log_20250831_235959.json")
        );
        assert!(
            parse_backup_timestamp("budget-log_20250901_101500_000002.json")
                > parse_backup_timestamp("budget-log_20250901_101500_000001.json")
        );
        assert!(
            parse_backup_timestamp("budget-log_20250901_101500_000001.json")
                > parse_backup_timestamp("budget-log_20250901_101500.json")
        );
        assert_eq!(parse_backup_timestamp("budget-log.json"), None);
    }

    #[test]
    fn staging_file_sits_beside_target() {
        assert_eq!(
            staging_path(Path::new("/data/budget-log.json")),
            PathBuf::from("/data/budget-log.json.tmp")
        );
    }
}
