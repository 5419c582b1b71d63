use serde::{Deserialize, Serialize};

/// One mailbox message as captured in the transaction feed.
///
/// The ledger only reads `id`, `subject` and `date`. The rest is provider
/// metadata kept for inspection of the feed file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct FeedMessage {
    /// Provider message id. Empty when the entry carried none.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub internal_date: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    /// ISO-8601 timestamp of the underlying transaction.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub dkim: Option<String>,
    #[serde(default)]
    pub auth_results: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub attachments_count: usize,
    #[serde(default)]
    pub plain_body: String,
    #[serde(default)]
    pub body_preview: String,
}

impl FeedMessage {
    /// Minimal message carrying just the fields the ledger consumes.
    pub fn new(id: impl Into<String>, subject: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: Some(subject.into()),
            date: Some(date.into()),
            ..Self::default()
        }
    }

    /// Subject text, treating an empty subject as missing.
    pub fn subject_text(&self) -> Option<&str> {
        self.subject.as_deref().filter(|s| !s.is_empty())
    }

    /// Date text, treating an empty value as missing.
    pub fn date_text(&self) -> Option<&str> {
        self.date.as_deref().filter(|s| !s.is_empty())
    }
}
