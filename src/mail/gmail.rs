use chrono::NaiveDate;
use grocery_core::BudgetSummary;
use grocery_domain::FeedMessage;
use reqwest::{
    blocking::{Client, RequestBuilder, Response},
    Url,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info};

use super::{compose::encode_plain_message, mime::feed_message_from, MailError};
use crate::{
    errors::AppError,
    pipeline::{MessageSource, Notifier},
};

const USER_ID: &str = "me";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListMessagesResponse {
    #[serde(default)]
    messages: Vec<MessageRef>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct MessageRef {
    id: String,
}

/// A message as returned by `users.messages.get` with `format=full`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GmailMessage {
    pub id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub label_ids: Vec<String>,
    #[serde(default)]
    pub internal_date: Option<String>,
    #[serde(default)]
    pub payload: MessagePart,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePart {
    #[serde(default)]
    pub mime_type: String,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default)]
    pub body: PartBody,
    #[serde(default)]
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PartBody {
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    raw: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

/// Minimal blocking client for the Gmail REST API.
#[derive(Debug, Clone)]
pub struct GmailClient {
    http: Client,
    base_url: Url,
    access_token: String,
}

impl GmailClient {
    pub fn new(base_url: &str, access_token: String) -> Result<Self, MailError> {
        let mut base = base_url.to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|err| MailError::Auth(format!("invalid Gmail API base `{base}`: {err}")))?;
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            base_url,
            access_token,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, MailError> {
        self.base_url
            .join(&format!("users/{USER_ID}/{path}"))
            .map_err(|err| MailError::Auth(format!("invalid Gmail endpoint `{path}`: {err}")))
    }

    /// Ids of every message matching `query`, following pagination.
    pub fn list_message_ids(&self, query: &str) -> Result<Vec<String>, MailError> {
        let url = self.endpoint("messages")?;
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut request = self.http.get(url.clone()).query(&[("q", query)]);
            if let Some(token) = page_token.as_deref() {
                request = request.query(&[("pageToken", token)]);
            }
            let page: ListMessagesResponse = self.execute(request, &url)?;
            ids.extend(page.messages.into_iter().map(|m| m.id));
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }
        Ok(ids)
    }

    pub fn get_message(&self, id: &str) -> Result<GmailMessage, MailError> {
        let url = self.endpoint(&format!("messages/{id}"))?;
        let request = self.http.get(url.clone()).query(&[("format", "full")]);
        self.execute(request, &url)
    }

    /// Sends an already base64url-encoded RFC 822 message; returns its id.
    pub fn send_raw(&self, raw: &str) -> Result<String, MailError> {
        let url = self.endpoint("messages/send")?;
        let request = self.http.post(url.clone()).json(&SendRequest { raw });
        let sent: SendResponse = self.execute(request, &url)?;
        Ok(sent.id)
    }

    fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &Url,
    ) -> Result<T, MailError> {
        let response = request.bearer_auth(&self.access_token).send()?;
        let response = check_status(response, url)?;
        Ok(response.json()?)
    }
}

fn check_status(response: Response, url: &Url) -> Result<Response, MailError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(MailError::Status {
        url: url.to_string(),
        status: status.as_u16(),
        body,
    })
}

/// Gmail search query for messages received after `start`.
pub fn after_query(start: NaiveDate) -> String {
    format!("after:{}", start.format("%Y/%m/%d"))
}

/// Message source backed by the authenticated mailbox.
pub struct GmailSource<'a> {
    client: &'a GmailClient,
}

impl<'a> GmailSource<'a> {
    pub fn new(client: &'a GmailClient) -> Self {
        Self { client }
    }
}

impl MessageSource for GmailSource<'_> {
    fn fetch_since(&self, start: NaiveDate) -> Result<Vec<FeedMessage>, AppError> {
        let query = after_query(start);
        let ids = self.client.list_message_ids(&query)?;
        info!(count = ids.len(), %query, "fetching messages");
        let mut messages = Vec::with_capacity(ids.len());
        for id in ids {
            let message = self.client.get_message(&id)?;
            messages.push(feed_message_from(&message));
        }
        Ok(messages)
    }
}

/// Delivers summaries from the authenticated account.
pub struct GmailNotifier<'a> {
    client: &'a GmailClient,
    sender: String,
    recipient: String,
}

impl<'a> GmailNotifier<'a> {
    pub fn new(client: &'a GmailClient, sender: &str, recipient: &str) -> Self {
        Self {
            client,
            sender: sender.to_string(),
            recipient: recipient.to_string(),
        }
    }
}

impl Notifier for GmailNotifier<'_> {
    fn deliver(&self, summary: &BudgetSummary) -> Result<(), AppError> {
        let raw = encode_plain_message(&self.sender, &self.recipient, &summary.subject, &summary.body);
        let id = self.client.send_raw(&raw)?;
        debug!(to = %self.recipient, "summary handed to Gmail");
        info!(%id, "message sent");
        Ok(())
    }
}
