//! Turns Gmail message payloads into feed entries.

use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use chrono::DateTime;
use grocery_domain::FeedMessage;
use scraper::Html;
use tracing::debug;

use super::{
    gmail::{GmailMessage, Header, MessagePart},
    MailError,
};

const PREVIEW_CHARS: usize = 500;
const EMPTY_PREVIEW: &str = "(empty)";

/// Gmail encodes bodies as base64url, with or without padding.
const BODY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Text gathered from a MIME tree.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PartContents {
    pub plain: String,
    pub html: String,
    pub attachments: Vec<String>,
}

pub fn feed_message_from(message: &GmailMessage) -> FeedMessage {
    let payload = &message.payload;
    let headers = &payload.headers;

    let contents = if payload.parts.is_empty() {
        let plain = payload
            .body
            .data
            .as_deref()
            .and_then(|data| decode_logged(data, &message.id))
            .map(|text| text.trim().to_string())
            .unwrap_or_default();
        PartContents {
            plain,
            ..PartContents::default()
        }
    } else {
        collect_parts(&payload.parts, &message.id)
    };

    let plain_body = if contents.plain.is_empty() && !contents.html.is_empty() {
        html_to_text(&contents.html)
    } else {
        contents.plain
    };
    let body_preview = if plain_body.is_empty() {
        EMPTY_PREVIEW.to_string()
    } else {
        plain_body.chars().take(PREVIEW_CHARS).collect()
    };

    FeedMessage {
        id: message.id.clone(),
        thread_id: message.thread_id.clone(),
        labels: message.label_ids.clone(),
        internal_date: message.internal_date.clone(),
        from: header(headers, "From"),
        to: header(headers, "To"),
        subject: header(headers, "Subject"),
        date: header(headers, "Date").and_then(|raw| normalize_date(&raw)),
        message_id: header(headers, "Message-ID"),
        dkim: header(headers, "DKIM-Signature"),
        auth_results: header(headers, "Authentication-Results"),
        attachments_count: contents.attachments.len(),
        attachments: contents.attachments,
        plain_body,
        body_preview,
    }
}

/// Case-insensitive header lookup; first match wins.
pub fn header(headers: &[Header], name: &str) -> Option<String> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.clone())
}

/// Walks a part tree depth-first, concatenating text bodies and collecting
/// attachment file names.
pub fn collect_parts(parts: &[MessagePart], message_id: &str) -> PartContents {
    let mut contents = PartContents::default();
    walk(parts, message_id, &mut contents);
    contents.plain = contents.plain.trim().to_string();
    contents.html = contents.html.trim().to_string();
    contents
}

fn walk(parts: &[MessagePart], message_id: &str, contents: &mut PartContents) {
    for part in parts {
        if let Some(text) = part
            .body
            .data
            .as_deref()
            .and_then(|data| decode_logged(data, message_id))
        {
            match part.mime_type.as_str() {
                "text/plain" => contents.plain.push_str(&text),
                "text/html" => contents.html.push_str(&text),
                _ => {}
            }
        }
        if !part.parts.is_empty() {
            walk(&part.parts, message_id, contents);
        }
        if !part.filename.is_empty() {
            contents.attachments.push(part.filename.clone());
        }
    }
}

/// Decodes a base64url body into text, replacing invalid UTF-8.
pub fn decode_body(data: &str) -> Result<String, MailError> {
    let bytes = BODY_ENGINE
        .decode(data.trim())
        .map_err(|err| MailError::Decode(err.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn decode_logged(data: &str, message_id: &str) -> Option<String> {
    match decode_body(data) {
        Ok(text) => Some(text),
        Err(err) => {
            debug!(id = message_id, %err, "skipping undecodable body part");
            None
        }
    }
}

/// Visible text of an HTML document, one text node per line.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let text = document.root_element().text().collect::<Vec<_>>().join("\n");
    text.trim().to_string()
}

/// Re-renders an RFC 2822 `Date` header as RFC 3339, keeping its offset.
pub fn normalize_date(raw: &str) -> Option<String> {
    let without_comment = match raw.find(" (") {
        Some(index) => &raw[..index],
        None => raw,
    };
    DateTime::parse_from_rfc2822(without_comment.trim())
        .ok()
        .map(|parsed| parsed.to_rfc3339())
}
