//! Gmail glue: OAuth tokens, message fetch and MIME decoding, summary sending.

pub mod auth;
pub mod compose;
pub mod gmail;
pub mod mime;
pub mod redirect;

use grocery_core::CoreError;
use thiserror::Error;

pub use auth::{AuthorizedUser, GoogleAuth, SCOPES};
pub use compose::encode_plain_message;
pub use gmail::{GmailClient, GmailNotifier, GmailSource};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("authorization failed: {0}")]
    Auth(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("could not decode message data: {0}")]
    Decode(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("could not store token: {0}")]
    Store(#[from] CoreError),
}
