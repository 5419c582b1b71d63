use grocery_config::ConfigError;
use grocery_core::CoreError;
use thiserror::Error;

use crate::mail::MailError;

/// Error type for a pipeline run. Anything that reaches `main` aborts the run.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Mail provider error: {0}")]
    Mail(#[from] MailError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
