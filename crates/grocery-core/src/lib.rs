//! grocery-core
//!
//! Budget-ledger update logic for the grocery tracker.
//! Depends on grocery-domain. No CLI, no mail provider, no direct file access;
//! persistence goes through the traits in [`storage`].

pub mod amount;
pub mod calendar;
pub mod error;
pub mod ledger_service;
pub mod storage;
pub mod summary_service;
pub mod time;

pub use amount::extract_amount;
pub use error::CoreError;
pub use ledger_service::*;
pub use storage::*;
pub use summary_service::*;
pub use time::{Clock, FixedClock, SystemClock};
