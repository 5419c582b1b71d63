#![doc(test(attr(deny(warnings))))]

//! Grocery budget tracker: pulls purchase notifications from a Gmail inbox,
//! folds them into a monthly budget ledger and mails a spending summary.

pub mod cli;
pub mod errors;
pub mod mail;
pub mod pipeline;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        let build = utils::build_info::current();
        tracing::info!(build = %build.describe(), "grocery budget tracing initialized.");
    });
}
