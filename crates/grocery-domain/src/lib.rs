//! grocery-domain
//!
//! Pure data types for the grocery budget tracker: the persisted budget ledger
//! and the transaction-notification messages it is built from.
//! No I/O, no CLI, no mail provider. Only data types and serde layout.

pub mod ledger;
pub mod message;

pub use ledger::*;
pub use message::*;

pub use rust_decimal::Decimal;
