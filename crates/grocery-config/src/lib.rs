//! grocery-config
//!
//! Fixed settings of the grocery tracker (budget, merchant marker, recipient,
//! file locations) plus disk persistence helpers.

pub mod error;
pub mod manager;
pub mod model;
pub mod paths;

pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::Config;
pub use paths::PathResolver;
