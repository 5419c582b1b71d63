pub mod build_info;

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIRECTIVES: [&str; 4] = [
    "grocery_budget=info",
    "grocery_core=info",
    "grocery_storage_json=info",
    "grocery_config=info",
];

/// Initializes the global tracing subscriber with sensible defaults.
///
/// Logs go to stderr so stdout carries only the pipeline progress lines.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let mut filter = EnvFilter::from_default_env();
        for directive in DEFAULT_DIRECTIVES {
            if let Ok(parsed) = directive.parse() {
                filter = filter.add_directive(parsed);
            }
        }

        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
