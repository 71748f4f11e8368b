//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

/// Filter directive: `RUST_LOG` when set and non-empty, else `default_level`
///
/// Call after `.env` has been loaded so a `RUST_LOG` defined there applies.
pub fn filter_directive(lookup: impl Fn(&str) -> Option<String>, default_level: &str) -> String {
    lookup("RUST_LOG")
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default_level.to_string())
}

/// Install the stderr fmt subscriber
pub fn init(default_level: &str) {
    let directive = filter_directive(|name| std::env::var(name).ok(), default_level);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
