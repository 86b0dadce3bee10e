//! Tracing for test binaries.
//!
//! `TEST_LOG` (else `RUST_LOG`, else `warn`) sets the filter.
//! `TEST_LOG_FORMAT=json` switches to the JSON lines the service emits.

use once_cell::sync::Lazy;
use tracing_subscriber::{fmt, EnvFilter};

static SUBSCRIBER: Lazy<()> = Lazy::new(|| {
    let builder = fmt()
        .with_env_filter(filter())
        .with_test_writer()
        .without_time();
    // Another subscriber may already be installed; keep it.
    let _ = match std::env::var("TEST_LOG_FORMAT").as_deref() {
        Ok("json") => builder.json().try_init(),
        _ => builder.try_init(),
    };
});

fn filter() -> EnvFilter {
    ["TEST_LOG", "RUST_LOG"]
        .into_iter()
        .find_map(|var| std::env::var(var).ok())
        .map(EnvFilter::new)
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

/// Install the test subscriber. Safe to call from every test and ctor.
pub fn init() {
    Lazy::force(&SUBSCRIBER);
}
