use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "info,actix_web=info,sqlx=warn,sea_orm=warn,redis=warn";

/// JSON logs to stdout. `LOG_FORMAT=pretty` switches to human-readable
/// output for local runs.
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let pretty = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("pretty"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);
    if pretty {
        registry.with(fmt::layer().with_target(true)).init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(false)
                    .json(),
            )
            .init();
    }
}
