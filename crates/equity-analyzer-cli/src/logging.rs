use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Base level when `RUST_LOG` is unset.
const DEFAULT_DIRECTIVES: &str = "warn";

/// Install the global subscriber. Logs always go to stderr so stdout stays
/// machine-readable; `EQA_LOG_FORMAT=json` switches to structured output.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));
    let json = std::env::var("EQA_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr);
        let _ = subscriber.with(fmt_layer).try_init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr);
        let _ = subscriber.with(fmt_layer).try_init();
    }
}
