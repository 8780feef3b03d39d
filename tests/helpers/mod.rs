//! Shared fixtures and resolvers for the integration tests.


use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Route parser and scheduler logs to the test output. Set `RUST_LOG=abl=trace`
/// to see them.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "abl=warn".into()))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}
