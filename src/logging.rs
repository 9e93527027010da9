use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the diagnostic log subscriber.
///
/// User-facing status lines go through the `info!`/`success!`/`warning!`
/// macros on stdout. Diagnostics go to stderr and are filtered by the
/// `LOG_LEVEL` environment variable (e.g. `LOG_LEVEL=sporlyze=debug`),
/// defaulting to `warn` so a normal run stays quiet.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init();
}
