use tracing_subscriber::{EnvFilter, fmt};

/// Install the global `fmt` subscriber. `RUST_LOG` overrides the default
/// `info` level. Calling it twice is harmless.
pub fn init_logger(app_name: &'static str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(app = app_name, "logger initialized");
    }
}
